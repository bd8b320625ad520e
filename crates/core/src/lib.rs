//! PunchOut Bridge Core - Shared domain types.
//!
//! This crate provides the types that flow through the PunchOut session
//! bridge:
//! - `gateway` - HTTP service that speaks cXML to buyer networks
//! - `integration-tests` - Black-box tests against the gateway router
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no HTTP
//! clients, no XML. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Buyer identities, session IDs, setup requests, carts, and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
