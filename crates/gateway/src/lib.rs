//! PunchOut bridge gateway.
//!
//! Sits between e-procurement systems speaking cXML and a headless
//! storefront. A buyer's `PunchOutSetupRequest` is answered with a start
//! page that logs them into the storefront as their company; the cart they
//! build there comes back through the order endpoint as a
//! `PunchOutOrderMessage`.
//!
//! # Modules
//!
//! - [`cxml`] - inbound parsing and outbound rendering
//! - [`services`] - identity bridge, session tokens, order translation
//! - [`commerce`] - HTTP client for the backend customer API
//! - [`routes`] - axum handlers and router

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod cxml;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
