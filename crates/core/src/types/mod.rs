//! Core types for the PunchOut bridge.
//!
//! This module provides type-safe wrappers for the PunchOut domain concepts.

pub mod cart;
pub mod company;
pub mod id;
pub mod money;
pub mod setup;

pub use cart::{CartError, CartLineItem, CartReturn};
pub use company::{AccountHandle, CompanyId, CompanyIdError};
pub use id::SessionId;
pub use setup::SetupRequest;
