//! Commerce backend integration.
//!
//! The bridge only touches the customer auth surface: email/password login,
//! registration, and customer creation. [`CommerceClient`] implements
//! [`CustomerBackend`](crate::services::identity::CustomerBackend) over it.

mod client;
mod types;

pub use client::{CommerceClient, PUBLISHABLE_KEY_HEADER};

use thiserror::Error;

/// Errors building a [`CommerceClient`].
#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}
