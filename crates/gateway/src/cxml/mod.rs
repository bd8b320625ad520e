//! cXML document codec.
//!
//! # Inbound
//!
//! [`parse_setup_request`] turns a `PunchOutSetupRequest` body into a
//! [`SetupRequest`](punchout_bridge_core::SetupRequest). The reader never
//! resolves DTDs or custom entities: a `<!DOCTYPE>` is skipped, and only the
//! five predefined XML entities and numeric character references are expanded.
//!
//! # Outbound
//!
//! [`render_setup_response`] and [`render_order_message`] build documents as
//! strings. Every interpolated value goes through XML escaping, so rendering
//! cannot fail once the inputs have been validated.

mod document;
mod render;
mod setup;

pub use render::{
    CXML_DOCTYPE, OrderMessage, PayloadEnvelope, render_order_message, render_setup_response,
};
pub use setup::parse_setup_request;

use punchout_bridge_core::CompanyIdError;
use thiserror::Error;

/// Errors produced while reading an inbound cXML document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CxmlError {
    /// The body is not well-formed XML.
    #[error("malformed cXML document: {0}")]
    MalformedDocument(String),

    /// A node the protocol requires is absent.
    #[error("missing required cXML section: {0}")]
    MissingSection(&'static str),

    /// The `From` credential identity is present but unusable.
    #[error("invalid buyer identity: {0}")]
    InvalidIdentity(#[from] CompanyIdError),
}
