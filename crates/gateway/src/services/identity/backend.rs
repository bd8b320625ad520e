//! Seam between the identity bridge and the commerce backend's customer API.

use std::future::Future;

use punchout_bridge_core::{AccountHandle, CompanyId};
use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use super::credential::AccountCredentials;

/// Last name given to every bridged customer profile.
pub const PROFILE_LAST_NAME: &str = "(Punchout B2B)";

/// Failures reported by a [`CustomerBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// No identity exists for the handle.
    #[error("identity not found")]
    NotFound,

    /// The backend rejected the credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Registration raced with another request and lost.
    #[error("identity already exists")]
    AlreadyExists,

    /// The call did not finish within the configured timeout.
    #[error("backend call timed out")]
    Timeout,

    /// The backend could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with an unexpected status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// A success response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Customer profile created for a newly registered bridged identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
}

impl CustomerProfile {
    /// Profile tagging the account with the buying organization.
    #[must_use]
    pub fn for_company(company: &CompanyId, handle: &AccountHandle) -> Self {
        Self {
            email: handle.as_str().to_string(),
            first_name: company.as_str().to_string(),
            last_name: PROFILE_LAST_NAME.to_string(),
            company_name: company.as_str().to_string(),
        }
    }
}

/// Customer operations the bridge needs from the commerce backend.
///
/// Implemented over HTTP by [`CommerceClient`](crate::commerce::CommerceClient)
/// and by in-memory fakes in tests.
pub trait CustomerBackend: Send + Sync {
    /// Authenticate and return a session bearer token.
    fn login(
        &self,
        credentials: &AccountCredentials,
    ) -> impl Future<Output = Result<SecretString, BackendError>> + Send;

    /// Register a new identity and return a registration token.
    ///
    /// Must report [`BackendError::AlreadyExists`] when the handle is taken.
    fn register(
        &self,
        credentials: &AccountCredentials,
    ) -> impl Future<Output = Result<SecretString, BackendError>> + Send;

    /// Create the customer record for a freshly registered identity.
    fn create_profile(
        &self,
        registration_token: &SecretString,
        profile: &CustomerProfile,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
