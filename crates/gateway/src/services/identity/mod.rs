//! Bridges procurement companies to commerce backend customer accounts.
//!
//! Every company gets exactly one backend account whose handle and password
//! are derived from the company ID (see [`credential`]). Resolution is
//! stateless and idempotent:
//!
//! 1. Log in with the derived credentials.
//! 2. If the account is missing, register it. An "already exists" answer
//!    means a concurrent request won the race and is treated as success.
//! 3. A fresh registration gets a customer profile. Profile failures are
//!    logged and ignored.
//! 4. Log in again.
//!
//! Any other failure degrades the session to anonymous browsing rather
//! than failing the punchout.

mod backend;
pub mod credential;

pub use backend::{BackendError, CustomerBackend, CustomerProfile, PROFILE_LAST_NAME};
pub use credential::{AccountCredentials, derive_account_secret};

use punchout_bridge_core::CompanyId;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Why a company could not be bridged to a backend session.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("credential derivation failed: {0}")]
    Credential(String),

    #[error("login failed: {0}")]
    Login(#[source] BackendError),

    #[error("registration failed: {0}")]
    Register(#[source] BackendError),

    #[error("login after registration failed: {0}")]
    Relogin(#[source] BackendError),
}

/// Result of resolving a company.
#[derive(Debug)]
pub struct BridgedAccount {
    /// Company the account belongs to.
    pub company_id: CompanyId,
    /// Backend session token, `None` when the session is degraded.
    pub backend_token: Option<SecretString>,
}

impl BridgedAccount {
    /// Whether the storefront will see an authenticated customer.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.backend_token.is_some()
    }
}

/// Maps companies onto backend customer accounts.
pub struct IdentityBridge<B> {
    backend: B,
    credential_secret: SecretString,
}

impl<B: CustomerBackend> IdentityBridge<B> {
    pub const fn new(backend: B, credential_secret: SecretString) -> Self {
        Self {
            backend,
            credential_secret,
        }
    }

    /// Resolve `company_id` to a backend session.
    ///
    /// Never fails: provisioning errors are logged and yield an account
    /// without a token.
    #[instrument(skip_all, fields(company_id = %company_id))]
    pub async fn resolve(&self, company_id: &CompanyId) -> BridgedAccount {
        let backend_token = match self.provision(company_id).await {
            Ok(token) => {
                info!("Bridged company to backend customer session");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Identity bridge failed, continuing with anonymous session");
                None
            }
        };

        BridgedAccount {
            company_id: company_id.clone(),
            backend_token,
        }
    }

    async fn provision(&self, company_id: &CompanyId) -> Result<SecretString, ProvisioningError> {
        let credentials = AccountCredentials::derive(company_id, &self.credential_secret)
            .map_err(|e| ProvisioningError::Credential(e.to_string()))?;

        match self.backend.login(&credentials).await {
            Ok(token) => return Ok(token),
            Err(BackendError::NotFound | BackendError::Unauthorized) => {
                debug!(handle = %credentials.handle, "No bridged account yet, registering");
            }
            Err(e) => return Err(ProvisioningError::Login(e)),
        }

        match self.backend.register(&credentials).await {
            Ok(registration_token) => {
                let profile = CustomerProfile::for_company(company_id, &credentials.handle);
                if let Err(e) = self
                    .backend
                    .create_profile(&registration_token, &profile)
                    .await
                {
                    warn!(error = %e, "Failed to create customer profile for bridged account");
                }
            }
            Err(BackendError::AlreadyExists) => {
                debug!(handle = %credentials.handle, "Bridged account registered concurrently");
            }
            Err(e) => return Err(ProvisioningError::Register(e)),
        }

        self.backend
            .login(&credentials)
            .await
            .map_err(ProvisioningError::Relogin)
    }
}
