//! Deterministic credentials for bridged accounts.
//!
//! The bridge keeps no record of the passwords it registers. Instead the
//! password is recomputed on every request:
//!
//! ```text
//! secret = hex(HMAC-SHA256(credential_secret, "punchout-account:" + company_id))[..32]
//! ```
//!
//! The same company and key always yield the same secret, so an account
//! registered once can be logged into forever after. Changing
//! `PUNCHOUT_CREDENTIAL_SECRET` orphans every bridged account.

use hmac::{Hmac, Mac};
use punchout_bridge_core::{AccountHandle, CompanyId};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Domain separator mixed into every derived secret.
const DERIVATION_CONTEXT: &str = "punchout-account:";

/// Length of a derived secret in hex characters.
pub const SECRET_LENGTH: usize = 32;

/// Login handle and password of a bridged account.
pub struct AccountCredentials {
    /// Synthetic email-shaped login.
    pub handle: AccountHandle,
    /// Derived password.
    pub secret: SecretString,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("handle", &self.handle)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl AccountCredentials {
    /// Derive the credentials for `company`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the HMAC key is rejected.
    pub fn derive(
        company: &CompanyId,
        credential_secret: &SecretString,
    ) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            handle: AccountHandle::for_company(company),
            secret: derive_account_secret(credential_secret, company)?,
        })
    }
}

/// Derive the bridged account password for `company`.
///
/// # Errors
///
/// Returns an error only if the HMAC key is rejected.
pub fn derive_account_secret(
    credential_secret: &SecretString,
    company: &CompanyId,
) -> Result<SecretString, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(credential_secret.expose_secret().as_bytes())?;
    mac.update(DERIVATION_CONTEXT.as_bytes());
    mac.update(company.as_str().as_bytes());

    let mut encoded = hex::encode(mac.finalize().into_bytes());
    encoded.truncate(SECRET_LENGTH);

    Ok(SecretString::from(encoded))
}
