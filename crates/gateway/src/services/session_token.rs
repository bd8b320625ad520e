//! Signed session tokens handed to the storefront login page.
//!
//! Tokens are compact HS256 JWTs so the storefront can verify them with any
//! standard JWT library. The claim set always contains `backend_token`,
//! serialized as `null` when the identity bridge degraded.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use punchout_bridge_core::{CompanyId, SessionId, SetupRequest};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::identity::BridgedAccount;

/// Lifetime of an issued token.
pub const SESSION_TTL_MINUTES: i64 = 15;

/// Clock skew tolerated when checking expiry.
pub const EXPIRY_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    fn rejected(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// Claims carried by a session token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub company_id: CompanyId,
    /// Backend bearer token, `None` for anonymous sessions.
    pub backend_token: Option<String>,
    pub session_id: SessionId,
    /// Supplier part ID for Level 2 deep links.
    pub selected_sku: Option<String>,
    /// Buyer endpoint for the eventual order message.
    pub return_url: String,
    pub buyer_cookie: String,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClaims")
            .field("company_id", &self.company_id)
            .field(
                "backend_token",
                &self.backend_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("session_id", &self.session_id)
            .field("selected_sku", &self.selected_sku)
            .field("return_url", &self.return_url)
            .field("buyer_cookie", &self.buyer_cookie)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A freshly issued token and the login URL that carries it.
#[derive(Debug)]
pub struct IssuedSession {
    pub claims: SessionClaims,
    pub token: String,
    /// Storefront login URL with `?token=` appended.
    pub redirect_url: Url,
}

/// Issues and verifies session tokens.
pub struct SessionTokenIssuer {
    secret: SecretString,
    login_url: Url,
}

impl SessionTokenIssuer {
    pub const fn new(secret: SecretString, login_url: Url) -> Self {
        Self { secret, login_url }
    }

    /// Issue a token for a resolved account and its setup request.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue(
        &self,
        account: &BridgedAccount,
        request: &SetupRequest,
    ) -> Result<IssuedSession, TokenError> {
        self.issue_at(account, request, Utc::now())
    }

    /// [`issue`](Self::issue) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue_at(
        &self,
        account: &BridgedAccount,
        request: &SetupRequest,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, TokenError> {
        let issued_at = now.trunc_subsecs(0);
        let claims = SessionClaims {
            company_id: account.company_id.clone(),
            backend_token: account
                .backend_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            session_id: SessionId::new(),
            selected_sku: request.selected_sku.clone(),
            return_url: request.browser_form_post_url.clone(),
            buyer_cookie: request.buyer_cookie.clone(),
            issued_at,
            expires_at: issued_at + TimeDelta::minutes(SESSION_TTL_MINUTES),
        };

        let token = self.encode(&claims)?;
        let mut redirect_url = self.login_url.clone();
        redirect_url.query_pairs_mut().append_pair("token", &token);

        Ok(IssuedSession {
            claims,
            token,
            redirect_url,
        })
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(TokenError::Encoding)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, uses another algorithm,
    /// carries a bad signature, or has expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// [`verify`](Self::verify) with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now`.
        validation.validate_exp = false;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let claims = jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
            .map_err(TokenError::rejected)?
            .claims;

        if now > claims.expires_at + TimeDelta::seconds(EXPIRY_LEEWAY_SECS) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
