//! HTTP client for the commerce backend's customer API.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;
use url::Url;

use super::CommerceError;
use super::types::{EmailPassRequest, ErrorBody, TokenResponse};
use crate::config::CommerceConfig;
use crate::services::identity::{
    AccountCredentials, BackendError, CustomerBackend, CustomerProfile,
};

/// Header carrying the storefront publishable key on every call.
pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

const LOGIN_PATH: &str = "auth/customer/emailpass";
const REGISTER_PATH: &str = "auth/customer/emailpass/register";
const CUSTOMERS_PATH: &str = "store/customers";

/// Customer API client.
#[derive(Clone)]
pub struct CommerceClient {
    client: reqwest::Client,
    base_url: Url,
}

impl CommerceClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the publishable key is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            PUBLISHABLE_KEY_HEADER,
            HeaderValue::from_str(&config.publishable_key)
                .map_err(|e| CommerceError::InvalidHeader(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        // Paths are joined relative to the base, so it must end in a slash.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    async fn request_token<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
        classify: fn(StatusCode, String) -> BackendError,
    ) -> Result<SecretString, BackendError> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(classify(status, ErrorBody::message_from(&raw)));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        parsed
            .token
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| BackendError::InvalidResponse("response carries no token".to_string()))
    }
}

impl CustomerBackend for CommerceClient {
    #[instrument(skip_all, fields(handle = %credentials.handle))]
    async fn login(&self, credentials: &AccountCredentials) -> Result<SecretString, BackendError> {
        let body = EmailPassRequest {
            email: credentials.handle.as_str(),
            password: credentials.secret.expose_secret(),
        };
        self.request_token(LOGIN_PATH, &body, classify_status).await
    }

    #[instrument(skip_all, fields(handle = %credentials.handle))]
    async fn register(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<SecretString, BackendError> {
        let body = EmailPassRequest {
            email: credentials.handle.as_str(),
            password: credentials.secret.expose_secret(),
        };
        self.request_token(REGISTER_PATH, &body, classify_registration)
            .await
    }

    #[instrument(skip_all, fields(email = %profile.email))]
    async fn create_profile(
        &self,
        registration_token: &SecretString,
        profile: &CustomerProfile,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint(CUSTOMERS_PATH)?)
            .bearer_auth(registration_token.expose_secret())
            .json(profile)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        Err(classify_status(status, ErrorBody::message_from(&raw)))
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(e.to_string())
    }
}

fn classify_status(status: StatusCode, message: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::NOT_FOUND => BackendError::NotFound,
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn classify_registration(status: StatusCode, message: String) -> BackendError {
    if status == StatusCode::CONFLICT || message.to_ascii_lowercase().contains("already exists") {
        BackendError::AlreadyExists
    } else {
        classify_status(status, message)
    }
}
