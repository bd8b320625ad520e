//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PUNCHOUT_TOKEN_SECRET` - Session token signing secret (min 32 chars, high entropy),
//!   shared with the storefront login endpoint that verifies the token
//! - `PUNCHOUT_CREDENTIAL_SECRET` - Key for deriving bridged account passwords
//!   (min 32 chars, high entropy). Rotating it locks out every bridged account.
//! - `STOREFRONT_PUBLIC_URL` - Browser-facing storefront URL
//! - `COMMERCE_BACKEND_URL` - Commerce backend base URL (customer API)
//! - `COMMERCE_PUBLISHABLE_KEY` - Publishable API key sent on every backend call
//!
//! ## Optional
//! - `PUNCHOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `PUNCHOUT_PORT` - Listen port (default: 8001)
//! - `PUNCHOUT_LOGIN_PATH` - Storefront path, below `STOREFRONT_PUBLIC_URL`, that consumes the token (default: /api/punchout/login)
//! - `PUNCHOUT_DEFAULT_CURRENCY` - Currency for carts that omit one (default: USD)
//! - `PUNCHOUT_SUPPLIER_IDENTITY` - `From`/`Sender` identity in order messages (default: Supplier)
//! - `PUNCHOUT_BUYER_NETWORK_IDENTITY` - `To` identity in order messages (default: BuyerNetwork)
//! - `PUNCHOUT_PAYLOAD_DOMAIN` - Domain suffix of generated payload IDs (default: punchout-bridge)
//! - `COMMERCE_TIMEOUT_SECS` - Per-call backend timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Gateway application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Storefront endpoint that receives `?token=` and starts the session
    pub login_url: Url,
    /// HS256 key for session tokens
    pub token_secret: SecretString,
    /// HMAC key for bridged account passwords
    pub credential_secret: SecretString,
    /// Commerce backend connection settings
    pub commerce: CommerceConfig,
    /// Values stamped into rendered cXML documents
    pub documents: DocumentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("login_url", &self.login_url.as_str())
            .field("token_secret", &"[REDACTED]")
            .field("credential_secret", &"[REDACTED]")
            .field("commerce", &self.commerce)
            .field("documents", &self.documents)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

/// Commerce backend (customer API) configuration.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Backend base URL, e.g. `http://commerce:9000`
    pub base_url: Url,
    /// Publishable key sent as `x-publishable-api-key`
    pub publishable_key: String,
    /// Timeout applied to every backend call
    pub timeout: Duration,
}

/// Static values used when rendering cXML.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// Identity of this supplier in `From` and `Sender`
    pub supplier_identity: String,
    /// Identity of the buyer network in `To`
    pub buyer_network_identity: String,
    /// Right-hand side of generated `payloadID`s
    pub payload_domain: String,
    /// Currency used when a cart does not name one
    pub default_currency: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            supplier_identity: "Supplier".to_string(),
            buyer_network_identity: "BuyerNetwork".to_string(),
            payload_domain: "punchout-bridge".to_string(),
            default_currency: "USD".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (length, placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PUNCHOUT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PUNCHOUT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PUNCHOUT_PORT", "8001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PUNCHOUT_PORT".to_string(), e.to_string()))?;

        let storefront_url = get_required_url("STOREFRONT_PUBLIC_URL")?;
        let login_path = get_env_or_default("PUNCHOUT_LOGIN_PATH", "/api/punchout/login");
        let login_url = join_login_path(&storefront_url, &login_path).map_err(|e| {
            ConfigError::InvalidEnvVar("PUNCHOUT_LOGIN_PATH".to_string(), e.to_string())
        })?;

        let token_secret = get_validated_secret("PUNCHOUT_TOKEN_SECRET")?;
        let credential_secret = get_validated_secret("PUNCHOUT_CREDENTIAL_SECRET")?;

        let commerce = CommerceConfig::from_env()?;
        let documents = DocumentConfig::from_env();

        Ok(Self {
            host,
            port,
            login_url,
            token_secret,
            credential_secret,
            commerce,
            documents,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = parse_optional(
            "COMMERCE_TIMEOUT_SECS",
            get_optional_env("COMMERCE_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            base_url: get_required_url("COMMERCE_BACKEND_URL")?,
            publishable_key: get_required_env("COMMERCE_PUBLISHABLE_KEY")?,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

impl DocumentConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            supplier_identity: get_optional_env("PUNCHOUT_SUPPLIER_IDENTITY")
                .unwrap_or(defaults.supplier_identity),
            buyer_network_identity: get_optional_env("PUNCHOUT_BUYER_NETWORK_IDENTITY")
                .unwrap_or(defaults.buyer_network_identity),
            payload_domain: get_optional_env("PUNCHOUT_PAYLOAD_DOMAIN")
                .unwrap_or(defaults.payload_domain),
            default_currency: get_optional_env("PUNCHOUT_DEFAULT_CURRENCY")
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.default_currency),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable and parse it as an absolute URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let value = get_required_env(key)?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional value, falling back to `default` only when it is unset.
fn parse_optional<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Resolve the login path below the storefront URL, keeping any base path.
fn join_login_path(storefront_url: &Url, login_path: &str) -> Result<Url, url::ParseError> {
    let mut base = storefront_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(login_path.trim_start_matches('/'))
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a signing secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    let secret = SecretString::from(value);
    validate_secret_length(&secret, key)?;
    Ok(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 8001,
            login_url: Url::parse("http://localhost:8002/api/punchout/login").unwrap(),
            token_secret: SecretString::from("token-key-aB3xY9mK2nL5pQ7rT0uW4zC6"),
            credential_secret: SecretString::from("cred-key-Zq8Wv1Ls4Hd7Jf2Nc5Bx0Mk3"),
            commerce: CommerceConfig {
                base_url: Url::parse("http://commerce:9000").unwrap(),
                publishable_key: "pk_test_123".to_string(),
                timeout: Duration::from_secs(10),
            },
            documents: DocumentConfig::default(),
            sentry_dsn: Some("https://key@sentry.example/1".to_string()),
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("supersecret", "PUNCHOUT_TOKEN_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "PUNCHOUT_TOKEN_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST_VAR").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST_VAR").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8001);
    }

    #[test]
    fn test_login_url_join() {
        let base = Url::parse("http://localhost:8002").unwrap();
        let joined = join_login_path(&base, "/api/punchout/login").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:8002/api/punchout/login");
    }

    #[test]
    fn test_login_url_keeps_base_path() {
        for base in ["https://x.example/shop", "https://x.example/shop/"] {
            let joined = join_login_path(&Url::parse(base).unwrap(), "/api/punchout/login").unwrap();
            assert_eq!(joined.as_str(), "https://x.example/shop/api/punchout/login");
        }
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional("T", None, 10_u64).unwrap(), 10);
        assert_eq!(parse_optional("T", Some(" 25 ".to_string()), 10_u64).unwrap(), 25);
        assert!(matches!(
            parse_optional("COMMERCE_TIMEOUT_SECS", Some("ten".to_string()), 10_u64),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "COMMERCE_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("localhost:8002"));
        assert!(debug_output.contains("pk_test_123"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("token-key-aB3xY9mK2nL5pQ7rT0uW4zC6"));
        assert!(!debug_output.contains("cred-key-Zq8Wv1Ls4Hd7Jf2Nc5Bx0Mk3"));
        assert!(!debug_output.contains("sentry.example"));
    }

    #[test]
    fn test_document_defaults() {
        let documents = DocumentConfig::default();
        assert_eq!(documents.supplier_identity, "Supplier");
        assert_eq!(documents.default_currency, "USD");
    }
}
