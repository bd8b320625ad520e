//! Parsed PunchOut setup request.

use serde::Serialize;

use super::company::{CompanyId, CompanyIdError};

/// Buyer identity used when the request carries no `From` credential.
pub const DEFAULT_BUYER_IDENTITY: &str = "generic_b2b_user";

/// Value used for `BuyerCookie` and `BrowserFormPost` when the node is absent.
pub const UNKNOWN: &str = "Unknown";

/// The fields the bridge needs from a `PunchOutSetupRequest`.
///
/// Defaults are applied once, in [`SetupRequest::from_fields`]; everything
/// downstream sees concrete values. The only optional field is
/// `selected_sku`: `Some` means a Level 2 (deep-link) session, `None` a
/// Level 1 (catalog browse) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupRequest {
    /// Credential identity of the `From` party.
    pub buyer_identity: CompanyId,
    /// Opaque correlation token to echo back in the order message.
    pub buyer_cookie: String,
    /// Where the buyer's browser posts the returned cart.
    pub browser_form_post_url: String,
    /// Supplier part ID of the deep-linked item.
    pub selected_sku: Option<String>,
}

impl SetupRequest {
    /// Build a request from the raw, possibly absent, document fields.
    ///
    /// Blank values count as absent. Only an absent buyer identity falls back
    /// to [`DEFAULT_BUYER_IDENTITY`]; a present one that is not a valid
    /// [`CompanyId`] is an error, so distinct buyers never share the
    /// fallback account.
    ///
    /// # Errors
    ///
    /// Returns the [`CompanyIdError`] of a present but invalid buyer identity.
    ///
    /// ```
    /// use punchout_bridge_core::SetupRequest;
    ///
    /// let request = SetupRequest::from_fields(None, None, None, Some("SKU-1".into())).unwrap();
    /// assert_eq!(request.buyer_identity.as_str(), "generic_b2b_user");
    /// assert_eq!(request.buyer_cookie, "Unknown");
    /// assert_eq!(request.browser_form_post_url, "Unknown");
    /// assert!(request.is_deep_link());
    /// ```
    pub fn from_fields(
        buyer_identity: Option<String>,
        buyer_cookie: Option<String>,
        browser_form_post_url: Option<String>,
        selected_sku: Option<String>,
    ) -> Result<Self, CompanyIdError> {
        let buyer_identity = match non_blank(buyer_identity) {
            Some(raw) => CompanyId::parse(&raw)?,
            None => default_identity(),
        };

        Ok(Self {
            buyer_identity,
            buyer_cookie: non_blank(buyer_cookie).unwrap_or_else(|| UNKNOWN.to_string()),
            browser_form_post_url: non_blank(browser_form_post_url)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            selected_sku: non_blank(selected_sku),
        })
    }

    /// Whether this is a Level 2 request targeting a single item.
    #[must_use]
    pub const fn is_deep_link(&self) -> bool {
        self.selected_sku.is_some()
    }
}

fn default_identity() -> CompanyId {
    CompanyId::from_static(DEFAULT_BUYER_IDENTITY)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
