//! `PunchOutSetupRequest` parsing.

use punchout_bridge_core::SetupRequest;

use super::CxmlError;
use super::document::Element;

/// Parse a `PunchOutSetupRequest` document.
///
/// `Header` and `Request` must be direct children of the `cXML` root, and
/// `Request` must contain a `PunchOutSetupRequest`. Everything else is
/// optional and defaulted by [`SetupRequest::from_fields`].
///
/// # Errors
///
/// - [`CxmlError::MalformedDocument`] if the body is not well-formed XML
/// - [`CxmlError::MissingSection`] if a required node is absent
/// - [`CxmlError::InvalidIdentity`] if the `From` identity is present but
///   not a valid company identity
pub fn parse_setup_request(body: &[u8]) -> Result<SetupRequest, CxmlError> {
    let root = Element::parse(body)?;

    let request = root
        .child("Request")
        .ok_or(CxmlError::MissingSection("Request"))?;
    let header = root
        .child("Header")
        .ok_or(CxmlError::MissingSection("Header"))?;
    let setup = request
        .child("PunchOutSetupRequest")
        .ok_or(CxmlError::MissingSection("PunchOutSetupRequest"))?;

    let buyer_identity = header
        .find_anywhere(&["From", "Credential", "Identity"])
        .and_then(Element::text);
    let buyer_cookie = setup.child("BuyerCookie").and_then(Element::text);
    let browser_form_post_url = setup
        .find_path(&["BrowserFormPost", "URL"])
        .and_then(Element::text);
    let selected_sku = setup
        .find_anywhere(&["SelectedItem", "ItemID", "SupplierPartID"])
        .and_then(Element::text);

    SetupRequest::from_fields(
        buyer_identity.map(str::to_owned),
        buyer_cookie.map(str::to_owned),
        browser_form_post_url.map(str::to_owned),
        selected_sku.map(str::to_owned),
    )
    .map_err(CxmlError::from)
}
