//! PunchOut protocol endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::rejection::JsonRejection,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use punchout_bridge_core::CartReturn;
use punchout_bridge_core::money::format_fixed;
use serde::Serialize;
use tracing::{Span, field, info, instrument};

use crate::cxml::{self, PayloadEnvelope};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Content type of every cXML response.
pub const CXML_CONTENT_TYPE: &str = "application/xml";

/// JSON body returned by the order endpoint.
#[derive(Debug, Serialize)]
pub struct OrderReturnResponse {
    pub status: &'static str,
    /// Buyer endpoint the browser posts the document to.
    pub redirect_url: String,
    /// Order total as a two-decimal string.
    pub total: String,
    /// The `PunchOutOrderMessage` document.
    pub cxml: String,
    /// `cxml`, base64 encoded, for the `cxml-base64` form field.
    pub cxml_base64: String,
}

/// `POST /api/punchout/setup`
///
/// Reads a `PunchOutSetupRequest`, bridges the buyer to a backend customer,
/// and answers with a `PunchOutSetupResponse` whose start page logs the
/// buyer into the storefront.
#[instrument(skip_all, fields(
    company_id = field::Empty,
    level = field::Empty,
    session_id = field::Empty,
))]
pub async fn setup(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request = cxml::parse_setup_request(&body)?;

    let span = Span::current();
    span.record("company_id", request.buyer_identity.as_str());
    span.record("level", if request.is_deep_link() { 2 } else { 1 });
    info!(
        buyer_cookie = %request.buyer_cookie,
        browser_form_post_url = %request.browser_form_post_url,
        selected_sku = request.selected_sku.as_deref(),
        "Received PunchOutSetupRequest"
    );

    let account = state.identity().resolve(&request.buyer_identity).await;
    let session = state.tokens().issue(&account, &request)?;
    span.record("session_id", field::display(&session.claims.session_id));

    let envelope = PayloadEnvelope::new(&state.config().documents.payload_domain);
    let document = cxml::render_setup_response(&envelope, session.redirect_url.as_str());

    info!(
        payload_id = %envelope.payload_id,
        authenticated = account.is_authenticated(),
        "Issued PunchOutSetupResponse"
    );

    Ok(([(header::CONTENT_TYPE, CXML_CONTENT_TYPE)], document).into_response())
}

/// `POST /api/punchout/order`
///
/// Turns a cart returned by the storefront into a `PunchOutOrderMessage`
/// for the storefront to auto-post to the buyer.
/// A body that does not deserialize, or a cart that fails validation, is
/// rejected with 400.
#[instrument(skip_all, fields(session_id = field::Empty))]
pub async fn order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CartReturn>, JsonRejection>,
) -> Result<Json<OrderReturnResponse>> {
    let Json(cart) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Span::current().record("session_id", cart.session_id.as_str());
    cart.validate()?;

    let document = state.orders().translate(&cart);
    info!(
        payload_id = %document.payload_id,
        items = cart.items.len(),
        total = %document.total,
        "Built PunchOutOrderMessage"
    );

    Ok(Json(OrderReturnResponse {
        status: "success",
        redirect_url: document.redirect_url,
        total: format_fixed(document.total),
        cxml_base64: STANDARD.encode(&document.cxml),
        cxml: document.cxml,
    }))
}
