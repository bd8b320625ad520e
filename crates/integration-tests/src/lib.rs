//! Integration tests for the PunchOut bridge.
//!
//! Tests drive the gateway router in-process with `tower::ServiceExt::oneshot`.
//! Sessions that need a working backend run against [`FakeCommerce`], a
//! small axum server that mimics the customer auth API on a random local
//! port. Sessions that should degrade point at [`UNREACHABLE_BACKEND`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p punchout-bridge-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use punchout_bridge_gateway::config::{CommerceConfig, DocumentConfig, GatewayConfig};
use punchout_bridge_gateway::routes;
use punchout_bridge_gateway::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

/// Port 1 refuses connections, so every backend call fails fast.
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:1";

pub const TOKEN_SECRET: &str = "integration-token-secret-9f3Kq7Lm2Xv8Zt4Wb6Yh";
pub const CREDENTIAL_SECRET: &str = "integration-credential-secret-Q2w9Er7Ty5Ui3Op1";
pub const PUBLISHABLE_KEY: &str = "pk_integration_test";
pub const LOGIN_URL: &str = "https://shop.example/api/punchout/login";

const BODY_LIMIT: usize = 1024 * 1024;

/// Gateway configuration pointed at `backend`.
#[must_use]
pub fn test_config(backend: &str) -> GatewayConfig {
    GatewayConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        login_url: Url::parse(LOGIN_URL).unwrap(),
        token_secret: SecretString::from(TOKEN_SECRET.to_string()),
        credential_secret: SecretString::from(CREDENTIAL_SECRET.to_string()),
        commerce: CommerceConfig {
            base_url: Url::parse(backend).unwrap(),
            publishable_key: PUBLISHABLE_KEY.to_string(),
            timeout: Duration::from_secs(2),
        },
        documents: DocumentConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Gateway router backed by `backend`.
#[must_use]
pub fn app(backend: &str) -> Router {
    routes::router(AppState::new(test_config(backend)).unwrap())
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Send one request through `app` and buffer the response.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// `POST /api/punchout/setup` with an XML body.
pub async fn post_setup(app: Router, xml: &str) -> TestResponse {
    let request = Request::post("/api/punchout/setup")
        .header(header::CONTENT_TYPE, "text/xml")
        .body(Body::from(xml.to_string()))
        .unwrap();
    send(app, request).await
}

/// `POST /api/punchout/order` with a JSON body.
pub async fn post_order(app: Router, cart: &Value) -> TestResponse {
    let request = Request::post("/api/punchout/order")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(cart.to_string()))
        .unwrap();
    send(app, request).await
}

/// Build a `PunchOutSetupRequest` document.
#[must_use]
pub fn setup_request_xml(identity: Option<&str>, cookie: Option<&str>, sku: Option<&str>) -> String {
    let from = identity.map_or_else(String::new, |id| {
        format!("<From><Credential domain=\"NetworkId\"><Identity>{id}</Identity></Credential></From>")
    });
    let cookie = cookie.map_or_else(String::new, |c| format!("<BuyerCookie>{c}</BuyerCookie>"));
    let selected = sku.map_or_else(String::new, |s| {
        format!("<SelectedItem><ItemID><SupplierPartID>{s}</SupplierPartID></ItemID></SelectedItem>")
    });

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE cXML SYSTEM "http://xml.cxml.org/schemas/cXML/1.2.038/cXML.dtd">
<cXML payloadID="1700000000.1@buyer.example" timestamp="2026-02-24T12:00:00Z">
  <Header>
    {from}
    <To><Credential domain="NetworkId"><Identity>Supplier</Identity></Credential></To>
    <Sender><Credential domain="NetworkId"><Identity>Ariba</Identity><SharedSecret>s</SharedSecret></Credential></Sender>
  </Header>
  <Request>
    <PunchOutSetupRequest operation="create">
      {cookie}
      <BrowserFormPost><URL>https://buyer.example/cxml/return</URL></BrowserFormPost>
      {selected}
    </PunchOutSetupRequest>
  </Request>
</cXML>"#
    )
}

/// Text of the first `<tag>` in `xml`, without unescaping.
#[must_use]
pub fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(&xml[start..end])
}

/// The start page URL of a setup response.
#[must_use]
pub fn start_page(xml: &str) -> Url {
    let raw = element_text(xml, "URL").unwrap().replace("&amp;", "&");
    Url::parse(&raw).unwrap()
}

/// Decoded claims of the token carried by a start page URL.
#[must_use]
pub fn token_claims(start_page: &Url) -> Value {
    let token = token_param(start_page);
    let payload = token.split('.').nth(1).unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
}

/// The raw `token` query parameter of a start page URL.
#[must_use]
pub fn token_param(start_page: &Url) -> String {
    start_page
        .query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

/// In-process stand-in for the commerce backend's customer auth API.
#[derive(Clone, Default)]
pub struct FakeCommerce {
    accounts: Arc<Mutex<HashMap<String, String>>>,
    customers: Arc<Mutex<Vec<Value>>>,
}

impl FakeCommerce {
    /// Serve the fake on a random local port and return its base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/auth/customer/emailpass", post(fake_login))
            .route("/auth/customer/emailpass/register", post(fake_register))
            .route("/store/customers", post(fake_create_customer))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    #[must_use]
    pub fn customers(&self) -> Vec<Value> {
        self.customers.lock().unwrap().clone()
    }
}

fn error(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, Json(json!({ "type": kind, "message": message }))).into_response()
}

fn has_publishable_key(headers: &HeaderMap) -> bool {
    headers
        .get("x-publishable-api-key")
        .is_some_and(|v| v == PUBLISHABLE_KEY)
}

fn credentials(body: &Value) -> (String, String) {
    (
        body["email"].as_str().unwrap_or_default().to_string(),
        body["password"].as_str().unwrap_or_default().to_string(),
    )
}

async fn fake_login(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_publishable_key(&headers) {
        return error(StatusCode::BAD_REQUEST, "invalid_data", "missing publishable key");
    }
    let (email, password) = credentials(&body);
    let accounts = fake.accounts.lock().unwrap();
    match accounts.get(&email) {
        Some(stored) if *stored == password => Json(json!({ "token": format!("jwt-{email}") })).into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "unauthorized", "Invalid email or password"),
    }
}

async fn fake_register(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_publishable_key(&headers) {
        return error(StatusCode::BAD_REQUEST, "invalid_data", "missing publishable key");
    }
    let (email, password) = credentials(&body);
    let mut accounts = fake.accounts.lock().unwrap();
    if accounts.contains_key(&email) {
        return error(
            StatusCode::BAD_REQUEST,
            "invalid_data",
            "Identity with email already exists",
        );
    }
    accounts.insert(email.clone(), password);
    Json(json!({ "token": format!("reg-{email}") })).into_response()
}

async fn fake_create_customer(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let expected = format!("Bearer reg-{email}");
    if !headers
        .get(header::AUTHORIZATION)
        .is_some_and(|v| v == expected.as_str())
    {
        return error(StatusCode::UNAUTHORIZED, "unauthorized", "bad registration token");
    }
    fake.customers.lock().unwrap().push(body.clone());
    (StatusCode::OK, Json(json!({ "customer": body }))).into_response()
}
