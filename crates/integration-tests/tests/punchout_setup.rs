//! End-to-end tests for `POST /api/punchout/setup`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use punchout_bridge_core::setup::{DEFAULT_BUYER_IDENTITY, UNKNOWN};
use punchout_bridge_core::{AccountHandle, CompanyId};
use punchout_bridge_gateway::services::session_token::{SESSION_TTL_MINUTES, SessionTokenIssuer};
use punchout_bridge_integration_tests::{
    FakeCommerce, LOGIN_URL, TOKEN_SECRET, UNREACHABLE_BACKEND, app, element_text, post_setup,
    setup_request_xml, start_page, token_claims, token_param,
};
use secrecy::SecretString;
use url::Url;

#[tokio::test]
async fn test_setup_degrades_when_backend_unreachable() {
    let xml = setup_request_xml(Some("AcmeCorp"), Some("cookie-123"), None);

    let response = post_setup(app(UNREACHABLE_BACKEND), &xml).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get("content-type").unwrap(),
        "application/xml"
    );
    let body = response.text();
    assert!(body.contains(r#"<Status code="200" text="OK"/>"#));
    assert!(body.contains("<!DOCTYPE cXML SYSTEM"));

    let url = start_page(&body);
    assert!(url.as_str().starts_with(LOGIN_URL));

    let claims = token_claims(&url);
    assert_eq!(claims["company_id"], "AcmeCorp");
    assert!(claims["backend_token"].is_null());
    assert!(claims["selected_sku"].is_null());
    assert_eq!(claims["buyer_cookie"], "cookie-123");
    assert_eq!(claims["return_url"], "https://buyer.example/cxml/return");
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        SESSION_TTL_MINUTES * 60
    );
}

#[tokio::test]
async fn test_setup_level_2_carries_selected_sku() {
    let xml = setup_request_xml(Some("Globex"), Some("c2"), Some("SKU-1"));

    let response = post_setup(app(UNREACHABLE_BACKEND), &xml).await;

    assert_eq!(response.status, StatusCode::OK);
    let claims = token_claims(&start_page(&response.text()));
    assert_eq!(claims["company_id"], "Globex");
    assert_eq!(claims["selected_sku"], "SKU-1");
}

#[tokio::test]
async fn test_setup_missing_optional_fields_use_defaults() {
    let xml = setup_request_xml(None, None, None);

    let response = post_setup(app(UNREACHABLE_BACKEND), &xml).await;

    assert_eq!(response.status, StatusCode::OK);
    let claims = token_claims(&start_page(&response.text()));
    assert_eq!(claims["company_id"], DEFAULT_BUYER_IDENTITY);
    assert_eq!(claims["buyer_cookie"], UNKNOWN);
}

#[tokio::test]
async fn test_setup_token_verifies_with_gateway_secret() {
    let xml = setup_request_xml(Some("AcmeCorp"), Some("cookie-123"), None);
    let response = post_setup(app(UNREACHABLE_BACKEND), &xml).await;
    let token = token_param(&start_page(&response.text()));

    let issuer = SessionTokenIssuer::new(
        SecretString::from(TOKEN_SECRET.to_string()),
        Url::parse(LOGIN_URL).unwrap(),
    );
    let claims = issuer.verify(&token).unwrap();
    assert_eq!(claims.company_id.as_str(), "AcmeCorp");
    assert_eq!(claims.backend_token, None);

    let other = SessionTokenIssuer::new(
        SecretString::from("a-different-token-secret".to_string()),
        Url::parse(LOGIN_URL).unwrap(),
    );
    assert!(other.verify(&token).is_err());
}

#[tokio::test]
async fn test_setup_response_payload_ids_are_unique() {
    let xml = setup_request_xml(Some("AcmeCorp"), Some("c"), None);

    let first = post_setup(app(UNREACHABLE_BACKEND), &xml).await.text();
    let second = post_setup(app(UNREACHABLE_BACKEND), &xml).await.text();

    let payload_id = |body: &str| {
        let start = body.find("payloadID=\"").unwrap() + "payloadID=\"".len();
        body[start..].split('"').next().unwrap().to_string()
    };
    assert_ne!(payload_id(&first), payload_id(&second));
}

#[tokio::test]
async fn test_setup_rejects_malformed_xml() {
    let response = post_setup(app(UNREACHABLE_BACKEND), "<cXML><Header></cXML>").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("malformed cXML document"));
}

#[tokio::test]
async fn test_setup_rejects_empty_body() {
    let response = post_setup(app(UNREACHABLE_BACKEND), "").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_setup_rejects_missing_sections() {
    let cases = [
        ("<cXML><Request><PunchOutSetupRequest/></Request></cXML>", "Header"),
        ("<cXML><Header/></cXML>", "Request"),
        ("<cXML><Header/><Request/></cXML>", "PunchOutSetupRequest"),
    ];

    for (xml, section) in cases {
        let response = post_setup(app(UNREACHABLE_BACKEND), xml).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{xml}");
        assert!(response.text().contains(section), "{xml}");
    }
}

#[tokio::test]
async fn test_setup_rejects_malformed_attributes() {
    let valid = setup_request_xml(Some("Acme"), Some("c"), None);
    let root = r#"<cXML payloadID="1700000000.1@buyer.example" timestamp="2026-02-24T12:00:00Z">"#;

    for broken in [
        "<cXML payloadID>",
        "<cXML payloadID=abc>",
        r#"<cXML a="1" a="2">"#,
        r#"<cXML a="<">"#,
    ] {
        let xml = valid.replace(root, broken);
        let response = post_setup(app(UNREACHABLE_BACKEND), &xml).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{broken}");
        assert!(response.text().contains("malformed cXML document"), "{broken}");
    }
}

#[tokio::test]
async fn test_setup_rejects_unusable_buyer_identity() {
    let fake = FakeCommerce::default();
    let backend = fake.start().await;
    let too_long = "a".repeat(CompanyId::MAX_LENGTH + 1);

    for identity in ["Acme&#9;Corp", too_long.as_str()] {
        let xml = setup_request_xml(Some(identity), Some("c"), None);
        let response = post_setup(app(&backend), &xml).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.text().contains("invalid buyer identity"));
    }
    assert_eq!(fake.account_count(), 0);
}

#[tokio::test]
async fn test_setup_never_expands_external_entities() {
    let xml = r#"<?xml version="1.0"?>
<!DOCTYPE cXML [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<cXML>
  <Header><From><Credential><Identity>Acme&xxe;</Identity></Credential></From></Header>
  <Request><PunchOutSetupRequest><BuyerCookie>&xxe;</BuyerCookie></PunchOutSetupRequest></Request>
</cXML>"#;

    let response = post_setup(app(UNREACHABLE_BACKEND), xml).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(!body.contains("root:"));
    let claims = token_claims(&start_page(&body));
    assert_eq!(claims["company_id"], "Acme");
    assert_eq!(claims["buyer_cookie"], UNKNOWN);
}

#[tokio::test]
async fn test_setup_bridges_new_company_to_backend_account() {
    let fake = FakeCommerce::default();
    let backend = fake.start().await;
    let xml = setup_request_xml(Some("AcmeCorp"), Some("cookie-123"), None);

    let response = post_setup(app(&backend), &xml).await;

    assert_eq!(response.status, StatusCode::OK);
    let handle = AccountHandle::for_company(&CompanyId::parse("AcmeCorp").unwrap());
    let claims = token_claims(&start_page(&response.text()));
    assert_eq!(claims["backend_token"], format!("jwt-{handle}"));

    assert_eq!(fake.account_count(), 1);
    let customers = fake.customers();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["email"], handle.as_str());
    assert_eq!(customers[0]["first_name"], "AcmeCorp");
    assert_eq!(customers[0]["last_name"], "(Punchout B2B)");
    assert_eq!(customers[0]["company_name"], "AcmeCorp");
}

#[tokio::test]
async fn test_setup_returning_company_reuses_account() {
    let fake = FakeCommerce::default();
    let backend = fake.start().await;
    let xml = setup_request_xml(Some("AcmeCorp"), Some("c"), None);

    let first = post_setup(app(&backend), &xml).await;
    let second = post_setup(app(&backend), &xml).await;

    for response in [&first, &second] {
        assert_eq!(response.status, StatusCode::OK);
        let claims = token_claims(&start_page(&response.text()));
        assert_eq!(
            claims["backend_token"],
            "jwt-punchout_AcmeCorp@punchout.local"
        );
    }
    assert_eq!(fake.account_count(), 1);
    assert_eq!(fake.customers().len(), 1);
}

#[tokio::test]
async fn test_setup_concurrent_first_contact() {
    let fake = FakeCommerce::default();
    let backend = fake.start().await;
    let xml = setup_request_xml(Some("Initech"), Some("c"), None);

    let (first, second) = tokio::join!(post_setup(app(&backend), &xml), post_setup(app(&backend), &xml));

    for response in [&first, &second] {
        assert_eq!(response.status, StatusCode::OK);
        let claims = token_claims(&start_page(&response.text()));
        assert_eq!(claims["backend_token"], "jwt-punchout_Initech@punchout.local");
    }
    assert_eq!(fake.account_count(), 1);
}

#[tokio::test]
async fn test_setup_decodes_escaped_fields() {
    let xml = setup_request_xml(Some("Smith &amp; Sons"), Some("a&amp;b"), None);

    let response = post_setup(app(UNREACHABLE_BACKEND), &xml).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(element_text(&body, "URL").unwrap().starts_with(LOGIN_URL));
    let claims = token_claims(&start_page(&body));
    assert_eq!(claims["company_id"], "Smith & Sons");
    assert_eq!(claims["buyer_cookie"], "a&b");
}
