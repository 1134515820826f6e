//! # Integration Tests for certs-api
//!
//! Drives the full router in-process: issuance, lookup, update,
//! revocation, public verification, bulk clear gating, error bodies,
//! metrics, and OpenAPI generation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use certs_api::state::{AppConfig, AppState};
use certs_core::CertificateStore;

/// Helper: build the test app over an in-memory store.
fn test_app() -> axum::Router {
    certs_api::app(AppState::in_memory())
}

/// Helper: build the test app with a shared state handle for multi-request tests.
fn test_state(config: AppConfig) -> AppState {
    AppState::new(CertificateStore::in_memory(), config)
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn ada() -> Value {
    json!({
        "recipientName": "Ada Lovelace",
        "email": "Ada@Example.com",
        "courseName": "Volunteer Program"
    })
}

/// Helper: issue a certificate and return its JSON record.
async fn issue(state: &AppState, body: Value) -> Value {
    let response = certs_api::app(state.clone())
        .oneshot(json_request("POST", "/v1/certificates", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["certificate"].clone()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Issuance -----------------------------------------------------------------

#[tokio::test]
async fn test_issue_certificate_returns_record_and_verification_url() {
    let config = AppConfig {
        public_base_url: "https://certs.example.org".into(),
        ..AppConfig::default()
    };
    let response = certs_api::app(test_state(config))
        .oneshot(json_request("POST", "/v1/certificates", ada()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let cert = &body["certificate"];
    let id = cert["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(cert["email"], "ada@example.com");
    assert_eq!(cert["isRevoked"], false);
    assert_eq!(cert["createdAt"], cert["updatedAt"]);
    assert_eq!(
        body["verificationUrl"],
        format!("https://certs.example.org/verify/{id}")
    );
}

#[tokio::test]
async fn test_issue_certificate_missing_field_is_422() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/v1/certificates",
            json!({"recipientName": "Ada", "email": "ada@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("courseName is required"));
}

#[tokio::test]
async fn test_issue_certificate_malformed_json_is_400() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/certificates")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let huge = "x".repeat(2 * 1024 * 1024);
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/v1/certificates",
            json!({"recipientName": huge, "email": "a@b.c", "courseName": "C"}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error(), "{}", response.status());
}

// -- Lookup -------------------------------------------------------------------

#[tokio::test]
async fn test_get_certificate_round_trip_and_404() {
    let state = test_state(AppConfig::default());
    let cert = issue(&state, ada()).await;
    let id = cert["id"].as_str().unwrap();

    let response = certs_api::app(state.clone())
        .oneshot(get(&format!("/v1/certificates/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, cert);

    let response = certs_api::app(state)
        .oneshot(get("/v1/certificates/missing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_lookup_by_email_is_case_insensitive() {
    let state = test_state(AppConfig::default());
    issue(&state, ada()).await;
    issue(
        &state,
        json!({"recipientName": "Bob", "email": "bob@example.com", "courseName": "C"}),
    )
    .await;

    let response = certs_api::app(state)
        .oneshot(get("/v1/certificates?email=ADA%40EXAMPLE.COM"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["recipientName"], "Ada Lovelace");
}

#[tokio::test]
async fn test_search_by_name_prefix() {
    let state = test_state(AppConfig::default());
    for name in ["Adam Smith", "Ada Lovelace", "Grace Hopper"] {
        issue(
            &state,
            json!({"recipientName": name, "email": "x@example.com", "courseName": "C"}),
        )
        .await;
    }

    let response = certs_api::app(state.clone())
        .oneshot(get("/v1/certificates?name=Ada"))
        .await
        .unwrap();
    let names: Vec<Value> = body_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["recipientName"].clone())
        .collect();
    assert_eq!(names, vec![json!("Ada Lovelace"), json!("Adam Smith")]);

    let response = certs_api::app(state)
        .oneshot(get("/v1/certificates?name=Ada%20"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_combined_filters_are_rejected() {
    let response = test_app()
        .oneshot(get("/v1/certificates?email=a%40b.c&name=Ada"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_all_without_filters() {
    let state = test_state(AppConfig::default());
    issue(&state, ada()).await;
    issue(&state, ada()).await;
    let response = certs_api::app(state)
        .oneshot(get("/v1/certificates"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

// -- Update & Revocation ------------------------------------------------------

#[tokio::test]
async fn test_patch_merges_fields() {
    let state = test_state(AppConfig::default());
    let cert = issue(&state, ada()).await;
    let id = cert["id"].as_str().unwrap();

    let response = certs_api::app(state)
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/certificates/{id}"),
            json!({"organization": "Analytical Society", "email": "ADA@NEW.ORG"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["organization"], "Analytical Society");
    assert_eq!(updated["email"], "ada@new.org");
    assert_eq!(updated["recipientName"], "Ada Lovelace");
    assert_eq!(updated["createdAt"], cert["createdAt"]);
}

#[tokio::test]
async fn test_patch_does_not_validate_field_values() {
    let state = test_state(AppConfig::default());
    let cert = issue(&state, ada()).await;
    let id = cert["id"].as_str().unwrap();

    let response = certs_api::app(state)
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/certificates/{id}"),
            json!({"recipientName": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["recipientName"], "");
}

#[tokio::test]
async fn test_patch_unknown_id_with_blank_field_is_404() {
    let response = test_app()
        .oneshot(json_request(
            "PATCH",
            "/v1/certificates/ghost",
            json!({"email": "  "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_unknown_id_is_404() {
    let response = test_app()
        .oneshot(json_request(
            "PATCH",
            "/v1/certificates/ghost",
            json!({"courseName": "New"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_revoke_then_verify_is_invalid() {
    let state = test_state(AppConfig::default());
    let cert = issue(&state, ada()).await;
    let id = cert["id"].as_str().unwrap();

    let response = certs_api::app(state.clone())
        .oneshot(get(&format!("/v1/verify/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let verdict = body_json(response).await;
    assert_eq!(verdict["valid"], true);
    assert_eq!(verdict["certificate"], cert);

    let response = certs_api::app(state.clone())
        .oneshot(empty("POST", &format!("/v1/certificates/{id}/revoke")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["isRevoked"], true);

    // Revoking twice is not an error.
    let response = certs_api::app(state.clone())
        .oneshot(empty("POST", &format!("/v1/certificates/{id}/revoke")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = certs_api::app(state)
        .oneshot(get(&format!("/api/certificates/verify/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let verdict = body_json(response).await;
    assert_eq!(verdict["valid"], false);
    assert_eq!(verdict["reason"], "revoked");
    assert!(verdict.get("certificate").is_none());
}

#[tokio::test]
async fn test_patch_cannot_reinstate_revoked_certificate() {
    let state = test_state(AppConfig::default());
    let cert = issue(&state, ada()).await;
    let id = cert["id"].as_str().unwrap();

    certs_api::app(state.clone())
        .oneshot(empty("POST", &format!("/v1/certificates/{id}/revoke")))
        .await
        .unwrap();
    let response = certs_api::app(state)
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/certificates/{id}"),
            json!({"isRevoked": false}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["isRevoked"], true);
}

#[tokio::test]
async fn test_revoke_unknown_id_is_404() {
    let response = test_app()
        .oneshot(empty("POST", "/v1/certificates/ghost/revoke"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Verification -------------------------------------------------------------

#[tokio::test]
async fn test_verify_unknown_id_is_negative_verdict() {
    let response = test_app()
        .oneshot(get("/v1/verify/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let verdict = body_json(response).await;
    assert_eq!(verdict["valid"], false);
    assert_eq!(verdict["reason"], "not_found");
    assert_eq!(verdict["message"], "No certificate exists with this ID");
}

// -- Bulk Clear ---------------------------------------------------------------

#[tokio::test]
async fn test_clear_is_forbidden_by_default() {
    let state = test_state(AppConfig::default());
    issue(&state, ada()).await;

    let response = certs_api::app(state.clone())
        .oneshot(empty("DELETE", "/v1/certificates?confirm=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_clear_requires_confirmation() {
    let state = test_state(AppConfig {
        allow_clear: true,
        ..AppConfig::default()
    });
    issue(&state, ada()).await;

    let response = certs_api::app(state.clone())
        .oneshot(empty("DELETE", "/v1/certificates"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(state.store.list_all().await.unwrap().len(), 1);

    let response = certs_api::app(state.clone())
        .oneshot(empty("DELETE", "/v1/certificates?confirm=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed"], 1);
    assert!(state.store.list_all().await.unwrap().is_empty());
}

// -- Metrics & OpenAPI --------------------------------------------------------

#[tokio::test]
async fn test_metrics_count_requests_and_errors() {
    let state = test_state(AppConfig::default());
    issue(&state, ada()).await;
    certs_api::app(state.clone())
        .oneshot(get("/v1/certificates/missing"))
        .await
        .unwrap();

    assert_eq!(state.metrics.requests(), 2);
    assert_eq!(state.metrics.errors(), 1);

    let response = certs_api::app(state)
        .oneshot(get("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let text = body_string(response).await;
    assert!(text.contains("# TYPE certs_http_requests_total counter"), "{text}");
    assert!(text.contains(r#"method="POST""#), "{text}");
    assert!(text.contains(r#"status="201""#), "{text}");
    let error_line = text
        .lines()
        .find(|l| l.starts_with("certs_http_errors_total{"))
        .unwrap_or_else(|| panic!("no error series in {text}"));
    assert!(error_line.contains(r#"status="404""#), "{error_line}");
    assert!(!error_line.contains("missing"), "ids must not be label values");
    assert!(error_line.ends_with(" 1"), "{error_line}");
    assert!(text.contains("certs_http_server_errors_total 0"), "{text}");
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert_eq!(spec["info"]["title"], "Certificates API");
    assert!(spec["paths"]["/v1/verify/{id}"].is_object());
}
