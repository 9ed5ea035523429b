//! API Integration Tests
//!
//! Drive the full router over the in-memory stores, one request at a time.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use paydesk_api::{create_test_router, AppState};
use paydesk_auth::{AuthConfig, BucketLimit, Registration};
use paydesk_db::Stores;
use paydesk_types::{FixedClock, Role};
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "Password123";

fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt.secret = "integration-test-secret-at-least-32-bytes".to_string();
    config.password.memory_cost = 4096;
    config.password.time_cost = 1;
    config.rate_limit.general = BucketLimit::new(1_000, Duration::from_secs(900));
    config.rate_limit.payment_create = BucketLimit::new(1_000, Duration::from_secs(900));
    config.rate_limit.auth = BucketLimit::new(1_000, Duration::from_secs(900));
    config
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(test_auth_config())
    }

    fn with_config(config: AuthConfig) -> Self {
        let state = Arc::new(AppState::new(
            Stores::in_memory(),
            config,
            Arc::new(FixedClock::default()),
        ));
        Self {
            router: create_test_router(state.clone()),
            state,
        }
    }

    /// Register a customer through the API and return its token
    async fn customer(&self, full_name: &str, id_number: &str, account_number: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "fullName": full_name,
                    "idNumber": id_number,
                    "accountNumber": account_number,
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Provision an employee directly and log in through the API
    async fn employee(&self) -> String {
        self.state
            .auth
            .provision(
                &Registration {
                    full_name: "Thabo Mokoena".to_string(),
                    id_number: "1234567890123".to_string(),
                    account_number: "100000000001".to_string(),
                    password: PASSWORD.to_string(),
                },
                Role::Employee,
            )
            .await
            .unwrap();

        let (status, body) = self
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({
                    "accountNumber": "100000000001",
                    "fullName": "Thabo Mokoena",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Make a request and decode the JSON response
    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(method, uri, token, body).await;
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));
        (status, json)
    }
}

fn payment_body() -> Value {
    json!({
        "amount": "500.25",
        "currency": "ZAR",
        "provider": "Western Union",
        "accountNumber": "200000000001",
    })
}

fn transfer_body(bank_name: &str) -> Value {
    json!({
        "amount": "1500",
        "currency": "ZAR",
        "beneficiaryName": "Sipho Zulu",
        "beneficiaryAccountNumber": "1234567890",
        "bankName": bank_name,
        "swiftCode": "NEDSZAJJXXX",
        "reference": "Invoice 42",
    })
}

// =============================================================================
// Public Endpoints
// =============================================================================

mod public_endpoints {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, json) = app.request("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready() {
        let app = TestApp::new();
        let (status, json) = app.request("GET", "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ready");
    }

    #[tokio::test]
    async fn test_security_headers_on_every_response() {
        let app = TestApp::new();
        for uri in ["/health", "/api/v1/payments/history"] {
            let response = app.send("GET", uri, None, None).await;
            let headers = response.headers();
            assert_eq!(headers["x-content-type-options"], "nosniff");
            assert_eq!(headers["x-frame-options"], "DENY");
            assert!(headers.contains_key("strict-transport-security"));
            assert!(headers.contains_key("x-request-id"));
        }
    }
}

// =============================================================================
// Authentication
// =============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_register_then_login() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let (status, json) = app.request("GET", "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["accountNumber"], "200000000001");
        assert_eq!(json["role"], "customer");

        let (status, json) = app
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({
                    "accountNumber": "200000000001",
                    "fullName": "Itumeleng Ndlovu",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tokenType"], "Bearer");
    }

    #[tokio::test]
    async fn test_register_duplicate_account() {
        let app = TestApp::new();
        app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let (status, json) = app
            .request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "fullName": "Someone Else",
                    "idNumber": "1234567890126",
                    "accountNumber": "200000000001",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "ACCOUNT_EXISTS");
    }

    #[tokio::test]
    async fn test_register_reports_every_field() {
        let app = TestApp::new();
        let (status, json) = app
            .request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "fullName": "J",
                    "idNumber": "123",
                    "accountNumber": "abc",
                    "password": "short",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");

        let fields: Vec<&str> = json["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        for field in ["fullName", "idNumber", "accountNumber", "password"] {
            assert!(fields.contains(&field), "missing {field} in {fields:?}");
        }
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = TestApp::new();
        app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let (status, json) = app
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({
                    "accountNumber": "200000000001",
                    "fullName": "Itumeleng Ndlovu",
                    "password": "Password124",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens() {
        let app = TestApp::new();

        let (status, json) = app.request("GET", "/api/v1/payments/history", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHENTICATED");

        let (status, _) = app
            .request("GET", "/api/v1/payments/history", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// =============================================================================
// Payments and Transfers
// =============================================================================

mod payments {
    use super::*;

    #[tokio::test]
    async fn test_create_payment_and_history() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let (status, created) = app
            .request("POST", "/api/v1/payments", Some(&token), Some(payment_body()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        assert_eq!(created["status"], "initialized");
        assert_eq!(created["kind"], "payment");
        assert_eq!(created["amount"], "500.25");

        let (status, history) = app
            .request("GET", "/api/v1/payments/history", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_payment_amount_validation() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        for amount in [json!("0"), json!("-5"), json!("1000000.01"), json!("1.23456"), json!("abc")] {
            let mut body = payment_body();
            body["amount"] = amount.clone();
            let (status, json) = app.request("POST", "/api/v1/payments", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
            assert_eq!(json["code"], "VALIDATION_ERROR");
            assert_eq!(json["details"][0]["field"], "amount");
        }

        let mut body = payment_body();
        body["amount"] = json!(1000000);
        let (status, _) = app.request("POST", "/api/v1/payments", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_payment_for_someone_elses_account_is_rejected() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let mut body = payment_body();
        body["accountNumber"] = json!("200000000002");
        let (status, json) = app.request("POST", "/api/v1/payments", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["details"][0]["field"], "accountNumber");
    }

    #[tokio::test]
    async fn test_transfer_matching_bank_is_pending() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let (status, json) = app
            .request(
                "POST",
                "/api/v1/payments/transfer",
                Some(&token),
                Some(transfer_body("Nedbank Limited")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["directoryBankName"], "Nedbank Limited");
    }

    #[tokio::test]
    async fn test_transfer_mismatched_bank_is_auto_rejected() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let (status, json) = app
            .request(
                "POST",
                "/api/v1/payments/transfer",
                Some(&token),
                Some(transfer_body("Absa Bank Limited")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["status"], "rejected");
    }

    #[tokio::test]
    async fn test_customer_cannot_read_another_customers_account() {
        let app = TestApp::new();
        let first = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;
        app.customer("Ndelisiwe Khumalo", "1234567890126", "200000000002").await;

        let (status, json) = app
            .request("GET", "/api/v1/accounts/200000000002/transactions", Some(&first), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new();
        let token = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/payments")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// Employee Review
// =============================================================================

mod review {
    use super::*;

    async fn pending_transfer(app: &TestApp, customer: &str) -> String {
        let (status, json) = app
            .request(
                "POST",
                "/api/v1/payments/transfer",
                Some(customer),
                Some(transfer_body("Nedbank Limited")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_customer_is_forbidden_from_review() {
        let app = TestApp::new();
        let customer = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;
        let id = pending_transfer(&app, &customer).await;

        let (status, _) = app.request("GET", "/api/v1/payments", Some(&customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Forbidden even with an invalid body
        let (status, _) = app
            .request(
                "PATCH",
                &format!("/api/v1/payments/{id}/status"),
                Some(&customer),
                Some(json!({ "status": "nonsense" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .request("POST", &format!("/api/v1/payments/{id}/approve"), Some(&customer), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_pending_queue_and_approve_is_idempotent() {
        let app = TestApp::new();
        let customer = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;
        let employee = app.employee().await;
        let id = pending_transfer(&app, &customer).await;

        let (status, queue) = app.request("GET", "/api/v1/payments", Some(&employee), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue.as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/payments/{id}/approve");
        let (status, json) = app.request("POST", &uri, Some(&employee), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "approved");

        let (status, json) = app.request("POST", &uri, Some(&employee), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "approved");

        let (_, queue) = app.request("GET", "/api/v1/payments", Some(&employee), None).await;
        assert!(queue.as_array().unwrap().is_empty());

        let (status, approved) = app
            .request("GET", "/api/v1/payments?status=APPROVED", Some(&employee), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_conflict() {
        let app = TestApp::new();
        let customer = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;
        let employee = app.employee().await;
        let id = pending_transfer(&app, &customer).await;

        let (status, _) = app
            .request("POST", &format!("/api/v1/payments/{id}/reject"), Some(&employee), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = app
            .request(
                "PATCH",
                &format!("/api/v1/payments/{id}/status"),
                Some(&employee),
                Some(json!({ "status": "submitted" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_unknown_status_is_validation_error() {
        let app = TestApp::new();
        let employee = app.employee().await;

        let (status, json) = app
            .request("GET", "/api/v1/payments?status=paid", Some(&employee), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["details"][0]["field"], "status");
    }

    #[tokio::test]
    async fn test_override_back_to_pending() {
        let app = TestApp::new();
        let customer = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;
        let employee = app.employee().await;

        let (_, json) = app
            .request(
                "POST",
                "/api/v1/payments/transfer",
                Some(&customer),
                Some(transfer_body("Absa Bank Limited")),
            )
            .await;
        let id = json["id"].as_str().unwrap().to_string();
        assert_eq!(json["status"], "rejected");

        let (status, json) = app
            .request(
                "POST",
                &format!("/api/v1/payments/{id}/override"),
                Some(&employee),
                Some(json!({ "status": "pending", "reason": "Bank name confirmed by phone" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["status"], "pending");
    }

    #[tokio::test]
    async fn test_delete_record() {
        let app = TestApp::new();
        let customer = app.customer("Itumeleng Ndlovu", "1234567890125", "200000000001").await;
        let employee = app.employee().await;
        let id = pending_transfer(&app, &customer).await;
        let uri = format!("/api/v1/payments/{id}");

        let response = app.send("DELETE", &uri, Some(&employee), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, _) = app.request("GET", &uri, Some(&employee), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.request("DELETE", &uri, Some(&employee), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let app = TestApp::new();
        let employee = app.employee().await;

        let (status, json) = app
            .request("GET", "/api/v1/payments/not-a-uuid", Some(&employee), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
    }
}

// =============================================================================
// Rate Limiting
// =============================================================================

mod rate_limiting {
    use super::*;

    #[tokio::test]
    async fn test_auth_bucket_returns_retry_after() {
        let mut config = test_auth_config();
        config.rate_limit.auth = BucketLimit::new(2, Duration::from_secs(900));
        let app = TestApp::with_config(config);

        let login = json!({
            "accountNumber": "200000000001",
            "fullName": "Nobody Here",
            "password": PASSWORD,
        });

        for _ in 0..2 {
            let (status, _) = app
                .request("POST", "/api/v1/auth/login", None, Some(login.clone()))
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let response = app.send("POST", "/api/v1/auth/login", None, Some(login)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response.headers()[header::RETRY_AFTER]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry_after > 0 && retry_after <= 900);

        // Other buckets are unaffected
        let (status, _) = app.request("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn login_from(app: &TestApp, peer: SocketAddr, forwarded_for: &str) -> StatusCode {
        let body = json!({
            "accountNumber": "200000000001",
            "fullName": "Nobody Here",
            "password": PASSWORD,
        });
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Forwarded-For", forwarded_for)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        app.router.clone().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_for_does_not_reset_the_limit() {
        let mut config = test_auth_config();
        config.rate_limit.auth = BucketLimit::new(2, Duration::from_secs(900));
        let app = TestApp::with_config(config);
        let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();

        let mut limited = 0;
        for i in 0..10 {
            if login_from(&app, peer, &format!("198.51.100.{i}")).await == StatusCode::TOO_MANY_REQUESTS {
                limited += 1;
            }
        }

        assert_eq!(limited, 8);
        assert_eq!(app.state.auth.guard.tracked().await, 1);
    }

    #[tokio::test]
    async fn test_trusted_proxy_headers_key_per_forwarded_client() {
        let mut config = test_auth_config();
        config.rate_limit.auth = BucketLimit::new(2, Duration::from_secs(900));
        config.rate_limit.trust_proxy_headers = true;
        let app = TestApp::with_config(config);
        let proxy: SocketAddr = "10.0.0.2:8443".parse().unwrap();

        for _ in 0..2 {
            assert_eq!(login_from(&app, proxy, "198.51.100.1").await, StatusCode::UNAUTHORIZED);
        }
        assert_eq!(
            login_from(&app, proxy, "198.51.100.1").await,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(login_from(&app, proxy, "198.51.100.2").await, StatusCode::UNAUTHORIZED);
    }
}
