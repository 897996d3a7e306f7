use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bigdecimal::BigDecimal;
use serde_json::Value;
use tower::ServiceExt;

use fusaf_payments::adapters::InMemoryRegistrationRepository;
use fusaf_payments::config::Secret;
use fusaf_payments::domain::{PaymentStatus, PaymentUpdate, Registration, RegistrationStatus};
use fusaf_payments::liqpay::{codec, CallbackPayload, CheckoutForm, LiqPay, DEFAULT_CHECKOUT_URL};
use fusaf_payments::ports::{
    Notifier, NotifyError, RegistrationRepository, RepositoryError, RepositoryResult, UpdateOutcome,
};
use fusaf_payments::{create_app, AppState, HttpOptions};

const PRIVATE_KEY: &str = "sandbox_private_key";
const ORDER_ID: &str = "fusaf_comp123_reg456_1700000000000";
const ADMIN_KEY: &str = "admin-test-key";

#[derive(Default)]
struct CountingNotifier {
    sent: AtomicUsize,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify_payment_confirmed(&self, _registration_id: &str) -> Result<(), NotifyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: InMemoryRegistrationRepository,
    notifier: Arc<CountingNotifier>,
    liqpay: LiqPay,
}

impl TestApp {
    async fn new() -> Self {
        let liqpay = LiqPay::new("sandbox_public_key", Secret::new(PRIVATE_KEY), DEFAULT_CHECKOUT_URL);
        let store = InMemoryRegistrationRepository::new();
        store
            .insert(Registration::new(
                "reg456",
                "comp123",
                "member-9",
                BigDecimal::from(350),
                "UAH",
            ))
            .await;
        let notifier = Arc::new(CountingNotifier::default());

        let state = AppState::new(
            liqpay.clone(),
            "fusaf",
            Arc::new(store.clone()),
            notifier.clone(),
        )
        .with_admin_key(Secret::new(ADMIN_KEY));

        Self {
            router: create_app(state, HttpOptions::default()),
            store,
            notifier,
            liqpay,
        }
    }

    async fn callback(&self, status: &str, order_id: &str) -> (StatusCode, Value) {
        let data = codec::encode(&CallbackPayload::new(status, order_id)).unwrap();
        let signature = self.liqpay.sign(&data);
        self.post_form(&data, &signature).await
    }

    async fn post_form(&self, data: &str, signature: &str) -> (StatusCode, Value) {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", data)
            .append_pair("signature", signature)
            .finish();
        self.send(
            Request::builder()
                .method("POST")
                .uri("/payments/callback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn stored(&self) -> Registration {
        self.store
            .find_by_registration_id("reg456")
            .await
            .unwrap()
            .unwrap()
    }

    async fn notifications(&self) -> usize {
        // dispatch is spawned; give it a moment to land
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.notifier.sent.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_success_callback_confirms_registration() {
    let app = TestApp::new().await;

    let (status, body) = app.callback("success", ORDER_ID).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["payment_status"], "paid");
    assert_eq!(body["registration_status"], "confirmed");

    let stored = app.stored().await;
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.status, RegistrationStatus::Confirmed);
    assert!(stored.paid_at.is_some());
    assert_eq!(app.notifications().await, 1);
}

#[tokio::test]
async fn test_forged_signature_changes_nothing() {
    let app = TestApp::new().await;
    let data = codec::encode(&CallbackPayload::new("success", ORDER_ID)).unwrap();

    let (status, body) = app.post_form(&data, "Zm9yZ2VkLXNpZ25hdHVyZQ==").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(app.stored().await.payment_status, PaymentStatus::Pending);
    assert_eq!(app.notifications().await, 0);
}

#[tokio::test]
async fn test_missing_form_fields_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/payments/callback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("data=eyJ9"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/payments/callback")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_registration_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .callback("success", "fusaf_comp123_ghost_1700000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .callback("success", "fusaf_othercomp_reg456_1700000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_order_id_is_bad_request() {
    let app = TestApp::new().await;

    let (status, _) = app.callback("success", "bad_format").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .callback("success", "other_comp123_reg456_1700000000000")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_success_is_idempotent() {
    let app = TestApp::new().await;

    let (first, _) = app.callback("success", ORDER_ID).await;
    let paid_at = app.stored().await.paid_at;
    let (second, body) = app.callback("success", ORDER_ID).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["outcome"], "unchanged");
    assert_eq!(app.stored().await.paid_at, paid_at);
    assert_eq!(app.notifications().await, 1);
}

#[tokio::test]
async fn test_late_callbacks_never_overwrite_refund() {
    let app = TestApp::new().await;

    app.callback("success", ORDER_ID).await;
    let (_, body) = app.callback("reversed", ORDER_ID).await;
    assert_eq!(body["payment_status"], "refunded");
    assert_eq!(body["registration_status"], "cancelled");

    for late in ["processing", "wait_secure", "success"] {
        let (status, body) = app.callback(late, ORDER_ID).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "ignored");
    }

    let stored = app.stored().await;
    assert_eq!(stored.payment_status, PaymentStatus::Refunded);
    assert_eq!(stored.status, RegistrationStatus::Cancelled);
}

#[tokio::test]
async fn test_checkout_then_callback_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/payments/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"registration_id":"reg456"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let form: CheckoutForm = serde_json::from_value(body).unwrap();
    assert_eq!(form.checkout_url, DEFAULT_CHECKOUT_URL);
    assert!(app.liqpay.verify(&form.data, &form.signature));

    let (status, body) = app.callback("success", &form.order_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_status"], "paid");

    // a paid registration cannot be checked out again
    let (status, _) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/payments/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"registration_id":"reg456"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_rejects_bad_input() {
    let app = TestApp::new().await;

    for body in [r#"{"registration_id":"reg_456"}"#, r#"{"id":"reg456"}"#, "not json"] {
        let (status, _) = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/payments/checkout")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[tokio::test]
async fn test_payment_view_requires_admin_key() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/registrations/reg456/payment")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/registrations/reg456/payment")
                .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "reg456");
    assert_eq!(body["payment_status"], "pending");
    assert_eq!(body["fee_amount"], "350");

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/registrations/ghost/payment")
                .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

/// Store that finds the registration but cannot write to it.
struct UnavailableStore;

#[async_trait]
impl RegistrationRepository for UnavailableStore {
    async fn find_by_registration_id(&self, id: &str) -> RepositoryResult<Option<Registration>> {
        Ok(Some(Registration::new(
            id,
            "comp123",
            "member-9",
            BigDecimal::from(350),
            "UAH",
        )))
    }

    async fn update_registration_and_payment(
        &self,
        _id: &str,
        _expected: PaymentStatus,
        _update: &PaymentUpdate,
    ) -> RepositoryResult<UpdateOutcome> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn attach_order(&self, id: &str, _order_id: &str) -> RepositoryResult<Registration> {
        Err(RepositoryError::NotFound(id.to_string()))
    }
}

#[tokio::test]
async fn test_storage_failure_returns_500_without_notification() {
    let liqpay = LiqPay::new("sandbox_public_key", Secret::new(PRIVATE_KEY), DEFAULT_CHECKOUT_URL);
    let notifier = Arc::new(CountingNotifier::default());
    let state = AppState::new(liqpay.clone(), "fusaf", Arc::new(UnavailableStore), notifier.clone());
    let router = create_app(state, HttpOptions::default());

    let data = codec::encode(&CallbackPayload::new("success", ORDER_ID)).unwrap();
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("data", &data)
        .append_pair("signature", &liqpay.sign(&data))
        .finish();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments/callback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], 500);
    assert!(json["error"].as_str().unwrap().contains("payment storage unavailable"));
    assert!(!json["error"].as_str().unwrap().contains("pool"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_signature_with_surrounding_whitespace_rejected() {
    let app = TestApp::new().await;
    let data = codec::encode(&CallbackPayload::new("success", ORDER_ID)).unwrap();
    let signature = format!(" {} ", app.liqpay.sign(&data));

    let (status, _) = app.post_form(&data, &signature).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored().await.payment_status, PaymentStatus::Pending);
}
