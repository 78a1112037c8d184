//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use verdant_api::auth::{AUDIENCE, Claims};
use verdant_api::state::{AppState, Services, Settings};
use verdant_learning::application::LearningSettings;
use verdant_test_support::{
    FixedClock, InMemoryStore, RecordingGateway, RecordingMailer, SequenceRng,
};

pub const BASE_URL: &str = "https://verdant.test";
pub const WEBHOOK_SECRET: &str = "whsec_test";
const JWT_SECRET: &str = "jwt-test-secret";

/// Fixed timestamp used across all integration tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// The full app over an in-memory store, with handles on the doubles so
/// tests can seed data and inspect side effects.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub gateway: Arc<RecordingGateway>,
    router: Router,
}

impl TestApp {
    /// Verification codes come out as `VRD-ABCD-EFGH`.
    pub fn new() -> Self {
        Self::with_rng(SequenceRng::counting(8))
    }

    pub fn with_rng(rng: SequenceRng) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let gateway = Arc::new(RecordingGateway::new());
        let services = Services {
            clock: Arc::new(FixedClock(now())),
            rng: Arc::new(Mutex::new(rng)),
            mailer: mailer.clone(),
            gateway: gateway.clone(),
        };
        let settings = Settings {
            base_url: BASE_URL.to_owned(),
            webhook_secret: WEBHOOK_SECRET.to_owned(),
            jwt_secret: JWT_SECRET.to_owned(),
            learning: LearningSettings::default(),
        };
        let router = verdant_api::router(AppState::new(store.clone(), services, settings));
        Self {
            store,
            mailer,
            gateway,
            router,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Mints an access token for `user_id`, valid for one hour.
pub fn token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id,
        exp: usize::try_from(Utc::now().timestamp() + 3600).unwrap(),
        aud: AUDIENCE.to_owned(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Sends a request and returns the status, headers and raw body.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, HeaderMap, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes)
}

fn json_of(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap()
    }
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, "GET", uri, token, None).await;
    (status, json_of(&bytes))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, "POST", uri, token, Some(body)).await;
    (status, json_of(&bytes))
}

/// Send a bodiless POST request and return the response.
pub async fn post_empty(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, "POST", uri, token, None).await;
    (status, json_of(&bytes))
}

/// Send a DELETE request and return the status.
pub async fn delete(app: Router, uri: &str, token: Option<&str>) -> StatusCode {
    send(app, "DELETE", uri, token, None).await.0
}

/// POST a raw webhook body, with the signature header when given.
pub async fn post_webhook(
    app: Router,
    body: &[u8],
    signature: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header(CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    let request = builder.body(Body::from(body.to_vec())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, json_of(&bytes))
}
