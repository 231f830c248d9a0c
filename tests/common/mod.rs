//! Common test utilities

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::util::ServiceExt;

use cash_closing::api::middleware::hash_api_key;
use cash_closing::api::{self, AuthState, UnauthorizedAttempt};
use cash_closing::app::Application;
use cash_closing::cache::ManualClock;
use cash_closing::config::ApiKeyEntry;
use cash_closing::Config;

pub const API_KEY: &str = "test_key_123";

/// Router over in-memory stores plus handles the tests inspect
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub rejected: Arc<Mutex<Vec<UnauthorizedAttempt>>>,
}

/// Build the full application with default config and one API key
pub fn setup_app() -> TestApp {
    let config = Config::from_lookup(|_| None).expect("default config");
    let clock = Arc::new(ManualClock::new());
    let application = Application::in_memory(&config, clock.clone());

    let rejected = Arc::new(Mutex::new(Vec::new()));
    let sink = rejected.clone();
    let auth = AuthState::new(vec![ApiKeyEntry {
        name: "Test Key".to_string(),
        key_hash: hash_api_key(API_KEY),
    }])
    .with_unauthorized_hook(Arc::new(move |attempt: &UnauthorizedAttempt| {
        sink.lock().unwrap().push(attempt.clone());
    }));

    TestApp {
        router: api::build_router(application.state.clone(), auth),
        clock,
        rejected,
    }
}

impl TestApp {
    /// Send an authenticated request and decode the JSON body
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-API-Key", API_KEY)
            .header("X-Operator", "nina");
        self.dispatch(builder, body).await
    }

    pub async fn dispatch(
        &self,
        builder: axum::http::request::Builder,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn record_sale(&self, date: &str, amount: &str, method: &str) {
        let (status, _) = self
            .send(
                "POST",
                "/api/v1/sales",
                Some(serde_json::json!({
                    "business_date": date,
                    "amount": amount,
                    "payment_method": method,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "sale was not recorded");
    }
}

/// Decimal from a JSON string or number field
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}
