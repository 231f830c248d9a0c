//! API Middleware
//!
//! API key authentication and request logging.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::ApiKeyEntry;
use crate::domain::OperationContext;
use crate::error::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const OPERATOR_HEADER: &str = "x-operator";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const MAX_OPERATOR_LEN: usize = 100;

/// API key that authenticated the request
#[derive(Debug, Clone)]
pub struct AuthenticatedApiKey {
    pub name: String,
}

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingKey,
    UnknownKey,
}

/// Details handed to the unauthorized hook
#[derive(Debug, Clone)]
pub struct UnauthorizedAttempt {
    pub failure: AuthFailure,
    pub method: String,
    pub path: String,
    pub correlation_id: Uuid,
}

/// Callback run whenever a request is rejected for lack of credentials
pub type UnauthorizedHook = Arc<dyn Fn(&UnauthorizedAttempt) + Send + Sync>;

/// Shared state of the auth middleware
#[derive(Clone)]
pub struct AuthState {
    keys: Arc<Vec<ApiKeyEntry>>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl AuthState {
    pub fn new(keys: Vec<ApiKeyEntry>) -> Self {
        Self {
            keys: Arc::new(keys),
            on_unauthorized: None,
        }
    }

    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    /// Name of the configured key matching `presented`, if any
    pub fn authenticate(&self, presented: &str) -> Option<&str> {
        let digest = hash_api_key(presented);
        self.keys
            .iter()
            .find(|entry| bool::from(entry.key_hash.as_bytes().ct_eq(digest.as_bytes())))
            .map(|entry| entry.name.as_str())
    }

    fn reject(&self, attempt: UnauthorizedAttempt) -> Response {
        tracing::warn!(
            failure = ?attempt.failure,
            method = %attempt.method,
            path = %attempt.path,
            correlation_id = %attempt.correlation_id,
            "Rejected unauthenticated request"
        );

        if let Some(hook) = &self.on_unauthorized {
            hook(&attempt);
        }

        let error = match attempt.failure {
            AuthFailure::MissingKey => AppError::MissingApiKey,
            AuthFailure::UnknownKey => AppError::InvalidApiKey,
        };
        with_correlation_header(error.into_response(), attempt.correlation_id)
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("keys", &self.keys.len())
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

/// SHA-256 hex digest of an API key, the form stored in `API_KEYS`
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Key from `X-API-Key`, falling back to `Authorization: Bearer`
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, API_KEY_HEADER).or_else(|| {
        header_str(headers, "authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

fn with_correlation_header(mut response: Response, correlation_id: Uuid) -> Response {
    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

// =========================================================================
// API Key Authentication Middleware
// =========================================================================

/// Validate the API key and attach an `OperationContext` to the request
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let headers = request.headers();

    let correlation_id = header_str(headers, CORRELATION_ID_HEADER)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let attempt = |failure| UnauthorizedAttempt {
        failure,
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        correlation_id,
    };

    let key_name = match presented_key(headers) {
        None => return auth.reject(attempt(AuthFailure::MissingKey)),
        Some(key) => match auth.authenticate(key) {
            Some(name) => name.to_string(),
            None => return auth.reject(attempt(AuthFailure::UnknownKey)),
        },
    };

    let mut context = OperationContext::new()
        .with_api_key(key_name.clone())
        .with_correlation_id(correlation_id);

    if let Some(operator) = header_str(headers, OPERATOR_HEADER) {
        context = context.with_operator(operator.chars().take(MAX_OPERATOR_LEN).collect::<String>());
    }

    request
        .extensions_mut()
        .insert(AuthenticatedApiKey { name: key_name });
    request.extensions_mut().insert(context);

    with_correlation_header(next.run(request).await, correlation_id)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    // Set by the auth middleware, including on rejections
    let correlation_id = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    response
}
