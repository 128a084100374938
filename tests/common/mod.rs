use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use ledger_core::{
    app::{self, AppState},
    models::account::Account,
    services::{account_service, auth_service::StaticAuthorizer},
    store::MemoryLedger,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

#[allow(dead_code)]
pub const TOKEN: &str = "teller-token";

pub async fn open(ledger: &MemoryLedger, deposit: Decimal) -> Account {
    account_service::open_account(ledger, "2000", "savings", deposit)
        .await
        .unwrap()
}

/// Router over `ledger` where `TOKEN` may do everything.
#[allow(dead_code)]
pub fn app(ledger: &MemoryLedger) -> Router {
    let authorizer = StaticAuthorizer::new().grant_all(TOKEN);
    app::router(AppState::new(
        Arc::new(ledger.clone()),
        Arc::new(authorizer),
    ))
}

#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Read a decimal rendered either as a JSON string or number.
#[allow(dead_code)]
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}
