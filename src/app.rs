//! Router construction and shared handler state.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, services::auth_service::Authorizer, store::LedgerStore};

/// Route paths, shared by the router and the authorization middleware.
pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const CUSTOMER_ACCOUNTS: &str = "/api/v1/customers/{customer_id}/accounts";
    pub const ACCOUNT: &str = "/api/v1/accounts/{account_id}";
    pub const ACCOUNT_TRANSACTIONS: &str = "/api/v1/accounts/{account_id}/transactions";
    pub const TRANSACTIONS: &str = "/api/v1/transactions";
    pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";
}

/// State shared with every handler via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { store, authorizer }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    // Every API route goes through the authorization middleware
    let authorized_routes = Router::new()
        .route(
            routes::CUSTOMER_ACCOUNTS,
            post(handlers::accounts::open_account),
        )
        .route(routes::ACCOUNT, get(handlers::accounts::get_account))
        .route(
            routes::ACCOUNT_TRANSACTIONS,
            get(handlers::accounts::list_account_transactions),
        )
        .route(
            routes::TRANSACTIONS,
            post(handlers::transactions::create_transaction),
        )
        .route(
            routes::TRANSACTION,
            get(handlers::transactions::get_transaction),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no authorization required)
        .route(routes::HEALTH, get(handlers::health::health_check))
        .merge(authorized_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
