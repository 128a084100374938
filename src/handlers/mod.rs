//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives already-decoded request data (JSON body, URL params)
//! 2. Calls a service
//! 3. Returns HTTP response (JSON, status code)

/// Account endpoints
pub mod accounts;
/// Service health endpoint
pub mod health;
/// Transaction endpoints
pub mod transactions;
