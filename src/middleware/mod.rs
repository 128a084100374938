//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can short-circuit requests (reject unauthorized) before any ledger work happens.

/// Bearer token authorization middleware
pub mod auth;
