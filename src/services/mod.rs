//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate requests and drive the ledger store; they never see HTTP types.

pub mod account_service;
pub mod auth_service;
pub mod transaction_service;
pub mod validator;
