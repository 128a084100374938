//! Ledger core for a banking service.
//!
//! Opens accounts and records deposits and withdrawals while keeping each
//! account's stored balance consistent with its transaction history.
//!
//! # Layout
//!
//! - [`store`]: ledger persistence with atomic scopes (PostgreSQL and in-memory)
//! - [`services`]: validation, the transaction applier and the account opener
//! - [`handlers`], [`middleware`], [`app`]: the HTTP surface around the services

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
