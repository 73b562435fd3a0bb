//! # Piggy Bank Shared Library
//!
//! This crate contains the domain types and business logic behind the
//! Piggy Bank API server: transaction and user persistence, spending
//! aggregation, and AI-generated spending advice.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their PostgreSQL queries
//! - `store`: Owner-scoped storage traits with PostgreSQL and in-memory backends
//! - `analysis`: Spending aggregation (totals, top categories)
//! - `advice`: Prompt construction, advice service clients, fallback handling
//! - `auth`: JWT validation and the authenticated request context
//! - `db`: Connection pool and migrations

pub mod advice;
pub mod analysis;
pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Piggy Bank shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
