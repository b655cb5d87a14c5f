//! # Storefront Database Crate
//!
//! This crate is the application's interface to persisted stores, orders and
//! products.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application talks to the
//!   `ResellerRepository` trait and never sees a query string.
//! - **Pushdown:** The PostgreSQL repository groups, joins, sorts and limits inside
//!   the database. The in-memory repository reuses the analytics crate's
//!   in-process steps instead.
//! - **Asynchronous & Pooled:** All operations are asynchronous. The pool (`PgPool`)
//!   is created explicitly at startup and injected into the repository.
//!
//! ## Public API
//!
//! - `connect`: establishes the database connection pool.
//! - `run_migrations`: applies the bundled SQL migrations.
//! - `ResellerRepository`: the data access trait used by the web server.
//! - `DbRepository`: the PostgreSQL implementation.
//! - `InMemoryRepository`: a process-local implementation for development and tests.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::{DbRepository, ResellerRepository};
