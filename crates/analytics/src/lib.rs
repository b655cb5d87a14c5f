//! # Storefront Analytics
//!
//! This crate turns a reseller's completed orders into the sales report shown on
//! the analytics dashboard.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No knowledge of HTTP or SQL. It depends only on `core-types`.
//! - **Two Entry Points:** Stores with query pushdown (Postgres) return the grouped
//!   aggregates themselves and only use the `AnalyticsEngine` to finish the report.
//!   Stores without it use the in-process steps in `aggregate` to produce the same
//!   aggregates from raw orders.
//!
//! ## Public API
//!
//! - `ReportingWindow` / `TimeWindow`: the current and previous 30-day periods.
//! - `AnalyticsEngine`: builds the daily series, overview and growth figures.
//! - `AnalyticsReport`: the serialized response of the analytics endpoint.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod report;
pub mod window;

pub use aggregate::{DailyAggregate, PeriodAggregate};
pub use engine::{growth_pct, AnalyticsEngine};
pub use error::AnalyticsError;
pub use report::{AnalyticsReport, ChartPoint, Growth, Overview, PeriodSummary, TopProduct};
pub use window::{ReportingWindow, TimeWindow};
