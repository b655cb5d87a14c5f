use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day of the sales chart. Only days with at least one completed order exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    pub orders: u64,
    pub customers: u64,
}

/// A product ranked by the revenue it brought in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    #[serde(skip)]
    pub product_id: Uuid,
    pub title: String,
    /// Units sold.
    pub total_sales: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// Totals for a whole reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    pub orders: u64,
    pub customers: u64,
}

/// Percentage change of each figure against the previous period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub orders: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub customers: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub current_month: PeriodSummary,
    pub growth: Growth,
}

/// The body returned by the analytics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub overview: Overview,
    pub chart_data: Vec<ChartPoint>,
    pub top_products: Vec<TopProduct>,
}
