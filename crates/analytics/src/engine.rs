use crate::aggregate::{DailyAggregate, PeriodAggregate};
use crate::error::AnalyticsError;
use crate::report::{AnalyticsReport, ChartPoint, Growth, Overview, PeriodSummary, TopProduct};
use rust_decimal::Decimal;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Percentage change from `previous` to `current`.
///
/// A previous value of zero yields exactly 100. A negative previous value is
/// divided as-is, so the sign of the result flips.
pub fn growth_pct(current: Decimal, previous: Decimal) -> Result<Decimal, AnalyticsError> {
    if previous.is_zero() {
        return Ok(HUNDRED);
    }
    current
        .checked_sub(previous)
        .and_then(|delta| delta.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .map(|pct| pct.normalize())
        .ok_or(AnalyticsError::Overflow("growth percentage"))
}

/// A stateless calculator that finishes the analytics report from grouped data.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    top_products_limit: usize,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self {
            top_products_limit: 5,
        }
    }
}

impl AnalyticsEngine {
    pub fn new(top_products_limit: usize) -> Self {
        Self { top_products_limit }
    }

    pub fn top_products_limit(&self) -> usize {
        self.top_products_limit
    }

    /// Converts daily aggregates into chart points, ascending by date.
    ///
    /// Days without orders are dropped; the series is sparse.
    pub fn daily_series(
        &self,
        mut days: Vec<DailyAggregate>,
    ) -> Result<Vec<ChartPoint>, AnalyticsError> {
        days.retain(|day| day.orders > 0);
        days.sort_by_key(|day| day.date);
        days.into_iter()
            .map(|day| {
                let profit = day
                    .revenue
                    .checked_sub(day.cost)
                    .ok_or(AnalyticsError::Overflow("daily profit"))?;
                Ok(ChartPoint {
                    date: day.date,
                    revenue: day.revenue,
                    profit,
                    orders: day.orders,
                    customers: day.customers,
                })
            })
            .collect()
    }

    /// Current-period totals and their growth against the previous period.
    pub fn overview(
        &self,
        current: &PeriodAggregate,
        previous: &PeriodAggregate,
    ) -> Result<Overview, AnalyticsError> {
        let current_profit = current.profit()?;
        let growth = Growth {
            revenue: growth_pct(current.revenue, previous.revenue)?,
            profit: growth_pct(current_profit, previous.profit()?)?,
            orders: growth_pct(Decimal::from(current.orders), Decimal::from(previous.orders))?,
            customers: growth_pct(
                Decimal::from(current.customers),
                Decimal::from(previous.customers),
            )?,
        };

        Ok(Overview {
            current_month: PeriodSummary {
                revenue: current.revenue,
                profit: current_profit,
                orders: current.orders,
                customers: current.customers,
            },
            growth,
        })
    }

    /// Orders the product ranking and applies the limit.
    pub fn top_products(&self, mut products: Vec<TopProduct>) -> Vec<TopProduct> {
        products.retain(|product| product.total_sales > 0);
        products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.title.cmp(&b.title)));
        products.truncate(self.top_products_limit);
        products
    }

    /// Assembles the full report.
    pub fn build_report(
        &self,
        days: Vec<DailyAggregate>,
        products: Vec<TopProduct>,
        current: &PeriodAggregate,
        previous: &PeriodAggregate,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let overview = self.overview(current, previous)?;
        tracing::debug!(
            days = days.len(),
            products = products.len(),
            orders = current.orders,
            "Building analytics report."
        );

        Ok(AnalyticsReport {
            overview,
            chart_data: self.daily_series(days)?,
            top_products: self.top_products(products),
        })
    }
}
