use crate::error::AppError;
use analytics::{AnalyticsEngine, AnalyticsReport, ReportingWindow};
use database::ResellerRepository;
use uuid::Uuid;

/// Runs the analytics queries for one reseller and assembles the report.
///
/// The four reads are independent and issued concurrently. Any single failure
/// fails the whole report; nothing partial is returned.
pub async fn analytics_report(
    repository: &dyn ResellerRepository,
    engine: &AnalyticsEngine,
    reseller_id: Uuid,
    window: &ReportingWindow,
) -> Result<AnalyticsReport, AppError> {
    let (days, products, current, previous) = futures::try_join!(
        repository.daily_sales(reseller_id, &window.current),
        repository.top_products(reseller_id, &window.current, engine.top_products_limit()),
        repository.period_sales(reseller_id, &window.current),
        repository.period_sales(reseller_id, &window.previous),
    )?;

    Ok(engine.build_report(days, products, &current, &previous)?)
}
