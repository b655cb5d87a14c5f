//! Grouping steps over raw orders.
//!
//! These mirror the SQL the Postgres repository runs, for stores that hand back
//! whole orders instead of grouped rows.

use crate::error::AnalyticsError;
use crate::report::TopProduct;
use crate::window::TimeWindow;
use chrono::NaiveDate;
use core_types::{Order, Product};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Completed-order totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub orders: u64,
    pub customers: u64,
}

/// Completed-order totals for a whole period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodAggregate {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub orders: u64,
    pub customers: u64,
}

impl PeriodAggregate {
    pub fn profit(&self) -> Result<Decimal, AnalyticsError> {
        self.revenue
            .checked_sub(self.cost)
            .ok_or(AnalyticsError::Overflow("period profit"))
    }
}

fn add_money(total: Decimal, amount: Decimal, what: &'static str) -> Result<Decimal, AnalyticsError> {
    total.checked_add(amount).ok_or(AnalyticsError::Overflow(what))
}

fn completed_in<'a>(
    orders: &'a [Order],
    reseller_id: Uuid,
    window: &'a TimeWindow,
) -> impl Iterator<Item = &'a Order> + 'a {
    orders.iter().filter(move |order| {
        order.reseller_id == Some(reseller_id)
            && order.is_completed()
            && window.contains(order.created_at)
    })
}

#[derive(Default)]
struct Bucket {
    revenue: Decimal,
    cost: Decimal,
    orders: u64,
    customers: HashSet<Uuid>,
}

impl Bucket {
    fn add(&mut self, order: &Order) -> Result<(), AnalyticsError> {
        self.revenue = add_money(self.revenue, order.total, "revenue")?;
        self.cost = add_money(self.cost, order.cost, "cost")?;
        self.orders += 1;
        self.customers.insert(order.customer_id);
        Ok(())
    }
}

/// Groups the reseller's completed orders by UTC day, ascending.
pub fn aggregate_daily(
    orders: &[Order],
    reseller_id: Uuid,
    window: &TimeWindow,
) -> Result<Vec<DailyAggregate>, AnalyticsError> {
    let mut days: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for order in completed_in(orders, reseller_id, window) {
        days.entry(order.created_at.date_naive())
            .or_default()
            .add(order)?;
    }

    Ok(days
        .into_iter()
        .map(|(date, bucket)| DailyAggregate {
            date,
            revenue: bucket.revenue,
            cost: bucket.cost,
            orders: bucket.orders,
            customers: bucket.customers.len() as u64,
        })
        .collect())
}

/// Sums the reseller's completed orders over the window.
pub fn aggregate_period(
    orders: &[Order],
    reseller_id: Uuid,
    window: &TimeWindow,
) -> Result<PeriodAggregate, AnalyticsError> {
    let mut bucket = Bucket::default();
    for order in completed_in(orders, reseller_id, window) {
        bucket.add(order)?;
    }
    Ok(PeriodAggregate {
        revenue: bucket.revenue,
        cost: bucket.cost,
        orders: bucket.orders,
        customers: bucket.customers.len() as u64,
    })
}

/// Ranks products by line-item revenue across completed orders.
///
/// Products absent from `catalog` are dropped before the limit is applied.
pub fn rank_products(
    orders: &[Order],
    reseller_id: Uuid,
    window: &TimeWindow,
    catalog: &[Product],
    limit: usize,
) -> Result<Vec<TopProduct>, AnalyticsError> {
    let titles: HashMap<Uuid, &str> = catalog
        .iter()
        .map(|product| (product.id, product.title.as_str()))
        .collect();

    let mut totals: HashMap<Uuid, (u64, Decimal)> = HashMap::new();
    for order in completed_in(orders, reseller_id, window) {
        for item in &order.items {
            let subtotal = item
                .subtotal()
                .ok_or(AnalyticsError::Overflow("line item subtotal"))?;
            let entry = totals.entry(item.product_id).or_default();
            entry.0 += u64::from(item.quantity.get());
            entry.1 = add_money(entry.1, subtotal, "product revenue")?;
        }
    }

    let mut ranked: Vec<TopProduct> = totals
        .into_iter()
        .filter_map(|(product_id, (total_sales, revenue))| {
            titles.get(&product_id).map(|title| TopProduct {
                product_id,
                title: title.to_string(),
                total_sales,
                revenue,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.title.cmp(&b.title)));
    ranked.truncate(limit);
    Ok(ranked)
}
