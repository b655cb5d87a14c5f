use crate::DbError;
use crate::repository::ResellerRepository;
use analytics::aggregate::{aggregate_daily, aggregate_period, rank_products};
use analytics::{DailyAggregate, PeriodAggregate, TimeWindow, TopProduct};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Order, Product, Store, StoreSettings};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    stores: HashMap<Uuid, Store>,
    orders: Vec<Order>,
    products: Vec<Product>,
}

/// A process-local repository for development and tests.
///
/// It has no query pushdown, so analytics run through the in-process steps in
/// `analytics::aggregate`.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<MemoryState>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_store(&self, store: Store) {
        self.state.write().await.stores.insert(store.id, store);
    }

    pub async fn insert_order(&self, order: Order) {
        self.state.write().await.orders.push(order);
    }

    pub async fn insert_product(&self, product: Product) {
        self.state.write().await.products.push(product);
    }

    /// Number of repository operations served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every following operation fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin(&self) -> Result<(), DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::QueryError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ResellerRepository for InMemoryRepository {
    async fn find_store_by_reseller(&self, reseller_id: Uuid) -> Result<Option<Store>, DbError> {
        self.begin()?;
        let state = self.state.read().await;
        Ok(state
            .stores
            .values()
            .find(|store| store.reseller_id == reseller_id)
            .cloned())
    }

    async fn update_store_settings(
        &self,
        store_id: Uuid,
        settings: &StoreSettings,
    ) -> Result<Store, DbError> {
        self.begin()?;
        let mut state = self.state.write().await;
        let store = state.stores.get_mut(&store_id).ok_or(DbError::NotFound)?;
        store.settings = settings.clone();
        store.updated_at = Utc::now();
        Ok(store.clone())
    }

    async fn daily_sales(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<DailyAggregate>, DbError> {
        self.begin()?;
        let state = self.state.read().await;
        Ok(aggregate_daily(&state.orders, reseller_id, window)?)
    }

    async fn period_sales(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
    ) -> Result<PeriodAggregate, DbError> {
        self.begin()?;
        let state = self.state.read().await;
        Ok(aggregate_period(&state.orders, reseller_id, window)?)
    }

    async fn top_products(
        &self,
        reseller_id: Uuid,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<TopProduct>, DbError> {
        self.begin()?;
        let state = self.state.read().await;
        Ok(rank_products(
            &state.orders,
            reseller_id,
            window,
            &state.products,
            limit,
        )?)
    }
}
