use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use futures::StreamExt;
use redis_connection::{
    CacheError, CacheResult, CacheStore, Expiry, MemoryStore,
};
use sales_dao::{SaleStream, SalesStore};
use sales_errors::SalesError;
use sales_models::{SaleRecord, Theater};
use tokio::sync::RwLock;

/// Sales store held in memory, with switches for failure injection.
#[derive(Default)]
pub struct InMemorySalesStore {
    theaters: RwLock<Vec<Theater>>,
    sales: RwLock<Vec<SaleRecord>>,
    unreadable_rows: RwLock<Vec<i32>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl InMemorySalesStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_theaters(self, theaters: Vec<Theater>) -> Self {
        Self {
            theaters: RwLock::new(theaters),
            ..self
        }
    }

    pub fn with_sales(self, sales: Vec<SaleRecord>) -> Self {
        Self {
            sales: RwLock::new(sales),
            ..self
        }
    }

    /// Adds a row that the bulk stream reports as unreadable.
    pub async fn add_unreadable_row(&self, sale_id: i32) {
        self.unreadable_rows.write().await.push(sale_id);
    }

    /// Inserts the sale or replaces the one with the same id.
    pub async fn upsert_sale(&self, record: SaleRecord) {
        let mut sales = self.sales.write().await;
        match sales.iter_mut().find(|s| s.sale_id == record.sale_id) {
            Some(existing) => *existing = record,
            None => sales.push(record),
        }
    }

    /// Makes every following call fail with
    /// [`SalesError::StoreUnavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls made against the store so far
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn enter(&self) -> Result<(), SalesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SalesError::StoreUnavailable(
                "connection refused".into(),
            ));
        }
        Ok(())
    }

    async fn sales_where(
        &self, keep: impl Fn(&SaleRecord) -> bool,
    ) -> Vec<SaleRecord> {
        let mut sales: Vec<SaleRecord> = self
            .sales
            .read()
            .await
            .iter()
            .filter(|s| keep(s))
            .cloned()
            .collect();
        sales.sort_by_key(|s| s.sale_id);
        sales
    }
}

#[async_trait]
impl SalesStore for InMemorySalesStore {
    async fn list_theaters(&self) -> Result<Vec<Theater>, SalesError> {
        self.enter()?;
        let mut theaters = self.theaters.read().await.clone();
        theaters.sort_by_key(|t| t.id);
        Ok(theaters)
    }

    async fn find_theater_name(
        &self, theater_id: i32,
    ) -> Result<Option<String>, SalesError> {
        self.enter()?;
        Ok(self
            .theaters
            .read()
            .await
            .iter()
            .find(|t| t.id == theater_id)
            .map(|t| t.name.clone()))
    }

    async fn sales_for_theater(
        &self, theater_id: i32,
    ) -> Result<Vec<SaleRecord>, SalesError> {
        self.enter()?;
        Ok(self.sales_where(|s| s.theater_id == theater_id).await)
    }

    async fn sales_for_date(
        &self, date: NaiveDate,
    ) -> Result<Vec<SaleRecord>, SalesError> {
        self.enter()?;
        Ok(self.sales_where(|s| s.sale_date == date).await)
    }

    async fn stream_sales(&self) -> Result<SaleStream, SalesError> {
        self.enter()?;

        let mut items: Vec<Result<SaleRecord, SalesError>> =
            self.sales_where(|_| true).await.into_iter().map(Ok).collect();
        for sale_id in self.unreadable_rows.read().await.iter() {
            items.push(Err(SalesError::MalformedRecord {
                sale_id: Some(*sale_id),
                reason: "error deserializing column 5".into(),
            }));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

/// Cache store that answers like an unreachable Redis on demand, and
/// counts the writes it is asked for.
///
/// Each switch covers one kind of operation; everything else goes to an
/// in-process [`MemoryStore`].
#[derive(Default)]
pub struct FailingCache {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_list_reads: AtomicBool,
    fail_list_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self { Self::default() }

    /// `get` and `exists`
    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    /// `set`, `set_if_absent` and `remove`
    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// `list_range`
    pub fn fail_list_reads(&self, failing: bool) {
        self.fail_list_reads.store(failing, Ordering::SeqCst);
    }

    /// `list_push`, `list_remove` and `list_replace`
    pub fn fail_list_writes(&self, failing: bool) {
        self.fail_list_writes.store(failing, Ordering::SeqCst);
    }

    /// Clears every switch.
    pub fn recover(&self) {
        self.fail_reads(false);
        self.fail_writes(false);
        self.fail_list_reads(false);
        self.fail_list_writes(false);
    }

    /// Number of writes attempted so far, failed ones included
    pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

    fn write(&self, switch: &AtomicBool) -> CacheResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Self::check(switch)
    }

    fn check(switch: &AtomicBool) -> CacheResult<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        Self::check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn set(
        &self, key: &str, value: Bytes, expiry: Expiry,
    ) -> CacheResult<()> {
        self.write(&self.fail_writes)?;
        self.inner.set(key, value, expiry).await
    }

    async fn set_if_absent(
        &self, key: &str, value: Bytes,
    ) -> CacheResult<bool> {
        self.write(&self.fail_writes)?;
        self.inner.set_if_absent(key, value).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Self::check(&self.fail_reads)?;
        self.inner.exists(key).await
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        self.write(&self.fail_writes)?;
        self.inner.remove(key).await
    }

    async fn list_range(
        &self, key: &str, start: isize, stop: isize,
    ) -> CacheResult<Vec<Bytes>> {
        Self::check(&self.fail_list_reads)?;
        self.inner.list_range(key, start, stop).await
    }

    async fn list_push(&self, key: &str, value: Bytes) -> CacheResult<usize> {
        self.write(&self.fail_list_writes)?;
        self.inner.list_push(key, value).await
    }

    async fn list_remove(
        &self, key: &str, value: Bytes, count: isize,
    ) -> CacheResult<usize> {
        self.write(&self.fail_list_writes)?;
        self.inner.list_remove(key, value, count).await
    }

    async fn list_replace(
        &self, key: &str, stale: &[Bytes], value: Bytes,
    ) -> CacheResult<()> {
        self.write(&self.fail_list_writes)?;
        self.inner.list_replace(key, stale, value).await
    }
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("invalid fixture date {value}: {e}"))
}

pub fn sale(
    sale_id: i32, theater_id: i32, title: &str, sale_date: &str,
    tickets_sold: i32, ticket_price: f64,
) -> SaleRecord {
    SaleRecord {
        sale_id,
        theater_id,
        movie_title: title.to_string(),
        sale_date: date(sale_date),
        tickets_sold,
        ticket_price,
    }
}

pub fn theater(id: i32, name: &str) -> Theater {
    Theater {
        id,
        name: name.to_string(),
    }
}

/// Fresh in-process cache standing in for Redis.
pub fn memory_cache() -> Arc<dyn CacheStore> { Arc::new(MemoryStore::default()) }

/// Theaters and sales for 2024-03-10 and 2024-03-11.
///
/// On 2024-03-10 theater 1 makes 1600.0 and theater 2 makes 1800.0.
pub fn sample_store() -> InMemorySalesStore {
    InMemorySalesStore::new()
        .with_theaters(vec![
            theater(1, "AMC Empire 25"),
            theater(2, "Regal LA Live"),
            theater(3, "Alamo Drafthouse"),
        ])
        .with_sales(vec![
            sale(1, 1, "Inception", "2024-03-10", 100, 10.0),
            sale(2, 1, "Dune", "2024-03-10", 40, 15.0),
            sale(3, 2, "Inception", "2024-03-10", 120, 10.0),
            sale(4, 2, "Dune", "2024-03-10", 40, 15.0),
            sale(5, 1, "Dune", "2024-03-11", 10, 15.0),
        ])
}

/// Installs a test subscriber once, honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}
