use std::sync::Arc;

use futures::StreamExt;
use redis_connection::{
    CacheError, CacheResult, CacheStore, Expiry,
    core::{CacheTypeBind, Json},
    types::Normal,
};
use sales_cache_keys::{
    SaleCacheKey, SalesByDateCacheKey, SalesByTheaterCacheKey,
};
use sales_dao::SalesStore;
use sales_errors::SalesError;
use sales_models::SaleRecord;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupReport {
    /// Records written to every key they belong to
    pub warmed: usize,
    /// Rows the store could not hand over as a sale
    pub skipped: usize,
    /// Records the cache could not take, on a failed read or write
    pub cache_failures: usize,
}

/// What `sale:<id>` held before a record was warmed.
enum CachedSale {
    Absent,
    Unchanged,
    Changed(Json<SaleRecord>),
    Unreadable,
}

/// Loads every sale into the per-sale, per-theater and per-date keys.
#[derive(Clone)]
pub struct CacheWarmer {
    sales: Arc<dyn SalesStore>,
    cache: Arc<dyn CacheStore>,
}

impl CacheWarmer {
    pub fn new(sales: Arc<dyn SalesStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self { sales, cache }
    }

    /// Streams the whole sales table through the cache.
    ///
    /// Fails only when the store cannot be read; bad rows and cache write
    /// failures are counted in the report.
    #[instrument(skip(self))]
    pub async fn warm(&self) -> Result<WarmupReport, SalesError> {
        info!("Warming sales cache");
        let mut report = WarmupReport::default();
        let mut rows = self.sales.stream_sales().await?;

        while let Some(row) = rows.next().await {
            let record = match row {
                Ok(record) => record,
                Err(e @ SalesError::MalformedRecord { .. }) => {
                    warn!(error = %e, "Skipping sale row");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.warm_record(record).await {
                Ok(()) => report.warmed += 1,
                Err(e) => {
                    warn!(error = %e, "Cache write failed during warm-up");
                    report.cache_failures += 1;
                }
            }
        }

        info!(
            warmed = report.warmed,
            skipped = report.skipped,
            cache_failures = report.cache_failures,
            "Sales cache warmed"
        );
        Ok(report)
    }

    /// Lists first, `sale:<id>` last: until the lists hold the new record
    /// the scalar keeps the old one, which the next run evicts.
    async fn warm_record(&self, record: SaleRecord) -> CacheResult<()> {
        let scalar =
            SaleCacheKey.bind_with(self.cache.clone(), &record.sale_id);
        let value = Json(record);

        let cached = Self::cached_copy(&scalar, &value).await?;
        let stale: &[Json<SaleRecord>] = match &cached {
            CachedSale::Changed(old) => {
                self.evict_moved(old, &value).await?;
                std::slice::from_ref(old)
            }
            _ => &[],
        };

        SalesByTheaterCacheKey
            .bind_with(self.cache.clone(), &value.theater_id)
            .replace(&value, stale)
            .await?;
        SalesByDateCacheKey
            .bind_with(self.cache.clone(), &value.sale_date)
            .replace(&value, stale)
            .await?;

        match cached {
            CachedSale::Absent => {
                scalar.set_if_not_exist(&value).await?;
            }
            CachedSale::Unchanged => {}
            CachedSale::Changed(_) | CachedSale::Unreadable => {
                debug!(key = scalar.key(), "Refreshing sale scalar");
                scalar.set(&value, Expiry::Never).await?;
            }
        }

        Ok(())
    }

    /// Compares the scalar the cache holds with the record from the store.
    async fn cached_copy(
        scalar: &Normal<Json<SaleRecord>>, value: &Json<SaleRecord>,
    ) -> CacheResult<CachedSale> {
        match scalar.try_get().await {
            Ok(None) => Ok(CachedSale::Absent),
            Ok(Some(existing)) if existing == *value => {
                Ok(CachedSale::Unchanged)
            }
            Ok(Some(existing)) => Ok(CachedSale::Changed(existing)),
            Err(e @ CacheError::Deserialization(_)) => {
                warn!(
                    key = scalar.key(),
                    error = %e,
                    "Replacing unreadable sale"
                );
                Ok(CachedSale::Unreadable)
            }
            Err(e) => Err(e),
        }
    }

    /// Drops the old serialization from lists the record no longer
    /// belongs to.
    async fn evict_moved(
        &self, old: &Json<SaleRecord>, new: &Json<SaleRecord>,
    ) -> CacheResult<()> {
        if old.theater_id != new.theater_id {
            SalesByTheaterCacheKey
                .bind_with(self.cache.clone(), &old.theater_id)
                .remove(old, 0)
                .await?;
        }
        if old.sale_date != new.sale_date {
            SalesByDateCacheKey
                .bind_with(self.cache.clone(), &old.sale_date)
                .remove(old, 0)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sales_models::SaleRecord;
    use test_utils::{FailingCache, date, memory_cache, sale, sample_store};

    use super::*;

    async fn by_theater(
        cache: &Arc<dyn CacheStore>, theater_id: i32,
    ) -> Vec<SaleRecord> {
        SalesByTheaterCacheKey
            .bind_with(cache.clone(), &theater_id)
            .members()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.unwrap().inner())
            .collect()
    }

    async fn by_date(cache: &Arc<dyn CacheStore>, day: &str) -> Vec<SaleRecord> {
        SalesByDateCacheKey
            .bind_with(cache.clone(), &date(day))
            .members()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.unwrap().inner())
            .collect()
    }

    fn ids(records: &[SaleRecord]) -> Vec<i32> {
        records.iter().map(|r| r.sale_id).collect()
    }

    #[tokio::test]
    async fn test_warm_populates_every_key() {
        let store = Arc::new(sample_store());
        let cache = memory_cache();
        let warmer = CacheWarmer::new(store, cache.clone());

        let report = warmer.warm().await.unwrap();

        assert_eq!(report.warmed, 5);
        assert_eq!(report.skipped, 0);
        assert_eq!(ids(&by_theater(&cache, 1).await), vec![1, 2, 5]);
        assert_eq!(ids(&by_theater(&cache, 2).await), vec![3, 4]);
        assert_eq!(ids(&by_date(&cache, "2024-03-10").await), vec![1, 2, 3, 4]);

        let sale = SaleCacheKey
            .bind_with(cache.clone(), &3)
            .try_get()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale.movie_title, "Inception");
    }

    #[tokio::test]
    async fn test_warm_twice_leaves_no_duplicates() {
        let store = Arc::new(sample_store());
        let cache = memory_cache();
        let warmer = CacheWarmer::new(store, cache.clone());

        warmer.warm().await.unwrap();
        let first = by_date(&cache, "2024-03-10").await;
        warmer.warm().await.unwrap();
        let second = by_date(&cache, "2024-03-10").await;

        assert_eq!(first, second);
        assert_eq!(ids(&by_theater(&cache, 1).await), vec![1, 2, 5]);
    }

    #[tokio::test]
    async fn test_concurrent_warmers_leave_no_duplicates() {
        let store = Arc::new(sample_store());
        let cache = memory_cache();
        let a = CacheWarmer::new(store.clone(), cache.clone());
        let b = CacheWarmer::new(store, cache.clone());

        let (left, right) = tokio::join!(a.warm(), b.warm());
        left.unwrap();
        right.unwrap();

        assert_eq!(by_theater(&cache, 1).await.len(), 3);
        assert_eq!(by_date(&cache, "2024-03-10").await.len(), 4);
    }

    #[tokio::test]
    async fn test_changed_sale_replaces_its_old_copy() {
        let store = Arc::new(sample_store());
        let cache = memory_cache();
        let warmer = CacheWarmer::new(store.clone(), cache.clone());
        warmer.warm().await.unwrap();

        store
            .upsert_sale(sale(2, 2, "Dune", "2024-03-11", 45, 15.0))
            .await;
        store
            .upsert_sale(sale(1, 1, "Inception", "2024-03-10", 110, 10.0))
            .await;
        warmer.warm().await.unwrap();

        assert_eq!(ids(&by_theater(&cache, 1).await), vec![1, 5]);
        assert_eq!(ids(&by_theater(&cache, 2).await), vec![2, 3, 4]);
        assert_eq!(ids(&by_date(&cache, "2024-03-10").await), vec![1, 3, 4]);
        assert_eq!(ids(&by_date(&cache, "2024-03-11").await), vec![2, 5]);

        let theater_one = by_theater(&cache, 1).await;
        assert_eq!(theater_one[0].tickets_sold, 110);
    }

    #[tokio::test]
    async fn test_unreadable_rows_are_skipped() {
        let store = Arc::new(sample_store());
        store.add_unreadable_row(99).await;
        let warmer = CacheWarmer::new(store, memory_cache());

        let report = warmer.warm().await.unwrap();

        assert_eq!(report.warmed, 5);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_returned() {
        let store = Arc::new(sample_store());
        store.set_failing(true);
        let cache = memory_cache();
        let warmer = CacheWarmer::new(store, cache.clone());

        let result = warmer.warm().await;

        assert!(matches!(result, Err(SalesError::StoreUnavailable(_))));
        assert!(!cache.exists("sales_theater:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_list_write_is_repaired_on_next_run() {
        let store = Arc::new(sample_store());
        let flaky = Arc::new(FailingCache::new());
        let cache: Arc<dyn CacheStore> = flaky.clone();
        let warmer = CacheWarmer::new(store.clone(), cache.clone());
        warmer.warm().await.unwrap();

        store
            .upsert_sale(sale(1, 1, "Inception", "2024-03-10", 110, 10.0))
            .await;
        flaky.fail_list_writes(true);
        let failed = warmer.warm().await.unwrap();

        assert_eq!(failed.warmed, 0);
        assert_eq!(failed.cache_failures, 5);
        let scalar = SaleCacheKey
            .bind_with(cache.clone(), &1)
            .try_get()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scalar.tickets_sold, 100);

        flaky.recover();
        let recovered = warmer.warm().await.unwrap();

        assert_eq!(recovered.warmed, 5);
        let theater_one = by_theater(&cache, 1).await;
        assert_eq!(ids(&theater_one), vec![1, 2, 5]);
        assert_eq!(theater_one[0].tickets_sold, 110);
        assert_eq!(ids(&by_date(&cache, "2024-03-10").await), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_cache_outage_is_counted_not_fatal() {
        let store = Arc::new(sample_store());
        let flaky = Arc::new(FailingCache::new());
        flaky.fail_reads(true);
        let warmer = CacheWarmer::new(store, flaky.clone());

        let report = warmer.warm().await.unwrap();

        assert_eq!(report, WarmupReport {
            warmed: 0,
            skipped: 0,
            cache_failures: 5,
        });
        flaky.recover();
        assert!(!flaky.exists("sales_theater:1").await.unwrap());
    }
}
