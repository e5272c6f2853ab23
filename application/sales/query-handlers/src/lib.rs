use std::{sync::Arc, time::Duration};

use redis_connection::{
    CacheStore, Expiry, Sourced,
    core::{CacheTypeBind, Json, Primitive},
};
use sales_aggregations::{SalesBatch, movies_by_theater, top_theater};
use sales_cache_keys::{
    MoviesByTheaterCacheKey, SalesByDateCacheKey, SalesByTheaterCacheKey,
    TheaterNameCacheKey, TopTheaterCacheKey,
};
use sales_dao::SalesStore;
use sales_errors::SalesError;
use sales_models::{MovieSales, Theater, TheaterRevenue, TopTheater};
use sales_queries::{
    GetMoviesByTheaterQuery, GetTopTheaterQuery, ListTheatersQuery,
};
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct ListTheatersQueryHandler {
    sales: Arc<dyn SalesStore>,
}

impl ListTheatersQueryHandler {
    pub fn new(sales: Arc<dyn SalesStore>) -> Self { Self { sales } }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, _query: ListTheatersQuery,
    ) -> Result<Vec<Theater>, SalesError> {
        self.sales.list_theaters().await
    }
}

#[derive(Clone)]
pub struct GetMoviesByTheaterQueryHandler {
    sales: Arc<dyn SalesStore>,
    cache: Arc<dyn CacheStore>,
    aggregate_ttl: Duration,
}

impl GetMoviesByTheaterQueryHandler {
    pub fn new(
        sales: Arc<dyn SalesStore>, cache: Arc<dyn CacheStore>,
        aggregate_ttl: Duration,
    ) -> Self {
        Self {
            sales,
            cache,
            aggregate_ttl,
        }
    }

    /// Per-movie revenue of one theater.
    ///
    /// The warmed per-theater list answers first. Without it the report is
    /// read through its aggregate key, computed from the store on a miss.
    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: GetMoviesByTheaterQuery,
    ) -> Result<Sourced<Vec<MovieSales>>, SalesError> {
        let theater_id = query.theater_id;

        let list =
            SalesByTheaterCacheKey.bind_with(self.cache.clone(), &theater_id);
        match list.members().await {
            Ok(members) => {
                let batch = SalesBatch::decode(
                    members.into_iter().map(|m| m.map(Json::inner)),
                );
                if !batch.is_empty() {
                    debug!("Cache hit for theater {} sales", theater_id);
                    return Ok(Sourced::cache(movies_by_theater(
                        batch.records(),
                    )));
                }
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed for theater sales")
            }
        }

        debug!("Cache miss for theater {} sales", theater_id);

        let sales = self.sales.clone();
        let report = MoviesByTheaterCacheKey
            .bind_with(self.cache.clone(), &theater_id)
            .get_or_load(Expiry::from_ttl(self.aggregate_ttl), move || {
                async move {
                    let records = sales.sales_for_theater(theater_id).await?;
                    let movies = movies_by_theater(&records);
                    Ok::<_, SalesError>(
                        (!movies.is_empty()).then(|| Json(movies)),
                    )
                }
            })
            .await?;

        Ok(match report {
            Some(report) => report.map(Json::inner),
            None => Sourced::store(Vec::new()),
        })
    }
}

#[derive(Clone)]
pub struct GetTopTheaterQueryHandler {
    sales: Arc<dyn SalesStore>,
    cache: Arc<dyn CacheStore>,
    aggregate_ttl: Duration,
}

impl GetTopTheaterQueryHandler {
    pub fn new(
        sales: Arc<dyn SalesStore>, cache: Arc<dyn CacheStore>,
        aggregate_ttl: Duration,
    ) -> Self {
        Self {
            sales,
            cache,
            aggregate_ttl,
        }
    }

    /// Highest-grossing theater of a day, with its name.
    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: GetTopTheaterQuery,
    ) -> Result<Sourced<TopTheater>, SalesError> {
        let revenue = match self.top_from_list(&query).await {
            Some(top) => Sourced::cache(top),
            None => self.top_from_report(&query).await?,
        };

        let theater = self.theater_name(revenue.value.theater_id).await?;

        Ok(revenue.map(|top| {
            TopTheater {
                theater,
                revenue: top.revenue,
            }
        }))
    }

    async fn top_from_list(
        &self, query: &GetTopTheaterQuery,
    ) -> Option<TheaterRevenue> {
        let list =
            SalesByDateCacheKey.bind_with(self.cache.clone(), &query.date);

        match list.members().await {
            Ok(members) => {
                let top = top_theater(SalesBatch::decode(
                    members.into_iter().map(|m| m.map(Json::inner)),
                ).records());
                match top {
                    Some(_) => debug!("Cache hit for {} sales", query.date),
                    None => debug!("Cache miss for {} sales", query.date),
                }
                top
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed for date sales");
                None
            }
        }
    }

    async fn top_from_report(
        &self, query: &GetTopTheaterQuery,
    ) -> Result<Sourced<TheaterRevenue>, SalesError> {
        let sales = self.sales.clone();
        let date = query.date;

        TopTheaterCacheKey
            .bind_with(self.cache.clone(), &date)
            .get_or_load(Expiry::from_ttl(self.aggregate_ttl), move || {
                async move {
                    let records = sales.sales_for_date(date).await?;
                    Ok::<_, SalesError>(top_theater(&records).map(Json))
                }
            })
            .await?
            .map(|report| report.map(Json::inner))
            .ok_or(SalesError::NoDataFound)
    }

    /// Names are durable, so a resolved name is cached without expiry.
    async fn theater_name(
        &self, theater_id: i32,
    ) -> Result<String, SalesError> {
        let sales = self.sales.clone();

        TheaterNameCacheKey
            .bind_with(self.cache.clone(), &theater_id)
            .get_or_load(Expiry::Never, move || {
                async move {
                    let name = sales.find_theater_name(theater_id).await?;
                    Ok::<_, SalesError>(name.map(Primitive))
                }
            })
            .await?
            .map(|name| name.value.inner())
            .ok_or(SalesError::TheaterNotFound { theater_id })
    }
}
