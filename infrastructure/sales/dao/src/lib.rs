use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{StreamExt, stream::BoxStream};
use sales_errors::SalesError;
use sales_models::{SaleRecord, Theater};
use sql_connection::SqlConnect;
use tokio_postgres::{Row, types::ToSql};
use tracing::{instrument, warn};

pub type SaleStream = BoxStream<'static, Result<SaleRecord, SalesError>>;

/// Read access to the authoritative sales data.
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Every theater, ordered by id
    async fn list_theaters(&self) -> Result<Vec<Theater>, SalesError>;

    async fn find_theater_name(
        &self, theater_id: i32,
    ) -> Result<Option<String>, SalesError>;

    async fn sales_for_theater(
        &self, theater_id: i32,
    ) -> Result<Vec<SaleRecord>, SalesError>;

    async fn sales_for_date(
        &self, date: NaiveDate,
    ) -> Result<Vec<SaleRecord>, SalesError>;

    /// Every sale joined with its movie title, ordered by sale id.
    ///
    /// The outer error means the query could not start. Rows that cannot be
    /// read come through as [`SalesError::MalformedRecord`] items.
    async fn stream_sales(&self) -> Result<SaleStream, SalesError>;
}

const SALE_COLUMNS: &str = "SELECT s.id, s.theater_id, m.title, s.sale_date, \
                            s.tickets_sold, s.ticket_price::float8 FROM sales \
                            s JOIN movies m ON s.movie_id = m.id";

#[derive(Clone)]
pub struct SalesDao {
    db: SqlConnect,
}

impl SalesDao {
    pub fn new(db: SqlConnect) -> Self { Self { db } }

    pub fn db(&self) -> &SqlConnect { &self.db }

    fn map_row(row: &Row) -> Result<SaleRecord, SalesError> {
        let malformed = |e: tokio_postgres::Error| {
            SalesError::MalformedRecord {
                sale_id: row.try_get(0).ok(),
                reason: e.to_string(),
            }
        };

        Ok(SaleRecord {
            sale_id: row.try_get(0).map_err(malformed)?,
            theater_id: row.try_get(1).map_err(malformed)?,
            movie_title: row.try_get(2).map_err(malformed)?,
            sale_date: row.try_get(3).map_err(malformed)?,
            tickets_sold: row.try_get(4).map_err(malformed)?,
            ticket_price: row.try_get(5).map_err(malformed)?,
        })
    }

    fn map_rows(rows: &[Row]) -> Vec<SaleRecord> {
        rows.iter()
            .filter_map(|row| {
                Self::map_row(row)
                    .inspect_err(|e| warn!(error = %e, "Skipping sale row"))
                    .ok()
            })
            .collect()
    }
}

#[async_trait]
impl SalesStore for SalesDao {
    #[instrument(skip(self))]
    async fn list_theaters(&self) -> Result<Vec<Theater>, SalesError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare("SELECT id, name FROM theaters ORDER BY id")
            .await?;
        let rows = client.query(&stmt, &[]).await?;

        let theaters = rows
            .iter()
            .map(|row| {
                Theater {
                    id: row.get(0),
                    name: row.get(1),
                }
            })
            .collect();

        Ok(theaters)
    }

    #[instrument(skip(self))]
    async fn find_theater_name(
        &self, theater_id: i32,
    ) -> Result<Option<String>, SalesError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare("SELECT name FROM theaters WHERE id = $1")
            .await?;
        let row = client.query_opt(&stmt, &[&theater_id]).await?;

        Ok(row.map(|row| row.get(0)))
    }

    #[instrument(skip(self))]
    async fn sales_for_theater(
        &self, theater_id: i32,
    ) -> Result<Vec<SaleRecord>, SalesError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare(&format!(
                "{SALE_COLUMNS} WHERE s.theater_id = $1 ORDER BY s.id"
            ))
            .await?;
        let rows = client.query(&stmt, &[&theater_id]).await?;

        Ok(Self::map_rows(&rows))
    }

    #[instrument(skip(self))]
    async fn sales_for_date(
        &self, date: NaiveDate,
    ) -> Result<Vec<SaleRecord>, SalesError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare(&format!(
                "{SALE_COLUMNS} WHERE s.sale_date = $1 ORDER BY s.id"
            ))
            .await?;
        let rows = client.query(&stmt, &[&date]).await?;

        Ok(Self::map_rows(&rows))
    }

    #[instrument(skip(self))]
    async fn stream_sales(&self) -> Result<SaleStream, SalesError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare(&format!("{SALE_COLUMNS} ORDER BY s.id"))
            .await?;
        let rows = client
            .query_raw(&stmt, std::iter::empty::<&(dyn ToSql + Sync)>())
            .await?;

        // The pooled client stays checked out until the stream is dropped.
        let stream = rows.map(move |row| {
            let _client = &client;
            match row {
                Ok(row) => Self::map_row(&row),
                Err(e) => Err(SalesError::from(e)),
            }
        });

        Ok(stream.boxed())
    }
}
