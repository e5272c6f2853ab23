use chrono::NaiveDate;
use redis_connection::{Source, Sourced};
use sales_models::{MovieSales, Theater, TopTheater};
use serde::Serialize;
use utoipa::ToSchema;

/// Where the payload of a response was read from.
///
/// Wire-side twin of [`Source`], which the cache layer keeps free of API
/// schema concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Store,
}

impl From<Source> for DataSource {
    fn from(source: Source) -> Self {
        match source {
            Source::Cache => Self::Cache,
            Source::Store => Self::Store,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TheaterResponse {
    pub id: i32,
    pub name: String,
}

impl From<Theater> for TheaterResponse {
    fn from(theater: Theater) -> Self {
        Self {
            id: theater.id,
            name: theater.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieSalesResponse {
    pub title: String,
    pub sale_date: NaiveDate,
    pub ticket_sales: f64,
}

impl From<MovieSales> for MovieSalesResponse {
    fn from(movie: MovieSales) -> Self {
        Self {
            title: movie.title,
            sale_date: movie.sale_date,
            ticket_sales: movie.ticket_sales,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoviesByTheaterResponse {
    pub source: DataSource,
    pub data: Vec<MovieSalesResponse>,
}

impl From<Sourced<Vec<MovieSales>>> for MoviesByTheaterResponse {
    fn from(sourced: Sourced<Vec<MovieSales>>) -> Self {
        Self {
            source: sourced.source.into(),
            data: sourced.value.into_iter().map(Into::into).collect(),
        }
    }
}

/// Flat `{theater, revenue}` body, with the provenance alongside.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopTheaterResponse {
    pub source: DataSource,
    pub theater: String,
    pub revenue: f64,
}

impl From<Sourced<TopTheater>> for TopTheaterResponse {
    fn from(sourced: Sourced<TopTheater>) -> Self {
        Self {
            source: sourced.source.into(),
            theater: sourced.value.theater,
            revenue: sourced.value.revenue,
        }
    }
}

/// Body of a "no data" answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
