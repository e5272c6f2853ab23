use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::NaiveDate;
use common_errors::AppResult;
use redis_connection::CacheStore;
use sales_dao::SalesStore;
use sales_errors::{NO_DATA_MESSAGE, SalesError};
use sales_queries::{
    GetMoviesByTheaterQuery, GetTopTheaterQuery, ListTheatersQuery,
};
use sales_query_handlers::{
    GetMoviesByTheaterQueryHandler, GetTopTheaterQueryHandler,
    ListTheatersQueryHandler,
};
use sales_responses::{
    MessageResponse, MoviesByTheaterResponse, TheaterResponse,
    TopTheaterResponse,
};
use tracing::instrument;

#[derive(Clone)]
pub struct SalesServices {
    pub list_theaters: ListTheatersQueryHandler,
    pub movies_by_theater: GetMoviesByTheaterQueryHandler,
    pub top_theater: GetTopTheaterQueryHandler,
}

impl SalesServices {
    pub fn new(
        sales: Arc<dyn SalesStore>, cache: Arc<dyn CacheStore>,
        aggregate_ttl: Duration,
    ) -> Self {
        Self {
            list_theaters: ListTheatersQueryHandler::new(sales.clone()),
            movies_by_theater: GetMoviesByTheaterQueryHandler::new(
                sales.clone(),
                cache.clone(),
                aggregate_ttl,
            ),
            top_theater: GetTopTheaterQueryHandler::new(
                sales,
                cache,
                aggregate_ttl,
            ),
        }
    }
}

/// The sales read endpoints, bound to their services.
pub fn routes(services: SalesServices) -> Router {
    Router::new()
        .route("/theaters", get(list_theaters))
        .route("/theaters/{theater_id}/movies", get(get_movies_by_theater))
        .route("/top-theater/{date}", get(get_top_theater))
        .with_state(services)
}

fn parse_theater_id(raw: &str) -> Result<i32, SalesError> {
    raw.parse().map_err(|_| {
        SalesError::InvalidParameter {
            name: "theater_id",
            value: raw.to_string(),
        }
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, SalesError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        SalesError::InvalidParameter {
            name: "date",
            value: raw.to_string(),
        }
    })
}

#[utoipa::path(
    get,
    path = "/theaters",
    responses(
        (status = 200, description = "Every theater, ordered by id", body = Vec<TheaterResponse>),
        (status = 500, description = "Sales store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "theaters"
)]
#[instrument(skip_all)]
pub async fn list_theaters(
    State(services): State<SalesServices>,
) -> AppResult<Json<Vec<TheaterResponse>>> {
    let theaters = services.list_theaters.execute(ListTheatersQuery).await?;

    Ok(Json(theaters.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/theaters/{theater_id}/movies",
    params(
        ("theater_id" = i32, Path, description = "Theater ID")
    ),
    responses(
        (status = 200, description = "Revenue per movie and date", body = MoviesByTheaterResponse),
        (status = 400, description = "Invalid theater id", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Sales store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "sales"
)]
#[instrument(skip(services))]
pub async fn get_movies_by_theater(
    State(services): State<SalesServices>, Path(theater_id): Path<String>,
) -> AppResult<Json<MoviesByTheaterResponse>> {
    let theater_id = parse_theater_id(&theater_id)?;

    let movies = services
        .movies_by_theater
        .execute(GetMoviesByTheaterQuery { theater_id })
        .await?;

    Ok(Json(movies.into()))
}

#[utoipa::path(
    get,
    path = "/top-theater/{date}",
    params(
        ("date" = String, Path, description = "Sale date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Theater with the highest revenue that day", body = TopTheaterResponse),
        (status = 400, description = "Invalid date", body = common_errors::ApiErrorResponse),
        (status = 404, description = "No sales that day", body = MessageResponse),
        (status = 500, description = "Sales store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "sales"
)]
#[instrument(skip(services))]
pub async fn get_top_theater(
    State(services): State<SalesServices>, Path(date): Path<String>,
) -> AppResult<Response> {
    let date = parse_date(&date)?;

    match services.top_theater.execute(GetTopTheaterQuery { date }).await {
        Ok(top) => Ok(Json(TopTheaterResponse::from(top)).into_response()),
        Err(SalesError::NoDataFound) => {
            Ok((
                StatusCode::NOT_FOUND,
                Json(MessageResponse::new(NO_DATA_MESSAGE)),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        assert_eq!(parse_theater_id("12").unwrap(), 12);
        assert!(parse_theater_id("twelve").is_err());
        assert!(parse_theater_id("1.5").is_err());

        assert_eq!(
            parse_date("2024-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("10-03-2024").is_err());
    }
}
