use common_errors::AppError;
use redis_connection::CacheError;
use sql_connection::{PgError, PoolError as DbPoolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SalesError {
    #[error("Sales store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
    #[error("Malformed sale record {sale_id:?}: {reason}")]
    MalformedRecord { sale_id: Option<i32>, reason: String },
    #[error("No sales data available")]
    NoDataFound,
    #[error("Theater not found: {theater_id}")]
    TheaterNotFound { theater_id: i32 },
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

impl From<PgError> for SalesError {
    fn from(err: PgError) -> Self { Self::StoreUnavailable(err.to_string()) }
}

impl From<DbPoolError> for SalesError {
    fn from(err: DbPoolError) -> Self {
        Self::StoreUnavailable(format!("connection pool: {err}"))
    }
}

pub const NO_DATA_MESSAGE: &str = "No sales data available";

impl From<SalesError> for AppError {
    fn from(err: SalesError) -> Self {
        match err {
            SalesError::NoDataFound => {
                AppError::not_found("NO_SALES_DATA", NO_DATA_MESSAGE)
            }
            SalesError::TheaterNotFound { theater_id } => {
                AppError::not_found(
                    "THEATER_NOT_FOUND",
                    &format!("Theater with ID {theater_id} not found"),
                )
            }
            SalesError::InvalidParameter { name, value } => {
                AppError::bad_request_with_details(
                    "INVALID_PARAMETER",
                    &format!("Invalid {name}"),
                    &value,
                )
            }
            SalesError::StoreUnavailable(msg) => {
                AppError::internal_with_details(
                    "STORE_UNAVAILABLE",
                    "Sales store unavailable",
                    &msg,
                )
            }
            SalesError::CacheUnavailable(cache_err) => {
                AppError::internal_server_error(&format!(
                    "Cache error: {cache_err}"
                ))
            }
            SalesError::MalformedRecord { sale_id, reason } => {
                AppError::internal_server_error(&format!(
                    "Malformed sale record {sale_id:?}: {reason}"
                ))
            }
        }
    }
}
