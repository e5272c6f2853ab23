use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One ticket sale as stored in the database and in the cache.
///
/// Field order is the serialized order, so equal records always encode to
/// the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_id: i32,
    pub theater_id: i32,
    pub movie_title: String,
    pub sale_date: NaiveDate,
    pub tickets_sold: i32,
    pub ticket_price: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordDefect {
    #[error("tickets_sold is negative: {0}")]
    NegativeTickets(i32),
    #[error("ticket_price is not a valid amount: {0}")]
    InvalidPrice(f64),
    #[error("movie_title is empty")]
    MissingTitle,
}

impl SaleRecord {
    pub fn revenue(&self) -> f64 {
        f64::from(self.tickets_sold) * self.ticket_price
    }

    pub fn validate(&self) -> Result<(), RecordDefect> {
        if self.tickets_sold < 0 {
            return Err(RecordDefect::NegativeTickets(self.tickets_sold));
        }
        if !self.ticket_price.is_finite() || self.ticket_price < 0.0 {
            return Err(RecordDefect::InvalidPrice(self.ticket_price));
        }
        if self.movie_title.trim().is_empty() {
            return Err(RecordDefect::MissingTitle);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theater {
    pub id: i32,
    pub name: String,
}

/// Revenue of one movie on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSales {
    pub title: String,
    pub sale_date: NaiveDate,
    pub ticket_sales: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TheaterRevenue {
    pub theater_id: i32,
    pub revenue: f64,
}

/// Best-selling theater with its resolved display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTheater {
    pub theater: String,
    pub revenue: f64,
}
