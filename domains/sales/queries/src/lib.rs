use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ListTheatersQuery;

#[derive(Debug, Deserialize, Clone)]
pub struct GetMoviesByTheaterQuery {
    pub theater_id: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GetTopTheaterQuery {
    pub date: NaiveDate,
}
