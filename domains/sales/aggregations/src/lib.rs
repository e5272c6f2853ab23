//! Revenue aggregates over sale records.
//!
//! Everything here is pure. Records that fail validation are logged and
//! left out of every total.

use std::{collections::BTreeMap, fmt::Display};

use chrono::NaiveDate;
use sales_models::{MovieSales, SaleRecord, TheaterRevenue};
use tracing::warn;

/// Validated records ready for aggregation, with a count of what was
/// dropped on the way in.
#[derive(Debug, Clone, Default)]
pub struct SalesBatch {
    records: Vec<SaleRecord>,
    skipped: usize,
}

impl SalesBatch {
    pub fn new(records: impl IntoIterator<Item = SaleRecord>) -> Self {
        Self::decode(records.into_iter().map(Ok::<_, std::convert::Infallible>))
    }

    /// Builds a batch from decode results, typically the members of a cached
    /// list. Undecodable and invalid entries are skipped.
    pub fn decode<E>(
        items: impl IntoIterator<Item = Result<SaleRecord, E>>,
    ) -> Self
    where
        E: Display,
    {
        let mut batch = Self::default();

        for item in items {
            match item {
                Ok(record) if is_valid(&record) => batch.records.push(record),
                Ok(_) => batch.skipped += 1,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable sale record");
                    batch.skipped += 1;
                }
            }
        }

        batch
    }

    pub fn records(&self) -> &[SaleRecord] { &self.records }

    pub fn into_records(self) -> Vec<SaleRecord> { self.records }

    pub fn skipped(&self) -> usize { self.skipped }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

fn is_valid(record: &SaleRecord) -> bool {
    match record.validate() {
        Ok(()) => true,
        Err(defect) => {
            warn!(
                sale_id = record.sale_id,
                %defect,
                "Skipping malformed sale record"
            );
            false
        }
    }
}

/// Total revenue per theater.
///
/// Records are summed in `sale_id` order so the floating point totals do not
/// depend on input order.
pub fn revenue_by_theater(records: &[SaleRecord]) -> BTreeMap<i32, f64> {
    let mut valid: Vec<&SaleRecord> =
        records.iter().filter(|r| is_valid(r)).collect();
    valid.sort_by_key(|r| r.sale_id);

    let mut totals = BTreeMap::new();
    for record in valid {
        *totals.entry(record.theater_id).or_insert(0.0) += record.revenue();
    }
    totals
}

/// Theater with the highest revenue. On a tie the lowest theater id wins.
pub fn top_theater(records: &[SaleRecord]) -> Option<TheaterRevenue> {
    let mut best: Option<TheaterRevenue> = None;

    for (theater_id, revenue) in revenue_by_theater(records) {
        match best {
            Some(current) if revenue <= current.revenue => {}
            _ => {
                best = Some(TheaterRevenue {
                    theater_id,
                    revenue,
                })
            }
        }
    }

    best
}

/// Revenue per (movie, date), in the order each pair first appears.
pub fn movies_by_theater(records: &[SaleRecord]) -> Vec<MovieSales> {
    let mut groups: Vec<MovieSales> = Vec::new();
    let mut index: BTreeMap<(&str, NaiveDate), usize> = BTreeMap::new();

    for record in records.iter().filter(|r| is_valid(r)) {
        let key = (record.movie_title.as_str(), record.sale_date);
        match index.get(&key) {
            Some(&at) => groups[at].ticket_sales += record.revenue(),
            None => {
                index.insert(key, groups.len());
                groups.push(MovieSales {
                    title: record.movie_title.clone(),
                    sale_date: record.sale_date,
                    ticket_sales: record.revenue(),
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sale(
        sale_id: i32, theater_id: i32, title: &str, day: &str, tickets: i32,
        price: f64,
    ) -> SaleRecord {
        SaleRecord {
            sale_id,
            theater_id,
            movie_title: title.to_string(),
            sale_date: date(day),
            tickets_sold: tickets,
            ticket_price: price,
        }
    }

    #[test]
    fn test_movies_grouped_by_title_and_date() {
        let records = vec![
            sale(1, 1, "Inception", "2024-03-10", 100, 10.0),
            sale(2, 1, "Dune", "2024-03-10", 50, 12.0),
        ];

        let movies = movies_by_theater(&records);

        assert_eq!(movies, vec![
            MovieSales {
                title: "Inception".into(),
                sale_date: date("2024-03-10"),
                ticket_sales: 1000.0,
            },
            MovieSales {
                title: "Dune".into(),
                sale_date: date("2024-03-10"),
                ticket_sales: 600.0,
            },
        ]);
    }

    #[test]
    fn test_sales_of_one_group_are_summed() {
        let records = vec![
            sale(1, 1, "Inception", "2024-03-10", 50, 10.0),
            sale(2, 1, "Dune", "2024-03-10", 40, 15.0),
            sale(3, 1, "Inception", "2024-03-10", 50, 10.0),
        ];

        let movies = movies_by_theater(&records);

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].ticket_sales, 1000.0);
        assert_eq!(movies[1].ticket_sales, 600.0);
    }

    #[test]
    fn test_same_title_on_other_day_is_its_own_group() {
        let records = vec![
            sale(1, 1, "Dune", "2024-03-10", 1, 10.0),
            sale(2, 1, "Dune", "2024-03-11", 2, 10.0),
        ];

        let movies = movies_by_theater(&records);

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].ticket_sales, 20.0);
    }

    #[test]
    fn test_top_theater_for_a_date() {
        let records = vec![
            sale(1, 1, "Inception", "2024-03-10", 100, 10.0),
            sale(2, 1, "Dune", "2024-03-10", 40, 15.0),
            sale(3, 2, "Inception", "2024-03-10", 120, 10.0),
            sale(4, 2, "Dune", "2024-03-10", 40, 15.0),
        ];

        let top = top_theater(&records).unwrap();

        assert_eq!(top, TheaterRevenue {
            theater_id: 2,
            revenue: 1800.0,
        });
        assert_eq!(revenue_by_theater(&records)[&1], 1600.0);
    }

    #[test]
    fn test_ties_resolve_to_lowest_theater_id() {
        let records = vec![
            sale(1, 9, "Dune", "2024-03-10", 10, 10.0),
            sale(2, 4, "Dune", "2024-03-10", 10, 10.0),
            sale(3, 6, "Dune", "2024-03-10", 5, 10.0),
        ];

        assert_eq!(top_theater(&records).unwrap().theater_id, 4);
    }

    #[test]
    fn test_empty_input_has_no_top_theater() {
        assert_eq!(top_theater(&[]), None);
        assert!(revenue_by_theater(&[]).is_empty());
        assert!(movies_by_theater(&[]).is_empty());
    }

    #[test]
    fn test_totals_do_not_depend_on_input_order() {
        let mut records = vec![
            sale(1, 1, "A", "2024-03-10", 3, 0.1),
            sale(2, 1, "B", "2024-03-10", 7, 0.7),
            sale(3, 2, "C", "2024-03-10", 11, 1.3),
            sale(4, 1, "D", "2024-03-10", 13, 2.9),
            sale(5, 2, "E", "2024-03-10", 17, 0.3),
        ];
        let forward = revenue_by_theater(&records);

        records.reverse();
        let reversed = revenue_by_theater(&records);

        records.swap(0, 3);
        let shuffled = revenue_by_theater(&records);

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let records = vec![
            sale(1, 1, "Dune", "2024-03-10", -5, 10.0),
            sale(2, 2, "Dune", "2024-03-10", 5, f64::INFINITY),
            sale(3, 3, "", "2024-03-10", 5, 10.0),
        ];

        assert_eq!(top_theater(&records), None);

        let mut with_valid = records.clone();
        with_valid.push(sale(4, 5, "Dune", "2024-03-10", 1, 8.0));
        assert_eq!(top_theater(&with_valid).unwrap().theater_id, 5);
    }

    #[test]
    fn test_batch_counts_what_it_drops() {
        let items: Vec<Result<SaleRecord, String>> = vec![
            Ok(sale(1, 1, "Dune", "2024-03-10", 2, 10.0)),
            Err("missing field `ticket_price`".into()),
            Ok(sale(2, 1, "Dune", "2024-03-10", -2, 10.0)),
        ];

        let batch = SalesBatch::decode(items);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.skipped(), 2);
        assert_eq!(revenue_by_theater(batch.records())[&1], 20.0);
    }
}
