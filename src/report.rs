// Category breakdown report
// Every call re-reads the store and rebuilds the chart; nothing is cached.

use crate::chart::{PieChart, CHART_TITLE};
use crate::db::{get_category_totals, CategoryTotal};
use crate::error::ReportError;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Report {
    pub totals: Vec<CategoryTotal>,
    pub chart: PieChart,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// No expenses recorded yet; nothing was rendered
    NoData,
    Ready(Report),
}

/// Serializable view of a report for `--json` output
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub generated_at: DateTime<Utc>,
    pub grand_total: f64,
    pub categories: Vec<CategoryShare<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CategoryShare<'a> {
    pub category: &'a str,
    pub total: f64,
    pub percent: f64,
}

impl Report {
    pub fn grand_total(&self) -> f64 {
        self.totals.iter().map(|t| t.total).sum()
    }

    pub fn summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            generated_at: self.generated_at,
            grand_total: self.grand_total(),
            categories: self
                .chart
                .slices
                .iter()
                .map(|s| CategoryShare {
                    category: &s.label,
                    total: s.value,
                    percent: s.fraction * 100.0,
                })
                .collect(),
        }
    }
}

/// Aggregate all expenses by category and build the pie chart
pub fn generate_report(conn: &Connection) -> Result<ReportOutcome, ReportError> {
    let totals = get_category_totals(conn)?;

    if totals.is_empty() {
        log::info!("Report requested with no expenses recorded");
        return Ok(ReportOutcome::NoData);
    }

    let chart = PieChart::from_totals(CHART_TITLE, &totals)?;
    log::info!("Generated report over {} categories", totals.len());

    Ok(ReportOutcome::Ready(Report {
        totals,
        chart,
        generated_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_expense, setup_database, NewExpense};
    use crate::error::ChartError;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn add(conn: &Connection, name: &str, amount: f64, category: &str) {
        insert_expense(
            conn,
            &NewExpense {
                name: name.to_string(),
                amount,
                category: category.to_string(),
            },
        )
        .unwrap();
    }

    fn expect_ready(outcome: ReportOutcome) -> Report {
        match outcome {
            ReportOutcome::Ready(report) => report,
            ReportOutcome::NoData => panic!("expected a report, got NoData"),
        }
    }

    #[test]
    fn test_no_data() {
        let conn = memory_db();
        let outcome = generate_report(&conn).unwrap();
        assert!(matches!(outcome, ReportOutcome::NoData));
    }

    #[test]
    fn test_aggregates_by_category() {
        let conn = memory_db();
        add(&conn, "Groceries", 10.0, "Food");
        add(&conn, "Snack", 5.0, "Food");
        add(&conn, "Taxi", 20.0, "Transport");

        let report = expect_ready(generate_report(&conn).unwrap());

        let slices: Vec<(&str, f64)> = report
            .chart
            .slices
            .iter()
            .map(|s| (s.label.as_str(), s.value))
            .collect();
        assert_eq!(slices, vec![("Food", 15.0), ("Transport", 20.0)]);
        assert_eq!(report.grand_total(), 35.0);
        assert_eq!(report.chart.total(), 35.0);
    }

    #[test]
    fn test_repeated_generation_is_stable() {
        let conn = memory_db();
        add(&conn, "Groceries", 10.0, "Food");
        add(&conn, "Taxi", 20.0, "Transport");

        let first = expect_ready(generate_report(&conn).unwrap());
        let second = expect_ready(generate_report(&conn).unwrap());

        assert_eq!(first.totals, second.totals);
        assert_eq!(first.chart, second.chart);
    }

    #[test]
    fn test_reflects_new_records() {
        let conn = memory_db();
        add(&conn, "Groceries", 10.0, "Food");
        let before = expect_ready(generate_report(&conn).unwrap());

        add(&conn, "Cinema", 8.0, "Fun");
        let after = expect_ready(generate_report(&conn).unwrap());

        assert_eq!(before.totals.len(), 1);
        assert_eq!(after.totals.len(), 2);
    }

    #[test]
    fn test_negative_total_fails_to_render() {
        let conn = memory_db();
        add(&conn, "Refund", -30.0, "Shopping");
        add(&conn, "Lunch", 10.0, "Food");

        let err = generate_report(&conn).unwrap_err();
        assert!(matches!(err, ReportError::Chart(ChartError::InvalidWedge { .. })));
    }

    #[test]
    fn test_storage_failure() {
        // Table never created
        let conn = Connection::open_in_memory().unwrap();
        let err = generate_report(&conn).unwrap_err();
        assert!(matches!(err, ReportError::Storage(_)));
    }

    #[test]
    fn test_summary_json() {
        let conn = memory_db();
        add(&conn, "Groceries", 15.0, "Food");
        add(&conn, "Taxi", 5.0, "Transport");

        let report = expect_ready(generate_report(&conn).unwrap());
        let json = serde_json::to_value(report.summary()).unwrap();

        assert_eq!(json["grand_total"], 20.0);
        assert_eq!(json["categories"][0]["category"], "Food");
        assert_eq!(json["categories"][0]["percent"], 75.0);
        assert_eq!(json["categories"][1]["total"], 5.0);
    }
}
