// CSV import/export
// Imported rows go through the same form validation and save path as typed input.

use crate::db::{get_all_expenses, Expense};
use crate::error::SaveError;
use crate::form::ExpenseForm;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use std::io;
use std::path::Path;

/// Input row; amount stays text so validation can reject it
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    category: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Write every expense as CSV (id,name,amount,category,date)
pub fn export_csv<W: io::Write>(conn: &Connection, writer: W) -> Result<usize> {
    let expenses = get_all_expenses(conn)?;
    let mut wtr = csv::Writer::from_writer(writer);

    for expense in &expenses {
        wtr.serialize(expense).context("Failed to write expense row")?;
    }
    wtr.flush()?;

    Ok(expenses.len())
}

pub fn export_csv_file(conn: &Connection, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    export_csv(conn, file)
}

/// Read name,amount,category rows and save each valid one
pub fn import_csv<R: io::Read>(conn: &Connection, reader: R) -> Result<ImportSummary> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut summary = ImportSummary::default();

    for (index, result) in rdr.deserialize::<ImportRow>().enumerate() {
        // Header is line 1
        let line = index + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping line {}: {}", line, e);
                summary.skipped += 1;
                continue;
            }
        };

        let mut form = ExpenseForm::new(&row.name, &row.amount, &row.category);
        match form.save(conn) {
            Ok(_) => summary.inserted += 1,
            Err(SaveError::Validation(e)) => {
                log::warn!("Skipping line {}: {}", line, e);
                summary.skipped += 1;
            }
            Err(SaveError::Storage(e)) => return Err(e),
        }
    }

    log::info!(
        "Imported {} expenses ({} skipped)",
        summary.inserted,
        summary.skipped
    );

    Ok(summary)
}

pub fn import_csv_file(conn: &Connection, path: &Path) -> Result<ImportSummary> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    import_csv(conn, file)
}

/// Parse an exported CSV back into expenses
pub fn read_export<R: io::Read>(reader: R) -> Result<Vec<Expense>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut expenses = Vec::new();

    for result in rdr.deserialize() {
        let expense: Expense = result.context("Failed to deserialize expense")?;
        expenses.push(expense);
    }

    Ok(expenses)
}
