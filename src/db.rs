use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format SQLite's `datetime('now')` produces
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded spending event
/// id and date are assigned by the store, never by the application
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
}

impl Expense {
    /// Store timestamp as a chrono value (UTC)
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, STORE_TIMESTAMP_FORMAT).ok()
    }
}

/// Validated insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub name: String,
    pub amount: f64,
    pub category: String,
}

/// Sum of amounts for one category label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    log::debug!("Opened expense store at {}", path.display());
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            amount REAL,
            category TEXT,
            date TEXT
        )",
        [],
    )
    .context("Failed to create expenses table")?;

    Ok(())
}

/// Insert one expense stamped with the store's current time, returning its id
pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (name, amount, category, date)
         VALUES (?1, ?2, ?3, datetime('now'))",
        params![expense.name, expense.amount, expense.category],
    )
    .context("Failed to insert expense")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_all_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, amount, category, date
         FROM expenses
         ORDER BY id",
    )?;

    let expenses = stmt
        .query_map([], |row| {
            Ok(Expense {
                id: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                amount: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
                category: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

/// Sum of amount per category over every record
pub fn get_category_totals(conn: &Connection) -> Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount)
         FROM expenses
         GROUP BY category
         ORDER BY category",
    )?;

    let totals = stmt
        .query_map([], |row| {
            Ok(CategoryTotal {
                category: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                total: row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to aggregate expenses by category")?;

    Ok(totals)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_expense(name: &str, amount: f64, category: &str) -> NewExpense {
        NewExpense {
            name: name.to_string(),
            amount,
            category: category.to_string(),
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = memory_db();
        insert_expense(&conn, &new_expense("Lunch", 12.5, "Food")).unwrap();

        // Second setup must not drop or recreate the table
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_insert_assigns_id_and_timestamp() {
        let conn = memory_db();

        let id1 = insert_expense(&conn, &new_expense("Coffee", 3.2, "Food")).unwrap();
        let id2 = insert_expense(&conn, &new_expense("Bus", 2.0, "Transport")).unwrap();
        assert!(id2 > id1, "ids must be monotonic");

        let expenses = get_all_expenses(&conn).unwrap();
        assert_eq!(expenses.len(), 2);

        let coffee = &expenses[0];
        assert_eq!(coffee.id, id1);
        assert_eq!(coffee.name, "Coffee");
        assert_eq!(coffee.amount, 3.2);
        assert_eq!(coffee.category, "Food");
        assert!(!coffee.date.is_empty());
        assert!(coffee.recorded_at().is_some(), "store timestamp should parse: {}", coffee.date);
    }

    #[test]
    fn test_category_totals_group_by_label() {
        let conn = memory_db();
        insert_expense(&conn, &new_expense("Groceries", 10.0, "Food")).unwrap();
        insert_expense(&conn, &new_expense("Snack", 5.0, "Food")).unwrap();
        insert_expense(&conn, &new_expense("Taxi", 20.0, "Transport")).unwrap();
        // Different spelling is a different group
        insert_expense(&conn, &new_expense("Bakery", 1.0, "food")).unwrap();

        let totals = get_category_totals(&conn).unwrap();

        assert_eq!(
            totals,
            vec![
                CategoryTotal { category: "Food".to_string(), total: 15.0 },
                CategoryTotal { category: "Transport".to_string(), total: 20.0 },
                CategoryTotal { category: "food".to_string(), total: 1.0 },
            ]
        );
    }

    #[test]
    fn test_category_totals_empty() {
        let conn = memory_db();
        assert!(get_category_totals(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_open_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance_tracker.db");

        {
            let conn = open_database(&path).unwrap();
            insert_expense(&conn, &new_expense("Rent", 900.0, "Housing")).unwrap();
        }

        assert!(path.exists());

        // Reopening keeps the data
        let conn = open_database(&path).unwrap();
        assert_eq!(verify_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_open_database_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("finance_tracker.db");

        let err = open_database(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to open database"));
    }
}
