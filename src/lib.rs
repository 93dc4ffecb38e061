// Finance Tracker - Core Library
// Exposes all modules for use in the CLI, the TUI and tests

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod chart;
pub mod report;
pub mod transfer;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use db::{
    Expense, NewExpense, CategoryTotal,
    open_database, setup_database, insert_expense,
    get_all_expenses, get_category_totals, verify_count,
};
pub use error::{ChartError, Field, ReportError, SaveError, ValidationError};
pub use form::ExpenseForm;
pub use chart::{PieChart, Slice, CHART_TITLE};
pub use report::{generate_report, Report, ReportOutcome};
pub use transfer::{export_csv_file, import_csv_file, ImportSummary};
