//! Error types for the user-facing operations.
//!
//! Storage plumbing in `db` returns `anyhow::Result`; these enums sit on top
//! so the UI can tell a validation problem apart from a broken database.

use thiserror::Error;

/// Which entry field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Amount,
    Category,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Expense Name",
            Field::Amount => "Amount",
            Field::Category => "Category",
        }
    }
}

/// Input rejected before anything touches the database.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    MissingField(Field),

    #[error("amount is not a number: {0:?}")]
    InvalidAmount(String),
}

/// Failure of the save action.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Chart construction or rendering failure.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("nothing to plot")]
    Empty,

    #[error("wedge size for {category:?} must be a non-negative number, got {value}")]
    InvalidWedge { category: String, value: f64 },

    #[error("wedge sizes sum to zero")]
    ZeroTotal,

    #[error("render failed: {0}")]
    Render(String),
}

/// Failure of report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0:#}")]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Chart(#[from] ChartError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingField(Field::Category).to_string(),
            "Category is required"
        );
        assert_eq!(
            ValidationError::InvalidAmount("abc".to_string()).to_string(),
            "amount is not a number: \"abc\""
        );
    }

    #[test]
    fn test_save_error_wraps_validation() {
        let err: SaveError = ValidationError::MissingField(Field::Name).into();
        assert!(matches!(err, SaveError::Validation(_)));
        assert_eq!(err.to_string(), "Expense Name is required");
    }
}
