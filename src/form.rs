// Expense entry form
// Holds the three text buffers behind the "Add Expense" screen and turns them
// into exactly one stored row, or nothing at all.

use crate::db::{insert_expense, NewExpense};
use crate::error::{Field, SaveError, ValidationError};
use rusqlite::Connection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub name: String,
    pub amount: String,
    pub category: String,
}

impl ExpenseForm {
    pub fn new(name: &str, amount: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Amount => &self.amount,
            Field::Category => &self.category,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Amount => &mut self.amount,
            Field::Category => &mut self.category,
        }
    }

    /// Whether a keystroke is allowed in the given field.
    /// Amount only takes characters that can appear in a decimal number.
    pub fn accepts(field: Field, c: char) -> bool {
        match field {
            Field::Amount => c.is_ascii_digit() || c == '.' || c == '-',
            Field::Name | Field::Category => !c.is_control(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.amount.is_empty() && self.category.is_empty()
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.amount.clear();
        self.category.clear();
    }

    /// Trim every field and check presence, then parse the amount
    pub fn validate(&self) -> Result<NewExpense, ValidationError> {
        let name = self.name.trim();
        let amount = self.amount.trim();
        let category = self.category.trim();

        for (field, value) in [
            (Field::Name, name),
            (Field::Amount, amount),
            (Field::Category, category),
        ] {
            if value.is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        let amount = match amount.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => return Err(ValidationError::InvalidAmount(amount.to_string())),
        };

        Ok(NewExpense {
            name: name.to_string(),
            amount,
            category: category.to_string(),
        })
    }

    /// Validate, insert one record and clear the form.
    /// On any error the form keeps its text and storage is untouched.
    pub fn save(&mut self, conn: &Connection) -> Result<i64, SaveError> {
        let expense = self.validate().map_err(|err| {
            log::debug!("Rejected expense input: {}", err);
            err
        })?;

        let id = insert_expense(conn, &expense)?;
        log::info!("Saved expense #{} ({}: {:.2})", id, expense.category, expense.amount);

        self.clear();
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_all_expenses, setup_database, verify_count};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_save_valid_form_inserts_one_row() {
        let conn = memory_db();
        let mut form = ExpenseForm::new("Lunch", "12.50", "Food");

        let id = form.save(&conn).unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 1);
        let expenses = get_all_expenses(&conn).unwrap();
        assert_eq!(expenses[0].id, id);
        assert_eq!(expenses[0].name, "Lunch");
        assert_eq!(expenses[0].amount, 12.5);
        assert_eq!(expenses[0].category, "Food");
        assert!(!expenses[0].date.is_empty());

        assert!(form.is_empty(), "form should be cleared after save");
    }

    #[test]
    fn test_save_trims_whitespace() {
        let conn = memory_db();
        let mut form = ExpenseForm::new("  Bus ticket ", " 2.75 ", " Transport");

        form.save(&conn).unwrap();

        let expenses = get_all_expenses(&conn).unwrap();
        assert_eq!(expenses[0].name, "Bus ticket");
        assert_eq!(expenses[0].amount, 2.75);
        assert_eq!(expenses[0].category, "Transport");
    }

    #[test]
    fn test_missing_fields_insert_nothing() {
        let conn = memory_db();

        let cases = [
            (ExpenseForm::new("", "10", "Food"), Field::Name),
            (ExpenseForm::new("Lunch", "", "Food"), Field::Amount),
            (ExpenseForm::new("Lunch", "10", ""), Field::Category),
            (ExpenseForm::new("Lunch", "10", "   "), Field::Category),
        ];

        for (mut form, field) in cases {
            let before = form.clone();
            let err = form.save(&conn).unwrap_err();

            assert!(
                matches!(err, SaveError::Validation(ValidationError::MissingField(f)) if f == field),
                "unexpected error: {:?}",
                err
            );
            assert_eq!(form, before, "form must keep its text on failure");
        }

        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_unparseable_amount_inserts_nothing() {
        let conn = memory_db();

        for amount in ["abc", "1.2.3", "-", "inf", "NaN"] {
            let mut form = ExpenseForm::new("Lunch", amount, "Food");
            let err = form.save(&conn).unwrap_err();
            assert!(
                matches!(err, SaveError::Validation(ValidationError::InvalidAmount(_))),
                "{:?} should be rejected",
                amount
            );
        }

        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_storage_failure_keeps_form() {
        // No table: insert fails at the storage layer
        let conn = Connection::open_in_memory().unwrap();
        let mut form = ExpenseForm::new("Lunch", "10", "Food");

        let err = form.save(&conn).unwrap_err();

        assert!(matches!(err, SaveError::Storage(_)));
        assert_eq!(form.name, "Lunch");
    }

    #[test]
    fn test_amount_keystroke_filter() {
        assert!(ExpenseForm::accepts(Field::Amount, '7'));
        assert!(ExpenseForm::accepts(Field::Amount, '.'));
        assert!(ExpenseForm::accepts(Field::Amount, '-'));
        assert!(!ExpenseForm::accepts(Field::Amount, 'x'));
        assert!(ExpenseForm::accepts(Field::Name, 'x'));
        assert!(!ExpenseForm::accepts(Field::Category, '\n'));
    }
}
