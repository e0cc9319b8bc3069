//! Columnar table decoding.
//!
//! The data API returns tables as `{ Column: [v0, v1, ...], ... }` with every
//! array aligned by row index. A row is therefore an index, and that one
//! index is used for every column.

use serde_json::{Map, Value};

use docguard_core::{
    validate_timeout_minutes, AuthorizationRecord, DisplayDensity, Theme,
};

use crate::error::{AuthzError, Result};

/// Recognised column names.
pub mod columns {
    pub const EMAIL: &str = "Email";
    pub const UNLOCK_STRUCTURE: &str = "Unlock_Structure";
    pub const EXPORT_DATA: &str = "Export_Data";
    pub const TIMEOUT_MINUTES: &str = "Timeout_Minutes";
    pub const THEME: &str = "Theme";
    pub const DISPLAY_DENSITY: &str = "Display_Density";
}

/// A decoded columnar table.
#[derive(Debug, Clone)]
pub struct ColumnarTable {
    columns: Map<String, Value>,
}

impl ColumnarTable {
    /// Decode a payload. The payload must be an object with an `Email` array.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(columns) = value else {
            return Err(AuthzError::Malformed("table payload is not an object".into()));
        };
        if !matches!(columns.get(columns::EMAIL), Some(Value::Array(_))) {
            return Err(AuthzError::Malformed(format!(
                "table has no {} column",
                columns::EMAIL
            )));
        }
        Ok(Self { columns })
    }

    /// Number of rows, per the `Email` column.
    pub fn row_count(&self) -> usize {
        self.column(columns::EMAIL).map_or(0, <[Value]>::len)
    }

    fn column(&self, name: &str) -> Option<&[Value]> {
        match self.columns.get(name) {
            Some(Value::Array(values)) => Some(values),
            _ => None,
        }
    }

    /// The cell at (`column`, `row`), if present.
    pub fn cell(&self, column: &str, row: usize) -> Option<&Value> {
        self.column(column)?.get(row)
    }

    /// First row whose email equals `email`, ignoring case and surrounding whitespace.
    pub fn find_row_by_email(&self, email: &str) -> Option<usize> {
        let wanted = normalize_email(email);
        if wanted.is_empty() {
            return None;
        }
        self.column(columns::EMAIL)?
            .iter()
            .position(|cell| cell.as_str().map(normalize_email).as_deref() == Some(wanted.as_str()))
    }

    /// Build the record for `row`.
    ///
    /// Only a JSON `true` grants a capability. Unrecognised columns are ignored.
    pub fn record_for_row(&self, row: usize) -> AuthorizationRecord {
        let granted = |column| matches!(self.cell(column, row), Some(Value::Bool(true)));
        let text = |column| self.cell(column, row).and_then(Value::as_str);

        AuthorizationRecord {
            can_alter_structure: granted(columns::UNLOCK_STRUCTURE),
            can_export: granted(columns::EXPORT_DATA),
            idle_timeout_minutes: validate_timeout_minutes(
                self.cell(columns::TIMEOUT_MINUTES, row).and_then(Value::as_f64),
            ),
            theme: text(columns::THEME).and_then(Theme::parse),
            display_density: text(columns::DISPLAY_DENSITY).and_then(DisplayDensity::parse),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
