//! Upload layout validation
//!
//! Header resolution for inventory CSV files, the pre-flight validation
//! report, and small input checks used by the settings endpoints.

use serde::{Deserialize, Serialize};

use crate::error::ColumnError;
use crate::expiration::parse_expiration_date;
use crate::models::{parse_quantity, RawProductRow};

// ============================================================================
// Column Layout
// ============================================================================

pub const REQUIRED_COLUMNS: [&str; 3] = ["product_id", "product_name", "current_stock"];

pub const IDEAL_STOCK_COLUMN: &str = "ideal_stock_level";

/// Expiration column names in priority order; per row the first non-empty one is used
pub const EXPIRY_COLUMN_ALIASES: [&str; 4] = ["expiration_date", "expiry_date", "Expiry", "expiry"];

/// Positions of the known columns in a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    product_id: usize,
    product_name: usize,
    current_stock: usize,
    ideal_stock_level: Option<usize>,
    /// Present alias columns, in alias priority order
    expiry: Vec<(String, usize)>,
}

fn position(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim() == name)
}

impl ColumnLayout {
    /// Resolve column positions; fails when any required column is absent
    pub fn from_headers(headers: &[String]) -> Result<Self, ColumnError> {
        if headers.iter().all(|header| header.trim().is_empty()) {
            return Err(ColumnError::NoHeader);
        }

        let positions = REQUIRED_COLUMNS.map(|column| position(headers, column));
        let [Some(product_id), Some(product_name), Some(current_stock)] = positions else {
            let missing = REQUIRED_COLUMNS
                .iter()
                .zip(positions)
                .filter(|(_, index)| index.is_none())
                .map(|(column, _)| column.to_string())
                .collect();
            return Err(ColumnError::MissingRequired(missing));
        };

        Ok(Self {
            product_id,
            product_name,
            current_stock,
            ideal_stock_level: position(headers, IDEAL_STOCK_COLUMN),
            expiry: EXPIRY_COLUMN_ALIASES
                .iter()
                .filter_map(|alias| position(headers, alias).map(|index| (alias.to_string(), index)))
                .collect(),
        })
    }

    pub fn has_ideal_stock(&self) -> bool {
        self.ideal_stock_level.is_some()
    }

    /// Expiry alias columns present in the file
    pub fn expiry_columns(&self) -> Vec<&str> {
        self.expiry.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Build a raw row from one record's fields; short records read as blanks
    pub fn extract(&self, record: &[&str]) -> RawProductRow {
        let field = |index: usize| record.get(index).map(|value| value.trim()).unwrap_or("");

        RawProductRow {
            product_id: field(self.product_id).to_string(),
            product_name: field(self.product_name).to_string(),
            current_stock: field(self.current_stock).to_string(),
            ideal_stock_level: self
                .ideal_stock_level
                .map(field)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            expiration_date: self
                .expiry
                .iter()
                .map(|(_, index)| field(*index))
                .find(|value| !value.is_empty())
                .map(str::to_string),
            undecodable: false,
        }
    }
}

// ============================================================================
// Validation Report
// ============================================================================

/// Values shown in the report's expiration sample
const EXPIRY_SAMPLE_SIZE: usize = 5;

/// A date value no accepted layout could parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidDate {
    pub row: usize,
    pub value: String,
}

/// Pre-flight report for an uploaded CSV; nothing is analyzed or stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvValidationReport {
    pub is_valid: bool,
    pub total_rows: usize,
    pub columns_found: Vec<String>,
    pub missing_columns: Vec<String>,
    pub has_ideal_stock: bool,
    pub expiry_columns: Vec<String>,
    pub sample_expiration_values: Vec<String>,
    pub invalid_dates: Vec<InvalidDate>,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Check headers and row contents without analyzing anything
pub fn validate_csv_format(headers: &[String], records: &[Vec<String>]) -> CsvValidationReport {
    let mut report = CsvValidationReport {
        total_rows: records.len(),
        columns_found: headers.iter().map(|header| header.trim().to_string()).collect(),
        ..Default::default()
    };

    let layout = match ColumnLayout::from_headers(headers) {
        Ok(layout) => layout,
        Err(err) => {
            report.missing_columns = err.missing_columns().to_vec();
            report.issues.push(err.to_string());
            report
                .suggestions
                .push(format!("Include the columns: {}", REQUIRED_COLUMNS.join(", ")));
            return report;
        }
    };

    report.has_ideal_stock = layout.has_ideal_stock();
    report.expiry_columns = layout.expiry_columns().into_iter().map(str::to_string).collect();

    if !report.has_ideal_stock {
        report.suggestions.push(format!(
            "No {} column: ideal levels will be estimated from history or product names",
            IDEAL_STOCK_COLUMN
        ));
    }
    if report.expiry_columns.is_empty() {
        report.suggestions.push(format!(
            "Add an expiration column ({}) to enable expiry alerts",
            EXPIRY_COLUMN_ALIASES.join(", ")
        ));
    }
    if records.is_empty() {
        report.issues.push("File contains no data rows".to_string());
    }

    for (index, record) in records.iter().enumerate() {
        let row_number = index + 1;
        let fields: Vec<&str> = record.iter().map(String::as_str).collect();
        let raw = layout.extract(&fields);

        if raw.product_id.is_empty() {
            report.issues.push(format!("Row {}: product_id is empty", row_number));
        }
        if let Err(err) = parse_quantity("current_stock", &raw.current_stock) {
            report.issues.push(format!("Row {}: {}", row_number, err));
        }
        if let Some(ideal) = raw.ideal_stock_level.as_deref() {
            if let Err(err) = parse_quantity(IDEAL_STOCK_COLUMN, ideal) {
                report.issues.push(format!("Row {}: {}", row_number, err));
            }
        }

        if let Some(date) = raw.expiration_date {
            if parse_expiration_date(&date).is_none() {
                report.invalid_dates.push(InvalidDate {
                    row: row_number,
                    value: date.clone(),
                });
            }
            if report.sample_expiration_values.len() < EXPIRY_SAMPLE_SIZE {
                report.sample_expiration_values.push(date);
            }
        }
    }

    if !report.invalid_dates.is_empty() {
        report
            .suggestions
            .push("Use YYYY-MM-DD, DD-MM-YYYY, DD/MM/YYYY or MM/DD/YYYY for dates".to_string());
    }

    report.is_valid = report.issues.is_empty();
    report
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err("Invalid email format");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn record(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    // ========================================================================
    // Column Layout Tests
    // ========================================================================

    #[test]
    fn test_missing_required_columns_named() {
        let err = ColumnLayout::from_headers(&headers(&["product_id", "stock"])).unwrap_err();
        assert_eq!(
            err.missing_columns(),
            &["product_name".to_string(), "current_stock".to_string()]
        );
        assert_eq!(
            err.to_string(),
            "Missing required column(s): product_name, current_stock"
        );
    }

    #[test]
    fn test_required_columns_in_any_order() {
        let layout = ColumnLayout::from_headers(&headers(&[
            " current_stock ",
            "notes",
            "product_name",
            "product_id",
        ]))
        .unwrap();
        let row = layout.extract(&["12", "x", "Milk", "P1"]);
        assert_eq!(row.product_id, "P1");
        assert_eq!(row.product_name, "Milk");
        assert_eq!(row.current_stock, "12");
        assert!(!layout.has_ideal_stock());
    }

    #[test]
    fn test_expiry_alias_priority_per_row() {
        let layout = ColumnLayout::from_headers(&headers(&[
            "product_id",
            "product_name",
            "current_stock",
            "expiry",
            "expiration_date",
        ]))
        .unwrap();
        assert_eq!(layout.expiry_columns(), vec!["expiration_date", "expiry"]);

        let both = layout.extract(&["P1", "Milk", "4", "01/02/2026", "2026-03-01"]);
        assert_eq!(both.expiration_date.as_deref(), Some("2026-03-01"));

        let fallback = layout.extract(&["P1", "Milk", "4", "01/02/2026", ""]);
        assert_eq!(fallback.expiration_date.as_deref(), Some("01/02/2026"));
    }

    #[test]
    fn test_short_record_reads_blank() {
        let layout = ColumnLayout::from_headers(&headers(&[
            "product_id",
            "product_name",
            "current_stock",
            "ideal_stock_level",
        ]))
        .unwrap();
        let row = layout.extract(&["P9", " Tea "]);
        assert_eq!(row.product_name, "Tea");
        assert_eq!(row.current_stock, "");
        assert_eq!(row.ideal_stock_level, None);
    }

    // ========================================================================
    // Validation Report Tests
    // ========================================================================

    #[test]
    fn test_report_flags_bad_dates_and_numbers() {
        let report = validate_csv_format(
            &headers(&["product_id", "product_name", "current_stock", "expiry_date"]),
            &[
                record(&["P1", "Milk", "10", "2026-01-01"]),
                record(&["P2", "Eggs", "lots", "tomorrow"]),
            ],
        );
        assert!(!report.is_valid);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(
            report.invalid_dates,
            vec![InvalidDate {
                row: 2,
                value: "tomorrow".to_string()
            }]
        );
        assert_eq!(report.sample_expiration_values.len(), 2);
        assert!(!report.has_ideal_stock);
    }

    #[test]
    fn test_report_missing_columns() {
        let report = validate_csv_format(&headers(&["name"]), &[]);
        assert!(!report.is_valid);
        assert_eq!(report.missing_columns.len(), 3);
    }

    #[test]
    fn test_report_clean_file() {
        let report = validate_csv_format(
            &headers(&["product_id", "product_name", "current_stock", "ideal_stock_level"]),
            &[record(&["P1", "Milk", "10", "20"])],
        );
        assert!(report.is_valid);
        assert!(report.invalid_dates.is_empty());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ops@example.com").is_ok());
        assert!(validate_email("a.b+c@shop.co.uk").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a@example").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }
}
