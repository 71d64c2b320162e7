//! CSV import and export
//!
//! Reading: header resolution and row extraction for uploaded inventories.
//! Writing: recommendation export and the blank template download.

use chrono::NaiveDate;
use serde::Serialize;
use shared::error::RowError;
use shared::models::{AnalysisRun, RawProductRow, Recommendation};
use shared::sample::{template_records, TEMPLATE_HEADERS};
use shared::validation::{validate_csv_format, ColumnLayout, CsvValidationReport};

use crate::error::{AppError, AppResult};

const UTF8_BOM: char = '\u{feff}';

/// Header row plus every data record, as text
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
    /// 1-based numbers of records that were not valid UTF-8, decoded lossily
    pub undecodable_rows: Vec<usize>,
}

impl CsvTable {
    pub fn is_undecodable(&self, row_number: usize) -> bool {
        self.undecodable_rows.contains(&row_number)
    }
}

/// Read a CSV body; ragged rows are allowed and padded later
///
/// Records are decoded one at a time so a single row with invalid UTF-8 is
/// flagged instead of failing the upload. The header row must be valid.
pub fn read_table(bytes: &[u8]) -> AppResult<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidCsv(format!("Could not read header row: {}", e)))?
        .iter()
        .map(|header| header.trim_start_matches(UTF8_BOM).trim().to_string())
        .collect();

    let mut table = CsvTable {
        headers,
        ..Default::default()
    };
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| AppError::InvalidCsv(format!("Row {}: {}", index + 1, e)))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let fields: Vec<String> = match record.iter().map(std::str::from_utf8).collect::<Result<Vec<_>, _>>() {
            Ok(fields) => fields.into_iter().map(str::to_string).collect(),
            Err(_) => {
                table.undecodable_rows.push(table.records.len() + 1);
                record
                    .iter()
                    .map(|field| String::from_utf8_lossy(field).trim().to_string())
                    .collect()
            }
        };
        table.records.push(fields);
    }

    if !table.undecodable_rows.is_empty() {
        tracing::warn!(rows = ?table.undecodable_rows, "Upload has rows that are not valid UTF-8");
    }
    Ok(table)
}

/// Parse an upload into raw rows; missing required columns reject the whole file
pub fn parse_inventory(bytes: &[u8]) -> AppResult<Vec<RawProductRow>> {
    let table = read_table(bytes)?;
    let layout = ColumnLayout::from_headers(&table.headers)?;

    Ok(table
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let fields: Vec<&str> = record.iter().map(String::as_str).collect();
            RawProductRow {
                undecodable: table.is_undecodable(index + 1),
                ..layout.extract(&fields)
            }
        })
        .collect())
}

/// Pre-flight check of an upload without analyzing it
pub fn validate_upload(bytes: &[u8]) -> AppResult<CsvValidationReport> {
    let table = read_table(bytes)?;
    let mut report = validate_csv_format(&table.headers, &table.records);
    if report.missing_columns.is_empty() {
        for row in &table.undecodable_rows {
            report.issues.push(format!("Row {}: {}", row, RowError::InvalidEncoding));
        }
        report.is_valid = report.issues.is_empty();
    }
    Ok(report)
}

/// Export rows as CSV text
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

/// Flat export row for one recommendation
#[derive(Debug, Serialize)]
pub struct RecommendationRecord {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: String,
    pub ideal_stock_level: String,
    pub ideal_stock_source: &'static str,
    pub trend: String,
    pub status: &'static str,
    pub priority: String,
    pub order_quantity: u64,
    pub stock_ratio: String,
    pub days_of_stock: String,
    pub action: String,
    pub expiration_date: String,
    pub days_left: String,
}

impl From<&Recommendation> for RecommendationRecord {
    fn from(rec: &Recommendation) -> Self {
        use shared::models::IdealStockSource;

        let (expiration_date, days_left) = match &rec.expiration {
            Some(expiry) => (
                expiry.expiration_date.format("%Y-%m-%d").to_string(),
                expiry.days_left.to_string(),
            ),
            None => (String::new(), String::new()),
        };

        Self {
            product_id: rec.product_id.clone(),
            product_name: rec.product_name.clone(),
            current_stock: rec.current_stock.to_string(),
            ideal_stock_level: rec.ideal_stock_level.to_string(),
            ideal_stock_source: match rec.ideal_stock_source {
                IdealStockSource::Supplied => "supplied",
                IdealStockSource::Keyword { .. } => "keyword",
                IdealStockSource::History { .. } => "history",
            },
            trend: rec.trend.to_string(),
            status: rec.status.as_str(),
            priority: rec.priority.to_string(),
            order_quantity: rec.order_quantity,
            stock_ratio: rec.stock_ratio.to_string(),
            days_of_stock: rec.days_of_stock.to_string(),
            action: rec.action.clone(),
            expiration_date,
            days_left,
        }
    }
}

pub fn export_run(run: &AnalysisRun) -> AppResult<String> {
    let records: Vec<RecommendationRecord> = run.recommendations.iter().map(Into::into).collect();
    export_to_csv(&records)
}

/// Template file offered for download
pub fn template_csv(today: NaiveDate) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let write_err = |e: csv::Error| AppError::Internal(format!("CSV serialization error: {}", e));
    wtr.write_record(TEMPLATE_HEADERS).map_err(write_err)?;
    for record in template_records(today) {
        wtr.write_record(&record).map_err(write_err)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_bom_and_alias() {
        let body = "\u{feff}product_id,product_name,current_stock,Expiry\nP1, Milk ,10,2026-01-01\n\nP2,Eggs,4\n";
        let rows = parse_inventory(body.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_name, "Milk");
        assert_eq!(rows[0].expiration_date.as_deref(), Some("2026-01-01"));
        assert_eq!(rows[1].expiration_date, None);
    }

    #[test]
    fn test_missing_columns_rejected() {
        let err = parse_inventory(b"id,name\n1,Milk\n").unwrap_err();
        match err {
            AppError::MissingColumns(columns) => {
                assert_eq!(columns, vec!["product_id", "product_name", "current_stock"])
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_row_is_flagged() {
        let mut body = b"product_id,product_name,current_stock\nP1,Milk,10\nP2,Caf".to_vec();
        body.extend_from_slice(&[0xE9, 0xFF]);
        body.extend_from_slice(b",4\nP3,Rice,7\n");

        let rows = parse_inventory(&body).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].undecodable);
        assert!(rows[1].undecodable);
        assert_eq!(rows[1].product_id, "P2");
        assert!(!rows[2].undecodable);

        let report = validate_upload(&body).unwrap();
        assert!(!report.is_valid);
        assert!(report.issues.iter().any(|issue| issue.starts_with("Row 2:")));
    }

    #[test]
    fn test_template_parses_back() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let csv = template_csv(today).unwrap();
        assert!(csv.starts_with("product_id,product_name,current_stock,ideal_stock_level,expiration_date"));
        assert_eq!(parse_inventory(csv.as_bytes()).unwrap().len(), 3);
    }
}
