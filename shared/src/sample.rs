//! Built-in sample dataset and the downloadable CSV template

use chrono::{Duration, NaiveDate};

use crate::expiration::NORMALIZED_DATE_FORMAT;
use crate::models::RawProductRow;

/// File name reported for runs built from the sample dataset
pub const SAMPLE_SOURCE_NAME: &str = "sample_inventory.csv";

/// (id, name, current, ideal, days until expiry)
const SAMPLE_PRODUCTS: [(&str, &str, u32, u32, Option<i64>); 8] = [
    ("P001", "Organic Rice 5kg", 120, 100, Some(240)),
    ("P002", "Olive Oil 1L", 30, 80, Some(300)),
    ("P003", "Whole Wheat Bread", 60, 60, Some(2)),
    ("P004", "Fresh Milk 1L", 15, 50, Some(5)),
    ("P005", "Brown Sugar 1kg", 80, 75, None),
    ("P006", "Greek Yogurt 500g", 40, 30, Some(0)),
    ("P007", "Cheddar Cheese 200g", 70, 25, Some(20)),
    ("P008", "Canned Tomatoes", 12, 90, Some(-3)),
];

/// Column order of the template download
pub const TEMPLATE_HEADERS: [&str; 5] = [
    "product_id",
    "product_name",
    "current_stock",
    "ideal_stock_level",
    "expiration_date",
];

fn date_after(today: NaiveDate, days: i64) -> String {
    (today + Duration::days(days)).format(NORMALIZED_DATE_FORMAT).to_string()
}

/// Sample rows with expiration dates relative to `today`
pub fn sample_rows(today: NaiveDate) -> Vec<RawProductRow> {
    SAMPLE_PRODUCTS
        .iter()
        .map(|(id, name, current, ideal, expires_in)| RawProductRow {
            product_id: id.to_string(),
            product_name: name.to_string(),
            current_stock: current.to_string(),
            ideal_stock_level: Some(ideal.to_string()),
            expiration_date: expires_in.map(|days| date_after(today, days)),
            undecodable: false,
        })
        .collect()
}

/// Example records for the CSV template, matching [`TEMPLATE_HEADERS`]
pub fn template_records(today: NaiveDate) -> Vec<[String; 5]> {
    [
        ("P001", "Example Product 1", "25", "100", 90),
        ("P002", "Example Product 2", "50", "75", 30),
        ("P003", "Example Product 3", "10", "30", 7),
    ]
    .iter()
    .map(|(id, name, current, ideal, days)| {
        [
            id.to_string(),
            name.to_string(),
            current.to_string(),
            ideal.to_string(),
            date_after(today, *days),
        ]
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOrchestrator;
    use crate::expiration::ExpiryWindows;
    use crate::history::MemoryHistoryStore;
    use chrono::Utc;

    #[test]
    fn test_sample_covers_every_alert_kind() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let store = MemoryHistoryStore::new();
        let run = AnalysisOrchestrator::new(&store, ExpiryWindows::default())
            .run(&sample_rows(today), SAMPLE_SOURCE_NAME, today, Utc::now())
            .unwrap();

        assert_eq!(run.recommendations.len(), SAMPLE_PRODUCTS.len());
        assert!(run.warnings.is_empty());
        assert!(run.summary.critical() > 0);
        assert!(run.summary.understock > 0);
        assert!(run.summary.optimal > 0);
        assert!(run.summary.expired > 0);
        assert!(run.summary.expiring > 0);
    }
}
