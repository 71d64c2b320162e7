//! Analysis orchestration
//!
//! Turns a batch of raw rows into an [`AnalysisRun`]. Per row, in input order:
//! convert, estimate the ideal level when missing, evaluate expiration,
//! classify, then queue a history observation. Rows that cannot be converted
//! are skipped and reported as warnings; the batch always completes.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::classifier::{classify, days_of_stock};
use crate::error::{RowError, StoreError};
use crate::estimator::IdealStockEstimator;
use crate::expiration::{evaluate_raw, ExpiryWindows};
use crate::history::HistoryStore;
use crate::models::{
    AnalysisRun, ChartSeries, ExpiryAlert, HistoricalObservation, ProductRow, RawProductRow,
    Recommendation, RowWarning, StatusSummary,
};

pub struct AnalysisOrchestrator<'a> {
    history: &'a dyn HistoryStore,
    windows: ExpiryWindows,
}

impl<'a> AnalysisOrchestrator<'a> {
    pub fn new(history: &'a dyn HistoryStore, windows: ExpiryWindows) -> Self {
        Self { history, windows }
    }

    /// Analyze one batch. Only a failure to persist history is an error.
    pub fn run(
        &self,
        rows: &[RawProductRow],
        source_filename: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AnalysisRun, StoreError> {
        let estimator = IdealStockEstimator::for_batch(self.history);
        if estimator.is_first_upload() {
            tracing::info!("No stock history yet, estimating ideal levels from product names");
        }

        let mut recommendations = Vec::with_capacity(rows.len());
        let mut expiry_alerts = Vec::new();
        let mut warnings = Vec::new();
        let mut observations = Vec::with_capacity(rows.len());
        let mut seen: HashSet<String> = HashSet::new();

        for (index, raw) in rows.iter().enumerate() {
            let row_number = index + 1;

            let product = match ProductRow::try_from(raw) {
                Ok(product) => product,
                Err(err) => {
                    skip_row(&mut warnings, row_number, raw, &err);
                    continue;
                }
            };

            if !seen.insert(product.product_id.clone()) {
                let err = RowError::DuplicateProduct(product.product_id.clone());
                skip_row(&mut warnings, row_number, raw, &err);
                continue;
            }

            let estimate = match estimator.estimate(&product) {
                Ok(estimate) => estimate,
                Err(err) => {
                    skip_row(&mut warnings, row_number, raw, &err);
                    continue;
                }
            };

            let expiration = product
                .expiration_date
                .as_deref()
                .and_then(|raw_date| {
                    let result = evaluate_raw(raw_date, today, &self.windows);
                    if result.is_none() {
                        tracing::warn!(
                            row = row_number,
                            product_id = %product.product_id,
                            value = raw_date,
                            "Unrecognized expiration date, ignoring it"
                        );
                        warnings.push(RowWarning {
                            row: row_number,
                            product_id: Some(product.product_id.clone()),
                            message: format!("unrecognized expiration date '{}'", raw_date),
                            processed: true,
                        });
                    }
                    result
                });

            let classification = classify(product.current_stock, estimate.ideal_stock);

            if let Some(result) = expiration.as_ref().filter(|result| result.is_alert()) {
                expiry_alerts.push(ExpiryAlert {
                    product_id: product.product_id.clone(),
                    product_name: product.product_name.clone(),
                    current_stock: product.current_stock,
                    expiration_date: result.expiration_date,
                    days_left: result.days_left,
                    urgency: result.urgency,
                });
            }

            observations.push(HistoricalObservation {
                product_id: product.product_id.clone(),
                current_stock: product.current_stock,
                observed_at: now,
            });

            recommendations.push(Recommendation {
                days_of_stock: days_of_stock(product.current_stock, estimate.ideal_stock),
                product_id: product.product_id,
                product_name: product.product_name,
                current_stock: product.current_stock,
                ideal_stock_level: estimate.ideal_stock,
                ideal_stock_source: estimate.source,
                trend: estimate.trend,
                status: classification.status,
                priority: classification.priority,
                action: classification.action,
                order_quantity: classification.order_quantity,
                stock_ratio: classification.stock_ratio,
                expiration,
            });
        }

        self.history.append_all(observations)?;

        let summary = StatusSummary::tally(&recommendations, &expiry_alerts);
        let chart = ChartSeries::from_recommendations(&recommendations);

        tracing::info!(
            source = source_filename,
            processed = recommendations.len(),
            warnings = warnings.len(),
            expiry_alerts = expiry_alerts.len(),
            "Analysis complete"
        );

        Ok(AnalysisRun {
            id: AnalysisRun::id_for(now),
            source_filename: source_filename.to_string(),
            created_at: now,
            recommendations,
            expiry_alerts,
            summary,
            warnings,
            chart,
        })
    }
}

fn skip_row(warnings: &mut Vec<RowWarning>, row: usize, raw: &RawProductRow, err: &RowError) {
    let product_id = Some(raw.product_id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    tracing::warn!(row, product_id = ?product_id, error = %err, "Skipping row");
    warnings.push(RowWarning {
        row,
        product_id,
        message: err.to_string(),
        processed: false,
    });
}
