//! Analysis run models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    ExpirationResult, ExpiryAlert, ExpiryUrgency, IdealStockSource, Priority, StockStatus, Trend,
};

/// Per-product analysis result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: Decimal,
    pub ideal_stock_level: Decimal,
    pub ideal_stock_source: IdealStockSource,
    pub trend: Trend,
    pub status: StockStatus,
    pub priority: Priority,
    pub action: String,
    pub order_quantity: u64,
    pub stock_ratio: Decimal,
    /// Days the current stock lasts at ideal/30 units per day, capped at 999
    pub days_of_stock: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<ExpirationResult>,
}

/// Counts by status across a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total_products: usize,
    pub critical_understock: usize,
    pub understock: usize,
    pub optimal: usize,
    pub overstock: usize,
    pub critical_overstock: usize,
    /// Expiry alerts that are not yet expired
    pub expiring: usize,
    pub expired: usize,
}

impl StatusSummary {
    /// Tally a summary from recommendations and expiry alerts
    pub fn tally(recommendations: &[Recommendation], expiry_alerts: &[ExpiryAlert]) -> Self {
        let mut summary = StatusSummary {
            total_products: recommendations.len(),
            ..Default::default()
        };

        for rec in recommendations {
            match rec.status {
                StockStatus::CriticalUnderstock => summary.critical_understock += 1,
                StockStatus::Understock => summary.understock += 1,
                StockStatus::Optimal => summary.optimal += 1,
                StockStatus::Overstock => summary.overstock += 1,
                StockStatus::CriticalOverstock => summary.critical_overstock += 1,
            }
        }

        for alert in expiry_alerts {
            if alert.urgency == ExpiryUrgency::Expired {
                summary.expired += 1;
            } else {
                summary.expiring += 1;
            }
        }

        summary
    }

    pub fn count(&self, status: StockStatus) -> usize {
        match status {
            StockStatus::CriticalUnderstock => self.critical_understock,
            StockStatus::Understock => self.understock,
            StockStatus::Optimal => self.optimal,
            StockStatus::Overstock => self.overstock,
            StockStatus::CriticalOverstock => self.critical_overstock,
        }
    }

    pub fn critical(&self) -> usize {
        self.critical_understock + self.critical_overstock
    }

    /// Label/value pairs for report and email summary blocks
    pub fn statistics(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Total Products", self.total_products),
            ("Critical Items", self.critical()),
            ("Understock Items", self.understock),
            ("Overstock Items", self.overstock),
            ("Optimal Items", self.optimal),
            ("Expiring Items", self.expiring),
            ("Expired Items", self.expired),
        ]
    }
}

/// A problem found on one input row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    /// 1-based data row number (header excluded)
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub message: String,
    /// False when the row was dropped from the results
    pub processed: bool,
}

/// One bar pair of the current vs ideal chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub current_stock: Decimal,
    pub ideal_stock: Decimal,
}

/// Data needed to draw the current vs ideal stock chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub title: String,
    pub points: Vec<ChartPoint>,
}

/// Maximum label length used on chart bars
pub const CHART_LABEL_LEN: usize = 15;

impl ChartSeries {
    pub fn from_recommendations(recommendations: &[Recommendation]) -> Self {
        Self {
            title: "Current vs Ideal Stock Levels".to_string(),
            points: recommendations
                .iter()
                .map(|rec| ChartPoint {
                    label: rec.product_name.chars().take(CHART_LABEL_LEN).collect(),
                    current_stock: rec.current_stock,
                    ideal_stock: rec.ideal_stock_level,
                })
                .collect(),
        }
    }
}

/// Final state reported for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Completed,
    CompletedWithWarnings,
    Failed,
}

/// One complete analysis of an uploaded dataset; immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRun {
    /// Generation timestamp, also the archive key
    pub id: String,
    pub source_filename: String,
    pub created_at: DateTime<Utc>,
    pub recommendations: Vec<Recommendation>,
    pub expiry_alerts: Vec<ExpiryAlert>,
    pub summary: StatusSummary,
    pub warnings: Vec<RowWarning>,
    pub chart: ChartSeries,
}

/// Timestamp layout of run identifiers; sorts chronologically as text
pub const RUN_ID_FORMAT: &str = "%Y%m%dT%H%M%S%6f";

impl AnalysisRun {
    pub fn id_for(created_at: DateTime<Utc>) -> String {
        created_at.format(RUN_ID_FORMAT).to_string()
    }

    pub fn state(&self) -> RunState {
        if self.recommendations.is_empty() && !self.warnings.is_empty() {
            RunState::Failed
        } else if self.warnings.is_empty() {
            RunState::Completed
        } else {
            RunState::CompletedWithWarnings
        }
    }

    /// Recommendations that need ordering or reducing
    pub fn actionable(&self) -> impl Iterator<Item = &Recommendation> {
        self.recommendations.iter().filter(|rec| rec.status.is_actionable())
    }
}
