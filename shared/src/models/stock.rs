//! Stock level classification models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock status band derived from the stock ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    CriticalUnderstock,
    Understock,
    Optimal,
    Overstock,
    CriticalOverstock,
}

impl StockStatus {
    pub const ALL: [StockStatus; 5] = [
        StockStatus::CriticalUnderstock,
        StockStatus::Understock,
        StockStatus::Optimal,
        StockStatus::Overstock,
        StockStatus::CriticalOverstock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::CriticalUnderstock => "critical_understock",
            StockStatus::Understock => "understock",
            StockStatus::Optimal => "optimal",
            StockStatus::Overstock => "overstock",
            StockStatus::CriticalOverstock => "critical_overstock",
        }
    }

    /// Anything other than optimal needs someone to act
    pub fn is_actionable(&self) -> bool {
        !matches!(self, StockStatus::Optimal)
    }

    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StockStatus::CriticalUnderstock | StockStatus::CriticalOverstock
        )
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency attached to a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "CRITICAL"),
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::Low => write!(f, "LOW"),
        }
    }
}

/// Output of the row classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: StockStatus,
    pub priority: Priority,
    pub action: String,
    /// Units to order (under-stock) or to reduce (over-stock); 0 when optimal
    pub order_quantity: u64,
    pub stock_ratio: Decimal,
}
