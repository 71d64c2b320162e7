//! Ideal stock estimation models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One stock snapshot kept for trend detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalObservation {
    pub product_id: String,
    pub current_stock: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// Direction of a product's recent stock levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Growing,
    Declining,
    Stable,
    #[serde(rename = "New Product")]
    NewProduct,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Growing => write!(f, "Growing"),
            Trend::Declining => write!(f, "Declining"),
            Trend::Stable => write!(f, "Stable"),
            Trend::NewProduct => write!(f, "New Product"),
        }
    }
}

/// Product category guessed from the product name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    PerishableDairy,
    PantryStaple,
    FreshPerishable,
    Generic,
}

/// Where an ideal stock level came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IdealStockSource {
    /// Taken from the ideal_stock_level column
    Supplied,
    /// Current stock times the category multiplier
    Keyword { category: ProductCategory },
    /// Average of past observations times the trend multiplier
    History { observations: usize },
}

/// Estimator output for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdealStockEstimate {
    pub ideal_stock: Decimal,
    pub source: IdealStockSource,
    pub trend: Trend,
}
