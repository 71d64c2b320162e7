//! Ideal stock estimation
//!
//! When an upload does not carry `ideal_stock_level`, the ideal level is
//! estimated in one of two ways:
//!
//! - **keyword policy**: the product name is matched against
//!   [`CATEGORY_RULES`] and the current stock is multiplied by the category
//!   multiplier. Used for the very first upload and for products that have
//!   never been observed.
//! - **history policy**: the average of the product's past observations is
//!   multiplied by a factor chosen from its trend (recent 3 vs the rest).
//!
//! Whether a batch is a "first upload" is decided once from a snapshot taken
//! before the batch, so observations appended while the batch runs never
//! change which policy a row gets.

use rust_decimal::Decimal;

use crate::error::RowError;
use crate::history::{HistorySnapshot, HistoryStore};
use crate::models::{IdealStockEstimate, IdealStockSource, ProductCategory, ProductRow, Trend};

/// Category table entry: keyword list and multiplier
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: ProductCategory,
    pub keywords: &'static [&'static str],
    pub multiplier: Decimal,
}

/// Categories in match order; the first rule with a matching keyword wins
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ProductCategory::PerishableDairy,
        keywords: &["milk", "yogurt", "yoghurt", "cheese", "butter", "cream", "egg", "kefir"],
        multiplier: Decimal::from_parts(20, 0, 0, false, 1),
    },
    CategoryRule {
        category: ProductCategory::PantryStaple,
        keywords: &[
            "rice", "flour", "sugar", "oil", "pasta", "noodle", "salt", "bean", "lentil", "cereal",
            "oats", "coffee", "tea", "canned", "honey",
        ],
        multiplier: Decimal::from_parts(18, 0, 0, false, 1),
    },
    CategoryRule {
        category: ProductCategory::FreshPerishable,
        keywords: &[
            "bread", "fruit", "vegetable", "salad", "juice", "meat", "chicken", "beef", "pork",
            "fish", "salmon", "banana", "apple", "orange", "lettuce", "tomato",
        ],
        multiplier: Decimal::from_parts(13, 0, 0, false, 1),
    },
];

/// Multiplier for products no rule matches
pub const GENERIC_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Number of most recent observations compared against the older ones
pub const RECENT_WINDOW: usize = 3;

const GROWTH_THRESHOLD: Decimal = Decimal::from_parts(11, 0, 0, false, 1);
const DECLINE_THRESHOLD: Decimal = Decimal::from_parts(9, 0, 0, false, 1);
const GROWING_MULTIPLIER: Decimal = Decimal::from_parts(14, 0, 0, false, 1);
const DECLINING_MULTIPLIER: Decimal = Decimal::from_parts(11, 0, 0, false, 1);
const STABLE_MULTIPLIER: Decimal = Decimal::from_parts(12, 0, 0, false, 1);

/// Guess a category from a product name (case-insensitive substring match)
pub fn categorize(product_name: &str) -> ProductCategory {
    let name = product_name.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|rule| rule.category)
        .unwrap_or(ProductCategory::Generic)
}

pub fn multiplier_for(category: ProductCategory) -> Decimal {
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.category == category)
        .map(|rule| rule.multiplier)
        .unwrap_or(GENERIC_MULTIPLIER)
}

fn out_of_range(value: Decimal) -> RowError {
    RowError::OutOfRange {
        field: "ideal_stock_level",
        value,
    }
}

/// Keyword policy estimate
pub fn keyword_estimate(product_name: &str, current_stock: Decimal) -> Result<IdealStockEstimate, RowError> {
    let category = categorize(product_name);
    let ideal_stock = current_stock
        .checked_mul(multiplier_for(category))
        .ok_or_else(|| out_of_range(current_stock))?;
    Ok(IdealStockEstimate {
        ideal_stock: ideal_stock.round_dp(2),
        source: IdealStockSource::Keyword { category },
        trend: Trend::NewProduct,
    })
}

/// Mean of the values; `None` when empty or when the sum overflows
fn average(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value))?;
    sum.checked_div(Decimal::from(values.len()))
}

/// Trend of a product's stock values (oldest first)
///
/// With no more than [`RECENT_WINDOW`] values there is nothing older to
/// compare against and the trend is stable.
pub fn trend_for(stocks: &[Decimal]) -> Trend {
    if stocks.is_empty() {
        return Trend::NewProduct;
    }
    if stocks.len() <= RECENT_WINDOW {
        return Trend::Stable;
    }

    let split = stocks.len() - RECENT_WINDOW;
    let (older, recent) = stocks.split_at(split);
    let (Some(older_avg), Some(recent_avg)) = (average(older), average(recent)) else {
        return Trend::Stable;
    };

    let above = |threshold: Decimal| {
        older_avg
            .checked_mul(threshold)
            .is_some_and(|limit| recent_avg > limit)
    };
    let below = |threshold: Decimal| {
        older_avg
            .checked_mul(threshold)
            .map_or(true, |limit| recent_avg < limit)
    };

    if above(GROWTH_THRESHOLD) {
        Trend::Growing
    } else if below(DECLINE_THRESHOLD) {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// History policy estimate; `Ok(None)` when the product has no observations
pub fn historical_estimate(stocks: &[Decimal]) -> Result<Option<IdealStockEstimate>, RowError> {
    if stocks.is_empty() {
        return Ok(None);
    }
    let overflow = || out_of_range(stocks.iter().copied().max().unwrap_or_default());
    let avg = average(stocks).ok_or_else(overflow)?;
    let trend = trend_for(stocks);
    let multiplier = match trend {
        Trend::Growing => GROWING_MULTIPLIER,
        Trend::Declining => DECLINING_MULTIPLIER,
        Trend::Stable | Trend::NewProduct => STABLE_MULTIPLIER,
    };
    let ideal_stock = avg.checked_mul(multiplier).ok_or_else(overflow)?;

    Ok(Some(IdealStockEstimate {
        ideal_stock: ideal_stock.round_dp(2),
        source: IdealStockSource::History {
            observations: stocks.len(),
        },
        trend,
    }))
}

/// Per-batch estimator bound to a pre-batch history snapshot
#[derive(Debug, Clone)]
pub struct IdealStockEstimator {
    snapshot: HistorySnapshot,
}

impl IdealStockEstimator {
    /// Snapshot the store; call once before processing a batch
    pub fn for_batch(store: &dyn HistoryStore) -> Self {
        Self::from_snapshot(store.snapshot())
    }

    pub fn from_snapshot(snapshot: HistorySnapshot) -> Self {
        Self { snapshot }
    }

    /// True when the store held no observations before this batch
    pub fn is_first_upload(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Ideal stock for a row: supplied value, history estimate, or keyword estimate
    ///
    /// Fails only when the estimate does not fit in a `Decimal`.
    pub fn estimate(&self, row: &ProductRow) -> Result<IdealStockEstimate, RowError> {
        let stocks = if self.is_first_upload() {
            Vec::new()
        } else {
            self.snapshot.stocks_for(&row.product_id)
        };

        if let Some(ideal_stock) = row.ideal_stock_level {
            return Ok(IdealStockEstimate {
                ideal_stock,
                source: IdealStockSource::Supplied,
                trend: trend_for(&stocks),
            });
        }

        match historical_estimate(&stocks)? {
            Some(estimate) => Ok(estimate),
            None => keyword_estimate(&row.product_name, row.current_stock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use crate::models::HistoricalObservation;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(id: &str, name: &str, stock: &str, ideal: Option<&str>) -> ProductRow {
        ProductRow {
            product_id: id.to_string(),
            product_name: name.to_string(),
            current_stock: dec(stock),
            ideal_stock_level: ideal.map(dec),
            expiration_date: None,
        }
    }

    fn observe(store: &MemoryHistoryStore, id: &str, stocks: &[&str]) {
        for stock in stocks {
            store
                .append(HistoricalObservation {
                    product_id: id.to_string(),
                    current_stock: dec(stock),
                    observed_at: Utc::now(),
                })
                .unwrap();
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("Fresh MILK 1L"), ProductCategory::PerishableDairy);
        assert_eq!(categorize("Organic Rice 5kg"), ProductCategory::PantryStaple);
        assert_eq!(categorize("Whole Wheat Bread"), ProductCategory::FreshPerishable);
        assert_eq!(categorize("USB Cable"), ProductCategory::Generic);
    }

    #[test]
    fn test_keyword_multipliers() {
        assert_eq!(keyword_estimate("Greek Yogurt", dec("10")).unwrap().ideal_stock, dec("20"));
        assert_eq!(keyword_estimate("Olive Oil 1L", dec("10")).unwrap().ideal_stock, dec("18"));
        assert_eq!(keyword_estimate("Salmon Fillet", dec("10")).unwrap().ideal_stock, dec("13"));
        assert_eq!(keyword_estimate("Batteries AA", dec("10")).unwrap().ideal_stock, dec("15"));
    }

    #[test]
    fn test_first_upload_uses_keyword_policy() {
        let store = MemoryHistoryStore::new();
        let estimator = IdealStockEstimator::for_batch(&store);
        assert!(estimator.is_first_upload());

        let estimate = estimator.estimate(&row("P100", "Cheddar Cheese", "25", None)).unwrap();
        assert_eq!(estimate.trend, Trend::NewProduct);
        assert_eq!(
            estimate.source,
            IdealStockSource::Keyword {
                category: ProductCategory::PerishableDairy
            }
        );
        assert_eq!(estimate.ideal_stock, dec("50"));
    }

    #[test]
    fn test_unknown_product_with_history_falls_back_to_keywords() {
        let store = MemoryHistoryStore::new();
        observe(&store, "P001", &["10", "12"]);
        let estimator = IdealStockEstimator::for_batch(&store);

        let estimate = estimator.estimate(&row("P999", "Brown Sugar", "10", None)).unwrap();
        assert_eq!(estimate.trend, Trend::NewProduct);
        assert_eq!(estimate.ideal_stock, dec("18"));
    }

    #[test]
    fn test_growing_trend() {
        let stocks = [dec("10"), dec("10"), dec("20"), dec("20"), dec("20")];
        assert_eq!(trend_for(&stocks), Trend::Growing);
        let estimate = historical_estimate(&stocks).unwrap().unwrap();
        // avg 16 * 1.4
        assert_eq!(estimate.ideal_stock, dec("22.4"));
        assert_eq!(estimate.source, IdealStockSource::History { observations: 5 });
    }

    #[test]
    fn test_declining_trend() {
        let stocks = [dec("40"), dec("40"), dec("10"), dec("10"), dec("10")];
        assert_eq!(trend_for(&stocks), Trend::Declining);
        // avg 22 * 1.1
        assert_eq!(historical_estimate(&stocks).unwrap().unwrap().ideal_stock, dec("24.2"));
    }

    #[test]
    fn test_stable_trend() {
        let stocks = [dec("20"), dec("21"), dec("20"), dec("19")];
        assert_eq!(trend_for(&stocks), Trend::Stable);
        // avg 20 * 1.2
        assert_eq!(historical_estimate(&stocks).unwrap().unwrap().ideal_stock, dec("24"));
    }

    #[test]
    fn test_overflowing_estimates_are_errors() {
        let err = keyword_estimate("Milk", Decimal::MAX).unwrap_err();
        assert!(matches!(err, RowError::OutOfRange { field: "ideal_stock_level", .. }));

        let stocks = [Decimal::MAX, Decimal::MAX];
        assert!(historical_estimate(&stocks).is_err());
        assert_eq!(historical_estimate(&[]).unwrap(), None);
    }

    #[test]
    fn test_trend_survives_huge_values() {
        let stocks = [Decimal::MAX, dec("1"), dec("1"), dec("1")];
        assert_eq!(trend_for(&stocks), Trend::Declining);
    }

    #[test]
    fn test_short_history_is_stable() {
        assert_eq!(trend_for(&[dec("5"), dec("50")]), Trend::Stable);
    }

    #[test]
    fn test_supplied_ideal_is_kept() {
        let store = MemoryHistoryStore::new();
        let estimator = IdealStockEstimator::for_batch(&store);
        let estimate = estimator.estimate(&row("P1", "Milk", "10", Some("80"))).unwrap();
        assert_eq!(estimate.ideal_stock, dec("80"));
        assert_eq!(estimate.source, IdealStockSource::Supplied);
    }

    #[test]
    fn test_snapshot_ignores_mid_batch_writes() {
        let store = MemoryHistoryStore::new();
        let estimator = IdealStockEstimator::for_batch(&store);
        observe(&store, "P1", &["10", "10", "10", "10"]);

        assert!(estimator.is_first_upload());
        let estimate = estimator.estimate(&row("P1", "Milk", "10", None)).unwrap();
        assert_eq!(estimate.trend, Trend::NewProduct);
    }
}
