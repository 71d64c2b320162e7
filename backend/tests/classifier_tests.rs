//! Stock classification tests
//!
//! - Band boundaries at 0.3, 0.7, 1.3 and 2.0 are exact
//! - Order quantities round towards what the store can act on
//! - Every ratio falls in exactly one band

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::classifier::{
    classify, days_of_stock, status_for_ratio, stock_ratio, CRITICAL_OVERSTOCK_RATIO,
    CRITICAL_UNDERSTOCK_RATIO, OVERSTOCK_RATIO, UNDERSTOCK_RATIO,
};
use shared::models::{Priority, StockStatus};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_reference_scenarios() {
        let under = classify(dec("10"), dec("100"));
        assert_eq!(under.status, StockStatus::CriticalUnderstock);
        assert_eq!(under.order_quantity, 90);

        let over = classify(dec("150"), dec("100"));
        assert_eq!(over.status, StockStatus::Overstock);
        assert_eq!(over.order_quantity, 50);
    }

    #[test]
    fn test_priorities() {
        let cases = [
            ("20", StockStatus::CriticalUnderstock, Priority::Critical),
            ("50", StockStatus::Understock, Priority::High),
            ("100", StockStatus::Optimal, Priority::Low),
            ("180", StockStatus::Overstock, Priority::Medium),
            ("250", StockStatus::CriticalOverstock, Priority::Critical),
        ];
        for (current, status, priority) in cases {
            let result = classify(dec(current), dec("100"));
            assert_eq!(result.status, status, "current {}", current);
            assert_eq!(result.priority, priority, "current {}", current);
        }
    }

    #[test]
    fn test_exact_boundaries_from_stock_values() {
        assert_eq!(classify(dec("30"), dec("100")).status, StockStatus::Understock);
        assert_eq!(classify(dec("70"), dec("100")).status, StockStatus::Optimal);
        assert_eq!(classify(dec("130"), dec("100")).status, StockStatus::Optimal);
        assert_eq!(classify(dec("200"), dec("100")).status, StockStatus::Overstock);
        // 1/3 is not representable exactly, it must still land below 0.7
        assert_eq!(classify(dec("1"), dec("3")).status, StockStatus::Understock);
    }

    #[test]
    fn test_ratio_with_zero_ideal() {
        assert_eq!(stock_ratio(dec("50"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_action_mentions_quantity() {
        let result = classify(dec("40"), dec("100"));
        assert!(result.action.contains("60"));
        assert_eq!(classify(dec("100"), dec("100")).action, "OPTIMAL: no action needed");
    }

    #[test]
    fn test_days_of_stock_cap() {
        assert_eq!(days_of_stock(dec("10"), dec("60")), dec("5"));
        assert_eq!(days_of_stock(dec("100000"), dec("1")), dec("999"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Ratios from 0.0000 to 5.0000
    fn ratio_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=50_000i64).prop_map(|n| Decimal::new(n, 4))
    }

    /// Stock levels from 0.0 to 1000.0
    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Each ratio maps to the single band whose interval contains it
        #[test]
        fn prop_bands_partition_ratio_domain(ratio in ratio_strategy()) {
            let expected = if ratio < CRITICAL_UNDERSTOCK_RATIO {
                StockStatus::CriticalUnderstock
            } else if ratio < UNDERSTOCK_RATIO {
                StockStatus::Understock
            } else if ratio <= OVERSTOCK_RATIO {
                StockStatus::Optimal
            } else if ratio <= CRITICAL_OVERSTOCK_RATIO {
                StockStatus::Overstock
            } else {
                StockStatus::CriticalOverstock
            };
            prop_assert_eq!(status_for_ratio(ratio), expected);
        }

        /// Bands are ordered: a larger ratio never yields a lower band
        #[test]
        fn prop_bands_are_monotonic(a in ratio_strategy(), b in ratio_strategy()) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(status_for_ratio(low) <= status_for_ratio(high));
        }

        /// Under-stock orders cover the gap, over-stock reductions never exceed it
        #[test]
        fn prop_order_quantity_bounds(current in stock_strategy(), ideal in (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 1))) {
            let result = classify(current, ideal);
            let quantity = Decimal::from(result.order_quantity);
            match result.status {
                StockStatus::CriticalUnderstock | StockStatus::Understock => {
                    prop_assert!(current + quantity >= ideal);
                    prop_assert!(current + quantity < ideal + Decimal::ONE);
                }
                StockStatus::Overstock | StockStatus::CriticalOverstock => {
                    prop_assert!(current - quantity >= ideal);
                }
                StockStatus::Optimal => prop_assert_eq!(result.order_quantity, 0),
            }
        }
    }
}
