//! Stock ratio classification
//!
//! A single threshold policy is used:
//!
//! | ratio            | status              | priority |
//! |------------------|---------------------|----------|
//! | `< 0.3`          | critical understock | CRITICAL |
//! | `0.3 ..< 0.7`    | understock          | HIGH     |
//! | `0.7 ..= 1.3`    | optimal             | LOW      |
//! | `> 1.3 ..= 2.0`  | overstock           | MEDIUM   |
//! | `> 2.0`          | critical overstock  | CRITICAL |
//!
//! Ratios are computed with `Decimal` so the boundaries are exact.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{Classification, Priority, StockStatus};

/// Below this ratio stock is critically low
pub const CRITICAL_UNDERSTOCK_RATIO: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
/// Below this ratio stock is low
pub const UNDERSTOCK_RATIO: Decimal = Decimal::from_parts(7, 0, 0, false, 1);
/// Above this ratio stock is high
pub const OVERSTOCK_RATIO: Decimal = Decimal::from_parts(13, 0, 0, false, 1);
/// Above this ratio stock is critically high
pub const CRITICAL_OVERSTOCK_RATIO: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Days-of-stock estimates are capped here
pub const MAX_DAYS_OF_STOCK: Decimal = Decimal::from_parts(999, 0, 0, false, 0);
const DAYS_PER_MONTH: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// current / ideal, defined as 0 when the ideal level is 0
pub fn stock_ratio(current_stock: Decimal, ideal_stock: Decimal) -> Decimal {
    if ideal_stock <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    current_stock
        .checked_div(ideal_stock)
        .unwrap_or(Decimal::MAX)
}

/// Map a ratio onto its status band
pub fn status_for_ratio(ratio: Decimal) -> StockStatus {
    if ratio < CRITICAL_UNDERSTOCK_RATIO {
        StockStatus::CriticalUnderstock
    } else if ratio < UNDERSTOCK_RATIO {
        StockStatus::Understock
    } else if ratio <= OVERSTOCK_RATIO {
        StockStatus::Optimal
    } else if ratio <= CRITICAL_OVERSTOCK_RATIO {
        StockStatus::Overstock
    } else {
        StockStatus::CriticalOverstock
    }
}

pub fn priority_for(status: StockStatus) -> Priority {
    match status {
        StockStatus::CriticalUnderstock | StockStatus::CriticalOverstock => Priority::Critical,
        StockStatus::Understock => Priority::High,
        StockStatus::Overstock => Priority::Medium,
        StockStatus::Optimal => Priority::Low,
    }
}

/// Classify one product's stock level
pub fn classify(current_stock: Decimal, ideal_stock: Decimal) -> Classification {
    let ratio = stock_ratio(current_stock, ideal_stock);
    let status = status_for_ratio(ratio);

    let order_quantity = match status {
        StockStatus::CriticalUnderstock | StockStatus::Understock => {
            whole_units((ideal_stock - current_stock).ceil())
        }
        StockStatus::Overstock | StockStatus::CriticalOverstock => {
            whole_units((current_stock - ideal_stock).floor())
        }
        StockStatus::Optimal => 0,
    };

    let action = match status {
        StockStatus::CriticalUnderstock => {
            format!("URGENT RESTOCK: order {} units now", order_quantity)
        }
        StockStatus::Understock => format!("RESTOCK: reorder {} units soon", order_quantity),
        StockStatus::Optimal => "OPTIMAL: no action needed".to_string(),
        StockStatus::Overstock => format!("OVERSTOCKED: reduce stock by {} units", order_quantity),
        StockStatus::CriticalOverstock => format!(
            "CRITICAL OVERSTOCK: reduce stock by {} units immediately",
            order_quantity
        ),
    };

    Classification {
        status,
        priority: priority_for(status),
        action,
        order_quantity,
        stock_ratio: ratio.round_dp(4),
    }
}

/// How many days current stock lasts when a month consumes the ideal level
pub fn days_of_stock(current_stock: Decimal, ideal_stock: Decimal) -> Decimal {
    let daily_demand = if ideal_stock > Decimal::ZERO {
        ideal_stock / DAYS_PER_MONTH
    } else {
        Decimal::ONE
    };

    current_stock
        .checked_div(daily_demand)
        .unwrap_or(MAX_DAYS_OF_STOCK)
        .min(MAX_DAYS_OF_STOCK)
        .round_dp(1)
}

fn whole_units(value: Decimal) -> u64 {
    if value <= Decimal::ZERO {
        0
    } else {
        value.to_u64().unwrap_or(u64::MAX)
    }
}
