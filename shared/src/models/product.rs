//! Uploaded product rows

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RowError;

/// A product row exactly as the tabular reader delivered it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProductRow {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: String,
    pub ideal_stock_level: Option<String>,
    /// Value of the first expiry alias column that is non-empty for this row
    pub expiration_date: Option<String>,
    /// The record was not valid UTF-8; fields hold a lossy decoding
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub undecodable: bool,
}

/// A product row with numeric fields checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: Decimal,
    /// Absent when the ideal level has to be estimated
    pub ideal_stock_level: Option<Decimal>,
    pub expiration_date: Option<String>,
}

impl TryFrom<&RawProductRow> for ProductRow {
    type Error = RowError;

    fn try_from(raw: &RawProductRow) -> Result<Self, Self::Error> {
        if raw.undecodable {
            return Err(RowError::InvalidEncoding);
        }
        let product_id = raw.product_id.trim();
        if product_id.is_empty() {
            return Err(RowError::MissingProductId);
        }

        let current_stock = parse_quantity("current_stock", &raw.current_stock)?;
        let ideal_stock_level = match raw.ideal_stock_level.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(parse_quantity("ideal_stock_level", value)?),
            _ => None,
        };
        let expiration_date = raw
            .expiration_date
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self {
            product_id: product_id.to_string(),
            product_name: raw.product_name.trim().to_string(),
            current_stock,
            ideal_stock_level,
            expiration_date,
        })
    }
}

/// Largest accepted stock quantity (10^15 units); keeps estimate arithmetic in range
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Parse a non-negative stock quantity ("12", "12.5", "1e3")
pub fn parse_quantity(field: &'static str, raw: &str) -> Result<Decimal, RowError> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| RowError::NotNumeric {
            field,
            value: trimmed.to_string(),
        })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(RowError::Negative { field, value });
    }
    if value > MAX_QUANTITY {
        return Err(RowError::OutOfRange { field, value });
    }
    Ok(value.normalize())
}
