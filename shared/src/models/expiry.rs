//! Expiration evaluation models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Remaining shelf life as shown to users
///
/// Serialized as an integer for future dates and as the labels
/// `"Expired"` / `"Expires Today"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "DaysLeftRepr", try_from = "DaysLeftRepr")]
pub enum DaysLeft {
    Expired,
    ExpiresToday,
    Days(u32),
}

const EXPIRED_LABEL: &str = "Expired";
const EXPIRES_TODAY_LABEL: &str = "Expires Today";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DaysLeftRepr {
    Days(u32),
    Label(String),
}

impl From<DaysLeft> for DaysLeftRepr {
    fn from(value: DaysLeft) -> Self {
        match value {
            DaysLeft::Expired => DaysLeftRepr::Label(EXPIRED_LABEL.to_string()),
            DaysLeft::ExpiresToday => DaysLeftRepr::Label(EXPIRES_TODAY_LABEL.to_string()),
            DaysLeft::Days(days) => DaysLeftRepr::Days(days),
        }
    }
}

impl TryFrom<DaysLeftRepr> for DaysLeft {
    type Error = String;

    fn try_from(value: DaysLeftRepr) -> Result<Self, Self::Error> {
        match value {
            DaysLeftRepr::Days(days) => Ok(DaysLeft::Days(days)),
            DaysLeftRepr::Label(label) if label == EXPIRED_LABEL => Ok(DaysLeft::Expired),
            DaysLeftRepr::Label(label) if label == EXPIRES_TODAY_LABEL => Ok(DaysLeft::ExpiresToday),
            DaysLeftRepr::Label(label) => match label.parse::<u32>() {
                Ok(days) => Ok(DaysLeft::Days(days)),
                Err(_) => Err(format!("unknown days_left value '{}'", label)),
            },
        }
    }
}

impl std::fmt::Display for DaysLeft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaysLeft::Expired => f.write_str(EXPIRED_LABEL),
            DaysLeft::ExpiresToday => f.write_str(EXPIRES_TODAY_LABEL),
            DaysLeft::Days(days) => write!(f, "{}", days),
        }
    }
}

/// Expiry bucket used for alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryUrgency {
    Expired,
    ExpiresToday,
    /// Within the urgent window (7 days by default)
    Urgent,
    /// Within the alert window (30 days by default)
    ThisMonth,
    /// Beyond the alert window
    Later,
}

/// Result of evaluating one expiration date against today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationResult {
    /// Always serialized as YYYY-MM-DD regardless of the input format
    pub expiration_date: NaiveDate,
    pub days_left: DaysLeft,
    pub urgency: ExpiryUrgency,
}

impl ExpirationResult {
    /// Whether the product belongs in the run's expiry alerts
    pub fn is_alert(&self) -> bool {
        self.urgency != ExpiryUrgency::Later
    }

    pub fn is_urgent(&self) -> bool {
        matches!(
            self.urgency,
            ExpiryUrgency::Expired | ExpiryUrgency::ExpiresToday | ExpiryUrgency::Urgent
        )
    }
}

/// A product listed in a run's expiry alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryAlert {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: Decimal,
    pub expiration_date: NaiveDate,
    pub days_left: DaysLeft,
    pub urgency: ExpiryUrgency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_left_serialization() {
        assert_eq!(serde_json::to_string(&DaysLeft::Expired).unwrap(), "\"Expired\"");
        assert_eq!(
            serde_json::to_string(&DaysLeft::ExpiresToday).unwrap(),
            "\"Expires Today\""
        );
        assert_eq!(serde_json::to_string(&DaysLeft::Days(12)).unwrap(), "12");
    }

    #[test]
    fn test_days_left_deserialization() {
        let parsed: DaysLeft = serde_json::from_str("\"Expires Today\"").unwrap();
        assert_eq!(parsed, DaysLeft::ExpiresToday);
        let parsed: DaysLeft = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(parsed, DaysLeft::Days(5));
        assert!(serde_json::from_str::<DaysLeft>("\"soon\"").is_err());
    }

    #[test]
    fn test_expiration_date_serializes_iso() {
        let result = ExpirationResult {
            expiration_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            days_left: DaysLeft::Days(3),
            urgency: ExpiryUrgency::Urgent,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["expiration_date"], "2025-12-31");
        assert_eq!(json["urgency"], "urgent");
    }
}
