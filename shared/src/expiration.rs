//! Expiration date parsing and evaluation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DaysLeft, ExpirationResult, ExpiryUrgency};

/// Accepted date layouts, tried in this order; the first successful parse wins
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y"];

/// Canonical output layout
pub const NORMALIZED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Day windows that decide which expiration dates raise alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryWindows {
    /// Alerts within this many days are tagged urgent
    pub urgent_days: u32,
    /// Products expiring within this many days are alerted
    pub alert_days: u32,
}

impl Default for ExpiryWindows {
    fn default() -> Self {
        Self {
            urgent_days: 7,
            alert_days: 30,
        }
    }
}

/// Parse an expiration date; `None` means "no expiration data"
pub fn parse_expiration_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Re-serialize any accepted date as YYYY-MM-DD
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_expiration_date(raw).map(|date| date.format(NORMALIZED_DATE_FORMAT).to_string())
}

/// Evaluate a parsed expiration date against `today`
pub fn evaluate(expiration_date: NaiveDate, today: NaiveDate, windows: &ExpiryWindows) -> ExpirationResult {
    let delta = (expiration_date - today).num_days();

    let (days_left, urgency) = if delta < 0 {
        (DaysLeft::Expired, ExpiryUrgency::Expired)
    } else if delta == 0 {
        (DaysLeft::ExpiresToday, ExpiryUrgency::ExpiresToday)
    } else {
        let days = u32::try_from(delta).unwrap_or(u32::MAX);
        let urgency = if days <= windows.urgent_days {
            ExpiryUrgency::Urgent
        } else if days <= windows.alert_days {
            ExpiryUrgency::ThisMonth
        } else {
            ExpiryUrgency::Later
        };
        (DaysLeft::Days(days), urgency)
    };

    ExpirationResult {
        expiration_date,
        days_left,
        urgency,
    }
}

/// Parse then evaluate; unparseable input yields `None`
pub fn evaluate_raw(raw: &str, today: NaiveDate, windows: &ExpiryWindows) -> Option<ExpirationResult> {
    parse_expiration_date(raw).map(|date| evaluate(date, today, windows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn test_all_formats_parse_to_same_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        for raw in ["2025-12-31", "31-12-2025", "31/12/2025", "12/31/2025"] {
            assert_eq!(parse_expiration_date(raw), Some(expected), "format {}", raw);
        }
    }

    #[test]
    fn test_day_month_wins_when_ambiguous() {
        assert_eq!(
            parse_expiration_date("03/04/2025"),
            NaiveDate::from_ymd_opt(2025, 4, 3)
        );
    }

    #[test]
    fn test_unparseable_is_no_data() {
        assert_eq!(parse_expiration_date(""), None);
        assert_eq!(parse_expiration_date("   "), None);
        assert_eq!(parse_expiration_date("next tuesday"), None);
        assert_eq!(parse_expiration_date("2025-13-45"), None);
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date(" 05/01/2026 "), Some("2026-01-05".to_string()));
    }

    #[test]
    fn test_expires_today() {
        let result = evaluate(today(), today(), &ExpiryWindows::default());
        assert_eq!(result.days_left, DaysLeft::ExpiresToday);
        assert!(result.is_alert());
        assert!(result.is_urgent());
    }

    #[test]
    fn test_expired() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let result = evaluate(date, today(), &ExpiryWindows::default());
        assert_eq!(result.days_left, DaysLeft::Expired);
        assert_eq!(result.urgency, ExpiryUrgency::Expired);
    }

    #[test]
    fn test_window_edges() {
        let windows = ExpiryWindows::default();
        let in_days = |n: i64| today() + chrono::Duration::days(n);

        assert_eq!(evaluate(in_days(7), today(), &windows).urgency, ExpiryUrgency::Urgent);
        assert_eq!(evaluate(in_days(8), today(), &windows).urgency, ExpiryUrgency::ThisMonth);
        assert_eq!(evaluate(in_days(30), today(), &windows).urgency, ExpiryUrgency::ThisMonth);

        let later = evaluate(in_days(31), today(), &windows);
        assert_eq!(later.urgency, ExpiryUrgency::Later);
        assert_eq!(later.days_left, DaysLeft::Days(31));
        assert!(!later.is_alert());
    }

    #[test]
    fn test_custom_windows() {
        let windows = ExpiryWindows {
            urgent_days: 2,
            alert_days: 10,
        };
        let result = evaluate_raw("2025-06-20", today(), &windows).unwrap();
        assert_eq!(result.days_left, DaysLeft::Days(5));
        assert_eq!(result.urgency, ExpiryUrgency::ThisMonth);
    }
}
