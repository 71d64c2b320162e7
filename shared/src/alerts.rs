//! Alert dispatch decisions
//!
//! Decides which notifications a finished run produces. At most two
//! messages: one for actionable stock levels and one for expiring products.
//! Empty payloads never produce a message.

use crate::models::{
    AlertKind, AlertLine, AlertMessage, AnalysisRun, DispatchManifest, ExpiryAlert, ExpiryUrgency,
    MessageKind, Recommendation, StockStatus,
};

/// Split a comma or semicolon separated recipient list, dropping blanks
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

/// Most severe stock alert kind among the given recommendations
fn inventory_kind<'r>(recommendations: impl IntoIterator<Item = &'r Recommendation>) -> Option<AlertKind> {
    recommendations
        .into_iter()
        .filter_map(|rec| match rec.status {
            StockStatus::CriticalUnderstock | StockStatus::CriticalOverstock => Some(AlertKind::Critical),
            StockStatus::Understock => Some(AlertKind::Understock),
            StockStatus::Overstock => Some(AlertKind::Overstock),
            StockStatus::Optimal => None,
        })
        .min()
}

fn expiration_kind(alerts: &[ExpiryAlert]) -> Option<AlertKind> {
    if alerts.is_empty() {
        None
    } else if alerts.iter().any(|alert| alert.urgency == ExpiryUrgency::Expired) {
        Some(AlertKind::Expired)
    } else {
        Some(AlertKind::Expiring)
    }
}

pub fn inventory_line(rec: &Recommendation) -> AlertLine {
    AlertLine {
        product_id: rec.product_id.clone(),
        product_name: rec.product_name.clone(),
        current_stock: rec.current_stock,
        ideal_stock: Some(rec.ideal_stock_level),
        stock_ratio: Some(rec.stock_ratio),
        order_quantity: Some(rec.order_quantity),
        expiration_date: None,
        detail: rec.action.clone(),
    }
}

pub fn expiration_line(alert: &ExpiryAlert) -> AlertLine {
    let detail = match alert.urgency {
        ExpiryUrgency::Expired => "EXPIRED: remove from sale".to_string(),
        ExpiryUrgency::ExpiresToday => "Expires today: sell or discount now".to_string(),
        ExpiryUrgency::Urgent => format!("Expires in {} days: prioritize sale", alert.days_left),
        _ => format!("Expires in {} days", alert.days_left),
    };
    AlertLine {
        product_id: alert.product_id.clone(),
        product_name: alert.product_name.clone(),
        current_stock: alert.current_stock,
        ideal_stock: None,
        stock_ratio: None,
        order_quantity: None,
        expiration_date: Some(alert.expiration_date),
        detail,
    }
}

/// Build the dispatch manifest for a run; no recipient means nothing is sent
pub fn decide_dispatch(run: &AnalysisRun, recipient: Option<&str>) -> DispatchManifest {
    let recipients = recipient.map(parse_recipients).unwrap_or_default();
    if recipients.is_empty() {
        return DispatchManifest::default();
    }

    let mut messages = Vec::new();

    if let Some(alert_kind) = inventory_kind(run.actionable()) {
        messages.push(AlertMessage {
            kind: MessageKind::Inventory,
            alert_kind,
            subject: alert_kind.subject().to_string(),
            recipients: recipients.clone(),
            run_id: Some(run.id.clone()),
            lines: run.actionable().map(inventory_line).collect(),
            summary: Some(run.summary.clone()),
        });
    }

    if let Some(alert_kind) = expiration_kind(&run.expiry_alerts) {
        messages.push(AlertMessage {
            kind: MessageKind::Expiration,
            alert_kind,
            subject: alert_kind.subject().to_string(),
            recipients: recipients.clone(),
            run_id: Some(run.id.clone()),
            lines: run.expiry_alerts.iter().map(expiration_line).collect(),
            summary: Some(run.summary.clone()),
        });
    }

    DispatchManifest { recipients, messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOrchestrator;
    use crate::expiration::ExpiryWindows;
    use crate::history::MemoryHistoryStore;
    use crate::models::RawProductRow;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn analyze(rows: &[(&str, &str, Option<&str>)]) -> AnalysisRun {
        let store = MemoryHistoryStore::new();
        let raw: Vec<RawProductRow> = rows
            .iter()
            .enumerate()
            .map(|(i, (stock, ideal, expiry))| RawProductRow {
                product_id: format!("P{}", i),
                product_name: format!("Item {}", i),
                current_stock: stock.to_string(),
                ideal_stock_level: Some(ideal.to_string()),
                expiration_date: expiry.map(str::to_string),
                undecodable: false,
            })
            .collect();
        AnalysisOrchestrator::new(&store, ExpiryWindows::default())
            .run(
                &raw,
                "t.csv",
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_parse_recipients() {
        assert_eq!(
            parse_recipients(" a@x.com, b@y.org ;; "),
            vec!["a@x.com".to_string(), "b@y.org".to_string()]
        );
        assert!(parse_recipients("  ").is_empty());
    }

    #[test]
    fn test_no_recipient_no_messages() {
        let run = analyze(&[("1", "100", None)]);
        assert!(decide_dispatch(&run, None).is_empty());
        assert!(decide_dispatch(&run, Some("")).is_empty());
    }

    #[test]
    fn test_all_optimal_sends_nothing() {
        let run = analyze(&[("100", "100", None), ("90", "100", Some("2025-12-01"))]);
        assert!(decide_dispatch(&run, Some("ops@example.com")).is_empty());
    }

    #[test]
    fn test_most_severe_subject_wins() {
        let run = analyze(&[("150", "100", None), ("50", "100", None), ("10", "100", None)]);
        let manifest = decide_dispatch(&run, Some("ops@example.com"));

        assert_eq!(manifest.messages.len(), 1);
        let message = &manifest.messages[0];
        assert_eq!(message.kind, MessageKind::Inventory);
        assert_eq!(message.alert_kind, AlertKind::Critical);
        assert_eq!(message.subject, "CRITICAL STOCK ALERT - Immediate Action Required");
        assert_eq!(message.lines.len(), 3);
    }

    #[test]
    fn test_expiration_message_kinds() {
        let expiring = analyze(&[("100", "100", Some("2025-05-05"))]);
        let manifest = decide_dispatch(&expiring, Some("ops@example.com"));
        assert_eq!(manifest.messages.len(), 1);
        assert_eq!(manifest.messages[0].alert_kind, AlertKind::Expiring);

        let expired = analyze(&[("100", "100", Some("2025-05-05")), ("100", "100", Some("2025-04-01"))]);
        let manifest = decide_dispatch(&expired, Some("ops@example.com"));
        assert_eq!(manifest.messages[0].alert_kind, AlertKind::Expired);
        assert_eq!(manifest.messages[0].lines.len(), 2);
    }

    #[test]
    fn test_both_messages() {
        let run = analyze(&[("50", "100", Some("2025-05-02"))]);
        let manifest = decide_dispatch(&run, Some("ops@example.com"));
        assert_eq!(
            manifest.kinds().into_iter().collect::<Vec<_>>(),
            vec![MessageKind::Inventory, MessageKind::Expiration]
        );
    }
}
