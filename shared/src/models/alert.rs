//! Alert notification models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::StatusSummary;

/// Alert kinds, each with a fixed email subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Critical,
    Understock,
    Overstock,
    Expiring,
    Expired,
}

/// Subject line per alert kind
pub const ALERT_SUBJECTS: [(AlertKind, &str); 5] = [
    (AlertKind::Critical, "CRITICAL STOCK ALERT - Immediate Action Required"),
    (AlertKind::Understock, "UNDERSTOCK ALERT - Reorder Required"),
    (AlertKind::Overstock, "OVERSTOCK ALERT - Inventory Review Needed"),
    (AlertKind::Expiring, "EXPIRATION WARNING - Products Expiring Soon"),
    (AlertKind::Expired, "EXPIRED PRODUCTS ALERT - Remove From Sale"),
];

impl AlertKind {
    pub fn subject(&self) -> &'static str {
        ALERT_SUBJECTS
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, subject)| *subject)
            .unwrap_or("Inventory Status Report")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Critical => "critical",
            AlertKind::Understock => "understock",
            AlertKind::Overstock => "overstock",
            AlertKind::Expiring => "expiring",
            AlertKind::Expired => "expired",
        }
    }
}

/// The two separate messages a run can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Inventory,
    Expiration,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Inventory => write!(f, "inventory"),
            MessageKind::Expiration => write!(f, "expiration"),
        }
    }
}

/// One product line inside an alert message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertLine {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_stock: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_quantity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    /// Action text shown next to the product
    pub detail: String,
}

/// A single notification handed to the email collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub kind: MessageKind,
    pub alert_kind: AlertKind,
    pub subject: String,
    pub recipients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub lines: Vec<AlertLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<StatusSummary>,
}

/// Messages decided for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchManifest {
    pub recipients: Vec<String>,
    pub messages: Vec<AlertMessage>,
}

impl DispatchManifest {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Message kinds that will be sent, for confirmation text
    pub fn kinds(&self) -> std::collections::BTreeSet<MessageKind> {
        self.messages.iter().map(|message| message.kind).collect()
    }
}
