//! Email delivery for alert messages
//!
//! The [`Mailer`] trait is the seam between dispatch and transport. The SMTP
//! implementation reads the current settings on every send, so settings
//! changed through the API apply to the next message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use shared::models::{AlertMessage, MessageKind};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{SmtpSettings, SmtpTls};

/// Why a message was not delivered
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum EmailFailure {
    #[error("email is not configured: {0}")]
    NotConfigured(String),

    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    #[error("recipient rejected: {0}")]
    RecipientRejected(String),

    #[error("could not connect to SMTP server: {0}")]
    Connection(String),

    #[error("could not build message: {0}")]
    Message(String),

    #[error("email delivery failed: {0}")]
    Other(String),
}

impl EmailFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            EmailFailure::NotConfigured(_) => "not_configured",
            EmailFailure::Authentication(_) => "authentication",
            EmailFailure::RecipientRejected(_) => "recipient_rejected",
            EmailFailure::Connection(_) => "connection",
            EmailFailure::Message(_) => "message",
            EmailFailure::Other(_) => "other",
        }
    }
}

impl From<lettre::transport::smtp::Error> for EmailFailure {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        let detail = err.to_string();
        if let Some(code) = err.status() {
            let code = code.to_string();
            return match code.as_str() {
                "530" | "534" | "535" => EmailFailure::Authentication(detail),
                "550" | "551" | "553" | "501" => EmailFailure::RecipientRejected(detail),
                _ => EmailFailure::Other(detail),
            };
        }
        if err.is_timeout() || err.is_transient() || err.is_client() {
            EmailFailure::Connection(detail)
        } else {
            EmailFailure::Other(detail)
        }
    }
}

/// Delivers one alert message
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), EmailFailure>;
}

/// SMTP delivery through lettre
pub struct SmtpMailer {
    settings: Arc<RwLock<SmtpSettings>>,
}

impl SmtpMailer {
    pub fn new(settings: Arc<RwLock<SmtpSettings>>) -> Self {
        Self { settings }
    }

    fn transport(settings: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailFailure> {
        let host = settings.host.trim();
        let builder = match settings.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(Duration::from_secs(settings.timeout_secs)));
        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }
        Ok(builder.build())
    }

    fn build_message(settings: &SmtpSettings, message: &AlertMessage) -> Result<Message, EmailFailure> {
        let from: Mailbox = settings
            .sender
            .trim()
            .parse()
            .map_err(|e| EmailFailure::NotConfigured(format!("invalid sender address: {}", e)))?;

        let mut builder = Message::builder().from(from).subject(message.subject.clone());
        for recipient in &message.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| EmailFailure::RecipientRejected(format!("{}: {}", recipient, e)))?;
            builder = builder.to(to);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(render_html(message))
            .map_err(|e| EmailFailure::Message(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &AlertMessage) -> Result<(), EmailFailure> {
        let settings = self.settings.read().await.clone();
        if !settings.is_configured() {
            return Err(EmailFailure::NotConfigured(
                "SMTP host and sender address are required".to_string(),
            ));
        }
        if message.recipients.is_empty() {
            return Err(EmailFailure::RecipientRejected("no recipients".to_string()));
        }

        let email = Self::build_message(&settings, message)?;
        let transport = Self::transport(&settings)?;
        transport.send(email).await?;

        tracing::info!(
            kind = %message.kind,
            subject = %message.subject,
            recipients = message.recipients.len(),
            "Alert email sent"
        );
        Ok(())
    }
}

// ============================================================================
// HTML Rendering
// ============================================================================

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn header_color(message: &AlertMessage) -> &'static str {
    use shared::models::AlertKind;
    match message.alert_kind {
        AlertKind::Critical | AlertKind::Expired => "#c0392b",
        AlertKind::Understock | AlertKind::Expiring => "#e67e22",
        AlertKind::Overstock => "#2980b9",
    }
}

/// HTML body listing every affected product and the run summary
pub fn render_html(message: &AlertMessage) -> String {
    let mut html = String::new();
    html.push_str("<html><body style=\"font-family: Arial, sans-serif;\">");
    html.push_str(&format!(
        "<h2 style=\"color: {};\">{}</h2>",
        header_color(message),
        escape(&message.subject)
    ));
    if let Some(run_id) = &message.run_id {
        html.push_str(&format!("<p>Analysis run: {}</p>", escape(run_id)));
    }

    html.push_str("<table border=\"1\" cellpadding=\"6\" cellspacing=\"0\" style=\"border-collapse: collapse;\">");
    match message.kind {
        MessageKind::Inventory => {
            html.push_str(
                "<tr><th>Product ID</th><th>Product</th><th>Current</th><th>Ideal</th>\
                 <th>Ratio</th><th>Action</th></tr>",
            );
            for line in &message.lines {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&line.product_id),
                    escape(&line.product_name),
                    line.current_stock,
                    line.ideal_stock.map(|v| v.to_string()).unwrap_or_default(),
                    line.stock_ratio.map(|v| v.round_dp(2).to_string()).unwrap_or_default(),
                    escape(&line.detail),
                ));
            }
        }
        MessageKind::Expiration => {
            html.push_str(
                "<tr><th>Product ID</th><th>Product</th><th>Stock</th><th>Expires</th><th>Action</th></tr>",
            );
            for line in &message.lines {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&line.product_id),
                    escape(&line.product_name),
                    line.current_stock,
                    line.expiration_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    escape(&line.detail),
                ));
            }
        }
    }
    html.push_str("</table>");

    if let Some(summary) = &message.summary {
        html.push_str("<h3>Summary</h3><ul>");
        for (label, value) in summary.statistics() {
            html.push_str(&format!("<li>{}: {}</li>", label, value));
        }
        html.push_str("</ul>");
    }

    html.push_str("<p style=\"color: #888;\">Sent by the inventory analysis service.</p>");
    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{AlertKind, AlertLine, StatusSummary};

    fn message() -> AlertMessage {
        AlertMessage {
            kind: MessageKind::Inventory,
            alert_kind: AlertKind::Critical,
            subject: AlertKind::Critical.subject().to_string(),
            recipients: vec!["ops@example.com".to_string()],
            run_id: Some("20250101T000000000000".to_string()),
            lines: vec![AlertLine {
                product_id: "P1".to_string(),
                product_name: "Milk <1L>".to_string(),
                current_stock: Decimal::from(10),
                ideal_stock: Some(Decimal::from(100)),
                stock_ratio: Some(Decimal::new(1, 1)),
                order_quantity: Some(90),
                expiration_date: None,
                detail: "URGENT RESTOCK: order 90 units now".to_string(),
            }],
            summary: Some(StatusSummary {
                total_products: 1,
                critical_understock: 1,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_render_lists_products_and_summary() {
        let html = render_html(&message());
        assert!(html.contains("CRITICAL STOCK ALERT"));
        assert!(html.contains("Milk &lt;1L&gt;"));
        assert!(html.contains("order 90 units"));
        assert!(html.contains("Critical Items: 1"));
    }

    #[test]
    fn test_failure_serializes_with_reason() {
        let value = serde_json::to_value(EmailFailure::Authentication("535".to_string())).unwrap();
        assert_eq!(value["reason"], "authentication");
        assert_eq!(value["detail"], "535");
    }

    #[tokio::test]
    async fn test_unconfigured_smtp_fails_fast() {
        let settings = Arc::new(RwLock::new(SmtpSettings::default()));
        let mailer = SmtpMailer::new(settings);
        let err = mailer.send(&message()).await.unwrap_err();
        assert_eq!(err.reason(), "not_configured");
    }
}
