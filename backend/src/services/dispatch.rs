//! Background alert dispatch
//!
//! Messages decided for a run are queued on a bounded channel and drained by
//! one worker task, so uploads never wait on SMTP. Each message is attempted
//! once; the outcome lands in a bounded in-memory log.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::history::CappedLog;
use shared::models::{AlertKind, AlertMessage, DispatchManifest, MessageKind};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::email::{EmailFailure, Mailer};

#[derive(Debug)]
struct DispatchJob {
    id: Uuid,
    message: AlertMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Sent,
    Failed,
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRecord {
    pub job_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub kind: MessageKind,
    pub alert_kind: AlertKind,
    pub subject: String,
    pub recipients: Vec<String>,
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<EmailFailure>,
    pub attempted_at: DateTime<Utc>,
}

impl DispatchRecord {
    fn new(job_id: Uuid, message: &AlertMessage, outcome: Result<(), EmailFailure>) -> Self {
        let (status, failure) = match outcome {
            Ok(()) => (DispatchStatus::Sent, None),
            Err(failure) => (DispatchStatus::Failed, Some(failure)),
        };
        Self {
            job_id,
            run_id: message.run_id.clone(),
            kind: message.kind,
            alert_kind: message.alert_kind,
            subject: message.subject.clone(),
            recipients: message.recipients.clone(),
            status,
            failure,
            attempted_at: Utc::now(),
        }
    }
}

/// Recent outcomes plus the number of messages still waiting
pub struct DispatchLog {
    records: Mutex<CappedLog<DispatchRecord>>,
    pending: AtomicUsize,
}

impl DispatchLog {
    fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(CappedLog::new(capacity)),
            pending: AtomicUsize::new(0),
        }
    }

    fn record(&self, record: DispatchRecord) {
        match self.records.lock() {
            Ok(mut records) => {
                records.push(record);
            }
            Err(_) => tracing::error!("Dispatch log lock poisoned, dropping record"),
        }
    }

    /// Newest first
    pub fn recent(&self) -> Vec<DispatchRecord> {
        match self.records.lock() {
            Ok(records) => {
                let mut recent = records.to_vec();
                recent.reverse();
                recent
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Handle for queueing messages; cheap to clone
#[derive(Clone)]
pub struct DispatchQueue {
    sender: mpsc::Sender<DispatchJob>,
    log: Arc<DispatchLog>,
}

impl DispatchQueue {
    /// Spawn the worker on the current runtime
    pub fn start(mailer: Arc<dyn Mailer>, queue_capacity: usize, log_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let log = Arc::new(DispatchLog::new(log_capacity));
        tokio::spawn(run_worker(receiver, mailer, Arc::clone(&log)));
        Self { sender, log }
    }

    /// Queue every message of a manifest; returns the ids of queued jobs
    pub fn enqueue(&self, manifest: &DispatchManifest) -> Vec<Uuid> {
        let mut queued = Vec::with_capacity(manifest.messages.len());
        for message in &manifest.messages {
            let job = DispatchJob {
                id: Uuid::new_v4(),
                message: message.clone(),
            };
            let id = job.id;
            self.log.pending.fetch_add(1, Ordering::SeqCst);
            match self.sender.try_send(job) {
                Ok(()) => {
                    tracing::debug!(job_id = %id, kind = %message.kind, "Alert queued");
                    queued.push(id);
                }
                Err(err) => {
                    self.log.pending.fetch_sub(1, Ordering::SeqCst);
                    tracing::warn!(job_id = %id, error = %err, "Dispatch queue unavailable");
                    self.log.record(DispatchRecord::new(
                        id,
                        message,
                        Err(EmailFailure::Other(format!("dispatch queue unavailable: {}", err))),
                    ));
                }
            }
        }
        queued
    }

    pub fn log(&self) -> &DispatchLog {
        &self.log
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<DispatchJob>, mailer: Arc<dyn Mailer>, log: Arc<DispatchLog>) {
    while let Some(job) = receiver.recv().await {
        let outcome = mailer.send(&job.message).await;
        if let Err(failure) = &outcome {
            tracing::warn!(
                job_id = %job.id,
                kind = %job.message.kind,
                reason = failure.reason(),
                error = %failure,
                "Alert email failed"
            );
        }
        log.record(DispatchRecord::new(job.id, &job.message, outcome));
        log.pending.fetch_sub(1, Ordering::SeqCst);
    }
    tracing::debug!("Dispatch worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FlakyMailer;

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, message: &AlertMessage) -> Result<(), EmailFailure> {
            match message.kind {
                MessageKind::Inventory => Ok(()),
                MessageKind::Expiration => Err(EmailFailure::Connection("refused".to_string())),
            }
        }
    }

    fn message(kind: MessageKind) -> AlertMessage {
        AlertMessage {
            kind,
            alert_kind: AlertKind::Critical,
            subject: "s".to_string(),
            recipients: vec!["ops@example.com".to_string()],
            run_id: None,
            lines: Vec::new(),
            summary: None,
        }
    }

    async fn wait_for(queue: &DispatchQueue, count: usize) {
        for _ in 0..100 {
            if queue.log().recent().len() >= count && queue.log().pending() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("dispatch did not finish");
    }

    #[tokio::test]
    async fn test_outcomes_are_logged() {
        let queue = DispatchQueue::start(Arc::new(FlakyMailer), 8, 8);
        let manifest = DispatchManifest {
            recipients: vec!["ops@example.com".to_string()],
            messages: vec![message(MessageKind::Inventory), message(MessageKind::Expiration)],
        };

        assert_eq!(queue.enqueue(&manifest).len(), 2);
        wait_for(&queue, 2).await;

        let records = queue.log().recent();
        let sent = records.iter().find(|r| r.kind == MessageKind::Inventory).unwrap();
        let failed = records.iter().find(|r| r.kind == MessageKind::Expiration).unwrap();
        assert_eq!(sent.status, DispatchStatus::Sent);
        assert_eq!(failed.status, DispatchStatus::Failed);
        assert_eq!(failed.failure.as_ref().map(|f| f.reason()), Some("connection"));
    }

    #[tokio::test]
    async fn test_empty_manifest_queues_nothing() {
        let queue = DispatchQueue::start(Arc::new(FlakyMailer), 8, 8);
        assert!(queue.enqueue(&DispatchManifest::default()).is_empty());
        assert_eq!(queue.log().pending(), 0);
    }
}
