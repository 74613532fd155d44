use crate::config::AuditConfig;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

pub const OP_CREATE_USER: &str = "createUser";
pub const OP_BULK_CREATE_USERS: &str = "bulkCreateUsers";
pub const OP_UPDATE_USER: &str = "updateUser";
pub const OP_BULK_UPDATE_USERS: &str = "bulkUpdateUsers";

pub trait AuditNotifier: Send + Sync {
    fn notify(&self, operation: &str, operator: &str) -> AppResult<()>;
}

/// Sends the notification and discards any failure after logging it.
pub fn notify_best_effort(notifier: &dyn AuditNotifier, operation: &str, operator: &str) {
    if let Err(error) = notifier.notify(operation, operator) {
        tracing::warn!(operation, operator, error = %error, "audit notification failed");
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: String,
    pub operation: String,
    pub operator: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(operation: &str, operator: &str) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            operation: operation.to_string(),
            operator: operator.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Posts each event as JSON to a fixed endpoint.
pub struct HttpAuditNotifier {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpAuditNotifier {
    pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Self {
        let timeout = Duration::from_millis(timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }
}

impl AuditNotifier for HttpAuditNotifier {
    fn notify(&self, operation: &str, operator: &str) -> AppResult<()> {
        let event = AuditEvent::new(operation, operator);
        let payload = serde_json::to_string(&event)?;
        match self
            .agent
            .post(&self.endpoint)
            .set("content-type", "application/json")
            .set("x-audit-event-id", &event.event_id)
            .send_string(&payload)
        {
            Ok(resp) if (200..=299).contains(&resp.status()) => Ok(()),
            Ok(resp) => Err(AppError::Audit(format!(
                "audit endpoint answered http status {}",
                resp.status()
            ))),
            Err(ureq::Error::Status(code, _)) => {
                Err(AppError::Audit(format!("audit endpoint answered http status {}", code)))
            }
            Err(ureq::Error::Transport(err)) => Err(AppError::Audit(format!("audit transport error: {}", err))),
        }
    }
}

/// Records the event in the log stream only.
#[derive(Debug, Default, Clone)]
pub struct LogAuditNotifier;

impl AuditNotifier for LogAuditNotifier {
    fn notify(&self, operation: &str, operator: &str) -> AppResult<()> {
        let event = AuditEvent::new(operation, operator);
        tracing::info!(
            event_id = %event.event_id,
            operation = %event.operation,
            operator = %event.operator,
            "audit"
        );
        Ok(())
    }
}

pub fn from_config(config: &AuditConfig) -> Box<dyn AuditNotifier> {
    match config.endpoint.as_deref() {
        Some(endpoint) => Box::new(HttpAuditNotifier::new(endpoint, config.timeout_ms)),
        None => Box::new(LogAuditNotifier),
    }
}
