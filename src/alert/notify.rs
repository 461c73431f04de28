//! Alert delivery seam.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;

use super::classifier::AlertResult;
use crate::account::AccountId;
use crate::billing::BillingPeriod;

pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No recipient address for account {0}")]
    MissingRecipient(AccountId),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Everything a notifier needs to tell a customer about an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub account_id: AccountId,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub period: BillingPeriod,
    pub alert: AlertResult,
}

#[async_trait::async_trait]
pub trait AlertNotifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, notification: &AlertNotification) -> Result<(), NotifyError>;
}

/// Records alerts as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl AlertNotifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notification: &AlertNotification) -> Result<(), NotifyError> {
        let alert = &notification.alert;
        tracing::info!(
            account_id = %notification.account_id,
            period = %notification.period,
            state = ?alert.state,
            current_usage = %alert.current_usage,
            limit = %alert.limit,
            percentage_used = alert.percentage_used,
            "Consumption alert"
        );
        Ok(())
    }
}

/// Outcome of a dispatch; never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    /// `(notifier, reason)` pairs.
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Fans a notification out to every registered notifier.
///
/// Each notifier runs under its own timeout; failures are logged and
/// reported, and one notifier failing does not stop the others.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifiers: Vec<Arc<dyn AlertNotifier>>,
    timeout: Duration,
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_NOTIFY_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            notifiers: Vec::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn register<N: AlertNotifier + 'static>(&mut self, notifier: N) {
        self.notifiers.push(Arc::new(notifier));
    }

    pub fn register_arc(&mut self, notifier: Arc<dyn AlertNotifier>) {
        self.notifiers.push(notifier);
    }

    pub fn notifier(mut self, notifier: impl AlertNotifier + 'static) -> Self {
        self.register(notifier);
        self
    }

    pub fn notifier_names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub async fn dispatch(&self, notification: &AlertNotification) -> DispatchReport {
        let attempts = self.notifiers.iter().map(|notifier| async move {
            let outcome = timeout(self.timeout, notifier.notify(notification)).await;
            (notifier.name().to_string(), outcome)
        });

        let mut report = DispatchReport::default();
        for (name, outcome) in join_all(attempts).await {
            match outcome {
                Ok(Ok(())) => report.delivered.push(name),
                Ok(Err(e)) => {
                    tracing::warn!(
                        notifier = %name,
                        account_id = %notification.account_id,
                        error = %e,
                        "Alert notification failed"
                    );
                    report.failed.push((name, e.to_string()));
                }
                Err(_) => {
                    tracing::warn!(
                        notifier = %name,
                        account_id = %notification.account_id,
                        timeout_secs = self.timeout.as_secs(),
                        "Alert notification timed out"
                    );
                    report.failed.push((name, "timed out".to_string()));
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("notifiers", &self.notifier_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
