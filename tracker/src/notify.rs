//! Operator notifications: change reports and order-failure alerts.
//!
//! Delivery is fire-and-forget. [`deliver`] is the only entry point the
//! tracker uses and it never returns an error: a failed notification is
//! logged and dropped so the reporting path cannot take a cycle down.

use std::time::Duration;

use allocsync::ChangeEntry;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::blocking::Client;
use serde::Serialize;

use crate::config::NotifyConfig;
use crate::order::OrderSubmissionFailure;

/// Notification delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification endpoint returned {0}")]
    Status(u16),
}

/// A message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Delivery channel.
pub trait Notifier {
    fn notify(&self, message: &Notification) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &Notification) -> Result<(), NotifyError> {
        (**self).notify(message)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, message: &Notification) -> Result<(), NotifyError> {
        (**self).notify(message)
    }
}

/// Send through `notifier`, absorbing any failure.
pub fn deliver(notifier: &dyn Notifier, message: &Notification) {
    if let Err(e) = notifier.notify(message) {
        warn!("notification '{}' not delivered: {e}", message.subject);
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &Notification) -> Result<(), NotifyError> {
        info!("{}\n{}", message.subject, message.body);
        Ok(())
    }
}

/// POSTs `{"subject", "body"}` JSON to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &Notification) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

/// Webhook delivery if a URL is configured, log-only otherwise.
pub fn from_config(config: &NotifyConfig) -> Result<Box<dyn Notifier>, NotifyError> {
    Ok(match &config.webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(
            url,
            Duration::from_secs(config.timeout_secs),
        )?),
        None => Box::new(LogNotifier),
    })
}

fn stamp(now: DateTime<Utc>) -> String {
    now.format("%Y/%m/%d %H:%M UTC").to_string()
}

/// Report for a committed change set, one line per entry.
pub fn change_report(entries: &[ChangeEntry], now: DateTime<Utc>) -> Notification {
    let body = entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Notification {
        subject: format!("Position change notice - {}", stamp(now)),
        body,
    }
}

/// Urgent alert for an order that exhausted its retries.
pub fn order_failure_report(failure: &OrderSubmissionFailure, now: DateTime<Utc>) -> Notification {
    let class = if failure.is_transport() {
        "network problem reaching the brokerage"
    } else {
        "unknown error"
    };
    let price = failure
        .price
        .map_or_else(|| "market".to_string(), |p| p.to_string());
    let body = format!(
        "Time: {}\n\
         Cause: {class}\n\
         Symbol: {}\n\
         Side: {}\n\
         Quantity: {}\n\
         Price: {price}\n\
         Attempts: {}\n\
         Error: {}",
        stamp(now),
        failure.symbol,
        failure.side,
        failure.quantity,
        failure.attempts,
        failure.last_error,
    );
    Notification {
        subject: "[URGENT] Order submission failed".into(),
        body,
    }
}
