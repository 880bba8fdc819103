// src/notify/mod.rs
pub mod ntfy;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use metrics::counter;
use tracing::{info, warn};

pub use ntfy::NtfyNotifier;
pub use watch::PriceWatch;

/// Bullion sell price moved between two successful association reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange {
    pub previous: String,
    pub current: String,
    /// Quote round label from the association feed, e.g. "3".
    pub round: String,
    /// Thai-local stamp of the scrape that observed the change.
    pub observed_at: String,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, ev: &PriceChange) -> Result<()>;
}

/// Deliver on a detached task. The caller never awaits delivery; failures are
/// logged and counted only.
pub fn spawn_notify(notifier: Arc<dyn Notifier>, ev: PriceChange) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.send(&ev).await {
            Ok(()) => info!(
                target: "notify",
                previous = %ev.previous,
                current = %ev.current,
                "price change pushed"
            ),
            Err(e) => {
                counter!("notify_errors_total").increment(1);
                warn!(target: "notify", error = %e, "price change push failed");
            }
        }
    })
}
