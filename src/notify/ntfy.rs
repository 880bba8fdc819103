// src/notify/ntfy.rs
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;

use super::{Notifier, PriceChange};
use crate::config::NotifyConfig;

/// Plain-text push to an ntfy topic (`POST {server}/{topic}`).
#[derive(Clone)]
pub struct NtfyNotifier {
    endpoint: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl NtfyNotifier {
    pub fn new(server: &str, topic: &str) -> Self {
        Self {
            endpoint: format!("{}/{}", server.trim_end_matches('/'), topic),
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn from_config(cfg: &NotifyConfig) -> Self {
        Self::new(&cfg.server, &cfg.topic)
            .with_timeout(cfg.timeout_secs)
            .with_retries(cfg.max_retries)
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn message_body(ev: &PriceChange) -> String {
    format!(
        "ทองคำแท่งขายออก {} บาท (เดิม {})\nรอบที่ {} @ {}",
        ev.current, ev.previous, ev.round, ev.observed_at
    )
}

#[async_trait::async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, ev: &PriceChange) -> Result<()> {
        let body = message_body(ev);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.endpoint)
                .timeout(self.timeout)
                .header("Title", "Gold price update")
                .header("Tags", "moneybag")
                .body(body.clone())
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("ntfy HTTP error: {e}"),
                },
                Err(e) => anyhow!("ntfy request failed: {e}"),
            };
            if attempt >= self.max_retries {
                return Err(err);
            }
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_server_and_topic() {
        let n = NtfyNotifier::new("https://ntfy.sh/", "thai-gold");
        assert_eq!(n.endpoint(), "https://ntfy.sh/thai-gold");
    }

    #[test]
    fn body_carries_both_prices() {
        let ev = PriceChange {
            previous: "41,000.00".into(),
            current: "41,100.00".into(),
            round: "4".into(),
            observed_at: "2025-09-08 11:02:00".into(),
        };
        let body = message_body(&ev);
        assert!(body.contains("41,100.00"));
        assert!(body.contains("41,000.00"));
        assert!(body.contains("2025-09-08 11:02:00"));
    }
}
