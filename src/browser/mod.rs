// src/browser/mod.rs
//! Rendering collaborator: launch an engine, open one shared profile per scrape
//! phase, open short-lived pages inside it, and read the rendered DOM.
//!
//! Only the scheduler (or the startup/shutdown hooks) launches or closes an
//! [`Engine`]; scrape phases only open and close pages within a [`Profile`].

pub mod dom;
pub mod fixture;
pub mod webdriver;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{ScrapeError, ScrapeResult};

/// Desktop Chrome user agent used for the shared profile.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Interval between DOM snapshots while waiting for a selector or condition.
pub const DEFAULT_POLL: Duration = Duration::from_millis(250);

#[async_trait::async_trait]
pub trait Page: Send {
    /// Navigate and wait for the document to load, failing after `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> ScrapeResult<()>;

    /// Serialized DOM as currently rendered (after client-side scripts ran).
    async fn content(&mut self) -> ScrapeResult<String>;

    /// Release the page. Must be idempotent.
    async fn close(&mut self) -> ScrapeResult<()>;
}

#[async_trait::async_trait]
pub trait Profile: Send + Sync {
    async fn new_page(&self) -> ScrapeResult<Box<dyn Page>>;

    /// Close the profile and anything still open inside it.
    async fn close(&self) -> ScrapeResult<()>;
}

#[async_trait::async_trait]
pub trait Engine: Send + Sync {
    async fn new_profile(&self, user_agent: &str) -> ScrapeResult<Arc<dyn Profile>>;

    async fn close(&mut self) -> ScrapeResult<()>;
}

#[async_trait::async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self) -> ScrapeResult<Box<dyn Engine>>;
}

/// Poll DOM snapshots until `check` yields a value or `timeout` elapses.
pub async fn wait_for_condition<T, F>(
    page: &mut dyn Page,
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut check: F,
) -> ScrapeResult<T>
where
    F: FnMut(&str) -> ScrapeResult<Option<T>> + Send,
    T: Send,
{
    let deadline = Instant::now() + timeout;
    loop {
        let html = page.content().await?;
        if let Some(found) = check(&html)? {
            return Ok(found);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(ScrapeError::Timeout {
                what: what.to_string(),
                after: timeout,
            });
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// Wait until at least `min` elements match `css`; returns the snapshot that satisfied it.
pub async fn wait_for_count(
    page: &mut dyn Page,
    css: &str,
    min: usize,
    timeout: Duration,
    poll: Duration,
) -> ScrapeResult<String> {
    let what = format!("{min}x `{css}`");
    wait_for_condition(page, &what, timeout, poll, |html| {
        Ok((dom::count(html, css)? >= min).then(|| html.to_string()))
    })
    .await
}

pub async fn wait_for_selector(
    page: &mut dyn Page,
    css: &str,
    timeout: Duration,
    poll: Duration,
) -> ScrapeResult<String> {
    wait_for_count(page, css, 1, timeout, poll).await
}

/// Wait until some element matching `css` contains `needle`.
pub async fn wait_for_text(
    page: &mut dyn Page,
    css: &str,
    needle: &str,
    timeout: Duration,
    poll: Duration,
) -> ScrapeResult<String> {
    let what = format!("`{css}` containing '{needle}'");
    wait_for_condition(page, &what, timeout, poll, |html| {
        Ok(dom::has_text(html, css, needle)?.then(|| html.to_string()))
    })
    .await
}
