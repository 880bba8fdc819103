// src/browser/webdriver.rs
//! Live rendering engine over WebDriver (chromedriver).
//!
//! Engine   = a chromedriver endpoint, optionally a child process we own.
//! Profile  = the launch arguments (user agent, headless flags) shared by its pages.
//! Page     = one WebDriver session; quitting the session closes the page.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::{Engine, EngineLauncher, Page, Profile};
use crate::config::BrowserConfig;
use crate::error::{ScrapeError, ScrapeResult};

pub struct WebDriverLauncher {
    cfg: BrowserConfig,
    http: reqwest::Client,
}

impl WebDriverLauncher {
    pub fn new(cfg: BrowserConfig) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }

    fn server_url(&self) -> String {
        match &self.cfg.chromedriver_path {
            Some(_) => format!("http://127.0.0.1:{}", self.cfg.chromedriver_port),
            None => self.cfg.webdriver_url.trim_end_matches('/').to_string(),
        }
    }

    fn spawn_chromedriver(&self, path: &str) -> ScrapeResult<Child> {
        Command::new(path)
            .arg(format!("--port={}", self.cfg.chromedriver_port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScrapeError::engine(format!("spawn {path}: {e}")))
    }

    /// Poll `GET /status` until the driver reports ready.
    async fn wait_ready(&self, url: &str) -> ScrapeResult<()> {
        let deadline = tokio::time::Instant::now() + self.cfg.startup_timeout();
        loop {
            let probe = self
                .http
                .get(format!("{url}/status"))
                .timeout(Duration::from_secs(2))
                .send()
                .await;
            if let Ok(rsp) = probe {
                let status: Option<serde_json::Value> = rsp.json().await.ok();
                let ready = status
                    .as_ref()
                    .and_then(|v| v["value"]["ready"].as_bool())
                    .unwrap_or(false);
                if ready {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::engine(format!("webdriver at {url} not ready")));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}

#[async_trait::async_trait]
impl EngineLauncher for WebDriverLauncher {
    async fn launch(&self) -> ScrapeResult<Box<dyn Engine>> {
        let url = self.server_url();
        let child = match &self.cfg.chromedriver_path {
            Some(path) => Some(self.spawn_chromedriver(path)?),
            None => None,
        };
        let mut engine = WebDriverEngine {
            url: url.clone(),
            args: self.cfg.chrome_args.clone(),
            child,
        };
        if let Err(e) = self.wait_ready(&url).await {
            let _ = engine.close().await;
            return Err(e);
        }
        info!(target: "browser", %url, owned = engine.child.is_some(), "webdriver engine up");
        Ok(Box::new(engine))
    }
}

struct WebDriverEngine {
    url: String,
    args: Vec<String>,
    child: Option<Child>,
}

#[async_trait::async_trait]
impl Engine for WebDriverEngine {
    async fn new_profile(&self, user_agent: &str) -> ScrapeResult<Arc<dyn Profile>> {
        let mut args = self.args.clone();
        args.push(format!("--user-agent={user_agent}"));
        Ok(Arc::new(WebDriverProfile {
            url: self.url.clone(),
            args,
            live_pages: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&mut self) -> ScrapeResult<()> {
        if let Some(mut child) = self.child.take() {
            child
                .kill()
                .await
                .map_err(|e| ScrapeError::engine(format!("kill chromedriver: {e}")))?;
            info!(target: "browser", "chromedriver stopped");
        }
        Ok(())
    }
}

struct WebDriverProfile {
    url: String,
    args: Vec<String>,
    live_pages: Arc<AtomicUsize>,
    closed: AtomicBool,
}

#[async_trait::async_trait]
impl Profile for WebDriverProfile {
    async fn new_page(&self) -> ScrapeResult<Box<dyn Page>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScrapeError::engine("profile closed"));
        }
        let mut caps = DesiredCapabilities::chrome();
        for arg in &self.args {
            caps.add_arg(arg).map_err(ScrapeError::engine)?;
        }
        let driver = WebDriver::new(self.url.as_str(), caps)
            .await
            .map_err(|e| ScrapeError::engine(format!("new session: {e}")))?;
        self.live_pages.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(WebDriverPage {
            driver: Some(driver),
            live_pages: self.live_pages.clone(),
        }))
    }

    async fn close(&self) -> ScrapeResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        // pages quit their own sessions (on close or drop); anything left is a leak
        let left = self.live_pages.load(Ordering::SeqCst);
        if left > 0 {
            warn!(target: "browser", left, "profile closed with pages still open");
        }
        Ok(())
    }
}

struct WebDriverPage {
    driver: Option<WebDriver>,
    live_pages: Arc<AtomicUsize>,
}

impl WebDriverPage {
    fn driver(&self) -> ScrapeResult<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| ScrapeError::engine("page closed"))
    }
}

#[async_trait::async_trait]
impl Page for WebDriverPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> ScrapeResult<()> {
        let driver = self.driver()?;
        driver
            .set_page_load_timeout(timeout)
            .await
            .map_err(|e| ScrapeError::navigation(url, e))?;
        // the outer timeout covers drivers that ignore the page-load budget
        match tokio::time::timeout(timeout + Duration::from_secs(1), driver.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::navigation(url, e)),
            Err(_) => Err(ScrapeError::navigation(url, "page load timed out")),
        }
    }

    async fn content(&mut self) -> ScrapeResult<String> {
        self.driver()?
            .source()
            .await
            .map_err(|e| ScrapeError::engine(format!("read page source: {e}")))
    }

    async fn close(&mut self) -> ScrapeResult<()> {
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };
        self.live_pages.fetch_sub(1, Ordering::SeqCst);
        driver
            .quit()
            .await
            .map_err(|e| ScrapeError::engine(format!("quit session: {e}")))
    }
}

impl Drop for WebDriverPage {
    fn drop(&mut self) {
        // cancelled mid-scrape: quit the session in the background
        let Some(driver) = self.driver.take() else {
            return;
        };
        self.live_pages.fetch_sub(1, Ordering::SeqCst);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = driver.quit().await {
                    debug!(target: "browser", error = %e, "quit on drop failed");
                }
            });
        }
    }
}
