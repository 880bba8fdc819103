// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::browser::DEFAULT_USER_AGENT;
use crate::calendar::{MarketHours, ShopHours};
use crate::shops::registry::default_descriptors;
use crate::shops::ShopDescriptor;

pub const DEFAULT_CONFIG_PATH: &str = "config/gold.toml";
pub const ENV_CONFIG_PATH: &str = "GOLD_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Cache-Control max-age for `/`.
    pub status_max_age_secs: u32,
    /// Cache-Control max-age for association price/jewelry endpoints.
    pub price_max_age_secs: u32,
    /// Cache-Control max-age for `/api/shops`.
    pub shop_max_age_secs: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            status_max_age_secs: 10,
            price_max_age_secs: 60,
            shop_max_age_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub tick_secs: u64,
    /// Association phase runs on ticks where `tick % association_every == 0`.
    pub association_every: u64,
    /// Shop phase runs on ticks where `tick % shops_every == 0`.
    pub shops_every: u64,
    /// Scrape both sources once at startup regardless of the calendar.
    pub boot_scrape: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_secs: 60,
            association_every: 2,
            shops_every: 5,
            boot_scrape: true,
        }
    }
}

impl ScheduleConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    pub new_price_url: String,
    pub new_daily_url: String,
    pub classic_price_url: String,
    pub classic_daily_url: String,
    pub nav_timeout_secs: u64,
    pub rows_timeout_secs: u64,
    pub jewelry_timeout_secs: u64,
    /// Probe the classic layout when the new one fails during discovery.
    pub classic_fallback: bool,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            new_price_url: "https://www.goldtraders.or.th/updatepricelist".to_string(),
            new_daily_url: "https://www.goldtraders.or.th/dailyprices".to_string(),
            classic_price_url: "https://www.goldtraders.or.th/UpdatePriceList.aspx".to_string(),
            classic_daily_url: "https://www.goldtraders.or.th/default.aspx".to_string(),
            nav_timeout_secs: 30,
            rows_timeout_secs: 10,
            jewelry_timeout_secs: 5,
            classic_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Remote WebDriver endpoint, used when no chromedriver binary is configured.
    pub webdriver_url: String,
    /// Spawn (and on hibernation kill) a local chromedriver.
    pub chromedriver_path: Option<String>,
    pub chromedriver_port: u16,
    pub chrome_args: Vec<String>,
    pub user_agent: String,
    pub startup_timeout_secs: u64,
    pub poll_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            chromedriver_path: None,
            chromedriver_port: 9515,
            chrome_args: vec![
                "--headless=new".to_string(),
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            user_agent: DEFAULT_USER_AGENT.to_string(),
            startup_timeout_secs: 15,
            poll_ms: 250,
        }
    }
}

impl BrowserConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub server: String,
    pub topic: String,
    pub timeout_secs: u64,
    pub max_retries: u8,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: "https://ntfy.sh".to_string(),
            topic: "thai-gold-price".to_string(),
            timeout_secs: 5,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
    pub market: MarketHours,
    pub shop_hours: ShopHours,
    pub association: AssociationConfig,
    pub browser: BrowserConfig,
    pub notify: NotifyConfig,
    /// Shop pages in reporting order; `[[shops]]` tables replace the built-in set.
    pub shops: Vec<ShopDescriptor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            schedule: ScheduleConfig::default(),
            market: MarketHours::default(),
            shop_hours: ShopHours::default(),
            association: AssociationConfig::default(),
            browser: BrowserConfig::default(),
            notify: NotifyConfig::default(),
            shops: default_descriptors(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parse gold config TOML")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// `$GOLD_CONFIG_PATH`, else `config/gold.toml`, else built-in defaults;
    /// then environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let cfg = match explicit {
            Some(p) => Self::load_from_file(&p)?,
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    AppConfig::default()
                }
            }
        };
        Ok(cfg.with_env_overrides().sanitized())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("BIND_ADDR") {
            self.server.bind_addr = v;
        } else if let Some(port) = env_parse::<u16>("PORT") {
            self.server.bind_addr = format!("0.0.0.0:{port}");
        }
        if let Ok(v) = env::var("WEBDRIVER_URL") {
            self.browser.webdriver_url = v;
        }
        if let Ok(v) = env::var("CHROMEDRIVER_PATH") {
            self.browser.chromedriver_path = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("NTFY_TOPIC") {
            self.notify.topic = v;
            self.notify.enabled = true;
        }
        if let Ok(v) = env::var("NTFY_SERVER") {
            self.notify.server = v;
        }
        if let Some(b) = env_flag("CLASSIC_FALLBACK") {
            self.association.classic_fallback = b;
        }
        if let Some(secs) = env_parse::<u64>("TICK_SECS") {
            self.schedule.tick_secs = secs;
        }
        self
    }

    pub fn sanitized(mut self) -> Self {
        self.schedule.tick_secs = self.schedule.tick_secs.max(1);
        self.schedule.association_every = self.schedule.association_every.max(1);
        self.schedule.shops_every = self.schedule.shops_every.max(1);
        self.market = self.market.sanitized();
        self.browser.poll_ms = self.browser.poll_ms.max(10);
        self.notify.topic = self.notify.topic.trim().to_string();
        if self.notify.topic.is_empty() {
            self.notify.enabled = false;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    let v = env::var(key).ok()?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
