// src/browser/fixture.rs
//! In-memory rendering engine serving canned HTML by URL.
//!
//! Used by the integration tests and handy for offline runs: routes can be
//! swapped between calls to simulate a site changing layout, failing, or being slow,
//! and every navigation / page / profile / launch is counted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use super::{Engine, EngineLauncher, Page, Profile};
use crate::error::{ScrapeError, ScrapeResult};

#[derive(Debug, Clone)]
enum Route {
    Html(String),
    Slow { html: String, delay: Duration },
    Fail(String),
}

#[derive(Debug, Default)]
struct State {
    routes: RwLock<HashMap<String, Route>>,
    visits: Mutex<Vec<String>>,
    launches: AtomicUsize,
    engine_closes: AtomicUsize,
    profiles_opened: AtomicUsize,
    profiles_closed: AtomicUsize,
    pages_opened: AtomicUsize,
    pages_closed: AtomicUsize,
    fail_launch: AtomicBool,
}

fn read<T: Clone>(lock: &RwLock<T>) -> T {
    match lock.read() {
        Ok(g) => g.clone(),
        Err(poison) => poison.into_inner().clone(),
    }
}

/// Launcher + inspection handle. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FixtureBrowser {
    state: Arc<State>,
}

impl FixtureBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, url: &str, route: Route) {
        let mut routes = match self.state.routes.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        routes.insert(url.to_string(), route);
    }

    pub fn route(&self, url: &str, html: impl Into<String>) {
        self.set(url, Route::Html(html.into()));
    }

    /// Serve `html` only after `delay` (navigation fails if `delay` exceeds its timeout).
    pub fn route_slow(&self, url: &str, html: impl Into<String>, delay: Duration) {
        self.set(
            url,
            Route::Slow {
                html: html.into(),
                delay,
            },
        );
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.set(url, Route::Fail(reason.to_string()));
    }

    pub fn set_fail_launch(&self, on: bool) {
        self.state.fail_launch.store(on, Ordering::SeqCst);
    }

    pub fn visits(&self) -> Vec<String> {
        match self.state.visits.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn visit_count(&self, url: &str) -> usize {
        self.visits().iter().filter(|u| u.as_str() == url).count()
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    /// Engines launched and not yet closed.
    pub fn live_engines(&self) -> usize {
        self.launches() - self.state.engine_closes.load(Ordering::SeqCst)
    }

    pub fn profiles_opened(&self) -> usize {
        self.state.profiles_opened.load(Ordering::SeqCst)
    }

    pub fn open_profiles(&self) -> usize {
        self.profiles_opened() - self.state.profiles_closed.load(Ordering::SeqCst)
    }

    pub fn pages_opened(&self) -> usize {
        self.state.pages_opened.load(Ordering::SeqCst)
    }

    pub fn open_pages(&self) -> usize {
        self.pages_opened() - self.state.pages_closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EngineLauncher for FixtureBrowser {
    async fn launch(&self) -> ScrapeResult<Box<dyn Engine>> {
        if self.state.fail_launch.load(Ordering::SeqCst) {
            return Err(ScrapeError::engine("fixture launch disabled"));
        }
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureEngine {
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct FixtureEngine {
    state: Arc<State>,
    closed: bool,
}

#[async_trait::async_trait]
impl Engine for FixtureEngine {
    async fn new_profile(&self, _user_agent: &str) -> ScrapeResult<Arc<dyn Profile>> {
        if self.closed {
            return Err(ScrapeError::engine("engine closed"));
        }
        self.state.profiles_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FixtureProfile {
            state: self.state.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&mut self) -> ScrapeResult<()> {
        if !self.closed {
            self.closed = true;
            self.state.engine_closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct FixtureProfile {
    state: Arc<State>,
    closed: AtomicBool,
}

#[async_trait::async_trait]
impl Profile for FixtureProfile {
    async fn new_page(&self) -> ScrapeResult<Box<dyn Page>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScrapeError::engine("profile closed"));
        }
        self.state.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixturePage {
            state: self.state.clone(),
            html: None,
            closed: false,
        }))
    }

    async fn close(&self) -> ScrapeResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.profiles_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct FixturePage {
    state: Arc<State>,
    html: Option<String>,
    closed: bool,
}

#[async_trait::async_trait]
impl Page for FixturePage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> ScrapeResult<()> {
        if self.closed {
            return Err(ScrapeError::engine("page closed"));
        }
        if let Ok(mut v) = self.state.visits.lock() {
            v.push(url.to_string());
        }
        let route = read(&self.state.routes).get(url).cloned();
        match route {
            Some(Route::Html(html)) => {
                self.html = Some(html);
                Ok(())
            }
            Some(Route::Slow { html, delay }) => {
                if delay > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(ScrapeError::navigation(url, "page load timed out"));
                }
                tokio::time::sleep(delay).await;
                self.html = Some(html);
                Ok(())
            }
            Some(Route::Fail(reason)) => Err(ScrapeError::navigation(url, reason)),
            None => Err(ScrapeError::navigation(url, "no fixture for url")),
        }
    }

    async fn content(&mut self) -> ScrapeResult<String> {
        self.html
            .clone()
            .ok_or_else(|| ScrapeError::engine("no document loaded"))
    }

    async fn close(&mut self) -> ScrapeResult<()> {
        if !self.closed {
            self.closed = true;
            self.state.pages_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
