// src/lib.rs
// Public library surface for the server binary, the scrape-once tool and integration tests.

pub mod api;
pub mod browser;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod reconciler;
pub mod scheduler;
pub mod shops;
pub mod source_state;

pub use crate::api::{router, AppState};
pub use crate::cache::Store;
pub use crate::config::AppConfig;
pub use crate::error::{ScrapeError, ScrapeResult};
pub use crate::scheduler::{Scheduler, SchedulerHandle};
