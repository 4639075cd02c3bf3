#![forbid(unsafe_code)]

pub mod config;
pub mod fetcher;
pub mod monitor;
pub mod notifier;

pub use config::MonitorConfig;
pub use fetcher::{
    extract_status, fetch_or_absent, ExtractError, FetchError, HttpStatusFetcher, StatusSource,
    STATUS_SELECTOR,
};
pub use monitor::{MonitorLoop, Status, StatusTracker, Transition};
pub use notifier::{Notifier, NotifyError, TelegramNotifier, DEFAULT_TELEGRAM_API};
