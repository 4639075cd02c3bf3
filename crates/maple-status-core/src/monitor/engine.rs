use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::fetcher::{fetch_or_absent, StatusSource};
use crate::monitor::state::{Status, StatusTracker, Transition};
use crate::notifier::Notifier;

/// Polls the status page on a fixed interval and relays transitions to a chat.
///
/// Owns all mutable state; everything runs on the caller's task. The only
/// suspension points are the fetch and the interval sleep.
pub struct MonitorLoop {
    config: MonitorConfig,
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    destination: String,
    tracker: StatusTracker,
}

impl MonitorLoop {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            config,
            source,
            notifier,
            destination: destination.into(),
            tracker: StatusTracker::new(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn last_status(&self) -> Option<&Status> {
        self.tracker.last_status()
    }

    /// Startup check: fetch once and announce whatever is found.
    pub async fn check_initial(&mut self) -> Transition {
        let observed = fetch_or_absent(&*self.source, &self.config.url).await;
        let transition = self.tracker.observe_initial(observed);
        self.dispatch(&transition).await;
        transition
    }

    /// One steady-state poll, without the interval wait.
    pub async fn poll_once(&mut self) -> Transition {
        let observed = fetch_or_absent(&*self.source, &self.config.url).await;
        let transition = self.tracker.observe(observed);
        self.dispatch(&transition).await;
        transition
    }

    /// Startup check, then poll forever. Never returns; stop it by dropping the future.
    pub async fn run(&mut self) {
        info!(
            url = %self.config.url,
            interval_secs = self.config.poll_interval.as_secs(),
            "Starting MapleLegends server status monitor"
        );

        self.check_initial().await;

        loop {
            tokio::time::sleep(self.config.poll_interval).await;
            self.poll_once().await;
        }
    }

    async fn dispatch(&self, transition: &Transition) {
        let delivered = match transition.message() {
            Some(text) => self.send(&text).await,
            None => false,
        };

        match transition {
            Transition::Initial(status) if delivered => {
                info!(status = %status, "Initial server status sent");
            }
            Transition::Initial(status) => {
                warn!(status = %status, "Initial server status recorded, notification not delivered");
            }
            Transition::Changed { previous, current } => {
                info!(
                    previous = %previous,
                    current = %current,
                    delivered,
                    "Server status changed"
                );
            }
            Transition::Learned(status) => {
                info!(status = %status, "Server status known again, recorded without notification");
            }
            Transition::Recovered(status) => {
                info!(status = %status, "Server status available again, unchanged");
            }
            Transition::Unchanged(status) => {
                debug!(status = %status, "Server status unchanged");
            }
            Transition::Unavailable if self.tracker.last_status().is_none() => {
                warn!("Could not fetch server status, no status known yet");
            }
            Transition::Unavailable => {
                warn!("Failed to retrieve server status");
            }
        }
    }

    /// Deliver one message. Failures are logged here and reported as `false`.
    async fn send(&self, text: &str) -> bool {
        match self.notifier.send(&self.destination, text).await {
            Ok(()) => {
                debug!(destination = %self.destination, "Notification delivered");
                true
            }
            Err(e) => {
                error!(
                    destination = %self.destination,
                    error = %e,
                    "Error sending message"
                );
                false
            }
        }
    }
}
