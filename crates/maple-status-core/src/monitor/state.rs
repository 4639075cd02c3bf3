use std::fmt;

/// Scraped server status text. Always trimmed and never empty; compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Status(String);

impl Status {
    /// Trim `raw`; `None` if nothing is left.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == raw.len() {
            Some(Self(raw))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of feeding one fetch result into a [`StatusTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// First fetch at startup produced a value. Announced, but not a change.
    Initial(Status),
    /// A fetch produced a value different from the last known one.
    Changed { previous: Status, current: Status },
    /// First value recorded by the polling loop itself, arriving after a
    /// failed fetch: nothing known yet, or only the startup value. Recorded
    /// without notifying.
    Learned(Status),
    /// A value arrived after a failed fetch and matches the last known one.
    Recovered(Status),
    /// Same value as the previous fetch.
    Unchanged(Status),
    /// Fetch produced nothing. Tracked state is left as it was.
    Unavailable,
}

impl Transition {
    /// Chat message for transitions that notify. Only `Initial` and `Changed` do.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Initial(status) => Some(format!("Initial MapleLegends server status: {status}")),
            Self::Changed { current, .. } => {
                Some(format!("MapleLegends server status changed: {current}"))
            }
            _ => None,
        }
    }

    pub fn notifies(&self) -> bool {
        matches!(self, Self::Initial(_) | Self::Changed { .. })
    }
}

/// Last-known-status bookkeeping for the monitor loop.
///
/// Any difference from the last known value is a change, with one exception:
/// until the polling loop has recorded a value of its own, a value arriving
/// after a failed fetch is taken silently. That covers a failed startup fetch
/// and an outage right after the startup announcement.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    last_status: Option<Status>,
    last_fetch_ok: bool,
    // Set by the first successful steady-state fetch, never cleared.
    steady_seen: bool,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<&Status> {
        self.last_status.as_ref()
    }

    /// Startup fetch. A present value seeds the tracker and is announced.
    pub fn observe_initial(&mut self, observed: Option<Status>) -> Transition {
        match observed {
            Some(status) => {
                self.last_status = Some(status.clone());
                self.last_fetch_ok = true;
                Transition::Initial(status)
            }
            None => {
                self.last_fetch_ok = false;
                Transition::Unavailable
            }
        }
    }

    /// Every fetch after startup.
    pub fn observe(&mut self, observed: Option<Status>) -> Transition {
        let Some(current) = observed else {
            self.last_fetch_ok = false;
            return Transition::Unavailable;
        };

        let after_success = std::mem::replace(&mut self.last_fetch_ok, true);
        let steady_seen = std::mem::replace(&mut self.steady_seen, true);
        match self.last_status.take() {
            Some(previous) if previous == current => {
                self.last_status = Some(previous);
                if after_success {
                    Transition::Unchanged(current)
                } else {
                    Transition::Recovered(current)
                }
            }
            Some(previous) if after_success || steady_seen => {
                self.last_status = Some(current.clone());
                Transition::Changed { previous, current }
            }
            _ => {
                self.last_status = Some(current.clone());
                Transition::Learned(current)
            }
        }
    }
}
