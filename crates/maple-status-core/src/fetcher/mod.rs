mod http;

pub use http::HttpStatusFetcher;

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{error, warn};

use crate::monitor::Status;

/// CSS selector for the status indicator: the first `<font id="server_status">`.
///
/// Tied to the current MapleLegends front page markup. If the site moves the
/// indicator to another tag or id, this is the only place that needs to change.
pub const STATUS_SELECTOR: &str = "font#server_status";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no element matches `{0}`")]
    MissingElement(&'static str),
    #[error("element matching `{0}` has no text")]
    EmptyText(&'static str),
    #[error("invalid selector `{selector}`: {reason}")]
    Selector {
        selector: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {status} fetching {url}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("Timeout fetching {url}")]
    Timeout { url: String },
    #[error("Failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },
    #[error("Status not found on {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: ExtractError,
    },
}

impl FetchError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the page was fetched but did not carry a usable status.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extract { .. })
    }
}

/// Source of the current server status.
///
/// The HTTP implementation scrapes the live page; tests substitute scripted
/// sources. Object-safe and Send + Sync so the monitor can hold it behind an `Arc`.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Status, FetchError>;
}

/// Pull the trimmed text of the first [`STATUS_SELECTOR`] match out of a page.
pub fn extract_status(html: &str) -> Result<Status, ExtractError> {
    let selector = Selector::parse(STATUS_SELECTOR).map_err(|e| ExtractError::Selector {
        selector: STATUS_SELECTOR,
        reason: e.to_string(),
    })?;

    let document = Html::parse_document(html);
    let element = document
        .select(&selector)
        .next()
        .ok_or(ExtractError::MissingElement(STATUS_SELECTOR))?;

    let text: String = element.text().collect();
    Status::new(text).ok_or(ExtractError::EmptyText(STATUS_SELECTOR))
}

/// Fetch once and collapse every failure into absence.
///
/// Failures are logged here and never reach the caller: a page without the
/// indicator is a warning, anything on the transport side is an error.
pub async fn fetch_or_absent(source: &dyn StatusSource, url: &str) -> Option<Status> {
    match source.fetch(url).await {
        Ok(status) => Some(status),
        Err(e) if e.is_extraction() => {
            warn!(url, error = %e, "Server status tag not found on the page");
            None
        }
        Err(e) => {
            error!(url, error = %e, "Error fetching server status");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Result<&'static str, fn() -> FetchError>);

    #[async_trait]
    impl StatusSource for FixedSource {
        async fn fetch(&self, _url: &str) -> Result<Status, FetchError> {
            match &self.0 {
                Ok(text) => Ok(Status::new(*text).unwrap()),
                Err(make) => Err(make()),
            }
        }
    }

    #[test]
    fn extracts_trimmed_status_text() {
        let html = r#"<html><body>
            <p>Server: <font id="server_status" color="green">
                Online
            </font></p>
        </body></html>"#;
        assert_eq!(extract_status(html).unwrap().as_str(), "Online");
    }

    #[test]
    fn collects_text_from_nested_markup() {
        let html = r#"<font id="server_status"> <b>Under</b> maintenance </font>"#;
        assert_eq!(
            extract_status(html).unwrap().as_str(),
            "Under maintenance"
        );
    }

    #[test]
    fn first_match_wins() {
        let html = r#"
            <font id="server_status">Offline</font>
            <font id="server_status">Online</font>
        "#;
        assert_eq!(extract_status(html).unwrap().as_str(), "Offline");
    }

    #[test]
    fn wrong_tag_is_a_miss() {
        let html = r#"<span id="server_status">Online</span>"#;
        assert_eq!(
            extract_status(html).unwrap_err(),
            ExtractError::MissingElement(STATUS_SELECTOR)
        );
    }

    #[test]
    fn wrong_id_is_a_miss() {
        let html = r#"<font id="status">Online</font>"#;
        assert!(matches!(
            extract_status(html),
            Err(ExtractError::MissingElement(_))
        ));
    }

    #[test]
    fn whitespace_only_text_is_empty() {
        let html = "<font id=\"server_status\">  \n\t </font>";
        assert_eq!(
            extract_status(html).unwrap_err(),
            ExtractError::EmptyText(STATUS_SELECTOR)
        );
    }

    #[test]
    fn garbage_input_does_not_panic() {
        assert!(extract_status("<<<>>> not html at all </font").is_err());
        assert!(extract_status("").is_err());
    }

    #[test]
    fn status_code_only_for_http_errors() {
        let http = FetchError::Http {
            url: "https://example.com/".into(),
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(http.status_code(), Some(503));
        assert!(!http.is_extraction());

        let timeout = FetchError::Timeout {
            url: "https://example.com/".into(),
        };
        assert_eq!(timeout.status_code(), None);
    }

    #[tokio::test]
    async fn fetch_or_absent_passes_status_through() {
        let source = FixedSource(Ok("Online"));
        let status = fetch_or_absent(&source, "https://example.com/").await;
        assert_eq!(status.unwrap().as_str(), "Online");
    }

    #[tokio::test]
    async fn fetch_or_absent_swallows_errors() {
        let missing = FixedSource(Err(|| FetchError::Extract {
            url: "https://example.com/".into(),
            source: ExtractError::MissingElement(STATUS_SELECTOR),
        }));
        assert!(fetch_or_absent(&missing, "https://example.com/").await.is_none());

        let network = FixedSource(Err(|| FetchError::Network {
            url: "https://example.com/".into(),
            reason: "connection refused".into(),
        }));
        assert!(fetch_or_absent(&network, "https://example.com/").await.is_none());
    }
}
