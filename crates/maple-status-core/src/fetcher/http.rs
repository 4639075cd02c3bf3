use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{extract_status, FetchError, StatusSource};
use crate::monitor::Status;

const USER_AGENT: &str = concat!("maple-status/", env!("CARGO_PKG_VERSION"));

/// Scrapes the status indicator from a live page. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: Client,
}

impl HttpStatusFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(Self::build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &crate::config::MonitorConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.request_timeout)
    }

    /// Client shared by the fetcher and the notifier. `timeout` bounds each request end to end.
    pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
    }
}

#[async_trait]
impl StatusSource for HttpStatusFetcher {
    async fn fetch(&self, url: &str) -> Result<Status, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        debug!(url, bytes = body.len(), "Fetched status page");

        extract_status(&body).map_err(|source| FetchError::Extract {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"<!DOCTYPE html>
<html><head><title>MapleLegends</title></head>
<body>
  <div class="status">Server is <font id="server_status" color="#00ff00"> ONLINE </font></div>
</body></html>"##;

    fn fetcher() -> HttpStatusFetcher {
        HttpStatusFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_status_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let status = fetcher().fetch(&format!("{}/", server.uri())).await.unwrap();
        assert_eq!(status.as_str(), "ONLINE");
    }

    #[tokio::test]
    async fn fetch_reports_missing_indicator() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>redesigned</body></html>"),
            )
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert!(err.is_extraction(), "{}", err);
    }

    #[tokio::test]
    async fn fetch_returns_http_error_without_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpStatusFetcher::new(Duration::from_millis(100)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "{}", err);
    }

    #[tokio::test]
    async fn fetch_reports_network_error() {
        // Nothing listens on port 1.
        let err = fetcher().fetch("http://127.0.0.1:1/").await.unwrap_err();
        assert!(
            matches!(err, FetchError::Network { .. } | FetchError::Timeout { .. }),
            "{}",
            err
        );
    }

    #[tokio::test]
    async fn fetch_or_absent_is_none_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let status = crate::fetcher::fetch_or_absent(&fetcher(), &server.uri()).await;
        assert!(status.is_none());
    }
}
