use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NotifyError, Notifier};

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Bot API envelope. Only the fields needed to tell success from failure.
#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API notifier. One `sendMessage` call per notification, no retries.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self::with_api_base(client, DEFAULT_TELEGRAM_API, token)
    }

    pub fn with_api_base(
        client: Client,
        api_base: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

// The token is part of every request URL, keep it out of Debug output.
impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: destination,
            text,
        };

        // reqwest errors carry the request URL, which embeds the token.
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Network {
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        let envelope = response.json::<ApiResponse>().await.ok();

        match envelope {
            Some(envelope) if status.is_success() && envelope.ok => {
                debug!(chat_id = destination, "Telegram message sent");
                Ok(())
            }
            Some(envelope) if status.is_success() => Err(NotifyError::Rejected {
                description: envelope
                    .description
                    .unwrap_or_else(|| "ok=false without description".to_string()),
            }),
            None if status.is_success() => Err(NotifyError::Rejected {
                description: "unreadable response body".to_string(),
            }),
            envelope => Err(NotifyError::Http {
                status: status.as_u16(),
                description: envelope
                    .and_then(|e| e.description)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123456:SECRET-token";

    fn notifier(api_base: &str) -> TelegramNotifier {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        TelegramNotifier::with_api_base(client, api_base, TOKEN)
    }

    #[tokio::test]
    async fn send_posts_chat_id_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_json(serde_json::json!({
                "chat_id": "-1001",
                "text": "MapleLegends server status changed: Offline",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ok": true, "result": {} })),
            )
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server.uri())
            .send("-1001", "MapleLegends server status changed: Offline")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_surfaces_api_description_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = notifier(&server.uri()).send("42", "hi").await.unwrap_err();
        match err {
            NotifyError::Http {
                status,
                description,
            } => {
                assert_eq!(status, 400);
                assert!(description.contains("chat not found"), "{}", description);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn send_rejects_ok_false_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Forbidden: bot was blocked by the user",
            })))
            .mount(&server)
            .await;

        let err = notifier(&server.uri()).send("42", "hi").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { .. }), "{}", err);
    }

    #[tokio::test]
    async fn send_falls_back_to_reason_phrase_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = notifier(&server.uri()).send("42", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error 502 from chat API: Bad Gateway");
    }

    #[tokio::test]
    async fn network_errors_do_not_leak_token() {
        let err = notifier("http://127.0.0.1:1")
            .send("42", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Network { .. }), "{}", err);
        assert!(!err.to_string().contains("SECRET"), "{}", err);
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", notifier("https://api.telegram.org/"));
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("https://api.telegram.org\""));
    }
}
