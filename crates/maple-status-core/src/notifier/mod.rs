mod telegram;

pub use telegram::{TelegramNotifier, DEFAULT_TELEGRAM_API};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error {status} from chat API: {description}")]
    Http { status: u16, description: String },
    #[error("Request to chat API failed: {reason}")]
    Network { reason: String },
    #[error("Chat API rejected message: {description}")]
    Rejected { description: String },
}

/// Delivers a plain-text message to a chat destination.
///
/// Callers log and drop failures; a notifier never panics on delivery errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError>;
}
