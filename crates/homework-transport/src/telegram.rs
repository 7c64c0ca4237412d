//! Notifier backed by the Telegram Bot API.

use async_trait::async_trait;
use homework_watcher::{Notifier, WatchConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::TransportError;

/// Body of a `sendMessage` call.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API reply is wrapped in.
#[derive(Debug, Deserialize)]
struct BotApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages to one fixed chat through a Telegram bot.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("chat_id", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Creates a notifier with its own connection pool.
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self::with_client(Client::new(), api_url, token, chat_id)
    }

    /// Creates a notifier sharing an existing connection pool.
    #[must_use]
    pub fn with_client(
        client: Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Creates a notifier from the bot settings in `config`.
    #[must_use]
    pub fn from_config(client: Client, config: &WatchConfig) -> Self {
        Self::with_client(
            client,
            &config.telegram_api_url,
            &config.telegram_token,
            &config.telegram_chat_id,
        )
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.token
        )
    }

    /// Posts `text` to the configured chat.
    ///
    /// The request URL embeds the bot token, so it is stripped from any
    /// error before it is returned.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the request fails,
    /// `TransportError::Rejected` if the Bot API refuses the message, and
    /// `TransportError::UnexpectedStatus` / `TransportError::Decode` if the
    /// reply cannot be interpreted.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn send_message(&self, text: &str) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?;

        let status = response.status();
        let reply = response.json::<BotApiReply>().await.ok();

        match reply {
            Some(reply) if status.is_success() && reply.ok => {
                debug!("Telegram accepted message");
                Ok(())
            }
            Some(reply) => Err(TransportError::Rejected {
                status: status.as_u16(),
                description: reply
                    .description
                    .unwrap_or_else(|| "no description given".to_string()),
            }),
            None if status.is_success() => Err(TransportError::Decode(
                "reply is not a Bot API envelope".to_string(),
            )),
            None => Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> homework_watcher::Result<()> {
        self.send_message(text)
            .await
            .map_err(TransportError::into_delivery_error)
    }
}
