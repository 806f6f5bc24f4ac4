//! Telegram adapter (teloxide).
//!
//! This crate implements the `ltb-core` MessagingPort over Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

use tokio::time::sleep;

pub mod failure;
pub mod handlers;
pub mod router;

use ltb_core::{
    domain::ChatId,
    errors::Error,
    messaging::port::MessagingPort,
    render::RenderedImage,
    report::{ErrorCategory, ErrorReport},
    Result,
};

// Captions and greetings use Telegram's legacy Markdown: LaTeX inside
// backticks needs no escaping there, unlike MarkdownV2.
#[allow(deprecated)]
const MARKDOWN: ParseMode = ParseMode::Markdown;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Platform(failure::classify(&e))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
                .parse_mode(MARKDOWN)
        })
        .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, image: &RenderedImage) -> Result<()> {
        let url = url::Url::parse(&image.image_url).map_err(|e| {
            Error::Platform(ErrorReport::new(
                ErrorCategory::BadRequest,
                format!("invalid image url {:?}: {e}", image.image_url),
            ))
        })?;

        self.with_retry(|| {
            self.bot
                .send_photo(Self::tg_chat(chat_id), InputFile::url(url.clone()))
                .caption(image.caption.clone())
                .parse_mode(MARKDOWN)
        })
        .await?;
        Ok(())
    }
}
