use async_trait::async_trait;

use crate::{domain::ChatId, messaging::types::Reply, render::RenderedImage, Result};

/// Outbound side of a messenger.
///
/// Text is sent as Telegram-flavoured (legacy) Markdown; photos are passed by
/// URL and fetched by the platform.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<()>;

    async fn send_photo(&self, chat_id: ChatId, image: &RenderedImage) -> Result<()>;

    async fn deliver(&self, chat_id: ChatId, reply: &Reply) -> Result<()> {
        match reply {
            Reply::Markdown(text) => self.send_markdown(chat_id, text).await,
            Reply::Photo(image) => self.send_photo(chat_id, image).await,
        }
    }
}
