use crate::{
    domain::{ChatId, UserId},
    render::RenderedImage,
};

/// Who sent an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub display_name: String,
    /// Telegram username without the leading `@`, if the user has one.
    pub handle: Option<String>,
}

/// One inbound text update, as seen by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub sender: Sender,
    pub text: String,
}

/// Outbound reply instruction produced by a handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Markdown(String),
    Photo(RenderedImage),
}
