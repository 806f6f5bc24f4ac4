//! Telegram update handlers.
//!
//! Text messages are converted into the core `IncomingMessage` and handed to
//! the dispatcher. Failures never leave this boundary.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use ltb_core::{
    domain::{ChatId, UserId},
    messaging::types::{IncomingMessage, Sender},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = incoming_message(&msg) else {
        // Stickers, photos, service messages, channel posts: nothing to render.
        return Ok(());
    };

    state
        .dispatcher
        .handle_update(&incoming, state.messenger.as_ref())
        .await;

    Ok(())
}

fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let user = msg.from()?;

    Some(IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        sender: Sender {
            id: UserId(user.id.0 as i64),
            display_name: user.first_name.clone(),
            handle: user.username.clone(),
        },
        text: text.to_string(),
    })
}
