use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use ltb_core::{config::Config, dispatch::MessageDispatcher, messaging::port::MessagingPort};

use crate::{failure, handlers, TelegramMessenger};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Polls Telegram until `shutdown` is cancelled (by an authorized `/admin`).
///
/// Updates from different chats are handled concurrently; in-flight updates
/// finish before this returns.
pub async fn run_polling(cfg: Arc<Config>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => tracing::info!("ltb started: @{}", me.username()),
        Err(e) => failure::classify(&e).log(),
    }
    tracing::info!(
        corpus = %cfg.corpus_path.display(),
        renderer = %cfg.renderer.base_url,
        "Serving..."
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        dispatcher: Arc::new(MessageDispatcher::new(cfg.clone(), shutdown.clone())),
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build();

    let polling = dispatcher.shutdown_token();
    let watcher = tokio::spawn(async move {
        shutdown.cancelled().await;
        tracing::info!("stopping polling");
        match polling.shutdown() {
            Ok(done) => done.await,
            Err(e) => tracing::warn!("dispatcher was not running: {e:?}"),
        }
    });

    dispatcher.dispatch().await;
    watcher.abort();

    tracing::info!("Ended.");
    Ok(())
}
