use std::path::PathBuf;

use crate::corpus::CorpusError;
use crate::report::ErrorReport;

/// Core error type for the bot.
///
/// Adapter crates map their transport errors into `Platform` so the dispatch
/// boundary can log them by category and keep polling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error(
        "\nYou need a bot token to run an instance of this Telegram bot.\n\
         Please make a file named '{}' with your bot token on the first line.\n\
         \n\
         Learn more at t.me/botfather\n",
        .path.display()
    )]
    MissingToken { path: PathBuf },

    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Platform(ErrorReport),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
