use std::{process::ExitCode, sync::Arc};

use tokio_util::sync::CancellationToken;

use ltb_core::{config::Config, corpus::Corpus};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    ltb_core::logging::init("ltb")?;

    // Both checks happen before any network traffic.
    let cfg = Arc::new(Config::load()?);
    let total = Corpus::new(cfg.corpus_path.clone())
        .preflight()
        .map_err(ltb_core::Error::from)?;
    tracing::info!(examples = total, "corpus loaded");

    ltb_telegram::router::run_polling(cfg, CancellationToken::new())
        .await
        .map_err(|e| ltb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
