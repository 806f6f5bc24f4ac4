//! Command routing and handlers.
//!
//! `Command::parse` classifies a message against a static table; the
//! dispatcher logs every update once, runs exactly one handler and delivers
//! its reply through a `MessagingPort`.

use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    corpus::Corpus,
    errors::Error,
    formatting::{code_block, escape_markdown},
    messaging::{
        port::MessagingPort,
        types::{IncomingMessage, Reply},
    },
    render::{RenderKind, RenderRequest},
    security::AdminGate,
    Result,
};

pub const EXAMPLE_LATEX: &str = r"x = \frac{-b \pm \sqrt{b^2 - 4ac}}{2a}";

const SHUTDOWN_TEXT: &str = "*Shutting down.* Finishing in-flight updates, then stopping.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Welcome,
    Render(RenderKind),
    Random,
    Admin,
    /// Plain text: the whole message is LaTeX.
    Catchall,
}

impl Route {
    pub fn name(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Render(RenderKind::Linked) => "link",
            Self::Render(_) => "render",
            Self::Random => "random",
            Self::Admin => "admin",
            Self::Catchall => "latex",
        }
    }
}

/// Recognized command tokens, longest first.
pub const COMMANDS: &[(&str, Route)] = &[
    ("/random", Route::Random),
    ("/start", Route::Welcome),
    ("/admin", Route::Admin),
    ("/help", Route::Welcome),
    ("/link", Route::Render(RenderKind::Linked)),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command<'a> {
    pub route: Route,
    pub token: Option<&'static str>,
    /// Text after the token (and any `@botname`), leading whitespace removed.
    /// For the catch-all this is the full message text.
    pub args: &'a str,
}

impl<'a> Command<'a> {
    pub fn parse(text: &'a str) -> Self {
        for &(token, route) in COMMANDS {
            if let Some(args) = match_token(text, token) {
                return Self {
                    route,
                    token: Some(token),
                    args,
                };
            }
        }
        Self {
            route: Route::Catchall,
            token: None,
            args: text,
        }
    }
}

/// `token` must be followed by end of text, whitespace, or `@botname`.
fn match_token<'a>(text: &'a str, token: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(token)?;
    let rest = match rest.strip_prefix('@') {
        Some(mention) => {
            let end = mention
                .find(char::is_whitespace)
                .unwrap_or(mention.len());
            if end == 0 {
                return None;
            }
            &mention[end..]
        }
        None => rest,
    };
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

/// What a handler asks the dispatcher to do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Outcome {
    reply: Option<Reply>,
    shutdown: bool,
}

impl Outcome {
    fn reply(reply: Reply) -> Self {
        Self {
            reply: Some(reply),
            shutdown: false,
        }
    }

    fn silent() -> Self {
        Self::default()
    }
}

pub struct MessageDispatcher {
    cfg: Arc<Config>,
    gate: AdminGate,
    corpus: Corpus,
    shutdown: CancellationToken,
}

impl MessageDispatcher {
    pub fn new(cfg: Arc<Config>, shutdown: CancellationToken) -> Self {
        Self {
            gate: AdminGate::new(cfg.admin_handle.clone()),
            corpus: Corpus::new(cfg.corpus_path.clone()),
            cfg,
            shutdown,
        }
    }

    /// Token cancelled when an authorized `/admin` arrives.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Handles one update and absorbs any failure after logging it.
    pub async fn handle_update(&self, msg: &IncomingMessage, port: &dyn MessagingPort) {
        if let Err(e) = self.dispatch(msg, port).await {
            log_failure(&e);
        }
    }

    pub async fn dispatch(&self, msg: &IncomingMessage, port: &dyn MessagingPort) -> Result<()> {
        let command = Command::parse(&msg.text);
        log_dispatch(msg, &command);

        let outcome = self.run(msg, &command)?;

        let delivered = match &outcome.reply {
            Some(reply) => port.deliver(msg.chat_id, reply).await,
            None => Ok(()),
        };

        if outcome.shutdown {
            tracing::info!(sender = %msg.sender.display_name, "shutdown requested");
            self.shutdown.cancel();
        }

        delivered
    }

    fn run(&self, msg: &IncomingMessage, command: &Command<'_>) -> Result<Outcome> {
        match command.route {
            Route::Welcome => Ok(Outcome::reply(Reply::Markdown(welcome_text(
                &msg.sender.display_name,
            )))),
            Route::Render(kind) => Ok(self.render(command.args, kind)),
            Route::Random => {
                let example = self.corpus.sample()?;
                tracing::debug!(index = example.index, "sampled example");
                Ok(self.render(example.text.trim_end(), RenderKind::Random))
            }
            Route::Admin => Ok(self.admin(msg)),
            Route::Catchall => Ok(self.render(command.args, RenderKind::Standard)),
        }
    }

    fn render(&self, text: &str, kind: RenderKind) -> Outcome {
        let image = RenderRequest::new(text, kind).build(&self.cfg.renderer);
        Outcome::reply(Reply::Photo(image))
    }

    fn admin(&self, msg: &IncomingMessage) -> Outcome {
        if !self.gate.is_admin(msg.sender.handle.as_deref()) {
            // No reply: do not reveal that the command exists.
            tracing::info!(
                sender = %msg.sender.display_name,
                user_id = msg.sender.id.0,
                "admin command denied"
            );
            return Outcome::silent();
        }
        Outcome {
            reply: Some(Reply::Markdown(SHUTDOWN_TEXT.to_string())),
            shutdown: true,
        }
    }
}

/// Runs before every handler body.
fn log_dispatch(msg: &IncomingMessage, command: &Command<'_>) {
    let at = Local::now().format("%Y-%m-%dT%H:%M:%S");
    tracing::info!(
        route = command.route.name(),
        chat_id = msg.chat_id.0,
        "{at} :: {}\t:: {}",
        msg.sender.display_name,
        msg.text
    );
}

fn log_failure(e: &Error) {
    match e {
        Error::Platform(report) => report.log(),
        other => tracing::error!("update failed: {other}"),
    }
}

pub fn welcome_text(first_name: &str) -> String {
    format!(
        "Hello, {name}\n\
         Type some _LaTeX_ and this bot will return a rendered image of it.\n\
         \n\
         Use   /link _(with some LaTeX)_   to also return an image link.\n\
         Use   /random   to see a random example.\n\
         \n\
         Try the following:\n\
         \n\
         {example}\n",
        name = escape_markdown(first_name),
        example = code_block(EXAMPLE_LATEX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatId, UserId},
        messaging::types::Sender,
        render::{RenderedImage, RendererConfig},
        report::{ErrorCategory, ErrorReport},
    };
    use async_trait::async_trait;
    use std::{path::PathBuf, sync::Mutex};

    #[derive(Default)]
    struct FakePort {
        sent: Mutex<Vec<(ChatId, Reply)>>,
        fail_with: Option<ErrorReport>,
    }

    impl FakePort {
        fn failing(report: ErrorReport) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(report),
            }
        }

        fn sent(&self) -> Vec<(ChatId, Reply)> {
            self.sent.lock().unwrap().clone()
        }

        fn record(&self, chat_id: ChatId, reply: Reply) -> Result<()> {
            if let Some(report) = &self.fail_with {
                return Err(Error::Platform(report.clone()));
            }
            self.sent.lock().unwrap().push((chat_id, reply));
            Ok(())
        }
    }

    #[async_trait]
    impl MessagingPort for FakePort {
        async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<()> {
            self.record(chat_id, Reply::Markdown(text.to_string()))
        }

        async fn send_photo(&self, chat_id: ChatId, image: &RenderedImage) -> Result<()> {
            self.record(chat_id, Reply::Photo(image.clone()))
        }
    }

    fn config(corpus_path: PathBuf) -> Arc<Config> {
        Arc::new(Config {
            telegram_bot_token: "test".to_string(),
            token_file: PathBuf::from("token"),
            admin_handle: "torresjrjr".to_string(),
            corpus_path,
            renderer: RendererConfig::default(),
        })
    }

    fn dispatcher() -> MessageDispatcher {
        dispatcher_with_corpus(PathBuf::from("/tmp/ltb-no-such-corpus.tex"))
    }

    fn dispatcher_with_corpus(path: PathBuf) -> MessageDispatcher {
        MessageDispatcher::new(config(path), CancellationToken::new())
    }

    fn message(handle: Option<&str>, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: ChatId(42),
            sender: Sender {
                id: UserId(7),
                display_name: "Ada".to_string(),
                handle: handle.map(str::to_string),
            },
            text: text.to_string(),
        }
    }

    fn photo(reply: &Reply) -> &RenderedImage {
        match reply {
            Reply::Photo(img) => img,
            other => panic!("expected photo, got {other:?}"),
        }
    }

    #[test]
    fn table_is_longest_first() {
        for pair in COMMANDS.windows(2) {
            assert!(pair[0].0.len() >= pair[1].0.len(), "{pair:?}");
        }
    }

    #[test]
    fn routes_known_commands() {
        assert_eq!(Command::parse("/start").route, Route::Welcome);
        assert_eq!(Command::parse("/help").route, Route::Welcome);
        assert_eq!(Command::parse("/random").route, Route::Random);
        assert_eq!(Command::parse("/admin").route, Route::Admin);
        assert_eq!(
            Command::parse("/link").route,
            Route::Render(RenderKind::Linked)
        );
    }

    #[test]
    fn link_argument_is_the_remainder() {
        let cmd = Command::parse("/link x=1");
        assert_eq!(cmd.route, Route::Render(RenderKind::Linked));
        assert_eq!(cmd.token, Some("/link"));
        assert_eq!(cmd.args, "x=1");
    }

    #[test]
    fn unknown_command_falls_through_with_full_text() {
        let cmd = Command::parse("/unknown foo");
        assert_eq!(cmd.route, Route::Catchall);
        assert_eq!(cmd.token, None);
        assert_eq!(cmd.args, "/unknown foo");
    }

    #[test]
    fn tokens_need_a_boundary() {
        assert_eq!(Command::parse("/linkx 1").route, Route::Catchall);
        assert_eq!(Command::parse("/randomize").route, Route::Catchall);
        assert_eq!(Command::parse("/Start").route, Route::Catchall);
        assert_eq!(Command::parse(" /start").route, Route::Catchall);
        assert_eq!(Command::parse("/start@").route, Route::Catchall);
    }

    #[test]
    fn bot_mentions_are_accepted() {
        let cmd = Command::parse("/link@TexBot a+b");
        assert_eq!(cmd.route, Route::Render(RenderKind::Linked));
        assert_eq!(cmd.args, "a+b");
        assert_eq!(Command::parse("/start@TexBot").route, Route::Welcome);
    }

    #[test]
    fn welcome_mentions_commands_and_escapes_name() {
        let text = welcome_text("snake_case");
        assert!(text.starts_with("Hello, snake\\_case\n"));
        assert!(text.contains("/link"));
        assert!(text.contains("/random"));
        assert!(text.contains(EXAMPLE_LATEX));
    }

    #[tokio::test]
    async fn start_and_help_send_the_welcome() {
        let d = dispatcher();
        for text in ["/start", "/help"] {
            let port = FakePort::default();
            d.dispatch(&message(None, text), &port).await.unwrap();
            assert_eq!(
                port.sent(),
                vec![(ChatId(42), Reply::Markdown(welcome_text("Ada")))]
            );
        }
    }

    #[tokio::test]
    async fn plain_text_is_rendered() {
        let d = dispatcher();
        let port = FakePort::default();
        d.dispatch(&message(None, r"\sqrt{2}"), &port).await.unwrap();

        let sent = port.sent();
        assert_eq!(sent.len(), 1);
        let img = photo(&sent[0].1);
        assert_eq!(img.caption, "`\\sqrt{2}`");
        assert!(img.image_url.ends_with("%5Csqrt%7B2%7D"));
    }

    #[tokio::test]
    async fn unknown_command_is_rendered_whole() {
        let d = dispatcher();
        let port = FakePort::default();
        d.dispatch(&message(None, "/unknown foo"), &port).await.unwrap();
        assert_eq!(photo(&port.sent()[0].1).caption, "`/unknown foo`");
    }

    #[tokio::test]
    async fn link_includes_url_in_caption() {
        let d = dispatcher();
        let port = FakePort::default();
        d.dispatch(&message(None, "/link x=1"), &port).await.unwrap();

        let sent = port.sent();
        let img = photo(&sent[0].1);
        assert!(img.caption.starts_with("`x=1`\n"));
        assert!(img.caption.ends_with(&img.image_url));
        assert!(img.image_url.ends_with("&space;x%3D1"));
    }

    #[tokio::test]
    async fn link_renders_the_parsed_argument() {
        let d = dispatcher();
        for (text, latex) in [
            ("/link@TexBot  y", "y"),
            ("/link\n\tx=1", "x=1"),
            ("/link", ""),
        ] {
            let port = FakePort::default();
            d.dispatch(&message(None, text), &port).await.unwrap();
            let sent = port.sent();
            let img = photo(&sent[0].1);
            assert_eq!(img.caption, format!("`{latex}`\n{}", img.image_url), "{text:?}");
            assert_eq!(Command::parse(text).args, latex);
        }
    }

    #[tokio::test]
    async fn random_renders_a_corpus_example() {
        let path = PathBuf::from(format!("/tmp/ltb-dispatch-corpus-{}.tex", std::process::id()));
        std::fs::write(&path, "%TOTAL 1\n%BEGIN 1\na^2 + b^2 = c^2\n%END 1\n").unwrap();

        let d = dispatcher_with_corpus(path.clone());
        let port = FakePort::default();
        d.dispatch(&message(None, "/random"), &port).await.unwrap();

        let img = photo(&port.sent()[0].1).clone();
        assert_eq!(img.caption, "`a^2 + b^2 = c^2`");
        assert!(!img.caption.contains("http"));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn random_with_missing_corpus_is_an_error_without_reply() {
        let d = dispatcher();
        let port = FakePort::default();
        let err = d.dispatch(&message(None, "/random"), &port).await.unwrap_err();
        assert!(matches!(err, Error::Corpus(_)));
        assert!(port.sent().is_empty());
    }

    #[tokio::test]
    async fn admin_confirms_then_cancels() {
        let d = dispatcher();
        let token = d.shutdown_token();
        let port = FakePort::default();

        d.dispatch(&message(Some("torresjrjr"), "/admin"), &port)
            .await
            .unwrap();

        assert_eq!(
            port.sent(),
            vec![(ChatId(42), Reply::Markdown(SHUTDOWN_TEXT.to_string()))]
        );
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn admin_denial_is_silent() {
        let d = dispatcher();
        for handle in [None, Some("TORRESJRJR"), Some("someone")] {
            let port = FakePort::default();
            d.dispatch(&message(handle, "/admin"), &port).await.unwrap();
            assert!(port.sent().is_empty());
        }
        assert!(!d.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn admin_still_shuts_down_when_confirmation_fails() {
        let d = dispatcher();
        let port = FakePort::failing(ErrorReport::new(ErrorCategory::NetworkError, "down"));
        let err = d
            .dispatch(&message(Some("torresjrjr"), "/admin"), &port)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Platform(_)));
        assert!(d.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn handle_update_swallows_platform_errors() {
        let d = dispatcher();
        let port = FakePort::failing(ErrorReport::new(ErrorCategory::Unauthorized, "bot blocked"));
        // Must not panic or propagate.
        d.handle_update(&message(None, "x"), &port).await;
        d.handle_update(&message(None, "/random"), &port).await;
        assert!(!d.shutdown_token().is_cancelled());
    }
}
