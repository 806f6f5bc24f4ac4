use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use crate::{errors::Error, render::RendererConfig, Result};

pub const DEFAULT_TOKEN_FILE: &str = "token";
pub const DEFAULT_ADMIN_HANDLE: &str = "torresjrjr";
pub const DEFAULT_CORPUS_PATH: &str = "corpus/examples.tex";

/// Typed configuration, built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub token_file: PathBuf,

    // Admin
    pub admin_handle: String,

    // Examples
    pub corpus_path: PathBuf,

    // Renderer
    pub renderer: RendererConfig,
}

impl Config {
    /// Loads `.env` (if present) and then reads configuration from the
    /// process environment.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token_file = lookup("LTB_TOKEN_FILE")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));
        let telegram_bot_token = read_token(&token_file)?;

        let admin_handle =
            lookup("LTB_ADMIN_HANDLE").unwrap_or_else(|| DEFAULT_ADMIN_HANDLE.to_string());

        let corpus_path = lookup("LTB_CORPUS_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_PATH));

        let defaults = RendererConfig::default();
        let dpi = match lookup("LTB_RENDER_DPI").and_then(non_empty) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(dpi) if dpi > 0 => dpi,
                _ => {
                    return Err(Error::Config(format!(
                        "LTB_RENDER_DPI must be a positive integer, got {raw:?}"
                    )))
                }
            },
            None => defaults.dpi,
        };
        let renderer = RendererConfig {
            base_url: lookup("LTB_RENDER_BASE")
                .and_then(non_empty)
                .unwrap_or(defaults.base_url),
            format: lookup("LTB_RENDER_FORMAT")
                .and_then(non_empty)
                .unwrap_or(defaults.format),
            dpi,
        };

        Ok(Self {
            telegram_bot_token,
            token_file,
            admin_handle,
            corpus_path,
            renderer,
        })
    }
}

/// Reads the bot token from the first line of `path`.
pub fn read_token(path: &Path) -> Result<String> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::MissingToken {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let token = contents.lines().next().unwrap_or("").trim();
    if token.is_empty() {
        return Err(Error::MissingToken {
            path: path.to_path_buf(),
        });
    }
    Ok(token.to_string())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
