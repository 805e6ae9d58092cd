//! Headless driver for the editor core.
//!
//! Loads a markdown file into an editor session backed by on-disk storage,
//! saves it, and prints the session snapshot as JSON. With `--share` it also
//! prints a shareable URL for the document.

use anyhow::{Context, Result, anyhow};
use markpad::clock::now_ms;
use markpad::config::load_config;
use markpad::render::MarkdownRenderer;
use markpad::session::{EditorSession, SessionCommand};
use markpad::share::{SharedDocument, can_share_via_url, encode_document, share_url};
use markpad::storage::FileStorage;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_SHARE_BASE: &str = "https://markpad.local/";

struct Args {
    path: PathBuf,
    share: bool,
    base_url: String,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %args.path.display(),
        level = %config.log_level,
        storage = %config.storage_dir,
        "Starting markpad"
    );

    let storage = FileStorage::new(&config.storage_dir);
    let mut session: EditorSession<FileStorage> = EditorSession::new(
        config,
        storage,
        Box::new(MarkdownRenderer::new()),
        now_ms(),
    );
    if let Some(recovered) = session.recoverable() {
        info!(
            chars = recovered.metadata.character_count,
            words = recovered.metadata.word_count,
            saved_at = recovered.metadata.timestamp,
            "Found recoverable content from a previous session"
        );
    }

    let content = fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    session.apply(SessionCommand::Edit { content }, now_ms());
    session.render_now(now_ms());
    let event = session.apply(SessionCommand::SaveNow, now_ms());
    if let Some(message) = &event.snapshot.save.error {
        warn!(%message, "Document was not saved");
    }

    let json = serde_json::to_string_pretty(&event.snapshot)
        .context("Failed to serialize session snapshot")?;
    println!("{json}");

    if args.share {
        let title = args
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        let document = SharedDocument::new(session.content(), title, now_ms());
        let token = encode_document(&document).context("Failed to encode share payload")?;
        if !can_share_via_url(&args.base_url, &token) {
            warn!(
                token_len = token.len(),
                "Document is too large to share reliably by URL"
            );
        }
        println!("{}", share_url(&args.base_url, &token));
    }
    Ok(())
}

fn parse_args() -> Result<Args> {
    let usage = || anyhow!("Usage: markpad <file.md> [--share] [--base-url <url>]");
    let mut path = None;
    let mut share = false;
    let mut base_url = DEFAULT_SHARE_BASE.to_string();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--share" => share = true,
            "--base-url" => base_url = args.next().ok_or_else(usage)?,
            _ if path.is_none() && !arg.starts_with("--") => path = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    let path = path.ok_or_else(usage)?;
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }
    Ok(Args {
        path,
        share,
        base_url,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
