//! Headless terminal client for the companion backend.
//!
//! Reads chat lines and slash commands from stdin, prints the transcript,
//! connection status and animation changes.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use companion_client::{Applied, ChatEntry, CompanionSession, SessionUpdate};
use companion_connection::{ConnectionIdentity, Reachability, probe};
use companion_store::{JsonFileStore, KeyValueStore, default_store_path};
use companion_visual::VisualState;

use crate::commands::{Command, HELP};
use crate::config::CompanionConfig;

/// Terminal companion client.
#[derive(Parser, Debug)]
#[command(name = "companion", about = "Chat with the companion from a terminal")]
struct Cli {
    /// Backend URL, e.g. http://localhost:8000 (saved for next time).
    #[arg(long)]
    host: Option<String>,

    /// Chat session id (saved for next time).
    #[arg(long)]
    session: Option<String>,

    /// Settings file [default: $XDG_CONFIG_HOME/companion/settings.json].
    #[arg(long)]
    store: Option<PathBuf>,

    /// Skip the startup reachability probe.
    #[arg(long)]
    no_health_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,companion=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store_path = cli
        .store
        .or_else(default_store_path)
        .context("no config directory found, pass --store")?;
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("failed to open settings: {}", store_path.display()))?;

    let mut config = CompanionConfig::load(&store);
    if let Some(host) = cli.host {
        config.host_url = host;
    }
    if let Some(session) = cli.session {
        config.session_id = session;
    }
    config.save(&store)?;
    info!(host = %config.host_url, session = %config.session_id, "starting");

    if !cli.no_health_check {
        match probe(&config.host_url).await {
            Reachability::Reachable => info!("backend reachable"),
            Reachability::Unreachable => {
                warn!(host = %config.host_url, "backend unreachable, connecting anyway")
            }
        }
    }

    let identity = config.identity();
    if !identity.is_complete() {
        warn!("host or session id is empty, staying disconnected");
    }
    let mut session = CompanionSession::websocket(identity, config.visual_state());
    spawn_visual_logger(session.visual().subscribe());
    session.connect();

    run(&mut session, &mut config, &store).await?;

    session.disconnect();
    Ok(())
}

/// Main loop: stdin lines, incoming updates and status changes.
async fn run(
    session: &mut CompanionSession,
    config: &mut CompanionConfig,
    store: &dyn KeyValueStore,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status_rx = session.subscribe_status();
    println!("[status] {}", session.status());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(Some(cmd)) => {
                        let session_before = session.identity().session_id().to_string();
                        if !execute(session, config, store, cmd)? {
                            break;
                        }
                        if session.identity().session_id() != session_before {
                            status_rx = session.subscribe_status();
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }

            update = session.next_update() => {
                match update {
                    Some(update) => print_update(&update),
                    None => break,
                }
            }

            changed = status_rx.changed() => {
                if changed.is_err() {
                    status_rx = session.subscribe_status();
                    continue;
                }
                let status = *status_rx.borrow_and_update();
                println!("[status] {status}");
            }
        }
    }
    Ok(())
}

/// Runs one command. Returns `false` to quit.
fn execute(
    session: &mut CompanionSession,
    config: &mut CompanionConfig,
    store: &dyn KeyValueStore,
    cmd: Command,
) -> Result<bool> {
    match cmd {
        Command::Send(text) => {
            if let Err(e) = session.send_text(&text) {
                println!("[not sent] {e}");
            } else if let Some(entry) = session.transcript().last() {
                print_entry(entry);
            }
        }
        Command::Connect => session.connect(),
        Command::Disconnect => session.disconnect(),
        Command::Reconnect => session.reconnect(),
        Command::Session(id) => {
            let identity = ConnectionIdentity::new(&config.host_url, &id);
            if !identity.is_complete() {
                println!("invalid session id: {id:?}");
                return Ok(true);
            }
            config.session_id = identity.session_id().to_string();
            config.save(store)?;
            session.switch_identity(identity);
            println!("[session] {}", config.session_id);
        }
        Command::Style(style) => {
            session.visual_mut().set_render_style(style);
            save_visual(session, config, store)?;
        }
        Command::Size(size) => {
            session.visual_mut().set_size(size);
            save_visual(session, config, store)?;
        }
        Command::Character(character) => {
            session.visual_mut().set_character(character);
            save_visual(session, config, store)?;
        }
        Command::Hide => {
            session.visual_mut().set_visible(false);
            save_visual(session, config, store)?;
        }
        Command::Show => {
            session.visual_mut().set_visible(true);
            save_visual(session, config, store)?;
        }
        Command::Status => {
            let visual = session.visual().snapshot();
            println!(
                "[status] {} (retries {}), session {}, anim {}, emotion {} ({:+.2}, {:+.2})",
                session.status(),
                session.retry_count(),
                session.identity().session_id(),
                visual.anim_state,
                visual.emotion.label,
                visual.emotion.valence,
                visual.emotion.arousal,
            );
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn save_visual(
    session: &CompanionSession,
    config: &mut CompanionConfig,
    store: &dyn KeyValueStore,
) -> Result<()> {
    config.update_from_visual(session.visual().snapshot());
    config.save(store)
}

fn print_update(update: &SessionUpdate) {
    if let Applied::Entry(entry) = &update.applied {
        print_entry(entry);
    }
    if update.anim_changed {
        println!("[anim] {}", update.anim_state);
    }
}

fn print_entry(entry: &ChatEntry) {
    println!(
        "{} [{}] {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.role.as_str(),
        entry.text
    );
}

/// Secondary surface: logs every visual snapshot as JSON.
fn spawn_visual_logger(mut rx: broadcast::Receiver<VisualState>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(state) => match serde_json::to_string(&state) {
                    Ok(json) => debug!(target: "companion::visual", "{json}"),
                    Err(e) => warn!("failed to serialize visual state: {e}"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "visual logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
