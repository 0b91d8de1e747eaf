//! tandem viewer client
//!
//! Connects to a relay, loads a document through the renderer adapter,
//! and binds a line-oriented command loop to the reconciliation engine.
//! All session mutation happens on this single event loop.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use tandem_client::commands::{parse_command, Command, ParseError, ZoomDirection};
use tandem_client::config::ClientConfig;
use tandem_client::connection::Connection;
use tandem_client::engine::{Engine, PeerChange};
use tandem_client::render::PageTally;
use tandem_protocol::{DeviceId, Envelope};
use tandem_utils::{init_logging_with_config, LogConfig, Result, TandemError};

/// How much of a chat message the notification line shows
const NOTIFICATION_PREVIEW_LEN: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "tandem", about = "Two-party synchronized document viewer")]
struct Cli {
    /// Relay address (tcp://host:port)
    #[arg(long)]
    relay: Option<String>,

    /// Document to load on startup
    #[arg(long)]
    document: Option<PathBuf>,

    /// Minimum interval between cursor emissions in ms; 0 disables throttling
    #[arg(long)]
    cursor_throttle_ms: Option<u64>,

    /// Log filter (e.g. "debug", "tandem_client=trace")
    #[arg(long, env = "TANDEM_LOG")]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::client();
    if let Some(filter) = &cli.log_filter {
        log_config.filter = filter.clone();
    }
    init_logging_with_config(log_config)?;

    let config = ClientConfig::load();
    let relay_addr = cli.relay.clone().unwrap_or_else(|| config.relay.clone());
    let throttle = Duration::from_millis(
        cli.cursor_throttle_ms.unwrap_or(config.cursor_throttle_ms),
    );

    let device_id = DeviceId::generate();
    println!("Your device: {}", device_id);

    let mut connection = Connection::new(relay_addr.clone());
    connection.connect().await?;
    println!("Connected to relay at {}", relay_addr);

    let mut engine = Engine::new(PageTally::new(), connection.sender(), device_id)
        .with_cursor_throttle(throttle);

    if let Some(path) = &cli.document {
        let bytes = std::fs::read(path).map_err(|e| TandemError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        // A bad document is reported and leaves the session untouched
        match engine.load_document(&bytes) {
            Ok(pages) => println!("Loaded {} ({} pages)", path.display(), pages),
            Err(e) => println!("Could not load document: {}", e),
        }
    }

    println!("Commands: next, prev, ready, note <text>, say <text>, cursor <x> <y>, zoom in|out, status, quit");

    run(&mut engine, &mut connection).await?;

    connection.disconnect().await;
    Ok(())
}

/// Single-threaded event loop: every engine call runs to completion
/// before the next local command or peer message is processed.
async fn run(engine: &mut Engine<PageTally>, connection: &mut Connection) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if handle_line(engine, &line) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            envelope = connection.recv() => {
                match envelope {
                    Some(envelope) => handle_peer(engine, envelope),
                    None => {
                        println!("Relay connection closed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Apply one typed command. Returns true when the user wants to quit.
fn handle_line(engine: &mut Engine<PageTally>, line: &str) -> bool {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(ParseError::Empty) => return false,
        Err(e) => {
            println!("{}", e);
            return false;
        }
    };

    match command {
        Command::Page(direction) => {
            engine.page_change(direction);
            print_position(engine);
        }
        Command::Ready => {
            let advanced = engine.ready_toggle();
            if advanced {
                println!("Both ready, turning the page");
                print_position(engine);
            } else if engine.state().local_ready {
                println!("Ready (waiting for partner)");
            } else {
                println!("Ready withdrawn");
            }
        }
        Command::Note(text) => {
            engine.notes_edit(text);
            println!("Notes updated");
        }
        Command::Say(text) => {
            if engine.chat_send(&text).is_none() {
                println!("Nothing to send");
            }
        }
        Command::Cursor(x, y) => {
            engine.cursor_move(x, y);
        }
        Command::Zoom(ZoomDirection::In) => {
            engine.zoom_in();
            println!("Zoom {:.1}x", engine.state().scale);
        }
        Command::Zoom(ZoomDirection::Out) => {
            engine.zoom_out();
            println!("Zoom {:.1}x", engine.state().scale);
        }
        Command::Status => print_status(engine),
        Command::Quit => return true,
    }

    false
}

/// Apply one inbound peer envelope and reflect the change.
fn handle_peer(engine: &mut Engine<PageTally>, envelope: Envelope) {
    match engine.apply_peer_event(envelope) {
        Some(PeerChange::PageChanged(page)) => {
            println!("Partner turned to page {}", page);
            print_position(engine);
        }
        Some(PeerChange::ReadyChanged { advanced: true }) => {
            println!("Both ready, turning the page");
            print_position(engine);
        }
        Some(PeerChange::ReadyChanged { advanced: false }) => {
            if engine.state().peer_ready {
                println!("Partner is ready");
            } else {
                println!("Partner is no longer ready");
            }
        }
        Some(PeerChange::CursorMoved(position)) => {
            debug!(x = position.x, y = position.y, "peer cursor moved");
        }
        Some(PeerChange::NotesChanged) => {
            println!("Notes updated by partner");
        }
        Some(PeerChange::ChatReceived(entry)) => {
            let mut preview: String = entry.body.chars().take(NOTIFICATION_PREVIEW_LEN).collect();
            if entry.body.chars().count() > NOTIFICATION_PREVIEW_LEN {
                preview.push_str("...");
            }
            println!("[{}] {}: {}", entry.sent_at, entry.sender, preview);
        }
        None => {}
    }
}

fn print_position(engine: &Engine<PageTally>) {
    let state = engine.state();
    if state.is_loaded() {
        println!(
            "Page {}/{} ({:.0}%)",
            state.current_page,
            state.total_pages,
            state.progress() * 100.0
        );
    }
}

fn print_status(engine: &Engine<PageTally>) {
    let state = engine.state();
    if state.is_loaded() {
        println!("Document: {} pages", state.total_pages);
        print_position(engine);
    } else {
        println!("No document loaded");
    }
    println!(
        "Ready: you={} partner={}",
        state.local_ready, state.peer_ready
    );
    if !state.notes.is_empty() {
        println!("Notes: {}", state.notes);
    }
    if let Some(cursor) = state.peer_cursor {
        println!("Partner cursor: ({:.1}, {:.1})", cursor.x, cursor.y);
    }
    println!("Chat: {} messages", state.chat_log.len());
}
