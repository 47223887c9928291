use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::models::Direction;
use crate::scene::{HeadlessRenderer, VisualKind};
use crate::socket::{protocol, GameSocket};
use crate::store::{EventForwarder, GameView, SessionEvent, SessionStatus};

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
pub fn init_logging(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Move(Direction),
    Reveal,
    Flag,
    Revive,
    Camera,
    Reset,
    Leave,
    Status,
}

pub fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim().to_ascii_lowercase().as_str() {
        "w" => Input::Move(Direction::Up),
        "d" => Input::Move(Direction::Right),
        "s" => Input::Move(Direction::Down),
        "a" => Input::Move(Direction::Left),
        "e" | "reveal" => Input::Reveal,
        "f" | "flag" => Input::Flag,
        "r" | "revive" => Input::Revive,
        "c" | "camera" => Input::Camera,
        "x" | "reset" => Input::Reset,
        "q" | "quit" => Input::Leave,
        "" | "?" => Input::Status,
        _ => return None,
    };
    Some(input)
}

const HELP: &str = "w/a/s/d move, e reveal, f flag, r revive, c camera, x reset, q leave";

/// Join a game session and play from stdin until the session closes.
pub async fn play(
    config: &ClientConfig,
    game_id: Option<String>,
    player_name: Option<String>,
) -> Result<(), String> {
    let game_id = game_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let player_name = player_name.unwrap_or_else(|| config.player_name.clone());

    let mut socket = GameSocket::from_config(config);
    let mut view = GameView::new(HeadlessRenderer::new());
    let (forwarder, mut events) = EventForwarder::channel();

    view.store_mut().join();
    socket.connect(&game_id, &player_name, forwarder);
    eprintln!("Joining game {} as {} ({})", game_id, player_name, HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut leaving = false;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let closed = matches!(event, SessionEvent::Closed { .. });
                view.apply(event);
                println!("{}", view.status_line());
                if closed {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Some(Input::Move(direction)) => socket.move_player(direction),
                    Some(Input::Reveal) => socket.reveal_area(),
                    Some(Input::Flag) => socket.flag_area(),
                    Some(Input::Revive) => socket.revive_player(),
                    Some(Input::Camera) => socket.change_camera(),
                    Some(Input::Reset) => socket.reset_game(),
                    Some(Input::Status) => println!("{}", view.status_line()),
                    Some(Input::Leave) => {
                        view.store_mut().leave();
                        socket.disconnect();
                    }
                    None => eprintln!("Unknown input '{}' ({})", line.trim(), HELP),
                },
                Ok(None) => {
                    stdin_open = false;
                    view.store_mut().leave();
                    socket.disconnect();
                }
                Err(e) => return Err(format!("Cannot read stdin: {}", e)),
            },
            _ = &mut shutdown, if !leaving => {
                eprintln!("\nShutdown signal received");
                leaving = true;
                view.store_mut().leave();
                socket.disconnect();
            }
        }
    }

    socket.closed().await;

    if view.store().status() == SessionStatus::Disconnected {
        Err("Disconnected from server".to_string())
    } else {
        Ok(())
    }
}

/// Feed a JSON-lines capture of server events through the store and scene.
pub fn replay(path: &Path) -> Result<(), String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;

    let mut view = GameView::new(HeadlessRenderer::new());
    view.apply(SessionEvent::Opened);

    let mut applied = 0usize;
    let mut ignored = 0usize;
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match protocol::decode_event(line) {
            Ok(Some(event)) => {
                view.apply(SessionEvent::from(event));
                applied += 1;
            }
            Ok(None) => ignored += 1,
            Err(e) => return Err(format!("{}:{}: {}", path.display(), index + 1, e)),
        }
    }

    let renderer = view.renderer();
    println!("=== Replay: {} ===", path.display());
    println!("Events applied: {} (ignored: {})", applied, ignored);
    println!("{}", view.status_line());
    println!();
    println!("--- Scene ---");
    println!("  Live visuals: {}", renderer.live_count());
    println!("  Players: {}", view.scene().player_count());
    println!("  Board features: {}", view.scene().board_handles().len());
    println!(
        "  Mounds: {}  Flags: {}  Mines: {}",
        renderer.count_where(|k| *k == VisualKind::Mound),
        renderer.count_where(|k| *k == VisualKind::Flag),
        renderer.count_where(|k| *k == VisualKind::Mine),
    );
    println!(
        "  Spawned: {}  Released: {}",
        renderer.spawned_total(),
        renderer.despawned_total()
    );

    let notifications: Vec<&str> = view.store().notifications().collect();
    if !notifications.is_empty() {
        println!();
        println!("--- Notifications ---");
        for message in notifications {
            println!("  {}", message);
        }
    }

    Ok(())
}
