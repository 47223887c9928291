use clap::{Parser, Subcommand};
use std::path::Path;

use minefield::cli::commands;
use minefield::config::ClientConfig;

#[derive(Parser)]
#[command(name = "minefield")]
#[command(about = "Real-time client for a multiplayer 3D minesweeper server")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "client.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a game session and play from the terminal
    Play {
        /// Game id to join; a new room id is generated when omitted
        #[arg(short, long)]
        game: Option<String>,

        /// Player name shown to others
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Replay a JSON-lines capture of server events offline
    Replay {
        /// Path to the capture file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::load_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    commands::init_logging(&config);

    let result = match cli.command {
        Commands::Play { game, name } => commands::play(&config, game, name).await,
        Commands::Replay { file } => commands::replay(Path::new(&file)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
