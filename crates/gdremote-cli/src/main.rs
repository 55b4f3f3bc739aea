//! gdremote - talk to a running Godot instance via its DevTools autoload.
//!
//! Commands go through the project's `user://` mailbox; the game must be
//! running with the DevTools autoload for anything to answer.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "gdremote",
    version,
    about = "Interact with a running Godot instance via the DevTools autoload"
)]
pub struct Cli {
    /// Path to the Godot project
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check if DevTools is running
    Ping,
    /// Take a screenshot
    Screenshot {
        /// Output filename
        #[arg(short, long)]
        filename: Option<String>,
    },
    /// Validate a scene
    Validate {
        /// Scene path (res://...)
        #[arg(short, long)]
        scene: String,
    },
    /// Validate all scenes
    ValidateAll,
    /// Print the current scene tree
    SceneTree {
        /// Max depth
        #[arg(short, long, default_value_t = 10)]
        depth: u32,
    },
    /// Print performance metrics
    Performance,
    /// Get node state
    GetState {
        /// Node path
        #[arg(short, long)]
        node: Option<String>,
    },
    /// Set a node property
    SetState {
        /// Node path
        #[arg(short, long)]
        node: String,
        /// Property name
        #[arg(long)]
        property: String,
        /// Property value (JSON, number, or bare string)
        #[arg(long)]
        value: String,
    },
    /// Call a method on a node
    RunMethod {
        /// Node path
        #[arg(short, long)]
        node: String,
        /// Method name
        #[arg(short, long)]
        method: String,
        /// Method arguments as a JSON array
        #[arg(short, long)]
        args: Option<String>,
    },
    /// View DevTools logs
    Logs {
        /// Show last N entries
        #[arg(short, long)]
        tail: Option<usize>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Quit the running game
    Quit {
        /// Exit code for the game process
        #[arg(long)]
        exit_code: Option<i32>,
    },
    /// Simulate input actions
    #[command(subcommand)]
    Input(InputCommand),
}

#[derive(Subcommand)]
pub enum InputCommand {
    /// Press and hold an action
    Press {
        /// Action name (e.g. jump, move_left)
        action: String,
        /// Pressure strength 0.0-1.0
        #[arg(long)]
        strength: Option<f64>,
    },
    /// Release a held action
    Release {
        /// Action name to release
        action: String,
    },
    /// Press and release an action
    Tap {
        /// Action name to tap
        action: String,
        /// Hold duration in seconds before release
        #[arg(long)]
        hold: Option<f64>,
        /// Pressure strength 0.0-1.0
        #[arg(long)]
        strength: Option<f64>,
    },
    /// Release all simulated inputs
    Clear,
    /// List available input actions
    List {
        /// Include built-in ui_* actions
        #[arg(short, long)]
        all: bool,
    },
    /// Run an input sequence from a JSON file
    Sequence {
        /// Path to the sequence JSON file
        file: PathBuf,
        /// Sequence timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = commands::run(cli).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_state() {
        let cli = Cli::try_parse_from([
            "gdremote",
            "set-state",
            "--node",
            "/root/Game/Player",
            "--property",
            "Health",
            "--value",
            "100",
        ])
        .unwrap();
        match cli.command {
            Command::SetState {
                node,
                property,
                value,
            } => {
                assert_eq!(node, "/root/Game/Player");
                assert_eq!(property, "Health");
                assert_eq!(value, "100");
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn parses_nested_input_tap() {
        let cli = Cli::try_parse_from([
            "gdremote",
            "input",
            "tap",
            "jump",
            "--hold",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Command::Input(InputCommand::Tap { action, hold, strength }) => {
                assert_eq!(action, "jump");
                assert_eq!(hold, Some(0.5));
                assert!(strength.is_none());
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn project_flag_is_global() {
        let cli = Cli::try_parse_from(["gdremote", "ping", "--project", "/tmp/game"]).unwrap();
        assert_eq!(cli.project, PathBuf::from("/tmp/game"));
    }
}
