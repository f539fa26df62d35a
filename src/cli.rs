//! Command-line interface definitions.
//!
//! Lives in the library so the xtask can render the man page from the same
//! definitions the binary parses.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use once_cell::sync::Lazy;

use crate::screen::Zone;

/// Version with build date and, for dev builds, the git SHA.
pub static LONG_VERSION: Lazy<String> = Lazy::new(|| {
    let date = env!("ZVOX_BUILD_DATE");
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) => format!("{} ({} {})", env!("CARGO_PKG_VERSION"), sha, date),
        None => format!("{} ({})", env!("CARGO_PKG_VERSION"), date),
    }
});

/// Narrated, voice-driven display layer for Z-machine interactive fiction
#[derive(Parser, Debug)]
#[command(
    name = "zvox",
    author,
    version,
    long_version = LONG_VERSION.as_str(),
    about,
    after_help = concat!("Source: https://github.com/", env!("ZVOX_REPO_NAME"))
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a VM transcript through the display adapter
    Play(PlayArgs),

    /// Show the narration chunks of an HTML fragment
    Chunks(ChunksArgs),

    /// Classify recognizer transcripts against spoken text
    Echo(EchoArgs),

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
pub struct PlayArgs {
    /// JSON-lines transcript of VM messages
    pub transcript: PathBuf,

    /// Input for each line request, in order (repeatable)
    #[arg(short, long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Speak each turn through the console speech engine
    #[arg(short, long)]
    pub narrate: bool,

    /// Restore the autosave after the first turn
    #[arg(long)]
    pub restore: bool,

    /// Save directory (overrides the configured one)
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ChunksArgs {
    /// HTML file; `-` reads stdin
    pub file: PathBuf,

    /// Voice role of the chunks
    #[arg(long, value_enum, default_value_t = Zone::Main)]
    pub zone: Zone,

    /// Print the HTML with chunk markers instead of the chunk list
    #[arg(long)]
    pub markers: bool,
}

#[derive(clap::Args, Debug)]
pub struct EchoArgs {
    /// Recognizer transcripts to classify
    #[arg(required = true)]
    pub transcripts: Vec<String>,

    /// Text that was just spoken (repeatable)
    #[arg(short, long = "spoken", value_name = "TEXT")]
    pub spoken: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Open the config file in $EDITOR
    Edit,
    /// Add missing fields to the config file
    Migrate {
        /// Apply without asking
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn play_collects_repeated_commands() {
        let cli = Cli::parse_from([
            "zvox", "play", "game.jsonl", "-c", "look", "--command", "north", "--narrate",
        ]);
        let Commands::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.commands, vec!["look", "north"]);
        assert!(args.narrate);
        assert!(!args.restore);
    }

    #[test]
    fn chunks_zone_parses_lowercase() {
        let cli = Cli::parse_from(["zvox", "chunks", "-", "--zone", "status"]);
        let Commands::Chunks(args) = cli.command else {
            panic!("expected chunks");
        };
        assert_eq!(args.zone, Zone::Status);
    }
}
