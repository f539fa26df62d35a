use anyhow::Result;
use clap::Parser;

use zvox::cli::{Cli, Commands, ConfigCommands};

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::handle(args),
        Commands::Chunks(args) => commands::chunks::handle(args),
        Commands::Echo(args) => commands::echo::handle(args),
        Commands::Config(command) => match command {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Edit => commands::config::handle_edit(),
            ConfigCommands::Migrate { yes } => commands::config::handle_migrate(yes),
        },
        Commands::Completions { shell } => commands::completions::handle(shell),
    }
}
