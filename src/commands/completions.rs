use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use zvox::cli::Cli;

/// Print a completion script for `shell` to stdout.
#[cfg(not(tarpaulin_include))]
pub fn handle(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "zvox", &mut std::io::stdout());
    Ok(())
}
