#![forbid(unsafe_code)]

mod cli;
mod commands;
mod shutdown;
mod startup;

use anyhow::Result;

use cli::Command;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    match cli.command {
        Some(Command::Version) => {
            println!("fabricguard-agent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }

        Some(Command::CheckConfig) => commands::cmd_check_config(&cli.config),

        // No subcommand = run the agent daemon
        Some(Command::Run) | None => startup::run(&cli).await,
    }
}
