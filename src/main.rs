use anyhow::Result;
use clap::Parser;

use wmbridge::cli::{Cli, handle_client_command};
use wmbridge::config::load_config;
use wmbridge::daemon;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            let config = load_config(cli.config.as_deref());
            handle_client_command(cmd, &config)
        }
        None => daemon::run(cli.config.as_deref()),
    }
}
