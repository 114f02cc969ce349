use anyhow::Result;
use clap::{CommandFactory, Parser};
use parlo::app::{run_devices_command, run_session_command};
use parlo::cli::{Cli, Commands};
use parlo::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_session_command(
                config,
                cli.device,
                cli.output_device,
                cli.engine_url,
                cli.wav,
                cli.muted,
                cli.quiet,
                cli.verbose,
            )
            .await?;
        }
        Some(Commands::Devices) => {
            run_devices_command()?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "parlo", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/parlo/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else if let Some(default_path) = Config::default_path() {
        Config::load_or_default(&default_path)?
    } else {
        Config::default()
    };

    Ok(config.with_env_overrides())
}
