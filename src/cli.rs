//! Command-line interface for parlo
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Live speech-to-speech translation
#[derive(Parser, Debug)]
#[command(name = "parlo", version, about = "Live speech-to-speech translation")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: show transcript deltas as they stream)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (e.g., hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Audio output device
    #[arg(long, value_name = "DEVICE")]
    pub output_device: Option<String>,

    /// Translation engine websocket URL
    #[arg(long, value_name = "URL")]
    pub engine_url: Option<String>,

    /// Stream a WAV file instead of the microphone (for testing)
    #[arg(long, value_name = "FILE")]
    pub wav: Option<PathBuf>,

    /// Start the session muted
    #[arg(long)]
    pub muted: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input and output devices
    Devices,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
