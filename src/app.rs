//! Translation session entry point.
//!
//! Orchestrates the complete flow:
//! capture → stream to engine → play translation → record transcripts

use crate::audio::capture::{CpalAudioSource, list_devices, suppress_audio_warnings};
use crate::audio::output::CpalAudioSink;
use crate::audio::playback::PlaybackScheduler;
use crate::audio::source::AudioSource;
use crate::audio::wav::WavAudioSource;
use crate::config::Config;
use crate::error::{ParloError, Result};
use crate::session::{Direction, Session, SessionEvent, SessionState};
use crate::stream::ws::WsConnector;
use owo_colors::OwoColorize;
use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;

/// Run a live translation session until disconnected.
///
/// # Arguments
/// * `config` - Base configuration (can be overridden by CLI args)
/// * `device` - Optional input device override from CLI
/// * `output_device` - Optional output device override from CLI
/// * `engine_url` - Optional engine URL override from CLI
/// * `wav` - Stream a WAV file instead of the microphone
/// * `muted` - Start with capture forwarding muted
/// * `quiet` - Suppress status messages
/// * `verbosity` - Verbosity level (0=turns only, 1=streaming deltas)
#[allow(clippy::too_many_arguments)]
pub async fn run_session_command(
    mut config: Config,
    device: Option<String>,
    output_device: Option<String>,
    engine_url: Option<String>,
    wav: Option<PathBuf>,
    muted: bool,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    // Apply CLI overrides
    if let Some(d) = device {
        config.audio.input_device = Some(d);
    }
    if let Some(d) = output_device {
        config.audio.output_device = Some(d);
    }
    if let Some(url) = engine_url {
        config.engine.url = url;
    }

    let source: Box<dyn AudioSource> = match wav {
        Some(path) => {
            let file = File::open(&path).map_err(|e| ParloError::AudioCapture {
                message: format!("Failed to open {}: {}", path.display(), e),
            })?;
            Box::new(WavAudioSource::from_reader(Box::new(file))?)
        }
        None => Box::new(CpalAudioSource::new(config.audio.input_device.as_deref())?),
    };

    let sink = CpalAudioSink::new(config.audio.output_device.as_deref())?;
    let playback_rate = sink.sample_rate();
    let scheduler = PlaybackScheduler::new(Box::new(sink), playback_rate);

    let connector = WsConnector::new(config.engine.url.clone(), config.engine.api_key.clone());

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let session = Session::new((&config.session).into(), Some(event_tx));
    let handle = session.handle();
    if muted {
        handle.toggle_mute();
    }

    spawn_event_printer(event_rx, quiet, verbosity);
    spawn_stdin_controls(handle.clone());

    let ctrl_c_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_handle.disconnect();
        }
    });

    if !quiet {
        eprintln!("parlo: connecting to {}", config.engine.url);
        eprintln!("parlo: controls: m=mute, i=interrupt, c=clear history, q=quit");
    }

    let result = session.run(&connector, source, scheduler).await;

    if !quiet {
        let history = handle.history();
        if !history.is_empty() {
            eprintln!("parlo: session ended, {} utterances recorded", history.len());
        }
    }
    if let Some(message) = handle.last_error() {
        eprintln!("parlo: last error: {}", message);
    }

    result
}

/// Print session events on a dedicated thread so the run loop never blocks
/// on the terminal.
fn spawn_event_printer(
    event_rx: crossbeam_channel::Receiver<SessionEvent>,
    quiet: bool,
    verbosity: u8,
) {
    std::thread::spawn(move || {
        for event in event_rx {
            match event {
                SessionEvent::StateChanged(state) => {
                    if quiet {
                        continue;
                    }
                    match state {
                        SessionState::Connecting => eprintln!("parlo: connecting..."),
                        SessionState::Connected => {
                            eprintln!("parlo: {}", "connected".green())
                        }
                        SessionState::Error => eprintln!("parlo: {}", "connection lost".red()),
                        SessionState::Disconnected => eprintln!("parlo: disconnected"),
                    }
                }
                SessionEvent::TranscriptDelta { direction, text } => {
                    if verbosity >= 1 {
                        let arrow = match direction {
                            Direction::Incoming => "<".cyan().to_string(),
                            Direction::Outgoing => ">".yellow().to_string(),
                        };
                        eprintln!("  {} {}", arrow, text.dimmed());
                    }
                }
                SessionEvent::TurnFinalized(entries) => {
                    if quiet {
                        continue;
                    }
                    for entry in entries {
                        let label = match entry.direction {
                            Direction::Incoming => {
                                format!("[{}] them", entry.language).cyan().to_string()
                            }
                            Direction::Outgoing => {
                                format!("[{}] you", entry.language).yellow().to_string()
                            }
                        };
                        println!("{}: {}", label, entry.text);
                    }
                }
                SessionEvent::Muted(muted) => {
                    if !quiet {
                        eprintln!("parlo: {}", if muted { "muted" } else { "unmuted" });
                    }
                }
                SessionEvent::SessionError(message) => {
                    eprintln!("parlo: {}", message.red());
                }
            }
        }
    });
}

/// Interactive controls: single-letter commands on stdin.
fn spawn_stdin_controls(handle: crate::session::SessionHandle) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "m" => {
                    handle.toggle_mute();
                }
                "i" => handle.interrupt(),
                "c" => {
                    handle.clear_history();
                    eprintln!("parlo: history cleared");
                }
                "q" => {
                    handle.disconnect();
                    break;
                }
                "" => {}
                other => {
                    eprintln!(
                        "parlo: unknown command '{}' (m=mute, i=interrupt, c=clear history, q=quit)",
                        other
                    );
                }
            }
        }
    });
}

/// Run the devices command: list input and output devices.
pub fn run_devices_command() -> Result<()> {
    suppress_audio_warnings();

    let inputs = list_devices()?;
    println!("Input devices:");
    if inputs.is_empty() {
        println!("  (none found)");
    }
    for name in inputs {
        println!("  {}", name);
    }

    use cpal::traits::{DeviceTrait, HostTrait};
    let host = cpal::default_host();
    let outputs = host.output_devices().map_err(|e| ParloError::AudioPlayback {
        message: format!("Failed to enumerate output devices: {}", e),
    })?;
    println!("Output devices:");
    let mut any = false;
    for device in outputs {
        if let Ok(name) = device.name() {
            println!("  {}", name);
            any = true;
        }
    }
    if !any {
        println!("  (none found)");
    }

    Ok(())
}
