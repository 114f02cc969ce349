//! Session orchestration: connection lifecycle, capture forwarding, inbound
//! message dispatch and bounded reconnection.
//!
//! A [`Session`] owns the run loop; a cloneable [`SessionHandle`] exposes
//! control operations (mute, interrupt, disconnect, history access) to other
//! threads. Presentation-layer updates flow out through an optional
//! crossbeam channel so the UI never blocks the loop.

pub mod history;
pub mod transcript;

pub use history::{HistoryStore, TranscriptionEntry};
pub use transcript::{Direction, TranscriptAssembler};

use crate::audio::encode::encode_pcm16;
use crate::audio::playback::PlaybackScheduler;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::Result;
use crate::stream::channel::{Connector, StreamEvent};
use crate::stream::protocol::ServerMessage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Updates published to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionState),
    TranscriptDelta { direction: Direction, text: String },
    TurnFinalized(Vec<TranscriptionEntry>),
    Muted(bool),
    SessionError(String),
}

/// Reconnection and history knobs.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_reconnect_attempts: u32,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
    pub history_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: defaults::RECONNECT_MAX_ATTEMPTS,
            reconnect_base_ms: defaults::RECONNECT_BASE_MS,
            reconnect_max_ms: defaults::RECONNECT_MAX_MS,
            history_limit: defaults::HISTORY_LIMIT,
        }
    }
}

enum Ctrl {
    Disconnect,
    Interrupt,
}

struct Shared {
    state: Mutex<SessionState>,
    last_error: Mutex<Option<String>>,
    muted: AtomicBool,
    /// Gates the capture thread: frames are forwarded only while a live
    /// connection exists.
    forwarding: AtomicBool,
    history: Mutex<HistoryStore>,
    event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *guard != state {
            *guard = state;
            drop(guard);
            self.emit(SessionEvent::StateChanged(state));
        }
    }

    fn set_error(&self, message: String) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.clone());
        self.emit(SessionEvent::SessionError(message));
    }

    fn clear_error(&self) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Cloneable control surface over a running session.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
    ctrl_tx: mpsc::UnboundedSender<Ctrl>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared
            .last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_muted(&self) -> bool {
        self.shared.muted.load(Ordering::SeqCst)
    }

    /// Flip the mute flag; returns the new value. Muting suppresses capture
    /// forwarding without stopping the device.
    pub fn toggle_mute(&self) -> bool {
        let muted = !self.shared.muted.fetch_xor(true, Ordering::SeqCst);
        self.shared.emit(SessionEvent::Muted(muted));
        muted
    }

    /// Discard pending playback without touching the connection.
    pub fn interrupt(&self) {
        let _ = self.ctrl_tx.send(Ctrl::Interrupt);
    }

    /// Request an orderly shutdown. Idempotent; safe from any state.
    pub fn disconnect(&self) {
        let _ = self.ctrl_tx.send(Ctrl::Disconnect);
    }

    pub fn history(&self) -> Vec<TranscriptionEntry> {
        self.shared
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot()
    }

    pub fn clear_history(&self) {
        self.shared
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// A live translation session. Owns the event loop; constructed once per
/// connection attempt series and consumed by [`Session::run`].
pub struct Session {
    shared: Arc<Shared>,
    ctrl_tx: mpsc::UnboundedSender<Ctrl>,
    ctrl_rx: mpsc::UnboundedReceiver<Ctrl>,
    settings: SessionSettings,
}

impl Session {
    pub fn new(
        settings: SessionSettings,
        event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
    ) -> Self {
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState::Disconnected),
            last_error: Mutex::new(None),
            muted: AtomicBool::new(false),
            forwarding: AtomicBool::new(false),
            history: Mutex::new(HistoryStore::new(settings.history_limit)),
            event_tx,
        });
        Self {
            shared,
            ctrl_tx,
            ctrl_rx,
            settings,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: self.shared.clone(),
            ctrl_tx: self.ctrl_tx.clone(),
        }
    }

    /// Drive the session until it disconnects: connect (with bounded
    /// retries), forward captured audio, apply inbound engine messages.
    ///
    /// The capture device is started once up front; failure to acquire it
    /// is fatal. Transport failures trigger exponential-backoff reconnects
    /// up to the configured attempt cap, after which the session ends in
    /// `Disconnected` with the failure recorded as `last_error`.
    pub async fn run(
        mut self,
        connector: &dyn Connector,
        source: Box<dyn AudioSource>,
        mut scheduler: PlaybackScheduler,
    ) -> Result<()> {
        let mut assembler = TranscriptAssembler::new();
        let running = Arc::new(AtomicBool::new(true));

        let (frame_tx, mut frame_rx) = mpsc::channel::<Vec<u8>>(defaults::FRAME_CHANNEL_CAPACITY);
        let (start_tx, start_rx) = tokio::sync::oneshot::channel();
        let capture_handle =
            spawn_capture_thread(source, self.shared.clone(), running.clone(), frame_tx, start_tx);

        // Device acquisition failure is fatal; no point retrying the
        // transport without a microphone.
        match start_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.shared.set_error(e.to_string());
                self.shared.set_state(SessionState::Disconnected);
                running.store(false, Ordering::SeqCst);
                let _ = capture_handle.join();
                return Err(e);
            }
            Err(_) => {
                self.shared.set_state(SessionState::Disconnected);
                return Err(crate::error::ParloError::AudioCapture {
                    message: "Capture thread exited before starting".to_string(),
                });
            }
        }

        let mut attempt: u32 = 0;
        'outer: loop {
            self.shared.set_state(SessionState::Connecting);
            let (mut sender, mut receiver) = match connector.connect().await {
                Ok(pair) => pair,
                Err(e) => {
                    self.shared.set_error(e.to_string());
                    self.shared.set_state(SessionState::Error);
                    if !self.backoff(&mut attempt).await {
                        break 'outer;
                    }
                    continue;
                }
            };

            let mut failure: Option<String> = None;
            let mut reap_tick = tokio::time::interval(Duration::from_millis(
                defaults::REAP_INTERVAL_MS,
            ));
            loop {
                tokio::select! {
                    event = receiver.next_event() => {
                        match event {
                            Some(StreamEvent::Open) => {
                                attempt = 0;
                                self.shared.clear_error();
                                self.shared.set_state(SessionState::Connected);
                                self.shared.forwarding.store(true, Ordering::SeqCst);
                            }
                            Some(StreamEvent::Message(msg)) => {
                                // Frames delivered before the transport
                                // reports open are not part of the
                                // conversation yet.
                                if self.shared.state() == SessionState::Connected {
                                    apply_message(msg, &mut assembler, &mut scheduler, &self.shared);
                                }
                            }
                            Some(StreamEvent::Error(message)) => {
                                failure = Some(message);
                                break;
                            }
                            Some(StreamEvent::Closed) | None => {
                                break 'outer;
                            }
                        }
                    }
                    frame = frame_rx.recv() => {
                        match frame {
                            Some(pcm) => {
                                if let Err(e) = sender.send_audio(pcm).await {
                                    failure = Some(e.to_string());
                                    break;
                                }
                            }
                            // Capture thread ended; a finite source ran dry.
                            None => {
                                let _ = sender.close().await;
                                break 'outer;
                            }
                        }
                    }
                    ctrl = self.ctrl_rx.recv() => {
                        match ctrl {
                            Some(Ctrl::Interrupt) => scheduler.flush(),
                            Some(Ctrl::Disconnect) | None => {
                                let _ = sender.close().await;
                                break 'outer;
                            }
                        }
                    }
                    _ = reap_tick.tick() => {
                        scheduler.reap();
                    }
                }
            }

            // Transport failure: stop forwarding, drop pending playback,
            // then retry within the attempt budget.
            self.shared.forwarding.store(false, Ordering::SeqCst);
            scheduler.flush();
            if let Some(message) = failure {
                self.shared.set_error(message);
                self.shared.set_state(SessionState::Error);
                if !self.backoff(&mut attempt).await {
                    break 'outer;
                }
            }
        }

        running.store(false, Ordering::SeqCst);
        self.shared.forwarding.store(false, Ordering::SeqCst);
        scheduler.flush();
        self.shared.set_state(SessionState::Disconnected);
        let _ = capture_handle.join();
        Ok(())
    }

    /// Wait out the reconnect delay for the current attempt. Returns false
    /// when the attempt budget is exhausted or a disconnect arrives while
    /// waiting.
    async fn backoff(&mut self, attempt: &mut u32) -> bool {
        if *attempt >= self.settings.max_reconnect_attempts {
            eprintln!(
                "parlo: giving up after {} reconnect attempts",
                self.settings.max_reconnect_attempts
            );
            return false;
        }
        let delay = reconnect_delay(*attempt, &self.settings);
        *attempt += 1;
        eprintln!(
            "parlo: reconnecting in {:.1}s (attempt {}/{})",
            delay.as_secs_f64(),
            *attempt,
            self.settings.max_reconnect_attempts
        );

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                ctrl = self.ctrl_rx.recv() => {
                    match ctrl {
                        Some(Ctrl::Interrupt) => {}
                        Some(Ctrl::Disconnect) | None => return false,
                    }
                }
            }
        }
    }
}

/// Delay before reconnect attempt `attempt` (0-based): exponential from the
/// configured base, capped at the configured ceiling.
fn reconnect_delay(attempt: u32, settings: &SessionSettings) -> Duration {
    let raw = settings
        .reconnect_base_ms
        .saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(raw.min(settings.reconnect_max_ms))
}

/// Poll the capture source on a dedicated thread, encoding frames to PCM16
/// and pushing them into the bounded frame channel. Frames are dropped when
/// the channel is full or forwarding is off; capture never blocks.
fn spawn_capture_thread(
    mut source: Box<dyn AudioSource>,
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<Vec<u8>>,
    start_tx: tokio::sync::oneshot::Sender<Result<()>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = source.start() {
            let _ = start_tx.send(Err(e));
            return;
        }
        let _ = start_tx.send(Ok(()));

        let mut consecutive_errors = 0u32;
        while running.load(Ordering::SeqCst) {
            // A finite source must not be consumed while nothing is
            // forwarding; live sources keep draining so the device buffer
            // stays bounded, with the frames discarded below.
            if source.is_finite() && !shared.forwarding.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(defaults::FRAME_MS));
                continue;
            }
            match source.read_samples() {
                Ok(samples) => {
                    consecutive_errors = 0;
                    if samples.is_empty() {
                        if source.is_finite() {
                            break;
                        }
                    } else if shared.forwarding.load(Ordering::SeqCst)
                        && !shared.muted.load(Ordering::SeqCst)
                    {
                        let _ = frame_tx.try_send(encode_pcm16(&samples));
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    eprintln!("parlo: capture error: {}", e);
                    if consecutive_errors >= 5 {
                        eprintln!("parlo: too many capture errors, stopping");
                        break;
                    }
                }
            }
            std::thread::sleep(Duration::from_millis(defaults::FRAME_MS));
        }

        if let Err(e) = source.stop() {
            eprintln!("parlo: failed to stop capture: {}", e);
        }
    })
}

/// Apply one engine message. Effects are ordered so transcript state is
/// current before the turn finalizes, and playback is flushed last when the
/// same frame both carries audio and signals an interruption.
fn apply_message(
    msg: ServerMessage,
    assembler: &mut TranscriptAssembler,
    scheduler: &mut PlaybackScheduler,
    shared: &Shared,
) {
    if let Some(delta) = msg.incoming_transcript_delta {
        assembler.append_delta(Direction::Incoming, &delta);
        shared.emit(SessionEvent::TranscriptDelta {
            direction: Direction::Incoming,
            text: delta,
        });
    }
    if let Some(delta) = msg.outgoing_transcript_delta {
        assembler.append_delta(Direction::Outgoing, &delta);
        shared.emit(SessionEvent::TranscriptDelta {
            direction: Direction::Outgoing,
            text: delta,
        });
    }
    if msg.turn_complete {
        let mut history = shared.history.lock().unwrap_or_else(|e| e.into_inner());
        let entries = assembler.finalize_turn(&mut history);
        drop(history);
        if !entries.is_empty() {
            shared.emit(SessionEvent::TurnFinalized(entries));
        }
    }
    if let Some(chunk) = msg.audio_chunk {
        if let Err(e) = scheduler.schedule(&chunk.data, chunk.sample_rate, chunk.channels) {
            eprintln!("parlo: dropping audio chunk: {}", e);
        }
    }
    if msg.interrupted {
        scheduler.flush();
    }
}
