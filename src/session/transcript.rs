//! Incremental transcript assembly.
//!
//! The engine streams partial transcript text as deltas, separately for each
//! direction of the conversation. Deltas accumulate until a turn-complete
//! signal finalizes both directions into history entries.

use crate::lang;
use crate::session::history::{HistoryStore, TranscriptionEntry};
use serde::Serialize;

/// Which way an utterance travelled through the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Remote speaker, translated for the local user.
    Incoming,
    /// Local speaker, translated for the remote side.
    Outgoing,
}

/// Accumulates transcript deltas per direction within the current turn.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    incoming: String,
    outgoing: String,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta verbatim to the given direction's buffer.
    pub fn append_delta(&mut self, direction: Direction, delta: &str) {
        match direction {
            Direction::Incoming => self.incoming.push_str(delta),
            Direction::Outgoing => self.outgoing.push_str(delta),
        }
    }

    /// Current partial text for a direction, unfinalized.
    pub fn partial(&self, direction: Direction) -> &str {
        match direction {
            Direction::Incoming => &self.incoming,
            Direction::Outgoing => &self.outgoing,
        }
    }

    /// Close the current turn: trim each direction's buffer, record the
    /// non-empty ones in history with a guessed language tag, and reset
    /// both buffers. Returns the entries that were recorded, incoming
    /// first.
    pub fn finalize_turn(&mut self, history: &mut HistoryStore) -> Vec<TranscriptionEntry> {
        let mut recorded = Vec::new();
        for (direction, buffer) in [
            (Direction::Incoming, &mut self.incoming),
            (Direction::Outgoing, &mut self.outgoing),
        ] {
            let text = buffer.trim();
            if !text.is_empty() {
                let entry =
                    TranscriptionEntry::new(direction, text.to_string(), lang::classify(text));
                history.append(entry.clone());
                recorded.push(entry);
            }
            buffer.clear();
        }
        recorded
    }
}
