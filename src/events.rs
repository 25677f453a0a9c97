use crate::{
    models::{ObjectReference, Record, SaveHeader},
    VariantContext,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Everything a decode reports to the outside world, in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum DecodeEvent {
    Header(SaveHeader),
    FileTag(u32),
    MaxChunkSize(u32),
    Progress(Progress),

    /// A batch of fully decoded records that the decoder no longer holds
    Records(HashMap<String, Record>),
    CrossReference(CrossReference),
    Diagnostic(Diagnostic),
    Alert(AlertKey),
    Collectables(Vec<ObjectReference>),
    Levels(Vec<String>),
    Complete,
}

/// The phase a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressKey {
    Objects,
    Entities,
}

impl ProgressKey {
    /// Stable message template key for localization
    pub fn message_key(&self) -> &'static str {
        match self {
            ProgressKey::Objects => "MAP\\SAVEPARSER\\Parsing %1$s objects (%2$s%)...",
            ProgressKey::Entities => "MAP\\SAVEPARSER\\Parsing %1$s entities (%2$s%)...",
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            ProgressKey::Objects => (30.0, 15.0),
            ProgressKey::Entities => (45.0, 15.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub key: ProgressKey,

    /// Total records in the phase, formatted for display
    pub count: String,

    /// Completion of the current phase, 0 to 100
    pub phase_percent: u8,

    /// Overall completion
    pub percentage: f64,
}

impl Progress {
    pub(crate) fn new(key: ProgressKey, done: usize, total: usize, separator: Option<char>) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        };

        let (start, span) = key.range();
        Progress {
            key,
            count: format_count(total, separator),
            phase_percent: (ratio * 100.0).round() as u8,
            percentage: start + ratio * span,
        }
    }
}

/// Group digits in threes with the separator
pub(crate) fn format_count(value: usize, separator: Option<char>) -> String {
    let digits = value.to_string();
    let Some(sep) = separator else {
        return digits;
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Well known records that downstream consumers look up first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CrossReference {
    GameState(String),
    PlayerHost(String),
}

/// Context captured when the decoder hits something it does not model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Diagnostic {
    #[serde(rename_all = "camelCase")]
    UnknownVariant {
        context: VariantContext,
        tag: String,
        property: String,
        offset: u64,
    },
    #[serde(rename_all = "camelCase")]
    UnknownIdentityProvider {
        path_name: String,
        provider: u8,
        offset: u64,
    },
    #[serde(rename_all = "camelCase")]
    RecordOverrun {
        path_name: String,
        class_name: String,
        overrun: u64,
    },
}

/// User facing failures, keyed so that the host can localize them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKey {
    SaveVersionTooOld,
    UnsupportedSaveFile,
    InflateFailed,
    TruncatedSave,
}

impl AlertKey {
    pub fn message_key(&self) -> &'static str {
        match self {
            AlertKey::SaveVersionTooOld => "MAP\\SAVEPARSER\\That save version isn't supported anymore... Please save it again in the game.",
            AlertKey::UnsupportedSaveFile => "That save version isn't supported! Are you sure this is a proper save file???",
            AlertKey::InflateFailed => "Something went wrong while trying to inflate your savegame. It seems to be related to adblock and we are looking into it.",
            AlertKey::TruncatedSave => "MAP\\SAVEPARSER\\The save file ended unexpectedly.",
        }
    }
}

/// Receiver of decode events
pub trait EventSink {
    fn emit(&mut self, event: DecodeEvent);
}

impl EventSink for Vec<DecodeEvent> {
    fn emit(&mut self, event: DecodeEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::Sender<DecodeEvent> {
    fn emit(&mut self, event: DecodeEvent) {
        // A hung up receiver no longer cares about the outcome
        let _ = self.send(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &'_ mut S {
    fn emit(&mut self, event: DecodeEvent) {
        (**self).emit(event)
    }
}

/// Adapts a closure into an event sink
pub struct FnSink<F>(pub F);

impl<F: FnMut(DecodeEvent)> EventSink for FnSink<F> {
    fn emit(&mut self, event: DecodeEvent) {
        (self.0)(event)
    }
}

/// Shared flag to abort a decode between records
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Collects an entire decode in memory. Flushed batches are merged back into
/// a single path keyed map.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSave {
    pub header: Option<SaveHeader>,
    pub file_tag: Option<u32>,
    pub max_chunk_size: Option<u32>,
    pub levels: Vec<String>,
    pub collectables: Vec<ObjectReference>,
    pub game_state: Option<String>,
    pub player_host: Option<String>,
    pub records: HashMap<String, Record>,
    pub diagnostics: Vec<Diagnostic>,
    pub alerts: Vec<AlertKey>,
    pub batches: usize,
    pub complete: bool,
}

impl EventSink for DecodedSave {
    fn emit(&mut self, event: DecodeEvent) {
        match event {
            DecodeEvent::Header(x) => self.header = Some(x),
            DecodeEvent::FileTag(x) => self.file_tag = Some(x),
            DecodeEvent::MaxChunkSize(x) => self.max_chunk_size = Some(x),
            DecodeEvent::Progress(_) => {}
            DecodeEvent::Records(x) => {
                self.batches += 1;
                self.records.extend(x);
            }
            DecodeEvent::CrossReference(CrossReference::GameState(x)) => {
                self.game_state = Some(x)
            }
            DecodeEvent::CrossReference(CrossReference::PlayerHost(x)) => {
                self.player_host = Some(x)
            }
            DecodeEvent::Diagnostic(x) => self.diagnostics.push(x),
            DecodeEvent::Alert(x) => self.alerts.push(x),
            DecodeEvent::Collectables(x) => self.collectables = x,
            DecodeEvent::Levels(x) => self.levels = x,
            DecodeEvent::Complete => self.complete = true,
        }
    }
}
