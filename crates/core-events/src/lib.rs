//! Event types and channel policy.
//!
//! Three producer families feed the single-threaded application loop: the
//! foreground input poll, zone handler threads, and the API ingress threads.
//! Zone and API traffic travel over bounded crossbeam channels; the loop is
//! the only consumer. Producers use `try_send` and drop on overflow (with a
//! counter and a logged warning) rather than blocking; a stalled loop must
//! never wedge a handler thread mid-I/O.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use core_canvas::StyledLine;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Zone event queue capacity. Sized for bursty subprocess output; a full
/// queue tail-drops (the loop drains every iteration, so sustained overflow
/// means a runaway producer, not a tuning problem).
pub const ZONE_CHANNEL_CAP: usize = 8192;

/// API request queue capacity. Small by design: the loop consumes a bounded
/// number per frame and clients are expected to pipeline modestly.
pub const API_CHANNEL_CAP: usize = 256;

pub static ZONE_EVENTS_DROPPED: AtomicU64 = AtomicU64::new(0);

/// Named keys surfaced by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    F(u8),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0b001;
        const CTRL  = 0b010;
        const ALT   = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::empty(),
        }
    }

    pub fn shifted(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::SHIFT,
        }
    }

    pub fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }
}

/// Normalized foreground input events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// Bracketed paste payload, delivered whole. EDIT mode replays it as a
    /// sequence of printable events; other modes ignore it.
    Paste(String),
}

/// Zone handler run state as reported over the event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRunState {
    Running,
    Paused,
    Stopped,
    Error(String),
}

impl ZoneRunState {
    pub fn label(&self) -> &'static str {
        match self {
            ZoneRunState::Running => "running",
            ZoneRunState::Paused => "paused",
            ZoneRunState::Stopped => "stopped",
            ZoneRunState::Error(_) => "error",
        }
    }
}

/// Payload of a zone handler event. Handlers never mutate shared state; the
/// loop applies these to the zone registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZonePayload {
    /// Append lines to the zone buffer (streaming producers).
    Append(Vec<StyledLine>),
    /// Replace the buffer content wholesale (watch/pager refresh).
    Replace(Vec<StyledLine>),
    /// The PTY screen changed; the renderer should take a fresh snapshot.
    ScreenUpdated,
    /// Handler run-state transition.
    State(ZoneRunState),
    /// Child process exited with the given status code (None: signal).
    Exited(Option<i32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEvent {
    pub zone: String,
    pub payload: ZonePayload,
}

impl ZoneEvent {
    pub fn new(zone: impl Into<String>, payload: ZonePayload) -> Self {
        Self {
            zone: zone.into(),
            payload,
        }
    }
}

/// Where an API request entered the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSource {
    Tcp,
    Fifo,
}

/// Reply sent back to a TCP client for one command. `data` is pre-serialized
/// JSON (the `status` command's structured payload); FIFO requests carry no
/// reply channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub ok: bool,
    pub message: String,
    pub data: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub line: String,
    pub source: ApiSource,
    pub reply: Option<Sender<ApiReply>>,
}

pub fn zone_event_channel() -> (Sender<ZoneEvent>, Receiver<ZoneEvent>) {
    bounded(ZONE_CHANNEL_CAP)
}

pub fn api_channel() -> (Sender<ApiRequest>, Receiver<ApiRequest>) {
    bounded(API_CHANNEL_CAP)
}

/// Post a zone event without blocking. Overflow tail-drops with a counter
/// bump and a warning; a disconnected receiver (shutdown race) is silent.
pub fn post_zone_event(tx: &Sender<ZoneEvent>, event: ZoneEvent) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(ev)) => {
            ZONE_EVENTS_DROPPED.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(target: "runtime.zones", zone = ev.zone.as_str(), "zone event queue full, dropping");
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

/// Reply-channel constructor for a single TCP command. Capacity 1: each
/// request produces exactly one reply.
pub fn reply_channel() -> (Sender<ApiReply>, Receiver<ApiReply>) {
    bounded(1)
}

/// Timeout the loop uses when blocking for zone/API traffic while idle.
pub const IDLE_POLL: Duration = Duration::from_millis(50);
