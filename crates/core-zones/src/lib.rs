//! Zone model and registry.
//!
//! A zone is a named rectangle overlaid on the canvas whose content comes
//! from a handler (subprocess, timer, PTY, FIFO, socket, file) or from a
//! projection (clipboard). The registry owns the zones in creation order
//! (also render z-order) and is mutated only by the application
//! loop. Handler threads communicate through the zone event channel; an
//! event naming a deleted zone is discarded at application time, which is
//! what makes `zone delete` a clean barrier.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use core_canvas::StyledLine;
use core_events::{ZoneEvent, ZonePayload, ZoneRunState};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

pub mod ansi;
pub mod buffer;
pub mod emulator;
pub mod handlers;

pub use buffer::ZoneBuffer;
pub use emulator::TermScreen;
pub use handlers::ZoneHandler;

/// Default buffer capacity when a zone is created without an explicit cap.
pub const DEFAULT_MAX_LINES: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("zone '{0}' already exists")]
    NameTaken(String),
    #[error("no zone named '{0}'")]
    UnknownZone(String),
    #[error("not supported: {0}")]
    Unsupported(&'static str),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("port {0} is already in use")]
    PortInUse(u16),
    #[error("pseudo-terminals unavailable: {0}")]
    PtyUnavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn default_true() -> bool {
    true
}

fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

/// Tagged configuration over the zone types. This is also the on-disk
/// descriptor shape for projects and layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneConfig {
    Static,
    Pipe {
        command: String,
        #[serde(default = "default_true")]
        auto_scroll: bool,
        #[serde(default = "default_max_lines")]
        max_lines: usize,
    },
    Watch {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refresh_secs: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        watch_path: Option<PathBuf>,
        #[serde(default = "default_true")]
        auto_scroll: bool,
        #[serde(default = "default_max_lines")]
        max_lines: usize,
    },
    Pty {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        #[serde(default = "default_max_lines")]
        max_lines: usize,
    },
    Fifo {
        path: PathBuf,
        #[serde(default = "default_true")]
        auto_scroll: bool,
        #[serde(default = "default_max_lines")]
        max_lines: usize,
    },
    Socket {
        port: u16,
        #[serde(default = "default_true")]
        auto_scroll: bool,
        #[serde(default = "default_max_lines")]
        max_lines: usize,
    },
    Pager {
        path: PathBuf,
        #[serde(default)]
        ansi: bool,
    },
    Clipboard,
}

impl ZoneConfig {
    /// Single-character border tag identifying the zone type.
    pub fn tag(&self) -> char {
        match self {
            ZoneConfig::Static => 'S',
            ZoneConfig::Pipe { .. } => 'P',
            ZoneConfig::Watch { .. } => 'W',
            ZoneConfig::Pty { .. } => 'T',
            ZoneConfig::Pager { .. } => 'R',
            ZoneConfig::Fifo { .. } => 'F',
            ZoneConfig::Socket { .. } => 'N',
            ZoneConfig::Clipboard => 'C',
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ZoneConfig::Static => "static",
            ZoneConfig::Pipe { .. } => "pipe",
            ZoneConfig::Watch { .. } => "watch",
            ZoneConfig::Pty { .. } => "pty",
            ZoneConfig::Pager { .. } => "pager",
            ZoneConfig::Fifo { .. } => "fifo",
            ZoneConfig::Socket { .. } => "socket",
            ZoneConfig::Clipboard => "clipboard",
        }
    }

    fn buffer_settings(&self) -> (usize, bool) {
        match *self {
            ZoneConfig::Pipe {
                max_lines,
                auto_scroll,
                ..
            }
            | ZoneConfig::Watch {
                max_lines,
                auto_scroll,
                ..
            }
            | ZoneConfig::Fifo {
                max_lines,
                auto_scroll,
                ..
            }
            | ZoneConfig::Socket {
                max_lines,
                auto_scroll,
                ..
            } => (max_lines, auto_scroll),
            ZoneConfig::Pty { max_lines, .. } => (max_lines, true),
            _ => (DEFAULT_MAX_LINES, false),
        }
    }

    fn wants_handler(&self) -> bool {
        !matches!(self, ZoneConfig::Static | ZoneConfig::Clipboard)
    }
}

/// Creation-time descriptor: everything but runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub x: i64,
    pub y: i64,
    #[serde(rename = "w")]
    pub width: i64,
    #[serde(rename = "h")]
    pub height: i64,
    pub config: ZoneConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub struct Zone {
    pub spec: ZoneSpec,
    pub buffer: ZoneBuffer,
    pub state: ZoneRunState,
    handler: Option<Box<dyn ZoneHandler>>,
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("buffer_len", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl Zone {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Inner content width (border excluded).
    pub fn inner_width(&self) -> usize {
        (self.spec.width - 2).max(0) as usize
    }

    pub fn inner_height(&self) -> usize {
        (self.spec.height - 2).max(0) as usize
    }

    /// PTY screen, when this is a running PTY zone.
    pub fn screen(&self) -> Option<Arc<Mutex<TermScreen>>> {
        self.handler.as_ref().and_then(|h| h.screen())
    }

    pub fn is_pty(&self) -> bool {
        matches!(self.spec.config, ZoneConfig::Pty { .. })
    }

    /// Scrollback indicator for the status line: "auto" at the tail,
    /// `offset/total` when scrolled back.
    pub fn scroll_status(&self) -> String {
        if let Some(screen) = self.screen() {
            let mut s = screen.lock().expect("pty screen lock poisoned");
            let offset = s.scrollback();
            if offset == 0 {
                "auto".to_string()
            } else {
                format!("{offset}/{}", s.history_len())
            }
        } else if self.buffer.scroll_offset == 0 {
            "auto".to_string()
        } else {
            format!("{}/{}", self.buffer.scroll_offset, self.buffer.len())
        }
    }
}

/// Outcome of applying one zone event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub redraw: bool,
    pub message: Option<String>,
}

pub struct ZoneManager {
    zones: Vec<Zone>,
    tx: Sender<ZoneEvent>,
    /// Terminal color capability; gates ANSI interpretation in handlers.
    color: bool,
}

impl ZoneManager {
    pub fn new(tx: Sender<ZoneEvent>, color: bool) -> Self {
        Self {
            zones: Vec::new(),
            tx,
            color,
        }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones in creation order (render z-order).
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|z| z.spec.name.eq_ignore_ascii_case(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Zone> {
        self.zones
            .iter_mut()
            .find(|z| z.spec.name.eq_ignore_ascii_case(name))
    }

    /// Create a zone from its descriptor and start its handler. A handler
    /// failure still creates the zone, in error state with the message
    /// returned, so the user can inspect, delete, or refresh it. Only a
    /// name collision refuses creation outright.
    pub fn create(&mut self, spec: ZoneSpec) -> Result<Option<String>, ZoneError> {
        if self.get(&spec.name).is_some() {
            return Err(ZoneError::NameTaken(spec.name));
        }
        let (max_lines, auto_scroll) = spec.config.buffer_settings();
        let mut zone = Zone {
            buffer: ZoneBuffer::new(max_lines, auto_scroll),
            state: ZoneRunState::Running,
            handler: None,
            spec,
        };
        let error = match self.spawn_handler(&zone) {
            Ok(handler) => {
                zone.handler = handler;
                None
            }
            Err(e) => {
                let msg = e.to_string();
                zone.state = ZoneRunState::Error(msg.clone());
                Some(msg)
            }
        };
        tracing::info!(
            target: "runtime.zones",
            zone = zone.spec.name.as_str(),
            kind = zone.spec.config.kind_name(),
            error = error.as_deref(),
            "zone_created"
        );
        self.zones.push(zone);
        Ok(error)
    }

    fn spawn_handler(&self, zone: &Zone) -> Result<Option<Box<dyn ZoneHandler>>, ZoneError> {
        let name = &zone.spec.name;
        let tx = self.tx.clone();
        let handler: Box<dyn ZoneHandler> = match &zone.spec.config {
            ZoneConfig::Static | ZoneConfig::Clipboard => return Ok(None),
            ZoneConfig::Pipe { command, .. } => {
                Box::new(handlers::PipeHandler::spawn(name, command, self.color, tx)?)
            }
            ZoneConfig::Watch {
                command,
                refresh_secs,
                watch_path,
                ..
            } => {
                let trigger = match (watch_path, refresh_secs) {
                    (Some(path), _) => handlers::WatchTrigger::Path(path.clone()),
                    (None, Some(secs)) => handlers::WatchTrigger::Interval(
                        std::time::Duration::from_secs_f64(secs.max(0.05)),
                    ),
                    (None, None) => {
                        return Err(ZoneError::Spawn(
                            "watch zone needs an interval or a path".to_string(),
                        ));
                    }
                };
                Box::new(handlers::WatchHandler::spawn(
                    name, command, trigger, self.color, tx,
                )?)
            }
            ZoneConfig::Pty { command, max_lines } => Box::new(handlers::PtyHandler::spawn(
                name,
                command.as_deref(),
                zone.inner_height() as u16,
                zone.inner_width() as u16,
                *max_lines,
                tx,
            )?),
            ZoneConfig::Fifo { path, .. } => spawn_fifo(name, path, self.color, tx)?,
            ZoneConfig::Socket { port, .. } => {
                Box::new(handlers::SocketHandler::spawn(name, *port, self.color, tx)?)
            }
            ZoneConfig::Pager { path, ansi } => {
                Box::new(handlers::PagerHandler::spawn(name, path, *ansi, tx)?)
            }
        };
        Ok(Some(handler))
    }
}

#[cfg(unix)]
fn spawn_fifo(
    name: &str,
    path: &std::path::Path,
    color: bool,
    tx: Sender<ZoneEvent>,
) -> Result<Box<dyn ZoneHandler>, ZoneError> {
    Ok(Box::new(handlers::FifoHandler::spawn(name, path, color, tx)?))
}

#[cfg(not(unix))]
fn spawn_fifo(
    _name: &str,
    _path: &std::path::Path,
    _color: bool,
    _tx: Sender<ZoneEvent>,
) -> Result<Box<dyn ZoneHandler>, ZoneError> {
    Err(ZoneError::Unsupported("fifo zones require unix"))
}

impl ZoneManager {
    /// Stop the handler, release resources, then drop the zone. Events
    /// from the dead handler still in the queue miss the name lookup and
    /// are discarded.
    pub fn delete(&mut self, name: &str) -> Result<(), ZoneError> {
        let idx = self
            .zones
            .iter()
            .position(|z| z.spec.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        let mut zone = self.zones.remove(idx);
        if let Some(mut handler) = zone.handler.take() {
            handler.stop();
        }
        zone.state = ZoneRunState::Stopped;
        tracing::info!(target: "runtime.zones", zone = name, "zone_deleted");
        Ok(())
    }

    pub fn pause(&mut self, name: &str) -> Result<(), ZoneError> {
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        if let Some(h) = zone.handler.as_mut() {
            h.pause();
        }
        zone.state = ZoneRunState::Paused;
        Ok(())
    }

    pub fn resume(&mut self, name: &str) -> Result<(), ZoneError> {
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        if let Some(h) = zone.handler.as_mut() {
            h.resume();
        }
        zone.state = ZoneRunState::Running;
        Ok(())
    }

    /// Re-run the zone's producer. A zone whose handler failed at creation
    /// gets a fresh spawn attempt.
    pub fn refresh(&mut self, name: &str) -> Result<Option<String>, ZoneError> {
        let idx = self
            .zones
            .iter()
            .position(|z| z.spec.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        if self.zones[idx].handler.is_some() {
            let zone = &mut self.zones[idx];
            if let Some(h) = zone.handler.as_mut() {
                h.refresh();
            }
            return Ok(None);
        }
        if !self.zones[idx].spec.config.wants_handler() {
            return Ok(None);
        }
        match self.spawn_handler(&self.zones[idx]) {
            Ok(handler) => {
                let zone = &mut self.zones[idx];
                zone.handler = handler;
                zone.state = ZoneRunState::Running;
                Ok(None)
            }
            Err(e) => {
                let msg = e.to_string();
                self.zones[idx].state = ZoneRunState::Error(msg.clone());
                Ok(Some(msg))
            }
        }
    }

    pub fn send(&mut self, name: &str, bytes: &[u8]) -> Result<(), ZoneError> {
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        match zone.handler.as_mut() {
            Some(h) => h.send(bytes),
            None => Err(ZoneError::Unsupported("zone has no input channel")),
        }
    }

    /// Apply one handler event. Unknown names (deleted zones) are dropped.
    pub fn apply_event(&mut self, event: ZoneEvent) -> ApplyOutcome {
        let Some(zone) = self.get_mut(&event.zone) else {
            tracing::trace!(target: "runtime.zones", zone = event.zone.as_str(), "event_for_deleted_zone_discarded");
            return ApplyOutcome::default();
        };
        let mut outcome = ApplyOutcome {
            redraw: true,
            message: None,
        };
        match event.payload {
            ZonePayload::Append(lines) => zone.buffer.append_all(lines),
            ZonePayload::Replace(lines) => zone.buffer.replace(lines),
            ZonePayload::ScreenUpdated => {}
            ZonePayload::State(state) => zone.state = state,
            ZonePayload::Exited(code) => match code {
                Some(0) => {
                    zone.state = ZoneRunState::Stopped;
                    outcome.message = Some(format!("zone '{}' finished", zone.spec.name));
                }
                Some(n) => {
                    zone.state = ZoneRunState::Error(format!("exit status {n}"));
                    outcome.message =
                        Some(format!("zone '{}' exited with status {n}", zone.spec.name));
                }
                None => {
                    zone.state = ZoneRunState::Error("terminated by signal".to_string());
                    outcome.message = Some(format!("zone '{}' terminated", zone.spec.name));
                }
            },
        }
        outcome
    }

    /// Scroll a zone's view. Positive `delta` scrolls toward history.
    pub fn scroll(&mut self, name: &str, delta: i64) -> Result<(), ZoneError> {
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        if let Some(screen) = zone.screen() {
            let mut s = screen.lock().expect("pty screen lock poisoned");
            if delta >= 0 {
                s.scroll_up(delta as usize);
            } else {
                s.scroll_down((-delta) as usize);
            }
        } else if delta >= 0 {
            zone.buffer.scroll_up(delta as usize);
        } else {
            zone.buffer.scroll_down((-delta) as usize);
        }
        Ok(())
    }

    pub fn scroll_to_top(&mut self, name: &str) -> Result<(), ZoneError> {
        let height = self.get(name).map(|z| z.inner_height()).unwrap_or(0);
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        if let Some(screen) = zone.screen() {
            screen
                .lock()
                .expect("pty screen lock poisoned")
                .scroll_to_top();
        } else {
            zone.buffer.scroll_to_top(height);
        }
        Ok(())
    }

    pub fn scroll_to_bottom(&mut self, name: &str) -> Result<(), ZoneError> {
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        if let Some(screen) = zone.screen() {
            screen
                .lock()
                .expect("pty screen lock poisoned")
                .scroll_to_bottom();
        } else {
            zone.buffer.scroll_to_bottom();
        }
        Ok(())
    }

    /// Stop every handler (shutdown path). Zones stay listed so a final
    /// render can still show their buffers.
    pub fn stop_all(&mut self) {
        for zone in &mut self.zones {
            if let Some(mut handler) = zone.handler.take() {
                handler.stop();
            }
            zone.state = ZoneRunState::Stopped;
        }
    }

    /// Replace static zone content (used by `zone send` on static zones is
    /// not supported; this backs project/layout previews and tests).
    pub fn set_buffer_lines(&mut self, name: &str, lines: Vec<StyledLine>) -> Result<(), ZoneError> {
        let zone = self
            .get_mut(name)
            .ok_or_else(|| ZoneError::UnknownZone(name.to_string()))?;
        zone.buffer.replace(lines);
        Ok(())
    }
}

impl Drop for ZoneManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::zone_event_channel;

    fn static_spec(name: &str) -> ZoneSpec {
        ZoneSpec {
            name: name.to_string(),
            x: 0,
            y: 0,
            width: 20,
            height: 6,
            config: ZoneConfig::Static,
            bookmark: None,
            description: None,
        }
    }

    #[test]
    fn names_are_case_insensitive_unique() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(static_spec("Log")).unwrap();
        match mgr.create(static_spec("LOG")) {
            Err(ZoneError::NameTaken(_)) => {}
            other => panic!("expected NameTaken, got {other:?}"),
        }
        assert!(mgr.get("log").is_some());
    }

    #[test]
    fn delete_discards_late_events() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(static_spec("a")).unwrap();
        mgr.delete("a").unwrap();
        let outcome = mgr.apply_event(ZoneEvent::new(
            "a",
            ZonePayload::Append(vec![StyledLine::plain("late")]),
        ));
        assert_eq!(outcome, ApplyOutcome::default());
        assert!(mgr.is_empty());
    }

    #[test]
    fn apply_append_and_exit_events() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(static_spec("z")).unwrap();
        let out = mgr.apply_event(ZoneEvent::new(
            "z",
            ZonePayload::Append(vec![StyledLine::plain("hi")]),
        ));
        assert!(out.redraw);
        assert_eq!(mgr.get("z").unwrap().buffer.len(), 1);

        let out = mgr.apply_event(ZoneEvent::new("z", ZonePayload::Exited(Some(2))));
        assert!(out.message.unwrap().contains("status 2"));
        assert!(matches!(
            mgr.get("z").unwrap().state,
            ZoneRunState::Error(_)
        ));
        // Buffer survives the error.
        assert_eq!(mgr.get("z").unwrap().buffer.len(), 1);
    }

    #[test]
    fn creation_order_is_z_order() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(static_spec("first")).unwrap();
        mgr.create(static_spec("second")).unwrap();
        let names: Vec<&str> = mgr.zones().iter().map(|z| z.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        mgr.delete("first").unwrap();
        assert_eq!(mgr.zones()[0].name(), "second");
    }

    #[test]
    fn inner_dimensions_exclude_border() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(static_spec("z")).unwrap();
        let zone = mgr.get("z").unwrap();
        assert_eq!(zone.inner_width(), 18);
        assert_eq!(zone.inner_height(), 4);
    }

    #[test]
    fn watch_without_trigger_creates_error_zone() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        let spec = ZoneSpec {
            config: ZoneConfig::Watch {
                command: "true".to_string(),
                refresh_secs: None,
                watch_path: None,
                auto_scroll: true,
                max_lines: 10,
            },
            ..static_spec("w")
        };
        let err = mgr.create(spec).unwrap();
        assert!(err.is_some());
        assert!(matches!(
            mgr.get("w").unwrap().state,
            ZoneRunState::Error(_)
        ));
    }

    #[test]
    fn buffer_scrolling_via_manager() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(static_spec("z")).unwrap();
        let lines: Vec<StyledLine> = (0..10).map(|i| StyledLine::plain(i.to_string())).collect();
        mgr.set_buffer_lines("z", lines).unwrap();
        mgr.scroll("z", 3).unwrap();
        assert_eq!(mgr.get("z").unwrap().buffer.scroll_offset, 3);
        assert_eq!(mgr.get("z").unwrap().scroll_status(), "3/10");
        mgr.scroll_to_bottom("z").unwrap();
        assert_eq!(mgr.get("z").unwrap().scroll_status(), "auto");
    }

    #[test]
    fn zone_config_serde_round_trip() {
        let spec = ZoneSpec {
            name: "clock".to_string(),
            x: 5,
            y: -2,
            width: 30,
            height: 5,
            config: ZoneConfig::Watch {
                command: "date".to_string(),
                refresh_secs: Some(1.0),
                watch_path: None,
                auto_scroll: true,
                max_lines: 50,
            },
            bookmark: Some('c'),
            description: Some("wall clock".to_string()),
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: ZoneSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
        assert!(json.contains("\"type\":\"watch\""));
    }

    #[test]
    fn tags_match_zone_types() {
        assert_eq!(ZoneConfig::Static.tag(), 'S');
        assert_eq!(ZoneConfig::Clipboard.tag(), 'C');
        assert_eq!(
            ZoneConfig::Pty {
                command: None,
                max_lines: 10
            }
            .tag(),
            'T'
        );
        assert_eq!(
            ZoneConfig::Socket {
                port: 1,
                auto_scroll: true,
                max_lines: 10
            }
            .tag(),
            'N'
        );
    }
}
