//! PAGER handler: display a file's contents with scrollback.
//!
//! The file is read once at creation and again on `refresh`; there is no
//! worker thread. The renderer hint selects plain text vs. ANSI-aware
//! parsing (some files: `ls --color` dumps, build logs: carry SGR runs
//! worth preserving).

use std::path::{Path, PathBuf};

use core_events::{ZoneEvent, ZonePayload, ZoneRunState, post_zone_event};
use crossbeam_channel::Sender;

use super::ZoneHandler;
use crate::ZoneError;
use crate::ansi;

pub struct PagerHandler {
    zone: String,
    path: PathBuf,
    ansi: bool,
    tx: Sender<ZoneEvent>,
}

impl PagerHandler {
    pub fn spawn(
        zone: &str,
        path: &Path,
        ansi: bool,
        tx: Sender<ZoneEvent>,
    ) -> Result<Self, ZoneError> {
        let handler = Self {
            zone: zone.to_string(),
            path: path.to_path_buf(),
            ansi,
            tx,
        };
        handler.load()?;
        Ok(handler)
    }

    fn load(&self) -> Result<(), ZoneError> {
        let content = std::fs::read_to_string(&self.path)?;
        let lines = ansi::split_lines(content.trim_end_matches('\n'), self.ansi);
        tracing::debug!(target: "runtime.zones", zone = self.zone.as_str(), lines = lines.len(), "pager_loaded");
        post_zone_event(&self.tx, ZoneEvent::new(&self.zone, ZonePayload::Replace(lines)));
        Ok(())
    }
}

impl ZoneHandler for PagerHandler {
    fn kind(&self) -> &'static str {
        "pager"
    }

    fn stop(&mut self) {}

    fn refresh(&mut self) {
        if let Err(e) = self.load() {
            post_zone_event(
                &self.tx,
                ZoneEvent::new(
                    &self.zone,
                    ZonePayload::State(ZoneRunState::Error(e.to_string())),
                ),
            );
        }
    }
}
