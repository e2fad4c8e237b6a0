//! Project file (JSON) capture, apply, save, and load.
//!
//! The document shape is versioned and human-diffable: cells are a flat
//! array sorted by (y, x), colors are emitted only when set, and zone
//! descriptors reuse the registry's serde shape. `apply` replaces the
//! running state only after the whole document parsed.

use std::path::Path;

use core_canvas::{Cell, Color};
use core_state::{AppState, GridSettings, LineMode, YDirection};
use core_zones::ZoneSpec;
use serde::{Deserialize, Serialize};

use crate::{ProjectError, iso_now};

pub const PROJECT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_iso: String,
    #[serde(default)]
    pub modified_iso: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellDoc {
    pub x: i64,
    pub y: i64,
    #[serde(rename = "char")]
    pub ch: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CanvasDoc {
    #[serde(default)]
    pub cells: Vec<CellDoc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct PointDoc {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewportDoc {
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
    #[serde(default)]
    pub cursor: PointDoc,
    #[serde(default)]
    pub origin: PointDoc,
    #[serde(default = "default_y_direction")]
    pub y_direction: String,
}

fn default_y_direction() -> String {
    "down".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDoc {
    #[serde(default)]
    pub show_origin: bool,
    #[serde(default = "default_major")]
    pub major_interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_interval: Option<i64>,
    #[serde(default = "default_line_mode")]
    pub line_mode: String,
    #[serde(default)]
    pub rulers: bool,
    #[serde(default)]
    pub labels: bool,
    #[serde(default = "default_major")]
    pub label_interval: i64,
}

fn default_major() -> i64 {
    10
}

fn default_line_mode() -> String {
    "markers".to_string()
}

impl Default for GridDoc {
    fn default() -> Self {
        GridDoc::from(&GridSettings::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ZonesDoc {
    #[serde(default)]
    pub zones: Vec<ZoneSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDoc {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub canvas: CanvasDoc,
    #[serde(default)]
    pub viewport: ViewportDoc,
    #[serde(default)]
    pub grid: GridDoc,
    #[serde(default)]
    pub bookmarks: std::collections::BTreeMap<String, PointDoc>,
    #[serde(default)]
    pub zones: ZonesDoc,
}

fn default_version() -> String {
    PROJECT_VERSION.to_string()
}

impl From<&GridSettings> for GridDoc {
    fn from(grid: &GridSettings) -> Self {
        Self {
            show_origin: grid.show_origin,
            major_interval: grid.major_interval,
            minor_interval: grid.minor_interval,
            line_mode: grid.line_mode.name().to_string(),
            rulers: grid.show_rulers,
            labels: grid.show_labels,
            label_interval: grid.label_interval,
        }
    }
}

impl GridDoc {
    fn to_settings(&self) -> GridSettings {
        GridSettings {
            show_origin: self.show_origin,
            major_interval: self.major_interval.max(1),
            minor_interval: self.minor_interval.filter(|&i| i >= 1),
            line_mode: match self.line_mode.as_str() {
                "off" => LineMode::Off,
                "lines" => LineMode::Lines,
                "dots" => LineMode::Dots,
                _ => LineMode::Markers,
            },
            show_rulers: self.rulers,
            show_labels: self.labels,
            label_interval: self.label_interval.max(1),
        }
    }
}

fn color_code(color: Color) -> Option<u8> {
    match color {
        Color::Default => None,
        Color::Ansi(n) => Some(n),
    }
}

fn code_color(code: Option<u8>) -> Color {
    match code {
        None => Color::Default,
        Some(n) => Color::Ansi(n),
    }
}

impl ProjectDoc {
    /// Snapshot the running state. `name` is the project's display name
    /// (usually the file stem); `created_iso` is carried over when
    /// re-saving an existing project.
    pub fn capture(
        state: &AppState,
        zone_specs: Vec<ZoneSpec>,
        name: &str,
        created_iso: Option<String>,
    ) -> Self {
        let mut cells: Vec<CellDoc> = state
            .canvas
            .iter()
            .map(|(&(x, y), cell)| CellDoc {
                x,
                y,
                ch: cell.ch,
                fg: color_code(cell.fg),
                bg: color_code(cell.bg),
            })
            .collect();
        cells.sort_by_key(|c| (c.y, c.x));

        let now = iso_now();
        Self {
            version: PROJECT_VERSION.to_string(),
            metadata: Metadata {
                name: name.to_string(),
                created_iso: created_iso.unwrap_or_else(|| now.clone()),
                modified_iso: now,
            },
            canvas: CanvasDoc { cells },
            viewport: ViewportDoc {
                x: state.viewport.origin_x,
                y: state.viewport.origin_y,
                cursor: PointDoc {
                    x: state.viewport.cursor_x,
                    y: state.viewport.cursor_y,
                },
                origin: PointDoc {
                    x: state.viewport.origin_marker_x,
                    y: state.viewport.origin_marker_y,
                },
                y_direction: state.viewport.y_direction.name().to_string(),
            },
            grid: GridDoc::from(&state.grid),
            bookmarks: state
                .bookmarks
                .iter()
                .map(|(k, (x, y))| (k.to_string(), PointDoc { x, y }))
                .collect(),
            zones: ZonesDoc { zones: zone_specs },
        }
    }

    /// Replace the mutable session state with this document's content and
    /// return the zone descriptors for the caller to instantiate.
    pub fn apply(self, state: &mut AppState) -> Vec<ZoneSpec> {
        state.canvas.clear();
        for cell in &self.canvas.cells {
            if cell.ch == core_canvas::EMPTY_GLYPH && cell.fg.is_none() && cell.bg.is_none() {
                continue;
            }
            state.canvas.set(
                cell.x,
                cell.y,
                Cell::styled(cell.ch, code_color(cell.fg), code_color(cell.bg)),
            );
        }
        state.viewport.set_scroll_origin(self.viewport.x, self.viewport.y);
        state
            .viewport
            .set_origin_marker(self.viewport.origin.x, self.viewport.origin.y);
        state.viewport.y_direction = match self.viewport.y_direction.as_str() {
            "up" => YDirection::Up,
            _ => YDirection::Down,
        };
        state
            .viewport
            .set_cursor(self.viewport.cursor.x, self.viewport.cursor.y);
        state.grid = self.grid.to_settings();
        state.bookmarks.clear();
        for (key, point) in &self.bookmarks {
            if let Some(k) = key.chars().next()
                && key.chars().count() == 1
            {
                state.bookmarks.set(k, point.x, point.y);
            }
        }
        self.zones.zones
    }
}

pub fn save_project(doc: &ProjectDoc, path: &Path) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, json + "\n")?;
    tracing::info!(target: "io", file = %path.display(), cells = doc.canvas.cells.len(), "project_saved");
    Ok(())
}

pub fn load_project(path: &Path) -> Result<ProjectDoc, ProjectError> {
    let content = std::fs::read_to_string(path)?;
    let doc: ProjectDoc = serde_json::from_str(&content)?;
    tracing::info!(target: "io", file = %path.display(), cells = doc.canvas.cells.len(), "project_loaded");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_zones::ZoneConfig;

    fn sample_state() -> AppState {
        let mut state = AppState::new();
        state
            .canvas
            .write_text(3, 2, "Hi", Color::Ansi(2), Color::Default);
        state.canvas.set(-5, 9, Cell::new('#'));
        state.viewport.set_cursor(3, 2);
        state.viewport.set_origin_marker(1, 1);
        state.bookmarks.set('a', 10, 20);
        state.bookmarks.set('b', 100, 200);
        state.grid.set_major(8);
        state.grid.line_mode = LineMode::Dots;
        state
    }

    fn sample_zones() -> Vec<ZoneSpec> {
        vec![ZoneSpec {
            name: "log".to_string(),
            x: 40,
            y: 0,
            width: 30,
            height: 10,
            config: ZoneConfig::Pipe {
                command: "dmesg".to_string(),
                auto_scroll: true,
                max_lines: 200,
            },
            bookmark: Some('l'),
            description: None,
        }]
    }

    #[test]
    fn round_trip_preserves_normative_fields() {
        let state = sample_state();
        let doc = ProjectDoc::capture(&state, sample_zones(), "demo", None);
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: ProjectDoc = serde_json::from_str(&json).unwrap();

        let mut restored = AppState::new();
        let zones = parsed.apply(&mut restored);

        assert_eq!(restored.canvas.count(), state.canvas.count());
        assert_eq!(restored.canvas.get(3, 2).ch, 'H');
        assert_eq!(restored.canvas.get(3, 2).fg, Color::Ansi(2));
        assert_eq!(restored.canvas.get(-5, 9).ch, '#');
        assert_eq!(restored.viewport.cursor_x, 3);
        assert_eq!(restored.viewport.origin_marker_x, 1);
        assert_eq!(restored.bookmarks.get('a'), Some((10, 20)));
        assert_eq!(restored.bookmarks.get('b'), Some((100, 200)));
        assert_eq!(restored.grid.major_interval, 8);
        assert_eq!(restored.grid.line_mode, LineMode::Dots);
        assert_eq!(zones, sample_zones());
    }

    #[test]
    fn cells_sorted_and_skip_empty() {
        let mut state = AppState::new();
        state.canvas.set(5, 1, Cell::new('b'));
        state.canvas.set(0, 0, Cell::new('a'));
        let doc = ProjectDoc::capture(&state, Vec::new(), "t", None);
        assert_eq!(doc.canvas.cells[0].ch, 'a');
        assert_eq!(doc.canvas.cells[1].ch, 'b');
        // No blank cells are ever captured (the canvas never stores them).
        assert!(doc.canvas.cells.iter().all(|c| c.ch != ' ' || c.fg.is_some() || c.bg.is_some()));
    }

    #[test]
    fn unknown_fields_ignored_on_load() {
        let json = r#"{
            "version": "1.0",
            "future_section": {"a": 1},
            "canvas": {"cells": [{"x": 0, "y": 0, "char": "q", "sparkle": true}]}
        }"#;
        let doc: ProjectDoc = serde_json::from_str(json).unwrap();
        let mut state = AppState::new();
        let zones = doc.apply(&mut state);
        assert!(zones.is_empty());
        assert_eq!(state.canvas.get(0, 0).ch, 'q');
    }

    #[test]
    fn malformed_file_errors_without_touching_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_project(&path),
            Err(ProjectError::Parse(_))
        ));
    }

    #[test]
    fn save_load_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        let state = sample_state();
        let doc = ProjectDoc::capture(&state, sample_zones(), "demo", None);
        save_project(&doc, &path).unwrap();
        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.version, "1.0");
        assert_eq!(loaded.zones.zones, sample_zones());
        assert_eq!(loaded.metadata.name, "demo");
    }

    #[test]
    fn created_timestamp_carried_on_resave() {
        let state = sample_state();
        let doc = ProjectDoc::capture(
            &state,
            Vec::new(),
            "demo",
            Some("2020-01-01T00:00:00Z".to_string()),
        );
        assert_eq!(doc.metadata.created_iso, "2020-01-01T00:00:00Z");
        assert_ne!(doc.metadata.modified_iso, doc.metadata.created_iso);
    }

    #[test]
    fn y_direction_round_trips() {
        let mut state = sample_state();
        state.viewport.y_direction = YDirection::Up;
        let doc = ProjectDoc::capture(&state, Vec::new(), "t", None);
        let mut restored = AppState::new();
        doc.apply(&mut restored);
        assert_eq!(restored.viewport.y_direction, YDirection::Up);
    }
}
