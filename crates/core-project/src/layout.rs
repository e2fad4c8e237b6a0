//! Layout templates: named zone arrangements on disk.
//!
//! A layout is a line-oriented text file (one `key: value` per line, zones
//! introduced by `- name: …` under a `zones:` header) stored in the
//! platform config directory. Parsing is pure classification with no side
//! effects; unknown keys are ignored so hand-edited files stay loadable.
//!
//! ```text
//! name: dashboard
//! description: build + logs
//! cursor: 10 5
//! zones:
//!   - name: log
//!     type: pipe
//!     position: 0 0
//!     size: 40 10
//!     command: tail -n 50 build.log
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use core_zones::{ZoneConfig, ZoneSpec};

use crate::ProjectError;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub name: String,
    pub description: Option<String>,
    pub cursor: Option<(i64, i64)>,
    pub zones: Vec<ZoneSpec>,
}

/// Platform directory holding layout files.
pub fn layouts_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mygrid")
        .join("layouts")
}

pub fn save_layout(layout: &Layout, path: &Path) -> Result<(), ProjectError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize(layout))?;
    tracing::info!(target: "io", layout = layout.name.as_str(), file = %path.display(), "layout_saved");
    Ok(())
}

pub fn load_layout(path: &Path) -> Result<Layout, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        ProjectError::UnknownLayout(
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
                .to_string(),
        )
    })?;
    parse(&content)
}

pub fn serialize(layout: &Layout) -> String {
    let mut out = String::new();
    out.push_str(&format!("name: {}\n", layout.name));
    if let Some(desc) = &layout.description {
        out.push_str(&format!("description: {desc}\n"));
    }
    if let Some((x, y)) = layout.cursor {
        out.push_str(&format!("cursor: {x} {y}\n"));
    }
    out.push_str("zones:\n");
    for zone in &layout.zones {
        out.push_str(&format!("  - name: {}\n", zone.name));
        out.push_str(&format!("    type: {}\n", zone.config.kind_name()));
        out.push_str(&format!("    position: {} {}\n", zone.x, zone.y));
        out.push_str(&format!("    size: {} {}\n", zone.width, zone.height));
        match &zone.config {
            ZoneConfig::Static | ZoneConfig::Clipboard => {}
            ZoneConfig::Pipe {
                command,
                auto_scroll,
                max_lines,
            } => {
                out.push_str(&format!("    command: {command}\n"));
                out.push_str(&format!("    auto_scroll: {auto_scroll}\n"));
                out.push_str(&format!("    max_lines: {max_lines}\n"));
            }
            ZoneConfig::Watch {
                command,
                refresh_secs,
                watch_path,
                auto_scroll,
                max_lines,
            } => {
                out.push_str(&format!("    command: {command}\n"));
                if let Some(secs) = refresh_secs {
                    out.push_str(&format!("    interval: {secs}\n"));
                }
                if let Some(path) = watch_path {
                    out.push_str(&format!("    watch_path: {}\n", path.display()));
                }
                out.push_str(&format!("    auto_scroll: {auto_scroll}\n"));
                out.push_str(&format!("    max_lines: {max_lines}\n"));
            }
            ZoneConfig::Pty { command, max_lines } => {
                if let Some(command) = command {
                    out.push_str(&format!("    command: {command}\n"));
                }
                out.push_str(&format!("    max_lines: {max_lines}\n"));
            }
            ZoneConfig::Fifo {
                path,
                auto_scroll,
                max_lines,
            } => {
                out.push_str(&format!("    path: {}\n", path.display()));
                out.push_str(&format!("    auto_scroll: {auto_scroll}\n"));
                out.push_str(&format!("    max_lines: {max_lines}\n"));
            }
            ZoneConfig::Socket {
                port,
                auto_scroll,
                max_lines,
            } => {
                out.push_str(&format!("    port: {port}\n"));
                out.push_str(&format!("    auto_scroll: {auto_scroll}\n"));
                out.push_str(&format!("    max_lines: {max_lines}\n"));
            }
            ZoneConfig::Pager { path, ansi } => {
                out.push_str(&format!("    path: {}\n", path.display()));
                out.push_str(&format!("    ansi: {ansi}\n"));
            }
        }
        if let Some(b) = zone.bookmark {
            out.push_str(&format!("    bookmark: {b}\n"));
        }
        if let Some(desc) = &zone.description {
            out.push_str(&format!("    description: {desc}\n"));
        }
    }
    out
}

pub fn parse(content: &str) -> Result<Layout, ProjectError> {
    let mut layout = Layout::default();
    let mut in_zones = false;
    let mut current: Option<HashMap<String, String>> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "zones:" {
            in_zones = true;
            continue;
        }
        let body = if let Some(rest) = line.strip_prefix("- ") {
            if in_zones {
                // New zone entry: flush the previous one first.
                if let Some(fields) = current.take() {
                    layout.zones.push(zone_from_fields(fields)?);
                }
                current = Some(HashMap::new());
            }
            rest
        } else {
            line
        };
        let Some((key, value)) = body.split_once(':') else {
            return Err(ProjectError::Layout(format!("expected 'key: value': {line}")));
        };
        let (key, value) = (key.trim(), value.trim());
        match (&mut current, key) {
            (Some(fields), _) => {
                fields.insert(key.to_string(), value.to_string());
            }
            (None, "name") => layout.name = value.to_string(),
            (None, "description") => layout.description = Some(value.to_string()),
            (None, "cursor") => {
                let (x, y) = parse_pair(value)
                    .ok_or_else(|| ProjectError::Layout(format!("bad cursor: {value}")))?;
                layout.cursor = Some((x, y));
            }
            (None, _) => {} // unknown top-level keys are ignored
        }
    }
    if let Some(fields) = current.take() {
        layout.zones.push(zone_from_fields(fields)?);
    }
    Ok(layout)
}

fn parse_pair(value: &str) -> Option<(i64, i64)> {
    let mut parts = value.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((x, y))
}

fn zone_from_fields(fields: HashMap<String, String>) -> Result<ZoneSpec, ProjectError> {
    let name = fields
        .get("name")
        .cloned()
        .ok_or_else(|| ProjectError::Layout("zone missing name".to_string()))?;
    let kind = fields.get("type").map(String::as_str).unwrap_or("static");
    let (x, y) = fields
        .get("position")
        .and_then(|v| parse_pair(v))
        .ok_or_else(|| ProjectError::Layout(format!("zone '{name}' missing position")))?;
    let (width, height) = fields
        .get("size")
        .and_then(|v| parse_pair(v))
        .ok_or_else(|| ProjectError::Layout(format!("zone '{name}' missing size")))?;

    let auto_scroll = fields
        .get("auto_scroll")
        .map(|v| v == "true")
        .unwrap_or(true);
    let max_lines = fields
        .get("max_lines")
        .and_then(|v| v.parse().ok())
        .unwrap_or(core_zones::DEFAULT_MAX_LINES);
    let command = || {
        fields
            .get("command")
            .cloned()
            .ok_or_else(|| ProjectError::Layout(format!("zone '{name}' missing command")))
    };

    let config = match kind {
        "static" => ZoneConfig::Static,
        "clipboard" => ZoneConfig::Clipboard,
        "pipe" => ZoneConfig::Pipe {
            command: command()?,
            auto_scroll,
            max_lines,
        },
        "watch" => ZoneConfig::Watch {
            command: command()?,
            refresh_secs: fields.get("interval").and_then(|v| v.parse().ok()),
            watch_path: fields.get("watch_path").map(PathBuf::from),
            auto_scroll,
            max_lines,
        },
        "pty" => ZoneConfig::Pty {
            command: fields.get("command").cloned(),
            max_lines,
        },
        "fifo" => ZoneConfig::Fifo {
            path: fields
                .get("path")
                .map(PathBuf::from)
                .ok_or_else(|| ProjectError::Layout(format!("zone '{name}' missing path")))?,
            auto_scroll,
            max_lines,
        },
        "socket" => ZoneConfig::Socket {
            port: fields
                .get("port")
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| ProjectError::Layout(format!("zone '{name}' missing port")))?,
            auto_scroll,
            max_lines,
        },
        "pager" => ZoneConfig::Pager {
            path: fields
                .get("path")
                .map(PathBuf::from)
                .ok_or_else(|| ProjectError::Layout(format!("zone '{name}' missing path")))?,
            ansi: fields.get("ansi").map(|v| v == "true").unwrap_or(false),
        },
        other => {
            return Err(ProjectError::Layout(format!(
                "zone '{name}' has unknown type '{other}'"
            )));
        }
    };

    Ok(ZoneSpec {
        name,
        x,
        y,
        width,
        height,
        config,
        bookmark: fields.get("bookmark").and_then(|v| v.chars().next()),
        description: fields.get("description").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Layout {
        Layout {
            name: "dash".to_string(),
            description: Some("two zones".to_string()),
            cursor: Some((10, 5)),
            zones: vec![
                ZoneSpec {
                    name: "log".to_string(),
                    x: 0,
                    y: 0,
                    width: 40,
                    height: 10,
                    config: ZoneConfig::Pipe {
                        command: "tail -n 50 build.log".to_string(),
                        auto_scroll: true,
                        max_lines: 500,
                    },
                    bookmark: Some('l'),
                    description: None,
                },
                ZoneSpec {
                    name: "clock".to_string(),
                    x: 42,
                    y: 0,
                    width: 20,
                    height: 3,
                    config: ZoneConfig::Watch {
                        command: "date".to_string(),
                        refresh_secs: Some(1.0),
                        watch_path: None,
                        auto_scroll: true,
                        max_lines: 10,
                    },
                    bookmark: None,
                    description: Some("wall clock".to_string()),
                },
            ],
        }
    }

    #[test]
    fn serialize_parse_round_trip() {
        let layout = sample();
        let text = serialize(&layout);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, layout);
    }

    #[test]
    fn parse_tolerates_comments_and_unknown_keys() {
        let text = "\
# a comment
name: t
theme: dark
zones:
  - name: a
    type: static
    position: 1 2
    size: 10 4
    future_knob: 7
";
        let layout = parse(text).unwrap();
        assert_eq!(layout.name, "t");
        assert_eq!(layout.zones.len(), 1);
        assert_eq!(layout.zones[0].config, ZoneConfig::Static);
        assert_eq!((layout.zones[0].x, layout.zones[0].y), (1, 2));
    }

    #[test]
    fn command_value_keeps_colons_and_spaces() {
        let text = "\
name: t
zones:
  - name: s
    type: pipe
    position: 0 0
    size: 10 4
    command: sh -c 'echo a: b'
";
        let layout = parse(text).unwrap();
        match &layout.zones[0].config {
            ZoneConfig::Pipe { command, .. } => assert_eq!(command, "sh -c 'echo a: b'"),
            other => panic!("expected pipe, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let text = "name: t\nzones:\n  - name: s\n    type: socket\n    position: 0 0\n    size: 5 5\n";
        assert!(matches!(parse(text), Err(ProjectError::Layout(_))));
    }

    #[test]
    fn unknown_zone_type_is_an_error() {
        let text = "name: t\nzones:\n  - name: s\n    type: hologram\n    position: 0 0\n    size: 5 5\n";
        assert!(matches!(parse(text), Err(ProjectError::Layout(_))));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.layout");
        save_layout(&sample(), &path).unwrap();
        let loaded = load_layout(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn load_missing_maps_to_unknown_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghost.layout");
        assert!(matches!(
            load_layout(&path),
            Err(ProjectError::UnknownLayout(name)) if name == "ghost"
        ));
    }
}
