//! Command execution.
//!
//! One executor serves both the COMMAND line and the API server, which is
//! what makes the external protocol exactly the keyboard command language.
//! Commands validate their arguments before touching state, so a failed
//! command leaves everything as it was; the result is a status message
//! (plus structured data for `status`) and never a crash; unknown or
//! malformed commands are ordinary errors.

use std::path::PathBuf;
use std::time::Duration;

use core_canvas::{Cell, Color, PALETTE};
use core_state::{AppState, Mode, YDirection, valid_key};
use core_zones::{ZoneConfig, ZoneError, ZoneManager, ZoneSpec};

use crate::parser::{
    ClipboardCmd, ColorCmd, GridCmd, LayoutCmd, OriginArg, ParsedCommand, WatchArg, YankTarget,
    ZoneCmd, parse,
};

/// External clipboard bridge (`yank system` / `paste system`). The OS
/// integration lives outside the core; this is its whole contract.
pub trait SystemClipboard {
    fn read_text(&mut self) -> Result<String, String>;
    fn write_text(&mut self, text: &str) -> Result<(), String>;
}

/// Execution environment: configuration defaults and optional collaborators.
pub struct ExecCtx<'a> {
    pub default_max_lines: usize,
    pub layouts_dir: PathBuf,
    pub system_clipboard: Option<&'a mut dyn SystemClipboard>,
}

impl Default for ExecCtx<'_> {
    fn default() -> Self {
        Self {
            default_max_lines: core_zones::DEFAULT_MAX_LINES,
            layouts_dir: core_project::layouts_dir(),
            system_clipboard: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub ok: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub quit: bool,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            data: None,
            quit: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            data: None,
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            ok: true,
            message: "bye".to_string(),
            data: None,
            quit: true,
        }
    }
}

/// Parse and run one command line against the application state.
pub fn execute(
    line: &str,
    state: &mut AppState,
    zones: &mut ZoneManager,
    ctx: &mut ExecCtx<'_>,
) -> CommandResult {
    let parsed = parse(line);
    tracing::debug!(target: "commands", line_len = line.len(), "execute");
    match parsed {
        ParsedCommand::Empty => CommandResult::ok(""),
        ParsedCommand::Invalid(msg) => CommandResult::error(msg),
        ParsedCommand::Unknown(name) => CommandResult::error(format!("unknown command: {name}")),
        ParsedCommand::Quit => CommandResult::quit(),
        ParsedCommand::Write(path) => write_project(state, zones, path),
        ParsedCommand::WriteQuit(path) => {
            let mut result = write_project(state, zones, path);
            if result.ok {
                result.quit = true;
            }
            result
        }
        ParsedCommand::Goto(x, y) => {
            state.viewport.set_cursor(x, y);
            CommandResult::ok(format!("cursor at ({x},{y})"))
        }
        ParsedCommand::Origin(arg) => match arg {
            OriginArg::Show => {
                let vp = &state.viewport;
                CommandResult::ok(format!(
                    "origin at ({},{})",
                    vp.origin_marker_x, vp.origin_marker_y
                ))
            }
            OriginArg::Here => {
                let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
                state.viewport.set_origin_marker(x, y);
                CommandResult::ok(format!("origin at ({x},{y})"))
            }
            OriginArg::At(x, y) => {
                state.viewport.set_origin_marker(x, y);
                CommandResult::ok(format!("origin at ({x},{y})"))
            }
        },
        ParsedCommand::Pan(x, y) => {
            state.viewport.pan(x, y, false);
            CommandResult::ok(format!(
                "viewport at ({},{})",
                state.viewport.origin_x, state.viewport.origin_y
            ))
        }
        ParsedCommand::Clear => {
            let removed = state.canvas.count();
            state.canvas.clear();
            state.dirty = true;
            CommandResult::ok(format!("cleared {removed} cells"))
        }
        ParsedCommand::Rect { w, h, glyph } => {
            if w < 1 || h < 1 {
                return CommandResult::error("rect needs W >= 1 and H >= 1");
            }
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            state.canvas.draw_rect(
                x,
                y,
                w,
                h,
                glyph,
                state.border_style,
                state.color.fg,
                state.color.bg,
            );
            state.dirty = true;
            CommandResult::ok(format!("rect {w}x{h} at ({x},{y})"))
        }
        ParsedCommand::Line { x2, y2, glyph } => {
            let (x1, y1) = (state.viewport.cursor_x, state.viewport.cursor_y);
            let glyph = glyph.unwrap_or_else(|| {
                if y1 == y2 {
                    state.border_style.horizontal()
                } else if x1 == x2 {
                    state.border_style.vertical()
                } else {
                    '*'
                }
            });
            state
                .canvas
                .draw_line(x1, y1, x2, y2, glyph, state.color.fg, state.color.bg);
            state.dirty = true;
            CommandResult::ok(format!("line ({x1},{y1})-({x2},{y2})"))
        }
        ParsedCommand::Text(message) => {
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            let end = state
                .canvas
                .write_text(x, y, &message, state.color.fg, state.color.bg);
            state.dirty = true;
            CommandResult::ok(format!("wrote {} glyphs", end - x))
        }
        ParsedCommand::Grid(cmd) => grid_command(state, cmd),
        ParsedCommand::Mark { key, position } => {
            if !valid_key(key) {
                return CommandResult::error("bookmark keys are a-z or 0-9");
            }
            let (x, y) =
                position.unwrap_or((state.viewport.cursor_x, state.viewport.cursor_y));
            state.bookmarks.set(key, x, y);
            CommandResult::ok(format!("mark '{key}' at ({x},{y})"))
        }
        ParsedCommand::DelMark(key) => {
            if state.bookmarks.delete(key) {
                CommandResult::ok(format!("mark '{key}' deleted"))
            } else {
                CommandResult::error(format!("no mark '{key}'"))
            }
        }
        ParsedCommand::DelMarks => {
            let n = state.bookmarks.len();
            state.bookmarks.clear();
            CommandResult::ok(format!("deleted {n} marks"))
        }
        ParsedCommand::Marks => {
            if state.bookmarks.is_empty() {
                CommandResult::ok("no marks set")
            } else {
                let listing: Vec<String> = state
                    .bookmarks
                    .iter()
                    .map(|(k, (x, y))| format!("{k}:({x},{y})"))
                    .collect();
                CommandResult::ok(listing.join(" "))
            }
        }
        ParsedCommand::Export(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from("export.txt"));
            match core_project::export_to_file(&state.canvas, &path) {
                Ok(lines) => CommandResult::ok(format!("exported {lines} lines to {}", path.display())),
                Err(e) => CommandResult::error(e.to_string()),
            }
        }
        ParsedCommand::Import(path) => {
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            match core_project::import_from_file(
                &mut state.canvas,
                x,
                y,
                &path,
                state.color.fg,
                state.color.bg,
            ) {
                Ok(rows) => {
                    state.dirty = true;
                    CommandResult::ok(format!("imported {rows} rows at ({x},{y})"))
                }
                Err(e) => CommandResult::error(e.to_string()),
            }
        }
        ParsedCommand::YDir { up } => {
            state.viewport.y_direction = if up { YDirection::Up } else { YDirection::Down };
            CommandResult::ok(format!("y axis points {}", state.viewport.y_direction.name()))
        }
        ParsedCommand::Yank { w, h, target } => yank_command(state, zones, ctx, w, h, target),
        ParsedCommand::Paste { system } => {
            if system {
                let Some(clip) = ctx.system_clipboard.as_mut() else {
                    return CommandResult::error("system clipboard tool not available");
                };
                match clip.read_text() {
                    Ok(text) => state.clipboard.from_text(&text),
                    Err(e) => return CommandResult::error(format!("system clipboard: {e}")),
                }
            }
            if state.clipboard.is_empty() {
                return CommandResult::error("clipboard is empty");
            }
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            state.clipboard.paste(&mut state.canvas, x, y);
            state.dirty = true;
            CommandResult::ok(format!(
                "pasted {}x{} at ({x},{y})",
                state.clipboard.width(),
                state.clipboard.height()
            ))
        }
        ParsedCommand::Clipboard(cmd) => clipboard_command(state, zones, cmd),
        ParsedCommand::Color(cmd) => color_command(state, cmd),
        ParsedCommand::Palette => {
            let names: Vec<&str> = PALETTE.iter().map(|(name, _)| *name).collect();
            CommandResult::ok(names.join(" "))
        }
        ParsedCommand::Zone(cmd) => zone_command(state, zones, ctx, cmd),
        ParsedCommand::Layout(cmd) => layout_command(state, zones, ctx, cmd),
        ParsedCommand::Status => status_command(state, zones),
        ParsedCommand::Fill { x, y, w, h, glyph } => {
            if w < 1 || h < 1 {
                return CommandResult::error("fill needs W >= 1 and H >= 1");
            }
            for cy in y..y + h {
                for cx in x..x + w {
                    state
                        .canvas
                        .set(cx, cy, Cell::styled(glyph, state.color.fg, state.color.bg));
                }
            }
            state.dirty = true;
            CommandResult::ok(format!("filled {w}x{h} with '{glyph}'"))
        }
    }
}

fn write_project(
    state: &mut AppState,
    zones: &ZoneManager,
    path: Option<PathBuf>,
) -> CommandResult {
    let Some(path) = path.or_else(|| state.file_path.clone()) else {
        return CommandResult::error("no file name (use: write PATH)");
    };
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();
    let specs: Vec<ZoneSpec> = zones.zones().iter().map(|z| z.spec.clone()).collect();
    let doc = core_project::ProjectDoc::capture(
        state,
        specs,
        &name,
        state.project_created_iso.clone(),
    );
    match core_project::save_project(&doc, &path) {
        Ok(()) => {
            state.project_created_iso = Some(doc.metadata.created_iso.clone());
            state.file_path = Some(path.clone());
            state.dirty = false;
            CommandResult::ok(format!(
                "wrote {} ({} cells, {} zones)",
                path.display(),
                doc.canvas.cells.len(),
                doc.zones.zones.len()
            ))
        }
        Err(e) => CommandResult::error(e.to_string()),
    }
}

fn grid_command(state: &mut AppState, cmd: GridCmd) -> CommandResult {
    let grid = &mut state.grid;
    match cmd {
        GridCmd::MajorOnly => {
            grid.set_minor(None);
            CommandResult::ok("grid: major only")
        }
        GridCmd::MinorDefault => {
            grid.set_minor(Some((grid.major_interval / 2).max(1)));
            CommandResult::ok(format!(
                "grid minor interval {}",
                grid.minor_interval.unwrap_or(1)
            ))
        }
        GridCmd::SetMajor(n) => {
            grid.set_major(n);
            CommandResult::ok(format!("grid major interval {n}"))
        }
        GridCmd::Mode(mode) => {
            grid.line_mode = match mode {
                "off" => core_state::LineMode::Off,
                "lines" => core_state::LineMode::Lines,
                "dots" => core_state::LineMode::Dots,
                _ => core_state::LineMode::Markers,
            };
            CommandResult::ok(format!("grid mode {mode}"))
        }
        GridCmd::Rulers(on) => {
            grid.show_rulers = on;
            CommandResult::ok(format!("rulers {}", if on { "on" } else { "off" }))
        }
        GridCmd::Labels(on) => {
            grid.show_labels = on;
            CommandResult::ok(format!("labels {}", if on { "on" } else { "off" }))
        }
        GridCmd::Interval { major, minor } => {
            if major < 1 {
                return CommandResult::error("major interval must be >= 1");
            }
            grid.set_major(major);
            grid.set_minor(minor);
            CommandResult::ok(format!("grid interval {major}{}", match minor {
                Some(m) => format!(" / {m}"),
                None => String::new(),
            }))
        }
    }
}

fn yank_command(
    state: &mut AppState,
    zones: &ZoneManager,
    ctx: &mut ExecCtx<'_>,
    w: i64,
    h: i64,
    target: YankTarget,
) -> CommandResult {
    match target {
        YankTarget::Canvas | YankTarget::System => {
            if w < 1 || h < 1 {
                return CommandResult::error("yank needs W >= 1 and H >= 1");
            }
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            state.clipboard.yank(&state.canvas, x, y, w, h);
            if matches!(target, YankTarget::System) {
                let Some(clip) = ctx.system_clipboard.as_mut() else {
                    return CommandResult::error("system clipboard tool not available");
                };
                if let Err(e) = clip.write_text(&state.clipboard.to_text()) {
                    return CommandResult::error(format!("system clipboard: {e}"));
                }
            }
            CommandResult::ok(format!("yanked {w}x{h} at ({x},{y})"))
        }
        YankTarget::Zone(name) => {
            let Some(zone) = zones.get(&name) else {
                return CommandResult::error(format!("no zone named '{name}'"));
            };
            let lines: Vec<core_canvas::StyledLine> = zone.buffer.lines().cloned().collect();
            let width = zone.inner_width().max(1);
            state.clipboard.yank_lines(&lines, width);
            CommandResult::ok(format!(
                "yanked {} lines from zone '{}'",
                lines.len(),
                zone.name()
            ))
        }
    }
}

fn clipboard_command(
    state: &mut AppState,
    zones: &mut ZoneManager,
    cmd: ClipboardCmd,
) -> CommandResult {
    match cmd {
        ClipboardCmd::Show => {
            if state.clipboard.is_empty() {
                CommandResult::ok("clipboard empty")
            } else {
                CommandResult::ok(format!(
                    "clipboard {}x{} ({} lines)",
                    state.clipboard.width(),
                    state.clipboard.height(),
                    state.clipboard.line_count()
                ))
            }
        }
        ClipboardCmd::Clear => {
            state.clipboard.clear();
            CommandResult::ok("clipboard cleared")
        }
        ClipboardCmd::Zone => {
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            let width = (state.clipboard.width() as i64 + 2).max(12);
            let height = (state.clipboard.height() as i64 + 2).max(4);
            let spec = ZoneSpec {
                name: "clipboard".to_string(),
                x,
                y,
                width,
                height,
                config: ZoneConfig::Clipboard,
                bookmark: None,
                description: None,
            };
            match zones.create(spec) {
                Ok(_) => CommandResult::ok(format!("clipboard zone at ({x},{y})")),
                Err(e) => CommandResult::error(e.to_string()),
            }
        }
    }
}

fn color_command(state: &mut AppState, cmd: ColorCmd) -> CommandResult {
    match cmd {
        ColorCmd::Off => {
            state.color.reset();
            CommandResult::ok("colors off")
        }
        ColorCmd::Set { fg, bg } => {
            let Some(fg_color) = Color::parse(&fg) else {
                return CommandResult::error(format!("unknown color '{fg}' (see :palette)"));
            };
            let bg_color = match &bg {
                Some(name) => match Color::parse(name) {
                    Some(c) => c,
                    None => {
                        return CommandResult::error(format!("unknown color '{name}' (see :palette)"));
                    }
                },
                None => state.color.bg,
            };
            state.color.fg = fg_color;
            state.color.bg = bg_color;
            CommandResult::ok(format!(
                "color {} on {}",
                state.color.fg, state.color.bg
            ))
        }
        ColorCmd::Apply { w, h } => {
            if w < 1 || h < 1 {
                return CommandResult::error("color apply needs W >= 1 and H >= 1");
            }
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            let mut recolored = 0usize;
            for cy in y..y + h {
                for cx in x..x + w {
                    let cell = state.canvas.get(cx, cy);
                    if !cell.is_blank() {
                        state.canvas.set(
                            cx,
                            cy,
                            Cell::styled(cell.ch, state.color.fg, state.color.bg),
                        );
                        recolored += 1;
                    }
                }
            }
            state.dirty = recolored > 0 || state.dirty;
            CommandResult::ok(format!("recolored {recolored} cells"))
        }
    }
}

fn zone_command(
    state: &mut AppState,
    zones: &mut ZoneManager,
    ctx: &mut ExecCtx<'_>,
    cmd: ZoneCmd,
) -> CommandResult {
    let cursor = (state.viewport.cursor_x, state.viewport.cursor_y);
    let max_lines = ctx.default_max_lines;
    match cmd {
        ZoneCmd::Create {
            name,
            position,
            width,
            height,
        } => {
            let (x, y) = position.unwrap_or(cursor);
            create_zone(zones, state, ZoneSpec {
                name,
                x,
                y,
                width,
                height,
                config: ZoneConfig::Static,
                bookmark: None,
                description: None,
            })
        }
        ZoneCmd::Pipe {
            name,
            width,
            height,
            command,
        } => create_zone(zones, state, ZoneSpec {
            name,
            x: cursor.0,
            y: cursor.1,
            width,
            height,
            config: ZoneConfig::Pipe {
                command,
                auto_scroll: true,
                max_lines,
            },
            bookmark: None,
            description: None,
        }),
        ZoneCmd::Watch {
            name,
            width,
            height,
            trigger,
            command,
        } => {
            let (refresh_secs, watch_path) = match trigger {
                WatchArg::Secs(s) => (Some(s), None),
                WatchArg::Path(p) => (None, Some(p)),
            };
            create_zone(zones, state, ZoneSpec {
                name,
                x: cursor.0,
                y: cursor.1,
                width,
                height,
                config: ZoneConfig::Watch {
                    command,
                    refresh_secs,
                    watch_path,
                    auto_scroll: true,
                    max_lines,
                },
                bookmark: None,
                description: None,
            })
        }
        ZoneCmd::Pty {
            name,
            width,
            height,
            shell,
        } => create_zone(zones, state, ZoneSpec {
            name,
            x: cursor.0,
            y: cursor.1,
            width,
            height,
            config: ZoneConfig::Pty {
                command: shell,
                max_lines,
            },
            bookmark: None,
            description: None,
        }),
        ZoneCmd::Fifo {
            name,
            width,
            height,
            path,
        } => create_zone(zones, state, ZoneSpec {
            name,
            x: cursor.0,
            y: cursor.1,
            width,
            height,
            config: ZoneConfig::Fifo {
                path,
                auto_scroll: true,
                max_lines,
            },
            bookmark: None,
            description: None,
        }),
        ZoneCmd::Socket {
            name,
            width,
            height,
            port,
        } => create_zone(zones, state, ZoneSpec {
            name,
            x: cursor.0,
            y: cursor.1,
            width,
            height,
            config: ZoneConfig::Socket {
                port,
                auto_scroll: true,
                max_lines,
            },
            bookmark: None,
            description: None,
        }),
        ZoneCmd::Pager {
            name,
            width,
            height,
            path,
        } => create_zone(zones, state, ZoneSpec {
            name,
            x: cursor.0,
            y: cursor.1,
            width,
            height,
            config: ZoneConfig::Pager { path, ansi: false },
            bookmark: None,
            description: None,
        }),
        ZoneCmd::Delete(name) => match zones.delete(&name) {
            Ok(()) => {
                if state
                    .focused_zone
                    .as_deref()
                    .is_some_and(|f| f.eq_ignore_ascii_case(&name))
                {
                    state.focused_zone = None;
                    state.mode = Mode::Nav;
                }
                CommandResult::ok(format!("zone '{name}' deleted"))
            }
            Err(e) => CommandResult::error(e.to_string()),
        },
        ZoneCmd::Goto(name) => match zones.get(&name) {
            Some(zone) => {
                state.viewport.set_cursor(zone.spec.x, zone.spec.y);
                CommandResult::ok(format!(
                    "cursor at zone '{}' ({},{})",
                    zone.name(),
                    zone.spec.x,
                    zone.spec.y
                ))
            }
            None => CommandResult::error(format!("no zone named '{name}'")),
        },
        ZoneCmd::Info(name) => zone_info(zones, name),
        ZoneCmd::Refresh(name) => match zones.refresh(&name) {
            Ok(None) => CommandResult::ok(format!("zone '{name}' refreshed")),
            Ok(Some(err)) => CommandResult::error(err),
            Err(e) => CommandResult::error(e.to_string()),
        },
        ZoneCmd::Pause(name) => match zones.pause(&name) {
            Ok(()) => CommandResult::ok(format!("zone '{name}' paused")),
            Err(e) => CommandResult::error(e.to_string()),
        },
        ZoneCmd::Resume(name) => match zones.resume(&name) {
            Ok(()) => CommandResult::ok(format!("zone '{name}' resumed")),
            Err(e) => CommandResult::error(e.to_string()),
        },
        ZoneCmd::Send { name, text } => {
            let mut bytes = text.into_bytes();
            bytes.push(b'\n');
            match zones.send(&name, &bytes) {
                Ok(()) => CommandResult::ok(format!("sent to '{name}'")),
                Err(e) => CommandResult::error(e.to_string()),
            }
        }
        ZoneCmd::Focus(name) => match zones.get(&name) {
            Some(zone) => {
                state.focused_zone = Some(zone.name().to_string());
                state.mode = Mode::PtyFocused;
                CommandResult::ok(format!("focused zone '{}' (Esc to leave)", zone.name()))
            }
            None => CommandResult::error(format!("no zone named '{name}'")),
        },
        ZoneCmd::List => {
            if zones.is_empty() {
                CommandResult::ok("no zones")
            } else {
                let listing: Vec<String> = zones
                    .zones()
                    .iter()
                    .map(|z| {
                        format!(
                            "{}[{}:{}]",
                            z.name(),
                            z.spec.config.kind_name(),
                            z.state.label()
                        )
                    })
                    .collect();
                CommandResult::ok(listing.join(" "))
            }
        }
    }
}

fn create_zone(zones: &mut ZoneManager, state: &mut AppState, spec: ZoneSpec) -> CommandResult {
    if spec.width < 3 || spec.height < 3 {
        return CommandResult::error("zones need W >= 3 and H >= 3");
    }
    let name = spec.name.clone();
    match zones.create(spec) {
        Ok(None) => {
            state.dirty = true;
            CommandResult::ok(format!("zone '{name}' created"))
        }
        Ok(Some(err)) => {
            state.dirty = true;
            CommandResult::error(format!("zone '{name}' created with error: {err}"))
        }
        Err(e @ ZoneError::NameTaken(_)) => CommandResult::error(e.to_string()),
        Err(e) => CommandResult::error(e.to_string()),
    }
}

fn zone_info(zones: &ZoneManager, name: Option<String>) -> CommandResult {
    match name {
        Some(name) => match zones.get(&name) {
            Some(z) => CommandResult::ok(format!(
                "{}: {} at ({},{}) {}x{} state={} buffer={}/{}{}",
                z.name(),
                z.spec.config.kind_name(),
                z.spec.x,
                z.spec.y,
                z.spec.width,
                z.spec.height,
                z.state.label(),
                z.buffer.len(),
                z.buffer.max_lines(),
                z.spec
                    .description
                    .as_deref()
                    .map(|d| format!(": {d}"))
                    .unwrap_or_default()
            )),
            None => CommandResult::error(format!("no zone named '{name}'")),
        },
        None => {
            if zones.is_empty() {
                CommandResult::ok("no zones")
            } else {
                let listing: Vec<String> = zones
                    .zones()
                    .iter()
                    .map(|z| {
                        format!(
                            "{}: {} ({},{}) {}x{} {}",
                            z.name(),
                            z.spec.config.kind_name(),
                            z.spec.x,
                            z.spec.y,
                            z.spec.width,
                            z.spec.height,
                            z.state.label()
                        )
                    })
                    .collect();
                CommandResult::ok(listing.join("; "))
            }
        }
    }
}

fn layout_command(
    state: &mut AppState,
    zones: &mut ZoneManager,
    ctx: &mut ExecCtx<'_>,
    cmd: LayoutCmd,
) -> CommandResult {
    let path_for = |name: &str| ctx.layouts_dir.join(format!("{name}.layout"));
    match cmd {
        LayoutCmd::List => {
            let mut names: Vec<String> = std::fs::read_dir(&ctx.layouts_dir)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter_map(|e| {
                            let path = e.path();
                            (path.extension().and_then(|x| x.to_str()) == Some("layout"))
                                .then(|| path.file_stem()?.to_str().map(str::to_string))
                                .flatten()
                        })
                        .collect()
                })
                .unwrap_or_default();
            names.sort();
            if names.is_empty() {
                CommandResult::ok("no layouts")
            } else {
                CommandResult::ok(names.join(" "))
            }
        }
        LayoutCmd::Save { name, description } => {
            let layout = core_project::Layout {
                name: name.clone(),
                description,
                cursor: Some((state.viewport.cursor_x, state.viewport.cursor_y)),
                zones: zones.zones().iter().map(|z| z.spec.clone()).collect(),
            };
            match core_project::save_layout(&layout, &path_for(&name)) {
                Ok(()) => CommandResult::ok(format!(
                    "layout '{name}' saved ({} zones)",
                    layout.zones.len()
                )),
                Err(e) => CommandResult::error(e.to_string()),
            }
        }
        LayoutCmd::Load { name, clear } => {
            let layout = match core_project::load_layout(&path_for(&name)) {
                Ok(layout) => layout,
                Err(e) => return CommandResult::error(e.to_string()),
            };
            if clear {
                let existing: Vec<String> =
                    zones.zones().iter().map(|z| z.name().to_string()).collect();
                for name in existing {
                    let _ = zones.delete(&name);
                }
            }
            let (created, errors) = instantiate_zones(state, zones, layout.zones);
            if let Some((x, y)) = layout.cursor {
                state.viewport.set_cursor(x, y);
            }
            let message = if errors.is_empty() {
                format!("layout '{name}' loaded ({created} zones)")
            } else {
                format!(
                    "layout '{name}' loaded ({created} zones, errors: {})",
                    errors.join("; ")
                )
            };
            if errors.is_empty() {
                CommandResult::ok(message)
            } else {
                CommandResult::error(message)
            }
        }
        LayoutCmd::Delete(name) => match std::fs::remove_file(path_for(&name)) {
            Ok(()) => CommandResult::ok(format!("layout '{name}' deleted")),
            Err(_) => CommandResult::error(format!("no layout named '{name}'")),
        },
        LayoutCmd::Info(name) => match core_project::load_layout(&path_for(&name)) {
            Ok(layout) => CommandResult::ok(format!(
                "{}: {} zones{}",
                layout.name,
                layout.zones.len(),
                layout
                    .description
                    .as_deref()
                    .map(|d| format!(": {d}"))
                    .unwrap_or_default()
            )),
            Err(e) => CommandResult::error(e.to_string()),
        },
    }
}

/// Create zones from descriptors, continuing past individual failures.
/// Returns the success count and the per-zone error messages. Bookmarks
/// attached to descriptors are installed at the zone origin.
pub fn instantiate_zones(
    state: &mut AppState,
    zones: &mut ZoneManager,
    specs: Vec<ZoneSpec>,
) -> (usize, Vec<String>) {
    let mut created = 0usize;
    let mut errors = Vec::new();
    for spec in specs {
        let name = spec.name.clone();
        let bookmark = spec.bookmark;
        let origin = (spec.x, spec.y);
        match zones.create(spec) {
            Ok(None) => {
                created += 1;
            }
            Ok(Some(err)) => {
                created += 1;
                errors.push(format!("{name}: {err}"));
            }
            Err(e) => {
                errors.push(format!("{name}: {e}"));
                continue;
            }
        }
        if let Some(key) = bookmark {
            state.bookmarks.set(key, origin.0, origin.1);
        }
    }
    (created, errors)
}

fn status_command(state: &AppState, zones: &ZoneManager) -> CommandResult {
    let vp = &state.viewport;
    let zone_list: Vec<serde_json::Value> = zones
        .zones()
        .iter()
        .map(|z| {
            serde_json::json!({
                "name": z.name(),
                "type": z.spec.config.kind_name(),
                "state": z.state.label(),
                "x": z.spec.x,
                "y": z.spec.y,
                "w": z.spec.width,
                "h": z.spec.height,
                "lines": z.buffer.len(),
            })
        })
        .collect();
    let data = serde_json::json!({
        "cursor": {"x": vp.cursor_x, "y": vp.cursor_y},
        "viewport": {"x": vp.origin_x, "y": vp.origin_y, "width": vp.width, "height": vp.height},
        "mode": state.mode.label(),
        "cells": state.canvas.count(),
        "dirty": state.dirty,
        "file": state.file_path.as_ref().map(|p| p.display().to_string()),
        "y_direction": vp.y_direction.name(),
        "zones": zone_list,
    });
    CommandResult {
        ok: true,
        message: format!(
            "cursor ({},{}) cells {} zones {}",
            vp.cursor_x,
            vp.cursor_y,
            state.canvas.count(),
            zones.len()
        ),
        data: Some(data),
        quit: false,
    }
}

/// Surface a command result on the status line (UI path; the API path
/// serializes it instead).
pub fn apply_result_message(state: &mut AppState, result: &CommandResult) {
    if result.message.is_empty() {
        return;
    }
    let prefix = if result.ok { "" } else { "error: " };
    state.set_ephemeral(format!("{prefix}{}", result.message), Duration::from_secs(4));
}
