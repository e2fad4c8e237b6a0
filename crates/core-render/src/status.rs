//! Status line composition.
//!
//! Two stages: `compose_status` produces ordered segments, `format_status`
//! renders them to the single status row. Keeping the segment list explicit
//! lets tests assert on structure and lets future indicators slot in
//! without reshuffling string code.
//!
//! Shape: `[MODE] name* (x,y) cells:N zones:N …right-hand detail`
//! where the detail is, in priority order: the active command line, the
//! ephemeral message, then a mode-specific hint (selection size, pen state,
//! terminal scrollback).

use core_state::Mode;

pub struct StatusContext<'a> {
    pub mode: Mode,
    /// Cursor relative to the origin marker.
    pub cursor: (i64, i64),
    pub cell_count: usize,
    pub zone_count: usize,
    pub file_name: Option<&'a str>,
    pub dirty: bool,
    pub command_active: bool,
    pub command_buffer: &'a str,
    pub message: Option<&'a str>,
    /// VISUAL selection size.
    pub selection: Option<(i64, i64)>,
    /// DRAW pen: (down, style name).
    pub pen: Option<(bool, &'a str)>,
    /// PTY focus: (zone name, scroll status).
    pub term: Option<(&'a str, &'a str)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Mode(&'static str),
    File {
        name: &'a str,
        dirty: bool,
    },
    Position(i64, i64),
    Counts {
        cells: usize,
        zones: usize,
    },
    CommandLine(&'a str),
    Message(&'a str),
    Selection(i64, i64),
    Pen {
        down: bool,
        style: &'a str,
    },
    Term {
        zone: &'a str,
        scroll: &'a str,
    },
}

pub fn compose_status<'a>(ctx: &'a StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let mut out = Vec::with_capacity(6);
    out.push(StatusSegment::Mode(ctx.mode.label()));
    out.push(StatusSegment::File {
        name: ctx.file_name.unwrap_or("[No Name]"),
        dirty: ctx.dirty,
    });
    out.push(StatusSegment::Position(ctx.cursor.0, ctx.cursor.1));
    out.push(StatusSegment::Counts {
        cells: ctx.cell_count,
        zones: ctx.zone_count,
    });
    if ctx.command_active {
        out.push(StatusSegment::CommandLine(ctx.command_buffer));
    } else if let Some(msg) = ctx.message {
        out.push(StatusSegment::Message(msg));
    } else if let Some((w, h)) = ctx.selection {
        out.push(StatusSegment::Selection(w, h));
    } else if let Some((down, style)) = ctx.pen {
        out.push(StatusSegment::Pen { down, style });
    } else if let Some((zone, scroll)) = ctx.term {
        out.push(StatusSegment::Term { zone, scroll });
    }
    out
}

pub fn format_status(segments: &[StatusSegment<'_>]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(64);
    for seg in segments {
        match seg {
            StatusSegment::Mode(m) => {
                let _ = write!(s, "[{m}]");
            }
            StatusSegment::File { name, dirty } => {
                let _ = write!(s, " {name}{}", if *dirty { "*" } else { "" });
            }
            StatusSegment::Position(x, y) => {
                let _ = write!(s, " ({x},{y})");
            }
            StatusSegment::Counts { cells, zones } => {
                let _ = write!(s, " cells:{cells} zones:{zones}");
            }
            StatusSegment::CommandLine(cmd) => {
                let _ = write!(s, " :{cmd}");
            }
            StatusSegment::Message(msg) => {
                let _ = write!(s, " | {msg}");
            }
            StatusSegment::Selection(w, h) => {
                let _ = write!(s, " sel {w}x{h}");
            }
            StatusSegment::Pen { down, style } => {
                let _ = write!(s, " pen {} [{style}]", if *down { "down" } else { "up" });
            }
            StatusSegment::Term { zone, scroll } => {
                let _ = write!(s, " term {zone} [{scroll}]");
            }
        }
    }
    s
}

pub fn build_status(ctx: &StatusContext<'_>) -> String {
    format_status(&compose_status(ctx))
}
