//! Structured command line parsing.
//!
//! Converts a raw command line (the leading `:` is optional; API clients send
//! bare commands) into a `ParsedCommand`. Parsing is pure classification:
//! no side effects, no access to state, so the same parser serves COMMAND
//! mode and the API server. Argument errors are folded into
//! `ParsedCommand::Invalid` with the message the user should see.
//!
//! Command names and aliases are case-insensitive. "Rest of line" arguments
//! (`text`, `zone pipe … CMD`, `zone send … TEXT`) consume the remainder
//! verbatim, whitespace included.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum OriginArg {
    /// `origin` with no args: report the current marker.
    Show,
    /// `origin here`: marker at the cursor.
    Here,
    /// `origin X Y`.
    At(i64, i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridCmd {
    /// `grid major`: show only major crossings (clear minor).
    MajorOnly,
    /// `grid minor`: enable minor crossings at half the major interval.
    MinorDefault,
    /// `grid N`: set the major interval.
    SetMajor(i64),
    Mode(&'static str),
    Rulers(bool),
    Labels(bool),
    Interval { major: i64, minor: Option<i64> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum YankTarget {
    Canvas,
    Zone(String),
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardCmd {
    Show,
    Clear,
    /// `clipboard zone`: create a clipboard-projection zone at the cursor.
    Zone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorCmd {
    Set { fg: String, bg: Option<String> },
    Off,
    Apply { w: i64, h: i64 },
}

/// `zone watch` trigger argument: `<float>s`, `<int>m`, or `watch:PATH`.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchArg {
    Secs(f64),
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneCmd {
    Create {
        name: String,
        /// `None` means "here" (at the cursor).
        position: Option<(i64, i64)>,
        width: i64,
        height: i64,
    },
    Pipe {
        name: String,
        width: i64,
        height: i64,
        command: String,
    },
    Watch {
        name: String,
        width: i64,
        height: i64,
        trigger: WatchArg,
        command: String,
    },
    Pty {
        name: String,
        width: i64,
        height: i64,
        shell: Option<String>,
    },
    Fifo {
        name: String,
        width: i64,
        height: i64,
        path: PathBuf,
    },
    Socket {
        name: String,
        width: i64,
        height: i64,
        port: u16,
    },
    Pager {
        name: String,
        width: i64,
        height: i64,
        path: PathBuf,
    },
    Delete(String),
    Goto(String),
    Info(Option<String>),
    Refresh(String),
    Pause(String),
    Resume(String),
    Send { name: String, text: String },
    Focus(String),
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutCmd {
    List,
    Load { name: String, clear: bool },
    Save { name: String, description: Option<String> },
    Delete(String),
    Info(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Empty,
    Quit,
    Write(Option<PathBuf>),
    WriteQuit(Option<PathBuf>),
    Goto(i64, i64),
    Origin(OriginArg),
    Pan(i64, i64),
    Clear,
    Rect { w: i64, h: i64, glyph: Option<char> },
    Line { x2: i64, y2: i64, glyph: Option<char> },
    Text(String),
    Grid(GridCmd),
    Mark { key: char, position: Option<(i64, i64)> },
    DelMark(char),
    DelMarks,
    Marks,
    Export(Option<PathBuf>),
    Import(PathBuf),
    YDir { up: bool },
    Yank { w: i64, h: i64, target: YankTarget },
    Paste { system: bool },
    Clipboard(ClipboardCmd),
    Color(ColorCmd),
    Palette,
    Zone(ZoneCmd),
    Layout(LayoutCmd),
    Status,
    /// VISUAL fill mini-command (`fill X Y W H GLYPH`).
    Fill { x: i64, y: i64, w: i64, h: i64, glyph: char },
    /// Recognized command with bad arguments; the message is user-facing.
    Invalid(String),
    Unknown(String),
}

pub fn parse(raw: &str) -> ParsedCommand {
    let body = raw.trim().strip_prefix(':').unwrap_or(raw.trim()).trim();
    if body.is_empty() {
        return ParsedCommand::Empty;
    }
    let (head, tail) = split_head(body);
    let head = head.to_ascii_lowercase();
    match head.as_str() {
        "quit" | "q" => ParsedCommand::Quit,
        "write" | "w" => ParsedCommand::Write(opt_path(tail)),
        "wq" => ParsedCommand::WriteQuit(opt_path(tail)),
        "goto" | "g" => match two_ints(tail) {
            Some((x, y)) => ParsedCommand::Goto(x, y),
            None => invalid("usage: goto X Y"),
        },
        "origin" => parse_origin(tail),
        "pan" => match two_ints(tail) {
            Some((x, y)) => ParsedCommand::Pan(x, y),
            None => invalid("usage: pan X Y"),
        },
        "clear" => ParsedCommand::Clear,
        "rect" => parse_rect(tail),
        "line" => parse_line_cmd(tail),
        "text" => {
            let message = tail.trim_start();
            if message.is_empty() {
                invalid("usage: text MESSAGE")
            } else {
                ParsedCommand::Text(message.to_string())
            }
        }
        "grid" => parse_grid(tail),
        "mark" => parse_mark(tail),
        "delmark" => match single_key(tail) {
            Some(key) => ParsedCommand::DelMark(key),
            None => invalid("usage: delmark KEY"),
        },
        "delmarks" => ParsedCommand::DelMarks,
        "marks" => ParsedCommand::Marks,
        "export" => ParsedCommand::Export(opt_path(tail)),
        "import" => match opt_path(tail) {
            Some(path) => ParsedCommand::Import(path),
            None => invalid("usage: import FILE"),
        },
        "ydir" => match tail.trim().to_ascii_lowercase().as_str() {
            "up" => ParsedCommand::YDir { up: true },
            "down" => ParsedCommand::YDir { up: false },
            _ => invalid("usage: ydir up|down"),
        },
        "yank" => parse_yank(tail),
        "paste" => match tail.trim().to_ascii_lowercase().as_str() {
            "" => ParsedCommand::Paste { system: false },
            "system" => ParsedCommand::Paste { system: true },
            _ => invalid("usage: paste [system]"),
        },
        "clipboard" => match tail.trim().to_ascii_lowercase().as_str() {
            "" => ParsedCommand::Clipboard(ClipboardCmd::Show),
            "clear" => ParsedCommand::Clipboard(ClipboardCmd::Clear),
            "zone" => ParsedCommand::Clipboard(ClipboardCmd::Zone),
            _ => invalid("usage: clipboard [clear | zone]"),
        },
        "color" => parse_color(tail),
        "palette" => ParsedCommand::Palette,
        "zone" => parse_zone(tail),
        "zones" => ParsedCommand::Zone(ZoneCmd::List),
        "layout" => parse_layout(tail),
        "status" => ParsedCommand::Status,
        "fill" => parse_fill(tail),
        _ => ParsedCommand::Unknown(head),
    }
}

fn invalid(msg: &str) -> ParsedCommand {
    ParsedCommand::Invalid(msg.to_string())
}

fn split_head(body: &str) -> (&str, &str) {
    match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest),
        None => (body, ""),
    }
}

fn opt_path(tail: &str) -> Option<PathBuf> {
    let trimmed = tail.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn two_ints(tail: &str) -> Option<(i64, i64)> {
    let mut parts = tail.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((x, y))
}

fn single_key(tail: &str) -> Option<char> {
    let mut parts = tail.split_whitespace();
    let token = parts.next()?;
    let mut chars = token.chars();
    let key = chars.next()?;
    (chars.next().is_none() && parts.next().is_none()).then_some(key)
}

fn parse_origin(tail: &str) -> ParsedCommand {
    let trimmed = tail.trim();
    if trimmed.is_empty() {
        return ParsedCommand::Origin(OriginArg::Show);
    }
    if trimmed.eq_ignore_ascii_case("here") {
        return ParsedCommand::Origin(OriginArg::Here);
    }
    match two_ints(trimmed) {
        Some((x, y)) => ParsedCommand::Origin(OriginArg::At(x, y)),
        None => invalid("usage: origin [X Y | here]"),
    }
}

fn parse_rect(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let (Some(w), Some(h)) = (
        parts.next().and_then(|t| t.parse().ok()),
        parts.next().and_then(|t| t.parse().ok()),
    ) else {
        return invalid("usage: rect W H [glyph]");
    };
    let glyph = parts.next().and_then(|t| t.chars().next());
    if parts.next().is_some() {
        return invalid("usage: rect W H [glyph]");
    }
    ParsedCommand::Rect { w, h, glyph }
}

fn parse_line_cmd(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let (Some(x2), Some(y2)) = (
        parts.next().and_then(|t| t.parse().ok()),
        parts.next().and_then(|t| t.parse().ok()),
    ) else {
        return invalid("usage: line X2 Y2 [glyph]");
    };
    let glyph = parts.next().and_then(|t| t.chars().next());
    ParsedCommand::Line { x2, y2, glyph }
}

fn parse_grid(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let Some(first) = parts.next() else {
        return invalid("usage: grid (major|minor|N|lines|markers|dots|off|rulers on|off|labels on|off|interval MAJOR [MINOR])");
    };
    match first.to_ascii_lowercase().as_str() {
        "major" => ParsedCommand::Grid(GridCmd::MajorOnly),
        "minor" => ParsedCommand::Grid(GridCmd::MinorDefault),
        "lines" => ParsedCommand::Grid(GridCmd::Mode("lines")),
        "markers" => ParsedCommand::Grid(GridCmd::Mode("markers")),
        "dots" => ParsedCommand::Grid(GridCmd::Mode("dots")),
        "off" => ParsedCommand::Grid(GridCmd::Mode("off")),
        "rulers" => match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("on") => ParsedCommand::Grid(GridCmd::Rulers(true)),
            Some("off") => ParsedCommand::Grid(GridCmd::Rulers(false)),
            _ => invalid("usage: grid rulers on|off"),
        },
        "labels" => match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("on") => ParsedCommand::Grid(GridCmd::Labels(true)),
            Some("off") => ParsedCommand::Grid(GridCmd::Labels(false)),
            _ => invalid("usage: grid labels on|off"),
        },
        "interval" => {
            let Some(major) = parts.next().and_then(|t| t.parse().ok()) else {
                return invalid("usage: grid interval MAJOR [MINOR]");
            };
            let minor = parts.next().and_then(|t| t.parse().ok());
            ParsedCommand::Grid(GridCmd::Interval { major, minor })
        }
        other => match other.parse::<i64>() {
            Ok(n) if n >= 1 => ParsedCommand::Grid(GridCmd::SetMajor(n)),
            _ => invalid("unknown grid argument"),
        },
    }
}

fn parse_mark(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let Some(token) = parts.next() else {
        return invalid("usage: mark KEY [X Y]");
    };
    let mut chars = token.chars();
    let (Some(key), None) = (chars.next(), chars.next()) else {
        return invalid("usage: mark KEY [X Y]");
    };
    match (parts.next(), parts.next()) {
        (None, _) => ParsedCommand::Mark {
            key,
            position: None,
        },
        (Some(xs), Some(ys)) => match (xs.parse(), ys.parse()) {
            (Ok(x), Ok(y)) => ParsedCommand::Mark {
                key,
                position: Some((x, y)),
            },
            _ => invalid("usage: mark KEY [X Y]"),
        },
        _ => invalid("usage: mark KEY [X Y]"),
    }
}

fn parse_yank(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let (Some(w), Some(h)) = (
        parts.next().and_then(|t| t.parse().ok()),
        parts.next().and_then(|t| t.parse().ok()),
    ) else {
        return invalid("usage: yank W H [zone NAME | system]");
    };
    let target = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None => YankTarget::Canvas,
        Some("system") => YankTarget::System,
        Some("zone") => match parts.next() {
            Some(name) => YankTarget::Zone(name.to_string()),
            None => return invalid("usage: yank W H zone NAME"),
        },
        Some(_) => return invalid("usage: yank W H [zone NAME | system]"),
    };
    ParsedCommand::Yank { w, h, target }
}

fn parse_color(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let Some(first) = parts.next() else {
        return invalid("usage: color FG [BG] | color off | color apply W H");
    };
    match first.to_ascii_lowercase().as_str() {
        "off" => ParsedCommand::Color(ColorCmd::Off),
        "apply" => {
            let (Some(w), Some(h)) = (
                parts.next().and_then(|t| t.parse().ok()),
                parts.next().and_then(|t| t.parse().ok()),
            ) else {
                return invalid("usage: color apply W H");
            };
            ParsedCommand::Color(ColorCmd::Apply { w, h })
        }
        _ => ParsedCommand::Color(ColorCmd::Set {
            fg: first.to_string(),
            bg: parts.next().map(str::to_string),
        }),
    }
}

/// `INTERVAL = <float>s | <int>m | watch:PATH`
fn parse_watch_arg(token: &str) -> Option<WatchArg> {
    if let Some(path) = token.strip_prefix("watch:") {
        return (!path.is_empty()).then(|| WatchArg::Path(PathBuf::from(path)));
    }
    if let Some(secs) = token.strip_suffix('s') {
        return secs.parse::<f64>().ok().filter(|s| *s > 0.0).map(WatchArg::Secs);
    }
    if let Some(mins) = token.strip_suffix('m') {
        return mins
            .parse::<u64>()
            .ok()
            .filter(|m| *m > 0)
            .map(|m| WatchArg::Secs(m as f64 * 60.0));
    }
    // A bare number reads as seconds.
    token.parse::<f64>().ok().filter(|s| *s > 0.0).map(WatchArg::Secs)
}

fn parse_zone(tail: &str) -> ParsedCommand {
    let (sub, rest) = split_head(tail.trim_start());
    let sub = sub.to_ascii_lowercase();
    let mut parts = rest.split_whitespace();
    match sub.as_str() {
        "create" => {
            let Some(name) = parts.next().map(str::to_string) else {
                return invalid("usage: zone create NAME (X Y | here) W H");
            };
            let Some(first) = parts.next() else {
                return invalid("usage: zone create NAME (X Y | here) W H");
            };
            let (position, w_tok) = if first.eq_ignore_ascii_case("here") {
                (None, parts.next())
            } else {
                let Some(second) = parts.next() else {
                    return invalid("usage: zone create NAME (X Y | here) W H");
                };
                match (first.parse(), second.parse()) {
                    (Ok(x), Ok(y)) => (Some((x, y)), parts.next()),
                    _ => return invalid("usage: zone create NAME (X Y | here) W H"),
                }
            };
            let (Some(width), Some(height)) = (
                w_tok.and_then(|t| t.parse().ok()),
                parts.next().and_then(|t| t.parse().ok()),
            ) else {
                return invalid("usage: zone create NAME (X Y | here) W H");
            };
            ParsedCommand::Zone(ZoneCmd::Create {
                name,
                position,
                width,
                height,
            })
        }
        "pipe" | "pty" | "watch" | "fifo" | "socket" | "pager" => {
            let Some(name) = parts.next().map(str::to_string) else {
                return invalid("zone command needs NAME W H");
            };
            let (Some(width), Some(height)) = (
                parts.next().and_then(|t| t.parse::<i64>().ok()),
                parts.next().and_then(|t| t.parse::<i64>().ok()),
            ) else {
                return invalid("zone command needs NAME W H");
            };
            let remainder = parts.clone().collect::<Vec<_>>().join(" ");
            match sub.as_str() {
                "pipe" => {
                    if remainder.is_empty() {
                        invalid("usage: zone pipe NAME W H CMD…")
                    } else {
                        ParsedCommand::Zone(ZoneCmd::Pipe {
                            name,
                            width,
                            height,
                            command: remainder,
                        })
                    }
                }
                "watch" => {
                    let Some(interval_tok) = parts.next() else {
                        return invalid("usage: zone watch NAME W H INTERVAL CMD…");
                    };
                    let Some(trigger) = parse_watch_arg(interval_tok) else {
                        return invalid("INTERVAL must be <float>s, <int>m, or watch:PATH");
                    };
                    let command = parts.collect::<Vec<_>>().join(" ");
                    if command.is_empty() {
                        invalid("usage: zone watch NAME W H INTERVAL CMD…")
                    } else {
                        ParsedCommand::Zone(ZoneCmd::Watch {
                            name,
                            width,
                            height,
                            trigger,
                            command,
                        })
                    }
                }
                "pty" => ParsedCommand::Zone(ZoneCmd::Pty {
                    name,
                    width,
                    height,
                    shell: (!remainder.is_empty()).then_some(remainder),
                }),
                "fifo" => match parts.next() {
                    Some(path) => ParsedCommand::Zone(ZoneCmd::Fifo {
                        name,
                        width,
                        height,
                        path: PathBuf::from(path),
                    }),
                    None => invalid("usage: zone fifo NAME W H PATH"),
                },
                "socket" => match parts.next().and_then(|t| t.parse().ok()) {
                    Some(port) => ParsedCommand::Zone(ZoneCmd::Socket {
                        name,
                        width,
                        height,
                        port,
                    }),
                    None => invalid("usage: zone socket NAME W H PORT"),
                },
                "pager" => match parts.next() {
                    Some(path) => ParsedCommand::Zone(ZoneCmd::Pager {
                        name,
                        width,
                        height,
                        path: PathBuf::from(path),
                    }),
                    None => invalid("usage: zone pager NAME W H FILE"),
                },
                _ => unreachable!(),
            }
        }
        "delete" | "goto" | "refresh" | "pause" | "resume" | "focus" => {
            let Some(name) = parts.next().map(str::to_string) else {
                return invalid("zone command needs a NAME");
            };
            ParsedCommand::Zone(match sub.as_str() {
                "delete" => ZoneCmd::Delete(name),
                "goto" => ZoneCmd::Goto(name),
                "refresh" => ZoneCmd::Refresh(name),
                "pause" => ZoneCmd::Pause(name),
                "resume" => ZoneCmd::Resume(name),
                "focus" => ZoneCmd::Focus(name),
                _ => unreachable!(),
            })
        }
        "info" => ParsedCommand::Zone(ZoneCmd::Info(parts.next().map(str::to_string))),
        "send" => {
            let Some(name) = parts.next().map(str::to_string) else {
                return invalid("usage: zone send NAME TEXT");
            };
            let text = parts.collect::<Vec<_>>().join(" ");
            ParsedCommand::Zone(ZoneCmd::Send { name, text })
        }
        "" => invalid("usage: zone SUBCOMMAND …"),
        other => ParsedCommand::Unknown(format!("zone {other}")),
    }
}

fn parse_layout(tail: &str) -> ParsedCommand {
    let (sub, rest) = split_head(tail.trim_start());
    let mut parts = rest.split_whitespace();
    match sub.to_ascii_lowercase().as_str() {
        "list" | "" => ParsedCommand::Layout(LayoutCmd::List),
        "load" => {
            let Some(name) = parts.next().map(str::to_string) else {
                return invalid("usage: layout load NAME [--clear]");
            };
            let clear = match parts.next() {
                None => false,
                Some("--clear") => true,
                Some(_) => return invalid("usage: layout load NAME [--clear]"),
            };
            ParsedCommand::Layout(LayoutCmd::Load { name, clear })
        }
        "save" => {
            let Some(name) = parts.next().map(str::to_string) else {
                return invalid("usage: layout save NAME [DESC]");
            };
            let description = {
                let desc = parts.collect::<Vec<_>>().join(" ");
                (!desc.is_empty()).then_some(desc)
            };
            ParsedCommand::Layout(LayoutCmd::Save { name, description })
        }
        "delete" => match parts.next() {
            Some(name) => ParsedCommand::Layout(LayoutCmd::Delete(name.to_string())),
            None => invalid("usage: layout delete NAME"),
        },
        "info" => match parts.next() {
            Some(name) => ParsedCommand::Layout(LayoutCmd::Info(name.to_string())),
            None => invalid("usage: layout info NAME"),
        },
        other => ParsedCommand::Unknown(format!("layout {other}")),
    }
}

fn parse_fill(tail: &str) -> ParsedCommand {
    let mut parts = tail.split_whitespace();
    let nums: Vec<i64> = parts
        .by_ref()
        .take(4)
        .filter_map(|t| t.parse().ok())
        .collect();
    let glyph = parts.next().and_then(|t| t.chars().next());
    match (nums.as_slice(), glyph) {
        ([x, y, w, h], Some(glyph)) => ParsedCommand::Fill {
            x: *x,
            y: *y,
            w: *w,
            h: *h,
            glyph,
        },
        _ => invalid("usage: fill X Y W H GLYPH"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_and_case() {
        assert_eq!(parse(":q"), ParsedCommand::Quit);
        assert_eq!(parse("QUIT"), ParsedCommand::Quit);
        assert_eq!(parse(":G 3 -4"), ParsedCommand::Goto(3, -4));
        assert_eq!(parse("w out.json"), ParsedCommand::Write(Some(PathBuf::from("out.json"))));
    }

    #[test]
    fn empty_and_unknown() {
        assert_eq!(parse(":"), ParsedCommand::Empty);
        assert_eq!(parse("   "), ParsedCommand::Empty);
        assert_eq!(parse("frobnicate"), ParsedCommand::Unknown("frobnicate".into()));
    }

    #[test]
    fn text_takes_rest_of_line() {
        assert_eq!(
            parse(":text hello  spaced world"),
            ParsedCommand::Text("hello  spaced world".into())
        );
    }

    #[test]
    fn rect_and_line_glyphs() {
        assert_eq!(parse("rect 5 3"), ParsedCommand::Rect { w: 5, h: 3, glyph: None });
        assert_eq!(
            parse("rect 5 3 #"),
            ParsedCommand::Rect { w: 5, h: 3, glyph: Some('#') }
        );
        assert_eq!(
            parse("line -2 7 *"),
            ParsedCommand::Line { x2: -2, y2: 7, glyph: Some('*') }
        );
        assert!(matches!(parse("rect five 3"), ParsedCommand::Invalid(_)));
    }

    #[test]
    fn origin_variants() {
        assert_eq!(parse("origin"), ParsedCommand::Origin(OriginArg::Show));
        assert_eq!(parse("origin here"), ParsedCommand::Origin(OriginArg::Here));
        assert_eq!(parse("origin 4 5"), ParsedCommand::Origin(OriginArg::At(4, 5)));
    }

    #[test]
    fn grid_forms() {
        assert_eq!(parse("grid 5"), ParsedCommand::Grid(GridCmd::SetMajor(5)));
        assert_eq!(parse("grid lines"), ParsedCommand::Grid(GridCmd::Mode("lines")));
        assert_eq!(parse("grid rulers on"), ParsedCommand::Grid(GridCmd::Rulers(true)));
        assert_eq!(parse("grid labels off"), ParsedCommand::Grid(GridCmd::Labels(false)));
        assert_eq!(
            parse("grid interval 20 5"),
            ParsedCommand::Grid(GridCmd::Interval { major: 20, minor: Some(5) })
        );
        assert!(matches!(parse("grid -3"), ParsedCommand::Invalid(_)));
    }

    #[test]
    fn marks() {
        assert_eq!(
            parse("mark a"),
            ParsedCommand::Mark { key: 'a', position: None }
        );
        assert_eq!(
            parse("mark b 10 20"),
            ParsedCommand::Mark { key: 'b', position: Some((10, 20)) }
        );
        assert_eq!(parse("delmark b"), ParsedCommand::DelMark('b'));
        assert!(matches!(parse("mark ab"), ParsedCommand::Invalid(_)));
    }

    #[test]
    fn yank_targets() {
        assert_eq!(
            parse("yank 4 2"),
            ParsedCommand::Yank { w: 4, h: 2, target: YankTarget::Canvas }
        );
        assert_eq!(
            parse("yank 4 2 zone log"),
            ParsedCommand::Yank { w: 4, h: 2, target: YankTarget::Zone("log".into()) }
        );
        assert_eq!(
            parse("yank 4 2 system"),
            ParsedCommand::Yank { w: 4, h: 2, target: YankTarget::System }
        );
    }

    #[test]
    fn color_forms() {
        assert_eq!(
            parse("color red blue"),
            ParsedCommand::Color(ColorCmd::Set { fg: "red".into(), bg: Some("blue".into()) })
        );
        assert_eq!(parse("color off"), ParsedCommand::Color(ColorCmd::Off));
        assert_eq!(
            parse("color apply 5 2"),
            ParsedCommand::Color(ColorCmd::Apply { w: 5, h: 2 })
        );
    }

    #[test]
    fn zone_create_positions() {
        assert_eq!(
            parse("zone create box 3 4 20 10"),
            ParsedCommand::Zone(ZoneCmd::Create {
                name: "box".into(),
                position: Some((3, 4)),
                width: 20,
                height: 10
            })
        );
        assert_eq!(
            parse("zone create box here 20 10"),
            ParsedCommand::Zone(ZoneCmd::Create {
                name: "box".into(),
                position: None,
                width: 20,
                height: 10
            })
        );
    }

    #[test]
    fn zone_pipe_rest_of_line() {
        assert_eq!(
            parse("zone pipe log 40 10 tail -f /var/log/syslog"),
            ParsedCommand::Zone(ZoneCmd::Pipe {
                name: "log".into(),
                width: 40,
                height: 10,
                command: "tail -f /var/log/syslog".into()
            })
        );
    }

    #[test]
    fn zone_watch_intervals() {
        assert_eq!(
            parse("zone watch clock 20 3 0.5s date"),
            ParsedCommand::Zone(ZoneCmd::Watch {
                name: "clock".into(),
                width: 20,
                height: 3,
                trigger: WatchArg::Secs(0.5),
                command: "date".into()
            })
        );
        assert_eq!(
            parse("zone watch slow 20 3 2m uptime"),
            ParsedCommand::Zone(ZoneCmd::Watch {
                name: "slow".into(),
                width: 20,
                height: 3,
                trigger: WatchArg::Secs(120.0),
                command: "uptime".into()
            })
        );
        assert_eq!(
            parse("zone watch conf 30 8 watch:/etc/hosts cat {file}"),
            ParsedCommand::Zone(ZoneCmd::Watch {
                name: "conf".into(),
                width: 30,
                height: 8,
                trigger: WatchArg::Path(PathBuf::from("/etc/hosts")),
                command: "cat {file}".into()
            })
        );
        assert!(matches!(
            parse("zone watch bad 20 3 soon date"),
            ParsedCommand::Invalid(_)
        ));
    }

    #[test]
    fn zone_management_commands() {
        assert_eq!(parse("zone delete log"), ParsedCommand::Zone(ZoneCmd::Delete("log".into())));
        assert_eq!(parse("zone info"), ParsedCommand::Zone(ZoneCmd::Info(None)));
        assert_eq!(
            parse("zone info log"),
            ParsedCommand::Zone(ZoneCmd::Info(Some("log".into())))
        );
        assert_eq!(parse("zones"), ParsedCommand::Zone(ZoneCmd::List));
        assert_eq!(
            parse("zone send sh echo hi"),
            ParsedCommand::Zone(ZoneCmd::Send { name: "sh".into(), text: "echo hi".into() })
        );
    }

    #[test]
    fn layout_commands() {
        assert_eq!(parse("layout list"), ParsedCommand::Layout(LayoutCmd::List));
        assert_eq!(parse("layout"), ParsedCommand::Layout(LayoutCmd::List));
        assert_eq!(
            parse("layout load dash --clear"),
            ParsedCommand::Layout(LayoutCmd::Load { name: "dash".into(), clear: true })
        );
        assert_eq!(
            parse("layout save dash my dashboard"),
            ParsedCommand::Layout(LayoutCmd::Save {
                name: "dash".into(),
                description: Some("my dashboard".into())
            })
        );
    }

    #[test]
    fn fill_mini_command() {
        assert_eq!(
            parse("fill 2 3 4 5 #"),
            ParsedCommand::Fill { x: 2, y: 3, w: 4, h: 5, glyph: '#' }
        );
        assert!(matches!(parse("fill 2 3 4 5"), ParsedCommand::Invalid(_)));
    }

    #[test]
    fn bare_command_without_colon() {
        assert_eq!(parse("goto 5 5"), ParsedCommand::Goto(5, 5));
    }
}
