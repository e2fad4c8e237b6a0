//! System clipboard bridge via external tools.
//!
//! The core treats the OS clipboard as a black-box text exchange; this
//! module fulfills that contract by shelling out to whichever helper is
//! present (`pbcopy`/`pbpaste` on macOS, `wl-copy`/`wl-paste` on Wayland,
//! `xclip` on X11). Absence of any tool is a per-command error, not a
//! startup failure.

use std::io::Write;
use std::process::{Command, Stdio};

use core_actions::SystemClipboard;

pub struct ShellClipboard;

/// (tool, read args, write args) per platform candidate, first hit wins.
const CANDIDATES: &[(&str, &[&str], &[&str])] = &[
    ("pbpaste", &[], &[]),
    ("wl-paste", &["--no-newline"], &[]),
    ("xclip", &["-selection", "clipboard", "-o"], &["-selection", "clipboard"]),
];

fn reader_command() -> Option<Command> {
    for (tool, read_args, _) in CANDIDATES {
        if which(tool) {
            let mut cmd = Command::new(tool);
            cmd.args(*read_args);
            return Some(cmd);
        }
    }
    None
}

fn writer_command() -> Option<Command> {
    // Paired writers for the readers above.
    for (reader, writer, args) in [
        ("pbpaste", "pbcopy", &[][..]),
        ("wl-paste", "wl-copy", &[][..]),
        ("xclip", "xclip", &["-selection", "clipboard"][..]),
    ] {
        if which(reader) && which(writer) {
            let mut cmd = Command::new(writer);
            cmd.args(args);
            return Some(cmd);
        }
    }
    None
}

fn which(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .status()
        .is_ok()
}

impl SystemClipboard for ShellClipboard {
    fn read_text(&mut self) -> Result<String, String> {
        let mut cmd = reader_command().ok_or("no clipboard tool found")?;
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| e.to_string())?;
        if !output.status.success() {
            return Err(format!("clipboard read failed: {}", output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn write_text(&mut self, text: &str) -> Result<(), String> {
        let mut cmd = writer_command().ok_or("no clipboard tool found")?;
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| e.to_string())?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(text.as_bytes()).map_err(|e| e.to_string())?;
        }
        let status = child.wait().map_err(|e| e.to_string())?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("clipboard write failed: {status}"))
        }
    }
}
