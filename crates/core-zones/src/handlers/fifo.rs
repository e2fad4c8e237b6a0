//! FIFO handler: append lines written by external processes to a named pipe.
//!
//! The pipe is created with owner-only permissions when absent (and removed
//! on stop only if this zone created it). The reader opens non-blocking so
//! writer EOF simply idles the loop instead of wedging it; an EOF'd pipe is
//! immediately ready for the next writer, which is the re-open behavior
//! producers expect from a log-sink FIFO.

use std::fs::File;
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use core_events::{ZoneEvent, ZonePayload, post_zone_event};
use crossbeam_channel::Sender;

use super::{WorkerGate, ZoneHandler, join_with_deadline};
use crate::ZoneError;
use crate::ansi;

pub struct FifoHandler {
    zone: String,
    path: PathBuf,
    created: bool,
    gate: Arc<WorkerGate>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FifoHandler {
    pub fn spawn(
        zone: &str,
        path: &Path,
        color: bool,
        tx: Sender<ZoneEvent>,
    ) -> Result<Self, ZoneError> {
        let created = ensure_fifo(path)?;
        let reader = open_nonblocking(path)?;

        let gate = Arc::new(WorkerGate::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = {
            let zone = zone.to_string();
            let (gate, shutdown) = (gate.clone(), shutdown.clone());
            std::thread::spawn(move || read_loop(reader, &zone, &tx, &gate, &shutdown, color))
        };

        tracing::info!(target: "runtime.zones", zone, path = %path.display(), created, "fifo_ready");
        Ok(Self {
            zone: zone.to_string(),
            path: path.to_path_buf(),
            created,
            gate,
            shutdown,
            worker: Some(worker),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create the FIFO with mode 0600 when absent. Returns whether we created
/// it. An existing path must already be a FIFO.
fn ensure_fifo(path: &Path) -> Result<bool, ZoneError> {
    use std::os::unix::fs::FileTypeExt;
    match std::fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => Ok(false),
        Ok(_) => Err(ZoneError::Spawn(format!(
            "{} exists and is not a fifo",
            path.display()
        ))),
        Err(_) => {
            let c_path = std::ffi::CString::new(path.as_os_str().as_encoded_bytes())
                .map_err(|_| ZoneError::Spawn("fifo path contains NUL".to_string()))?;
            // SAFETY: c_path is a valid NUL-terminated path for the duration
            // of the call.
            let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
            if rc != 0 {
                return Err(ZoneError::Io(std::io::Error::last_os_error()));
            }
            Ok(true)
        }
    }
}

fn open_nonblocking(path: &Path) -> Result<File, ZoneError> {
    Ok(std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)?)
}

fn read_loop(
    mut reader: File,
    zone: &str,
    tx: &Sender<ZoneEvent>,
    gate: &WorkerGate,
    shutdown: &AtomicBool,
    color: bool,
) {
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        gate.wait_while_paused(shutdown);
        match reader.read(&mut buf) {
            // 0 means no writer is connected (EOF); idle until one arrives.
            Ok(0) => std::thread::sleep(Duration::from_millis(50)),
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                flush_complete_lines(&mut pending, zone, tx, color);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                tracing::warn!(target: "runtime.zones", zone, error = %e, "fifo_read_error");
                return;
            }
        }
    }
}

/// Emit every complete line in `pending`, keeping a trailing partial line
/// buffered for the next chunk.
fn flush_complete_lines(pending: &mut Vec<u8>, zone: &str, tx: &Sender<ZoneEvent>, color: bool) {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
        lines.push(ansi::parse_line(text.trim_end_matches('\r'), color));
    }
    if !lines.is_empty() {
        post_zone_event(tx, ZoneEvent::new(zone, ZonePayload::Append(lines)));
    }
}

impl ZoneHandler for FifoHandler {
    fn kind(&self) -> &'static str {
        "fifo"
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.gate.notify();
        if let Some(worker) = self.worker.take() {
            join_with_deadline(worker, &self.zone, "fifo-reader");
        }
        if self.created {
            let _ = std::fs::remove_file(&self.path);
            self.created = false;
        }
    }

    fn pause(&mut self) {
        self.gate.set_paused(true);
    }

    fn resume(&mut self) {
        self.gate.set_paused(false);
    }
}

impl Drop for FifoHandler {
    fn drop(&mut self) {
        self.stop();
    }
}
