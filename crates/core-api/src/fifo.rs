//! Command FIFO ingress (Unix).
//!
//! A writable named pipe, mode 0600, whose lines are enqueued as commands
//! with no reply channel. The reader opens non-blocking so writer EOF idles
//! the loop and the next writer is picked up transparently.

use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use core_events::{ApiRequest, ApiSource};
use crossbeam_channel::Sender;

use crate::ApiError;

#[derive(Debug)]
pub(crate) struct CommandFifo {
    path: PathBuf,
    created: bool,
}

impl CommandFifo {
    pub(crate) fn start(
        path: PathBuf,
        tx: Sender<ApiRequest>,
        shutdown: Arc<AtomicBool>,
        threads: &mut Vec<(JoinHandle<()>, &'static str)>,
    ) -> Result<Self, ApiError> {
        let created = ensure_fifo(&path)?;
        let mut reader = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)?;
        tracing::info!(target: "api.fifo", path = %path.display(), created, "command_fifo_ready");

        threads.push((
            std::thread::spawn(move || {
                let mut pending: Vec<u8> = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    match reader.read(&mut buf) {
                        Ok(0) => std::thread::sleep(Duration::from_millis(50)),
                        Ok(n) => {
                            pending.extend_from_slice(&buf[..n]);
                            while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                                let raw: Vec<u8> = pending.drain(..=pos).collect();
                                let line =
                                    String::from_utf8_lossy(&raw[..raw.len() - 1]).trim().to_string();
                                if line.is_empty() {
                                    continue;
                                }
                                let _ = tx.try_send(ApiRequest {
                                    line,
                                    source: ApiSource::Fifo,
                                    reply: None,
                                });
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(50));
                        }
                        Err(e) => {
                            tracing::warn!(target: "api.fifo", error = %e, "fifo_read_error");
                            return;
                        }
                    }
                }
            }),
            "fifo-reader",
        ));

        Ok(Self { path, created })
    }

    pub(crate) fn cleanup(self) {
        if self.created {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn ensure_fifo(path: &std::path::Path) -> Result<bool, ApiError> {
    use std::os::unix::fs::FileTypeExt;
    match std::fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => Ok(false),
        Ok(_) => Err(ApiError::Fifo(format!(
            "{} exists and is not a fifo",
            path.display()
        ))),
        Err(_) => {
            let c_path = std::ffi::CString::new(path.as_os_str().as_encoded_bytes())
                .map_err(|_| ApiError::Fifo("path contains NUL".to_string()))?;
            // SAFETY: c_path is a valid NUL-terminated path for the call.
            let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
            if rc != 0 {
                return Err(ApiError::Io(std::io::Error::last_os_error()));
            }
            Ok(true)
        }
    }
}
