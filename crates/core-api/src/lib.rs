//! External command ingress: TCP server and command FIFO.
//!
//! Both channels turn newline-delimited command lines into `ApiRequest`s on
//! the bounded API queue; the application loop executes them with the same
//! executor that serves keyboard commands and applies at most N per frame.
//! TCP clients get one JSON response object per command, in order; FIFO
//! writers get no responses.
//!
//! Trust model: loopback only unless explicitly overridden, no
//! authentication; clients are local tools driving the canvas.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use core_events::{ApiReply, ApiRequest, ApiSource, reply_channel};
use crossbeam_channel::{Sender, TrySendError};

#[cfg(unix)]
mod fifo;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("cannot bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("command fifo: {0}")]
    Fifo(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How long `stop` waits for the acceptor/reader threads.
const JOIN_DEADLINE: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct ApiServer {
    shutdown: Arc<AtomicBool>,
    threads: Vec<(JoinHandle<()>, &'static str)>,
    local_addr: Option<SocketAddr>,
    #[cfg(unix)]
    fifo: Option<fifo::CommandFifo>,
}

impl ApiServer {
    /// Bind the TCP listener (when `tcp` is set) and open the command FIFO
    /// (when `fifo_path` is set), spawning their ingress threads.
    pub fn start(
        tcp: Option<(String, u16)>,
        fifo_path: Option<PathBuf>,
        tx: Sender<ApiRequest>,
    ) -> Result<Self, ApiError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::new();
        let mut local_addr = None;

        if let Some((host, port)) = tcp {
            let addr = format!("{host}:{port}");
            let listener =
                TcpListener::bind(&addr).map_err(|e| ApiError::Bind(addr.clone(), e))?;
            listener.set_nonblocking(true)?;
            local_addr = Some(listener.local_addr()?);
            tracing::info!(target: "api.tcp", addr = %local_addr.unwrap(), "api_listening");
            let (tx, shutdown) = (tx.clone(), shutdown.clone());
            threads.push((
                std::thread::spawn(move || accept_loop(listener, tx, shutdown)),
                "tcp-acceptor",
            ));
        }

        #[cfg(unix)]
        let fifo = match fifo_path {
            Some(path) => Some(fifo::CommandFifo::start(
                path,
                tx,
                shutdown.clone(),
                &mut threads,
            )?),
            None => None,
        };
        #[cfg(not(unix))]
        if fifo_path.is_some() {
            return Err(ApiError::Fifo("command fifo requires unix".to_string()));
        }

        Ok(Self {
            shutdown,
            threads,
            local_addr,
            #[cfg(unix)]
            fifo,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        for (handle, role) in self.threads.drain(..) {
            let deadline = Instant::now() + JOIN_DEADLINE;
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                tracing::warn!(target: "api", role, "ingress thread did not stop, detaching");
            }
        }
        #[cfg(unix)]
        if let Some(fifo) = self.fifo.take() {
            fifo.cleanup();
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(listener: TcpListener, tx: Sender<ApiRequest>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                tracing::debug!(target: "api.tcp", peer = %peer, "connection_accepted");
                let (tx, shutdown) = (tx.clone(), shutdown.clone());
                // Connection threads are detached: they observe shutdown
                // through their read timeout and exit on client close.
                std::thread::spawn(move || serve_connection(stream, tx, shutdown));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                tracing::warn!(target: "api.tcp", error = %e, "accept_error");
                std::thread::sleep(Duration::from_millis(200));
            }
        }
    }
}

/// One command per line; one JSON object per command, written in order.
/// Half-closed (fire-and-forget) clients still get their commands executed;
/// response writes then fail silently and the connection winds down.
fn serve_connection(stream: TcpStream, tx: Sender<ApiRequest>, shutdown: Arc<AtomicBool>) {
    // The stream may inherit non-blocking from the listener; reads must
    // block (with a timeout) or the loop below would spin.
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(Duration::from_millis(200)));
    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let reply = dispatch_command(trimmed, &tx);
                let json = render_reply(&reply);
                if writer.write_all(json.as_bytes()).is_err()
                    || writer.write_all(b"\n").is_err()
                    || writer.flush().is_err()
                {
                    // Client stopped reading; keep draining its commands
                    // would reorder nothing, so just stop.
                    return;
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(_) => return,
        }
    }
}

/// Enqueue one command and wait for the loop's reply. Applying commands on
/// the application thread (never here) is what serializes all sources.
fn dispatch_command(line: &str, tx: &Sender<ApiRequest>) -> ApiReply {
    let (reply_tx, reply_rx) = reply_channel();
    let request = ApiRequest {
        line: line.to_string(),
        source: ApiSource::Tcp,
        reply: Some(reply_tx),
    };
    match tx.try_send(request) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            return ApiReply {
                ok: false,
                message: "command queue full".to_string(),
                data: None,
            };
        }
        Err(TrySendError::Disconnected(_)) => {
            return ApiReply {
                ok: false,
                message: "shutting down".to_string(),
                data: None,
            };
        }
    }
    // No user-visible timeout: a long-running command blocks only this
    // connection.
    reply_rx.recv().unwrap_or(ApiReply {
        ok: false,
        message: "shutting down".to_string(),
        data: None,
    })
}

fn render_reply(reply: &ApiReply) -> String {
    let mut obj = serde_json::json!({
        "status": if reply.ok { "ok" } else { "error" },
        "message": reply.message,
    });
    if let Some(data) = &reply.data
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(data)
    {
        obj["data"] = value;
    }
    obj.to_string()
}
