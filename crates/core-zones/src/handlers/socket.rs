//! SOCKET handler: append lines received on a loopback TCP port.
//!
//! One listening socket per zone, bound at creation so a port conflict
//! surfaces immediately. Connections are served sequentially (this is a
//! log sink, not a server) and each connection's bytes are split into
//! lines. The listener runs non-blocking with a short poll so `stop` never
//! waits on `accept`.

use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use core_events::{ZoneEvent, ZonePayload, post_zone_event};
use crossbeam_channel::Sender;

use super::{WorkerGate, ZoneHandler, join_with_deadline};
use crate::ZoneError;
use crate::ansi;

#[derive(Debug)]
pub struct SocketHandler {
    zone: String,
    port: u16,
    gate: Arc<WorkerGate>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SocketHandler {
    pub fn spawn(
        zone: &str,
        port: u16,
        color: bool,
        tx: Sender<ZoneEvent>,
    ) -> Result<Self, ZoneError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                ZoneError::PortInUse(port)
            } else {
                ZoneError::Io(e)
            }
        })?;
        listener.set_nonblocking(true)?;

        let gate = Arc::new(WorkerGate::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = {
            let zone = zone.to_string();
            let (gate, shutdown) = (gate.clone(), shutdown.clone());
            std::thread::spawn(move || accept_loop(listener, &zone, &tx, &gate, &shutdown, color))
        };

        tracing::info!(target: "runtime.zones", zone, port, "socket_listening");
        Ok(Self {
            zone: zone.to_string(),
            port,
            gate,
            shutdown,
            worker: Some(worker),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn accept_loop(
    listener: TcpListener,
    zone: &str,
    tx: &Sender<ZoneEvent>,
    gate: &WorkerGate,
    shutdown: &AtomicBool,
    color: bool,
) {
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        gate.wait_while_paused(shutdown);
        match listener.accept() {
            Ok((stream, peer)) => {
                tracing::debug!(target: "runtime.zones", zone, peer = %peer, "socket_accepted");
                serve_connection(stream, zone, tx, gate, shutdown, color);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                tracing::warn!(target: "runtime.zones", zone, error = %e, "socket_accept_error");
                std::thread::sleep(Duration::from_millis(200));
            }
        }
    }
}

fn serve_connection(
    mut stream: TcpStream,
    zone: &str,
    tx: &Sender<ZoneEvent>,
    gate: &WorkerGate,
    shutdown: &AtomicBool,
    color: bool,
) {
    // The accepted stream inherits non-blocking from the listener on some
    // platforms; force blocking reads with a timeout so shutdown stays
    // observable.
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(Duration::from_millis(100)));
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        gate.wait_while_paused(shutdown);
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = pending.drain(..=pos).collect();
                    let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
                    let line = ansi::parse_line(text.trim_end_matches('\r'), color);
                    post_zone_event(tx, ZoneEvent::new(zone, ZonePayload::Append(vec![line])));
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(_) => break,
        }
    }
    // Flush a trailing unterminated line when the peer closes.
    if !pending.is_empty() {
        let text = String::from_utf8_lossy(&pending);
        let line = ansi::parse_line(text.trim_end_matches('\r'), color);
        post_zone_event(tx, ZoneEvent::new(zone, ZonePayload::Append(vec![line])));
    }
}

impl ZoneHandler for SocketHandler {
    fn kind(&self) -> &'static str {
        "socket"
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.gate.notify();
        if let Some(worker) = self.worker.take() {
            join_with_deadline(worker, &self.zone, "socket-acceptor");
        }
    }

    fn pause(&mut self) {
        self.gate.set_paused(true);
    }

    fn resume(&mut self) {
        self.gate.set_paused(false);
    }
}

impl Drop for SocketHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::zone_event_channel;
    use std::io::Write;
    use std::net::TcpStream;
    use std::time::Instant;

    fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn collect_lines(
        rx: &crossbeam_channel::Receiver<ZoneEvent>,
        want: usize,
        timeout: Duration,
    ) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        let mut lines = Vec::new();
        while Instant::now() < deadline && lines.len() < want {
            if let Ok(ev) = rx.recv_timeout(Duration::from_millis(100))
                && let ZonePayload::Append(ls) = ev.payload
            {
                lines.extend(ls.iter().map(|l| l.text()));
            }
        }
        lines
    }

    #[test]
    fn receives_lines_from_connection() {
        let port = free_port();
        let (tx, rx) = zone_event_channel();
        let mut h = SocketHandler::spawn("s", port, false, tx).unwrap();

        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client.write_all(b"one\ntwo\n").unwrap();
        drop(client);

        assert_eq!(
            collect_lines(&rx, 2, Duration::from_secs(10)),
            vec!["one", "two"]
        );
        h.stop();
    }

    #[test]
    fn sequential_connections_are_served() {
        let port = free_port();
        let (tx, rx) = zone_event_channel();
        let mut h = SocketHandler::spawn("s", port, false, tx).unwrap();

        for i in 0..2 {
            let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
            writeln!(client, "conn {i}").unwrap();
            drop(client);
            let lines = collect_lines(&rx, 1, Duration::from_secs(10));
            assert_eq!(lines, vec![format!("conn {i}")]);
        }
        h.stop();
    }

    #[test]
    fn port_in_use_is_reported() {
        let port = free_port();
        let _holder = TcpListener::bind(("127.0.0.1", port)).unwrap();
        let (tx, _rx) = zone_event_channel();
        match SocketHandler::spawn("s", port, false, tx) {
            Err(ZoneError::PortInUse(p)) => assert_eq!(p, port),
            other => panic!("expected PortInUse, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_line_flushed_on_close() {
        let port = free_port();
        let (tx, rx) = zone_event_channel();
        let mut h = SocketHandler::spawn("s", port, false, tx).unwrap();
        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client.write_all(b"partial").unwrap();
        drop(client);
        assert_eq!(
            collect_lines(&rx, 1, Duration::from_secs(10)),
            vec!["partial"]
        );
        h.stop();
    }

    #[test]
    fn stop_is_prompt() {
        let port = free_port();
        let (tx, _rx) = zone_event_channel();
        let mut h = SocketHandler::spawn("s", port, false, tx).unwrap();
        let start = Instant::now();
        h.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
        // Port is released.
        assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
    }
}
