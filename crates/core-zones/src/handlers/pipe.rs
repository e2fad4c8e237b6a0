//! PIPE handler: one-shot command capture.
//!
//! The command runs through the platform shell once at creation and again on
//! `refresh`. Stdout and stderr are read by separate threads and appended as
//! they arrive (interleaving is best-effort, as with any piped child). The
//! exit status is posted once when the child is reaped.

use std::io::{BufRead, BufReader};
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use core_events::{ZoneEvent, ZonePayload, ZoneRunState, post_zone_event};
use crossbeam_channel::Sender;

use super::{WorkerGate, ZoneHandler, join_with_deadline, shell_command};
use crate::ZoneError;
use crate::ansi;

pub struct PipeHandler {
    zone: String,
    command: String,
    color: bool,
    tx: Sender<ZoneEvent>,
    gate: Arc<WorkerGate>,
    shutdown: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    threads: Vec<JoinHandle<()>>,
}

impl PipeHandler {
    pub fn spawn(
        zone: &str,
        command: &str,
        color: bool,
        tx: Sender<ZoneEvent>,
    ) -> Result<Self, ZoneError> {
        let mut handler = Self {
            zone: zone.to_string(),
            command: command.to_string(),
            color,
            tx,
            gate: Arc::new(WorkerGate::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            child: Arc::new(Mutex::new(None)),
            threads: Vec::new(),
        };
        handler.run_once()?;
        Ok(handler)
    }

    fn run_once(&mut self) -> Result<(), ZoneError> {
        self.reap_current();
        let mut child = shell_command(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ZoneError::Spawn(format!("{}: {e}", self.command)))?;

        tracing::debug!(target: "runtime.zones", zone = self.zone.as_str(), "pipe_spawned");
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        *self.child.lock().expect("pipe child lock poisoned") = Some(child);

        if let Some(out) = stdout {
            // The stdout reader also reaps the child once the stream ends.
            let (zone, tx) = (self.zone.clone(), self.tx.clone());
            let (gate, shutdown, child) =
                (self.gate.clone(), self.shutdown.clone(), self.child.clone());
            let color = self.color;
            self.threads.push(std::thread::spawn(move || {
                read_stream(out, &zone, &tx, &gate, &shutdown, color);
                let status = child
                    .lock()
                    .expect("pipe child lock poisoned")
                    .take()
                    .and_then(|mut c| c.wait().ok());
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                let code = status.and_then(|s| s.code());
                post_zone_event(&tx, ZoneEvent::new(&zone, ZonePayload::Exited(code)));
            }));
        }
        if let Some(err) = stderr {
            let (zone, tx) = (self.zone.clone(), self.tx.clone());
            let (gate, shutdown) = (self.gate.clone(), self.shutdown.clone());
            let color = self.color;
            self.threads.push(std::thread::spawn(move || {
                read_stream(err, &zone, &tx, &gate, &shutdown, color);
            }));
        }
        Ok(())
    }

    fn reap_current(&mut self) {
        if let Some(mut child) = self.child.lock().expect("pipe child lock poisoned").take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        for t in self.threads.drain(..) {
            join_with_deadline(t, &self.zone, "pipe-reader");
        }
    }
}

fn read_stream<R: std::io::Read>(
    stream: R,
    zone: &str,
    tx: &Sender<ZoneEvent>,
    gate: &WorkerGate,
    shutdown: &AtomicBool,
    color: bool,
) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        gate.wait_while_paused(shutdown);
        match line {
            Ok(text) => {
                let styled = ansi::parse_line(&text, color);
                post_zone_event(tx, ZoneEvent::new(zone, ZonePayload::Append(vec![styled])));
            }
            Err(_) => return,
        }
    }
}

impl ZoneHandler for PipeHandler {
    fn kind(&self) -> &'static str {
        "pipe"
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.gate.notify();
        self.reap_current();
    }

    fn pause(&mut self) {
        self.gate.set_paused(true);
    }

    fn resume(&mut self) {
        self.gate.set_paused(false);
    }

    fn refresh(&mut self) {
        // A fresh run replaces prior output.
        post_zone_event(
            &self.tx,
            ZoneEvent::new(&self.zone, ZonePayload::Replace(Vec::new())),
        );
        match self.run_once() {
            Ok(()) => {}
            Err(e) => post_zone_event(
                &self.tx,
                ZoneEvent::new(
                    &self.zone,
                    ZonePayload::State(ZoneRunState::Error(e.to_string())),
                ),
            ),
        }
    }
}

impl Drop for PipeHandler {
    fn drop(&mut self) {
        self.stop();
    }
}
