//! Zone handler runtimes.
//!
//! Each running zone owns one handler; a handler owns the OS resources
//! (child process, PTY master, FIFO, listening socket, watcher) and the
//! thread(s) that block on them. Handlers communicate with the application
//! loop exclusively through the zone event channel; they never touch the
//! registry or any other shared state.
//!
//! Lifecycle contract:
//! * `stop` signals the worker, releases resources that unblock it, and
//!   joins with a bounded deadline; a thread that overruns is detached with
//!   a warning rather than wedging shutdown.
//! * `pause`/`resume` gate event posting while keeping resources alive.
//! * `refresh` re-runs the producer where that is meaningful.
//! * `send` is only meaningful for PTY zones.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::ZoneError;
use crate::emulator::TermScreen;

#[cfg(unix)]
mod fifo;
mod pager;
mod pipe;
mod pty;
mod socket;
mod watch;

#[cfg(unix)]
pub use fifo::FifoHandler;
pub use pager::PagerHandler;
pub use pipe::PipeHandler;
pub use pty::PtyHandler;
pub use socket::SocketHandler;
pub use watch::{WatchHandler, WatchTrigger};

/// How long `stop` waits for a worker thread before detaching it.
pub const JOIN_DEADLINE: Duration = Duration::from_secs(1);

/// Capability interface over the zone types. Variants implement only what
/// applies; the defaults are inert.
pub trait ZoneHandler: Send {
    fn kind(&self) -> &'static str;

    /// Stop the worker and release resources. Idempotent.
    fn stop(&mut self);

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn refresh(&mut self) {}

    fn send(&mut self, _bytes: &[u8]) -> Result<(), ZoneError> {
        Err(ZoneError::Unsupported("send"))
    }

    /// Terminal screen for PTY zones; `None` elsewhere.
    fn screen(&self) -> Option<Arc<Mutex<TermScreen>>> {
        None
    }
}

/// Pause gate + interruptible sleep shared by the worker loops.
///
/// Workers call `wait_while_paused` before posting and `interruptible_sleep`
/// between runs; `stop` flips the shutdown flag and notifies so blocked
/// workers wake immediately.
#[derive(Debug)]
pub struct WorkerGate {
    paused: Mutex<bool>,
    kicked: AtomicBool,
    cv: Condvar,
}

impl Default for WorkerGate {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerGate {
    pub fn new() -> Self {
        Self {
            paused: Mutex::new(false),
            kicked: AtomicBool::new(false),
            cv: Condvar::new(),
        }
    }

    pub fn set_paused(&self, paused: bool) {
        *self.paused.lock().expect("pause gate poisoned") = paused;
        self.cv.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock().expect("pause gate poisoned")
    }

    /// Request an immediate wake-up of a sleeping worker (refresh).
    pub fn kick(&self) {
        self.kicked.store(true, Ordering::Release);
        self.cv.notify_all();
    }

    /// Wake any waiter (used by `stop` after setting the shutdown flag).
    pub fn notify(&self) {
        self.cv.notify_all();
    }

    /// Block while paused, returning early when `shutdown` is set.
    pub fn wait_while_paused(&self, shutdown: &AtomicBool) {
        let mut paused = self.paused.lock().expect("pause gate poisoned");
        while *paused && !shutdown.load(Ordering::Acquire) {
            let (guard, _) = self
                .cv
                .wait_timeout(paused, Duration::from_millis(100))
                .expect("pause gate poisoned");
            paused = guard;
        }
    }

    /// Sleep up to `duration`, returning early on shutdown or kick. Returns
    /// `true` when the full duration elapsed.
    pub fn interruptible_sleep(&self, duration: Duration, shutdown: &AtomicBool) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.paused.lock().expect("pause gate poisoned");
        loop {
            if shutdown.load(Ordering::Acquire) || self.kicked.swap(false, Ordering::AcqRel) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (g, _) = self
                .cv
                .wait_timeout(guard, deadline - now)
                .expect("pause gate poisoned");
            guard = g;
        }
    }
}

/// Join a worker thread, detaching with a warning past the deadline.
pub(crate) fn join_with_deadline(handle: JoinHandle<()>, zone: &str, role: &str) {
    let deadline = Instant::now() + JOIN_DEADLINE;
    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    if handle.is_finished() {
        let _ = handle.join();
    } else {
        tracing::warn!(target: "runtime.zones", zone, role, "worker did not stop within deadline, detaching");
        drop(handle);
    }
}

/// Build the platform shell invocation for a user command string.
pub(crate) fn shell_command(command: &str) -> Command {
    if cfg!(unix) {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
}
