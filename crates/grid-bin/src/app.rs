//! The application loop.
//!
//! Single-threaded cooperative loop and sole mutator of canvas, viewport,
//! bookmarks, clipboard, and zone metadata. Each iteration: drain a bounded
//! number of API commands, drain all pending zone events, poll foreground
//! input once, dispatch through the mode machine, execute any produced
//! commands, then redraw within the frame budget. Zone handlers and API
//! ingress run on their own threads and only ever talk to this loop through
//! the bounded channels.

use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use core_actions::{CommandResult, ExecCtx, apply_result_message, execute, process_input};
use core_events::{ApiReply, ApiRequest, ZoneEvent};
use core_render::writer::paint;
use core_state::AppState;
use core_zones::ZoneManager;
use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::sysclip::ShellClipboard;

/// Foreground input poll budget per iteration.
const INPUT_POLL: Duration = core_events::IDLE_POLL;

pub struct AppOptions {
    pub headless: bool,
    /// Continuous redraw mode: render at the frame cap even without input.
    pub server: bool,
    pub commands_per_frame: usize,
    pub fps: u32,
    pub default_max_lines: usize,
}

pub struct App {
    pub state: AppState,
    pub zones: ZoneManager,
    zones_rx: Receiver<ZoneEvent>,
    api_rx: Receiver<ApiRequest>,
    options: AppOptions,
    clipboard: ShellClipboard,
    layouts_dir: std::path::PathBuf,
    needs_redraw: bool,
    last_frame: Instant,
    quit: bool,
}

impl App {
    pub fn new(
        state: AppState,
        zones: ZoneManager,
        zones_rx: Receiver<ZoneEvent>,
        api_rx: Receiver<ApiRequest>,
        options: AppOptions,
    ) -> Self {
        Self {
            state,
            zones,
            zones_rx,
            api_rx,
            options,
            clipboard: ShellClipboard,
            layouts_dir: core_project::layouts_dir(),
            needs_redraw: true,
            last_frame: Instant::now() - Duration::from_secs(1),
            quit: false,
        }
    }

    /// Run a command during startup (`--layout`), surfacing its message on
    /// the status line. Returns whether it succeeded.
    pub fn startup_command(&mut self, line: &str) -> bool {
        let result = self.run_command(line);
        apply_result_message(&mut self.state, &result);
        result.ok
    }

    /// Execute one command line against the current state.
    fn run_command(&mut self, line: &str) -> CommandResult {
        let mut ctx = ExecCtx {
            default_max_lines: self.options.default_max_lines,
            layouts_dir: self.layouts_dir.clone(),
            system_clipboard: Some(&mut self.clipboard),
        };
        let result = execute(line, &mut self.state, &mut self.zones, &mut ctx);
        if result.quit {
            self.quit = true;
        }
        self.needs_redraw = true;
        result
    }

    /// Drain up to the per-frame command budget from the API queue.
    fn drain_api(&mut self) {
        for _ in 0..self.options.commands_per_frame {
            let Ok(request) = self.api_rx.try_recv() else {
                break;
            };
            let result = self.run_command(&request.line);
            debug!(
                target: "api",
                source = ?request.source,
                ok = result.ok,
                "api_command_applied"
            );
            if let Some(reply_tx) = request.reply {
                let _ = reply_tx.send(ApiReply {
                    ok: result.ok,
                    message: result.message,
                    data: result.data.map(|d| d.to_string()),
                });
            }
        }
    }

    /// Apply every pending zone event.
    fn drain_zone_events(&mut self) {
        while let Ok(event) = self.zones_rx.try_recv() {
            let outcome = self.zones.apply_event(event);
            if let Some(message) = outcome.message {
                self.state
                    .set_ephemeral(message, Duration::from_secs(4));
            }
            if outcome.redraw {
                self.needs_redraw = true;
            }
        }
    }

    fn poll_foreground(&mut self) {
        if self.options.headless {
            // No terminal: block briefly on the zone queue instead so the
            // loop still wakes for background traffic.
            if let Ok(event) = self.zones_rx.recv_timeout(INPUT_POLL) {
                let outcome = self.zones.apply_event(event);
                if let Some(message) = outcome.message {
                    self.state.set_ephemeral(message, Duration::from_secs(4));
                }
            }
            return;
        }
        match core_input::poll_input(INPUT_POLL) {
            Ok(Some(event)) => {
                // Raw mode turns SIGINT into a key press; honor it as a
                // graceful quit everywhere except inside a focused PTY
                // (where Ctrl-C belongs to the child).
                if let core_events::InputEvent::Key(key) = &event
                    && key.code == core_events::KeyCode::Char('c')
                    && key.mods.contains(core_events::KeyModifiers::CTRL)
                    && self.state.mode != core_state::Mode::PtyFocused
                {
                    self.quit = true;
                    return;
                }
                let outcome = process_input(&event, &mut self.state, &mut self.zones);
                if outcome.redraw {
                    self.needs_redraw = true;
                }
                if outcome.quit {
                    self.quit = true;
                }
                for line in outcome.commands {
                    let result = self.run_command(&line);
                    apply_result_message(&mut self.state, &result);
                }
            }
            Ok(None) => {}
            Err(e) => {
                debug!(target: "runtime", error = %e, "input_poll_error");
            }
        }
    }

    fn render(&mut self) {
        if self.options.headless {
            return;
        }
        let frame_interval = Duration::from_secs(1) / self.options.fps.max(1);
        if !self.needs_redraw && !self.options.server {
            return;
        }
        if self.last_frame.elapsed() < frame_interval {
            return;
        }
        let frame = core_render::compose(&self.state, &self.zones);
        if let Err(e) = paint(&frame, &mut stdout()) {
            debug!(target: "runtime", error = %e, "paint_error");
        }
        self.last_frame = Instant::now();
        self.needs_redraw = false;
    }

    /// Run until quit. The terminal guard and API server are owned by the
    /// caller; this only loops.
    pub fn run(&mut self) -> Result<()> {
        info!(target: "runtime", "loop_started");
        while !self.quit {
            self.drain_api();
            self.drain_zone_events();
            self.poll_foreground();
            self.render();
        }
        info!(target: "runtime", "loop_stopped");
        self.shutdown();
        Ok(())
    }

    /// Stop every zone handler (bounded join inside), releasing children,
    /// sockets, and named pipes.
    pub fn shutdown(&mut self) {
        self.zones.stop_all();
    }
}
