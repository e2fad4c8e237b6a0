//! mygrid entrypoint.
//!
//! Startup order: logging, panic hook, CLI args, config file, project file
//! (exit 2 when it cannot be loaded), terminal guard, API server, then the
//! application loop. Exit codes: 0 normal, 1 fatal initialization failure
//! (bad arguments, terminal unavailable), 2 project load failure.

use std::path::PathBuf;
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use core_actions::instantiate_zones;
use core_api::ApiServer;
use core_events::{api_channel, zone_event_channel};
use core_state::AppState;
use core_terminal::{TerminalCapabilities, TerminalSession};
use core_zones::ZoneManager;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod app;
mod sysclip;

use app::{App, AppOptions};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "mygrid", version, about = "Infinite ASCII canvas editor")]
struct Args {
    /// Project file to open at startup.
    pub file: Option<PathBuf>,
    /// Enable the API server and continuous rendering.
    #[arg(long)]
    pub server: bool,
    /// API bind host (loopback unless you know what you are doing).
    #[arg(long)]
    pub host: Option<String>,
    /// API TCP port.
    #[arg(long)]
    pub port: Option<u16>,
    /// Disable the command FIFO.
    #[arg(long = "no-fifo")]
    pub no_fifo: bool,
    /// Command FIFO path (overrides the configured default).
    #[arg(long)]
    pub fifo: Option<PathBuf>,
    /// Load a named layout after startup.
    #[arg(long)]
    pub layout: Option<String>,
    /// Run without a display (API/FIFO driven).
    #[arg(long)]
    pub headless: bool,
    /// Configuration file path (overrides discovery of `mygrid.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help/version are normal exits; real argument errors are fatal
            // initialization failures.
            if e.use_stderr() {
                let _ = e.print();
                return 1;
            }
            let _ = e.print();
            return 0;
        }
    };

    let _log_guard = match configure_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("mygrid: logging setup failed: {e}");
            return 1;
        }
    };
    install_panic_hook();
    info!(target: "runtime", "startup");

    match bootstrap(args) {
        Ok(code) => code,
        Err(e) => {
            error!(target: "runtime", error = %e, "fatal");
            eprintln!("mygrid: {e:#}");
            1
        }
    }
}

fn configure_logging() -> Result<Option<WorkerGuard>> {
    let log_path = std::path::Path::new("mygrid.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "mygrid.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        Err(_) => {
            // A global subscriber is already installed (tests); drop the
            // guard so the writer shuts down.
            Ok(None)
        }
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            tracing::error!(target: "runtime.panic", ?panic_info, "panic");
            default_panic(panic_info);
        }));
    });
}

fn bootstrap(args: Args) -> Result<i32> {
    let config = core_config::load_from(args.config.clone()).context("config load")?;

    let (zone_tx, zone_rx) = zone_event_channel();
    let (api_tx, api_rx) = api_channel();

    let caps = TerminalCapabilities::detect();
    let mut state = AppState::new();
    let mut zones = ZoneManager::new(zone_tx, caps.color());

    // Project file first: a broken file must not leave half a session.
    if let Some(path) = &args.file {
        match core_project::load_project(path) {
            Ok(doc) => {
                state.project_created_iso = Some(doc.metadata.created_iso.clone());
                let specs = doc.apply(&mut state);
                let (created, errors) = instantiate_zones(&mut state, &mut zones, specs);
                info!(
                    target: "runtime.startup",
                    file = %path.display(),
                    zones = created,
                    zone_errors = errors.len(),
                    "project_loaded"
                );
                state.file_path = Some(path.clone());
                if !errors.is_empty() {
                    state.set_ephemeral(
                        format!("zone errors: {}", errors.join("; ")),
                        Duration::from_secs(6),
                    );
                }
            }
            Err(e) => {
                eprintln!("mygrid: cannot load {}: {e}", path.display());
                return Ok(2);
            }
        }
    }

    // Terminal next, so a load failure above never touches the screen.
    let mut session = if args.headless {
        TerminalSession::headless()
    } else {
        TerminalSession::interactive("mygrid").context("terminal unavailable (try --headless)")?
    };
    if session.is_interactive() {
        let (cols, rows) = session.size();
        state.viewport.resize(cols, rows.saturating_sub(1).max(1));
    }

    let api_server = if args.server {
        let host = args.host.unwrap_or(config.api.host.clone());
        let port = args.port.unwrap_or(config.api.port);
        let fifo_path = if args.no_fifo {
            None
        } else {
            args.fifo.clone().or(config.api.fifo_path.clone())
        };
        Some(ApiServer::start(Some((host, port)), fifo_path, api_tx).context("api server")?)
    } else {
        None
    };

    let mut app = App::new(
        state,
        zones,
        zone_rx,
        api_rx,
        AppOptions {
            headless: args.headless,
            server: args.server,
            commands_per_frame: config.api.commands_per_frame,
            fps: config.render.fps,
            default_max_lines: config.zones.default_max_lines,
        },
    );

    if let Some(layout) = &args.layout {
        // The executor owns layout semantics; reuse it instead of a second
        // load path.
        if !app.startup_command(&format!("layout load {layout}")) {
            info!(target: "runtime.startup", layout = layout.as_str(), "layout_load_failed");
        }
    }

    let run_result = app.run();

    if let Some(mut server) = api_server {
        server.stop();
    }
    session.release();
    run_result?;
    info!(target: "runtime", "shutdown_complete");
    Ok(0)
}
