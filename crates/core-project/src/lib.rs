//! Project and layout persistence.
//!
//! Projects are JSON snapshots of canvas, viewport, grid, bookmarks, and
//! zone descriptors (runtime buffers are ephemeral by design). Layouts are
//! named zone templates in a line-oriented text format under the platform
//! config directory. Text export/import move plain canvas content in and
//! out.
//!
//! Loading is forgiving: unknown JSON fields are ignored for forward
//! compatibility, and a parse failure aborts the load without touching the
//! running state.

pub mod layout;
pub mod project;
pub mod textio;

pub use layout::{Layout, layouts_dir, load_layout, save_layout};
pub use project::{ProjectDoc, load_project, save_project};
pub use textio::{export_string, export_to_file, import_from_file, import_string};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed project file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed layout: {0}")]
    Layout(String),
    #[error("no layout named '{0}'")]
    UnknownLayout(String),
}

/// ISO 8601 UTC timestamp (seconds precision) for project metadata, derived
/// from the system clock without a date-time dependency.
pub(crate) fn iso_now() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    iso_from_unix(secs)
}

pub(crate) fn iso_from_unix(secs: u64) -> String {
    let days = secs / 86_400;
    let rem = secs % 86_400;
    let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
    // Civil-from-days (Howard Hinnant's algorithm), valid for the unix era.
    let z = days as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };
    format!("{year:04}-{month:02}-{d:02}T{h:02}:{m:02}:{s:02}Z")
}
