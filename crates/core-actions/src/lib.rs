//! Input dispatch and command execution.
//!
//! Two public entry points:
//! * `process_input`: the mode state machine, turning normalized input
//!   events into state mutations and command lines;
//! * `execute`: the command executor shared by COMMAND mode and the API
//!   server, so both speak exactly the same language.
//!
//! The parser sits between them as pure classification; keeping it free of
//! side effects is what lets the tests (and the API) exercise the whole
//! command table without a terminal.

pub mod executor;
pub mod keycodes;
pub mod modes;
pub mod parser;

pub use executor::{
    CommandResult, ExecCtx, SystemClipboard, apply_result_message, execute, instantiate_zones,
};
pub use keycodes::encode_key;
pub use modes::{InputOutcome, process_input};
pub use parser::{ParsedCommand, parse};
