//! TUI debugger for the TD4 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - ROM view with the current instruction and breakpoints
//! - Register and port display
//! - Output port LEDs and history
//! - Step/run/breakpoint controls and input port entry

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
