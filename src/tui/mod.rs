//! TUI debugger for the micro0 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and sequencer visualization
//! - Hex memory view
//! - Tick/step/run/breakpoint controls
//! - Disassembly and character output views

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
