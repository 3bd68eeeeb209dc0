//! # micro0 Emulator
//!
//! A cycle-stepped emulator of the micro0, a minimal 8-bit microcomputer.
//!
//! The micro0 CPU has four instructions (load, store, add, branch-if-zero),
//! each taking five or six clock ticks. It talks to RAM and a character
//! output device over a single address bus. This crate emulates it one tick
//! at a time, so self-modifying programs behave exactly as on hardware.

pub mod bus;
pub mod cpu;
pub mod asm;
pub mod config;
pub mod system;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bus::{Bus, BusError, CharOut, Device, Ram};
pub use cpu::{Cpu, CpuState, CpuError, Registers, Instruction, Phase};
pub use asm::{assemble, disassemble, AssemblerError, load_image, save_image, ImageError};
pub use config::{SystemConfig, ConfigError};
pub use system::{System, SystemError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
