//! CPU emulation for micro0.
//!
//! This module implements the micro0 processor:
//! - 4 registers: PC, ACC, INDEX, BUFFER
//! - a tick counter sequencing fetch and per-cycle micro-steps
//! - a 4-instruction set with direct addressing

pub mod registers;
pub mod instruction;
pub mod execute;

pub use registers::Registers;
pub use instruction::{Instruction, Opcode, MicroStep, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, Phase};
