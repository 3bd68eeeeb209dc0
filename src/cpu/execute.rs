//! CPU tick engine for micro0.
//!
//! Execution is clock-stepped: every call to [`Cpu::tick`] advances the
//! machine by exactly one cycle. The tick counter sequences each instruction:
//!
//! - 0: settle. Nothing happens; models the gap between completing one
//!   instruction and fetching the next.
//! - 1: fetch. The opcode at PC is read over the bus and decoded.
//! - 2..: execute. The current instruction performs one micro-step.
//!
//! When an instruction's final micro-step reports completion the counter
//! drops back to 0; otherwise it is incremented. Register and memory side
//! effects therefore land on the same tick they would on real hardware, and
//! a caller stopping mid-instruction sees partially updated state.

use crate::bus::{Bus, BusError};
use crate::cpu::instruction::{Instruction, MicroStep};
use crate::cpu::Registers;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU hit a fatal error and will not tick again until reset.
    Faulted,
}

/// Where the sequencer currently is, derived from the tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetch,
    Execute(u8),
}

/// The micro0 CPU.
///
/// The CPU owns only its registers and sequencer state. Memory is reached
/// through the [`Bus`] lent to each tick.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Current execution state.
    pub state: CpuState,
    /// Total ticks executed since reset.
    pub cycles: u64,
    /// Sequencer position within the current instruction.
    tick_counter: u8,
    /// Instruction decoded at the last fetch.
    current: Option<Instruction>,
    /// Instructions completed since reset.
    retired: u64,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            state: CpuState::Running,
            cycles: 0,
            tick_counter: 0,
            current: None,
            retired: 0,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance the machine by one clock tick.
    pub fn tick(&mut self, bus: &mut Bus) -> Result<(), CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::Faulted);
        }

        tracing::trace!(
            tick = self.tick_counter,
            pc = format_args!("{:#06x}", self.regs.pc),
            acc = format_args!("{:#04x}", self.regs.acc),
            "tick"
        );

        match self.sequence(bus) {
            Ok(()) => {
                self.cycles += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(pc = self.regs.pc, error = %e, "CPU faulted");
                self.state = CpuState::Faulted;
                Err(e)
            }
        }
    }

    /// Perform exactly `count` ticks, stopping at the first error.
    pub fn tick_n(&mut self, bus: &mut Bus, count: u64) -> Result<(), CpuError> {
        for _ in 0..count {
            self.tick(bus)?;
        }
        Ok(())
    }

    fn sequence(&mut self, bus: &mut Bus) -> Result<(), CpuError> {
        match self.tick_counter {
            0 => {
                self.tick_counter = 1;
            }

            1 => {
                let pc = self.regs.pc;
                let opcode = bus.read(pc)?;
                let instr = Instruction::from_opcode(opcode)
                    .ok_or(CpuError::UnknownOpcode { opcode, pc })?;

                tracing::debug!(pc = format_args!("{:#06x}", pc), %instr, "fetch");
                self.current = Some(instr);
                self.tick_counter = 2;
            }

            step => {
                // Only reachable after a successful fetch.
                let instr = self.current.ok_or(CpuError::NoInstruction)?;

                match instr.step(step, &mut self.regs, bus)? {
                    MicroStep::Continue => self.tick_counter += 1,
                    MicroStep::Done => {
                        tracing::debug!(
                            %instr,
                            pc = format_args!("{:#06x}", self.regs.pc),
                            acc = format_args!("{:#04x}", self.regs.acc),
                            "complete"
                        );
                        self.tick_counter = 0;
                        self.retired += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// Raw sequencer value.
    pub fn tick_counter(&self) -> u8 {
        self.tick_counter
    }

    /// Sequencer position as a [`Phase`].
    pub fn phase(&self) -> Phase {
        match self.tick_counter {
            0 => Phase::Idle,
            1 => Phase::Fetch,
            n => Phase::Execute(n),
        }
    }

    /// The instruction most recently fetched.
    pub fn current_instruction(&self) -> Option<Instruction> {
        self.current
    }

    /// Number of instructions completed since reset.
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// True between instructions (the next tick is a settle tick).
    pub fn at_instruction_boundary(&self) -> bool {
        self.tick_counter == 0
    }

    /// Check if the CPU has faulted.
    pub fn is_faulted(&self) -> bool {
        self.state == CpuState::Faulted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("phase", &self.phase())
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU has faulted; reset required")]
    Faulted,

    #[error("unknown opcode {opcode:#04x} at {pc:#06x}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("execute step without a fetched instruction")]
    NoInstruction,

    #[error("{instruction} has no micro-step {step}")]
    NoMicroStep { instruction: Instruction, step: u8 },
}
