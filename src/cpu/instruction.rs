//! The micro0 instruction set.
//!
//! Four instructions, all three bytes long: an opcode followed by a
//! little-endian direct address. Each instruction is executed as a sequence
//! of micro-steps, one per clock tick. Steps 0 and 1 (settle and opcode
//! fetch) belong to the CPU; steps 2 onward are defined here.
//!
//! | Opcode | Mnemonic | Ticks |
//! |--------|----------|-------|
//! | 0x01   | `load`   | 5     |
//! | 0x02   | `store`  | 5     |
//! | 0x03   | `add`    | 6     |
//! | 0x04   | `brz`    | 5     |

use crate::bus::Bus;
use crate::cpu::{CpuError, Registers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opcode values.
pub struct Opcode;

impl Opcode {
    pub const LOAD_DIRECT: u8 = 0x01;
    pub const STORE_DIRECT: u8 = 0x02;
    pub const ADD_DIRECT: u8 = 0x03;
    pub const BRANCH_IF_ZERO_SET: u8 = 0x04;
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// ACC := [addr]
    LoadDirect,

    /// [addr] := ACC
    StoreDirect,

    /// ACC := ACC + [addr] (mod 256), via BUFFER
    AddDirect,

    /// PC := addr if ACC == 0
    BranchIfZeroSet,
}

/// Outcome of a single micro-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroStep {
    /// More ticks are needed.
    Continue,
    /// The instruction has finished and PC points at the next one.
    Done,
}

impl Instruction {
    /// Every instruction, in opcode order.
    pub const ALL: [Instruction; 4] = [
        Instruction::LoadDirect,
        Instruction::StoreDirect,
        Instruction::AddDirect,
        Instruction::BranchIfZeroSet,
    ];

    /// Look up the instruction for an opcode byte.
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            Opcode::LOAD_DIRECT => Some(Instruction::LoadDirect),
            Opcode::STORE_DIRECT => Some(Instruction::StoreDirect),
            Opcode::ADD_DIRECT => Some(Instruction::AddDirect),
            Opcode::BRANCH_IF_ZERO_SET => Some(Instruction::BranchIfZeroSet),
            _ => None,
        }
    }

    pub fn opcode(self) -> u8 {
        match self {
            Instruction::LoadDirect => Opcode::LOAD_DIRECT,
            Instruction::StoreDirect => Opcode::STORE_DIRECT,
            Instruction::AddDirect => Opcode::ADD_DIRECT,
            Instruction::BranchIfZeroSet => Opcode::BRANCH_IF_ZERO_SET,
        }
    }

    /// Encoded length in bytes.
    pub fn size(self) -> u16 {
        3
    }

    /// Assembler mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::LoadDirect => "load",
            Instruction::StoreDirect => "store",
            Instruction::AddDirect => "add",
            Instruction::BranchIfZeroSet => "brz",
        }
    }

    /// Look up an instruction by mnemonic (case-insensitive).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// Ticks from an idle CPU until the instruction completes, counting the
    /// settle and fetch ticks.
    pub fn total_ticks(self) -> u32 {
        match self {
            Instruction::AddDirect => 6,
            _ => 5,
        }
    }

    /// Perform micro-step `step` (2 or higher) of this instruction.
    ///
    /// Steps 2 and 3 assemble the direct address into INDEX one byte per
    /// tick, low byte first. Later steps are instruction specific. On the
    /// final step PC is advanced past the instruction, or set to the branch
    /// target, before `MicroStep::Done` is returned. A step the instruction
    /// does not have is `CpuError::NoMicroStep` and touches nothing.
    pub fn step(self, step: u8, regs: &mut Registers, bus: &mut Bus) -> Result<MicroStep, CpuError> {
        match (self, step) {
            (_, 2) => {
                let lo = bus.read(regs.pc.wrapping_add(1))?;
                regs.set_index_low(lo);
            }
            (_, 3) => {
                let hi = bus.read(regs.pc.wrapping_add(2))?;
                regs.add_index_high(hi);
            }

            (Instruction::LoadDirect, 4) => {
                regs.acc = bus.read(regs.index)?;
                regs.advance_pc(self.size());
                return Ok(MicroStep::Done);
            }

            (Instruction::StoreDirect, 4) => {
                bus.write(regs.index, regs.acc)?;
                regs.advance_pc(self.size());
                return Ok(MicroStep::Done);
            }

            (Instruction::AddDirect, 4) => {
                regs.buffer = bus.read(regs.index)?;
            }
            (Instruction::AddDirect, 5) => {
                regs.acc = regs.acc.wrapping_add(regs.buffer);
                regs.advance_pc(self.size());
                return Ok(MicroStep::Done);
            }

            (Instruction::BranchIfZeroSet, 4) => {
                if regs.acc == 0 {
                    regs.jump(regs.index);
                } else {
                    regs.advance_pc(self.size());
                }
                return Ok(MicroStep::Done);
            }

            (instruction, step) => {
                return Err(CpuError::NoMicroStep { instruction, step });
            }
        }

        Ok(MicroStep::Continue)
    }
}

impl TryFrom<u8> for Instruction {
    type Error = DecodeError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        Instruction::from_opcode(opcode).ok_or(DecodeError::UnknownOpcode(opcode))
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusError, Ram};

    fn bus_with(image: Vec<u8>) -> Bus {
        let mut bus = Bus::new();
        bus.attach(Box::new(Ram::with_contents(0, image))).unwrap();
        bus
    }

    #[test]
    fn test_opcode_roundtrip() {
        for instr in Instruction::ALL {
            assert_eq!(Instruction::from_opcode(instr.opcode()), Some(instr));
            assert_eq!(Instruction::from_mnemonic(instr.mnemonic()), Some(instr));
        }
    }

    #[test]
    fn test_unknown_opcodes() {
        assert_eq!(Instruction::try_from(0x00), Err(DecodeError::UnknownOpcode(0x00)));
        assert_eq!(Instruction::try_from(0x05), Err(DecodeError::UnknownOpcode(0x05)));
        assert_eq!(Instruction::try_from(0xFF), Err(DecodeError::UnknownOpcode(0xFF)));
    }

    #[test]
    fn test_mnemonic_is_case_insensitive() {
        assert_eq!(Instruction::from_mnemonic("BRZ"), Some(Instruction::BranchIfZeroSet));
        assert_eq!(Instruction::from_mnemonic("Load"), Some(Instruction::LoadDirect));
        assert_eq!(Instruction::from_mnemonic("jmp"), None);
    }

    #[test]
    fn test_address_assembly_steps() {
        let mut bus = bus_with(vec![0x01, 0x34, 0x12]);
        let mut regs = Registers::new();

        let instr = Instruction::LoadDirect;
        assert_eq!(instr.step(2, &mut regs, &mut bus).unwrap(), MicroStep::Continue);
        assert_eq!(regs.index, 0x0034);
        assert_eq!(instr.step(3, &mut regs, &mut bus).unwrap(), MicroStep::Continue);
        assert_eq!(regs.index, 0x1234);
    }

    #[test]
    fn test_add_splits_read_and_sum() {
        let mut bus = bus_with(vec![0x03, 0x03, 0x00, 0x13]);
        let mut regs = Registers { acc: 0x32, ..Registers::new() };

        let instr = Instruction::AddDirect;
        instr.step(2, &mut regs, &mut bus).unwrap();
        instr.step(3, &mut regs, &mut bus).unwrap();

        assert_eq!(instr.step(4, &mut regs, &mut bus).unwrap(), MicroStep::Continue);
        assert_eq!(regs.buffer, 0x13);
        assert_eq!(regs.acc, 0x32);

        assert_eq!(instr.step(5, &mut regs, &mut bus).unwrap(), MicroStep::Done);
        assert_eq!(regs.acc, 0x45);
        assert_eq!(regs.pc, 3);
    }

    #[test]
    fn test_operand_fetch_out_of_image() {
        let mut bus = bus_with(vec![0x01]);
        let mut regs = Registers::new();

        let result = Instruction::LoadDirect.step(2, &mut regs, &mut bus);
        assert_eq!(
            result,
            Err(CpuError::Bus(BusError::OutOfBounds { device: "ram", address: 1 }))
        );
    }

    #[test]
    fn test_steps_outside_instruction_are_errors() {
        let mut bus = bus_with(vec![0x01, 0x00, 0x00]);
        let mut regs = Registers { acc: 7, ..Registers::new() };

        let cases = [
            (Instruction::LoadDirect, 5),
            (Instruction::StoreDirect, 5),
            (Instruction::AddDirect, 6),
            (Instruction::BranchIfZeroSet, 5),
            (Instruction::LoadDirect, 0),
            (Instruction::AddDirect, 1),
        ];
        for (instruction, step) in cases {
            assert_eq!(
                instruction.step(step, &mut regs, &mut bus),
                Err(CpuError::NoMicroStep { instruction, step })
            );
        }

        assert_eq!(regs, Registers { acc: 7, ..Registers::new() });
        assert_eq!(bus.read(0x0000).unwrap(), 0x01);
    }

    #[test]
    fn test_total_ticks() {
        assert_eq!(Instruction::LoadDirect.total_ticks(), 5);
        assert_eq!(Instruction::StoreDirect.total_ticks(), 5);
        assert_eq!(Instruction::AddDirect.total_ticks(), 6);
        assert_eq!(Instruction::BranchIfZeroSet.total_ticks(), 5);
    }
}
