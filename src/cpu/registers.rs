//! micro0 CPU registers.
//!
//! The machine has four registers:
//! - PC: 16-bit program counter
//! - ACC: 8-bit accumulator (main computation register)
//! - INDEX: 16-bit scratch address, assembled one byte per tick
//! - BUFFER: 8-bit scratch byte holding an operand between bus cycles

use serde::{Deserialize, Serialize};

/// The micro0 register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Program counter
    pub pc: u16,

    /// Accumulator
    pub acc: u8,

    /// Direct address being assembled by the current instruction
    pub index: u16,

    /// Operand latch used by ADD between the read and the add
    pub buffer: u8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move the program counter forward by `size` bytes, wrapping at 64K.
    pub fn advance_pc(&mut self, size: u16) {
        self.pc = self.pc.wrapping_add(size);
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Latch the low byte of a direct address.
    pub fn set_index_low(&mut self, lo: u8) {
        self.index = lo as u16;
    }

    /// Fold the high byte of a direct address into INDEX.
    pub fn add_index_high(&mut self, hi: u8) {
        self.index = self.index.wrapping_add((hi as u16) << 8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let regs = Registers::new();
        assert_eq!(regs.pc, 0);
        assert_eq!(regs.acc, 0);
        assert_eq!(regs.index, 0);
        assert_eq!(regs.buffer, 0);
    }

    #[test]
    fn test_index_is_little_endian() {
        let mut regs = Registers::new();
        regs.index = 0xBEEF;

        regs.set_index_low(0x34);
        assert_eq!(regs.index, 0x0034);
        regs.add_index_high(0x12);
        assert_eq!(regs.index, 0x1234);
    }

    #[test]
    fn test_advance_pc_wraps() {
        let mut regs = Registers::new();
        regs.pc = 0xFFFE;

        regs.advance_pc(3);
        assert_eq!(regs.pc, 0x0001);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers { pc: 9, acc: 8, index: 7, buffer: 6 };
        regs.reset();
        assert_eq!(regs, Registers::new());
    }
}
