//! The assembled micro0 machine.
//!
//! [`System`] is the composition root: it owns the bus (and through it RAM
//! and the character output) plus the CPU, and lends the bus to the CPU one
//! tick at a time.

use crate::bus::{Bus, BusError, CharOut, Ram};
use crate::config::{ConfigError, SystemConfig};
use crate::cpu::{Cpu, CpuError};
use thiserror::Error;

/// A complete micro0 computer.
#[derive(Debug)]
pub struct System {
    cpu: Cpu,
    bus: Bus,
    config: SystemConfig,
}

impl System {
    /// Build a machine with the standard memory map (RAM at 0x0000,
    /// character output at 0xF000).
    pub fn new() -> Result<Self, SystemError> {
        Self::with_config(SystemConfig::default())
    }

    /// Build a machine with a custom memory map.
    pub fn with_config(config: SystemConfig) -> Result<Self, SystemError> {
        config.validate()?;

        let mut bus = Bus::new();
        bus.attach(Box::new(Ram::new(config.ram_base)))?;
        bus.attach(Box::new(CharOut::new(config.char_out_base)))?;
        tracing::debug!(?bus, "memory map");

        Ok(Self {
            cpu: Cpu::new(),
            bus,
            config,
        })
    }

    /// Replace RAM contents with a flat binary image.
    pub fn load(&mut self, binary: impl Into<Vec<u8>>) {
        let image = binary.into();
        tracing::debug!(bytes = image.len(), "loading image");
        if let Some(ram) = self.bus.device_mut::<Ram>() {
            ram.load(image);
        }
    }

    /// Tick the CPU exactly `cycles` times.
    ///
    /// There is no halt instruction, so this always consumes the full budget
    /// unless the CPU faults, in which case the fault is returned and the
    /// remaining ticks are skipped.
    pub fn run(&mut self, cycles: u64) -> Result<(), SystemError> {
        tracing::debug!(cycles, start = self.cpu.cycles, "run");
        self.cpu.tick_n(&mut self.bus, cycles)?;
        Ok(())
    }

    /// Tick once.
    pub fn tick(&mut self) -> Result<(), SystemError> {
        self.cpu.tick(&mut self.bus)?;
        Ok(())
    }

    /// Tick until the current (or next) instruction completes.
    ///
    /// Returns the number of ticks consumed.
    pub fn step(&mut self) -> Result<u32, SystemError> {
        let mut ticks = 0;
        loop {
            self.cpu.tick(&mut self.bus)?;
            ticks += 1;
            if self.cpu.at_instruction_boundary() {
                return Ok(ticks);
            }
        }
    }

    /// Reset the CPU and clear output. RAM keeps its contents.
    pub fn reset(&mut self) {
        self.cpu.reset();
        if let Some(out) = self.bus.device_mut::<CharOut>() {
            out.clear();
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Current RAM image.
    pub fn ram(&self) -> &[u8] {
        self.bus
            .device::<Ram>()
            .map(Ram::contents)
            .unwrap_or_default()
    }

    /// Bytes written to the character output so far.
    pub fn output(&self) -> &[u8] {
        self.bus
            .device::<CharOut>()
            .map(CharOut::output)
            .unwrap_or_default()
    }

    /// Output rendered as text, with invalid UTF-8 replaced.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(self.output()).into_owned()
    }
}

/// Errors raised while building or running a [`System`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("CPU error: {0}")]
    Cpu(#[from] CpuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_direct() {
        let mut system = System::new().unwrap();
        system.load(vec![0x01, 0x05, 0, 0, 0, 0x09]);
        system.run(5).unwrap();

        assert_eq!(system.cpu().regs.acc, 0x09);
    }

    #[test]
    fn test_store_direct() {
        let mut system = System::new().unwrap();
        system.load(vec![0x02, 0x04, 0, 0, 0]);
        system.cpu_mut().regs.acc = 0x33;
        system.run(5).unwrap();

        assert_eq!(system.ram()[4], 0x33);
    }

    #[test]
    fn test_add_direct() {
        let mut system = System::new().unwrap();
        system.load(vec![0x03, 0x03, 0x00, 0x13]);
        system.cpu_mut().regs.acc = 0x32;
        system.run(6).unwrap();

        assert_eq!(system.cpu().regs.acc, 0x45);
    }

    #[test]
    fn test_branch_if_zero() {
        let mut system = System::new().unwrap();
        system.load(vec![0x04, 0x0f, 0x00, 0x00]);
        system.run(5).unwrap();
        assert_eq!(system.cpu().regs.pc, 0x000f);

        system.reset();
        system.cpu_mut().regs.acc = 2;
        system.run(5).unwrap();
        assert_eq!(system.cpu().regs.pc, 0x0003);
    }

    #[test]
    fn test_store_to_char_out() {
        let mut system = System::new().unwrap();
        system.load(vec![0x02, 0x00, 0xF0]);
        system.cpu_mut().regs.acc = b'!';
        system.run(5).unwrap();

        assert_eq!(system.output(), b"!");
        assert_eq!(system.output_text(), "!");
    }

    #[test]
    fn test_step_reports_ticks() {
        let mut system = System::new().unwrap();
        // add [6]; load [6]
        system.load(vec![0x03, 0x06, 0x00, 0x01, 0x06, 0x00, 0x07]);

        assert_eq!(system.step().unwrap(), 6);
        assert_eq!(system.step().unwrap(), 5);
        assert_eq!(system.cpu().regs.acc, 0x07);
        assert_eq!(system.cpu().retired(), 2);
    }

    #[test]
    fn test_run_surfaces_unknown_opcode() {
        let mut system = System::new().unwrap();
        system.load(vec![0x7F]);

        let err = system.run(10).unwrap_err();
        assert_eq!(err, SystemError::Cpu(CpuError::UnknownOpcode { opcode: 0x7F, pc: 0 }));
        assert_eq!(system.cpu().cycles, 1);
    }

    #[test]
    fn test_unmapped_with_high_ram_base() {
        let config = SystemConfig { ram_base: 0x0100, ..SystemConfig::default() };
        let mut system = System::with_config(config).unwrap();
        system.load(vec![0x01, 0x00, 0x01]);

        let err = system.run(5).unwrap_err();
        assert_eq!(
            err,
            SystemError::Cpu(CpuError::Bus(BusError::UnmappedAddress(0x0000)))
        );
    }

    #[test]
    fn test_overlapping_config_rejected() {
        let config = SystemConfig { ram_base: 0xF000, char_out_base: 0xF000 };
        assert!(matches!(
            System::with_config(config),
            Err(SystemError::Config(ConfigError::Overlap(0xF000)))
        ));
    }

    #[test]
    fn test_reset_clears_output_keeps_ram() {
        let mut system = System::new().unwrap();
        system.load(vec![0x02, 0x00, 0xF0]);
        system.run(5).unwrap();
        assert_eq!(system.output().len(), 1);

        system.reset();
        assert!(system.output().is_empty());
        assert_eq!(system.ram(), &[0x02, 0x00, 0xF0]);
        assert_eq!(system.cpu().cycles, 0);
    }
}
