//! Character output device.
//!
//! A write-only sink: every byte written anywhere in its window is appended
//! to the output buffer. The host decides how to interpret the bytes.

use crate::bus::{BusError, Device};
use serde::{Deserialize, Serialize};
use std::any::Any;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharOut {
    base: u16,
    buffer: Vec<u8>,
}

impl CharOut {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            buffer: Vec::new(),
        }
    }

    /// Everything written so far, in order.
    pub fn output(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop accumulated output.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Device for CharOut {
    fn base(&self) -> u16 {
        self.base
    }

    fn name(&self) -> &'static str {
        "char-out"
    }

    fn read(&self, address: u16) -> Result<u8, BusError> {
        Err(BusError::WriteOnly {
            device: self.name(),
            address,
        })
    }

    fn write(&mut self, _address: u16, value: u8) -> Result<(), BusError> {
        self.buffer.push(value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_appends_regardless_of_address() {
        let mut out = CharOut::new(0xF000);
        out.write(0xF000, b'o').unwrap();
        out.write(0xFFFF, b'k').unwrap();

        assert_eq!(out.output(), b"ok");
    }

    #[test]
    fn test_read_is_rejected() {
        let out = CharOut::new(0xF000);
        assert_eq!(
            out.read(0xF000),
            Err(BusError::WriteOnly { device: "char-out", address: 0xF000 })
        );
    }

    #[test]
    fn test_clear() {
        let mut out = CharOut::new(0xF000);
        out.write(0xF000, 1).unwrap();
        out.clear();
        assert!(out.output().is_empty());
    }
}
