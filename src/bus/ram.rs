//! Main memory.
//!
//! RAM has no fixed size: it is exactly as large as the last image loaded
//! into it. Accesses past the end of the image are bus errors, and writes
//! never grow it.

use crate::bus::{BusError, Device};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// A RAM device backed by a flat byte image.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Ram {
    base: u16,
    contents: Vec<u8>,
}

impl Ram {
    /// Create an empty RAM mapped at `base`.
    pub fn new(base: u16) -> Self {
        Self {
            base,
            contents: Vec::new(),
        }
    }

    /// Create a RAM mapped at `base` holding `contents`.
    pub fn with_contents(base: u16, contents: Vec<u8>) -> Self {
        Self { base, contents }
    }

    /// Replace the whole backing image.
    pub fn load(&mut self, image: Vec<u8>) {
        self.contents = image;
    }

    /// The loaded image.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Size of the loaded image in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Check if no image is loaded.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Dump a window of memory as `(address, byte)` pairs (for debugging).
    pub fn dump(&self, start: u16, count: usize) -> Vec<(u16, u8)> {
        let offset = start.saturating_sub(self.base) as usize;
        self.contents
            .iter()
            .enumerate()
            .skip(offset)
            .take(count)
            .map(|(i, &b)| (self.base.wrapping_add(i as u16), b))
            .collect()
    }

    fn offset(&self, address: u16) -> Result<usize, BusError> {
        let offset = address.wrapping_sub(self.base) as usize;
        if address < self.base || offset >= self.contents.len() {
            return Err(BusError::OutOfBounds {
                device: self.name(),
                address,
            });
        }
        Ok(offset)
    }
}

impl Device for Ram {
    fn base(&self) -> u16 {
        self.base
    }

    fn name(&self) -> &'static str {
        "ram"
    }

    #[inline]
    fn read(&self, address: u16) -> Result<u8, BusError> {
        let offset = self.offset(address)?;
        Ok(self.contents[offset])
    }

    #[inline]
    fn write(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        let offset = self.offset(address)?;
        self.contents[offset] = value;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl std::fmt::Debug for Ram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero bytes
        let non_zero = self.contents.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Ram")
            .field("base", &format_args!("{:#06x}", self.base))
            .field("len", &self.contents.len())
            .field("non_zero_bytes", &non_zero)
            .finish()
    }
}
