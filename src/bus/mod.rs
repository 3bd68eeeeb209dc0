//! Address bus and memory-mapped devices.
//!
//! The bus owns every device on the machine and routes each access to
//! exactly one of them. Devices are kept sorted by strictly descending base
//! address, so the first device whose base is at or below the requested
//! address wins. That lets a small I/O window (the character output at
//! 0xF000) sit on top of a larger RAM region.

pub mod char_out;
pub mod ram;

pub use char_out::CharOut;
pub use ram::Ram;

use std::any::Any;
use thiserror::Error;

/// Something that occupies a region of the address space.
///
/// Addresses passed to `read` and `write` are absolute; each device decides
/// how to translate them into its own frame.
pub trait Device: Any {
    /// Lowest address covered by this device.
    fn base(&self) -> u16;

    /// Short human readable name, used in errors and the debugger.
    fn name(&self) -> &'static str;

    fn read(&self, address: u16) -> Result<u8, BusError>;

    fn write(&mut self, address: u16, value: u8) -> Result<(), BusError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The system bus.
#[derive(Default)]
pub struct Bus {
    /// Sorted by descending base address.
    devices: Vec<Box<dyn Device>>,
}

impl Bus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    /// Attach a device, keeping the descending-base order.
    pub fn attach(&mut self, device: Box<dyn Device>) -> Result<(), BusError> {
        let base = device.base();
        if self.devices.iter().any(|d| d.base() == base) {
            return Err(BusError::DuplicateBase(base));
        }

        let slot = self
            .devices
            .iter()
            .position(|d| d.base() < base)
            .unwrap_or(self.devices.len());
        self.devices.insert(slot, device);
        Ok(())
    }

    /// Find the device that owns `address`, if any.
    pub fn route(&self, address: u16) -> Option<&dyn Device> {
        self.devices
            .iter()
            .find(|d| d.base() <= address)
            .map(|d| &**d)
    }

    fn route_mut(&mut self, address: u16) -> Option<&mut Box<dyn Device>> {
        self.devices.iter_mut().find(|d| d.base() <= address)
    }

    /// Read a byte from whichever device owns `address`.
    pub fn read(&self, address: u16) -> Result<u8, BusError> {
        self.route(address)
            .ok_or(BusError::UnmappedAddress(address))?
            .read(address)
    }

    /// Write a byte to whichever device owns `address`.
    pub fn write(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        self.route_mut(address)
            .ok_or(BusError::UnmappedAddress(address))?
            .write(address, value)
    }

    /// Look up the first attached device of type `T`.
    pub fn device<T: Device>(&self) -> Option<&T> {
        self.devices
            .iter()
            .find_map(|d| d.as_any().downcast_ref::<T>())
    }

    /// Mutable variant of [`Bus::device`].
    pub fn device_mut<T: Device>(&mut self) -> Option<&mut T> {
        self.devices
            .iter_mut()
            .find_map(|d| d.as_any_mut().downcast_mut::<T>())
    }

    /// Iterate over attached devices in routing order.
    pub fn devices(&self) -> impl Iterator<Item = &dyn Device> {
        self.devices.iter().map(|d| &**d)
    }

    /// Number of attached devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if no device is attached.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map: Vec<_> = self
            .devices
            .iter()
            .map(|d| format!("{}@{:#06x}", d.name(), d.base()))
            .collect();

        f.debug_struct("Bus").field("devices", &map).finish()
    }
}

/// Errors raised while routing or servicing a bus access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("no device mapped at address {0:#06x}")]
    UnmappedAddress(u16),

    #[error("{device} is write-only (read at {address:#06x})")]
    WriteOnly { device: &'static str, address: u16 },

    #[error("address {address:#06x} is outside the loaded {device} image")]
    OutOfBounds { device: &'static str, address: u16 },

    #[error("a device is already mapped at base {0:#06x}")]
    DuplicateBase(u16),
}
