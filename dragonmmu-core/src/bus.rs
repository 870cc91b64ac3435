/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! System bus device emulators attached to the expansion I/O window of a chipset.
use core::fmt::{self, Debug};
use core::ops::{Deref, DerefMut};

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

/// An interface for emulating devices that communicate with the emulated `CPU` via memory mapped
/// I/O requests which were not claimed by the chipset itself.
///
/// This trait allows attaching many, different devices to form a so-called "daisy chain".
pub trait BusDevice: Debug {
    /// A type of the next device in a daisy chain.
    type NextDevice: BusDevice;

    /// Returns a mutable reference to the next device.
    fn next_device_mut(&mut self) -> &mut Self::NextDevice;
    /// Returns a reference to the next device.
    fn next_device_ref(&self) -> &Self::NextDevice;
    /// Destructs self and returns the instance of the next bus device.
    fn into_next_device(self) -> Self::NextDevice;
    /// Resets the device and all devices in this chain.
    ///
    /// **NOTE**: Implementations should always forward this call down the chain after optionally applying it
    /// to `self`.
    #[inline(always)]
    fn reset(&mut self) {
        self.next_device_mut().reset()
    }
    /// Called by the chipset during a read cycle of an unclaimed I/O address.
    ///
    /// Returns `None` if no device in the chain responds to `address`.
    #[inline(always)]
    fn read_io(&mut self, address: u16) -> Option<u8> {
        self.next_device_mut().read_io(address)
    }
    /// Called by the chipset during a write cycle of an unclaimed I/O address.
    ///
    /// Returns `true` if a device has claimed the write.
    #[inline(always)]
    fn write_io(&mut self, address: u16, data: u8) -> bool {
        self.next_device_mut().write_io(address, data)
    }
    /// Returns the level of the wired-OR interrupt request line of the chain.
    ///
    /// Implementations should OR their own request with the forwarded result.
    #[inline(always)]
    fn irq(&self) -> bool {
        self.next_device_ref().irq()
    }
}

impl<D: BusDevice> BusDevice for Box<D> {
    type NextDevice = D::NextDevice;

    #[inline(always)]
    fn next_device_mut(&mut self) -> &mut Self::NextDevice {
        (**self).next_device_mut()
    }
    #[inline(always)]
    fn next_device_ref(&self) -> &Self::NextDevice {
        (**self).next_device_ref()
    }
    #[inline]
    fn into_next_device(self) -> Self::NextDevice {
        (*self).into_next_device()
    }
    #[inline]
    fn reset(&mut self) {
        (**self).reset()
    }
    #[inline]
    fn read_io(&mut self, address: u16) -> Option<u8> {
        (**self).read_io(address)
    }
    #[inline]
    fn write_io(&mut self, address: u16, data: u8) -> bool {
        (**self).write_io(address, data)
    }
    #[inline]
    fn irq(&self) -> bool {
        (**self).irq()
    }
}

/// A helper trait for matching I/O addresses.
pub trait IoAddress: Debug {
    /// Relevant address bits should be set to 1.
    const ADDRESS_MASK: u16;
    /// Bits from this constant will be matching only if `ADDRESS_MASK` constains 1 for bits in the same positions.
    const ADDRESS_BITS: u16;
    /// Returns `true` if a provided `address` masked with `ADDRESS_MASK` matches `ADDRESS_BITS`.
    #[inline]
    fn match_address(address: u16) -> bool {
        address & Self::ADDRESS_MASK == Self::ADDRESS_BITS & Self::ADDRESS_MASK
    }
    /// Returns the register offset of a matching `address`.
    #[inline]
    fn register_offset(address: u16) -> u16 {
        address & !Self::ADDRESS_MASK
    }
}

/// A daisy-chain terminator device. Use it as the last device in a chain.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct NullDevice;

impl BusDevice for NullDevice {
    type NextDevice = Self;

    #[inline(always)]
    fn next_device_mut(&mut self) -> &mut Self::NextDevice {
        self
    }
    #[inline(always)]
    fn next_device_ref(&self) -> &Self::NextDevice {
        self
    }
    #[inline(always)]
    fn into_next_device(self) -> Self::NextDevice {
        self
    }
    #[inline(always)]
    fn reset(&mut self) {}

    #[inline(always)]
    fn read_io(&mut self, _address: u16) -> Option<u8> {
        None
    }

    #[inline(always)]
    fn write_io(&mut self, _address: u16, _data: u8) -> bool {
        false
    }

    #[inline(always)]
    fn irq(&self) -> bool {
        false
    }
}

impl fmt::Debug for NullDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullDevice").finish()
    }
}

/// A pseudo [BusDevice] allowing for plugging in and out a device at run time.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct OptionalBusDevice<D, N> {
    /// The device that can be "plugged in".
    #[cfg_attr(feature = "snapshot", serde(default))]
    pub device: Option<D>,
    /// The next device in the daisy chain.
    #[cfg_attr(feature = "snapshot", serde(default))]
    pub next_device: N
}

impl<D, N> OptionalBusDevice<D, N>
    where D: BusDevice, N: BusDevice
{
    pub fn new(device: Option<D>, next_device: N) -> Self {
        OptionalBusDevice { device, next_device }
    }
}

impl<D, N> Deref for OptionalBusDevice<D, N> {
    type Target = Option<D>;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl<D, N> DerefMut for OptionalBusDevice<D, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.device
    }
}

impl<D, N> BusDevice for OptionalBusDevice<D, N>
    where D: BusDevice, N: BusDevice
{
    type NextDevice = N;

    #[inline]
    fn next_device_mut(&mut self) -> &mut Self::NextDevice {
        &mut self.next_device
    }
    #[inline]
    fn next_device_ref(&self) -> &Self::NextDevice {
        &self.next_device
    }
    #[inline]
    fn into_next_device(self) -> Self::NextDevice {
        self.next_device
    }
    #[inline]
    fn reset(&mut self) {
        if let Some(device) = &mut self.device {
            device.reset();
        }
        self.next_device.reset();
    }
    /// A plugged in device takes precedence over the rest of the chain.
    #[inline]
    fn read_io(&mut self, address: u16) -> Option<u8> {
        if let Some(data) = self.device.as_mut().and_then(|dev| dev.read_io(address)) {
            return Some(data)
        }
        self.next_device.read_io(address)
    }
    #[inline]
    fn write_io(&mut self, address: u16, data: u8) -> bool {
        if let Some(device) = &mut self.device {
            if device.write_io(address, data) {
                return true
            }
        }
        self.next_device.write_io(address, data)
    }
    #[inline]
    fn irq(&self) -> bool {
        self.device.as_ref().map_or(false, |dev| dev.irq()) || self.next_device.irq()
    }
}
