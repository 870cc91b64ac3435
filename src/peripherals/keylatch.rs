/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! A queued keyboard data latch attached to the expansion bus.
use core::fmt;
use core::marker::PhantomData;

use arrayvec::ArrayVec;
use log::warn;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::bus::{BusDevice, IoAddress, NullDevice};

/// The depth of the key queue.
pub const KEY_QUEUE_DEPTH: usize = 16;
/// The value read from the data register with an empty queue.
pub const KEY_IDLE: u8 = 0x00;
/// The status register bit indicating a pending key.
pub const KEY_PENDING: u8 = 0b0000_0001;

pub type Coco3KeyLatch<D = NullDevice> = KeyLatch<Coco3KeyLatchAddress, D>;
pub type BetaKeyLatch<D = NullDevice> = KeyLatch<BetaKeyLatchAddress, D>;

/// The key latch decoded in the CoCo 3 cartridge area at `0xFF50-0xFF51`.
#[derive(Clone, Copy, Default, Debug)]
pub struct Coco3KeyLatchAddress;
impl IoAddress for Coco3KeyLatchAddress {
    const ADDRESS_MASK: u16 = 0b1111_1111_1111_1110;
    const ADDRESS_BITS: u16 = 0xFF50;
}

/// The key latch decoded in the Dragon Beta expansion area at `0xFC60-0xFC61`.
#[derive(Clone, Copy, Default, Debug)]
pub struct BetaKeyLatchAddress;
impl IoAddress for BetaKeyLatchAddress {
    const ADDRESS_MASK: u16 = 0b1111_1111_1111_1110;
    const ADDRESS_BITS: u16 = 0xFC60;
}

/// A keyboard latch with a queue of key codes pushed by the host.
///
/// * Offset 0: reading pops the next key code and clears the interrupt request once
///   the queue is empty. An empty queue reads as [KEY_IDLE].
/// * Offset 1: status, bit 0 ([KEY_PENDING]) is set while keys are queued.
///
/// Writes to either register are claimed and ignored.
#[derive(Clone, Default)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct KeyLatch<P, D = NullDevice> {
    queue: ArrayVec<u8, KEY_QUEUE_DEPTH>,
    #[cfg_attr(feature = "snapshot", serde(skip))]
    bus: D,
    #[cfg_attr(feature = "snapshot", serde(skip))]
    _address: PhantomData<P>
}

impl<P, D: fmt::Debug> fmt::Debug for KeyLatch<P, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLatch")
            .field("queue", &self.queue)
            .field("bus", &self.bus)
            .finish()
    }
}

impl<P, D> KeyLatch<P, D> {
    /// Creates a new latch followed by the `bus` device.
    pub fn new(bus: D) -> Self {
        KeyLatch { queue: ArrayVec::new(), bus, _address: PhantomData }
    }
    /// Queues a key code. Returns `false` if the queue is full and the key was dropped.
    pub fn push_key(&mut self, code: u8) -> bool {
        match self.queue.try_push(code) {
            Ok(()) => true,
            Err(_) => {
                warn!("key latch overflow: key {:02x} dropped", code);
                false
            }
        }
    }
    /// Returns `true` if any key is waiting to be read.
    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    #[inline]
    pub fn pending_keys(&self) -> &[u8] {
        &self.queue
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    fn read_data(&mut self) -> u8 {
        self.queue.pop_at(0).unwrap_or(KEY_IDLE)
    }

    fn read_status(&self) -> u8 {
        if self.is_pending() { KEY_PENDING } else { 0 }
    }
}

impl<P, D> BusDevice for KeyLatch<P, D>
    where P: IoAddress,
          D: BusDevice
{
    type NextDevice = D;

    #[inline]
    fn next_device_mut(&mut self) -> &mut Self::NextDevice {
        &mut self.bus
    }

    #[inline]
    fn next_device_ref(&self) -> &Self::NextDevice {
        &self.bus
    }

    #[inline]
    fn into_next_device(self) -> Self::NextDevice {
        self.bus
    }

    #[inline]
    fn reset(&mut self) {
        self.queue.clear();
        self.bus.reset();
    }

    #[inline]
    fn read_io(&mut self, address: u16) -> Option<u8> {
        if P::match_address(address) {
            return Some(match P::register_offset(address) {
                0 => self.read_data(),
                _ => self.read_status()
            })
        }
        self.bus.read_io(address)
    }

    #[inline]
    fn write_io(&mut self, address: u16, data: u8) -> bool {
        if P::match_address(address) {
            return true
        }
        self.bus.write_io(address, data)
    }

    #[inline]
    fn irq(&self) -> bool {
        self.is_pending() || self.bus.irq()
    }
}
