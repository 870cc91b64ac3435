/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
use core::ops::RangeInclusive;

use log::debug;

use crate::bus::BusDevice;
use crate::chip::{BusAccess, CpuId, Scheduler};
use crate::memory::{MemoryMapper, OPEN_BUS};
use super::DragonBeta;

/// The I/O window, never routed to memory.
const IO_WINDOW: RangeInclusive<u16> = 0xFC00..=0xFEFF;

impl<D: BusDevice> BusAccess for DragonBeta<D> {
    #[inline]
    fn read_byte<S: Scheduler>(&mut self, _cpu: CpuId, address: u16, host: &mut S) -> u8 {
        if IO_WINDOW.contains(&address) {
            self.read_io(address, host)
        }
        else {
            self.memory.read(address)
        }
    }

    #[inline]
    fn write_byte<S: Scheduler>(&mut self, _cpu: CpuId, address: u16, data: u8, host: &mut S) {
        if IO_WINDOW.contains(&address) {
            self.write_io(address, data, host)
        }
        else {
            self.memory.write(address, data);
        }
    }

    fn peek(&self, address: u16) -> u8 {
        match address {
            0xFC00..=0xFC1F => self.pia0.peek(address),
            0xFC20..=0xFC3F => self.pia1.peek(address),
            0xFC80..=0xFC81 => self.read_crtc(address),
            0xFCC0..=0xFCDF => self.pia2.peek(address),
            0xFE00..=0xFE0F => self.page_register(address),
            0xFC00..=0xFEFF => OPEN_BUS,
            _ => self.memory.read(address)
        }
    }

    fn reset<S: Scheduler>(&mut self, host: &mut S) {
        self.reset_chipset(host)
    }
}

impl<D: BusDevice> DragonBeta<D> {
    fn read_io<S: Scheduler>(&mut self, address: u16, host: &mut S) -> u8 {
        match address {
            0xFC00..=0xFC1F => {
                let data = self.pia0.read(address);
                self.update_interrupts(host);
                data
            }
            0xFC20..=0xFC3F => {
                let data = self.pia1.read(address);
                self.update_interrupts(host);
                data
            }
            0xFC80..=0xFC81 => self.read_crtc(address),
            0xFCC0..=0xFCDF => {
                let data = self.pia2.read(address);
                self.update_interrupts(host);
                data
            }
            0xFE00..=0xFE0F => self.page_register(address),
            _ => {
                let data = self.bus.read_io(address).unwrap_or(OPEN_BUS);
                self.update_bus_irq(host);
                data
            }
        }
    }

    fn write_io<S: Scheduler>(&mut self, address: u16, data: u8, host: &mut S) {
        match address {
            0xFC00..=0xFC1F => {
                self.pia0.write(address, data);
                self.update_keyboard_lines();
                self.update_interrupts(host);
            }
            0xFC20..=0xFC3F => {
                self.pia1.write(address, data);
                self.update_dma_halt(host);
                self.update_interrupts(host);
            }
            0xFC80..=0xFC81 => self.write_crtc(address, data),
            0xFCC0..=0xFCDF => {
                self.pia2.write(address, data);
                self.update_task_port(host);
                self.update_interrupts(host);
            }
            0xFE00..=0xFE0F => {
                let task = self.pia_task();
                self.memory.configure(task, usize::from(address & 0xF), data);
            }
            _ => {
                if !self.bus.write_io(address, data) {
                    debug!("unclaimed i/o write: {:04x} <- {:02x}", address, data);
                }
                self.update_bus_irq(host);
            }
        }
    }

    fn page_register(&self, address: u16) -> u8 {
        self.memory.page_entry(self.pia_task(), usize::from(address & 0xF)).unwrap_or(OPEN_BUS)
    }
}
