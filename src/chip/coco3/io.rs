/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
use log::{debug, warn};

use crate::bus::BusDevice;
use crate::chip::{BusAccess, CpuId, CpuLines, Scheduler};
use crate::memory::{MemoryMapper, OPEN_BUS};
use super::Coco3;

/// The start of the I/O window.
const IO_BASE: u16 = 0xFF00;
/// Interrupt vectors are fetched through the routing of this region.
const VECTORS_BASE: u16 = 0xBFF0;

impl<D: BusDevice> BusAccess for Coco3<D> {
    #[inline]
    fn read_byte<S: Scheduler>(&mut self, _cpu: CpuId, address: u16, host: &mut S) -> u8 {
        if address < IO_BASE {
            self.memory.read(address)
        }
        else {
            self.read_io(address, host)
        }
    }

    #[inline]
    fn write_byte<S: Scheduler>(&mut self, _cpu: CpuId, address: u16, data: u8, host: &mut S) {
        if address < IO_BASE {
            self.memory.write(address, data);
        }
        else {
            self.write_io(address, data, host)
        }
    }

    fn peek(&self, address: u16) -> u8 {
        match address {
            0x0000..=0xFEFF => self.memory.read(address),
            0xFF00..=0xFF1F => self.pia0.peek(address),
            0xFF20..=0xFF3F => self.pia1.peek(address),
            0xFF90..=0xFF9F => self.gime.peek(address - 0xFF90).unwrap_or(OPEN_BUS),
            0xFFA0..=0xFFAF => self.mmu_register(address),
            0xFFB0..=0xFFBF => self.gime.palette(usize::from(address & 0xF)),
            0xFFF0..=0xFFFF => self.memory.read(VECTORS_BASE | (address & 0xF)),
            _ => OPEN_BUS
        }
    }

    fn reset<S: Scheduler>(&mut self, host: &mut S) {
        self.reset_chipset(host)
    }
}

impl<D: BusDevice> Coco3<D> {
    fn read_io<L: CpuLines + ?Sized>(&mut self, address: u16, host: &mut L) -> u8 {
        match address {
            0xFF00..=0xFF1F => {
                let data = self.pia0.read(address);
                self.update_interrupts(host);
                data
            }
            0xFF20..=0xFF3F => {
                let data = self.pia1.read(address);
                self.update_interrupts(host);
                data
            }
            0xFF40..=0xFF5F => {
                let data = self.bus.read_io(address).unwrap_or(OPEN_BUS);
                self.update_bus_irq(host);
                data
            }
            0xFF92 => {
                let data = self.gime.read_irq_status();
                self.update_interrupts(host);
                data
            }
            0xFF93 => {
                let data = self.gime.read_firq_status();
                self.update_interrupts(host);
                data
            }
            0xFF90..=0xFF9F => match self.gime.peek(address - 0xFF90) {
                Some(data) => data,
                None => self.unmapped_read(address)
            }
            0xFFA0..=0xFFAF => self.mmu_register(address),
            0xFFB0..=0xFFBF => self.gime.palette(usize::from(address & 0xF)),
            // SAM registers are write only
            0xFFC0..=0xFFDF => OPEN_BUS,
            0xFFF0..=0xFFFF => self.memory.read(VECTORS_BASE | (address & 0xF)),
            _ => self.unmapped_read(address)
        }
    }

    fn write_io<L: CpuLines + ?Sized>(&mut self, address: u16, data: u8, host: &mut L) {
        match address {
            0xFF00..=0xFF1F => {
                self.pia0.write(address, data);
                self.update_keyboard_lines();
                self.update_interrupts(host);
            }
            0xFF20..=0xFF3F => {
                self.pia1.write(address, data);
                self.update_interrupts(host);
            }
            0xFF40..=0xFF5F => {
                if !self.bus.write_io(address, data) {
                    debug!("unclaimed cartridge write: {:04x} <- {:02x}", address, data);
                }
                self.update_bus_irq(host);
            }
            0xFF90 => {
                self.write_init0(data);
                self.update_interrupts(host);
            }
            0xFF91 => self.write_init1(data),
            0xFF92 => {
                self.gime.set_irq_enable(data.into());
                self.update_interrupts(host);
            }
            0xFF93 => {
                self.gime.set_firq_enable(data.into());
                self.update_interrupts(host);
            }
            0xFF94 => self.gime.write_timer_msb(data),
            0xFF95 => self.gime.write_timer_lsb(data),
            0xFF98..=0xFF9F => self.gime.set_video_reg(usize::from(address & 7), data),
            0xFFA0..=0xFFAF => {
                let offset = usize::from(address & 0xF);
                self.memory.configure(offset >> 3, offset & 7, data);
            }
            0xFFB0..=0xFFBF => self.gime.set_palette(usize::from(address & 0xF), data),
            0xFFC0..=0xFFDF => self.write_sam(address - 0xFFC0),
            _ => warn!("unmapped i/o write: {:04x} <- {:02x}", address, data)
        }
    }

    fn mmu_register(&self, address: u16) -> u8 {
        let offset = usize::from(address & 0xF);
        self.memory.page_entry(offset >> 3, offset & 7).unwrap_or(OPEN_BUS)
    }

    fn unmapped_read(&self, address: u16) -> u8 {
        warn!("unmapped i/o read: {:04x}", address);
        OPEN_BUS
    }
}
