/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! An emulator of the Tandy Color Computer 3 chipset: GIME, SAM and two MC6821 PIAs.
mod gime;
mod io;
mod sam;

use core::fmt;

use bitflags::bitflags;
use log::debug;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::bus::{BusDevice, NullDevice};
use crate::chip::{
    CpuId, CpuLine, CpuLines, CpuLineFlags, GimeInit0Flags, GimeInit1Flags, GimeIntFlags,
    InterruptRecalc, LineRoute, MemoryAccess, bitflags_masks
};
use crate::memory::{GimeMemory, GimeRamSize, MemoryMapper, Result};
use crate::peripherals::{Coco3KeyMatrix, KeyboardInterface, pia::Pia6821};

pub use gime::*;
pub use sam::*;

bitflags! {
    /// The interrupt sources of the CoCo 3 routed to the CPU lines.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Coco3IrqFlags: u8 {
        const PIA0_A    = 0b0000_0001;
        const PIA0_B    = 0b0000_0010;
        const PIA1_A    = 0b0000_0100;
        const PIA1_B    = 0b0000_1000;
        const GIME_IRQ  = 0b0001_0000;
        const GIME_FIRQ = 0b0010_0000;
    }
}

bitflags_masks!(Coco3IrqFlags {
    /// Sources of the CPU **IRQ** line.
    pub const IRQ_MASK = PIA0_A|PIA0_B|GIME_IRQ;
    /// Sources of the CPU **FIRQ** line.
    pub const FIRQ_MASK = PIA1_A|PIA1_B|GIME_FIRQ;
});

/// The CoCo 3 interrupt routing table.
pub const COCO3_ROUTING: [LineRoute<Coco3IrqFlags>; 2] = [
    LineRoute { cpu: CpuId::Main, line: CpuLine::Irq, sources: Coco3IrqFlags::IRQ_MASK },
    LineRoute { cpu: CpuId::Main, line: CpuLine::Firq, sources: Coco3IrqFlags::FIRQ_MASK },
];

/// Sense lines of PIA0 port A connected to the keyboard.
const KEYBOARD_ROWS_MASK: u8 = 0x7F;

/// The run-time configuration of [Coco3].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coco3Config {
    pub ram_size: GimeRamSize
}

/// The Tandy Color Computer 3 chipset.
///
/// Owns the memory mapper, the GIME and SAM register files, both PIAs, the keyboard matrix
/// and the interrupt recalculator. Devices plugged into the cartridge area `0xFF40-0xFF5F`
/// are provided as the daisy chain `D`.
///
/// The CPU core accesses the machine through [BusAccess][crate::chip::BusAccess]. The host
/// drives the video timing with [Coco3::signal_hsync] and [Coco3::signal_vsync] and the GIME
/// timer with [Coco3::clock_timer].
#[derive(Clone)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct Coco3<D = NullDevice> {
    memory: GimeMemory,
    gime: Gime,
    sam: Sam,
    pia0: Pia6821,
    pia1: Pia6821,
    keyboard: Coco3KeyMatrix,
    irq: InterruptRecalc<Coco3IrqFlags>,
    bus: D
}

impl From<u8> for Coco3IrqFlags {
    fn from(bits: u8) -> Self {
        Coco3IrqFlags::from_bits_retain(bits)
    }
}

impl From<Coco3IrqFlags> for u8 {
    fn from(flags: Coco3IrqFlags) -> u8 {
        flags.bits()
    }
}

impl<D: Default> Default for Coco3<D> {
    fn default() -> Self {
        Coco3::with_bus(GimeMemory::default(), D::default())
    }
}

impl<D: BusDevice> fmt::Debug for Coco3<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coco3")
            .field("memory", &self.memory)
            .field("gime", &self.gime)
            .field("sam", &self.sam)
            .field("pia0", &self.pia0)
            .field("pia1", &self.pia1)
            .field("keyboard", &self.keyboard)
            .field("irq", &self.irq)
            .field("bus", &self.bus)
            .finish()
    }
}

impl<D: Default> Coco3<D> {
    /// Creates a new machine from the ROM images and the default bus device chain.
    ///
    /// See [GimeMemory::new] for the ROM image requirements.
    pub fn new(config: Coco3Config, internal_rom: &[u8], cartridge_rom: Option<&[u8]>) -> Result<Self> {
        let memory = GimeMemory::new(config.ram_size, internal_rom, cartridge_rom)?;
        Ok(Coco3::with_bus(memory, D::default()))
    }
}

impl<D> Coco3<D> {
    /// Creates a new machine from the given memory and the bus device chain.
    pub fn with_bus(memory: GimeMemory, bus: D) -> Self {
        let mut coco = Coco3 {
            memory,
            gime: Gime::default(),
            sam: Sam::default(),
            pia0: Pia6821::default(),
            pia1: Pia6821::default(),
            keyboard: Coco3KeyMatrix::default(),
            irq: InterruptRecalc::new(),
            bus
        };
        coco.update_keyboard_lines();
        coco
    }

    #[inline]
    pub fn gime(&self) -> &Gime {
        &self.gime
    }

    #[inline]
    pub fn sam(&self) -> &Sam {
        &self.sam
    }

    #[inline]
    pub fn pia0(&self) -> &Pia6821 {
        &self.pia0
    }

    #[inline]
    pub fn pia1(&self) -> &Pia6821 {
        &self.pia1
    }

    #[inline]
    pub fn bus_device_ref(&self) -> &D {
        &self.bus
    }

    #[inline]
    pub fn bus_device_mut(&mut self) -> &mut D {
        &mut self.bus
    }

    #[inline]
    pub fn into_bus_device(self) -> D {
        self.bus
    }
    /// Returns the currently active interrupt sources.
    #[inline]
    pub fn irq_sources(&self) -> Coco3IrqFlags {
        self.irq.sources()
    }
    /// Returns the levels last driven to the CPU lines.
    #[inline]
    pub fn line_state(&self) -> CpuLineFlags {
        self.irq.line_state(CpuId::Main)
    }
    /// Signals the horizontal sync: an active edge on PIA0 CA1 and the `HBORD` event.
    pub fn signal_hsync<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        self.pia0.pulse_ca1();
        self.gime.raise(GimeIntFlags::HBORD);
        self.update_interrupts(host);
    }
    /// Signals the vertical sync: an active edge on PIA0 CB1 and the `VBORD` event.
    pub fn signal_vsync<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        self.pia0.pulse_cb1();
        self.gime.raise(GimeIntFlags::VBORD);
        self.update_interrupts(host);
    }
    /// Counts the GIME timer down by `ticks` of the source selected by INIT1 bit 5.
    ///
    /// Returns `true` if the timer has expired.
    pub fn clock_timer<L: CpuLines + ?Sized>(&mut self, ticks: u32, host: &mut L) -> bool {
        let expired = self.gime.clock_timer(ticks);
        if expired {
            self.update_interrupts(host);
        }
        expired
    }
    /// Sets the level of the serial input interrupt source `EI2`.
    pub fn set_serial_irq<L: CpuLines + ?Sized>(&mut self, active: bool, host: &mut L) {
        self.gime.set_level(GimeIntFlags::SERIAL, active);
        self.update_interrupts(host);
    }
    /// Scans the keyboard matrix with the current column strobe and updates the keyboard
    /// interrupt source. Should be called after changing the key state.
    pub fn update_keyboard<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        self.update_keyboard_lines();
        self.update_interrupts(host);
    }

    fn update_keyboard_lines(&mut self) {
        let port_b = self.pia0.b();
        let strobe = port_b.output() | !port_b.ddr();
        let rows = self.keyboard.scan(0xFF00 | u16::from(strobe));
        self.pia0.set_port_a_input(rows);
        self.gime.set_level(GimeIntFlags::KEYBOARD, rows & KEYBOARD_ROWS_MASK != KEYBOARD_ROWS_MASK);
    }

    fn update_interrupts<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        let irq = &mut self.irq;
        irq.set_source(Coco3IrqFlags::PIA0_A, self.pia0.irq_a());
        irq.set_source(Coco3IrqFlags::PIA0_B, self.pia0.irq_b());
        irq.set_source(Coco3IrqFlags::PIA1_A, self.pia1.irq_a());
        irq.set_source(Coco3IrqFlags::PIA1_B, self.pia1.irq_b());
        irq.set_source(Coco3IrqFlags::GIME_IRQ, self.gime.irq_output());
        irq.set_source(Coco3IrqFlags::GIME_FIRQ, self.gime.firq_output());
        irq.recalc(&COCO3_ROUTING, host);
    }

    fn write_init0(&mut self, data: u8) {
        let flags = GimeInit0Flags::from(data);
        debug!("gime init0: {:?}", flags);
        self.gime.set_init0(flags);
        self.memory.set_mode(flags);
    }

    fn write_init1(&mut self, data: u8) {
        let flags = GimeInit1Flags::from(data);
        let task = flags.task();
        self.gime.set_init1(flags);
        if task != self.memory.selected_task() {
            self.memory.set_task(task);
        }
    }

    fn write_sam(&mut self, offset: u16) {
        if let Some(all_ram) = self.sam.write(offset) {
            self.memory.set_all_ram(all_ram);
        }
    }
}

impl<D: BusDevice> Coco3<D> {
    /// Samples the interrupt output of the cartridge area devices.
    ///
    /// The cartridge `CART` line is active low on PIA1 CB1 and also feeds the GIME `EI0` source.
    pub fn update_bus_irq<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        let active = self.bus.irq();
        self.pia1.set_cb1(!active);
        self.gime.set_level(GimeIntFlags::CART, active);
        self.update_interrupts(host);
    }

    fn reset_chipset<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        debug!("coco3 reset");
        self.memory.reset();
        self.gime.reset();
        self.sam.reset();
        self.pia0.reset();
        self.pia1.reset();
        self.bus.reset();
        self.irq.reset(host);
        self.update_keyboard_lines();
        self.update_bus_irq(host);
    }
}

impl<D> MemoryAccess for Coco3<D> {
    type Memory = GimeMemory;

    #[inline(always)]
    fn memory_ref(&self) -> &Self::Memory {
        &self.memory
    }

    #[inline(always)]
    fn memory_mut(&mut self) -> &mut Self::Memory {
        &mut self.memory
    }
}

impl<D> KeyboardInterface for Coco3<D> {
    type KeyMatrix = Coco3KeyMatrix;

    #[inline(always)]
    fn get_key_state(&self) -> Coco3KeyMatrix {
        self.keyboard
    }

    #[inline(always)]
    fn set_key_state(&mut self, keymap: Coco3KeyMatrix) {
        self.keyboard = keymap;
    }
}
