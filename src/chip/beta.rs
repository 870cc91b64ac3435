/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! An emulator of the Dragon Beta chipset: the task register MMU, three MC6821 PIAs and
//! the glue between the main CPU and the DMA-assist CPU.
mod dual_cpu;
mod io;

use core::fmt;

use bitflags::bitflags;
use log::debug;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::bus::{BusDevice, NullDevice};
use crate::chip::{
    BetaFdcCtrlFlags, BetaKbdFlags, BetaPiaTaskFlags, BetaTaskFlags,
    CpuId, CpuLine, CpuLines, CpuLineFlags, EdgeDetector, InterruptRecalc, LineRoute,
    MemoryAccess, Scheduler, bitflags_masks
};
use crate::memory::{BetaMemory, BetaRamSize, MemoryMapper, Result};
use crate::peripherals::{BetaKeyMatrix, KeyboardInterface, pia::Pia6821};

pub use dual_cpu::*;

bitflags! {
    /// The interrupt sources of the Dragon Beta routed to the lines of both CPUs.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u16", into = "u16"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct BetaIrqFlags: u16 {
        const PIA0_A   = 0b0_0000_0001;
        const PIA0_B   = 0b0_0000_0010;
        const PIA1_A   = 0b0_0000_0100;
        const PIA1_B   = 0b0_0000_1000;
        const PIA2_A   = 0b0_0001_0000;
        const PIA2_B   = 0b0_0010_0000;
        const BUS      = 0b0_0100_0000;
        const FDC_DRQ  = 0b0_1000_0000;
        /// PIA2 PA7 driven low.
        const NMI_CTRL = 0b1_0000_0000;
    }
}

bitflags_masks!(BetaIrqFlags {
    /// Sources of the main CPU **IRQ** line.
    pub const MAIN_IRQ_MASK = PIA0_A|PIA0_B|BUS;
    /// Sources of the main CPU **FIRQ** line.
    pub const MAIN_FIRQ_MASK = PIA1_A|PIA1_B;
    /// Sources of the DMA CPU **FIRQ** line.
    pub const DMA_FIRQ_MASK = PIA2_A|PIA2_B;
    /// Sources of the DMA CPU **NMI** line.
    pub const DMA_NMI_MASK = FDC_DRQ|NMI_CTRL;
});

/// The Dragon Beta interrupt routing table.
pub const BETA_ROUTING: [LineRoute<BetaIrqFlags>; 4] = [
    LineRoute { cpu: CpuId::Main, line: CpuLine::Irq, sources: BetaIrqFlags::MAIN_IRQ_MASK },
    LineRoute { cpu: CpuId::Main, line: CpuLine::Firq, sources: BetaIrqFlags::MAIN_FIRQ_MASK },
    LineRoute { cpu: CpuId::Dma, line: CpuLine::Firq, sources: BetaIrqFlags::DMA_FIRQ_MASK },
    LineRoute { cpu: CpuId::Dma, line: CpuLine::Nmi, sources: BetaIrqFlags::DMA_NMI_MASK },
];

/// The number of the 6845 CRTC registers.
pub const CRTC_REGISTERS: usize = 32;
/// The keyboard shift register with no row selected.
pub const KEYBOARD_SHIFT_IDLE: u16 = 0x3FF;
/// PIA2 port A pin levels after reset (pull-ups).
const TASK_PORT_RESET: u8 = 0xFF;

/// The run-time configuration of [DragonBeta].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetaConfig {
    pub ram_size: BetaRamSize,
    /// Ignore the first **NMI** requested by the floppy controller's **DRQ** after a reset.
    ///
    /// The boot ROM relies on it.
    pub ignore_first_drq_nmi: bool
}

/// The Dragon Beta chipset.
///
/// Owns the memory mapper shared by both CPUs, three PIAs, the keyboard shift register and
/// matrix, the 6845 CRTC register file, the dual-CPU coordinator and the interrupt
/// recalculator. The floppy disk controller and other expansion devices are provided as the
/// daisy chain `D` consulted for any address of the `0xFC00-0xFEFF` window not decoded here.
///
/// The host reports the floppy controller's **DRQ** and **INTRQ** outputs with
/// [DragonBeta::set_fdc_drq] and [DragonBeta::set_fdc_intrq].
#[derive(Clone)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct DragonBeta<D = NullDevice> {
    memory: BetaMemory,
    pia0: Pia6821,
    pia1: Pia6821,
    pia2: Pia6821,
    keyboard: BetaKeyMatrix,
    kbd_shift: u16,
    kbd_clock: EdgeDetector<bool>,
    crtc_index: u8,
    crtc: [u8; CRTC_REGISTERS],
    task_port: EdgeDetector<u8>,
    cpus: DualCpu,
    fdc_drq: bool,
    drq_nmi_guard: bool,
    ignore_first_drq_nmi: bool,
    irq: InterruptRecalc<BetaIrqFlags>,
    bus: D
}

impl From<u16> for BetaIrqFlags {
    fn from(bits: u16) -> Self {
        BetaIrqFlags::from_bits_retain(bits)
    }
}

impl From<BetaIrqFlags> for u16 {
    fn from(flags: BetaIrqFlags) -> u16 {
        flags.bits()
    }
}

impl Default for BetaConfig {
    fn default() -> Self {
        BetaConfig {
            ram_size: BetaRamSize::default(),
            ignore_first_drq_nmi: true
        }
    }
}

impl<D: Default> Default for DragonBeta<D> {
    fn default() -> Self {
        DragonBeta::with_bus(BetaMemory::default(), D::default())
    }
}

impl<D: BusDevice> fmt::Debug for DragonBeta<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragonBeta")
            .field("memory", &self.memory)
            .field("pia0", &self.pia0)
            .field("pia1", &self.pia1)
            .field("pia2", &self.pia2)
            .field("kbd_shift", &self.kbd_shift)
            .field("crtc_index", &self.crtc_index)
            .field("cpus", &self.cpus)
            .field("fdc_drq", &self.fdc_drq)
            .field("irq", &self.irq)
            .field("bus", &self.bus)
            .finish()
    }
}

impl<D: Default> DragonBeta<D> {
    /// Creates a new machine from the 16K boot ROM image and the default bus device chain.
    pub fn new(config: BetaConfig, rom: &[u8]) -> Result<Self> {
        let memory = BetaMemory::new(config.ram_size, rom)?;
        let mut beta = DragonBeta::with_bus(memory, D::default());
        beta.ignore_first_drq_nmi = config.ignore_first_drq_nmi;
        beta.drq_nmi_guard = config.ignore_first_drq_nmi;
        Ok(beta)
    }
}

impl<D> DragonBeta<D> {
    /// Creates a new machine from the given memory and the bus device chain.
    ///
    /// The first floppy **DRQ** after a reset is ignored, see [BetaConfig].
    pub fn with_bus(memory: BetaMemory, bus: D) -> Self {
        let mut beta = DragonBeta {
            memory,
            pia0: Pia6821::default(),
            pia1: Pia6821::default(),
            pia2: Pia6821::default(),
            keyboard: BetaKeyMatrix::default(),
            kbd_shift: KEYBOARD_SHIFT_IDLE,
            kbd_clock: EdgeDetector::default(),
            crtc_index: 0,
            crtc: [0; CRTC_REGISTERS],
            task_port: EdgeDetector::new(TASK_PORT_RESET),
            cpus: DualCpu::default(),
            fdc_drq: false,
            drq_nmi_guard: true,
            ignore_first_drq_nmi: true,
            irq: InterruptRecalc::new(),
            bus
        };
        beta.update_keyboard_lines();
        beta
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
    pub fn pia2(&self) -> &Pia6821 {
        &self.pia2
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
    pub fn irq_sources(&self) -> BetaIrqFlags {
        self.irq.sources()
    }
    /// Returns the levels last driven to the interrupt lines of `cpu`.
    #[inline]
    pub fn line_state(&self, cpu: CpuId) -> CpuLineFlags {
        self.irq.line_state(cpu)
    }
    /// Returns the run state of both CPUs.
    #[inline]
    pub fn run_state(&self) -> CpuRunState {
        self.cpus.state()
    }

    #[inline]
    pub fn dual_cpu(&self) -> &DualCpu {
        &self.cpus
    }
    /// Returns the floppy drive control lines on PIA1 port A.
    #[inline]
    pub fn fdc_control(&self) -> BetaFdcCtrlFlags {
        BetaFdcCtrlFlags::from(self.pia1.port_a_output())
    }
    /// Returns the task row addressed by page registers at `0xFE00-0xFE0F`.
    #[inline]
    pub fn pia_task(&self) -> usize {
        BetaPiaTaskFlags::from(self.pia2.port_b_output()).pia_task()
    }
    /// Returns the contents of the keyboard shift register. Zero bits select rows.
    #[inline]
    pub fn keyboard_shift(&self) -> u16 {
        self.kbd_shift
    }

    #[inline]
    pub fn crtc_index(&self) -> u8 {
        self.crtc_index
    }

    pub fn crtc_reg(&self, index: usize) -> u8 {
        self.crtc.get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn ignores_first_drq_nmi(&self) -> bool {
        self.ignore_first_drq_nmi
    }
    /// Enables or disables ignoring the first floppy **DRQ** after the next reset.
    pub fn set_ignore_first_drq_nmi(&mut self, ignore: bool) {
        self.ignore_first_drq_nmi = ignore;
    }
    /// Reports the level of the floppy controller's **DRQ** output, feeding the DMA CPU **NMI**.
    pub fn set_fdc_drq<L: CpuLines + ?Sized>(&mut self, level: bool, host: &mut L) {
        let rising = level && !self.fdc_drq;
        self.fdc_drq = level;
        if rising && self.drq_nmi_guard {
            self.drq_nmi_guard = false;
            debug!("first DRQ after reset ignored");
            return
        }
        if self.irq.set_source(BetaIrqFlags::FDC_DRQ, level) {
            self.irq.recalc(&BETA_ROUTING, host);
        }
    }
    /// Reports the level of the floppy controller's **INTRQ** output, connected to PIA2 CA1.
    pub fn set_fdc_intrq<L: CpuLines + ?Sized>(&mut self, level: bool, host: &mut L) {
        self.pia2.set_ca1(level);
        self.update_interrupts(host);
    }
    /// Re-reads the keyboard matrix with the current shift register contents.
    /// Should be called after changing the key state.
    pub fn update_keyboard<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        self.update_keyboard_lines();
        self.update_interrupts(host);
    }

    fn update_keyboard_lines(&mut self) {
        let flags = BetaKbdFlags::from(self.pia0.port_b_output());
        let rising = self.kbd_clock.rising(flags.clock());
        if flags.is_clear() {
            self.kbd_shift = KEYBOARD_SHIFT_IDLE;
        }
        else if rising {
            self.kbd_shift = (self.kbd_shift << 1 | u16::from(flags.data())) & KEYBOARD_SHIFT_IDLE;
        }
        self.pia0.set_port_a_input(self.keyboard.scan(self.kbd_shift));
    }

    fn update_dma_halt<S: Scheduler + ?Sized>(&mut self, host: &mut S) {
        let halted = self.fdc_control().is_dma_halted();
        self.cpus.set_halt(CpuId::Dma, halted, host);
    }

    fn update_task_port<S: Scheduler + ?Sized>(&mut self, host: &mut S) {
        let port_a = self.pia2.port_a_output();
        if self.task_port.update(port_a).is_some() {
            let flags = BetaTaskFlags::from(port_a);
            self.map_task_port(flags);
            self.irq.set_source(BetaIrqFlags::NMI_CTRL, !flags.dma_nmi_level());
        }
        let halted = BetaPiaTaskFlags::from(self.pia2.port_b_output()).is_main_halted();
        self.cpus.set_halt(CpuId::Main, halted, host);
    }

    fn map_task_port(&mut self, flags: BetaTaskFlags) {
        if flags.task() != self.memory.selected_task() {
            self.memory.set_task(flags.task());
        }
        if flags.is_map_enabled() != self.memory.is_paging_enabled() {
            self.memory.set_paging_enabled(flags.is_map_enabled());
        }
    }

    fn update_interrupts<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        let irq = &mut self.irq;
        irq.set_source(BetaIrqFlags::PIA0_A, self.pia0.irq_a());
        irq.set_source(BetaIrqFlags::PIA0_B, self.pia0.irq_b());
        irq.set_source(BetaIrqFlags::PIA1_A, self.pia1.irq_a());
        irq.set_source(BetaIrqFlags::PIA1_B, self.pia1.irq_b());
        irq.set_source(BetaIrqFlags::PIA2_A, self.pia2.irq_a());
        irq.set_source(BetaIrqFlags::PIA2_B, self.pia2.irq_b());
        irq.recalc(&BETA_ROUTING, host);
    }

    fn write_crtc(&mut self, offset: u16, data: u8) {
        if offset & 1 == 0 {
            self.crtc_index = data & (CRTC_REGISTERS as u8 - 1);
        }
        else if let Some(reg) = self.crtc.get_mut(usize::from(self.crtc_index)) {
            *reg = data;
        }
    }

    fn read_crtc(&self, offset: u16) -> u8 {
        if offset & 1 == 0 {
            self.crtc_index
        }
        else {
            self.crtc_reg(self.crtc_index.into())
        }
    }
}

impl<D: BusDevice> DragonBeta<D> {
    /// Samples the interrupt output of the expansion bus devices, routed to the main CPU **IRQ**.
    pub fn update_bus_irq<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        let active = self.bus.irq();
        self.irq.set_source(BetaIrqFlags::BUS, active);
        self.update_interrupts(host);
    }

    fn reset_chipset<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        debug!("dragon beta reset");
        self.memory.reset();
        self.pia0.reset();
        self.pia1.reset();
        self.pia2.reset();
        self.kbd_shift = KEYBOARD_SHIFT_IDLE;
        self.kbd_clock.reset(false);
        self.crtc_index = 0;
        self.crtc = [0; CRTC_REGISTERS];
        let port_a = self.pia2.port_a_output();
        self.task_port.reset(port_a);
        self.map_task_port(BetaTaskFlags::from(port_a));
        self.fdc_drq = false;
        self.drq_nmi_guard = self.ignore_first_drq_nmi;
        self.bus.reset();
        self.irq.reset(host);
        self.cpus.reset(host);
        self.update_keyboard_lines();
        self.update_bus_irq(host);
    }
}

impl<D> MemoryAccess for DragonBeta<D> {
    type Memory = BetaMemory;

    #[inline(always)]
    fn memory_ref(&self) -> &Self::Memory {
        &self.memory
    }

    #[inline(always)]
    fn memory_mut(&mut self) -> &mut Self::Memory {
        &mut self.memory
    }
}

impl<D> KeyboardInterface for DragonBeta<D> {
    type KeyMatrix = BetaKeyMatrix;

    #[inline(always)]
    fn get_key_state(&self) -> BetaKeyMatrix {
        self.keyboard
    }

    #[inline(always)]
    fn set_key_state(&mut self, keymap: BetaKeyMatrix) {
        self.keyboard = keymap;
    }
}
