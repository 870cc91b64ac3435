/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::chip::{GimeInit0Flags, GimeInit1Flags, GimeIntFlags};

/// The 12-bit GIME timer mask.
pub const GIME_TIMER_MASK: u16 = 0x0FFF;
/// The GIME palette entries are 6-bit.
pub const GIME_PALETTE_MASK: u8 = 0x3F;

/// The GIME register file at `0xFF90-0xFF9F` and `0xFFB0-0xFFBF` with its interrupt latches
/// and the interval timer.
///
/// The MMU registers at `0xFFA0-0xFFAF` are owned by [GimeMemory][crate::memory::GimeMemory].
///
/// Each of the two interrupt outputs has its own pending latch. A source event is latched
/// in both and the output of each is the latch masked with its enable register, gated
/// by `IEN` or `FEN` of INIT0. Reading an enable register returns its masked latch and
/// acknowledges the edge sources. The level sources stay latched while active.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(default, rename_all = "camelCase"))]
pub struct Gime {
    init0: GimeInit0Flags,
    init1: GimeInit1Flags,
    irq_enable: GimeIntFlags,
    firq_enable: GimeIntFlags,
    irq_pending: GimeIntFlags,
    firq_pending: GimeIntFlags,
    timer_reload: u16,
    timer: u16,
    video: [u8; 8],
    palette: [u8; 16]
}

impl Gime {
    pub fn reset(&mut self) {
        let palette = self.palette;
        *self = Gime { palette, ..Gime::default() };
    }

    #[inline]
    pub fn init0(&self) -> GimeInit0Flags {
        self.init0
    }

    #[inline]
    pub fn init1(&self) -> GimeInit1Flags {
        self.init1
    }

    #[inline]
    pub fn set_init0(&mut self, flags: GimeInit0Flags) {
        self.init0 = flags;
    }

    #[inline]
    pub fn set_init1(&mut self, flags: GimeInit1Flags) {
        self.init1 = flags;
    }

    #[inline]
    pub fn irq_enable(&self) -> GimeIntFlags {
        self.irq_enable
    }

    #[inline]
    pub fn firq_enable(&self) -> GimeIntFlags {
        self.firq_enable
    }

    #[inline]
    pub fn set_irq_enable(&mut self, flags: GimeIntFlags) {
        self.irq_enable = flags & GimeIntFlags::SOURCE_MASK;
    }

    #[inline]
    pub fn set_firq_enable(&mut self, flags: GimeIntFlags) {
        self.firq_enable = flags & GimeIntFlags::SOURCE_MASK;
    }
    /// Returns the latched sources of the **IRQ** output regardless of the enable register.
    #[inline]
    pub fn irq_pending(&self) -> GimeIntFlags {
        self.irq_pending
    }
    /// Returns the latched sources of the **FIRQ** output regardless of the enable register.
    #[inline]
    pub fn firq_pending(&self) -> GimeIntFlags {
        self.firq_pending
    }
    /// Latches the edge triggered `sources` (`TMR`, `HBORD`, `VBORD`).
    #[inline]
    pub fn raise(&mut self, sources: GimeIntFlags) {
        let sources = sources & GimeIntFlags::EDGE_MASK;
        self.irq_pending |= sources;
        self.firq_pending |= sources;
    }
    /// Updates the level triggered `source` (`EI0`, `EI1`, `EI2`).
    #[inline]
    pub fn set_level(&mut self, source: GimeIntFlags, active: bool) {
        let source = source & GimeIntFlags::LEVEL_MASK;
        self.irq_pending.set(source, active);
        self.firq_pending.set(source, active);
    }

    #[inline]
    pub fn irq_output(&self) -> bool {
        self.init0.is_irq_enabled() && self.irq_pending.intersects(self.irq_enable)
    }

    #[inline]
    pub fn firq_output(&self) -> bool {
        self.init0.is_firq_enabled() && self.firq_pending.intersects(self.firq_enable)
    }
    /// Reads `IRQENR`: returns the enabled pending sources and acknowledges the edge sources.
    pub fn read_irq_status(&mut self) -> u8 {
        let status = self.irq_pending & self.irq_enable;
        self.irq_pending.remove(GimeIntFlags::EDGE_MASK);
        status.bits()
    }
    /// Reads `FIRQENR`: returns the enabled pending sources and acknowledges the edge sources.
    pub fn read_firq_status(&mut self) -> u8 {
        let status = self.firq_pending & self.firq_enable;
        self.firq_pending.remove(GimeIntFlags::EDGE_MASK);
        status.bits()
    }

    #[inline]
    pub fn timer_reload(&self) -> u16 {
        self.timer_reload
    }
    /// Returns the current value of the timer counter.
    #[inline]
    pub fn timer(&self) -> u16 {
        self.timer
    }
    /// Writes the most significant nibble of the timer and restarts the counter.
    pub fn write_timer_msb(&mut self, data: u8) {
        self.timer_reload = (self.timer_reload & 0x00FF) | (u16::from(data) << 8) & GIME_TIMER_MASK;
        self.timer = self.timer_reload;
    }
    /// Writes the least significant byte of the timer and restarts the counter.
    pub fn write_timer_lsb(&mut self, data: u8) {
        self.timer_reload = (self.timer_reload & 0x0F00) | u16::from(data);
        self.timer = self.timer_reload;
    }
    /// Counts the timer down by `ticks`, reloading it each time it reaches zero.
    ///
    /// Returns `true` if the timer has reached zero at least once and `TMR` has been latched.
    /// A zero reload value stops the timer.
    pub fn clock_timer(&mut self, ticks: u32) -> bool {
        let reload = u32::from(self.timer_reload);
        if reload == 0 || ticks == 0 {
            return false
        }
        let counter = u32::from(self.timer);
        if ticks < counter {
            self.timer = (counter - ticks) as u16;
            return false
        }
        let over = ticks - counter;
        self.timer = (reload - over % reload) as u16;
        self.raise(GimeIntFlags::TIMER);
        true
    }

    #[inline]
    pub fn video_reg(&self, index: usize) -> u8 {
        self.video.get(index).copied().unwrap_or(u8::MAX)
    }

    #[inline]
    pub fn set_video_reg(&mut self, index: usize, data: u8) {
        if let Some(reg) = self.video.get_mut(index) {
            *reg = data;
        }
    }

    #[inline]
    pub fn palette(&self, index: usize) -> u8 {
        self.palette.get(index).copied().unwrap_or(u8::MAX)
    }

    #[inline]
    pub fn set_palette(&mut self, index: usize, data: u8) {
        if let Some(entry) = self.palette.get_mut(index) {
            *entry = data & GIME_PALETTE_MASK;
        }
    }
    /// Returns the value of the register at `0xFF90 + offset` without side effects.
    ///
    /// Returns `None` for reserved registers.
    pub fn peek(&self, offset: u16) -> Option<u8> {
        Some(match offset & 0xF {
            0 => self.init0.bits(),
            1 => self.init1.bits(),
            2 => (self.irq_pending & self.irq_enable).bits(),
            3 => (self.firq_pending & self.firq_enable).bits(),
            4 => (self.timer_reload >> 8) as u8,
            5 => self.timer_reload as u8,
            6|7 => return None,
            n => self.video_reg(usize::from(n - 8))
        })
    }
}
