/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Chipset emulation building blocks.
//!
//! The CPU cores are not part of this library. Chipsets talk to them through the [CpuLines]
//! and [Scheduler] traits implemented by the host, while the CPU cores call back into
//! chipsets through [BusAccess].
use core::fmt;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::memory::MemoryMapper;

mod flags;
pub use flags::*;

/// Identifies one of the CPUs of a multi-processor machine.
///
/// Single CPU machines only ever use [CpuId::Main].
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CpuId {
    Main = 0,
    Dma = 1
}

/// An input line of a CPU.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuLine {
    Irq,
    Firq,
    Nmi,
    Halt
}

/// MC6809 interrupt and reset vector locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Vector {
    Swi3  = 0xFFF2,
    Swi2  = 0xFFF4,
    Firq  = 0xFFF6,
    Irq   = 0xFFF8,
    Swi   = 0xFFFA,
    Nmi   = 0xFFFC,
    Reset = 0xFFFE
}

/// A trait implemented by the host for driving CPU input lines.
pub trait CpuLines {
    /// Sets the level of the **IRQ** line of `cpu`.
    fn set_irq(&mut self, cpu: CpuId, asserted: bool);
    /// Sets the level of the **FIRQ** line of `cpu`.
    fn set_firq(&mut self, cpu: CpuId, asserted: bool);
    /// Delivers a single edge on the **NMI** line of `cpu`.
    fn pulse_nmi(&mut self, cpu: CpuId);
    /// Sets the level of the **HALT** line of `cpu`.
    fn set_halt(&mut self, cpu: CpuId, asserted: bool);
}

/// A trait implemented by the host scheduler interleaving execution of CPUs.
pub trait Scheduler: CpuLines {
    /// Ends the time slice of the currently executing CPU as soon as possible.
    fn yield_now(&mut self);
    /// Releases **HALT** of `cpu` and lets the scheduler switch to it immediately.
    fn resume(&mut self, cpu: CpuId) {
        self.set_halt(cpu, false);
        self.yield_now();
    }
}

/// A trait for directly accessing the memory mapper of an emulated chipset.
pub trait MemoryAccess {
    type Memory: MemoryMapper;
    /// Returns a reference to the memory.
    fn memory_ref(&self) -> &Self::Memory;
    /// Returns a mutable reference to the memory.
    fn memory_mut(&mut self) -> &mut Self::Memory;
}

/// A trait implemented by chipsets for the CPU cores to call back into.
///
/// All CPUs of a machine see the same address space, `cpu` identifies the originator of an access.
pub trait BusAccess {
    /// Reads a byte as seen by `cpu`, with all the side effects of reading I/O registers.
    fn read_byte<S: Scheduler>(&mut self, cpu: CpuId, address: u16, host: &mut S) -> u8;
    /// Writes a byte on behalf of `cpu`.
    fn write_byte<S: Scheduler>(&mut self, cpu: CpuId, address: u16, data: u8, host: &mut S);
    /// Reads a byte without side effects, e.g. for debuggers.
    fn peek(&self, address: u16) -> u8;
    /// Performs a system reset, driving the CPU lines to their power-on state.
    fn reset<S: Scheduler>(&mut self, host: &mut S);
    /// Fetches an interrupt vector on behalf of `cpu` acknowledging an interrupt.
    fn interrupt_vector<S: Scheduler>(&mut self, cpu: CpuId, vector: Vector, host: &mut S) -> u16 {
        let address = vector as u16;
        let hi = self.read_byte(cpu, address, host);
        let lo = self.read_byte(cpu, address.wrapping_add(1), host);
        u16::from_be_bytes([hi, lo])
    }
}

/// Remembers the last value of a signal and reports changes.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeDetector<T> {
    last: T
}

impl<T: Copy + PartialEq> EdgeDetector<T> {
    pub const fn new(initial: T) -> Self {
        EdgeDetector { last: initial }
    }

    #[inline]
    pub fn last(&self) -> T {
        self.last
    }
    /// Stores `value` and returns the previous one if it differs.
    #[inline]
    pub fn update(&mut self, value: T) -> Option<T> {
        if value != self.last {
            Some(core::mem::replace(&mut self.last, value))
        }
        else {
            None
        }
    }
    /// Stores `value` without reporting a change.
    #[inline]
    pub fn reset(&mut self, value: T) {
        self.last = value;
    }
}

impl EdgeDetector<bool> {
    /// Stores `value`, returns `true` on a `false` to `true` transition.
    #[inline]
    pub fn rising(&mut self, value: bool) -> bool {
        self.update(value) == Some(false)
    }
    /// Stores `value`, returns `true` on a `true` to `false` transition.
    #[inline]
    pub fn falling(&mut self, value: bool) -> bool {
        self.update(value) == Some(true)
    }
}

/// Connects a set of interrupt sources to a CPU input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRoute<S> {
    pub cpu: CpuId,
    pub line: CpuLine,
    pub sources: S
}

/// The interrupt recalculator.
///
/// Holds the interrupt source set of a machine and the last level driven to each CPU line.
/// Recalculating a line calls into [CpuLines] only when the computed level differs from the
/// last one, so recalculating any number of times without a source change is a no-op.
/// **NMI** is edge triggered: it is pulsed once on each inactive to active transition
/// of its sources.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptRecalc<S> {
    sources: S,
    lines: [CpuLineFlags; 2]
}

impl<S: bitflags::Flags + Copy> InterruptRecalc<S> {
    pub fn new() -> Self {
        InterruptRecalc { sources: S::empty(), lines: Default::default() }
    }
    /// Returns the currently active sources.
    #[inline]
    pub fn sources(&self) -> S {
        self.sources
    }
    /// Activates or deactivates `source`. Returns `true` if the source set has changed.
    #[inline]
    pub fn set_source(&mut self, source: S, active: bool) -> bool {
        let prev = self.sources.bits();
        self.sources.set(source, active);
        prev != self.sources.bits()
    }
    /// Returns the last levels driven to the lines of `cpu`.
    ///
    /// [CpuLineFlags::NMI] reflects the level of the sources routed to **NMI**.
    #[inline]
    pub fn line_state(&self, cpu: CpuId) -> CpuLineFlags {
        self.lines[cpu as usize]
    }
    /// Recomputes **IRQ** of `cpu` from `mask`. Returns the computed level.
    pub fn recalc_irq<L: CpuLines + ?Sized>(&mut self, cpu: CpuId, mask: S, host: &mut L) -> bool {
        let level = self.sources.intersects(mask);
        if self.update_line(cpu, CpuLineFlags::IRQ, level) {
            host.set_irq(cpu, level);
        }
        level
    }
    /// Recomputes **FIRQ** of `cpu` from `mask`. Returns the computed level.
    pub fn recalc_firq<L: CpuLines + ?Sized>(&mut self, cpu: CpuId, mask: S, host: &mut L) -> bool {
        let level = self.sources.intersects(mask);
        if self.update_line(cpu, CpuLineFlags::FIRQ, level) {
            host.set_firq(cpu, level);
        }
        level
    }
    /// Recomputes the **NMI** level of `cpu` from `mask` and pulses **NMI** on a rising edge.
    ///
    /// Returns `true` if the line was pulsed.
    pub fn recalc_nmi<L: CpuLines + ?Sized>(&mut self, cpu: CpuId, mask: S, host: &mut L) -> bool {
        let level = self.sources.intersects(mask);
        if self.update_line(cpu, CpuLineFlags::NMI, level) && level {
            host.pulse_nmi(cpu);
            return true
        }
        false
    }
    /// Recomputes every line in the `routing` table.
    pub fn recalc<L: CpuLines + ?Sized>(&mut self, routing: &[LineRoute<S>], host: &mut L) {
        for route in routing {
            match route.line {
                CpuLine::Irq  => { self.recalc_irq(route.cpu, route.sources, host); }
                CpuLine::Firq => { self.recalc_firq(route.cpu, route.sources, host); }
                CpuLine::Nmi  => { self.recalc_nmi(route.cpu, route.sources, host); }
                CpuLine::Halt => debug_assert!(false, "HALT is not an interrupt line")
            }
        }
    }
    /// Deactivates all sources and releases every asserted level line.
    pub fn reset<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        self.sources = S::empty();
        for cpu in [CpuId::Main, CpuId::Dma] {
            let state = core::mem::take(&mut self.lines[cpu as usize]);
            if state.intersects(CpuLineFlags::IRQ) {
                host.set_irq(cpu, false);
            }
            if state.intersects(CpuLineFlags::FIRQ) {
                host.set_firq(cpu, false);
            }
        }
    }

    fn update_line(&mut self, cpu: CpuId, line: CpuLineFlags, level: bool) -> bool {
        let state = &mut self.lines[cpu as usize];
        if state.intersects(line) != level {
            state.set(line, level);
            true
        }
        else {
            false
        }
    }
}

/// A single change of a CPU input line registered by [LineRecorder].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineEvent {
    pub cpu: CpuId,
    pub line: CpuLine,
    /// Always `true` for **NMI** pulses.
    pub asserted: bool
}

/// A host that records CPU line changes instead of driving real CPU cores.
///
/// Useful for testing chipsets and for hosts that poll line levels before each instruction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineRecorder {
    lines: [CpuLineFlags; 2],
    events: Vec<LineEvent>,
    yields: usize
}

impl LineRecorder {
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns the current levels of the lines of `cpu`. **NMI** is never latched.
    #[inline]
    pub fn lines(&self, cpu: CpuId) -> CpuLineFlags {
        self.lines[cpu as usize]
    }

    #[inline]
    pub fn is_halted(&self, cpu: CpuId) -> bool {
        self.lines(cpu).intersects(CpuLineFlags::HALT)
    }

    #[inline]
    pub fn events(&self) -> &[LineEvent] {
        &self.events
    }
    /// Returns recorded events and starts recording anew.
    pub fn take_events(&mut self) -> Vec<LineEvent> {
        core::mem::take(&mut self.events)
    }
    /// Returns the number of **NMI** pulses delivered to `cpu`.
    pub fn nmi_count(&self, cpu: CpuId) -> usize {
        self.events.iter().filter(|e| e.cpu == cpu && e.line == CpuLine::Nmi).count()
    }
    /// Returns the number of times a CPU was asked to yield.
    #[inline]
    pub fn yields(&self) -> usize {
        self.yields
    }

    fn record(&mut self, cpu: CpuId, line: CpuLine, asserted: bool) {
        let flag = match line {
            CpuLine::Irq => CpuLineFlags::IRQ,
            CpuLine::Firq => CpuLineFlags::FIRQ,
            CpuLine::Halt => CpuLineFlags::HALT,
            CpuLine::Nmi => CpuLineFlags::empty()
        };
        self.lines[cpu as usize].set(flag, asserted);
        self.events.push(LineEvent { cpu, line, asserted });
    }
}

impl CpuLines for LineRecorder {
    fn set_irq(&mut self, cpu: CpuId, asserted: bool) {
        self.record(cpu, CpuLine::Irq, asserted)
    }

    fn set_firq(&mut self, cpu: CpuId, asserted: bool) {
        self.record(cpu, CpuLine::Firq, asserted)
    }

    fn pulse_nmi(&mut self, cpu: CpuId) {
        self.record(cpu, CpuLine::Nmi, true)
    }

    fn set_halt(&mut self, cpu: CpuId, asserted: bool) {
        self.record(cpu, CpuLine::Halt, asserted)
    }
}

impl Scheduler for LineRecorder {
    fn yield_now(&mut self) {
        self.yields += 1;
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CpuId::Main => "main",
            CpuId::Dma => "dma"
        })
    }
}

impl fmt::Display for CpuLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CpuLine::Irq => "IRQ",
            CpuLine::Firq => "FIRQ",
            CpuLine::Nmi => "NMI",
            CpuLine::Halt => "HALT"
        })
    }
}
