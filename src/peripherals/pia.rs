/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The Motorola MC6821 Peripheral Interface Adapter.
//!
//! Register layout, as seen from the CPU:
//!
//! | Offset | Read                     | Write          |
//! |--------|--------------------------|----------------|
//! | 0      | DDRA or peripheral A     | DDRA or ORA    |
//! | 1      | CRA                      | CRA (bits 0-5) |
//! | 2      | DDRB or peripheral B     | DDRB or ORB    |
//! | 3      | CRB                      | CRB (bits 0-5) |
//!
//! The selection between a direction register and a data register depends on bit 2 of
//! the control register of the respective side.
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::chip::PiaCtrlFlags;

/// The number of registers of a PIA.
pub const PIA_REGISTERS: u16 = 4;

/// A single side of the PIA: its direction, output and control registers and the state
/// of the control lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(default, rename_all = "camelCase"))]
pub struct PiaPort {
    ddr: u8,
    output: u8,
    input: u8,
    ctrl: PiaCtrlFlags,
    c1: bool,
    c2_in: bool,
    c2_out: bool
}

/// The MC6821 register block with sides A and B.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(default))]
pub struct Pia6821 {
    a: PiaPort,
    b: PiaPort
}

impl Default for PiaPort {
    fn default() -> Self {
        PiaPort {
            ddr: 0,
            output: 0,
            input: u8::MAX,
            ctrl: PiaCtrlFlags::empty(),
            c1: false,
            c2_in: false,
            c2_out: true
        }
    }
}

impl PiaPort {
    #[inline]
    pub fn ddr(&self) -> u8 {
        self.ddr
    }

    #[inline]
    pub fn output(&self) -> u8 {
        self.output
    }
    /// Returns the levels last applied to the peripheral pins.
    #[inline]
    pub fn input(&self) -> u8 {
        self.input
    }

    #[inline]
    pub fn ctrl(&self) -> PiaCtrlFlags {
        self.ctrl
    }
    /// Returns the level of the C2 line when configured as an output.
    #[inline]
    pub fn c2_output(&self) -> bool {
        self.c2_out
    }
    /// Returns the state of the interrupt request output of this side.
    #[inline]
    pub fn irq(&self) -> bool {
        self.ctrl.irq_output()
    }
    /// Returns the value seen by the CPU when reading the peripheral data register.
    #[inline]
    pub fn data(&self) -> u8 {
        (self.input & !self.ddr) | (self.output & self.ddr)
    }
    /// Returns the value of the register at the side relative `offset` (0 or 1) without side effects.
    #[inline]
    pub fn peek(&self, offset: u16) -> u8 {
        if offset & 1 == 0 {
            if self.ctrl.is_output_selected() { self.data() } else { self.ddr }
        }
        else {
            self.ctrl.bits()
        }
    }

    fn read_data(&mut self) -> u8 {
        let data = self.data();
        self.ctrl.remove(PiaCtrlFlags::IRQ_MASK);
        data
    }

    fn write_data(&mut self, data: u8) {
        if self.ctrl.is_output_selected() {
            self.output = data;
        }
        else {
            self.ddr = data;
        }
    }

    fn write_ctrl(&mut self, data: u8) {
        self.ctrl = (self.ctrl & PiaCtrlFlags::IRQ_MASK) |
                    (PiaCtrlFlags::from(data) & PiaCtrlFlags::CONTROL_MASK);
        if self.ctrl.is_c2_output() {
            self.ctrl.remove(PiaCtrlFlags::IRQ2);
            self.c2_out = if self.ctrl.intersects(PiaCtrlFlags::C2_CONTROL4) {
                self.ctrl.intersects(PiaCtrlFlags::C2_CONTROL3)
            }
            else {
                true
            };
        }
    }
    // handshake: C2 low until the next active C1 edge, pulse: C2 low for one cycle
    fn strobe_c2(&mut self) {
        if self.ctrl & (PiaCtrlFlags::C2_OUTPUT|PiaCtrlFlags::C2_CONTROL4|PiaCtrlFlags::C2_CONTROL3)
                    == PiaCtrlFlags::C2_OUTPUT {
            self.c2_out = false;
        }
    }

    fn set_c1(&mut self, level: bool) {
        if level == self.c1 {
            return
        }
        self.c1 = level;
        if level == self.ctrl.c1_active_edge() {
            self.ctrl.insert(PiaCtrlFlags::IRQ1);
            if self.ctrl & (PiaCtrlFlags::C2_OUTPUT|PiaCtrlFlags::C2_CONTROL4) == PiaCtrlFlags::C2_OUTPUT {
                self.c2_out = true;
            }
        }
    }

    fn set_c2(&mut self, level: bool) {
        if level == self.c2_in {
            return
        }
        self.c2_in = level;
        if !self.ctrl.is_c2_output() && level == self.ctrl.c2_active_edge() {
            self.ctrl.insert(PiaCtrlFlags::IRQ2);
        }
    }

    fn reset(&mut self) {
        *self = PiaPort { input: self.input, c1: self.c1, c2_in: self.c2_in, ..PiaPort::default() };
    }
}

impl Pia6821 {
    #[inline]
    pub fn a(&self) -> &PiaPort {
        &self.a
    }

    #[inline]
    pub fn b(&self) -> &PiaPort {
        &self.b
    }
    /// Restores the power-on register state. The levels of the input lines are retained.
    pub fn reset(&mut self) {
        self.a.reset();
        self.b.reset();
    }
    /// Reads the register at `offset` (only the lowest 2 bits are significant).
    ///
    /// Reading a peripheral data register clears both interrupt flags of that side.
    /// Reading the peripheral A register also strobes CA2 in the handshake and pulse modes.
    pub fn read(&mut self, offset: u16) -> u8 {
        match offset & 3 {
            0 if self.a.ctrl.is_output_selected() => {
                let data = self.a.read_data();
                self.a.strobe_c2();
                data
            }
            0 => self.a.ddr,
            1 => self.a.ctrl.bits(),
            2 if self.b.ctrl.is_output_selected() => self.b.read_data(),
            2 => self.b.ddr,
            _ => self.b.ctrl.bits()
        }
    }
    /// Writes the register at `offset` (only the lowest 2 bits are significant).
    ///
    /// Writing the output register B strobes CB2 in the handshake and pulse modes.
    pub fn write(&mut self, offset: u16, data: u8) {
        match offset & 3 {
            0 => self.a.write_data(data),
            1 => self.a.write_ctrl(data),
            2 => {
                self.b.write_data(data);
                if self.b.ctrl.is_output_selected() {
                    self.b.strobe_c2();
                }
            }
            _ => self.b.write_ctrl(data)
        }
    }
    /// Returns the value of the register at `offset` without side effects.
    #[inline]
    pub fn peek(&self, offset: u16) -> u8 {
        match offset & 3 {
            0|1 => self.a.peek(offset),
            _ => self.b.peek(offset)
        }
    }

    #[inline]
    pub fn irq_a(&self) -> bool {
        self.a.irq()
    }

    #[inline]
    pub fn irq_b(&self) -> bool {
        self.b.irq()
    }
    /// Returns the levels of the port A pins. Port A pins configured as inputs are pulled up.
    #[inline]
    pub fn port_a_output(&self) -> u8 {
        (self.a.output & self.a.ddr) | !self.a.ddr
    }
    /// Returns the levels of the port B pins driven by the PIA. Input pins read as 0.
    #[inline]
    pub fn port_b_output(&self) -> u8 {
        self.b.output & self.b.ddr
    }

    #[inline]
    pub fn set_port_a_input(&mut self, pins: u8) {
        self.a.input = pins;
    }

    #[inline]
    pub fn set_port_b_input(&mut self, pins: u8) {
        self.b.input = pins;
    }

    #[inline]
    pub fn set_ca1(&mut self, level: bool) {
        self.a.set_c1(level)
    }

    #[inline]
    pub fn set_ca2(&mut self, level: bool) {
        self.a.set_c2(level)
    }

    #[inline]
    pub fn set_cb1(&mut self, level: bool) {
        self.b.set_c1(level)
    }

    #[inline]
    pub fn set_cb2(&mut self, level: bool) {
        self.b.set_c2(level)
    }
    /// Applies a short pulse of the opposite level to CA1, triggering exactly one active edge.
    pub fn pulse_ca1(&mut self) {
        let level = self.a.c1;
        self.a.set_c1(!level);
        self.a.set_c1(level);
    }
    /// Applies a short pulse of the opposite level to CB1, triggering exactly one active edge.
    pub fn pulse_cb1(&mut self) {
        let level = self.b.c1;
        self.b.set_c1(!level);
        self.b.set_c1(level);
    }

    #[inline]
    pub fn ca2_output(&self) -> bool {
        self.a.c2_out
    }

    #[inline]
    pub fn cb2_output(&self) -> bool {
        self.b.c2_out
    }
}
