/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Register flag types of the emulated chips.
use core::fmt;
use core::convert::TryFrom;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;

/// Creates `fn from_data(data: u8) -> Self` method for a [::bitflags] type.
///
/// The created function will avoid using `from_bits_truncate()` which can be pretty slow.
#[macro_export]
macro_rules! bitflags_from_data {
    ($bitflags:ty) => {
        impl $bitflags {
            /// Create flags from raw bits in `data` by truncating unused bits.
            #[inline]
            pub fn from_data(data: u8) -> Self {
                <$bitflags>::from_bits_retain(data) & <$bitflags>::all()
            }
        }
    };
}
pub use bitflags_from_data;

/// A macro for creating complex mask constants that won't get in the way of bitflags.
#[macro_export]
macro_rules! bitflags_masks {
    (@ pub const $mask:ident = $($flag:ident)|*;) => {
        pub const $mask: Self = Self::from_bits_retain($(Self::$flag.bits())|*);
    };
    (@#[doc = $doc:expr] pub const $mask:ident = $($flag:ident)|*;) => {
        #[doc = $doc] pub const $mask: Self = Self::from_bits_retain($(Self::$flag.bits())|*);
    };
    ($bitflags:ty {$($(#[doc = $doc:expr])? pub const $mask:ident = $($flag:ident)|*;)*}) => {
        impl $bitflags {$(
            $crate::bitflags_masks!(@$(#[doc = $doc])? pub const $mask = $($flag)|*;);
        )*}
    };
}
pub use bitflags_masks;

/// A macro for testing created flags, whether all bits up to `$nbits` are defined
/// and if all bitflags are a single bit-flags.
#[macro_export]
macro_rules! test_bitflags_all_bits_defined_no_masks {
    ($ty:ty, $nbits:expr) => {{
        type BITS = <$ty as bitflags::Flags>::Bits;
        let flags = <$ty as bitflags::Flags>::FLAGS;
        let mut last = 0;
        for f in flags.into_iter() {
            let bits = f.value().bits();
            assert!(bits.is_power_of_two(), "{}: {:#b}", f.name(), bits);
            assert!(bits > last, "{} out of order", f.name());
            last = bits;
        }
        let all: BITS = 1;
        let all = all.checked_shl($nbits - 1).expect("overflowed");
        let all = all | (all - 1);
        assert_eq!(<$ty>::all().bits(), all);
    }};
}
pub use test_bitflags_all_bits_defined_no_masks;

bitflags! {
    /// The state of the input lines of a single CPU.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(try_from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct CpuLineFlags: u8 {
        const IRQ  = 0b0001;
        const FIRQ = 0b0010;
        const NMI  = 0b0100;
        const HALT = 0b1000;
    }
}
bitflags_from_data!(CpuLineFlags);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU8CpuLineFlagsError(pub u8);

bitflags! {
    /// MC6821 PIA control register flags, one register per side (A and B).
    ///
    /// | Dir | b7   | b6   | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|------|------|-----|-----|-----|-----|-----|-----|
    /// | IN  | IRQ1 | IRQ2 | C25 | C24 | C23 | ORS | C1E | C1I |
    /// | OUT |      |      | C25 | C24 | C23 | ORS | C1E | C1I |
    ///
    /// * `C1I` enables the IRQ output on an active C1 transition.
    /// * `C1E` selects the active C1 edge: `0: falling, 1: rising`.
    /// * `ORS` selects what the data offset accesses: `0: DDR, 1: peripheral register`.
    /// * `C23`-`C25` select the C2 mode. With `C25 = 0` C2 is an input: `C23` enables its IRQ
    ///   and `C24` selects its active edge like `C1E`. With `C25 = 1` C2 is an output:
    ///   `C24 = 1` drives it manually with `C23`, otherwise it works in handshake (`C23 = 0`)
    ///   or pulse (`C23 = 1`) mode.
    /// * `IRQ1` and `IRQ2` are read-only interrupt flags set by C1 and C2 transitions.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct PiaCtrlFlags: u8 {
        const C1_IRQ_ENABLE  = 0b0000_0001;
        const C1_RISING_EDGE = 0b0000_0010;
        const OUTPUT_SELECT  = 0b0000_0100;
        const C2_CONTROL3    = 0b0000_1000;
        const C2_CONTROL4    = 0b0001_0000;
        const C2_OUTPUT      = 0b0010_0000;
        const IRQ2           = 0b0100_0000;
        const IRQ1           = 0b1000_0000;
    }
}
bitflags_masks!(PiaCtrlFlags {
    /// Bits that can be written by the CPU.
    pub const CONTROL_MASK = C2_OUTPUT|C2_CONTROL4|C2_CONTROL3|OUTPUT_SELECT|C1_RISING_EDGE|C1_IRQ_ENABLE;
    pub const IRQ_MASK = IRQ1|IRQ2;
});

bitflags! {
    /// GIME initialization register 0 flags at `0xFF90`.
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT | COC | MMU | IEN | FEN | MC3 | MC2 | MC1 | MC0 |
    ///
    /// * `COC` CoCo 1/2 compatible video.
    /// * `MMU` enables the task page registers.
    /// * `IEN` and `FEN` enable GIME IRQ and FIRQ outputs.
    /// * `MC3` maps the `0xFE00-0xFEFF` page constantly to the RAM block `0x3F`.
    /// * `MC2` selects the standard SCS (cartridge select) decoding.
    /// * `MC1`, `MC0` select the ROM map, see [GimeRomMap].
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct GimeInit0Flags: u8 {
        const ROM_MAP0     = 0b0000_0001;
        const ROM_MAP1     = 0b0000_0010;
        const STANDARD_SCS = 0b0000_0100;
        const CONST_FEXX   = 0b0000_1000;
        const FIRQ_ENABLE  = 0b0001_0000;
        const IRQ_ENABLE   = 0b0010_0000;
        const MMU_ENABLE   = 0b0100_0000;
        const COCO_COMPAT  = 0b1000_0000;
    }
}
bitflags_masks!(GimeInit0Flags {
    pub const ROM_MAP_MASK = ROM_MAP1|ROM_MAP0;
});

/// The GIME ROM map selected by `MC1` and `MC0`.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(try_from = "u8", into = "u8"))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u8)]
pub enum GimeRomMap {
    /// 16K internal at `0x8000`, 16K cartridge at `0xC000`.
    Split16K = 0,
    /// 32K internal ROM.
    Internal32K = 2,
    /// 32K cartridge ROM.
    External32K = 3,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU8GimeRomMapError(pub u8);

bitflags! {
    /// GIME initialization register 1 flags at `0xFF91`.
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT |     | MTY | TIN |     |     |     |     | TR  |
    ///
    /// * `MTY` memory type: `0: 64K chips, 1: 256K chips`.
    /// * `TIN` timer input clock: `0: 63.695 us, 1: 279.365 ns`.
    /// * `TR` selects the task register set.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct GimeInit1Flags: u8 {
        const TASK        = 0b0000_0001;
        const UNUSED1     = 0b0000_0010;
        const UNUSED2     = 0b0000_0100;
        const UNUSED3     = 0b0000_1000;
        const UNUSED4     = 0b0001_0000;
        const TIMER_INPUT = 0b0010_0000;
        const MEMORY_TYPE = 0b0100_0000;
        const UNUSED7     = 0b1000_0000;
    }
}

bitflags! {
    /// GIME interrupt source flags as used by `0xFF92` (IRQENR) and `0xFF93` (FIRQENR).
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | I/O |     |     | TMR | HBD | VBD | EI2 | EI1 | EI0 |
    ///
    /// * `TMR` the 12-bit timer has counted down to zero.
    /// * `HBD` horizontal border, `VBD` vertical border.
    /// * `EI2` serial data, `EI1` keyboard, `EI0` cartridge.
    ///
    /// Writes set the enable mask. Reads return sources both pending and enabled and
    /// acknowledge the edge triggered ones.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct GimeIntFlags: u8 {
        const CART     = 0b0000_0001;
        const KEYBOARD = 0b0000_0010;
        const SERIAL   = 0b0000_0100;
        const VBORD    = 0b0000_1000;
        const HBORD    = 0b0001_0000;
        const TIMER    = 0b0010_0000;
        const UNUSED6  = 0b0100_0000;
        const UNUSED7  = 0b1000_0000;
    }
}
bitflags_masks!(GimeIntFlags {
    /// Sources latched until acknowledged by reading the enable register.
    pub const EDGE_MASK = TIMER|HBORD|VBORD;
    /// Sources following the level of their input.
    pub const LEVEL_MASK = SERIAL|KEYBOARD|CART;
    pub const SOURCE_MASK = TIMER|HBORD|VBORD|SERIAL|KEYBOARD|CART;
});

bitflags! {
    /// MC6883 SAM control register bits.
    ///
    /// Each bit is cleared by a write to an even address and set by a write to the following
    /// odd address in the `0xFFC0-0xFFDF` range, in the order of the flags below.
    ///
    /// * `V0`-`V2` display mode, `F0`-`F6` display offset.
    /// * `P1` page #1, `R0`-`R1` CPU rate, `M0`-`M1` memory size.
    /// * `TY` map type: `0: ROM mapped at 0x8000-0xFEFF, 1: all RAM`.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u16", into = "u16"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct SamFlags: u16 {
        const V0 = 0x0001;
        const V1 = 0x0002;
        const V2 = 0x0004;
        const F0 = 0x0008;
        const F1 = 0x0010;
        const F2 = 0x0020;
        const F3 = 0x0040;
        const F4 = 0x0080;
        const F5 = 0x0100;
        const F6 = 0x0200;
        const P1 = 0x0400;
        const R0 = 0x0800;
        const R1 = 0x1000;
        const M0 = 0x2000;
        const M1 = 0x4000;
        const TY = 0x8000;
    }
}
bitflags_masks!(SamFlags {
    pub const DISPLAY_MODE_MASK = V2|V1|V0;
    pub const DISPLAY_OFFSET_MASK = F6|F5|F4|F3|F2|F1|F0;
    pub const RATE_MASK = R1|R0;
    pub const MEMORY_SIZE_MASK = M1|M0;
});

bitflags! {
    /// Dragon Beta PIA 2 port A flags at `0xFCC0`.
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT | NMI | /MAP|     |     | TS3 | TS2 | TS1 | TS0 |
    ///
    /// * `NMI` DMA CPU NMI line, active on the falling edge.
    /// * `/MAP` enables paging when low. The port A pull-ups leave paging disabled after reset.
    /// * Live task: `TS3 * 8 + TS2 * 4 + TS1 * 2 + TS0`.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct BetaTaskFlags: u8 {
        const TASK0      = 0b0000_0001;
        const TASK1      = 0b0000_0010;
        const TASK2      = 0b0000_0100;
        const TASK3      = 0b0000_1000;
        const UNUSED4    = 0b0001_0000;
        const UNUSED5    = 0b0010_0000;
        const NO_MAP     = 0b0100_0000;
        const DMA_NMI    = 0b1000_0000;
    }
}
bitflags_masks!(BetaTaskFlags {
    pub const TASK_MASK = TASK3|TASK2|TASK1|TASK0;
});

bitflags! {
    /// Dragon Beta PIA 2 port B flags at `0xFCC2`.
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT | HLT |     |     |     | PT3 | PT2 | PT1 | PT0 |
    ///
    /// * `HLT` main CPU HALT, `1: halted`.
    /// * The task accessed through page registers at `0xFE00`: `PT3 * 8 + PT2 * 4 + PT1 * 2 + PT0`.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct BetaPiaTaskFlags: u8 {
        const PIA_TASK0 = 0b0000_0001;
        const PIA_TASK1 = 0b0000_0010;
        const PIA_TASK2 = 0b0000_0100;
        const PIA_TASK3 = 0b0000_1000;
        const UNUSED4   = 0b0001_0000;
        const UNUSED5   = 0b0010_0000;
        const UNUSED6   = 0b0100_0000;
        const MAIN_HALT = 0b1000_0000;
    }
}
bitflags_masks!(BetaPiaTaskFlags {
    pub const PIA_TASK_MASK = PIA_TASK3|PIA_TASK2|PIA_TASK1|PIA_TASK0;
});

bitflags! {
    /// Dragon Beta PIA 1 port A flags at `0xFC20`.
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT | HLT |     |     | DDN |     | SID | DS1 | DS0 |
    ///
    /// * `HLT` DMA CPU HALT, `1: halted`.
    /// * `DDN` double density, `SID` disk side, drive: `DS1 * 2 + DS0`.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct BetaFdcCtrlFlags: u8 {
        const DRIVE0   = 0b0000_0001;
        const DRIVE1   = 0b0000_0010;
        const SIDE     = 0b0000_0100;
        const UNUSED3  = 0b0000_1000;
        const DENSITY  = 0b0001_0000;
        const UNUSED5  = 0b0010_0000;
        const UNUSED6  = 0b0100_0000;
        const DMA_HALT = 0b1000_0000;
    }
}
bitflags_masks!(BetaFdcCtrlFlags {
    pub const DRIVE_MASK = DRIVE1|DRIVE0;
});

bitflags! {
    /// Dragon Beta PIA 0 port B flags at `0xFC02`: the keyboard row shift register.
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT |     |     | DAT | CLK | CLR |     |     |     |
    ///
    /// * `CLR` clears the shift register when low.
    /// * `CLK` shifts `DAT` into the register on the rising edge.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct BetaKbdFlags: u8 {
        const UNUSED0     = 0b0000_0001;
        const UNUSED1     = 0b0000_0010;
        const UNUSED2     = 0b0000_0100;
        const SHIFT_CLEAR = 0b0000_1000;
        const SHIFT_CLOCK = 0b0001_0000;
        const SHIFT_DATA  = 0b0010_0000;
        const UNUSED6     = 0b0100_0000;
        const UNUSED7     = 0b1000_0000;
    }
}

/****************************** CpuLineFlags ******************************/

impl std::error::Error for TryFromU8CpuLineFlagsError {}

impl fmt::Display for TryFromU8CpuLineFlagsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer (0x{:x}) contains extraneous bits for `CpuLineFlags`", self.0)
    }
}

impl TryFrom<u8> for CpuLineFlags {
    type Error = TryFromU8CpuLineFlagsError;
    fn try_from(lines: u8) -> core::result::Result<Self, Self::Error> {
        CpuLineFlags::from_bits(lines).ok_or(TryFromU8CpuLineFlagsError(lines))
    }
}

impl From<CpuLineFlags> for u8 {
    fn from(lines: CpuLineFlags) -> u8 {
        lines.bits()
    }
}

/****************************** PiaCtrlFlags ******************************/

impl PiaCtrlFlags {
    #[inline]
    pub fn is_output_selected(self) -> bool {
        self.intersects(PiaCtrlFlags::OUTPUT_SELECT)
    }
    /// Returns `true` if C2 is configured as an output.
    #[inline]
    pub fn is_c2_output(self) -> bool {
        self.intersects(PiaCtrlFlags::C2_OUTPUT)
    }
    /// Returns `true` if IRQ2 may be raised: C2 is an input with its interrupt enabled.
    #[inline]
    pub fn is_c2_irq_enabled(self) -> bool {
        self & (PiaCtrlFlags::C2_OUTPUT|PiaCtrlFlags::C2_CONTROL3) == PiaCtrlFlags::C2_CONTROL3
    }
    /// Returns the active transition of C1: `true` for rising.
    #[inline]
    pub fn c1_active_edge(self) -> bool {
        self.intersects(PiaCtrlFlags::C1_RISING_EDGE)
    }
    /// Returns the active transition of C2 as an input: `true` for rising.
    #[inline]
    pub fn c2_active_edge(self) -> bool {
        self.intersects(PiaCtrlFlags::C2_CONTROL4)
    }
    /// Computes the IRQ output from the interrupt flags and enable bits.
    #[inline]
    pub fn irq_output(self) -> bool {
        (self.contains(PiaCtrlFlags::IRQ1|PiaCtrlFlags::C1_IRQ_ENABLE)) ||
        (self.contains(PiaCtrlFlags::IRQ2) && self.is_c2_irq_enabled())
    }
}

impl From<PiaCtrlFlags> for u8 {
    #[inline]
    fn from(flags: PiaCtrlFlags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for PiaCtrlFlags {
    #[inline]
    fn from(flags: u8) -> PiaCtrlFlags {
        PiaCtrlFlags::from_bits_retain(flags)
    }
}

/****************************** GimeInit0Flags ******************************/

impl GimeInit0Flags {
    /// Returns the ROM map selected by `MC1` and `MC0`.
    #[inline]
    pub fn rom_map(self) -> GimeRomMap {
        match (self & GimeInit0Flags::ROM_MAP_MASK).bits() {
            0|1 => GimeRomMap::Split16K,
            2 => GimeRomMap::Internal32K,
            _ => GimeRomMap::External32K
        }
    }
    /// Returns modified flags with the ROM map bits set from `map`.
    pub fn with_rom_map(mut self, map: GimeRomMap) -> Self {
        self.remove(GimeInit0Flags::ROM_MAP_MASK);
        self.insert(GimeInit0Flags::from_bits_retain(map as u8));
        self
    }
    #[inline]
    pub fn is_mmu_enabled(self) -> bool {
        self.intersects(GimeInit0Flags::MMU_ENABLE)
    }
    #[inline]
    pub fn is_const_fexx(self) -> bool {
        self.intersects(GimeInit0Flags::CONST_FEXX)
    }
    #[inline]
    pub fn is_irq_enabled(self) -> bool {
        self.intersects(GimeInit0Flags::IRQ_ENABLE)
    }
    #[inline]
    pub fn is_firq_enabled(self) -> bool {
        self.intersects(GimeInit0Flags::FIRQ_ENABLE)
    }
}

impl From<GimeInit0Flags> for u8 {
    #[inline]
    fn from(flags: GimeInit0Flags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for GimeInit0Flags {
    #[inline]
    fn from(flags: u8) -> GimeInit0Flags {
        GimeInit0Flags::from_bits_retain(flags)
    }
}

/****************************** GimeRomMap ******************************/

impl From<GimeRomMap> for u8 {
    fn from(map: GimeRomMap) -> u8 {
        map as u8
    }
}

impl std::error::Error for TryFromU8GimeRomMapError {}

impl fmt::Display for TryFromU8GimeRomMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) out of range for `GimeRomMap`", self.0)
    }
}

impl TryFrom<u8> for GimeRomMap {
    type Error = TryFromU8GimeRomMapError;
    fn try_from(map: u8) -> core::result::Result<Self, Self::Error> {
        Ok(match map {
            0 => GimeRomMap::Split16K,
            2 => GimeRomMap::Internal32K,
            3 => GimeRomMap::External32K,
            _ => return Err(TryFromU8GimeRomMapError(map))
        })
    }
}

/****************************** GimeInit1Flags ******************************/

impl GimeInit1Flags {
    /// Returns the selected task register set: 0 or 1.
    #[inline]
    pub fn task(self) -> usize {
        self.intersects(GimeInit1Flags::TASK).into()
    }
    #[inline]
    pub fn is_timer_fast(self) -> bool {
        self.intersects(GimeInit1Flags::TIMER_INPUT)
    }
}

impl From<GimeInit1Flags> for u8 {
    #[inline]
    fn from(flags: GimeInit1Flags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for GimeInit1Flags {
    #[inline]
    fn from(flags: u8) -> GimeInit1Flags {
        GimeInit1Flags::from_bits_retain(flags)
    }
}

/****************************** GimeIntFlags ******************************/

impl From<GimeIntFlags> for u8 {
    #[inline]
    fn from(flags: GimeIntFlags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for GimeIntFlags {
    #[inline]
    fn from(flags: u8) -> GimeIntFlags {
        GimeIntFlags::from_bits_retain(flags)
    }
}

/****************************** SamFlags ******************************/

impl SamFlags {
    /// Returns the flag controlled by the write-only SAM register at `offset` (`0..32`)
    /// and whether the write sets it.
    #[inline]
    pub fn from_register_offset(offset: u16) -> (SamFlags, bool) {
        let offset = offset & 0x1F;
        (SamFlags::from_bits_retain(1 << (offset >> 1)), offset & 1 == 1)
    }
    /// Returns `true` if the map type bit is set: RAM everywhere, no ROM.
    #[inline]
    pub fn is_all_ram(self) -> bool {
        self.intersects(SamFlags::TY)
    }

    pub fn display_mode(self) -> u8 {
        (self & SamFlags::DISPLAY_MODE_MASK).bits() as u8
    }

    pub fn display_offset(self) -> u8 {
        ((self & SamFlags::DISPLAY_OFFSET_MASK).bits() >> 3) as u8
    }

    pub fn cpu_rate(self) -> u8 {
        ((self & SamFlags::RATE_MASK).bits() >> 11) as u8
    }
}

impl From<SamFlags> for u16 {
    #[inline]
    fn from(flags: SamFlags) -> u16 {
        flags.bits()
    }
}

impl From<u16> for SamFlags {
    #[inline]
    fn from(flags: u16) -> SamFlags {
        SamFlags::from_bits_retain(flags)
    }
}

/****************************** BetaTaskFlags ******************************/

impl BetaTaskFlags {
    /// Returns the live task index `[0, 15]`.
    #[inline]
    pub fn task(self) -> usize {
        (self & BetaTaskFlags::TASK_MASK).bits().into()
    }
    #[inline]
    pub fn is_map_enabled(self) -> bool {
        !self.intersects(BetaTaskFlags::NO_MAP)
    }
    /// Returns the level of the DMA CPU NMI output bit.
    #[inline]
    pub fn dma_nmi_level(self) -> bool {
        self.intersects(BetaTaskFlags::DMA_NMI)
    }
}

impl From<BetaTaskFlags> for u8 {
    #[inline]
    fn from(flags: BetaTaskFlags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for BetaTaskFlags {
    #[inline]
    fn from(flags: u8) -> BetaTaskFlags {
        BetaTaskFlags::from_bits_retain(flags)
    }
}

/****************************** BetaPiaTaskFlags ******************************/

impl BetaPiaTaskFlags {
    /// Returns the task index `[0, 15]` addressed by page registers at `0xFE00`.
    #[inline]
    pub fn pia_task(self) -> usize {
        (self & BetaPiaTaskFlags::PIA_TASK_MASK).bits().into()
    }
    #[inline]
    pub fn is_main_halted(self) -> bool {
        self.intersects(BetaPiaTaskFlags::MAIN_HALT)
    }
}

impl From<BetaPiaTaskFlags> for u8 {
    #[inline]
    fn from(flags: BetaPiaTaskFlags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for BetaPiaTaskFlags {
    #[inline]
    fn from(flags: u8) -> BetaPiaTaskFlags {
        BetaPiaTaskFlags::from_bits_retain(flags)
    }
}

/****************************** BetaFdcCtrlFlags ******************************/

impl BetaFdcCtrlFlags {
    #[inline]
    pub fn drive(self) -> usize {
        (self & BetaFdcCtrlFlags::DRIVE_MASK).bits().into()
    }
    #[inline]
    pub fn side(self) -> usize {
        self.intersects(BetaFdcCtrlFlags::SIDE).into()
    }
    #[inline]
    pub fn is_double_density(self) -> bool {
        self.intersects(BetaFdcCtrlFlags::DENSITY)
    }
    #[inline]
    pub fn is_dma_halted(self) -> bool {
        self.intersects(BetaFdcCtrlFlags::DMA_HALT)
    }
}

impl From<BetaFdcCtrlFlags> for u8 {
    #[inline]
    fn from(flags: BetaFdcCtrlFlags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for BetaFdcCtrlFlags {
    #[inline]
    fn from(flags: u8) -> BetaFdcCtrlFlags {
        BetaFdcCtrlFlags::from_bits_retain(flags)
    }
}

/****************************** BetaKbdFlags ******************************/

impl BetaKbdFlags {
    /// `CLR` is active low.
    #[inline]
    pub fn is_clear(self) -> bool {
        !self.intersects(BetaKbdFlags::SHIFT_CLEAR)
    }
    #[inline]
    pub fn clock(self) -> bool {
        self.intersects(BetaKbdFlags::SHIFT_CLOCK)
    }
    #[inline]
    pub fn data(self) -> bool {
        self.intersects(BetaKbdFlags::SHIFT_DATA)
    }
}

impl From<BetaKbdFlags> for u8 {
    #[inline]
    fn from(flags: BetaKbdFlags) -> u8 {
        flags.bits()
    }
}

impl From<u8> for BetaKbdFlags {
    #[inline]
    fn from(flags: u8) -> BetaKbdFlags {
        BetaKbdFlags::from_bits_retain(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_all_bits_defined() {
        test_bitflags_all_bits_defined_no_masks!(CpuLineFlags, 4);
        test_bitflags_all_bits_defined_no_masks!(PiaCtrlFlags, 8);
        test_bitflags_all_bits_defined_no_masks!(GimeInit0Flags, 8);
        test_bitflags_all_bits_defined_no_masks!(GimeInit1Flags, 8);
        test_bitflags_all_bits_defined_no_masks!(GimeIntFlags, 8);
        test_bitflags_all_bits_defined_no_masks!(SamFlags, 16);
        test_bitflags_all_bits_defined_no_masks!(BetaTaskFlags, 8);
        test_bitflags_all_bits_defined_no_masks!(BetaPiaTaskFlags, 8);
        test_bitflags_all_bits_defined_no_masks!(BetaFdcCtrlFlags, 8);
        test_bitflags_all_bits_defined_no_masks!(BetaKbdFlags, 8);
    }

    #[test]
    fn cpu_line_flags_works() {
        assert_eq!(CpuLineFlags::from_data(0xFF), CpuLineFlags::all());
        assert_eq!(CpuLineFlags::try_from(0x0A), Ok(CpuLineFlags::HALT|CpuLineFlags::FIRQ));
        assert_eq!(CpuLineFlags::try_from(0x10), Err(TryFromU8CpuLineFlagsError(0x10)));
        assert_eq!(u8::from(CpuLineFlags::NMI), 4);
    }

    #[test]
    fn pia_ctrl_flags_works() {
        let ctrl = PiaCtrlFlags::from(0b0000_0101);
        assert!(ctrl.is_output_selected());
        assert!(!ctrl.c1_active_edge());
        assert!(!ctrl.irq_output());
        assert!((ctrl|PiaCtrlFlags::IRQ1).irq_output());
        assert!(!(PiaCtrlFlags::IRQ1).irq_output());
        let ctrl = PiaCtrlFlags::C2_CONTROL3|PiaCtrlFlags::IRQ2;
        assert!(ctrl.is_c2_irq_enabled());
        assert!(ctrl.irq_output());
        let ctrl = ctrl|PiaCtrlFlags::C2_OUTPUT;
        assert!(!ctrl.is_c2_irq_enabled());
        assert!(!ctrl.irq_output());
        assert_eq!(PiaCtrlFlags::CONTROL_MASK.bits(), 0x3F);
        assert_eq!(PiaCtrlFlags::IRQ_MASK.bits(), 0xC0);
    }

    #[test]
    fn gime_init0_flags_works() {
        assert_eq!(GimeInit0Flags::empty().rom_map(), GimeRomMap::Split16K);
        assert_eq!(GimeInit0Flags::ROM_MAP0.rom_map(), GimeRomMap::Split16K);
        assert_eq!(GimeInit0Flags::ROM_MAP1.rom_map(), GimeRomMap::Internal32K);
        assert_eq!(GimeInit0Flags::ROM_MAP_MASK.rom_map(), GimeRomMap::External32K);
        let flags = GimeInit0Flags::all().with_rom_map(GimeRomMap::Internal32K);
        assert_eq!(flags, !GimeInit0Flags::ROM_MAP0);
        assert_eq!(flags.rom_map(), GimeRomMap::Internal32K);
        assert!(flags.is_mmu_enabled());
        assert!(flags.is_const_fexx());
        assert!(!GimeInit0Flags::from(0x30).is_mmu_enabled());
        assert!(GimeInit0Flags::from(0x30).is_irq_enabled());
        assert!(GimeInit0Flags::from(0x30).is_firq_enabled());
        assert_eq!(GimeRomMap::try_from(1), Err(TryFromU8GimeRomMapError(1)));
        assert_eq!(GimeRomMap::try_from(3), Ok(GimeRomMap::External32K));
    }

    #[test]
    fn gime_int_flags_works() {
        assert_eq!(GimeIntFlags::EDGE_MASK|GimeIntFlags::LEVEL_MASK, GimeIntFlags::SOURCE_MASK);
        assert_eq!(GimeIntFlags::SOURCE_MASK.bits(), 0x3F);
        assert_eq!(GimeInit1Flags::from(0x21).task(), 1);
        assert!(GimeInit1Flags::from(0x21).is_timer_fast());
        assert_eq!(GimeInit1Flags::from(0x40).task(), 0);
    }

    #[test]
    fn sam_flags_works() {
        assert_eq!(SamFlags::from_register_offset(0x1E), (SamFlags::TY, false));
        assert_eq!(SamFlags::from_register_offset(0x1F), (SamFlags::TY, true));
        assert_eq!(SamFlags::from_register_offset(0x00), (SamFlags::V0, false));
        assert_eq!(SamFlags::from_register_offset(0x07), (SamFlags::F0, true));
        assert_eq!(SamFlags::from_register_offset(0x17), (SamFlags::R0, true));
        let flags = SamFlags::V1|SamFlags::F0|SamFlags::F6|SamFlags::R1;
        assert_eq!(flags.display_mode(), 2);
        assert_eq!(flags.display_offset(), 0x41);
        assert_eq!(flags.cpu_rate(), 2);
        assert!(!flags.is_all_ram());
        assert!(SamFlags::TY.is_all_ram());
    }

    #[test]
    fn beta_flags_works() {
        let flags = BetaTaskFlags::from(0x85);
        assert_eq!(flags.task(), 5);
        assert!(flags.is_map_enabled());
        assert!(flags.dma_nmi_level());
        let flags = BetaTaskFlags::from(0xFF);
        assert_eq!(flags.task(), 15);
        assert!(!flags.is_map_enabled());
        assert!(!BetaTaskFlags::from(0x40).dma_nmi_level());
        let flags = BetaPiaTaskFlags::from(0x8F);
        assert_eq!(flags.pia_task(), 15);
        assert!(flags.is_main_halted());
        let flags = BetaFdcCtrlFlags::from(0x96);
        assert_eq!(flags.drive(), 2);
        assert_eq!(flags.side(), 1);
        assert!(flags.is_double_density());
        assert!(flags.is_dma_halted());
        let flags = BetaKbdFlags::from(0x30);
        assert!(flags.is_clear());
        assert!(flags.clock());
        assert!(flags.data());
        assert!(!BetaKbdFlags::SHIFT_CLEAR.is_clear());
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn flags_serde_works() {
        let flags = GimeInit0Flags::MMU_ENABLE|GimeInit0Flags::CONST_FEXX;
        assert_eq!(serde_json::to_string(&flags).unwrap(), "72");
        assert_eq!(serde_json::from_str::<GimeInit0Flags>("72").unwrap(), flags);
        assert_eq!(serde_json::to_string(&SamFlags::TY).unwrap(), "32768");
        assert_eq!(serde_json::to_string(&GimeRomMap::Internal32K).unwrap(), "2");
        assert!(serde_json::from_str::<GimeRomMap>("1").is_err());
        assert!(serde_json::from_str::<CpuLineFlags>("16").is_err());
    }
}
