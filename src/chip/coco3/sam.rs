/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::chip::SamFlags;

/// The MC6883 SAM compatibility registers at `0xFFC0-0xFFDF`.
///
/// Each register bit is controlled by an address pair: a write to the even address clears
/// and a write to the odd address sets the bit. The written data is ignored.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(transparent))]
pub struct Sam {
    flags: SamFlags
}

impl Sam {
    #[inline]
    pub fn flags(&self) -> SamFlags {
        self.flags
    }

    pub fn reset(&mut self) {
        self.flags = SamFlags::empty();
    }
    /// Applies a write to the register at `0xFFC0 + offset`.
    ///
    /// Returns `Some(all_ram)` if the map type bit has changed.
    pub fn write(&mut self, offset: u16) -> Option<bool> {
        let (flag, set) = SamFlags::from_register_offset(offset);
        let prev = self.flags;
        self.flags.set(flag, set);
        if (prev ^ self.flags).intersects(SamFlags::TY) {
            Some(self.flags.is_all_ram())
        }
        else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sam_works() {
        let mut sam = Sam::default();
        assert_eq!(sam.write(0x01), None);
        assert_eq!(sam.flags(), SamFlags::V0);
        assert_eq!(sam.write(0x1F), Some(true));
        assert_eq!(sam.write(0x1F), None);
        assert!(sam.flags().is_all_ram());
        assert_eq!(sam.write(0x17), None);
        assert_eq!(sam.flags().cpu_rate(), 1);
        assert_eq!(sam.write(0x1E), Some(false));
        assert_eq!(sam.write(0x00), None);
        assert_eq!(sam.flags(), SamFlags::R0);
        sam.reset();
        assert_eq!(sam.flags(), SamFlags::empty());
    }
}
