/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

/// The CoCo 3 keyboard: 8 columns strobed by PIA0 port B, 7 rows sensed on PIA0 port A.
pub type Coco3KeyMatrix = KeyMatrix<8>;
/// The Dragon Beta keyboard: 10 rows selected by the keyboard shift register, 8 sense lines.
pub type BetaKeyMatrix = KeyMatrix<10>;

/// A switch matrix of `N` select lines with 8 sense lines each.
///
/// Each select line holds a bit mask of the pressed keys in its sense lines.
/// Scanning is active low on both sides: zero bits of the select mask drive the selected
/// lines low and pressed keys pull the respective sense lines low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(transparent))]
pub struct KeyMatrix<const N: usize> {
    #[cfg_attr(feature = "snapshot", serde(with = "crate::memory::arrays"))]
    lines: [u8; N]
}

/// An interface for updating the state of the keyboard of the emulated machine.
pub trait KeyboardInterface {
    type KeyMatrix;
    /// Returns the current state of the keyboard.
    fn get_key_state(&self) -> Self::KeyMatrix;
    /// Sets the state of the keyboard. The new state is visible to the next scan.
    fn set_key_state(&mut self, keymap: Self::KeyMatrix);
}

impl<const N: usize> Default for KeyMatrix<N> {
    fn default() -> Self {
        KeyMatrix { lines: [0; N] }
    }
}

impl<const N: usize> KeyMatrix<N> {
    pub const LINES: usize = N;

    pub fn new() -> Self {
        Self::default()
    }
    /// Presses or releases the key at the given select `line` and sense `bit`.
    ///
    /// Indices out of range are ignored.
    pub fn set_key(&mut self, line: usize, bit: u8, pressed: bool) {
        if let Some(keys) = self.lines.get_mut(line) {
            let mask = 1u8.checked_shl(bit.into()).unwrap_or(0);
            if pressed {
                *keys |= mask;
            }
            else {
                *keys &= !mask;
            }
        }
    }

    pub fn is_pressed(&self, line: usize, bit: u8) -> bool {
        let mask = 1u8.checked_shl(bit.into()).unwrap_or(0);
        self.lines.get(line).map_or(false, |keys| keys & mask != 0)
    }
    /// Returns the pressed keys of a single select line.
    pub fn line(&self, line: usize) -> u8 {
        self.lines.get(line).copied().unwrap_or(0)
    }
    /// Releases all keys.
    pub fn clear(&mut self) {
        self.lines = [0; N];
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|&keys| keys == 0)
    }
    /// Returns the levels of the sense lines with the active low `select` mask.
    pub fn scan(&self, select: u16) -> u8 {
        !self.lines.iter().enumerate()
            .filter(|&(line, _)| select & (1 << line) == 0)
            .fold(0, |acc, (_, &keys)| acc | keys)
    }
}
