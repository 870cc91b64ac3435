/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Emulators of peripheral chips and devices shared by the emulated machines.
mod keyboard;
pub mod keylatch;
pub mod pia;

pub use keyboard::*;
