/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Memory mappers of the emulated machines.
mod beta;
mod gime;

pub use dragonmmu_core::memory::*;
pub use beta::*;
pub use gime::*;
