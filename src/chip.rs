/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Chipset emulation of the supported machines.
pub mod beta;
pub mod coco3;

pub use dragonmmu_core::chip::*;
