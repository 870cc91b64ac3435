/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! System bus devices to be attached to the expansion areas of the emulated machines.
pub use dragonmmu_core::bus::*;
pub use crate::peripherals::keylatch::{
    KeyLatch, Coco3KeyLatch, BetaKeyLatch, Coco3KeyLatchAddress, BetaKeyLatchAddress
};
