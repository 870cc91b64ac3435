/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    DRAGONMMU is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    DRAGONMMU is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! DRAGONMMU is a library for building emulators of 6809 based machines with paged memory.
//!
//! The library provides the memory mapping and interrupt glue of:
//!
//! * The Tandy Color Computer 3: [chip::coco3::Coco3] with the SAM and GIME memory mapper [memory::GimeMemory].
//! * The Dragon Beta: [chip::beta::DragonBeta] with the task register memory mapper [memory::BetaMemory]
//!   and the coordination of its main and DMA-assist CPUs.
//!
//! The CPU cores are provided by the host. The host implements [chip::CpuLines] and [chip::Scheduler]
//! to receive interrupt line changes and calls into the chipsets through [chip::BusAccess].
pub mod bus;
pub mod chip;
pub mod memory;
pub mod peripherals;
