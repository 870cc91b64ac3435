/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
use ::serde::{Deserialize, Deserializer, de};

use dragonmmu_core::chip::GimeInit0Flags;
use super::{
    GimeMemory, GimeRamSize, PageTable, BankRoutes, SharedRom, MemoryMapper,
    GIME_ROM_SIZE, GIME_FEXX_ROUTE, NUM_TASKS, NUM_BLOCKS, MODE_MASK
};
use crate::memory::serde::deserialize_mem;

impl<'de> Deserialize<'de> for GimeMemory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de>
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MemTemp {
            #[serde(deserialize_with = "deserialize_mem")]
            ram: Box<[u8]>,
            #[serde(deserialize_with = "deserialize_mem")]
            rom: SharedRom,
            ram_size: GimeRamSize,
            page_table: PageTable<NUM_TASKS, NUM_BLOCKS>,
            mode: GimeInit0Flags,
            task: usize,
            all_ram: bool
        }

        let MemTemp { ram, rom, ram_size, page_table, mode, task, all_ram } = Deserialize::deserialize(deserializer)?;
        if ram.len() != ram_size.size() {
            return Err(de::Error::custom(format!("gime ram size: {} != expected {}",
                                                    ram.len(), ram_size.size())));
        }
        if rom.len() != GIME_ROM_SIZE {
            return Err(de::Error::custom(format!("gime rom size: {} != expected {}",
                                                    rom.len(), GIME_ROM_SIZE)));
        }
        if task > 1 {
            return Err(de::Error::custom(format!("gime task: {} larger than max: 1", task)));
        }

        let mut res = GimeMemory {
            ram, rom, ram_size, page_table,
            mode: mode & MODE_MASK,
            task,
            all_ram,
            routes: BankRoutes::default()
        };
        res.sync(0..=GIME_FEXX_ROUTE);
        Ok(res)
    }
}
