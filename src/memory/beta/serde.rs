/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
use ::serde::{Deserialize, Deserializer, de};

use super::{
    BetaMemory, BetaRamSize, PageTable, BankRoutes, SharedRom, MemoryMapper,
    BETA_ROM_SIZE, BETA_VECTORS_ROUTE, NUM_TASKS, NUM_BLOCKS, TASK_MASK
};
use crate::memory::serde::deserialize_mem;

impl<'de> Deserialize<'de> for BetaMemory {
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
            ram_size: BetaRamSize,
            page_table: PageTable<NUM_TASKS, NUM_BLOCKS>,
            task: usize,
            paging: bool
        }

        let MemTemp { ram, rom, ram_size, page_table, task, paging } = Deserialize::deserialize(deserializer)?;
        if ram.len() != ram_size.size() {
            return Err(de::Error::custom(format!("beta ram size: {} != expected {}",
                                                    ram.len(), ram_size.size())));
        }
        if rom.len() != BETA_ROM_SIZE {
            return Err(de::Error::custom(format!("beta rom size: {} != expected {}",
                                                    rom.len(), BETA_ROM_SIZE)));
        }
        if task > TASK_MASK {
            return Err(de::Error::custom(format!("beta task: {} larger than max: {}", task, TASK_MASK)));
        }

        let mut res = BetaMemory {
            ram, rom, ram_size, page_table, task, paging,
            routes: BankRoutes::default()
        };
        res.sync(0..=BETA_VECTORS_ROUTE);
        Ok(res)
    }
}
