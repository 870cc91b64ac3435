/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The Dragon Beta memory mapper: 16 task registers of 16 page registers each.
use core::convert::TryFrom;
use core::fmt;
use core::ops::RangeInclusive;
use core::str::FromStr;
use std::rc::Rc;

use log::{debug, trace};
#[cfg(feature = "snapshot")]
use ::serde::{Serialize, Deserialize};

use super::{
    MemoryMapper, MemoryError, Result, BankRoute, BankRoutes, PageTable, SharedRom,
    alloc_mem, MEM4K_SIZE, MEM16K_SIZE, MEM64K_SIZE, MEM256K_SIZE, MEM512K_SIZE, MEM768K_SIZE
};

#[cfg(feature = "snapshot")]
mod serde;

/// The size of a single Beta page.
pub const BETA_PAGE_SIZE: usize = MEM4K_SIZE;
/// The size of the boot ROM.
pub const BETA_ROM_SIZE: usize = MEM16K_SIZE;
/// The page table row used when paging is disabled.
pub const BETA_DEFAULT_TASK: usize = 16;
/// The route of the `0xFF00-0xFFFF` page.
pub const BETA_VECTORS_ROUTE: usize = 16;
/// The offset of the `0xFF00-0xFFFF` page within the last page.
pub const BETA_VECTORS_OFFSET: usize = 0xF00;
/// Page values from this one up select a ROM page.
pub const BETA_ROM_FIRST_PAGE: u8 = 0xFC;
/// The default task row, mapping the boot ROM at the top of the address space.
pub const BETA_DEFAULT_PAGES: [u8; NUM_BLOCKS] = [
    0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0x18, 0xC0,
    0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xFF, 0xFE
];

const NUM_TASKS: usize = 17;
const NUM_BLOCKS: usize = 16;
const NUM_ROUTES: usize = 17;
const TASK_MASK: usize = 0x0F;

/// The amount of RAM installed in a Dragon Beta.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(try_from = "u8", into = "u8"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BetaRamSize {
    #[default]
    Ram256K,
    Ram512K,
    Ram768K
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU8BetaRamSizeError(pub u8);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseBetaRamSizeError;

/// The Dragon Beta memory mapper.
///
/// Each of the 16 logical 4K pages of the CPU address space is routed through the page
/// register of the selected task. Page register values below the number of installed
/// 4K RAM pages select RAM, values `0xFC-0xFF` select one of the 4 ROM pages.
///
/// The last page is split: `0xFC00-0xFEFF` belongs to the I/O window and `0xFF00-0xFFFF`
/// is served by the additional route [BETA_VECTORS_ROUTE] resolved from page 15.
///
/// The page table row [BETA_DEFAULT_TASK] is live while paging is disabled.
#[derive(Clone)]
#[cfg_attr(feature = "snapshot", derive(Serialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct BetaMemory {
    #[cfg_attr(feature = "snapshot", serde(serialize_with = "super::serde::serialize_mem"))]
    ram: Box<[u8]>,
    #[cfg_attr(feature = "snapshot", serde(serialize_with = "super::serde::serialize_mem"))]
    rom: SharedRom,
    ram_size: BetaRamSize,
    page_table: PageTable<NUM_TASKS, NUM_BLOCKS>,
    task: usize,
    paging: bool,
    #[cfg_attr(feature = "snapshot", serde(skip))]
    routes: BankRoutes<NUM_ROUTES>
}

impl BetaRamSize {
    /// Returns the size in bytes.
    pub fn size(self) -> usize {
        match self {
            BetaRamSize::Ram256K => MEM256K_SIZE,
            BetaRamSize::Ram512K => MEM512K_SIZE,
            BetaRamSize::Ram768K => MEM768K_SIZE
        }
    }
    /// Returns the number of installed 4K pages.
    pub fn pages(self) -> usize {
        self.size() / BETA_PAGE_SIZE
    }
}

impl From<BetaRamSize> for u8 {
    /// Converts to the number of 64K banks.
    fn from(size: BetaRamSize) -> u8 {
        (size.size() / MEM64K_SIZE) as u8
    }
}

impl TryFrom<u8> for BetaRamSize {
    type Error = TryFromU8BetaRamSizeError;
    /// Converts from the number of 64K banks.
    fn try_from(banks: u8) -> core::result::Result<Self, Self::Error> {
        Ok(match banks {
            4 => BetaRamSize::Ram256K,
            8 => BetaRamSize::Ram512K,
            12 => BetaRamSize::Ram768K,
            _ => return Err(TryFromU8BetaRamSizeError(banks))
        })
    }
}

impl std::error::Error for TryFromU8BetaRamSizeError {}

impl fmt::Display for TryFromU8BetaRamSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) out of range for `BetaRamSize`", self.0)
    }
}

impl std::error::Error for ParseBetaRamSizeError {}

impl fmt::Display for ParseBetaRamSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `BetaRamSize`: unrecognized string")
    }
}

impl FromStr for BetaRamSize {
    type Err = ParseBetaRamSizeError;
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        [BetaRamSize::Ram256K, BetaRamSize::Ram512K, BetaRamSize::Ram768K].iter()
            .find(|size| s.eq_ignore_ascii_case(<&str>::from(**size)))
            .copied()
            .ok_or(ParseBetaRamSizeError)
    }
}

impl From<BetaRamSize> for &str {
    fn from(size: BetaRamSize) -> Self {
        match size {
            BetaRamSize::Ram256K => "256k",
            BetaRamSize::Ram512K => "512k",
            BetaRamSize::Ram768K => "768k"
        }
    }
}

impl fmt::Display for BetaRamSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <&str>::from(*self).fmt(f)
    }
}

impl Default for BetaMemory {
    fn default() -> Self {
        let size = BetaRamSize::default();
        BetaMemory::build(size, alloc_mem(size.size(), 0), Rc::from(alloc_mem(BETA_ROM_SIZE, u8::MAX)))
    }
}

impl fmt::Debug for BetaMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BetaMemory")
            .field("ram_size", &self.ram_size)
            .field("page_table", &self.page_table)
            .field("task", &self.task)
            .field("paging", &self.paging)
            .field("routes", &self.routes)
            .finish()
    }
}

impl BetaMemory {
    /// Creates a new mapper with the boot ROM image which must be exactly 16K.
    pub fn new(ram_size: BetaRamSize, rom: &[u8]) -> Result<Self> {
        Self::with_rom(ram_size, Rc::from(rom))
    }
    /// Creates a new mapper sharing the given boot ROM.
    pub fn with_rom(ram_size: BetaRamSize, rom: SharedRom) -> Result<Self> {
        if rom.len() != BETA_ROM_SIZE {
            return Err(MemoryError::InvalidRomSize)
        }
        Ok(Self::build(ram_size, alloc_mem(ram_size.size(), 0), rom))
    }

    fn build(ram_size: BetaRamSize, ram: Box<[u8]>, rom: SharedRom) -> Self {
        let mut mem = BetaMemory {
            ram, rom, ram_size,
            page_table: Self::default_page_table(),
            task: 0,
            paging: false,
            routes: BankRoutes::default()
        };
        mem.sync(0..=BETA_VECTORS_ROUTE);
        mem
    }

    fn default_page_table() -> PageTable<NUM_TASKS, NUM_BLOCKS> {
        let mut table = PageTable::filled(0);
        if let Some(row) = table.row_mut(BETA_DEFAULT_TASK) {
            *row = BETA_DEFAULT_PAGES;
        }
        table
    }

    pub fn ram_size(&self) -> BetaRamSize {
        self.ram_size
    }
    /// Decodes a page register value.
    pub fn page_route(&self, value: u8) -> BankRoute {
        if (value as usize) < self.ram_size.pages() {
            BankRoute::ram(value as usize * BETA_PAGE_SIZE)
        }
        else if value >= BETA_ROM_FIRST_PAGE {
            BankRoute::rom((value - BETA_ROM_FIRST_PAGE) as usize * BETA_PAGE_SIZE)
        }
        else {
            BankRoute::rom(0)
        }
    }
    /// Returns a shared reference to the boot ROM.
    pub fn shared_rom(&self) -> SharedRom {
        Rc::clone(&self.rom)
    }
}

impl MemoryMapper for BetaMemory {
    const BLOCK_SIZE: usize = BETA_PAGE_SIZE;
    const TASKS: usize = NUM_TASKS;
    const BLOCKS: usize = NUM_BLOCKS;
    const ROUTES: usize = NUM_ROUTES;
    const DEFAULT_TASK: usize = BETA_DEFAULT_TASK;

    fn reset(&mut self) {
        self.page_table = Self::default_page_table();
        self.task = 0;
        self.paging = false;
        self.sync(0..=BETA_VECTORS_ROUTE);
    }

    fn configure(&mut self, task: usize, block: usize, value: u8) {
        debug_assert!(task < BETA_DEFAULT_TASK, "task {} is not programmable", task);
        if task >= BETA_DEFAULT_TASK {
            return
        }
        if !self.page_table.configure(task, block, value) {
            return
        }
        if self.paging && self.task == task {
            if block == NUM_BLOCKS - 1 {
                self.sync(block..=BETA_VECTORS_ROUTE);
            }
            else {
                self.sync(block..=block);
            }
        }
    }

    #[inline]
    fn page_entry(&self, task: usize, block: usize) -> Option<u8> {
        self.page_table.get(task, block)
    }

    fn resolve(&self, task: usize, block: usize) -> BankRoute {
        if block == BETA_VECTORS_ROUTE {
            return self.resolve(task, NUM_BLOCKS - 1).advance(BETA_VECTORS_OFFSET)
        }
        match self.page_table.get(task, block) {
            Some(value) => self.page_route(value),
            None => {
                debug_assert!(false, "task {} page {} out of range", task, block);
                BankRoute::Unmapped
            }
        }
    }

    fn set_task(&mut self, task: usize) {
        let task = task & TASK_MASK;
        debug!("beta task: {} -> {}", self.task, task);
        self.task = task;
        self.sync(0..=BETA_VECTORS_ROUTE);
    }

    fn set_paging_enabled(&mut self, enabled: bool) {
        debug!("beta paging enabled: {}", enabled);
        self.paging = enabled;
        self.sync(0..=BETA_VECTORS_ROUTE);
    }

    #[inline]
    fn selected_task(&self) -> usize {
        self.task
    }

    #[inline]
    fn current_task(&self) -> usize {
        if self.paging {
            self.task
        }
        else {
            BETA_DEFAULT_TASK
        }
    }

    #[inline]
    fn is_paging_enabled(&self) -> bool {
        self.paging
    }

    #[inline]
    fn route(&self, route: usize) -> BankRoute {
        self.routes.get(route)
    }

    fn sync(&mut self, routes: RangeInclusive<usize>) {
        let task = self.current_task();
        let mut table = self.routes;
        table.sync(routes, |route| {
            let target = self.resolve(task, route);
            trace!("beta route {}: {:?}", route, target);
            target
        });
        self.routes = table;
    }

    #[inline]
    fn route_at(address: u16) -> Option<(usize, usize)> {
        match address {
            0x0000..=0xFBFF => Some(((address >> 12) as usize, (address & 0x0FFF) as usize)),
            0xFF00..=0xFFFF => Some((BETA_VECTORS_ROUTE, (address & 0xFF) as usize)),
            _ => None
        }
    }

    #[inline]
    fn read_route(&self, route: usize, offset: usize) -> u8 {
        self.routes.read(route, offset, &self.ram, &self.rom)
    }

    #[inline]
    fn write_route(&mut self, route: usize, offset: usize, val: u8) -> bool {
        self.routes.write(route, offset, val, &mut self.ram)
    }

    #[inline]
    fn ram_ref(&self) -> &[u8] {
        &self.ram
    }

    #[inline]
    fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    #[inline]
    fn rom_ref(&self) -> &[u8] {
        &self.rom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rom() -> Vec<u8> {
        (0..BETA_ROM_SIZE).map(|i| (i >> 12) as u8 | 0xA0).collect()
    }

    #[test]
    fn beta_ram_size_works() {
        assert_eq!(BetaRamSize::default().pages(), 64);
        assert_eq!(BetaRamSize::Ram768K.pages(), 192);
        assert_eq!("768K".parse::<BetaRamSize>(), Ok(BetaRamSize::Ram768K));
        assert_eq!("1m".parse::<BetaRamSize>(), Err(ParseBetaRamSizeError));
        assert_eq!(BetaRamSize::try_from(12), Ok(BetaRamSize::Ram768K));
        assert_eq!(BetaRamSize::try_from(3), Err(TryFromU8BetaRamSizeError(3)));
        assert_eq!(u8::from(BetaRamSize::Ram512K), 8);
    }

    #[test]
    fn beta_power_on_works() {
        assert!(BetaMemory::new(BetaRamSize::Ram256K, &[0; 100]).is_err());
        let mem = BetaMemory::new(BetaRamSize::Ram256K, &test_rom()).unwrap();
        assert_eq!(mem.current_task(), BETA_DEFAULT_TASK);
        assert_eq!(mem.route(6), BankRoute::ram(0x18 * BETA_PAGE_SIZE));
        assert_eq!(mem.route(14), BankRoute::rom(3 * BETA_PAGE_SIZE));
        assert_eq!(mem.route(15), BankRoute::rom(2 * BETA_PAGE_SIZE));
        assert_eq!(mem.route(BETA_VECTORS_ROUTE), BankRoute::rom(2 * BETA_PAGE_SIZE + 0xF00));
        // 0xC0 is neither installed RAM nor ROM
        assert_eq!(mem.route(0), BankRoute::rom(0));
        assert_eq!(mem.read(0xE000), 0xA3);
        assert_eq!(mem.read(0xFFFE), 0xA2);
        assert_eq!(mem.read(0xFC00), 0xFF);
    }

    #[test]
    fn beta_page_decode_works() {
        let mem = BetaMemory::new(BetaRamSize::Ram768K, &test_rom()).unwrap();
        assert_eq!(mem.page_route(0x00), BankRoute::ram(0));
        assert_eq!(mem.page_route(0xBF), BankRoute::ram(0xBF * BETA_PAGE_SIZE));
        assert_eq!(mem.page_route(0xC0), BankRoute::rom(0));
        assert_eq!(mem.page_route(0xFC), BankRoute::rom(0));
        assert_eq!(mem.page_route(0xFD), BankRoute::rom(BETA_PAGE_SIZE));
        let mem = BetaMemory::new(BetaRamSize::Ram256K, &test_rom()).unwrap();
        assert_eq!(mem.page_route(0x40), BankRoute::rom(0));
    }

    #[test]
    fn beta_task_switch_works() {
        let mut mem = BetaMemory::new(BetaRamSize::Ram256K, &test_rom()).unwrap();
        for page in 0..16 {
            mem.configure(3, page, 0x20 + page as u8);
        }
        assert_eq!(mem.route(0), BankRoute::rom(0));
        mem.set_task(0x13);
        assert_eq!(mem.selected_task(), 3);
        assert_eq!(mem.route(0), BankRoute::rom(0));
        mem.set_paging_enabled(true);
        assert_eq!(mem.current_task(), 3);
        for page in 0..16 {
            assert_eq!(mem.route(page), BankRoute::ram((0x20 + page) * BETA_PAGE_SIZE));
        }
        assert_eq!(mem.route(BETA_VECTORS_ROUTE), BankRoute::ram(0x2F * BETA_PAGE_SIZE + 0xF00));
        assert!(mem.write(0x1234, 0x77));
        assert_eq!(mem.ram_ref()[0x21 * BETA_PAGE_SIZE + 0x234], 0x77);
        mem.configure(3, 15, 0xFF);
        assert_eq!(mem.route(BETA_VECTORS_ROUTE), BankRoute::rom(3 * BETA_PAGE_SIZE + 0xF00));
        assert!(!mem.write(0xFFF0, 0));
        mem.configure(4, 0, 0x00);
        assert_eq!(mem.route(0), BankRoute::ram(0x20 * BETA_PAGE_SIZE));
        mem.set_paging_enabled(false);
        assert_eq!(mem.route(6), BankRoute::ram(0x18 * BETA_PAGE_SIZE));
        mem.reset();
        assert_eq!(mem.page_entry(3, 0), Some(0));
        assert_eq!(mem.selected_task(), 0);
        assert!(!mem.is_paging_enabled());
    }

    #[test]
    fn beta_resolve_all_works() {
        let mem = BetaMemory::new(BetaRamSize::Ram512K, &test_rom()).unwrap();
        let routes = mem.resolve_all(BETA_DEFAULT_TASK);
        assert_eq!(routes.len(), NUM_ROUTES);
        assert_eq!(&routes[..], mem.routes.as_slice());
    }
}
