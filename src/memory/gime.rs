/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The Tandy Color Computer 3 memory mapper: MC6883 SAM map type and GIME MMU.
use core::convert::TryFrom;
use core::fmt;
use core::ops::RangeInclusive;
use core::str::FromStr;
use std::rc::Rc;

use log::{debug, trace};
#[cfg(feature = "snapshot")]
use ::serde::{Serialize, Deserialize};

use dragonmmu_core::chip::{GimeInit0Flags, GimeRomMap};
use super::{
    MemoryMapper, MemoryError, Result, BankRoute, BankRoutes, PageTable, SharedRom,
    alloc_mem, MEM8K_SIZE, MEM32K_SIZE, MEM64K_SIZE, MEM128K_SIZE, MEM512K_SIZE
};

#[cfg(feature = "snapshot")]
mod serde;

/// The size of a single GIME physical block.
pub const GIME_BLOCK_SIZE: usize = MEM8K_SIZE;
/// The size of the ROM buffer: internal ROM followed by the cartridge ROM window.
pub const GIME_ROM_SIZE: usize = MEM64K_SIZE;
/// The size of the internal ROM image.
pub const GIME_INTERNAL_ROM_SIZE: usize = MEM32K_SIZE;
/// The maximum size of a cartridge ROM image.
pub const GIME_CARTRIDGE_ROM_MAX_SIZE: usize = MEM32K_SIZE;
/// The offset of the cartridge ROM window in the ROM buffer.
pub const GIME_CARTRIDGE_ROM_OFFSET: usize = GIME_INTERNAL_ROM_SIZE;

/// The page table row used when the MMU is disabled.
pub const GIME_DEFAULT_TASK: usize = 2;
/// The route of the `0xFE00-0xFEFF` page.
pub const GIME_FEXX_ROUTE: usize = 8;
/// Physical block numbers are 6-bit.
pub const GIME_BLOCK_MASK: u8 = 0x3F;
/// The block the `0xFE00-0xFEFF` page is held constant to with `MC3` set.
pub const GIME_FEXX_BLOCK: u8 = 0x3F;
/// The offset of the `0xFE00-0xFEFF` page within its block.
pub const GIME_FEXX_OFFSET: usize = 0x1E00;
/// The first block overlaid by ROM unless the SAM map type selects all RAM.
pub const GIME_ROM_FIRST_BLOCK: u8 = 0x3C;

const NUM_TASKS: usize = 3;
const NUM_BLOCKS: usize = 8;
const NUM_ROUTES: usize = 9;
const NUM_PHYS_BLOCKS: usize = 64;
const MODE_MASK: GimeInit0Flags = GimeInit0Flags::MMU_ENABLE
                                  .union(GimeInit0Flags::CONST_FEXX)
                                  .union(GimeInit0Flags::ROM_MAP_MASK);

/// The amount of RAM installed in a CoCo 3.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(try_from = "u8", into = "u8"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GimeRamSize {
    Ram128K,
    #[default]
    Ram512K
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU8GimeRamSizeError(pub u8);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseGimeRamSizeError;

/// The CoCo 3 memory mapper.
///
/// RAM is addressed as 8K blocks `0x00-0x3F`, installed RAM occupies the top blocks.
/// The CPU address space is divided into 9 routes:
///
/// | Route | Start  | Top    | Page table entry             |
/// |-------|--------|--------|------------------------------|
/// | 0-6   | 0x0000 | 0xDFFF | `route`                      |
/// | 7     | 0xE000 | 0xFDFF | 7                            |
/// | 8     | 0xFE00 | 0xFEFF | 7 or block `0x3F` with `MC3` |
///
/// `0xFF00-0xFFFF` is the I/O window handled by the chipset.
///
/// The page table has 3 rows: the GIME task register sets 0 and 1 and the default task
/// [GIME_DEFAULT_TASK] mapping blocks `0x38-0x3F`, live while the MMU is disabled.
#[derive(Clone)]
#[cfg_attr(feature = "snapshot", derive(Serialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct GimeMemory {
    #[cfg_attr(feature = "snapshot", serde(serialize_with = "super::serde::serialize_mem"))]
    ram: Box<[u8]>,
    #[cfg_attr(feature = "snapshot", serde(serialize_with = "super::serde::serialize_mem"))]
    rom: SharedRom,
    ram_size: GimeRamSize,
    page_table: PageTable<NUM_TASKS, NUM_BLOCKS>,
    mode: GimeInit0Flags,
    task: usize,
    all_ram: bool,
    #[cfg_attr(feature = "snapshot", serde(skip))]
    routes: BankRoutes<NUM_ROUTES>
}

impl GimeRamSize {
    /// Returns the size in bytes.
    pub fn size(self) -> usize {
        match self {
            GimeRamSize::Ram128K => MEM128K_SIZE,
            GimeRamSize::Ram512K => MEM512K_SIZE
        }
    }
    /// Returns the number of installed 8K blocks.
    pub fn blocks(self) -> usize {
        self.size() / GIME_BLOCK_SIZE
    }
    /// Returns the lowest installed block number.
    pub fn first_block(self) -> u8 {
        (NUM_PHYS_BLOCKS - self.blocks()) as u8
    }
}

impl From<GimeRamSize> for u8 {
    /// Converts to the number of 64K banks.
    fn from(size: GimeRamSize) -> u8 {
        (size.size() / MEM64K_SIZE) as u8
    }
}

impl TryFrom<u8> for GimeRamSize {
    type Error = TryFromU8GimeRamSizeError;
    /// Converts from the number of 64K banks.
    fn try_from(banks: u8) -> core::result::Result<Self, Self::Error> {
        Ok(match banks {
            2 => GimeRamSize::Ram128K,
            8 => GimeRamSize::Ram512K,
            _ => return Err(TryFromU8GimeRamSizeError(banks))
        })
    }
}

impl std::error::Error for TryFromU8GimeRamSizeError {}

impl fmt::Display for TryFromU8GimeRamSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) out of range for `GimeRamSize`", self.0)
    }
}

impl std::error::Error for ParseGimeRamSizeError {}

impl fmt::Display for ParseGimeRamSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `GimeRamSize`: unrecognized string")
    }
}

impl FromStr for GimeRamSize {
    type Err = ParseGimeRamSizeError;
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("128k") {
            Ok(GimeRamSize::Ram128K)
        }
        else if s.eq_ignore_ascii_case("512k") {
            Ok(GimeRamSize::Ram512K)
        }
        else {
            Err(ParseGimeRamSizeError)
        }
    }
}

impl From<GimeRamSize> for &str {
    fn from(size: GimeRamSize) -> Self {
        match size {
            GimeRamSize::Ram128K => "128k",
            GimeRamSize::Ram512K => "512k"
        }
    }
}

impl fmt::Display for GimeRamSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <&str>::from(*self).fmt(f)
    }
}

impl Default for GimeMemory {
    fn default() -> Self {
        let rom: SharedRom = Rc::from(alloc_mem(GIME_ROM_SIZE, u8::MAX));
        GimeMemory::build(GimeRamSize::default(), alloc_mem(GimeRamSize::default().size(), 0), rom)
    }
}

impl fmt::Debug for GimeMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GimeMemory")
            .field("ram_size", &self.ram_size)
            .field("page_table", &self.page_table)
            .field("mode", &self.mode)
            .field("task", &self.task)
            .field("all_ram", &self.all_ram)
            .field("routes", &self.routes)
            .finish()
    }
}

impl GimeMemory {
    /// Creates a new mapper with the internal ROM image and an optional cartridge ROM image.
    ///
    /// The internal ROM must be exactly 32K. A cartridge image of up to 32K is mirrored
    /// over the whole cartridge window, which reads `0xFF` without a cartridge.
    pub fn new(ram_size: GimeRamSize, internal_rom: &[u8], cartridge_rom: Option<&[u8]>) -> Result<Self> {
        if internal_rom.len() != GIME_INTERNAL_ROM_SIZE {
            return Err(MemoryError::InvalidRomSize)
        }
        let mut rom = alloc_mem(GIME_ROM_SIZE, u8::MAX);
        rom[..GIME_CARTRIDGE_ROM_OFFSET].copy_from_slice(internal_rom);
        if let Some(cart) = cartridge_rom {
            if cart.is_empty() || cart.len() > GIME_CARTRIDGE_ROM_MAX_SIZE {
                return Err(MemoryError::InvalidRomSize)
            }
            for chunk in rom[GIME_CARTRIDGE_ROM_OFFSET..].chunks_mut(cart.len()) {
                chunk.copy_from_slice(&cart[..chunk.len()]);
            }
        }
        Self::with_rom(ram_size, Rc::from(rom))
    }
    /// Creates a new mapper sharing an already assembled 64K ROM buffer.
    pub fn with_rom(ram_size: GimeRamSize, rom: SharedRom) -> Result<Self> {
        if rom.len() != GIME_ROM_SIZE {
            return Err(MemoryError::InvalidRomSize)
        }
        Ok(Self::build(ram_size, alloc_mem(ram_size.size(), 0), rom))
    }

    fn build(ram_size: GimeRamSize, ram: Box<[u8]>, rom: SharedRom) -> Self {
        let mut mem = GimeMemory {
            ram, rom, ram_size,
            page_table: Self::default_page_table(),
            mode: GimeInit0Flags::empty(),
            task: 0,
            all_ram: false,
            routes: BankRoutes::default()
        };
        mem.sync(0..=GIME_FEXX_ROUTE);
        mem
    }

    fn default_page_table() -> PageTable<NUM_TASKS, NUM_BLOCKS> {
        let mut table = PageTable::filled(0);
        for task in 0..NUM_TASKS {
            if let Some(row) = table.row_mut(task) {
                for (entry, block) in row.iter_mut().zip(0x38..) {
                    *entry = block;
                }
            }
        }
        table
    }

    pub fn ram_size(&self) -> GimeRamSize {
        self.ram_size
    }
    /// Returns the mode bits: `MMU`, `MC3` and the ROM map of INIT0.
    pub fn mode(&self) -> GimeInit0Flags {
        self.mode
    }
    /// Applies the mapping relevant bits of INIT0 and synchronizes all routes if any has changed.
    pub fn set_mode(&mut self, init0: GimeInit0Flags) {
        let mode = init0 & MODE_MASK;
        if mode != self.mode {
            debug!("gime mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.sync(0..=GIME_FEXX_ROUTE);
        }
    }
    /// Holds the `0xFE00-0xFEFF` page to the RAM block `0x3F`.
    pub fn set_const_fexx(&mut self, enabled: bool) {
        let mut mode = self.mode;
        mode.set(GimeInit0Flags::CONST_FEXX, enabled);
        self.set_mode(mode)
    }

    pub fn set_rom_map(&mut self, map: GimeRomMap) {
        self.set_mode(self.mode.with_rom_map(map))
    }
    /// Returns `true` if the SAM map type selects all RAM.
    pub fn is_all_ram(&self) -> bool {
        self.all_ram
    }
    /// Sets the SAM map type: `false` overlays blocks `0x3C-0x3F` with ROM.
    pub fn set_all_ram(&mut self, all_ram: bool) {
        debug!("sam map type: all ram {}", all_ram);
        self.all_ram = all_ram;
        self.sync(0..=GIME_FEXX_ROUTE);
    }
    /// Converts a physical RAM block number to a route.
    ///
    /// Blocks below the installed RAM fall back to the ROM block with the same low 2 bits.
    pub fn ram_block(&self, block: u8) -> BankRoute {
        let block = block & GIME_BLOCK_MASK;
        match block.checked_sub(self.ram_size.first_block()) {
            Some(index) => BankRoute::ram(index as usize * GIME_BLOCK_SIZE),
            None => self.rom_block(block)
        }
    }
    /// Converts one of the ROM overlaid blocks `0x3C-0x3F` to a route into the ROM buffer.
    pub fn rom_block(&self, block: u8) -> BankRoute {
        let index = (block.wrapping_sub(GIME_ROM_FIRST_BLOCK) & 3) as usize;
        let offset = match self.mode.rom_map() {
            GimeRomMap::Split16K if index < 2 => index * GIME_BLOCK_SIZE,
            GimeRomMap::Split16K => GIME_CARTRIDGE_ROM_OFFSET + (index - 2) * GIME_BLOCK_SIZE,
            GimeRomMap::Internal32K => index * GIME_BLOCK_SIZE,
            GimeRomMap::External32K => GIME_CARTRIDGE_ROM_OFFSET + index * GIME_BLOCK_SIZE
        };
        BankRoute::rom(offset)
    }
    /// Provides a view of the cartridge window of the ROM buffer.
    pub fn cartridge_rom_ref(&self) -> &[u8] {
        &self.rom[GIME_CARTRIDGE_ROM_OFFSET..]
    }
    /// Returns a shared reference to the ROM buffer.
    pub fn shared_rom(&self) -> SharedRom {
        Rc::clone(&self.rom)
    }
}

impl MemoryMapper for GimeMemory {
    const BLOCK_SIZE: usize = GIME_BLOCK_SIZE;
    const TASKS: usize = NUM_TASKS;
    const BLOCKS: usize = NUM_BLOCKS;
    const ROUTES: usize = NUM_ROUTES;
    const DEFAULT_TASK: usize = GIME_DEFAULT_TASK;

    fn reset(&mut self) {
        self.page_table = Self::default_page_table();
        self.mode = GimeInit0Flags::empty();
        self.task = 0;
        self.all_ram = false;
        self.sync(0..=GIME_FEXX_ROUTE);
    }

    fn configure(&mut self, task: usize, block: usize, value: u8) {
        debug_assert!(task < GIME_DEFAULT_TASK, "task {} is not programmable", task);
        if task >= GIME_DEFAULT_TASK {
            return
        }
        if !self.page_table.configure(task, block, value & GIME_BLOCK_MASK) {
            return
        }
        if self.current_task() == task {
            if block == NUM_BLOCKS - 1 {
                self.sync(block..=GIME_FEXX_ROUTE);
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
        if block == GIME_FEXX_ROUTE {
            if self.mode.is_const_fexx() {
                return self.ram_block(GIME_FEXX_BLOCK).advance(GIME_FEXX_OFFSET)
            }
            return self.resolve(task, NUM_BLOCKS - 1).advance(GIME_FEXX_OFFSET)
        }
        let phys = match self.page_table.get(task, block) {
            Some(value) => value & GIME_BLOCK_MASK,
            None => {
                debug_assert!(false, "task {} block {} out of range", task, block);
                return BankRoute::Unmapped
            }
        };
        if !self.all_ram && phys >= GIME_ROM_FIRST_BLOCK {
            return self.rom_block(phys)
        }
        self.ram_block(phys)
    }

    fn set_task(&mut self, task: usize) {
        debug_assert!(task < GIME_DEFAULT_TASK);
        debug!("gime task: {} -> {}", self.task, task & 1);
        self.task = task & 1;
        self.sync(0..=GIME_FEXX_ROUTE);
    }

    fn set_paging_enabled(&mut self, enabled: bool) {
        let mut mode = self.mode;
        mode.set(GimeInit0Flags::MMU_ENABLE, enabled);
        debug!("gime mmu enabled: {}", enabled);
        self.mode = mode;
        self.sync(0..=GIME_FEXX_ROUTE);
    }

    #[inline]
    fn selected_task(&self) -> usize {
        self.task
    }

    #[inline]
    fn current_task(&self) -> usize {
        if self.is_paging_enabled() {
            self.task
        }
        else {
            GIME_DEFAULT_TASK
        }
    }

    #[inline]
    fn is_paging_enabled(&self) -> bool {
        self.mode.is_mmu_enabled()
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
            trace!("gime route {}: {:?}", route, target);
            target
        });
        self.routes = table;
    }

    #[inline]
    fn route_at(address: u16) -> Option<(usize, usize)> {
        match address {
            0x0000..=0xFDFF => Some(((address >> 13) as usize, (address & 0x1FFF) as usize)),
            0xFE00..=0xFEFF => Some((GIME_FEXX_ROUTE, (address & 0xFF) as usize)),
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
        (0..GIME_INTERNAL_ROM_SIZE).map(|i| (i >> 8) as u8).collect()
    }

    #[test]
    fn gime_ram_size_works() {
        assert_eq!(GimeRamSize::default(), GimeRamSize::Ram512K);
        assert_eq!(GimeRamSize::Ram128K.first_block(), 0x30);
        assert_eq!(GimeRamSize::Ram512K.first_block(), 0x00);
        assert_eq!("128K".parse::<GimeRamSize>(), Ok(GimeRamSize::Ram128K));
        assert_eq!("512k".parse::<GimeRamSize>(), Ok(GimeRamSize::Ram512K));
        assert_eq!("64k".parse::<GimeRamSize>(), Err(ParseGimeRamSizeError));
        assert_eq!(GimeRamSize::try_from(2), Ok(GimeRamSize::Ram128K));
        assert_eq!(GimeRamSize::try_from(4), Err(TryFromU8GimeRamSizeError(4)));
        assert_eq!(u8::from(GimeRamSize::Ram512K), 8);
        assert_eq!(GimeRamSize::Ram128K.to_string(), "128k");
    }

    #[test]
    fn gime_rom_validation_works() {
        assert!(GimeMemory::new(GimeRamSize::Ram128K, &[0; 100], None).is_err());
        assert!(GimeMemory::new(GimeRamSize::Ram128K, &test_rom(), Some(&[])).is_err());
        assert!(GimeMemory::new(GimeRamSize::Ram128K, &test_rom(), Some(&[0; 0x8001])).is_err());
        assert!(GimeMemory::with_rom(GimeRamSize::Ram128K, Rc::from(vec![0; 10])).is_err());
        let mem = GimeMemory::new(GimeRamSize::Ram128K, &test_rom(), Some(&[1, 2, 3, 4])).unwrap();
        assert_eq!(mem.ram_ref().len(), MEM128K_SIZE);
        assert_eq!(&mem.cartridge_rom_ref()[..8], &[1, 2, 3, 4, 1, 2, 3, 4]);
        let mem = GimeMemory::new(GimeRamSize::Ram512K, &test_rom(), None).unwrap();
        assert!(mem.cartridge_rom_ref().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn gime_power_on_works() {
        let mem = GimeMemory::new(GimeRamSize::Ram128K, &test_rom(), None).unwrap();
        assert!(!mem.is_paging_enabled());
        assert_eq!(mem.current_task(), GIME_DEFAULT_TASK);
        // blocks 0x38-0x3B are RAM at the top 32K of the installed 128K
        assert_eq!(mem.route(0), BankRoute::ram(0x08 * GIME_BLOCK_SIZE));
        assert_eq!(mem.route(3), BankRoute::ram(0x0B * GIME_BLOCK_SIZE));
        assert_eq!(mem.route(4), BankRoute::rom(0));
        assert_eq!(mem.route(5), BankRoute::rom(0x2000));
        assert_eq!(mem.route(6), BankRoute::rom(GIME_CARTRIDGE_ROM_OFFSET));
        assert_eq!(mem.route(7), BankRoute::rom(GIME_CARTRIDGE_ROM_OFFSET + 0x2000));
        assert_eq!(mem.route(8), BankRoute::rom(GIME_CARTRIDGE_ROM_OFFSET + 0x3E00));
        assert_eq!(mem.read(0x8000), 0x00);
        assert_eq!(mem.read(0x9F00), 0x1F);
        assert_eq!(mem.read(0xC000), 0xFF);
        assert_eq!(mem.read(0xFF00), 0xFF);
    }

    #[test]
    fn gime_rom_maps_work() {
        let mut mem = GimeMemory::new(GimeRamSize::Ram512K, &test_rom(), Some(&[0xAA; 0x4000])).unwrap();
        mem.set_rom_map(GimeRomMap::Internal32K);
        assert_eq!(mem.read(0xC000), 0x40);
        assert_eq!(mem.read(0xFDFF), 0x7D);
        mem.set_rom_map(GimeRomMap::External32K);
        assert_eq!(mem.read(0x8000), 0xAA);
        assert_eq!(mem.route(4), BankRoute::rom(GIME_CARTRIDGE_ROM_OFFSET));
        mem.set_all_ram(true);
        assert_eq!(mem.route(4), BankRoute::ram(0x3C * GIME_BLOCK_SIZE));
        assert!(mem.write(0x8000, 0x55));
        assert_eq!(mem.read(0x8000), 0x55);
        mem.set_all_ram(false);
        assert!(!mem.write(0x8000, 0x66));
        assert_eq!(mem.read(0x8000), 0xAA);
    }

    #[test]
    fn gime_mmu_works() {
        let mut mem = GimeMemory::new(GimeRamSize::Ram512K, &test_rom(), None).unwrap();
        mem.configure(1, 0, 0x05);
        // not live yet
        assert_eq!(mem.route(0), BankRoute::ram(0x38 * GIME_BLOCK_SIZE));
        mem.set_paging_enabled(true);
        assert_eq!(mem.current_task(), 0);
        mem.set_task(1);
        assert_eq!(mem.current_task(), 1);
        assert_eq!(mem.route(0), BankRoute::ram(5 * GIME_BLOCK_SIZE));
        assert_eq!(mem.resolve(1, 0), mem.route(0));
        mem.configure(1, 1, 0xC6);
        assert_eq!(mem.page_entry(1, 1), Some(0x06));
        assert_eq!(mem.route(1), BankRoute::ram(6 * GIME_BLOCK_SIZE));
        assert!(mem.write(0x2000, 0x99));
        assert_eq!(mem.ram_ref()[6 * GIME_BLOCK_SIZE], 0x99);
        mem.configure(1, 7, 0x10);
        assert_eq!(mem.route(7), BankRoute::ram(0x10 * GIME_BLOCK_SIZE));
        assert_eq!(mem.route(GIME_FEXX_ROUTE), BankRoute::ram(0x10 * GIME_BLOCK_SIZE + GIME_FEXX_OFFSET));
        mem.set_const_fexx(true);
        assert_eq!(mem.route(GIME_FEXX_ROUTE), BankRoute::ram(0x3F * GIME_BLOCK_SIZE + GIME_FEXX_OFFSET));
        assert!(mem.write(0xFE10, 0x42));
        assert_eq!(mem.ram_ref()[0x3F * GIME_BLOCK_SIZE + 0x1E10], 0x42);
        mem.set_paging_enabled(false);
        assert_eq!(mem.current_task(), GIME_DEFAULT_TASK);
        assert_eq!(mem.selected_task(), 1);
        assert_eq!(mem.route(0), BankRoute::ram(0x38 * GIME_BLOCK_SIZE));
        mem.reset();
        assert_eq!(mem.page_entry(1, 0), Some(0x38));
        assert_eq!(mem.mode(), GimeInit0Flags::empty());
    }

    #[test]
    fn gime_missing_ram_blocks_read_rom() {
        let mut mem = GimeMemory::new(GimeRamSize::Ram128K, &test_rom(), None).unwrap();
        mem.set_paging_enabled(true);
        mem.configure(0, 2, 0x02);
        let route = mem.resolve(0, 2);
        assert!(route.is_rom());
        assert!(!route.is_writable());
        assert_eq!(mem.route(2), route);
        // block 0x02 aliases the third ROM block, the cartridge window in the split map
        assert_eq!(route, BankRoute::rom(GIME_CARTRIDGE_ROM_OFFSET));
        assert_eq!(mem.read(0x4000), 0xFF);
        assert!(!mem.write(0x4000, 0));
        mem.configure(0, 2, 0x01);
        assert_eq!(mem.route(2), BankRoute::rom(GIME_BLOCK_SIZE));
        assert_eq!(mem.read(0x4100), 0x21);
        // the SAM all RAM map type does not install missing RAM
        mem.set_all_ram(true);
        assert_eq!(mem.route(2), BankRoute::rom(GIME_BLOCK_SIZE));
        mem.configure(0, 2, 0x30);
        assert_eq!(mem.route(2), BankRoute::ram(0));
        assert!(mem.write(0x4000, 0x5A));
        assert_eq!(mem.ram_ref()[0], 0x5A);
    }

    #[test]
    fn gime_sync_is_idempotent() {
        let mut mem = GimeMemory::new(GimeRamSize::Ram512K, &test_rom(), None).unwrap();
        mem.set_paging_enabled(true);
        mem.configure(0, 4, 0x3D);
        let before = mem.routes;
        mem.sync(0..=GIME_FEXX_ROUTE);
        mem.sync(0..=GIME_FEXX_ROUTE);
        assert_eq!(mem.routes, before);
        assert_eq!(mem.route(4), BankRoute::rom(GIME_BLOCK_SIZE));
    }
}
