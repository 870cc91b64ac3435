/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Memory API.
//!
//! The building blocks shared by all memory mappers:
//!
//! * [PageTable] - a pure-data array of page register values, one row per task.
//! * [BankRoute] - the resolved destination of a single logical block.
//! * [BankRoutes] - the bank routing table, materialized from resolved routes by [BankRoutes::sync].
//! * [MemoryMapper] - the interface of a complete mapper owning RAM, ROM and the tables above.
use core::fmt;
use core::ops::RangeInclusive;
use std::io::{self, Read};
use std::rc::Rc;

#[cfg(feature = "snapshot")] pub mod arrays;
#[cfg(feature = "snapshot")] pub mod serde;

#[cfg(feature = "snapshot")]
use ::serde::{Serialize, Deserialize};

pub const MEM4K_SIZE  : usize = 0x1000;
pub const MEM8K_SIZE  : usize = 2 * MEM4K_SIZE;
pub const MEM16K_SIZE : usize = 4 * MEM4K_SIZE;
pub const MEM32K_SIZE : usize = 8 * MEM4K_SIZE;
pub const MEM64K_SIZE : usize = 16 * MEM4K_SIZE;
pub const MEM128K_SIZE: usize = 2 * MEM64K_SIZE;
pub const MEM256K_SIZE: usize = 4 * MEM64K_SIZE;
pub const MEM512K_SIZE: usize = 8 * MEM64K_SIZE;
pub const MEM768K_SIZE: usize = 12 * MEM64K_SIZE;

/// A value read from addresses without any memory or device behind them.
pub const OPEN_BUS: u8 = u8::MAX;

/// Represents a ROM image as a shared pointer to a slice of bytes.
pub type SharedRom = Rc<[u8]>;

#[non_exhaustive]
#[derive(Debug)]
pub enum MemoryError {
    InvalidTaskIndex,
    InvalidBlockIndex,
    InvalidRamSize,
    InvalidRomSize,
    Io(io::Error)
}

impl std::error::Error for MemoryError {}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            MemoryError::InvalidTaskIndex => "Page table task index is out of range",
            MemoryError::InvalidBlockIndex => "Page table block index is out of range",
            MemoryError::InvalidRamSize => "RAM size is not supported by this mapper",
            MemoryError::InvalidRomSize => "ROM image size does not match the ROM area",
            MemoryError::Io(err) => return err.fmt(f)
        })
    }
}

impl From<MemoryError> for io::Error {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::Io(err) => err,
            e => io::Error::new(io::ErrorKind::InvalidInput, e)
        }
    }
}

impl From<io::Error> for MemoryError {
    fn from(err: io::Error) -> Self {
        MemoryError::Io(err)
    }
}

/// A type returned by some of [MemoryMapper] methods.
pub type Result<T> = core::result::Result<T, MemoryError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemoryKind {
    Rom,
    Ram
}

/// The destination of a single logical block as resolved by a mapper.
///
/// Offsets are absolute byte offsets into the RAM or the ROM buffer of the mapper, pointing
/// to the first byte of the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub enum BankRoute {
    Ram { offset: u32 },
    Rom { offset: u32 },
    /// No memory is present: reads yield [OPEN_BUS] and writes are discarded.
    Unmapped
}

impl Default for BankRoute {
    fn default() -> Self {
        BankRoute::Unmapped
    }
}

impl BankRoute {
    #[inline]
    pub fn ram(offset: usize) -> Self {
        BankRoute::Ram { offset: offset as u32 }
    }

    #[inline]
    pub fn rom(offset: usize) -> Self {
        BankRoute::Rom { offset: offset as u32 }
    }
    /// Returns the kind of memory, or `None` if unmapped.
    #[inline]
    pub fn kind(self) -> Option<MemoryKind> {
        match self {
            BankRoute::Ram {..} => Some(MemoryKind::Ram),
            BankRoute::Rom {..} => Some(MemoryKind::Rom),
            BankRoute::Unmapped => None
        }
    }
    /// Returns the physical offset of the block, or `None` if unmapped.
    #[inline]
    pub fn offset(self) -> Option<usize> {
        match self {
            BankRoute::Ram { offset }|BankRoute::Rom { offset } => Some(offset as usize),
            BankRoute::Unmapped => None
        }
    }
    /// Only RAM blocks accept writes.
    #[inline]
    pub fn is_writable(self) -> bool {
        matches!(self, BankRoute::Ram {..})
    }

    #[inline]
    pub fn is_rom(self) -> bool {
        matches!(self, BankRoute::Rom {..})
    }

    #[inline]
    pub fn is_ram(self) -> bool {
        matches!(self, BankRoute::Ram {..})
    }
    /// Returns a route pointing `delta` bytes further into the same memory.
    #[inline]
    pub fn advance(self, delta: usize) -> Self {
        match self {
            BankRoute::Ram { offset } => BankRoute::Ram { offset: offset + delta as u32 },
            BankRoute::Rom { offset } => BankRoute::Rom { offset: offset + delta as u32 },
            BankRoute::Unmapped => BankRoute::Unmapped
        }
    }
}

/// The bank routing table.
///
/// Entirely derived state: each entry caches the [BankRoute] of one logical block, so byte
/// accesses are a single `match` away from the backing buffer. Only [BankRoutes::sync] assigns
/// entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BankRoutes<const N: usize> {
    routes: [BankRoute; N]
}

impl<const N: usize> Default for BankRoutes<N> {
    fn default() -> Self {
        BankRoutes { routes: [BankRoute::Unmapped; N] }
    }
}

impl<const N: usize> BankRoutes<N> {
    /// The number of routes.
    pub const LEN: usize = N;
    /// The last valid route index.
    pub const LAST: usize = N - 1;

    #[inline]
    pub fn get(&self, route: usize) -> BankRoute {
        debug_assert!(route < N);
        self.routes.get(route).copied().unwrap_or_default()
    }

    #[inline]
    pub fn as_slice(&self) -> &[BankRoute] {
        &self.routes
    }
    /// Installs resolved routes for each route index in the given inclusive `range`.
    ///
    /// `resolve` is called exactly once per index. Indices past the table are a programming
    /// error: they are asserted in debug builds and ignored otherwise.
    pub fn sync<F>(&mut self, range: RangeInclusive<usize>, mut resolve: F)
        where F: FnMut(usize) -> BankRoute
    {
        let (first, last) = range.into_inner();
        debug_assert!(first <= last && last < N, "route range {}..={} out of {}", first, last, N);
        for route in first..=last.min(Self::LAST) {
            self.routes[route] = resolve(route);
        }
    }
    /// Reads a byte at `offset` into the given `route`.
    #[inline]
    pub fn read(&self, route: usize, offset: usize, ram: &[u8], rom: &[u8]) -> u8 {
        match self.get(route) {
            BankRoute::Ram { offset: base } => ram.get(base as usize + offset),
            BankRoute::Rom { offset: base } => rom.get(base as usize + offset),
            BankRoute::Unmapped => None
        }.copied().unwrap_or(OPEN_BUS)
    }
    /// Writes a byte at `offset` into the given `route`. Writes to ROM or unmapped routes
    /// are discarded and `false` is returned.
    #[inline]
    pub fn write(&self, route: usize, offset: usize, val: u8, ram: &mut [u8]) -> bool {
        if let BankRoute::Ram { offset: base } = self.get(route) {
            if let Some(p) = ram.get_mut(base as usize + offset) {
                *p = val;
                return true
            }
        }
        false
    }
}

/// The page table: one row of page register values per task.
///
/// Pure data with no side effects of its own. The meaning of each value is up to the mapper
/// owning the table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(transparent))]
pub struct PageTable<const TASKS: usize, const BLOCKS: usize> {
    #[cfg_attr(feature = "snapshot", serde(with = "arrays::rows"))]
    entries: [[u8; BLOCKS]; TASKS]
}

impl<const TASKS: usize, const BLOCKS: usize> PageTable<TASKS, BLOCKS> {
    pub const NUM_TASKS: usize = TASKS;
    pub const NUM_BLOCKS: usize = BLOCKS;

    /// Creates a table with every entry set to `value`.
    pub fn filled(value: u8) -> Self {
        PageTable { entries: [[value; BLOCKS]; TASKS] }
    }
    /// Returns an entry or `None` if indices are out of range.
    #[inline]
    pub fn get(&self, task: usize, block: usize) -> Option<u8> {
        self.entries.get(task)?.get(block).copied()
    }
    /// Stores `value` at the given indices.
    ///
    /// Returns `false` and leaves the table untouched if any index is out of range.
    /// Out of range indices are asserted in debug builds.
    #[inline]
    pub fn configure(&mut self, task: usize, block: usize, value: u8) -> bool {
        debug_assert!(task < TASKS, "task index {} out of range", task);
        debug_assert!(block < BLOCKS, "block index {} out of range", block);
        match self.entries.get_mut(task).and_then(|row| row.get_mut(block)) {
            Some(entry) => {
                *entry = value;
                true
            }
            None => false
        }
    }

    #[inline]
    pub fn row(&self, task: usize) -> Option<&[u8; BLOCKS]> {
        self.entries.get(task)
    }

    #[inline]
    pub fn row_mut(&mut self, task: usize) -> Option<&mut [u8; BLOCKS]> {
        self.entries.get_mut(task)
    }
    /// Fills a single row with `value`.
    pub fn fill_row(&mut self, task: usize, value: u8) {
        if let Some(row) = self.row_mut(task) {
            row.fill(value);
        }
    }
}

/// A trait for interfacing paged memory mappers.
///
/// A mapper owns the RAM and ROM buffers, the [PageTable], the task selector, its mode bits
/// and the [BankRoutes] cache. Every method that changes the paging state performs the
/// necessary bank synchronization before returning, so the next access already sees
/// the new layout.
pub trait MemoryMapper {
    /// The size of a single page table block in bytes.
    const BLOCK_SIZE: usize;
    /// The number of page table rows including the reserved default task.
    const TASKS: usize;
    /// The number of page table entries per task.
    const BLOCKS: usize;
    /// The number of entries in the bank routing table.
    const ROUTES: usize;
    /// The reserved task used when paging is disabled.
    const DEFAULT_TASK: usize;

    /// Restores the power-on paging state: paging disabled and the default task live.
    ///
    /// The contents of RAM are left untouched.
    fn reset(&mut self);
    /// Stores `value` in the page table.
    ///
    /// If `task` is live and paging is enabled only the affected routes are synchronized.
    fn configure(&mut self, task: usize, block: usize, value: u8);
    /// Returns the raw page table entry.
    fn page_entry(&self, task: usize, block: usize) -> Option<u8>;
    /// Resolves the destination of `block` for the given `task` from the page table
    /// and the current mode bits.
    ///
    /// `block` may be any route index below [MemoryMapper::ROUTES].
    fn resolve(&self, task: usize, block: usize) -> BankRoute;
    /// Selects the task to be used while paging is enabled and synchronizes all routes.
    fn set_task(&mut self, task: usize);
    /// Enables or disables paging and synchronizes all routes.
    fn set_paging_enabled(&mut self, enabled: bool);
    /// Returns the task selected with [MemoryMapper::set_task].
    fn selected_task(&self) -> usize;
    /// Returns the live task: the selected task or [MemoryMapper::DEFAULT_TASK] when paging is disabled.
    fn current_task(&self) -> usize;

    fn is_paging_enabled(&self) -> bool;
    /// Returns the currently installed route.
    fn route(&self, route: usize) -> BankRoute;
    /// Re-installs routes in the given inclusive range from [MemoryMapper::resolve] of the live task.
    fn sync(&mut self, routes: RangeInclusive<usize>);
    /// Returns the route index and the offset into it for a CPU address.
    ///
    /// Returns `None` for addresses belonging to the I/O window.
    fn route_at(address: u16) -> Option<(usize, usize)>;
    /// Reads a byte through the routing table. I/O window addresses read as [OPEN_BUS].
    #[inline]
    fn read(&self, address: u16) -> u8 {
        match Self::route_at(address) {
            Some((route, offset)) => self.read_route(route, offset),
            None => OPEN_BUS
        }
    }
    /// Writes a byte through the routing table. Returns `true` if the byte reached RAM.
    #[inline]
    fn write(&mut self, address: u16, val: u8) -> bool {
        match Self::route_at(address) {
            Some((route, offset)) => self.write_route(route, offset, val),
            None => false
        }
    }

    fn read_route(&self, route: usize, offset: usize) -> u8;

    fn write_route(&mut self, route: usize, offset: usize, val: u8) -> bool;
    /// Provides a view of the whole RAM.
    fn ram_ref(&self) -> &[u8];
    /// Provides a mutable view of the whole RAM.
    fn ram_mut(&mut self) -> &mut [u8];
    /// Provides a view of the whole ROM.
    fn rom_ref(&self) -> &[u8];
    /// Returns a `(task, block) -> route` snapshot for every route of the given task.
    fn resolve_all(&self, task: usize) -> Vec<BankRoute> {
        (0..Self::ROUTES).map(|route| self.resolve(task, route)).collect()
    }
    /// Reads exactly the RAM size worth of data from `rd` into RAM.
    fn load_into_ram<R: Read>(&mut self, mut rd: R) -> Result<()> {
        rd.read_exact(self.ram_mut()).map_err(MemoryError::Io)
    }
    /// Fills the whole RAM with the data produced by the closure `f`.
    ///
    /// Useful to fill RAM with random bytes.
    fn fill_ram<F: FnMut() -> u8>(&mut self, mut f: F) {
        for p in self.ram_mut().iter_mut() {
            *p = f()
        }
    }
}

/// Creates a boxed slice of `size` bytes filled with `fill`.
pub fn alloc_mem(size: usize, fill: u8) -> Box<[u8]> {
    vec![fill; size].into_boxed_slice()
}
