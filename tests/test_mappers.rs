/*
    test_mappers: tests for the DRAGONMMU library.
    Copyright (C) 2020-2023  Rafal Michalski

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Lesser General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! Tests the page table resolution and the bank routing of both memory mappers.
use std::io;

use rand::prelude::*;
use rand::rngs::SmallRng;

use dragonmmu::memory::*;

fn beta_rom() -> Vec<u8> {
    (0..BETA_ROM_SIZE).map(|i| (i >> 8) as u8).collect()
}

fn gime_rom() -> Vec<u8> {
    (0..GIME_INTERNAL_ROM_SIZE).map(|i| !(i >> 8) as u8).collect()
}

fn routes<M: MemoryMapper>(mem: &M) -> Vec<BankRoute> {
    (0..M::ROUTES).map(|route| mem.route(route)).collect()
}

#[test]
fn test_boot_rom_visible_at_power_on() {
    let mem = BetaMemory::new(BetaRamSize::Ram256K, &beta_rom()).unwrap();
    assert!(!mem.is_paging_enabled());
    assert_eq!(mem.current_task(), BetaMemory::DEFAULT_TASK);
    let route = mem.resolve(BetaMemory::DEFAULT_TASK, 0);
    assert_eq!(route, BankRoute::rom(0));
    assert_eq!(route.kind(), Some(MemoryKind::Rom));
    assert!(!route.is_writable());
    assert_eq!(mem.route(0), route);

    let mem = GimeMemory::new(GimeRamSize::Ram512K, &gime_rom(), None).unwrap();
    assert!(!mem.is_paging_enabled());
    assert_eq!(mem.current_task(), GimeMemory::DEFAULT_TASK);
    // the reset vector is fetched from the internal ROM
    assert_eq!(mem.read(0xBFFE), !0x3Fu8);
}

#[test]
fn test_configure_then_resolve_ram_block() {
    let mut mem = BetaMemory::new(BetaRamSize::Ram256K, &beta_rom()).unwrap();
    mem.set_paging_enabled(true);
    mem.set_task(3);
    mem.configure(3, 0, 5);
    let route = mem.resolve(3, 0);
    assert_eq!(route, BankRoute::ram(5 * BETA_PAGE_SIZE));
    assert!(route.is_writable());
    assert_eq!(mem.route(0), route);
    assert!(mem.write(0x0010, 0x77));
    assert_eq!(mem.ram_ref()[5 * BETA_PAGE_SIZE + 0x10], 0x77);

    let mut mem = GimeMemory::new(GimeRamSize::Ram512K, &gime_rom(), None).unwrap();
    mem.set_paging_enabled(true);
    mem.set_task(1);
    mem.configure(1, 0, 5);
    assert_eq!(mem.resolve(1, 0), BankRoute::ram(5 * GIME_BLOCK_SIZE));
    assert_eq!(mem.route(0), BankRoute::ram(5 * GIME_BLOCK_SIZE));
}

#[test]
fn test_page_beyond_installed_ram_never_reads_past_buffer() {
    for size in [BetaRamSize::Ram256K, BetaRamSize::Ram512K, BetaRamSize::Ram768K] {
        let mut mem = BetaMemory::new(size, &beta_rom()).unwrap();
        mem.set_paging_enabled(true);
        mem.set_task(3);
        for value in 0..=u8::MAX {
            mem.configure(3, 0, value);
            let route = mem.resolve(3, 0);
            if usize::from(value) < size.pages() {
                assert_eq!(route, BankRoute::ram(usize::from(value) * BETA_PAGE_SIZE));
            }
            else {
                assert!(route.is_rom(), "{}: {:02x} -> {:?}", size, value, route);
                assert!(route.offset().unwrap() < BETA_ROM_SIZE);
            }
            mem.read(0x0000);
            assert!(!mem.write(0x0000, 0) || route.is_ram());
        }
    }
    for size in [GimeRamSize::Ram128K, GimeRamSize::Ram512K] {
        let mut mem = GimeMemory::new(size, &gime_rom(), None).unwrap();
        mem.set_all_ram(true);
        mem.set_paging_enabled(true);
        for value in 0..=u8::MAX {
            mem.configure(0, 0, value);
            assert_eq!(mem.route(0), mem.resolve(0, 0));
            match mem.resolve(0, 0) {
                BankRoute::Ram { offset } => assert!((offset as usize) < mem.ram_ref().len()),
                BankRoute::Rom { offset } => {
                    assert!((value & GIME_BLOCK_MASK) < size.first_block(), "{}: {:02x}", size, value);
                    assert!((offset as usize) < GIME_ROM_SIZE);
                    assert!(!mem.write(0x0000, 0));
                }
                BankRoute::Unmapped => panic!("{}: {:02x} unmapped", size, value)
            }
        }
    }
}

#[test]
fn test_sync_is_idempotent() {
    let mut rng = SmallRng::seed_from_u64(0x6809);
    let mut beta = BetaMemory::new(BetaRamSize::Ram768K, &beta_rom()).unwrap();
    let mut gime = GimeMemory::new(GimeRamSize::Ram512K, &gime_rom(), Some(&[0xC3; 0x2000][..])).unwrap();
    for _ in 0..1000 {
        match rng.gen_range(0..4) {
            0 => beta.set_task(rng.gen_range(0..16)),
            1 => beta.set_paging_enabled(rng.gen()),
            _ => beta.configure(rng.gen_range(0..16), rng.gen_range(0..16), rng.gen())
        }
        match rng.gen_range(0..5) {
            0 => gime.set_task(rng.gen_range(0..2)),
            1 => gime.set_mode(rng.gen::<u8>().into()),
            2 => gime.set_all_ram(rng.gen()),
            _ => gime.configure(rng.gen_range(0..2), rng.gen_range(0..8), rng.gen())
        }
        let beta_routes = routes(&beta);
        beta.sync(0..=BetaMemory::ROUTES - 1);
        assert_eq!(routes(&beta), beta_routes);
        beta.sync(0..=BetaMemory::ROUTES - 1);
        assert_eq!(routes(&beta), beta_routes);
        assert_eq!(beta_routes, beta.resolve_all(beta.current_task()));

        let gime_routes = routes(&gime);
        gime.sync(0..=GimeMemory::ROUTES - 1);
        assert_eq!(routes(&gime), gime_routes);
        gime.sync(0..=GimeMemory::ROUTES - 1);
        assert_eq!(routes(&gime), gime_routes);
        assert_eq!(gime_routes, gime.resolve_all(gime.current_task()));
    }
}

#[test]
fn test_random_ram_fill_is_visible_through_routes() {
    let mut rng = SmallRng::seed_from_u64(0x1986);
    let mut mem = BetaMemory::new(BetaRamSize::Ram512K, &beta_rom()).unwrap();
    mem.fill_ram(|| rng.gen());
    mem.set_paging_enabled(true);
    mem.set_task(7);
    for page in 0..16 {
        mem.configure(7, page, 0x70 + page as u8);
    }
    for address in (0x0000..0xFC00).step_by(0x155) {
        let page = 0x70 + (address >> 12) as usize;
        let expected = mem.ram_ref()[page * BETA_PAGE_SIZE + (address & 0xFFF) as usize];
        assert_eq!(mem.read(address), expected);
    }
    let expected = mem.ram_ref()[0x7F * BETA_PAGE_SIZE + 0xFFE];
    assert_eq!(mem.read(0xFFFE), expected);
    assert_eq!(mem.read(0xFD00), OPEN_BUS);
}

#[test]
fn test_ram_image_loading() {
    let mut mem = GimeMemory::new(GimeRamSize::Ram128K, &gime_rom(), None).unwrap();
    let image: Vec<u8> = (0..MEM128K_SIZE).map(|i| (i / GIME_BLOCK_SIZE) as u8).collect();
    mem.load_into_ram(io::Cursor::new(&image)).unwrap();
    assert_eq!(mem.ram_ref(), &image[..]);
    // the default task maps blocks 0x38-0x3B, the 9th installed block onwards
    assert_eq!(mem.read(0x0000), 8);
    assert_eq!(mem.read(0x7FFF), 11);
    // a longer source is only read up to the RAM size
    let mut rd = io::Cursor::new(vec![0x55; MEM128K_SIZE + 3]);
    mem.load_into_ram(&mut rd).unwrap();
    assert_eq!(rd.position(), MEM128K_SIZE as u64);
    assert_eq!(mem.read(0x2000), 0x55);

    let mut mem = BetaMemory::new(BetaRamSize::Ram256K, &beta_rom()).unwrap();
    let short = vec![0xAA; BetaRamSize::Ram256K.size() - 1];
    match mem.load_into_ram(&short[..]) {
        Err(MemoryError::Io(err)) => {
            assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
            let err: io::Error = MemoryError::Io(err).into();
            assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        }
        res => panic!("unexpected result: {:?}", res)
    }
}
