/*
    test_snapshot: tests for the DRAGONMMU library.
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
//! Tests that restored machine snapshots resolve memory and drive the CPU lines exactly
//! as the machines they were taken from.
#![cfg(feature = "snapshot")]
use rand::prelude::*;
use rand::rngs::SmallRng;

use dragonmmu::chip::{*, beta::*, coco3::*};
use dragonmmu::memory::*;
use dragonmmu::peripherals::KeyboardInterface;

fn assert_same_mapping<M: MemoryMapper>(mem: &M, mem_de: &M) {
    for task in 0..M::TASKS {
        assert_eq!(mem.resolve_all(task), mem_de.resolve_all(task), "task: {}", task);
        for block in 0..M::BLOCKS {
            assert_eq!(mem.page_entry(task, block), mem_de.page_entry(task, block));
        }
    }
    for route in 0..M::ROUTES {
        assert_eq!(mem.route(route), mem_de.route(route));
    }
    assert_eq!(mem.selected_task(), mem_de.selected_task());
    assert_eq!(mem.is_paging_enabled(), mem_de.is_paging_enabled());
    assert_eq!(mem.ram_ref(), mem_de.ram_ref());
    assert_eq!(mem.rom_ref(), mem_de.rom_ref());
}

fn coco3_in_use() -> (Coco3, LineRecorder) {
    let mut rng = SmallRng::seed_from_u64(3);
    let rom: Vec<u8> = (0..GIME_INTERNAL_ROM_SIZE).map(|_| rng.gen()).collect();
    let mut coco: Coco3 = Coco3::new(Coco3Config::default(), &rom, Some(&b"CART"[..])).unwrap();
    coco.memory_mut().fill_ram(|| rng.gen());
    let mut host = LineRecorder::new();
    coco.reset(&mut host);
    for address in 0xFFA0..=0xFFAF {
        coco.write_byte(CpuId::Main, address, rng.gen(), &mut host);
    }
    coco.write_byte(CpuId::Main, 0xFFB3, 0x2A, &mut host);
    coco.write_byte(CpuId::Main, 0xFF91, 0x01, &mut host);
    coco.write_byte(CpuId::Main, 0xFF92, GimeIntFlags::SERIAL.bits(), &mut host);
    coco.write_byte(CpuId::Main, 0xFF90, 0b0110_1001, &mut host);
    coco.set_serial_irq(true, &mut host);
    assert_eq!(host.lines(CpuId::Main), CpuLineFlags::IRQ);
    (coco, host)
}

fn beta_in_use() -> (DragonBeta, LineRecorder) {
    let mut rng = SmallRng::seed_from_u64(16);
    let rom: Vec<u8> = (0..BETA_ROM_SIZE).map(|_| rng.gen()).collect();
    let mut beta: DragonBeta = DragonBeta::new(BetaConfig::default(), &rom).unwrap();
    beta.memory_mut().fill_ram(|| rng.gen());
    let mut host = LineRecorder::new();
    beta.reset(&mut host);
    // PIA task 5, then fill its page registers
    beta.write_byte(CpuId::Main, 0xFCC2, 0x8F, &mut host);
    beta.write_byte(CpuId::Main, 0xFCC3, 0b100, &mut host);
    beta.write_byte(CpuId::Main, 0xFCC2, 0x05, &mut host);
    for address in 0xFE00..=0xFE0F {
        beta.write_byte(CpuId::Main, address, rng.gen_range(0..0x40), &mut host);
    }
    // task 5 with paging, NMI control low
    beta.write_byte(CpuId::Main, 0xFCC1, 0b100, &mut host);
    beta.write_byte(CpuId::Main, 0xFCC0, 0x05, &mut host);
    beta.write_byte(CpuId::Main, 0xFCC1, 0b000, &mut host);
    beta.write_byte(CpuId::Main, 0xFCC0, 0xFF, &mut host);
    // release the DMA CPU
    beta.write_byte(CpuId::Main, 0xFC20, 0xFF, &mut host);
    beta.write_byte(CpuId::Main, 0xFC21, 0b100, &mut host);
    beta.write_byte(CpuId::Main, 0xFC80, 0x0E, &mut host);
    beta.write_byte(CpuId::Main, 0xFC81, 0x33, &mut host);
    assert!(beta.memory_ref().is_paging_enabled());
    assert_eq!(beta.memory_ref().current_task(), 5);
    assert_eq!(beta.run_state(), CpuRunState::BothRunning);
    assert_eq!(host.nmi_count(CpuId::Dma), 1);
    (beta, host)
}

fn assert_same_coco3(coco: &Coco3, coco_de: &Coco3) {
    assert_same_mapping(coco.memory_ref(), coco_de.memory_ref());
    assert_eq!(coco.memory_ref().mode(), coco_de.memory_ref().mode());
    assert_eq!(coco.gime(), coco_de.gime());
    assert_eq!(coco.sam(), coco_de.sam());
    assert_eq!(coco.pia0(), coco_de.pia0());
    assert_eq!(coco.pia1(), coco_de.pia1());
    assert_eq!(coco.irq_sources(), coco_de.irq_sources());
    assert_eq!(coco.line_state(), coco_de.line_state());
    assert_eq!(coco.get_key_state(), coco_de.get_key_state());
}

fn assert_same_beta(beta: &DragonBeta, beta_de: &DragonBeta) {
    assert_same_mapping(beta.memory_ref(), beta_de.memory_ref());
    assert_eq!(beta.pia0(), beta_de.pia0());
    assert_eq!(beta.pia1(), beta_de.pia1());
    assert_eq!(beta.pia2(), beta_de.pia2());
    assert_eq!(beta.pia_task(), beta_de.pia_task());
    assert_eq!(beta.dual_cpu(), beta_de.dual_cpu());
    assert_eq!(beta.irq_sources(), beta_de.irq_sources());
    assert_eq!(beta.line_state(CpuId::Main), beta_de.line_state(CpuId::Main));
    assert_eq!(beta.line_state(CpuId::Dma), beta_de.line_state(CpuId::Dma));
    assert_eq!(beta.keyboard_shift(), beta_de.keyboard_shift());
    assert_eq!(beta.crtc_index(), beta_de.crtc_index());
    assert_eq!(beta.crtc_reg(14), beta_de.crtc_reg(14));
    assert_eq!(beta.ignores_first_drq_nmi(), beta_de.ignores_first_drq_nmi());
}

#[test]
fn test_coco3_snapshot() {
    let (coco, _) = coco3_in_use();
    let json = serde_json::to_string(&coco).unwrap();
    let coco_de: Coco3 = serde_json::from_str(&json).unwrap();
    assert_same_coco3(&coco, &coco_de);
    let bin = bincode::serialize(&coco).unwrap();
    let mut coco_de: Coco3 = bincode::deserialize(&bin).unwrap();
    assert_same_coco3(&coco, &coco_de);
    // the restored recalculator remembers the asserted line
    let mut host = LineRecorder::new();
    coco_de.set_serial_irq(true, &mut host);
    assert!(host.events().is_empty());
    coco_de.set_serial_irq(false, &mut host);
    assert_eq!(host.take_events(), vec![
        LineEvent { cpu: CpuId::Main, line: CpuLine::Irq, asserted: false }
    ]);
}

#[test]
fn test_beta_snapshot() {
    let (beta, _) = beta_in_use();
    let json = serde_json::to_string(&beta).unwrap();
    let beta_de: DragonBeta = serde_json::from_str(&json).unwrap();
    assert_same_beta(&beta, &beta_de);
    let bin = bincode::serialize(&beta).unwrap();
    let mut beta_de: DragonBeta = bincode::deserialize(&bin).unwrap();
    assert_same_beta(&beta, &beta_de);
    // restored edge state: repeating the last writes changes nothing
    let mut host = LineRecorder::new();
    beta_de.write_byte(CpuId::Main, 0xFC20, 0x00, &mut host);
    beta_de.write_byte(CpuId::Main, 0xFCC1, 0b100, &mut host);
    beta_de.write_byte(CpuId::Main, 0xFCC0, 0x05, &mut host);
    assert!(host.events().is_empty());
    assert_eq!(beta_de.memory_ref().current_task(), 5);
    // releasing NMI control and asserting it again pulses NMI once
    beta_de.write_byte(CpuId::Main, 0xFCC0, 0x85, &mut host);
    beta_de.write_byte(CpuId::Main, 0xFCC0, 0x05, &mut host);
    assert_eq!(host.nmi_count(CpuId::Dma), 1);
    beta_de.write_byte(CpuId::Main, 0xFC20, 0x80, &mut host);
    assert!(host.is_halted(CpuId::Dma));
    assert_eq!(beta_de.run_state(), CpuRunState::MainRunning);
}
