/*
    test_interrupt_recalc: tests for the DRAGONMMU library.
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
//! Tests the interrupt recalculator with an enable register masking the source set.
use bitflags::bitflags;
use dragonmmu_core::chip::*;

bitflags! {
    #[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
    struct Sources: u8 {
        const FLOPPY   = 0b0001;
        const KEYBOARD = 0b0010;
        const TIMER    = 0b0100;
        const DRQ      = 0b1000;
    }
}

#[test]
fn test_enable_mask_reevaluates_pending_sources() {
    let mut recalc = InterruptRecalc::<Sources>::new();
    let mut host = LineRecorder::new();
    let mut enabled = Sources::empty();
    assert!(recalc.set_source(Sources::FLOPPY, true));
    assert!(!recalc.recalc_irq(CpuId::Main, enabled, &mut host));
    assert_eq!(host.lines(CpuId::Main), CpuLineFlags::empty());
    // no new source event, only the mask changes
    enabled.insert(Sources::FLOPPY);
    assert!(recalc.recalc_irq(CpuId::Main, enabled, &mut host));
    assert_eq!(host.lines(CpuId::Main), CpuLineFlags::IRQ);
    enabled.remove(Sources::FLOPPY);
    assert!(!recalc.recalc_irq(CpuId::Main, enabled, &mut host));
    assert_eq!(host.lines(CpuId::Main), CpuLineFlags::empty());
    assert_eq!(recalc.sources(), Sources::FLOPPY);
    assert_eq!(host.events().len(), 2);
}

#[test]
fn test_routing_table_ors_sources() {
    let routing = [
        LineRoute { cpu: CpuId::Main, line: CpuLine::Irq, sources: Sources::FLOPPY|Sources::KEYBOARD|Sources::TIMER },
        LineRoute { cpu: CpuId::Dma, line: CpuLine::Nmi, sources: Sources::DRQ },
    ];
    let mut recalc = InterruptRecalc::<Sources>::new();
    let mut host = LineRecorder::new();
    recalc.set_source(Sources::KEYBOARD, true);
    recalc.recalc(&routing, &mut host);
    recalc.set_source(Sources::TIMER, true);
    recalc.recalc(&routing, &mut host);
    recalc.set_source(Sources::KEYBOARD, false);
    recalc.recalc(&routing, &mut host);
    assert_eq!(host.lines(CpuId::Main), CpuLineFlags::IRQ);
    recalc.set_source(Sources::TIMER, false);
    recalc.recalc(&routing, &mut host);
    assert_eq!(host.lines(CpuId::Main), CpuLineFlags::empty());
    // NMI pulses once per activation
    for _ in 0..3 {
        recalc.set_source(Sources::DRQ, true);
        recalc.recalc(&routing, &mut host);
    }
    recalc.set_source(Sources::DRQ, false);
    recalc.recalc(&routing, &mut host);
    recalc.set_source(Sources::DRQ, true);
    recalc.recalc(&routing, &mut host);
    assert_eq!(host.nmi_count(CpuId::Dma), 2);
    assert_eq!(host.nmi_count(CpuId::Main), 0);
    assert_eq!(host.events().len(), 4);
    recalc.reset(&mut host);
    assert_eq!(recalc.sources(), Sources::empty());
    assert_eq!(recalc.line_state(CpuId::Dma), CpuLineFlags::empty());
}
