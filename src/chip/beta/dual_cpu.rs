/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
use core::fmt;

use log::debug;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::chip::{CpuId, CpuLines, EdgeDetector, Scheduler};

/// The combined run state of the main and the DMA CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CpuRunState {
    /// Only before the first reset.
    #[default]
    BothHalted,
    MainRunning,
    DmaRunning,
    /// Transient, while the CPUs hand over the bus.
    BothRunning
}

/// The dual-CPU coordinator.
///
/// Tracks the last written **HALT** control level of each CPU and drives the host's **HALT**
/// lines only when a level actually changes. Releasing a CPU forces a context switch with
/// [Scheduler::resume], so the released CPU runs before the writer continues.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct DualCpu {
    main_halted: EdgeDetector<bool>,
    dma_halted: EdgeDetector<bool>
}

impl Default for DualCpu {
    fn default() -> Self {
        DualCpu {
            main_halted: EdgeDetector::new(true),
            dma_halted: EdgeDetector::new(true)
        }
    }
}

impl fmt::Debug for DualCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DualCpu").field(&self.state()).finish()
    }
}

impl DualCpu {
    pub fn state(&self) -> CpuRunState {
        match (self.main_halted.last(), self.dma_halted.last()) {
            (true, true) => CpuRunState::BothHalted,
            (false, true) => CpuRunState::MainRunning,
            (true, false) => CpuRunState::DmaRunning,
            (false, false) => CpuRunState::BothRunning
        }
    }

    #[inline]
    pub fn is_halted(&self, cpu: CpuId) -> bool {
        match cpu {
            CpuId::Main => self.main_halted.last(),
            CpuId::Dma => self.dma_halted.last()
        }
    }
    /// Lets the main CPU run and holds the DMA CPU halted.
    pub fn reset<L: CpuLines + ?Sized>(&mut self, host: &mut L) {
        self.main_halted.reset(false);
        self.dma_halted.reset(true);
        host.set_halt(CpuId::Main, false);
        host.set_halt(CpuId::Dma, true);
    }
    /// Sets the **HALT** control level of `cpu`. Returns `true` if the level has changed.
    pub fn set_halt<S: Scheduler + ?Sized>(&mut self, cpu: CpuId, halted: bool, host: &mut S) -> bool {
        let detector = match cpu {
            CpuId::Main => &mut self.main_halted,
            CpuId::Dma => &mut self.dma_halted
        };
        if detector.update(halted).is_none() {
            return false
        }
        debug!("{} cpu halted: {}", cpu, halted);
        if halted {
            host.set_halt(cpu, true);
        }
        else {
            host.resume(cpu);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{CpuLine, LineEvent, LineRecorder};

    #[test]
    fn dual_cpu_reset_works() {
        let mut cpus = DualCpu::default();
        assert_eq!(cpus.state(), CpuRunState::BothHalted);
        let mut host = LineRecorder::new();
        cpus.reset(&mut host);
        assert_eq!(cpus.state(), CpuRunState::MainRunning);
        assert!(!host.is_halted(CpuId::Main));
        assert!(host.is_halted(CpuId::Dma));
        assert_eq!(host.yields(), 0);
    }

    #[test]
    fn dual_cpu_halt_is_change_gated() {
        let mut cpus = DualCpu::default();
        let mut host = LineRecorder::new();
        cpus.reset(&mut host);
        host.take_events();
        assert!(!cpus.set_halt(CpuId::Dma, true, &mut host));
        assert!(host.events().is_empty());
        assert!(cpus.set_halt(CpuId::Dma, false, &mut host));
        assert_eq!(host.yields(), 1);
        assert_eq!(cpus.state(), CpuRunState::BothRunning);
        assert!(cpus.set_halt(CpuId::Main, true, &mut host));
        assert!(!cpus.set_halt(CpuId::Main, true, &mut host));
        assert_eq!(cpus.state(), CpuRunState::DmaRunning);
        assert!(cpus.is_halted(CpuId::Main));
        assert!(cpus.set_halt(CpuId::Main, false, &mut host));
        assert_eq!(host.yields(), 2);
        assert_eq!(host.take_events(), vec![
            LineEvent { cpu: CpuId::Dma, line: CpuLine::Halt, asserted: false },
            LineEvent { cpu: CpuId::Main, line: CpuLine::Halt, asserted: true },
            LineEvent { cpu: CpuId::Main, line: CpuLine::Halt, asserted: false },
        ]);
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn dual_cpu_serde_works() {
        let mut cpus = DualCpu::default();
        cpus.reset(&mut LineRecorder::new());
        let sjson = serde_json::to_string(&cpus).unwrap();
        assert_eq!(sjson, r#"{"mainHalted":{"last":false},"dmaHalted":{"last":true}}"#);
        let cpus_de: DualCpu = serde_json::from_str(&sjson).unwrap();
        assert_eq!(cpus_de, cpus);
    }
}
