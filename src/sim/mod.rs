//! Simulation harness.
//!
//! Runs a bundle program on a fresh [`Cpu`] until it halts and collects the
//! per-cycle trace. The [`loader`] reads and writes the files the command
//! line works with; [`compare`] checks schedules and runs against each
//! other.

use log::{debug, info};

use crate::common::{Error, Result};
use crate::config::SimulatorConfig;
use crate::core::trace::CycleRecord;
use crate::core::{Cpu, MachineState};
use crate::isa::Bundle;
use crate::stats::SimStats;

/// Schedule and run comparison.
pub mod compare;

/// File input and output.
pub mod loader;

/// Everything a finished run produced.
pub struct SimulationResult {
    /// One record per executed cycle.
    pub trace: Vec<CycleRecord>,
    /// State after the last cycle.
    pub final_state: MachineState,
    pub stats: SimStats,
}

/// Simulates `program` from reset until it halts.
///
/// # Returns
///
/// The trace, final state and statistics, or
/// [`Error::SimulationDivergence`] when the program is still running after
/// `config.max_cycles` cycles.
pub fn run(program: &[Bundle], config: &SimulatorConfig) -> Result<SimulationResult> {
    info!("[Sim] Running {} bundles", program.len());
    let mut cpu = Cpu::new(program.to_vec(), config);
    let mut trace = Vec::new();

    while !cpu.halted() {
        if cpu.stats.cycles >= config.max_cycles {
            cpu.dump_state();
            return Err(Error::SimulationDivergence {
                cycle: cpu.stats.cycles,
                pc: cpu.state.pc,
            });
        }
        trace.push(cpu.tick());
    }

    info!(
        "[Sim] Halted after {} cycles ({} loop iterations, {} drain)",
        cpu.stats.cycles, cpu.stats.loop_iterations, cpu.stats.drain_iterations
    );
    debug!("[Sim] {} memory words written", cpu.state.memory.words().len());

    Ok(SimulationResult {
        trace,
        final_state: cpu.state,
        stats: cpu.stats,
    })
}
