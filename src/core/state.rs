//! Machine State.
//!
//! Everything the simulator mutates: program counter, rotating base, loop
//! counters, register and predicate files, data memory, and the multiply
//! pipeline. A state value is owned by exactly one simulation run and is
//! passed through [`crate::core::step`] once per cycle.

use super::arch::gpr::Gpr;
use super::arch::pred::PredicateFile;
use super::units::lsu::DataMemory;
use super::units::mult::MultPipeline;

/// Architectural and micro-architectural state of the core.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MachineState {
    /// Index of the next bundle to fetch.
    pub pc: usize,
    /// Rotating register base.
    pub rbb: usize,
    /// Loop counter.
    pub lc: u64,
    /// Epilogue counter.
    pub ec: u64,
    pub regs: Gpr,
    pub preds: PredicateFile,
    pub memory: DataMemory,
    pub mult: MultPipeline,
}

impl MachineState {
    /// Reset state: registers zero, predicates true, counters zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a program of `len` bundles has finished: the PC has left the
    /// last bundle and no multiply is still to write back.
    pub fn halted(&self, len: usize) -> bool {
        self.pc >= len && !self.mult.in_flight()
    }
}
