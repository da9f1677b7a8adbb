//! General-Purpose Register File.
//!
//! This module implements the 96-entry general-purpose register file.
//! Registers `x0`-`x31` are static; `x32`-`x95` form the rotating window.
//! Accesses by name go through the rotation functions; the trace snapshots
//! the physical contents.

use super::rotation::physical_reg;
use crate::common::NUM_REGISTERS;

/// General-Purpose Register file.
///
/// Every register starts at zero. There is no hardwired zero register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gpr {
    regs: [u64; NUM_REGISTERS],
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpr {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; NUM_REGISTERS],
        }
    }

    /// Reads register name `name` under rotating base `rbb`.
    ///
    /// # Arguments
    ///
    /// * `name` - Register name (0-95)
    /// * `rbb` - Current rotating register base
    ///
    /// # Returns
    ///
    /// The 64-bit value held by the physical register the name maps to.
    pub fn read(&self, name: usize, rbb: usize) -> u64 {
        self.regs[physical_reg(name, rbb)]
    }

    /// Reads physical register `idx` without rotation.
    pub fn read_physical(&self, idx: usize) -> u64 {
        self.regs[idx]
    }

    /// Writes physical register `idx`.
    ///
    /// Callers resolve names to physical slots first, so a write that
    /// completes after a rotation still lands in the slot chosen at issue.
    pub fn write_physical(&mut self, idx: usize, val: u64) {
        self.regs[idx] = val;
    }

    /// Snapshot of all physical registers.
    pub fn snapshot(&self) -> Vec<u64> {
        self.regs.to_vec()
    }

    /// Dumps the contents of all registers to the log at debug level.
    ///
    /// Displays registers in pairs (two per line) with hexadecimal formatting.
    pub fn dump(&self) {
        for i in (0..NUM_REGISTERS).step_by(2) {
            log::debug!(
                "x{:<2}={:#018x} x{:<2}={:#018x}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            );
        }
    }
}
