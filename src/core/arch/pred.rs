//! Predicate Register File.
//!
//! 96 one-bit predicates. `p0`-`p31` are static and `p32`-`p95` rotate with
//! the same base as the general-purpose registers. All predicates start
//! true, so the stage predicates of a pipelined loop must be cleared
//! explicitly before the loop starts.

use super::rotation::physical_pred;
use crate::common::NUM_PREDICATES;

/// Predicate register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateFile {
    preds: [bool; NUM_PREDICATES],
}

impl Default for PredicateFile {
    fn default() -> Self {
        Self::new()
    }
}

impl PredicateFile {
    /// Creates a predicate file with every predicate set.
    pub fn new() -> Self {
        Self {
            preds: [true; NUM_PREDICATES],
        }
    }

    /// Reads predicate name `name` under rotating base `rbb`.
    pub fn read(&self, name: usize, rbb: usize) -> bool {
        self.preds[physical_pred(name, rbb)]
    }

    /// Writes physical predicate `idx`.
    pub fn write_physical(&mut self, idx: usize, val: bool) {
        self.preds[idx] = val;
    }

    /// Reads physical predicate `idx`.
    pub fn read_physical(&self, idx: usize) -> bool {
        self.preds[idx]
    }

    /// Snapshot of all physical predicates.
    pub fn snapshot(&self) -> Vec<bool> {
        self.preds.to_vec()
    }
}
