//! Load/Store Unit (LSU) and Data Memory.
//!
//! Data memory is a sparse map of 64-bit words indexed by byte address.
//! Unwritten addresses read as zero. The map is ordered so that memory
//! snapshots in the trace are deterministic.

use std::collections::BTreeMap;

/// Sparse word-addressed data memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataMemory {
    words: BTreeMap<u64, u64>,
}

impl DataMemory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the word at `addr`.
    pub fn read(&self, addr: u64) -> u64 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    /// Writes the word at `addr`.
    pub fn write(&mut self, addr: u64, val: u64) {
        self.words.insert(addr, val);
    }

    /// All written words, by address.
    pub fn words(&self) -> &BTreeMap<u64, u64> {
        &self.words
    }
}

/// Load/Store Unit address generation.
pub struct Lsu;

impl Lsu {
    /// Effective address `base + imm`, wrapping.
    pub fn effective_address(base: u64, imm: i64) -> u64 {
        base.wrapping_add(imm as u64)
    }
}
