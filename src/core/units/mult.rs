//! Multiply Pipeline.
//!
//! Three stages held in a fixed ring. Each cycle the ring rotates by one
//! position: the newly issued multiply enters stage 0, older entries move
//! to stages 1 and 2, and the entry reaching stage 2 retires at the end of
//! that cycle. A `mulu` issued in cycle `t` is therefore readable in cycle
//! `t + 3`.
//!
//! The physical destination is resolved when the multiply issues, so a
//! rotation of the register base while it is in flight does not redirect
//! the write.

use crate::common::constants::MULT_STAGES;

/// One in-flight multiply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MulStage {
    /// Guard value read at issue; a false entry never writes back.
    pub predicate: bool,
    /// Physical destination register.
    pub dest: usize,
    /// Product of the operands read at issue.
    pub result: u64,
}

/// Ring of multiply stages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultPipeline {
    stages: [Option<MulStage>; MULT_STAGES],
    head: usize,
}

impl MultPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of stage `k` (0 = just issued, 2 = retiring).
    pub fn stage(&self, k: usize) -> Option<&MulStage> {
        self.stages[(self.head + k) % MULT_STAGES].as_ref()
    }

    /// Advances the ring by one cycle.
    ///
    /// The slot of the previous stage 2 (already retired) becomes the new
    /// stage 0 and receives `issue`.
    ///
    /// # Returns
    ///
    /// The entry now in stage 2, which retires at the end of this cycle.
    pub fn advance(&mut self, issue: Option<MulStage>) -> Option<MulStage> {
        self.head = (self.head + MULT_STAGES - 1) % MULT_STAGES;
        self.stages[self.head] = issue;
        self.stage(MULT_STAGES - 1).copied()
    }

    /// Whether a multiply will still write back in a later cycle.
    pub fn in_flight(&self) -> bool {
        (0..MULT_STAGES - 1).any(|k| self.stage(k).is_some())
    }
}
