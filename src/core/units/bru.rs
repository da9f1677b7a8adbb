//! Branch Unit (loop control).
//!
//! Resolves the two loop-closing branches against the loop counters.
//!
//! * `loop`: while `LC > 0`, decrement it and branch back.
//! * `loop.pip`: while `LC > 0`, decrement it, rotate, set the stage-0
//!   predicate and branch back. Once `LC` is exhausted, the same happens
//!   with `EC` while the stage-0 predicate is cleared, draining the
//!   iterations still in flight. With both counters at zero the loop
//!   falls through without rotating.

use crate::isa::Op;

/// Outcome of a loop branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Branch target when taken.
    pub target: Option<usize>,
    pub lc: u64,
    pub ec: u64,
    /// Whether the rotating base advances.
    pub rotate: bool,
    /// New value of the stage-0 predicate (written after rotation).
    pub stage_predicate: Option<bool>,
}

/// Branch unit.
pub struct Bru;

impl Bru {
    /// Evaluates a loop branch.
    ///
    /// # Arguments
    ///
    /// * `op` - The branch operation (`loop` or `loop.pip`)
    /// * `lc` - Loop counter before the cycle
    /// * `ec` - Epilogue counter before the cycle
    ///
    /// # Returns
    ///
    /// The new counters and control effects, or `None` for non-branch ops.
    pub fn resolve(op: &Op, lc: u64, ec: u64) -> Option<LoopOutcome> {
        let fall_through = LoopOutcome {
            target: None,
            lc,
            ec,
            rotate: false,
            stage_predicate: None,
        };
        match *op {
            Op::Loop { target } => Some(if lc > 0 {
                LoopOutcome {
                    target: Some(target),
                    lc: lc - 1,
                    ..fall_through
                }
            } else {
                fall_through
            }),
            Op::LoopPip { target } => Some(if lc > 0 {
                LoopOutcome {
                    target: Some(target),
                    lc: lc - 1,
                    rotate: true,
                    stage_predicate: Some(true),
                    ..fall_through
                }
            } else if ec > 0 {
                LoopOutcome {
                    target: Some(target),
                    ec: ec - 1,
                    rotate: true,
                    stage_predicate: Some(false),
                    ..fall_through
                }
            } else {
                fall_through
            }),
            _ => None,
        }
    }
}
