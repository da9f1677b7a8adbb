//! Schedule and Run Comparison.
//!
//! Schedules are compared slot by slot on normalized text (whitespace
//! removed, lowercased), so `add x1, x2, x3` and `ADD x1,x2,x3` match.
//! Runs of the two schedule kinds are compared on their final states; the
//! pipelined run renames registers, so only the set of register values is
//! compared, while data memory must agree exactly.

use std::collections::BTreeSet;
use std::fmt;

use crate::core::MachineState;
use crate::isa::Slot;

/// One difference between a result schedule and its reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// The schedules have different bundle counts.
    Length { actual: usize, expected: usize },
    /// A bundle does not have the same number of slots.
    Width { bundle: usize },
    /// A slot holds a different instruction.
    Slot {
        bundle: usize,
        slot: Slot,
        actual: String,
        expected: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Length { actual, expected } => write!(
                f,
                "schedule length does not match ({} bundles, expected {})",
                actual, expected
            ),
            Mismatch::Width { bundle } => {
                write!(f, "bundle {} has the wrong number of slots", bundle)
            }
            Mismatch::Slot {
                bundle,
                slot,
                actual,
                expected,
            } => write!(
                f,
                "bundle {}, slot {}: '{}' != '{}'",
                bundle, slot, actual, expected
            ),
        }
    }
}

/// Canonical comparison form of one slot string.
pub fn normalize(inst: &str) -> String {
    inst.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compares two schedules given as bundle rows.
///
/// # Returns
///
/// Every differing slot in bundle order; empty when the schedules match.
/// A length difference is reported after the slot differences of the
/// common prefix.
pub fn compare_schedules(actual: &[Vec<String>], expected: &[Vec<String>]) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (bundle, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a.len() != e.len() {
            mismatches.push(Mismatch::Width { bundle });
            continue;
        }
        for (slot, (ai, ei)) in Slot::ALL.into_iter().zip(a.iter().zip(e)) {
            if normalize(ai) != normalize(ei) {
                mismatches.push(Mismatch::Slot {
                    bundle,
                    slot,
                    actual: ai.clone(),
                    expected: ei.clone(),
                });
            }
        }
    }
    if actual.len() != expected.len() {
        mismatches.push(Mismatch::Length {
            actual: actual.len(),
            expected: expected.len(),
        });
    }
    mismatches
}

/// Whether a pipelined run ended in a state equivalent to the simple run.
///
/// Every register value of the simple run must appear somewhere in the
/// pipelined register file, and both data memories must be identical.
pub fn final_states_agree(simple: &MachineState, pipelined: &MachineState) -> bool {
    let simple_values: BTreeSet<u64> = simple.regs.snapshot().into_iter().collect();
    let pip_values: BTreeSet<u64> = pipelined.regs.snapshot().into_iter().collect();
    simple_values.is_subset(&pip_values) && simple.memory == pipelined.memory
}
