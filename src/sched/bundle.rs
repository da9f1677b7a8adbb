//! Bundle Encoder.
//!
//! Groups schedule entries by cycle and assigns each one a slot. Entries of
//! one cycle are taken in issue order (resource, then entry position), so
//! the first ALU entry lands in ALU0 and the second in ALU1. Exceeding a
//! slot kind's capacity means the scheduler produced a bad schedule and is
//! reported as an internal error.

use super::{Entry, Schedule};
use crate::common::{Error, Result};
use crate::isa::{Bundle, Slot};

/// Entry positions sorted by cycle, then resource, then position.
///
/// This is the order in which slots are filled and in which the `loop`
/// register allocator hands out registers.
pub fn issue_order(entries: &[Entry]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| (entries[i].cycle, entries[i].unit.index(), i));
    order
}

/// Encodes `schedule` into `schedule.length` bundles.
///
/// # Returns
///
/// The bundles and, parallel to `schedule.entries`, the slot each entry
/// was assigned.
pub fn encode(schedule: &Schedule) -> Result<(Vec<Bundle>, Vec<Slot>)> {
    if schedule.code.len() != schedule.entries.len() {
        return Err(Error::Internal(format!(
            "{} entries but {} renamed instructions",
            schedule.entries.len(),
            schedule.code.len()
        )));
    }

    let mut bundles = vec![Bundle::empty(); schedule.length];
    let mut slots = vec![Slot::Alu0; schedule.entries.len()];
    for i in issue_order(&schedule.entries) {
        let entry = &schedule.entries[i];
        let bundle = bundles.get_mut(entry.cycle).ok_or_else(|| {
            Error::Internal(format!(
                "entry at cycle {} lies past the last bundle {}",
                entry.cycle, schedule.length
            ))
        })?;
        let slot = Slot::for_unit(entry.unit)
            .iter()
            .copied()
            .find(|&s| bundle.get(s).is_none())
            .ok_or_else(|| {
                Error::Internal(format!(
                    "cycle {} exceeds the {:?} capacity",
                    entry.cycle, entry.unit
                ))
            })?;
        bundle.set(slot, schedule.code[i].clone())?;
        slots[i] = slot;
    }
    Ok((bundles, slots))
}
