//! Register Rotation.
//!
//! Maps a register or predicate name to its physical slot for a given
//! rotating register base (RBB). Names below [`ROTATING_BASE`] are static;
//! names in the 64-entry window rotate:
//!
//! ```text
//! physical(n, rbb) = 32 + ((n - 32 - rbb) mod 64)
//! ```
//!
//! Advancing the base by one makes name `n + 1` designate the slot that
//! name `n` designated before. The scheduler uses these functions when it
//! assigns rotating names and the simulator uses them when it resolves
//! operands, so both sides agree by construction.

use crate::common::{ROTATING_BASE, ROTATING_WINDOW};

/// Physical register slot of register name `name` at base `rbb`.
pub fn physical_reg(name: usize, rbb: usize) -> usize {
    rotate(name, rbb)
}

/// Physical predicate slot of predicate name `name` at base `rbb`.
pub fn physical_pred(name: usize, rbb: usize) -> usize {
    rotate(name, rbb)
}

/// Rotating name `offset` positions after `base`, wrapped into the window.
///
/// Negative offsets are allowed. The result always lies in `32..96`.
pub fn rotated_name(base: usize, offset: isize) -> usize {
    let rel = (base as isize - ROTATING_BASE as isize + offset).rem_euclid(ROTATING_WINDOW as isize);
    ROTATING_BASE + rel as usize
}

/// Rotating base after one `loop.pip` iteration.
pub fn advance(rbb: usize) -> usize {
    (rbb + 1) % ROTATING_WINDOW
}

fn rotate(name: usize, rbb: usize) -> usize {
    if name < ROTATING_BASE {
        return name;
    }
    let rel = (name - ROTATING_BASE + ROTATING_WINDOW - rbb % ROTATING_WINDOW) % ROTATING_WINDOW;
    ROTATING_BASE + rel
}
