//! Architectural Constants.
//!
//! Sizes of the register files and the geometry of the rotating window.
//! Both the scheduler (when it assigns rotating names) and the simulator
//! (when it resolves them) derive their arithmetic from these values.

/// Number of general-purpose registers (`x0`..`x95`).
pub const NUM_REGISTERS: usize = 96;

/// Number of predicate registers (`p0`..`p95`).
pub const NUM_PREDICATES: usize = 96;

/// First rotating register index; everything below is statically mapped.
pub const ROTATING_BASE: usize = 32;

/// Number of registers in the rotating window.
pub const ROTATING_WINDOW: usize = 64;

/// Number of stages in the multiply pipeline.
pub const MULT_STAGES: usize = 3;

/// Number of issue slots in one bundle (ALU0, ALU1, MULT, MEM, BRANCH).
pub const BUNDLE_SLOTS: usize = 5;
