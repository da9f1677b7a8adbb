//! Instruction set of the target VLIW machine.
//!
//! The machine understands a small fixed set of opcodes. This module holds
//! the opcode table (latency and functional-unit class of every opcode),
//! the typed instruction representation, and the parser for the textual
//! assembly used by both program files and schedule files.

/// Five-slot instruction words.
pub mod bundle;

/// Typed instruction representation and canonical rendering.
pub mod instruction;

/// Opcode table: latencies and functional-unit classes.
pub mod opcodes;

/// Assembly text parser.
pub mod parse;

pub use bundle::{Bundle, Slot};
pub use instruction::{Instruction, Op, PredId, RegId, SpecialReg};
pub use opcodes::{Opcode, OpcodeInfo, Unit, UnitClass};
pub use parse::parse_instruction;
