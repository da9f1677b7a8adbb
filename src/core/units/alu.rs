//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer arithmetic shared by the two ALU
//! slots and the multiply pipeline. All arithmetic is on 64-bit unsigned
//! values and wraps on overflow.

use crate::isa::Opcode;

/// Arithmetic Logic Unit (ALU) for integer operations.
pub struct Alu;

impl Alu {
    /// Executes an integer operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The opcode to evaluate
    /// * `a` - First operand
    /// * `b` - Second operand (register value or sign-extended immediate)
    ///
    /// # Returns
    ///
    /// The 64-bit result. `mov` passes `a` through; opcodes without an
    /// arithmetic result yield 0.
    pub fn execute(op: Opcode, a: u64, b: u64) -> u64 {
        match op {
            Opcode::Add | Opcode::Addi => a.wrapping_add(b),
            Opcode::Sub => a.wrapping_sub(b),
            Opcode::Mulu => a.wrapping_mul(b),
            Opcode::Mov => a,
            _ => 0,
        }
    }
}
