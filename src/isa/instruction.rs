//! Typed Instructions.
//!
//! An [`Instruction`] is an optional guarding predicate plus an [`Op`].
//! Operands are plain register indices; whether an index names a static or
//! a rotating register is decided by the register file, not here.
//!
//! The `Display` implementation renders the canonical assembly text that
//! the scheduler writes into schedule files and the parser reads back.

use std::fmt;

use super::opcodes::{Opcode, Unit};

/// General-purpose register index (`x0`..`x95`).
pub type RegId = usize;

/// Predicate register index (`p0`..`p95`).
pub type PredId = usize;

/// Loop-control registers that can be set with `mov`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialReg {
    /// Loop counter.
    Lc,
    /// Epilogue counter.
    Ec,
}

impl SpecialReg {
    /// Assembly name of the register.
    pub fn name(self) -> &'static str {
        match self {
            SpecialReg::Lc => "LC",
            SpecialReg::Ec => "EC",
        }
    }
}

/// Operation performed by an instruction, with its operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// `add rd, rs1, rs2`
    Add { rd: RegId, rs1: RegId, rs2: RegId },
    /// `addi rd, rs1, imm`
    Addi { rd: RegId, rs1: RegId, imm: i64 },
    /// `sub rd, rs1, rs2`
    Sub { rd: RegId, rs1: RegId, rs2: RegId },
    /// `mulu rd, rs1, rs2`
    Mulu { rd: RegId, rs1: RegId, rs2: RegId },
    /// `ld rd, imm(base)`
    Ld { rd: RegId, imm: i64, base: RegId },
    /// `st rs, imm(base)`
    St { rs: RegId, imm: i64, base: RegId },
    /// `mov rd, rs`
    MovReg { rd: RegId, rs: RegId },
    /// `mov rd, imm`
    MovImm { rd: RegId, imm: i64 },
    /// `mov LC, imm` / `mov EC, imm`
    MovSpecial { target: SpecialReg, imm: u64 },
    /// `mov pd, true|false`
    MovPred { pd: PredId, value: bool },
    /// `loop target`
    Loop { target: usize },
    /// `loop.pip target`
    LoopPip { target: usize },
    /// `nop`
    Nop,
}

/// A possibly predicated instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Guarding predicate; `None` means the instruction always executes.
    pub guard: Option<PredId>,
    /// Operation and operands.
    pub op: Op,
}

impl Instruction {
    /// Creates an unguarded instruction.
    pub fn new(op: Op) -> Self {
        Self { guard: None, op }
    }

    /// Returns the instruction guarded by predicate `pred`.
    pub fn guarded(self, pred: PredId) -> Self {
        Self {
            guard: Some(pred),
            ..self
        }
    }

    /// Returns a `nop`.
    pub fn nop() -> Self {
        Self::new(Op::Nop)
    }

    /// Opcode of the operation.
    pub fn opcode(&self) -> Opcode {
        match self.op {
            Op::Add { .. } => Opcode::Add,
            Op::Addi { .. } => Opcode::Addi,
            Op::Sub { .. } => Opcode::Sub,
            Op::Mulu { .. } => Opcode::Mulu,
            Op::Ld { .. } => Opcode::Ld,
            Op::St { .. } => Opcode::St,
            Op::MovReg { .. }
            | Op::MovImm { .. }
            | Op::MovSpecial { .. }
            | Op::MovPred { .. } => Opcode::Mov,
            Op::Loop { .. } => Opcode::Loop,
            Op::LoopPip { .. } => Opcode::LoopPip,
            Op::Nop => Opcode::Nop,
        }
    }

    /// Result latency in cycles.
    pub fn latency(&self) -> usize {
        self.opcode().latency()
    }

    /// Issue resource, or `None` for `nop`.
    pub fn unit(&self) -> Option<Unit> {
        self.opcode().unit()
    }

    /// Whether this is one of the loop-closing branches.
    pub fn is_loop(&self) -> bool {
        matches!(self.op, Op::Loop { .. } | Op::LoopPip { .. })
    }

    /// Destination general-purpose register, if the instruction writes one.
    pub fn dest(&self) -> Option<RegId> {
        match self.op {
            Op::Add { rd, .. }
            | Op::Addi { rd, .. }
            | Op::Sub { rd, .. }
            | Op::Mulu { rd, .. }
            | Op::Ld { rd, .. }
            | Op::MovReg { rd, .. }
            | Op::MovImm { rd, .. } => Some(rd),
            _ => None,
        }
    }

    /// Source registers in operand order.
    pub fn sources(&self) -> Vec<RegId> {
        match self.op {
            Op::Add { rs1, rs2, .. } | Op::Sub { rs1, rs2, .. } | Op::Mulu { rs1, rs2, .. } => {
                vec![rs1, rs2]
            }
            Op::Addi { rs1, .. } => vec![rs1],
            Op::Ld { base, .. } => vec![base],
            Op::St { rs, base, .. } => vec![rs, base],
            Op::MovReg { rs, .. } => vec![rs],
            _ => Vec::new(),
        }
    }

    /// Predicate register written by the instruction, if any.
    pub fn pred_dest(&self) -> Option<PredId> {
        match self.op {
            Op::MovPred { pd, .. } => Some(pd),
            _ => None,
        }
    }

    /// Returns a copy with the destination and sources replaced.
    ///
    /// `sources` must have the same length as [`Instruction::sources`]; the
    /// destination is only replaced when the instruction has one. The guard
    /// is kept.
    pub fn renamed(&self, dest: Option<RegId>, sources: &[RegId]) -> Instruction {
        debug_assert_eq!(sources.len(), self.sources().len());
        let d = |old: RegId| dest.unwrap_or(old);
        let op = match self.op {
            Op::Add { rd, .. } => Op::Add {
                rd: d(rd),
                rs1: sources[0],
                rs2: sources[1],
            },
            Op::Sub { rd, .. } => Op::Sub {
                rd: d(rd),
                rs1: sources[0],
                rs2: sources[1],
            },
            Op::Mulu { rd, .. } => Op::Mulu {
                rd: d(rd),
                rs1: sources[0],
                rs2: sources[1],
            },
            Op::Addi { rd, imm, .. } => Op::Addi {
                rd: d(rd),
                rs1: sources[0],
                imm,
            },
            Op::Ld { rd, imm, .. } => Op::Ld {
                rd: d(rd),
                imm,
                base: sources[0],
            },
            Op::St { imm, .. } => Op::St {
                rs: sources[0],
                imm,
                base: sources[1],
            },
            Op::MovReg { rd, .. } => Op::MovReg {
                rd: d(rd),
                rs: sources[0],
            },
            Op::MovImm { rd, imm } => Op::MovImm { rd: d(rd), imm },
            ref other => other.clone(),
        };
        Instruction {
            guard: self.guard,
            op,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = self.guard {
            write!(f, "(p{}) ", p)?;
        }
        match &self.op {
            Op::Add { rd, rs1, rs2 } => write!(f, "add x{}, x{}, x{}", rd, rs1, rs2),
            Op::Sub { rd, rs1, rs2 } => write!(f, "sub x{}, x{}, x{}", rd, rs1, rs2),
            Op::Mulu { rd, rs1, rs2 } => write!(f, "mulu x{}, x{}, x{}", rd, rs1, rs2),
            Op::Addi { rd, rs1, imm } => write!(f, "addi x{}, x{}, {}", rd, rs1, imm),
            Op::Ld { rd, imm, base } => write!(f, "ld x{}, {}(x{})", rd, imm, base),
            Op::St { rs, imm, base } => write!(f, "st x{}, {}(x{})", rs, imm, base),
            Op::MovReg { rd, rs } => write!(f, "mov x{}, x{}", rd, rs),
            Op::MovImm { rd, imm } => write!(f, "mov x{}, {}", rd, imm),
            Op::MovSpecial { target, imm } => write!(f, "mov {}, {}", target.name(), imm),
            Op::MovPred { pd, value } => write!(f, "mov p{}, {}", pd, value),
            Op::Loop { target } => write!(f, "loop {}", target),
            Op::LoopPip { target } => write!(f, "loop.pip {}", target),
            Op::Nop => f.write_str("nop"),
        }
    }
}
