//! Program Model.
//!
//! A [`Program`] is the validated input instruction list. At most one `loop`
//! instruction splits it into three regions:
//!
//! * **pre-loop**: `[0, target)`, executed once before the loop.
//! * **body**: `[target, loop)`, executed `LC + 1` times.
//! * **post-loop**: `(loop, end)`, executed once after the loop.
//!
//! Instructions are addressed by their program index everywhere in the
//! scheduler; nothing holds a reference into the list.

use std::ops::Range;

use crate::common::{Error, Result};
use crate::isa::{parse_instruction, Instruction, Op, SpecialReg};

/// Dependency graph construction over a program.
pub mod deps;

/// Region of the program an instruction belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    /// Before the loop body.
    PreLoop,
    /// Inside the loop body.
    Body,
    /// The loop-closing branch itself.
    LoopBranch,
    /// After the loop branch.
    PostLoop,
}

/// Position of the loop inside the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopInfo {
    /// Index of the first body instruction (the branch target).
    pub start: usize,
    /// Index of the `loop` instruction; the body is `[start, end)`.
    pub end: usize,
}

/// A parsed and validated input program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    loop_info: Option<LoopInfo>,
}

impl Program {
    /// Builds a program from already decoded instructions.
    ///
    /// # Returns
    ///
    /// A `ParseError` when the list contains more than one loop, a loop whose
    /// target lies after the loop itself, or an instruction that only the
    /// scheduler may emit (`loop.pip`, `nop`, predicate or `EC` moves, and
    /// guarded instructions).
    pub fn new(instructions: Vec<Instruction>) -> Result<Self> {
        let mut loop_info = None;
        for (idx, inst) in instructions.iter().enumerate() {
            if inst.guard.is_some() {
                return Err(Error::parse(idx, "guarded instructions are not allowed in programs"));
            }
            match inst.op {
                Op::Loop { target } => {
                    if loop_info.is_some() {
                        return Err(Error::parse(idx, "only one loop per program is supported"));
                    }
                    if target > idx {
                        return Err(Error::parse(
                            idx,
                            format!("loop target {} lies after the loop instruction", target),
                        ));
                    }
                    loop_info = Some(LoopInfo {
                        start: target,
                        end: idx,
                    });
                }
                Op::LoopPip { .. } => {
                    return Err(Error::parse(idx, "'loop.pip' is produced by the scheduler only"));
                }
                Op::Nop => {
                    return Err(Error::parse(idx, "'nop' is not allowed in programs"));
                }
                Op::MovPred { .. } => {
                    return Err(Error::parse(idx, "predicate moves are produced by the scheduler only"));
                }
                Op::MovSpecial {
                    target: SpecialReg::Ec,
                    ..
                } => {
                    return Err(Error::parse(idx, "EC is managed by the scheduler"));
                }
                _ => {}
            }
        }

        if let Some(info) = loop_info {
            for (idx, inst) in instructions.iter().enumerate().skip(info.start) {
                if matches!(
                    inst.op,
                    Op::MovSpecial {
                        target: SpecialReg::Lc,
                        ..
                    }
                ) {
                    return Err(Error::parse(idx, "LC may only be set before the loop"));
                }
            }
        }

        Ok(Self {
            instructions,
            loop_info,
        })
    }

    /// Parses a program from assembly lines.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let instructions = lines
            .iter()
            .enumerate()
            .map(|(idx, line)| parse_instruction(line.as_ref(), idx))
            .collect::<Result<Vec<_>>>()?;
        Self::new(instructions)
    }

    /// Parses a program from its JSON form (an array of assembly strings).
    pub fn from_json(text: &str) -> Result<Self> {
        let lines: Vec<String> = serde_json::from_str(text)?;
        Self::from_lines(&lines)
    }

    /// All instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Instruction at `idx`.
    pub fn get(&self, idx: usize) -> &Instruction {
        &self.instructions[idx]
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program is empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Loop position, if the program has a loop.
    pub fn loop_info(&self) -> Option<LoopInfo> {
        self.loop_info
    }

    /// Indices of the pre-loop region (the whole program without a loop).
    pub fn pre_loop(&self) -> Range<usize> {
        match self.loop_info {
            Some(info) => 0..info.start,
            None => 0..self.instructions.len(),
        }
    }

    /// Indices of the loop body (empty without a loop).
    pub fn body(&self) -> Range<usize> {
        match self.loop_info {
            Some(info) => info.start..info.end,
            None => 0..0,
        }
    }

    /// Indices of the post-loop region (empty without a loop).
    pub fn post_loop(&self) -> Range<usize> {
        match self.loop_info {
            Some(info) => info.end + 1..self.instructions.len(),
            None => 0..0,
        }
    }

    /// Region of the instruction at `idx`.
    pub fn region(&self, idx: usize) -> Region {
        match self.loop_info {
            None => Region::PreLoop,
            Some(info) if idx < info.start => Region::PreLoop,
            Some(info) if idx < info.end => Region::Body,
            Some(info) if idx == info.end => Region::LoopBranch,
            Some(_) => Region::PostLoop,
        }
    }

    /// Value moved into `LC` by the pre-loop code, if any.
    ///
    /// The body executes `LC + 1` times.
    pub fn trip_count(&self) -> Option<u64> {
        self.instructions[self.pre_loop()]
            .iter()
            .rev()
            .find_map(|inst| match inst.op {
                Op::MovSpecial {
                    target: SpecialReg::Lc,
                    imm,
                } => Some(imm),
                _ => None,
            })
    }
}
