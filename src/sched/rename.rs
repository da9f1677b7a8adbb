//! Register Allocation.
//!
//! Rewrites the operands of scheduled instructions.
//!
//! * `loop` schedules use static registers only: every destination gets a
//!   fresh register from `x1` upwards, in issue order.
//! * `loop.pip` schedules give each body destination a block of at least
//!   `S + 1` rotating names, more when a multiply is still in flight when
//!   the block would otherwise be reused. A reader at stage `sc` of a value
//!   produced at stage `sp` uses the name `sc - sp` positions after the
//!   producer's (one more for a loop-carried read), because the base
//!   advances once per kernel iteration. Everything outside the body uses
//!   static registers `x1..x31`.
//!
//! Operands without a producer read a register nobody writes, shared by
//! all readers of the same original register.

use std::collections::HashMap;

use super::bundle::issue_order;
use super::{Entry, Work};
use crate::common::constants::{NUM_REGISTERS, ROTATING_BASE, ROTATING_WINDOW};
use crate::common::{Error, Result};
use crate::core::arch::rotation::{physical_reg, rotated_name};
use crate::isa::{Instruction, Op, RegId, SpecialReg};
use crate::program::deps::{DepGraph, OperandSource};
use crate::program::{Program, Region};

/// Hands out fresh static registers from `x1` up to (excluding) `limit`.
struct StaticAllocator {
    next: RegId,
    limit: RegId,
    undefined: HashMap<RegId, RegId>,
}

impl StaticAllocator {
    fn new(limit: RegId) -> Self {
        Self {
            next: 1,
            limit,
            undefined: HashMap::new(),
        }
    }

    fn fresh(&mut self) -> Result<RegId> {
        if self.next >= self.limit {
            return Err(Error::infeasible(format!(
                "static registers exhausted (x1..x{})",
                self.limit - 1
            )));
        }
        self.next += 1;
        Ok(self.next - 1)
    }

    /// Register standing in for the never-written original register `orig`.
    fn undefined(&mut self, orig: RegId) -> Result<RegId> {
        if let Some(&r) = self.undefined.get(&orig) {
            return Ok(r);
        }
        let r = self.fresh()?;
        self.undefined.insert(orig, r);
        Ok(r)
    }
}

fn missing(what: &str, idx: usize) -> Error {
    Error::Internal(format!("no register assigned to {} {}", what, idx))
}

/// Allocates static registers for a `loop` schedule (or a program without a loop).
///
/// # Arguments
///
/// * `entries` - The timed entries of the schedule.
/// * `loop_start` - Target of the `loop` branch, if the program has a loop.
///
/// # Returns
///
/// The renamed instruction of every entry, parallel to `entries`.
pub fn allocate_static(
    program: &Program,
    graph: &DepGraph,
    entries: &[Entry],
    loop_start: Option<usize>,
) -> Result<Vec<Instruction>> {
    let order = issue_order(entries);
    let mut alloc = StaticAllocator::new(NUM_REGISTERS);
    let mut reg_of: Vec<Option<RegId>> = vec![None; program.len()];
    for &i in &order {
        if let Work::Program(p) = entries[i].work {
            if program.get(p).dest().is_some() {
                reg_of[p] = Some(alloc.fresh()?);
            }
        }
    }
    let reg = |p: usize| reg_of[p].ok_or_else(|| missing("instruction", p));

    let mut code = vec![Instruction::nop(); entries.len()];
    for &i in &order {
        code[i] = match entries[i].work {
            Work::Program(c) => {
                let inst = program.get(c);
                if inst.is_loop() {
                    let target = loop_start
                        .ok_or_else(|| Error::Internal("loop branch without a loop start".into()))?;
                    Instruction::new(Op::Loop { target })
                } else {
                    let mut sources = Vec::new();
                    for (orig, src) in inst.sources().into_iter().zip(graph.operand_sources(c)) {
                        sources.push(match *src {
                            OperandSource::Undefined => alloc.undefined(orig)?,
                            OperandSource::Local(p)
                            | OperandSource::Invariant(p)
                            | OperandSource::PostLoop(p)
                            | OperandSource::LoopCarried {
                                producer: p,
                                entry: None,
                            } => reg(p)?,
                            OperandSource::LoopCarried { entry: Some(q), .. } => reg(q)?,
                        });
                    }
                    inst.renamed(reg_of[c], &sources)
                }
            }
            Work::CarryMove { entry, body } => Instruction::new(Op::MovReg {
                rd: reg(entry)?,
                rs: reg(body)?,
            }),
            other => {
                return Err(Error::Internal(format!(
                    "{:?} has no meaning in a non-pipelined schedule",
                    other
                )))
            }
        };
    }
    Ok(code)
}

/// Shape of a software-pipelined loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineShape {
    pub loop_start: usize,
    pub ii: usize,
    pub stages: usize,
}

/// A body instruction that writes a rotating register.
#[derive(Clone, Copy, Debug)]
struct Writer {
    instruction: usize,
    base: RegId,
    stage: usize,
    /// Issue cycle relative to the start of its iteration.
    time: usize,
    latency: usize,
}

impl Writer {
    /// Kernel pass in which `iteration` issues this writer.
    fn pass(&self, iteration: isize) -> isize {
        iteration + self.stage as isize
    }

    /// Physical register written by `iteration`.
    fn slot(&self, iteration: isize) -> usize {
        physical_reg(self.base, rbb_at(self.pass(iteration)))
    }

    /// Cycle in which the result of `iteration` is committed, counted from
    /// the first kernel pass.
    fn lands(&self, iteration: isize, ii: usize) -> isize {
        iteration * ii as isize + (self.time + self.latency) as isize - 1
    }
}

fn rbb_at(pass: isize) -> usize {
    pass.rem_euclid(ROTATING_WINDOW as isize) as usize
}

/// A read of a rotating value by a renamed instruction.
#[derive(Clone, Copy, Debug)]
struct Read {
    consumer: usize,
    name: RegId,
    pass: isize,
    /// `None` for post-loop code, which runs after the last kernel pass.
    cycle: Option<isize>,
}

/// One value held in a rotating register, as seen by the first kernel
/// iteration. Later iterations repeat the same pattern `II` cycles apart.
#[derive(Debug)]
struct Value {
    producer: usize,
    slot: usize,
    lands: isize,
    /// Iterations before this one never overlap the value. A value seeded
    /// before the loop only meets real iterations.
    first_iteration: isize,
    /// Body writer whose first iteration produced the value.
    own: Option<usize>,
    reads: Vec<Read>,
}

/// Allocates rotating registers for the body of a `loop.pip` schedule and
/// static registers elsewhere.
///
/// Each body destination owns a block of consecutive rotating names. A block
/// holds one value per name, so it must cover every reader (at most `S`
/// rotations away) and the cycles a long-latency result spends in flight
/// before it lands.
///
/// # Returns
///
/// The renamed instruction of every entry, parallel to `entries`; an
/// `InfeasibleSchedule` error when the rotating window or the static
/// registers run out; an `Internal` error when a renamed value would be
/// read from the wrong physical register or overwritten before its last
/// read.
pub fn allocate_rotating(
    program: &Program,
    graph: &DepGraph,
    entries: &[Entry],
    shape: PipelineShape,
) -> Result<Vec<Instruction>> {
    let PipelineShape { ii, stages, .. } = shape;

    let mut stage_of = vec![0usize; program.len()];
    let mut time_of = vec![0usize; program.len()];
    for e in entries {
        if let Work::Program(p) = e.work {
            stage_of[p] = e.stage;
            time_of[p] = e.stage * ii + e.cycle.saturating_sub(shape.loop_start);
        }
    }

    // Rotating blocks for body destinations, in program order.
    let mut writers = Vec::new();
    let mut next = ROTATING_BASE;
    for p in program.body() {
        let inst = program.get(p);
        if inst.dest().is_none() {
            continue;
        }
        let row = time_of[p] % ii;
        let span = (stages + 1).max((row + inst.latency() + ii - 1) / ii);
        writers.push(Writer {
            instruction: p,
            base: next,
            stage: stage_of[p],
            time: time_of[p],
            latency: inst.latency(),
        });
        next += span;
    }
    let needed = next - ROTATING_BASE;
    if needed > ROTATING_WINDOW {
        return Err(Error::infeasible(format!(
            "{} loop values with {} stages need {} rotating registers, only {} exist",
            writers.len(),
            stages,
            needed,
            ROTATING_WINDOW
        )));
    }
    let mut base: Vec<Option<RegId>> = vec![None; program.len()];
    let mut values: Vec<Option<Value>> = (0..program.len()).map(|_| None).collect();
    for w in &writers {
        base[w.instruction] = Some(w.base);
        values[w.instruction] = Some(Value {
            producer: w.instruction,
            slot: w.slot(0),
            lands: w.lands(0, ii),
            first_iteration: isize::MIN,
            own: Some(w.instruction),
            reads: Vec::new(),
        });
    }
    let base_of = |p: usize| base[p].ok_or_else(|| missing("body instruction", p));

    // Pre-loop writers that seed a loop-carried value write straight into
    // the rotating name the first reader will see.
    let mut entry_name: Vec<Option<RegId>> = vec![None; program.len()];
    let mut entry_values: Vec<Option<Value>> = (0..program.len()).map(|_| None).collect();
    for c in program.body() {
        for src in graph.operand_sources(c) {
            if let OperandSource::LoopCarried {
                producer,
                entry: Some(q),
            } = *src
            {
                let name = rotated_name(base_of(producer)?, 1 - stage_of[producer] as isize);
                entry_name[q] = Some(name);
                entry_values[q] = Some(Value {
                    producer: q,
                    slot: physical_reg(name, 0),
                    lands: -1,
                    first_iteration: 0,
                    own: None,
                    reads: Vec::new(),
                });
            }
        }
    }

    let order = issue_order(entries);
    let mut alloc = StaticAllocator::new(ROTATING_BASE);
    let mut static_reg: Vec<Option<RegId>> = vec![None; program.len()];
    for &i in &order {
        if let Work::Program(p) = entries[i].work {
            let outside = matches!(program.region(p), Region::PreLoop | Region::PostLoop);
            if outside && program.get(p).dest().is_some() && entry_name[p].is_none() {
                static_reg[p] = Some(alloc.fresh()?);
            }
        }
    }
    // Register of an instruction outside the body.
    let outer = |p: usize| {
        entry_name[p]
            .or(static_reg[p])
            .ok_or_else(|| missing("instruction", p))
    };

    let mut code = vec![Instruction::nop(); entries.len()];
    for &i in &order {
        code[i] = match entries[i].work {
            Work::SetEc => Instruction::new(Op::MovSpecial {
                target: SpecialReg::Ec,
                imm: stages as u64 - 1,
            }),
            Work::InitStagePredicate { stage } => Instruction::new(Op::MovPred {
                pd: ROTATING_BASE + stage,
                value: stage == 0,
            }),
            Work::CarryMove { .. } => {
                return Err(Error::Internal(
                    "carry moves have no meaning in a pipelined schedule".into(),
                ))
            }
            Work::Program(c) => {
                let inst = program.get(c);
                match program.region(c) {
                    Region::LoopBranch => Instruction::new(Op::LoopPip {
                        target: shape.loop_start,
                    }),
                    Region::Body => {
                        let sc = stage_of[c];
                        let tc = time_of[c] as isize;
                        let mut sources = Vec::new();
                        for (orig, src) in inst.sources().into_iter().zip(graph.operand_sources(c)) {
                            sources.push(match *src {
                                OperandSource::Undefined => alloc.undefined(orig)?,
                                OperandSource::Invariant(q) => outer(q)?,
                                OperandSource::Local(p) => {
                                    let offset = sc as isize - stage_of[p] as isize;
                                    let name = rotated_name(base_of(p)?, offset);
                                    record(&mut values, p, Read {
                                        consumer: c,
                                        name,
                                        pass: sc as isize,
                                        cycle: Some(tc),
                                    })?;
                                    name
                                }
                                OperandSource::LoopCarried { producer: p, entry } => {
                                    let offset = sc as isize - stage_of[p] as isize + 1;
                                    let name = rotated_name(base_of(p)?, offset);
                                    record(&mut values, p, Read {
                                        consumer: c,
                                        name,
                                        pass: sc as isize + 1,
                                        cycle: Some(tc + ii as isize),
                                    })?;
                                    if let Some(q) = entry {
                                        record(&mut entry_values, q, Read {
                                            consumer: c,
                                            name,
                                            pass: sc as isize,
                                            cycle: Some(tc),
                                        })?;
                                    }
                                    name
                                }
                                OperandSource::PostLoop(_) => {
                                    return Err(Error::Internal(format!(
                                        "body instruction {} resolved a post-loop source",
                                        c
                                    )))
                                }
                            });
                        }
                        inst.renamed(base[c], &sources)
                            .guarded(ROTATING_BASE + sc)
                    }
                    Region::PreLoop | Region::PostLoop => {
                        let mut sources = Vec::new();
                        for (orig, src) in inst.sources().into_iter().zip(graph.operand_sources(c)) {
                            sources.push(match *src {
                                OperandSource::Undefined => alloc.undefined(orig)?,
                                OperandSource::Local(p) | OperandSource::Invariant(p) => outer(p)?,
                                OperandSource::PostLoop(p) => {
                                    let offset = stages as isize - 1 - stage_of[p] as isize;
                                    let name = rotated_name(base_of(p)?, offset);
                                    record(&mut values, p, Read {
                                        consumer: c,
                                        name,
                                        pass: stages as isize - 1,
                                        cycle: None,
                                    })?;
                                    name
                                }
                                OperandSource::LoopCarried { .. } => {
                                    return Err(Error::Internal(format!(
                                        "instruction {} outside the body resolved a loop-carried source",
                                        c
                                    )))
                                }
                            });
                        }
                        let dest = if inst.dest().is_some() {
                            Some(outer(c)?)
                        } else {
                            None
                        };
                        inst.renamed(dest, &sources)
                    }
                }
            }
        };
    }

    let live = values.iter().chain(&entry_values).flatten();
    check_lifetimes(live, &writers, ii, stages)?;
    Ok(code)
}

fn record(values: &mut [Option<Value>], producer: usize, read: Read) -> Result<()> {
    values[producer]
        .as_mut()
        .ok_or_else(|| missing("rotating value of instruction", producer))?
        .reads
        .push(read);
    Ok(())
}

/// Checks every rotating value against the physical register file: each
/// reader's name must resolve to the slot the producer wrote, the value
/// must have landed by the time it is read, and no other write may land in
/// that slot between the producer's write and the last read.
///
/// Writers are replayed over a full turn of the window in both directions,
/// which covers every iteration that can share a slot with the value.
fn check_lifetimes<'a>(
    values: impl Iterator<Item = &'a Value>,
    writers: &[Writer],
    ii: usize,
    stages: usize,
) -> Result<()> {
    let turn = ROTATING_WINDOW as isize;
    for value in values {
        for read in &value.reads {
            let seen = physical_reg(read.name, rbb_at(read.pass));
            if seen != value.slot {
                return Err(Error::Internal(format!(
                    "instruction {} reads x{} (physical {}) but instruction {} wrote physical {}",
                    read.consumer, read.name, seen, value.producer, value.slot
                )));
            }
            if read.cycle.map_or(false, |cycle| cycle <= value.lands) {
                return Err(Error::Internal(format!(
                    "instruction {} reads x{} before instruction {} has written it",
                    read.consumer, read.name, value.producer
                )));
            }
        }

        for w in writers {
            for iteration in -turn..=turn {
                let pass = w.pass(iteration);
                if iteration < value.first_iteration
                    || (value.own == Some(w.instruction) && iteration == 0)
                    || w.slot(iteration) != value.slot
                {
                    continue;
                }
                let lands = w.lands(iteration, ii);
                if lands < value.lands {
                    continue;
                }
                let clobbered = value.reads.iter().find(|read| match read.cycle {
                    Some(cycle) => lands < cycle,
                    None => pass < stages as isize,
                });
                if let Some(read) = clobbered {
                    return Err(Error::Internal(format!(
                        "physical {} written by instruction {} is overwritten by instruction {} before instruction {} reads it",
                        value.slot, value.producer, w.instruction, read.consumer
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULU: Writer = Writer {
        instruction: 0,
        base: 32,
        stage: 0,
        time: 0,
        latency: 3,
    };

    fn addi(base: RegId) -> Writer {
        Writer {
            instruction: 1,
            base,
            stage: 0,
            time: 0,
            latency: 1,
        }
    }

    /// The `addi` result of the first pass, read by the next iteration.
    fn carried(w: &Writer, name: RegId) -> Value {
        Value {
            producer: w.instruction,
            slot: w.slot(0),
            lands: w.lands(0, 1),
            first_iteration: isize::MIN,
            own: Some(w.instruction),
            reads: vec![Read {
                consumer: w.instruction,
                name,
                pass: 1,
                cycle: Some(1),
            }],
        }
    }

    #[test]
    fn multiply_landing_in_a_reused_register_is_rejected() {
        // With II 1 a multiply issued two passes earlier lands in x34's
        // slot in the same cycle the add writes it.
        let addi = addi(34);
        let value = carried(&addi, 35);
        let err = check_lifetimes(std::iter::once(&value), &[MULU, addi], 1, 1).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(err.to_string().contains("overwritten by instruction 0"));
    }

    #[test]
    fn block_covering_the_multiply_latency_is_accepted() {
        let addi = addi(35);
        let value = carried(&addi, 36);
        assert!(check_lifetimes(std::iter::once(&value), &[MULU, addi], 1, 1).is_ok());
    }

    #[test]
    fn read_through_the_wrong_name_is_rejected() {
        let addi = addi(35);
        let value = carried(&addi, 35);
        let err = check_lifetimes(std::iter::once(&value), &[MULU, addi], 1, 1).unwrap_err();
        assert!(err.to_string().contains("reads x35"));
    }
}
