//! Non-overlapped Scheduler.
//!
//! ASAP list scheduling of the three regions in turn. Iterations of the
//! loop never overlap: the body is scheduled once relative to the loop
//! start, and the iteration length is stretched until every loop-carried
//! value is ready before the next iteration reads it.
//!
//! A loop-carried value that also has a pre-loop writer is read from that
//! writer's register in every iteration; a `mov` at the end of the body
//! copies the new value into it.

use std::collections::BTreeSet;

use log::debug;

use super::rename;
use super::resources::ReservationTable;
use super::{Entry, Mode, Schedule, Work};
use crate::common::{Error, Result};
use crate::isa::Unit;
use crate::program::deps::{DepGraph, EdgeKind, OperandSource};
use crate::program::Program;

/// Schedules the program region by region.
///
/// Pre-loop instructions are placed first. The body is placed relative to
/// the loop start, which is padded until values from the pre-loop code are
/// ready. Post-loop instructions follow the last iteration.
pub fn schedule(program: &Program, graph: &DepGraph) -> Result<Schedule> {
    let mut entries = Vec::new();

    let pre = schedule_pre_loop(program, graph, &[], &mut entries)?;
    let bb0_len = end_of(&entries);

    let Some(info) = program.loop_info() else {
        let code = rename::allocate_static(program, graph, &entries, None)?;
        return Ok(Schedule {
            mode: Mode::Loop,
            ii: 0,
            stages: 0,
            loop_start: None,
            length: bb0_len,
            entries,
            code,
        });
    };

    // Body, relative to the loop start.
    let body = program.body();
    let mut rel: Vec<Option<usize>> = vec![None; program.len()];
    let mut table = ReservationTable::linear();
    for &c in graph.order().iter().filter(|i| body.contains(i)) {
        let mut est = 0;
        for e in graph.incoming(c) {
            match e.kind {
                EdgeKind::Local => {
                    if let Some(p) = rel[e.producer] {
                        est = est.max(p + e.latency);
                    }
                }
                // The reader of a carried value must see it before this
                // iteration's write lands.
                EdgeKind::Anti => {
                    if let Some(r) = rel[e.producer] {
                        est = est.max((r + 1).saturating_sub(e.latency));
                    }
                }
                _ => {}
            }
        }
        rel[c] = Some(table.place_asap(est, unit_of(program, c)?));
    }
    let body_len = body.clone().filter_map(|i| rel[i]).map(|c| c + 1).max().unwrap_or(0);
    let rel_of = |i: usize| rel[i].unwrap_or(0);

    let mut loop_start = bb0_len;
    for e in graph.edges_of(EdgeKind::Invariant) {
        if body.contains(&e.consumer) {
            if let Some(q) = pre[e.producer] {
                loop_start = loop_start.max((q + e.latency).saturating_sub(rel_of(e.consumer)));
            }
        }
    }

    // Iteration length and the moves that carry values into entry registers.
    let mut ii = body_len.max(1);
    let mut carries: BTreeSet<(usize, usize)> = BTreeSet::new();
    for c in body.clone() {
        for src in graph.operand_sources(c) {
            if let OperandSource::LoopCarried { producer, entry } = *src {
                match entry {
                    None => {
                        let ready = rel_of(producer) + program.get(producer).latency();
                        ii = ii.max(ready.saturating_sub(rel_of(c)));
                    }
                    Some(q) => {
                        carries.insert((q, producer));
                    }
                }
            }
        }
    }

    let windows: Vec<(usize, usize, usize)> = carries
        .iter()
        .map(|&(q, p)| {
            let last_read = body
                .clone()
                .filter(|&c| {
                    graph.operand_sources(c).iter().any(|s| {
                        *s == OperandSource::LoopCarried {
                            producer: p,
                            entry: Some(q),
                        }
                    })
                })
                .map(rel_of)
                .max()
                .unwrap_or(0);
            let ready = rel_of(p) + program.get(p).latency();
            (q, p, ready.max(last_read))
        })
        .collect();

    let moves = loop {
        let mut attempt = table.clone();
        let placed: Option<Vec<Entry>> = windows
            .iter()
            .map(|&(q, p, lo)| {
                if lo > ii - 1 {
                    return None;
                }
                attempt.place_within(lo, ii - 1, Unit::Alu).map(|c| Entry {
                    work: Work::CarryMove { entry: q, body: p },
                    cycle: loop_start + c,
                    unit: Unit::Alu,
                    stage: 0,
                })
            })
            .collect();
        match placed {
            Some(moves) => break moves,
            None => ii += 1,
        }
    };

    debug!(
        "[Scheduler] loop: pre-loop {} bundles, loop start {}, body {} bundles, iteration length {}",
        bb0_len, loop_start, body_len, ii
    );

    for c in body.clone() {
        entries.push(Entry {
            work: Work::Program(c),
            cycle: loop_start + rel_of(c),
            unit: unit_of(program, c)?,
            stage: 0,
        });
    }
    entries.extend(moves);
    entries.push(Entry {
        work: Work::Program(info.end),
        cycle: loop_start + ii - 1,
        unit: Unit::Branch,
        stage: 0,
    });

    // Post-loop, after the last iteration.
    let post_start = loop_start + ii;
    schedule_post_loop(program, graph, &mut entries, post_start, &pre, |p, lat| {
        loop_start + rel_of(p) + lat
    })?;

    let length = end_of(&entries);
    let code = rename::allocate_static(program, graph, &entries, Some(loop_start))?;
    Ok(Schedule {
        mode: Mode::Loop,
        ii,
        stages: 1,
        loop_start: Some(loop_start),
        length,
        entries,
        code,
    })
}

/// ASAP-schedules the pre-loop region followed by `extra` work items.
///
/// # Returns
///
/// The absolute cycle of every pre-loop instruction, indexed by program
/// index. Placed entries are appended to `entries`.
pub(crate) fn schedule_pre_loop(
    program: &Program,
    graph: &DepGraph,
    extra: &[Work],
    entries: &mut Vec<Entry>,
) -> Result<Vec<Option<usize>>> {
    let pre = program.pre_loop();
    let mut cycle: Vec<Option<usize>> = vec![None; program.len()];
    let mut table = ReservationTable::linear();
    for &c in graph.order().iter().filter(|i| pre.contains(i)) {
        let est = graph
            .incoming(c)
            .filter(|e| e.kind == EdgeKind::Local)
            .filter_map(|e| cycle[e.producer].map(|p| p + e.latency))
            .max()
            .unwrap_or(0);
        let unit = unit_of(program, c)?;
        let at = table.place_asap(est, unit);
        cycle[c] = Some(at);
        entries.push(Entry {
            work: Work::Program(c),
            cycle: at,
            unit,
            stage: 0,
        });
    }
    for &work in extra {
        let at = table.place_asap(0, Unit::Alu);
        entries.push(Entry {
            work,
            cycle: at,
            unit: Unit::Alu,
            stage: 0,
        });
    }
    Ok(cycle)
}

/// ASAP-schedules the post-loop region starting at `start`.
///
/// `body_ready(p, latency)` gives the first cycle at which the value written
/// by body instruction `p` in the last iteration can be read.
pub(crate) fn schedule_post_loop(
    program: &Program,
    graph: &DepGraph,
    entries: &mut Vec<Entry>,
    start: usize,
    pre: &[Option<usize>],
    body_ready: impl Fn(usize, usize) -> usize,
) -> Result<()> {
    let post = program.post_loop();
    let mut cycle: Vec<Option<usize>> = vec![None; program.len()];
    let mut table = ReservationTable::linear();
    for &c in graph.order().iter().filter(|i| post.contains(i)) {
        let mut est = start;
        for e in graph.incoming(c) {
            let ready = match e.kind {
                EdgeKind::Local => cycle[e.producer].map(|p| p + e.latency),
                EdgeKind::PostLoop => Some(body_ready(e.producer, e.latency)),
                EdgeKind::Invariant => pre[e.producer].map(|q| q + e.latency),
                _ => None,
            };
            est = est.max(ready.unwrap_or(0));
        }
        let unit = unit_of(program, c)?;
        let at = table.place_asap(est, unit);
        cycle[c] = Some(at);
        entries.push(Entry {
            work: Work::Program(c),
            cycle: at,
            unit,
            stage: 0,
        });
    }
    Ok(())
}

pub(crate) fn unit_of(program: &Program, idx: usize) -> Result<Unit> {
    program
        .get(idx)
        .unit()
        .ok_or_else(|| Error::Internal(format!("instruction {} occupies no unit", idx)))
}

pub(crate) fn end_of(entries: &[Entry]) -> usize {
    entries.iter().map(|e| e.cycle + 1).max().unwrap_or(0)
}
