//! Modulo Scheduler.
//!
//! Software-pipelines the loop body. For a candidate initiation interval
//! `II`, body instructions are placed in topological order at the earliest
//! cycle whose row `cycle mod II` still has a free unit; the branch row
//! `II - 1` is held for `loop.pip`. A candidate is rejected when a
//! loop-carried value would not be ready `II` cycles later. The first
//! feasible candidate from the resource bound upwards wins.
//!
//! The kernel repeats every `II` cycles with `S` iterations in flight.
//! Each stage is guarded by its own rotating predicate, so the prologue
//! and epilogue come from the same kernel code: `loop.pip` sets the
//! stage-0 predicate while `LC` counts and clears it while `EC` drains.
//!
//! Anti and output dependencies do not constrain the kernel; every
//! iteration writes a fresh rotating register.

use log::{debug, info};
use rayon::prelude::*;

use super::rename::{self, PipelineShape};
use super::resources::ReservationTable;
use super::simple::{self, end_of, schedule_post_loop, schedule_pre_loop, unit_of};
use super::{Entry, Mode, Schedule, Work};
use crate::common::{Error, Result};
use crate::config::SchedulerConfig;
use crate::isa::Unit;
use crate::program::deps::{DepGraph, EdgeKind};
use crate::program::Program;

/// Smallest II the body's resource usage allows.
///
/// One iteration must fit its ALU, multiply, and memory instructions into
/// `II` rows; the branch always needs one row.
pub fn resource_bound(program: &Program) -> usize {
    [Unit::Alu, Unit::Mult, Unit::Mem]
        .into_iter()
        .map(|unit| {
            let count = program
                .body()
                .filter(|&i| program.get(i).unit() == Some(unit))
                .count();
            (count + unit.capacity() - 1) / unit.capacity()
        })
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Tries to schedule the body with initiation interval `ii`.
///
/// # Returns
///
/// The cycle of every body instruction relative to the iteration start,
/// indexed by program index, or `None` when `ii` is infeasible.
pub fn attempt(program: &Program, graph: &DepGraph, ii: usize) -> Option<Vec<Option<usize>>> {
    if ii == 0 {
        return None;
    }
    let body = program.body();
    let mut table = ReservationTable::modulo(ii);
    table.reserve(ii - 1, Unit::Branch);

    let mut time: Vec<Option<usize>> = vec![None; program.len()];
    for &c in graph.order().iter().filter(|i| body.contains(i)) {
        let est = graph
            .incoming(c)
            .filter(|e| e.kind == EdgeKind::Local)
            .filter_map(|e| time[e.producer].map(|p| p + e.latency))
            .max()
            .unwrap_or(0);
        let unit = program.get(c).unit()?;
        // Every row is visited once within II consecutive cycles.
        time[c] = Some(table.place_within(est, est + ii - 1, unit)?);
    }

    for e in graph.edges_of(EdgeKind::LoopCarried) {
        let p = time[e.producer]?;
        let c = time[e.consumer]?;
        if p + e.latency > c + ii {
            return None;
        }
    }
    Some(time)
}

/// Searches initiation intervals from `min_ii` to `config.max_ii`.
///
/// With `parallel_search` set, windows of candidates the size of the rayon
/// pool are evaluated concurrently; `find_map_first` keeps the smallest
/// feasible candidate, so the result matches the sequential search.
pub fn search(
    program: &Program,
    graph: &DepGraph,
    min_ii: usize,
    config: &SchedulerConfig,
) -> Result<(usize, Vec<Option<usize>>)> {
    let found = if config.parallel_search {
        let window = rayon::current_num_threads().max(1);
        let mut lo = min_ii;
        let mut found = None;
        while found.is_none() && lo <= config.max_ii {
            let hi = (lo + window - 1).min(config.max_ii);
            found = (lo..=hi)
                .into_par_iter()
                .find_map_first(|ii| attempt(program, graph, ii).map(|t| (ii, t)));
            lo = hi + 1;
        }
        found
    } else {
        (min_ii..=config.max_ii).find_map(|ii| attempt(program, graph, ii).map(|t| (ii, t)))
    };

    found.ok_or_else(|| {
        Error::infeasible(format!(
            "no initiation interval in {}..={} fits the loop body",
            min_ii, config.max_ii
        ))
    })
}

/// Builds the `loop.pip` schedule.
///
/// A program without a loop gets the non-overlapped schedule unchanged.
pub fn schedule(program: &Program, graph: &DepGraph, config: &SchedulerConfig) -> Result<Schedule> {
    let Some(info) = program.loop_info() else {
        let mut plain = simple::schedule(program, graph)?;
        plain.mode = Mode::LoopPip;
        return Ok(plain);
    };

    let body = program.body();
    let min_ii = resource_bound(program);
    debug!("[Scheduler] loop.pip: resource bound II >= {}", min_ii);
    let (ii, time) = search(program, graph, min_ii, config)?;
    let t = |i: usize| time[i].unwrap_or(0);

    let stages = body.clone().map(|i| t(i) / ii + 1).max().unwrap_or(1);
    info!("[Scheduler] loop.pip: II {} with {} stages", ii, stages);

    let mut extra = vec![Work::SetEc];
    extra.extend((0..stages).map(|stage| Work::InitStagePredicate { stage }));

    let mut entries = Vec::new();
    let pre = schedule_pre_loop(program, graph, &extra, &mut entries)?;

    let mut loop_start = end_of(&entries);
    for e in graph.edges_of(EdgeKind::Invariant) {
        if body.contains(&e.consumer) {
            if let Some(q) = pre[e.producer] {
                loop_start = loop_start.max((q + e.latency).saturating_sub(t(e.consumer)));
            }
        }
    }

    for c in body.clone() {
        entries.push(Entry {
            work: Work::Program(c),
            cycle: loop_start + t(c) % ii,
            unit: unit_of(program, c)?,
            stage: t(c) / ii,
        });
    }
    entries.push(Entry {
        work: Work::Program(info.end),
        cycle: loop_start + ii - 1,
        unit: Unit::Branch,
        stage: 0,
    });

    // The last iteration finishes its final stage just before the
    // post-loop code starts, S * II cycles after it began.
    let post_start = loop_start + ii;
    let drain = stages * ii;
    schedule_post_loop(program, graph, &mut entries, post_start, &pre, |p, lat| {
        (post_start + t(p) + lat).saturating_sub(drain)
    })?;

    let length = end_of(&entries);
    let code = rename::allocate_rotating(
        program,
        graph,
        &entries,
        PipelineShape {
            loop_start,
            ii,
            stages,
        },
    )?;
    Ok(Schedule {
        mode: Mode::LoopPip,
        ii,
        stages,
        loop_start: Some(loop_start),
        length,
        entries,
        code,
    })
}
