//! Dependency Graph Builder.
//!
//! Builds the register dependency graph of a [`Program`]. Nodes are program
//! indices. Every edge carries the producer's latency, a kind, and an
//! iteration distance (0 = same iteration, 1 = next iteration).
//!
//! Besides the edges, every source operand of every instruction is resolved
//! to an [`OperandSource`]. Schedulers use the edges for timing and the
//! operand sources for register renaming.
//!
//! Graph algorithms only follow distance-0 flow edges; loop-carried, anti
//! and output edges never take part in the topological order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::common::{Error, Result};
use crate::isa::RegId;
use crate::program::{Program, Region};

/// Classification of a dependency edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Read-after-write inside one region and one iteration.
    Local,
    /// Read in iteration i+1 of a value written by the body in iteration i.
    LoopCarried,
    /// Body or post-loop read of a value written before the loop.
    Invariant,
    /// Post-loop read of a value written by the last iteration of the body.
    PostLoop,
    /// A body reader of a carried value must read before the writer of the
    /// current iteration overwrites it. `producer` is the reader.
    Anti,
    /// A body writer against itself in the next iteration.
    Output,
}

/// A dependency between two instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub producer: usize,
    pub consumer: usize,
    /// Cycles between the producer's issue and the consumer's issue.
    pub latency: usize,
    pub kind: EdgeKind,
    /// Iteration distance: 0 for the same iteration, 1 for the next.
    pub distance: usize,
}

impl Edge {
    /// Whether the edge orders instructions inside one iteration.
    pub fn is_flow(&self) -> bool {
        self.distance == 0
            && matches!(
                self.kind,
                EdgeKind::Local | EdgeKind::Invariant | EdgeKind::PostLoop
            )
    }
}

/// Where the value of one source operand comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSource {
    /// No instruction writes the register before the read.
    Undefined,
    /// Earlier writer in the same region and iteration.
    Local(usize),
    /// Body writer of the previous iteration; `entry` is the pre-loop writer
    /// that supplies the value for the first iteration.
    LoopCarried { producer: usize, entry: Option<usize> },
    /// Pre-loop writer read from the body or the post-loop region.
    Invariant(usize),
    /// Last body writer read from the post-loop region.
    PostLoop(usize),
}

impl OperandSource {
    /// The instruction producing the value read in steady state.
    pub fn producer(&self) -> Option<usize> {
        match *self {
            OperandSource::Undefined => None,
            OperandSource::Local(p)
            | OperandSource::Invariant(p)
            | OperandSource::PostLoop(p)
            | OperandSource::LoopCarried { producer: p, .. } => Some(p),
        }
    }
}

/// Dependency graph over program indices.
#[derive(Clone, Debug, Default)]
pub struct DepGraph {
    num_nodes: usize,
    edges: Vec<Edge>,
    sources: Vec<Vec<OperandSource>>,
    order: Vec<usize>,
}

impl DepGraph {
    /// Creates an empty graph with `num_nodes` nodes and no operand sources.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            edges: Vec::new(),
            sources: vec![Vec::new(); num_nodes],
            order: Vec::new(),
        }
    }

    /// Adds an edge. Identical edges are stored once.
    pub fn add_edge(&mut self, edge: Edge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    /// Builds the dependency graph of `program`.
    ///
    /// # Returns
    ///
    /// The graph with its topological order computed, or a
    /// `DependencyError` when the flow edges contain a cycle.
    pub fn build(program: &Program) -> Result<Self> {
        let mut graph = Self::new(program.len());
        let pre = program.pre_loop();
        let body = program.body();
        let post = program.post_loop();

        let last_writer = |range: std::ops::Range<usize>, reg: RegId| {
            range.rev().find(|&i| program.get(i).dest() == Some(reg))
        };

        for c in 0..program.len() {
            let region = program.region(c);
            let mut resolved = Vec::new();
            for reg in program.get(c).sources() {
                let source = match region {
                    Region::PreLoop => match last_writer(pre.start..c, reg) {
                        Some(p) => OperandSource::Local(p),
                        None => OperandSource::Undefined,
                    },
                    Region::Body => {
                        if let Some(p) = last_writer(body.start..c, reg) {
                            OperandSource::Local(p)
                        } else if let Some(p) = last_writer(c..body.end, reg) {
                            OperandSource::LoopCarried {
                                producer: p,
                                entry: last_writer(pre.clone(), reg),
                            }
                        } else if let Some(q) = last_writer(pre.clone(), reg) {
                            OperandSource::Invariant(q)
                        } else {
                            OperandSource::Undefined
                        }
                    }
                    Region::PostLoop => {
                        if let Some(p) = last_writer(post.start..c, reg) {
                            OperandSource::Local(p)
                        } else if let Some(p) = last_writer(body.clone(), reg) {
                            OperandSource::PostLoop(p)
                        } else if let Some(q) = last_writer(pre.clone(), reg) {
                            OperandSource::Invariant(q)
                        } else {
                            OperandSource::Undefined
                        }
                    }
                    Region::LoopBranch => OperandSource::Undefined,
                };
                graph.record_source(program, c, source);
                resolved.push(source);
            }
            graph.sources[c] = resolved;
        }

        for p in body.clone() {
            if program.get(p).dest().is_some() {
                graph.add_edge(Edge {
                    producer: p,
                    consumer: p,
                    latency: program.get(p).latency(),
                    kind: EdgeKind::Output,
                    distance: 1,
                });
            }
        }

        graph.order = graph.topological_order()?;
        Ok(graph)
    }

    fn record_source(&mut self, program: &Program, consumer: usize, source: OperandSource) {
        let lat = |p: usize| program.get(p).latency();
        let edge = |producer: usize, kind: EdgeKind, distance: usize| Edge {
            producer,
            consumer,
            latency: lat(producer),
            kind,
            distance,
        };
        match source {
            OperandSource::Undefined => {}
            OperandSource::Local(p) => self.add_edge(edge(p, EdgeKind::Local, 0)),
            OperandSource::Invariant(q) => self.add_edge(edge(q, EdgeKind::Invariant, 0)),
            OperandSource::PostLoop(p) => self.add_edge(edge(p, EdgeKind::PostLoop, 0)),
            OperandSource::LoopCarried { producer, entry } => {
                self.add_edge(edge(producer, EdgeKind::LoopCarried, 1));
                match entry {
                    Some(q) => self.add_edge(edge(q, EdgeKind::Invariant, 0)),
                    None => self.add_edge(Edge {
                        producer: consumer,
                        consumer: producer,
                        latency: lat(producer),
                        kind: EdgeKind::Anti,
                        distance: 0,
                    }),
                }
            }
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges ending at `consumer`.
    pub fn incoming(&self, consumer: usize) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.consumer == consumer)
    }

    /// Edges of the given kind.
    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Resolved source operands of `consumer`, in operand order.
    pub fn operand_sources(&self, consumer: usize) -> &[OperandSource] {
        &self.sources[consumer]
    }

    /// Topological order computed by [`DepGraph::build`].
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Kahn topological sort over the flow edges.
    ///
    /// Ready nodes are taken by ascending index, so for a graph whose flow
    /// edges all point forward in program order the result is program order.
    ///
    /// # Returns
    ///
    /// The order, or a `DependencyError` naming the lowest-indexed node left
    /// on a cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let mut indegree = vec![0usize; self.num_nodes];
        let mut successors = vec![Vec::new(); self.num_nodes];
        for e in self.edges.iter().filter(|e| e.is_flow()) {
            indegree[e.consumer] += 1;
            successors[e.producer].push(e.consumer);
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..self.num_nodes)
            .filter(|&n| indegree[n] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(self.num_nodes);
        while let Some(Reverse(n)) = ready.pop() {
            order.push(n);
            for &s in &successors[n] {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    ready.push(Reverse(s));
                }
            }
        }

        if order.len() < self.num_nodes {
            let instruction = (0..self.num_nodes)
                .find(|&n| indegree[n] > 0)
                .unwrap_or_default();
            return Err(Error::Dependency { instruction });
        }
        Ok(order)
    }
}
