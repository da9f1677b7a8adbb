//! Integration tests for dependency analysis.

use vliw_pipeliner::common::Error;
use vliw_pipeliner::program::deps::{DepGraph, Edge, EdgeKind, OperandSource};
use vliw_pipeliner::program::Program;

fn program(lines: &[&str]) -> Program {
    Program::from_lines(lines).unwrap()
}

fn has_edge(graph: &DepGraph, producer: usize, consumer: usize, kind: EdgeKind) -> bool {
    graph
        .edges()
        .iter()
        .any(|e| e.producer == producer && e.consumer == consumer && e.kind == kind)
}

/// Tests operand resolution in straight-line code.
#[test]
fn test_local_dependencies() {
    let p = program(&["mov x1, 3", "mulu x2, x1, x1", "add x3, x2, x9"]);
    let graph = DepGraph::build(&p).unwrap();

    assert_eq!(
        graph.operand_sources(2),
        &[OperandSource::Local(1), OperandSource::Undefined]
    );
    let edge = graph.incoming(2).next().unwrap();
    assert_eq!(edge.latency, 3);
    assert_eq!(edge.distance, 0);
    assert!(has_edge(&graph, 0, 1, EdgeKind::Local));
    assert_eq!(graph.order(), &[0, 1, 2]);
}

/// Tests the classification of reads around a loop.
#[test]
fn test_loop_dependencies() {
    let p = program(&[
        "mov LC, 4",        // 0
        "mov x1, 0",        // 1
        "mov x5, 7",        // 2
        "add x2, x1, x5",   // 3: x1 carried from 4 with entry 1, x5 invariant
        "addi x1, x1, 1",   // 4: x1 carried from itself
        "add x6, x6, x2",   // 5: x6 carried without entry, x2 local
        "loop 3",           // 6
        "st x6, 0(x1)",     // 7: both post-loop
    ]);
    let graph = DepGraph::build(&p).unwrap();

    assert_eq!(
        graph.operand_sources(3),
        &[
            OperandSource::LoopCarried {
                producer: 4,
                entry: Some(1)
            },
            OperandSource::Invariant(2)
        ]
    );
    assert_eq!(
        graph.operand_sources(5)[0],
        OperandSource::LoopCarried {
            producer: 5,
            entry: None
        }
    );
    assert_eq!(
        graph.operand_sources(7),
        &[OperandSource::PostLoop(5), OperandSource::PostLoop(4)]
    );

    assert!(has_edge(&graph, 4, 3, EdgeKind::LoopCarried));
    assert!(has_edge(&graph, 1, 3, EdgeKind::Invariant));
    assert!(has_edge(&graph, 2, 3, EdgeKind::Invariant));
    assert!(has_edge(&graph, 3, 5, EdgeKind::Local));
    // Carried read without an entry value: the reader guards the writer.
    assert!(has_edge(&graph, 5, 5, EdgeKind::Anti));
    for writer in [3, 4, 5] {
        assert!(has_edge(&graph, writer, writer, EdgeKind::Output));
    }

    for e in graph.edges_of(EdgeKind::LoopCarried) {
        assert_eq!(e.distance, 1);
    }
}

/// Tests that a cyclic flow graph is rejected.
#[test]
fn test_cycle_is_dependency_error() {
    let mut graph = DepGraph::new(3);
    let edge = |producer, consumer| Edge {
        producer,
        consumer,
        latency: 1,
        kind: EdgeKind::Local,
        distance: 0,
    };
    graph.add_edge(edge(0, 1));
    graph.add_edge(edge(1, 2));
    graph.add_edge(edge(2, 1));

    match graph.topological_order() {
        Err(Error::Dependency { instruction }) => assert_eq!(instruction, 1),
        other => panic!("expected a dependency error, got {:?}", other),
    }
}

/// Tests that distance-1 edges do not take part in the topological order.
#[test]
fn test_carried_edges_do_not_form_cycles() {
    let mut graph = DepGraph::new(2);
    graph.add_edge(Edge {
        producer: 0,
        consumer: 1,
        latency: 1,
        kind: EdgeKind::Local,
        distance: 0,
    });
    graph.add_edge(Edge {
        producer: 1,
        consumer: 0,
        latency: 1,
        kind: EdgeKind::LoopCarried,
        distance: 1,
    });
    assert_eq!(graph.topological_order().unwrap(), vec![0, 1]);
}

/// Tests that identical edges are stored once.
#[test]
fn test_duplicate_edges_are_merged() {
    let p = program(&["mov x1, 1", "add x2, x1, x1"]);
    let graph = DepGraph::build(&p).unwrap();
    assert_eq!(graph.incoming(1).count(), 1);
}
