//! Integration tests for register files, rotation and the multiply pipeline.

use vliw_pipeliner::common::{NUM_REGISTERS, ROTATING_BASE, ROTATING_WINDOW};
use vliw_pipeliner::core::arch::gpr::Gpr;
use vliw_pipeliner::core::arch::pred::PredicateFile;
use vliw_pipeliner::core::arch::rotation::{advance, physical_pred, physical_reg, rotated_name};
use vliw_pipeliner::core::units::mult::{MulStage, MultPipeline};

/// Tests that static names never rotate.
#[test]
fn test_static_registers_do_not_rotate() {
    for name in 0..ROTATING_BASE {
        for rbb in 0..ROTATING_WINDOW {
            assert_eq!(physical_reg(name, rbb), name);
            assert_eq!(physical_pred(name, rbb), name);
        }
    }
}

/// Tests the rotation formula on a few fixed points.
#[test]
fn test_rotation_formula() {
    assert_eq!(physical_reg(32, 0), 32);
    assert_eq!(physical_reg(33, 1), 32);
    assert_eq!(physical_reg(32, 1), 95);
    assert_eq!(physical_reg(95, 63), 32);
    assert_eq!(advance(63), 0);
    assert_eq!(rotated_name(95, 1), 32);
    assert_eq!(rotated_name(32, -1), 95);
}

/// Tests that a name chosen at schedule time for a reader `k` rotations
/// later finds the producer's physical slot, for every base.
#[test]
fn test_rotation_self_consistency() {
    for name in ROTATING_BASE..NUM_REGISTERS {
        for rbb in 0..ROTATING_WINDOW {
            let written = physical_reg(name, rbb);
            assert!((ROTATING_BASE..NUM_REGISTERS).contains(&written));
            let mut later = rbb;
            for k in 0..4isize {
                assert_eq!(physical_reg(rotated_name(name, k), later), written);
                later = advance(later);
            }
        }
    }
}

/// Tests that every base maps the rotating names onto distinct slots.
#[test]
fn test_rotation_is_a_permutation() {
    for rbb in 0..ROTATING_WINDOW {
        let mut seen = vec![false; NUM_REGISTERS];
        for name in ROTATING_BASE..NUM_REGISTERS {
            let slot = physical_reg(name, rbb);
            assert!(!seen[slot]);
            seen[slot] = true;
        }
    }
}

/// Tests register file reset state and rotated access.
#[test]
fn test_register_file() {
    let mut regs = Gpr::new();
    assert!(regs.snapshot().iter().all(|&v| v == 0));

    regs.write_physical(40, 0xABCD);
    assert_eq!(regs.read(40, 0), 0xABCD);
    assert_eq!(regs.read(41, 1), 0xABCD);
    assert_eq!(regs.read_physical(40), 0xABCD);

    regs.write_physical(0, 5);
    assert_eq!(regs.read(0, 7), 5);
    assert_eq!(regs.snapshot().len(), NUM_REGISTERS);
}

/// Tests predicate file reset state and rotated access.
#[test]
fn test_predicate_file() {
    let mut preds = PredicateFile::new();
    assert!(preds.snapshot().iter().all(|&p| p));

    preds.write_physical(32, false);
    assert!(!preds.read(32, 0));
    assert!(!preds.read(33, 1));
    assert!(preds.read(32, 1));
    assert!(!preds.read_physical(32));
}

/// Tests that a multiply retires exactly two advances after it issues.
#[test]
fn test_multiply_pipeline_timing() {
    let mut mult = MultPipeline::new();
    let op = MulStage {
        predicate: true,
        dest: 7,
        result: 42,
    };

    assert_eq!(mult.advance(Some(op)), None);
    assert_eq!(mult.stage(0), Some(&op));
    assert!(mult.in_flight());

    assert_eq!(mult.advance(None), None);
    assert_eq!(mult.stage(1), Some(&op));
    assert!(mult.in_flight());

    assert_eq!(mult.advance(None), Some(op));
    assert_eq!(mult.stage(2), Some(&op));
    assert!(!mult.in_flight());

    assert_eq!(mult.advance(None), None);
    assert_eq!(mult.stage(2), None);
}

/// Tests back-to-back multiplies occupy consecutive stages.
#[test]
fn test_multiply_pipeline_back_to_back() {
    let mut mult = MultPipeline::new();
    let mk = |dest| MulStage {
        predicate: true,
        dest,
        result: dest as u64,
    };
    mult.advance(Some(mk(1)));
    mult.advance(Some(mk(2)));
    let retired = mult.advance(Some(mk(3)));

    assert_eq!(retired, Some(mk(1)));
    assert_eq!(mult.stage(0).map(|m| m.dest), Some(3));
    assert_eq!(mult.stage(1).map(|m| m.dest), Some(2));
}
