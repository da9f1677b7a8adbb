//! Integration tests for instruction parsing, rendering, and bundles.

use vliw_pipeliner::common::Error;
use vliw_pipeliner::isa::*;
use vliw_pipeliner::program::{Program, Region};

fn parse(text: &str) -> Instruction {
    parse_instruction(text, 0).unwrap()
}

/// Tests parsing of register arithmetic.
#[test]
fn test_parse_register_ops() {
    assert_eq!(
        parse("add x1, x2, x3").op,
        Op::Add {
            rd: 1,
            rs1: 2,
            rs2: 3
        }
    );
    assert_eq!(
        parse("mulu x40 x41 x95").op,
        Op::Mulu {
            rd: 40,
            rs1: 41,
            rs2: 95
        }
    );
}

/// Tests parsing of memory operands with and without offsets.
#[test]
fn test_parse_memory_ops() {
    assert_eq!(
        parse("ld x1, 0x10(x2)").op,
        Op::Ld {
            rd: 1,
            imm: 16,
            base: 2
        }
    );
    assert_eq!(
        parse("st x3, -8(x4)").op,
        Op::St {
            rs: 3,
            imm: -8,
            base: 4
        }
    );
}

/// Tests the four forms of `mov`.
#[test]
fn test_parse_moves() {
    assert_eq!(parse("mov x1, x2").op, Op::MovReg { rd: 1, rs: 2 });
    assert_eq!(parse("mov x1, -5").op, Op::MovImm { rd: 1, imm: -5 });
    assert_eq!(
        parse("mov LC, 100").op,
        Op::MovSpecial {
            target: SpecialReg::Lc,
            imm: 100
        }
    );
    assert_eq!(parse("mov p33, false").op, Op::MovPred { pd: 33, value: false });
}

/// Tests parsing of predicate guards and loop branches.
#[test]
fn test_parse_guard_and_loops() {
    let inst = parse("(p33) addi x40, x41, 1");
    assert_eq!(inst.guard, Some(33));
    assert_eq!(parse("loop.pip 4").op, Op::LoopPip { target: 4 });
    assert_eq!(parse("loop 0").op, Op::Loop { target: 0 });
    assert_eq!(parse("nop").op, Op::Nop);
}

/// Tests that unknown opcodes are rejected with the instruction index.
#[test]
fn test_parse_unknown_opcode() {
    match parse_instruction("divide x1, x2, x3", 7) {
        Err(Error::Parse { line, reason }) => {
            assert_eq!(line, 7);
            assert!(reason.contains("divide"));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

/// Tests rejection of malformed operands.
#[test]
fn test_parse_bad_operands() {
    assert!(parse_instruction("add x1, x2", 0).is_err());
    assert!(parse_instruction("add x1, x2, x96", 0).is_err());
    assert!(parse_instruction("mov p96, true", 0).is_err());
    assert!(parse_instruction("mov LC, -1", 0).is_err());
    assert!(parse_instruction("ld x1, 8", 0).is_err());
    assert!(parse_instruction("(p1 add x1, x2, x3", 0).is_err());
    assert!(parse_instruction("", 0).is_err());
}

/// Tests that the canonical rendering parses back to the same instruction.
#[test]
fn test_display_parses_back() {
    for text in [
        "(p34) add x33, x32, x1",
        "addi x2, x2, -1",
        "ld x5, 8(x6)",
        "st x5, 0(x6)",
        "mov EC, 2",
        "mov p32, true",
        "mov x4, x5",
        "loop.pip 3",
    ] {
        let inst = parse(text);
        assert_eq!(inst.to_string(), text);
        assert_eq!(parse(&inst.to_string()), inst);
    }
}

/// Tests opcode properties exposed through instructions.
#[test]
fn test_instruction_properties() {
    let mul = parse("mulu x3, x1, x2");
    assert_eq!(mul.latency(), 3);
    assert_eq!(mul.unit(), Some(Unit::Mult));
    assert_eq!(mul.dest(), Some(3));
    assert_eq!(mul.sources(), vec![1, 2]);

    let st = parse("st x4, 0(x5)");
    assert_eq!(st.dest(), None);
    assert_eq!(st.sources(), vec![4, 5]);
    assert!(parse("loop 1").is_loop());
}

/// Tests renaming keeps the guard and immediates.
#[test]
fn test_instruction_renamed() {
    let inst = parse("(p32) ld x1, 16(x2)");
    let renamed = inst.renamed(Some(40), &[7]);
    assert_eq!(renamed.to_string(), "(p32) ld x40, 16(x7)");
}

/// Tests bundle text encoding and decoding.
#[test]
fn test_bundle_parse_and_render() {
    let text = ["add x1, x2, x3", "nop", "mulu x4, x1, x1", "st x4, 0(x5)", "loop 0"];
    let bundle = Bundle::parse(&text, 0).unwrap();
    assert_eq!(bundle.get(Slot::Alu1), None);
    assert!(bundle.get(Slot::Branch).unwrap().is_loop());
    assert_eq!(bundle.to_text(), text.map(String::from));
    assert!(!bundle.is_empty());
    assert!(Bundle::empty().is_empty());
}

/// Tests that bundles reject instructions in the wrong slot.
#[test]
fn test_bundle_slot_checks() {
    let misplaced = ["nop", "nop", "add x1, x2, x3", "nop", "nop"];
    assert!(matches!(Bundle::parse(&misplaced, 4), Err(Error::Parse { line: 4, .. })));
    assert!(Bundle::parse(&["nop"; 4], 0).is_err());

    let mut bundle = Bundle::empty();
    bundle.set(Slot::Alu0, parse("add x1, x2, x3")).unwrap();
    assert!(matches!(
        bundle.set(Slot::Alu0, parse("add x4, x5, x6")),
        Err(Error::Internal(_))
    ));
    assert!(matches!(
        bundle.set(Slot::Mem, parse("add x4, x5, x6")),
        Err(Error::Internal(_))
    ));
}

/// Tests program regions around a loop.
#[test]
fn test_program_regions() {
    let program = Program::from_lines(&[
        "mov LC, 3",
        "mov x1, 0",
        "addi x1, x1, 1",
        "loop 2",
        "st x1, 0(x0)",
    ])
    .unwrap();
    assert_eq!(program.pre_loop(), 0..2);
    assert_eq!(program.body(), 2..3);
    assert_eq!(program.post_loop(), 4..5);
    assert_eq!(program.region(3), Region::LoopBranch);
    assert_eq!(program.region(4), Region::PostLoop);
    assert_eq!(program.trip_count(), Some(3));
}

/// Tests rejection of programs that only a scheduler may produce.
#[test]
fn test_program_validation() {
    let cases: [&[&str]; 6] = [
        &["(p1) add x1, x2, x3"],
        &["add x1, x2, x3", "loop.pip 0"],
        &["nop"],
        &["mov p1, true"],
        &["add x1, x1, x1", "loop 0", "loop 0"],
        &["add x1, x1, x1", "mov LC, 3", "loop 0"],
    ];
    for lines in cases {
        assert!(
            matches!(Program::from_lines(lines), Err(Error::Parse { .. })),
            "accepted {:?}",
            lines
        );
    }
    assert!(Program::from_lines(&["loop 1"]).is_err());
}

/// Tests the JSON program form.
#[test]
fn test_program_from_json() {
    let program = Program::from_json(r#"["mov x1, 1", "add x2, x1, x1"]"#).unwrap();
    assert_eq!(program.len(), 2);
    assert!(program.loop_info().is_none());
    assert!(Program::from_json(r#"["divide x1, x2, x3"]"#).is_err());
    assert!(Program::from_json("{}").is_err());
}
