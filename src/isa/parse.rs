//! Assembly Parser.
//!
//! Parses one line of assembly into an [`Instruction`]. The accepted syntax
//! is the one produced by the `Display` implementation of `Instruction`:
//!
//! ```text
//! (p33) add x40, x41, x3
//! ld x1, 0x10(x2)
//! mov LC, 100
//! mov p32, true
//! loop.pip 4
//! ```
//!
//! Commas between operands are optional. Every failure is reported as a
//! [`Error::Parse`] carrying the index of the offending line.

use crate::common::constants::{NUM_PREDICATES, NUM_REGISTERS};
use crate::common::{Error, Result};
use crate::isa::instruction::{Instruction, Op, PredId, RegId, SpecialReg};
use crate::isa::opcodes::Opcode;

/// Parses a single assembly line.
///
/// # Arguments
///
/// * `text` - The assembly text.
/// * `line` - Index of the line in its enclosing list, used in error messages.
///
/// # Returns
///
/// The decoded instruction, or a `ParseError` for unknown opcodes, wrong
/// operand counts, and out-of-range register or predicate indices.
pub fn parse_instruction(text: &str, line: usize) -> Result<Instruction> {
    let text = text.trim();
    let (guard, body) = split_guard(text, line)?;

    let (mnemonic, rest) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], body[pos..].trim()),
        None => (body, ""),
    };
    if mnemonic.is_empty() {
        return Err(Error::parse(line, "empty instruction"));
    }
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| Error::parse(line, format!("unknown opcode '{}'", mnemonic)))?;
    let args = split_operands(rest);

    let expect = |n: usize| -> Result<()> {
        if args.len() == n {
            Ok(())
        } else {
            Err(Error::parse(
                line,
                format!("'{}' expects {} operands, found {}", mnemonic, n, args.len()),
            ))
        }
    };

    let op = match opcode {
        Opcode::Add | Opcode::Sub | Opcode::Mulu => {
            expect(3)?;
            let rd = parse_reg(&args[0], line)?;
            let rs1 = parse_reg(&args[1], line)?;
            let rs2 = parse_reg(&args[2], line)?;
            match opcode {
                Opcode::Add => Op::Add { rd, rs1, rs2 },
                Opcode::Sub => Op::Sub { rd, rs1, rs2 },
                _ => Op::Mulu { rd, rs1, rs2 },
            }
        }
        Opcode::Addi => {
            expect(3)?;
            Op::Addi {
                rd: parse_reg(&args[0], line)?,
                rs1: parse_reg(&args[1], line)?,
                imm: parse_imm(&args[2], line)?,
            }
        }
        Opcode::Ld | Opcode::St => {
            expect(2)?;
            let reg = parse_reg(&args[0], line)?;
            let (imm, base) = parse_mem_operand(&args[1], line)?;
            if opcode == Opcode::Ld {
                Op::Ld { rd: reg, imm, base }
            } else {
                Op::St { rs: reg, imm, base }
            }
        }
        Opcode::Mov => {
            expect(2)?;
            parse_mov(&args[0], &args[1], line)?
        }
        Opcode::Loop | Opcode::LoopPip => {
            expect(1)?;
            let target = args[0]
                .parse::<usize>()
                .map_err(|_| Error::parse(line, format!("invalid loop target '{}'", args[0])))?;
            if opcode == Opcode::Loop {
                Op::Loop { target }
            } else {
                Op::LoopPip { target }
            }
        }
        Opcode::Nop => {
            expect(0)?;
            Op::Nop
        }
    };

    Ok(Instruction { guard, op })
}

fn split_guard(text: &str, line: usize) -> Result<(Option<PredId>, &str)> {
    let Some(inner) = text.strip_prefix('(') else {
        return Ok((None, text));
    };
    let close = inner
        .find(')')
        .ok_or_else(|| Error::parse(line, "unterminated predicate guard"))?;
    let pred = parse_pred(inner[..close].trim(), line)?;
    Ok((Some(pred), inner[close + 1..].trim()))
}

fn split_operands(rest: &str) -> Vec<String> {
    if rest.contains(',') {
        rest.split(',')
            .map(|s| s.split_whitespace().collect::<String>())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        rest.split_whitespace().map(str::to_string).collect()
    }
}

fn parse_index(text: &str, prefix: char, limit: usize, what: &str, line: usize) -> Result<usize> {
    let digits = text
        .strip_prefix(prefix)
        .ok_or_else(|| Error::parse(line, format!("expected {} operand, found '{}'", what, text)))?;
    let idx = digits
        .parse::<usize>()
        .map_err(|_| Error::parse(line, format!("invalid {} '{}'", what, text)))?;
    if idx >= limit {
        return Err(Error::parse(
            line,
            format!("{} '{}' out of range (0..{})", what, text, limit),
        ));
    }
    Ok(idx)
}

fn parse_reg(text: &str, line: usize) -> Result<RegId> {
    parse_index(text, 'x', NUM_REGISTERS, "register", line)
}

fn parse_pred(text: &str, line: usize) -> Result<PredId> {
    parse_index(text, 'p', NUM_PREDICATES, "predicate", line)
}

/// Parses a decimal (optionally negative) or `0x` hexadecimal immediate.
fn parse_imm(text: &str, line: usize) -> Result<i64> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(m) => (true, m),
        None => (false, text),
    };
    let value = if let Some(hex) = magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map(|v| v as i64)
    } else {
        magnitude.parse::<i64>()
    }
    .map_err(|_| Error::parse(line, format!("invalid immediate '{}'", text)))?;
    Ok(if negative { value.wrapping_neg() } else { value })
}

fn parse_mem_operand(text: &str, line: usize) -> Result<(i64, RegId)> {
    let open = text
        .find('(')
        .ok_or_else(|| Error::parse(line, format!("expected imm(xN), found '{}'", text)))?;
    let close = text
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| Error::parse(line, format!("expected imm(xN), found '{}'", text)))?;
    let imm_text = &text[..open];
    let imm = if imm_text.is_empty() {
        0
    } else {
        parse_imm(imm_text, line)?
    };
    let base = parse_reg(&text[open + 1..close], line)?;
    Ok((imm, base))
}

fn parse_mov(dst: &str, src: &str, line: usize) -> Result<Op> {
    match dst {
        "LC" | "EC" => {
            let target = if dst == "LC" {
                SpecialReg::Lc
            } else {
                SpecialReg::Ec
            };
            let imm = parse_imm(src, line)?;
            if imm < 0 {
                return Err(Error::parse(
                    line,
                    format!("{} cannot hold negative value {}", dst, imm),
                ));
            }
            Ok(Op::MovSpecial {
                target,
                imm: imm as u64,
            })
        }
        _ if dst.starts_with('p') => {
            let pd = parse_pred(dst, line)?;
            let value = match src {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(Error::parse(
                        line,
                        format!("predicate move expects true/false, found '{}'", src),
                    ))
                }
            };
            Ok(Op::MovPred { pd, value })
        }
        _ => {
            let rd = parse_reg(dst, line)?;
            if src.starts_with('x') {
                Ok(Op::MovReg {
                    rd,
                    rs: parse_reg(src, line)?,
                })
            } else {
                Ok(Op::MovImm {
                    rd,
                    imm: parse_imm(src, line)?,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediates_accept_hex_and_negative_values() {
        assert_eq!(parse_imm("42", 0).unwrap(), 42);
        assert_eq!(parse_imm("-7", 0).unwrap(), -7);
        assert_eq!(parse_imm("0x1f", 0).unwrap(), 31);
        assert!(parse_imm("x3", 0).is_err());
    }

    #[test]
    fn memory_operand_without_offset_defaults_to_zero() {
        assert_eq!(parse_mem_operand("(x5)", 0).unwrap(), (0, 5));
        assert_eq!(parse_mem_operand("-8(x5)", 0).unwrap(), (-8, 5));
    }
}
