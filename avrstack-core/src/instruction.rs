//! Disassembly line parsing: turns raw objdump-style text into the tagged
//! [`Instruction`] sum.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Instruction, ParsedLine, PointerHalf};

static FUNCTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9a-fA-F]+)\s+<(.+)>:\s*$").unwrap());

static INSTRUCTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9a-fA-F]+):\s+(?:[0-9a-fA-F]{2}\s+)+(\S+)(?:\s+(.*))?$").unwrap()
});

static HEX_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x([0-9a-fA-F]+)|^([0-9a-fA-F]+)$").unwrap());
static RCALL_OFFSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([+-]\d+)").unwrap());
static REG_IMM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"r(\d+),\s*(?:0x)?([0-9a-fA-F]+)").unwrap());

/// Matches a function boundary line: `<hex-address> <label>:`.
pub fn parse_function_header(line: &str) -> Option<(u32, String)> {
    let caps = FUNCTION_HEADER.captures(line)?;
    let addr = u32::from_str_radix(&caps[1], 16).ok()?;
    Some((addr, caps[2].to_string()))
}

/// Parses one instruction line, returning `None` if the line isn't an
/// instruction line at all (e.g. blank lines, section headers).
pub fn parse_instruction_line(line: &str) -> Option<ParsedLine> {
    let caps = INSTRUCTION_LINE.captures(line)?;
    let address = u32::from_str_radix(&caps[1], 16).ok()?;
    let mnemonic = caps[2].to_ascii_lowercase();
    let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let instruction = match mnemonic.as_str() {
        "call" => parse_direct_call(rest).unwrap_or(Instruction::Other),
        "rcall" => parse_relative_call(rest),
        "icall" | "eicall" => Instruction::IndirectCall,
        "push" => Instruction::Push,
        "pop" => Instruction::Pop,
        "ldi" => parse_ldi(rest).unwrap_or(Instruction::Other),
        "ld" | "ldd" => parse_ld(rest),
        "sbiw" => parse_frame_adjust(rest, true).unwrap_or(Instruction::Other),
        "adiw" => parse_frame_adjust(rest, false).unwrap_or(Instruction::Other),
        _ => Instruction::Other,
    };

    Some(ParsedLine {
        address,
        instruction,
        raw: line.to_string(),
    })
}

/// True for `in`/`out` instructions targeting the SP-low/SP-high I/O
/// addresses (`0x3d`/`0x3e`) — direct stack-pointer manipulation.
pub fn is_stack_pointer_io(mnemonic_line: &str) -> bool {
    let lower = mnemonic_line.to_ascii_lowercase();
    let is_in_out = lower.contains("\tin\t")
        || lower.contains(" in ")
        || lower.contains("\tout\t")
        || lower.contains(" out ");
    is_in_out && (lower.contains("0x3d") || lower.contains("0x3e"))
}

fn parse_direct_call(rest: &str) -> Option<Instruction> {
    let caps = HEX_TOKEN.captures(rest.split_whitespace().next()?)?;
    let hex = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let target_addr = u32::from_str_radix(hex, 16).ok()?;
    Some(Instruction::DirectCall { target_addr })
}

fn parse_relative_call(rest: &str) -> Instruction {
    match RCALL_OFFSET.captures(rest) {
        Some(caps) => {
            let offset: i32 = caps[1].parse().unwrap_or(0);
            Instruction::RelativeCall { offset }
        }
        None => Instruction::RelativeCall { offset: i32::MAX },
    }
}

fn parse_ldi(rest: &str) -> Option<Instruction> {
    let caps = REG_IMM.captures(rest)?;
    let reg: u32 = caps[1].parse().ok()?;
    let byte = u8::from_str_radix(&caps[2], 16).ok()?;
    let reg = match reg {
        30 => PointerHalf::Low,
        31 => PointerHalf::High,
        _ => return None,
    };
    Some(Instruction::LoadImm { reg, byte })
}

fn parse_ld(rest: &str) -> Instruction {
    if rest.contains('Z') {
        Instruction::ArrayLoad
    } else {
        Instruction::Other
    }
}

fn parse_frame_adjust(rest: &str, is_sub: bool) -> Option<Instruction> {
    let caps = REG_IMM.captures(rest)?;
    let reg: u32 = caps[1].parse().ok()?;
    if reg != 28 {
        return None;
    }
    let n: u32 = u32::from_str_radix(&caps[2], 16).ok()?;
    Some(if is_sub {
        Instruction::FrameSub { n }
    } else {
        Instruction::FrameAdd { n }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_header() {
        let (addr, label) = parse_function_header("00000050 <foo>:").unwrap();
        assert_eq!(addr, 0x50);
        assert_eq!(label, "foo");
    }

    #[test]
    fn parses_direct_call() {
        let line = "  50:\t0e 94 2a 00 \tcall\t0x54\t; 0x54 <bar>";
        let parsed = parse_instruction_line(line).unwrap();
        assert_eq!(parsed.address, 0x50);
        assert_eq!(
            parsed.instruction,
            Instruction::DirectCall { target_addr: 0x54 }
        );
    }

    #[test]
    fn parses_zero_offset_rcall() {
        let line = "  52:\t01 d0      \trcall\t.+0      \t; 0x54 <bar>";
        let parsed = parse_instruction_line(line).unwrap();
        assert_eq!(parsed.instruction, Instruction::RelativeCall { offset: 0 });
    }

    #[test]
    fn parses_icall() {
        let line = "  5a:\t09 95       \ticall";
        let parsed = parse_instruction_line(line).unwrap();
        assert_eq!(parsed.instruction, Instruction::IndirectCall);
    }

    #[test]
    fn parses_ldi_pointer_halves() {
        let low = parse_instruction_line("  5c:\t40 ea       \tldi\tr30, 0xA4").unwrap();
        assert_eq!(
            low.instruction,
            Instruction::LoadImm {
                reg: PointerHalf::Low,
                byte: 0xA4
            }
        );
        let high = parse_instruction_line("  5e:\t00 e0       \tldi\tr31, 0x00").unwrap();
        assert_eq!(
            high.instruction,
            Instruction::LoadImm {
                reg: PointerHalf::High,
                byte: 0x00
            }
        );
    }

    #[test]
    fn parses_sbiw_on_y_register() {
        let line = "  60:\t2a 97       \tsbiw\tr28, 0x0a";
        let parsed = parse_instruction_line(line).unwrap();
        assert_eq!(parsed.instruction, Instruction::FrameSub { n: 10 });
    }

    #[test]
    fn array_load_detected_through_z() {
        let line = "  62:\t01 90       \tld\tr16, Z+";
        let parsed = parse_instruction_line(line).unwrap();
        assert_eq!(parsed.instruction, Instruction::ArrayLoad);
    }

    #[test]
    fn detects_stack_pointer_io() {
        assert!(is_stack_pointer_io("  10:\t.. \tout\t0x3d, r28"));
        assert!(is_stack_pointer_io("  12:\t.. \tin\tr29, 0x3e"));
        assert!(!is_stack_pointer_io("  14:\t.. \tout\t0x20, r16"));
    }
}
