use lazy_static::lazy_static;
use regex::Regex;

// Each pattern needs a hex instruction address before a colon somewhere on
// the line and the mnemonic/operand token structure somewhere after it; the
// exact column layout of the listing is irrelevant.
lazy_static! {
    static ref AUIPC: Regex =
        Regex::new(r"(?i)([0-9A-F]+):.*auipc\s+([0-9a-z]+),\s*([-0-9]+)").unwrap();
    static ref LUI: Regex =
        Regex::new(r"(?i)([0-9A-F]+):.*lui\s+([0-9a-z]+),\s*([-0-9]+)").unwrap();
    static ref ADDI: Regex =
        Regex::new(r"(?i)([0-9A-F]+):.*addi\s+([0-9a-z]+),\s*([0-9a-z]+),\s*([-0-9]+)").unwrap();
    static ref LW: Regex =
        Regex::new(r"(?i)([0-9A-F]+):.*lw\s+([0-9a-z]+),\s*([-0-9]+)\(([0-9a-z]+)\)").unwrap();
    static ref SW: Regex =
        Regex::new(r"(?i)([0-9A-F]+):.*sw\s+([0-9a-z]+),\s*([-0-9]+)\(([0-9a-z]+)\)").unwrap();
    static ref JR: Regex =
        Regex::new(r"(?i)([0-9A-F]+):.*jr\s+([-0-9]+)\(([0-9a-z]+)\)").unwrap();
}

/// An instruction form relevant to the load-address idiom. `auipc`/`lui`
/// produce an upper-half fact; the rest consume one through `rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    Auipc { rd: String, imm: i64 },
    Lui { rd: String, imm: i64 },
    Addi { rs: String, imm: i64 },
    Lw { rs: String, imm: i64 },
    Sw { rs: String, imm: i64 },
    Jr { rs: String, imm: i64 },
}

/// A recognized instruction together with the instruction's own address
/// taken from the listing (the hex field before the colon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    pub addr: u64,
    pub insn: Insn,
}

fn reg(c: &regex::Captures, i: usize) -> String {
    c[i].to_ascii_lowercase()
}

fn imm(c: &regex::Captures, i: usize) -> Option<i64> {
    c[i].parse().ok()
}

fn addr(c: &regex::Captures) -> Option<u64> {
    u64::from_str_radix(&c[1], 16).ok()
}

/// Runs every pattern against the line, in the fixed order auipc, lui, addi,
/// lw, sw, jr. A line can match more than one pattern; callers apply the
/// matches in order, so the last consumer match wins.
pub fn scan(line: &str) -> Vec<Matched> {
    let mut out = Vec::new();
    if let Some(c) = AUIPC.captures(line) {
        if let (Some(addr), Some(imm)) = (addr(&c), imm(&c, 3)) {
            out.push(Matched { addr, insn: Insn::Auipc { rd: reg(&c, 2), imm } });
        }
    }
    if let Some(c) = LUI.captures(line) {
        if let (Some(addr), Some(imm)) = (addr(&c), imm(&c, 3)) {
            out.push(Matched { addr, insn: Insn::Lui { rd: reg(&c, 2), imm } });
        }
    }
    if let Some(c) = ADDI.captures(line) {
        if let (Some(addr), Some(imm)) = (addr(&c), imm(&c, 4)) {
            out.push(Matched { addr, insn: Insn::Addi { rs: reg(&c, 3), imm } });
        }
    }
    if let Some(c) = LW.captures(line) {
        if let (Some(addr), Some(imm)) = (addr(&c), imm(&c, 3)) {
            out.push(Matched { addr, insn: Insn::Lw { rs: reg(&c, 4), imm } });
        }
    }
    if let Some(c) = SW.captures(line) {
        if let (Some(addr), Some(imm)) = (addr(&c), imm(&c, 3)) {
            out.push(Matched { addr, insn: Insn::Sw { rs: reg(&c, 4), imm } });
        }
    }
    if let Some(c) = JR.captures(line) {
        if let (Some(addr), Some(imm)) = (addr(&c), imm(&c, 2)) {
            out.push(Matched { addr, insn: Insn::Jr { rs: reg(&c, 3), imm } });
        }
    }
    out
}
