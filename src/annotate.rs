use std::collections::HashMap;
use std::io::{BufRead, Write};

use tracing::trace;

use crate::pattern::{scan, Insn};

/// A fact stays usable while `recorded_line + LINE_LIMIT > current_line`.
/// Load-address pairs are emitted as tightly adjacent instructions; a
/// register reused much later holds an unrelated value.
pub const LINE_LIMIT: u64 = 4;

/// Upper half of an address, plus the input line where it was formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fact {
    pub line: u64,
    pub upper: i64,
}

/// Streaming annotator over disassembly listings. Feed lines in order; line
/// numbering and the register fact table carry across calls, so one
/// annotator spans multiple concatenated input files.
#[derive(Debug, Default)]
pub struct Annotator {
    facts: HashMap<String, Fact>,
    line_no: u64,
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one input line: records upper-half facts from `auipc`/`lui`
    /// and returns the resolved address if a consumer matched a fresh fact.
    /// When a line matches several patterns, the last consumer match wins.
    pub fn feed(&mut self, line: &str) -> Option<i64> {
        self.line_no += 1;
        let mut actual = None;
        for m in scan(line) {
            match m.insn {
                Insn::Auipc { rd, imm } => {
                    // auipc adds the upper immediate to its own address
                    self.record(rd, (m.addr as i64).wrapping_add(imm.wrapping_mul(0x1000)));
                }
                Insn::Lui { rd, imm } => {
                    self.record(rd, imm.wrapping_mul(0x1000));
                }
                Insn::Addi { rs, imm }
                | Insn::Lw { rs, imm }
                | Insn::Sw { rs, imm }
                | Insn::Jr { rs, imm } => {
                    if let Some(f) = self.fresh(&rs) {
                        let addr = f.upper.wrapping_add(imm);
                        trace!("line {}: resolved {:#x} via {}", self.line_no, addr, rs);
                        actual = Some(addr);
                    }
                }
            }
        }
        actual
    }

    /// Annotates a whole stream: one output line per input line, in order.
    /// Unmatched lines pass through verbatim, terminator included.
    pub fn annotate<R: BufRead, W: Write>(
        &mut self,
        reader: &mut R,
        out: &mut W,
    ) -> std::io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            match self.feed(&line) {
                Some(addr) => {
                    let text = line.trim_end_matches(['\n', '\r']);
                    writeln!(out, "{text}   # {}", fmt_addr(addr))?;
                }
                None => out.write_all(line.as_bytes())?,
            }
        }
        Ok(())
    }

    fn record(&mut self, rd: String, upper: i64) {
        // The stack pointer is adjusted with the same idioms but never holds
        // a data address worth annotating.
        if rd == "sp" {
            return;
        }
        trace!("line {}: fact {} = {:#x}", self.line_no, rd, upper);
        self.facts.insert(rd, Fact { line: self.line_no, upper });
    }

    fn fresh(&self, reg: &str) -> Option<Fact> {
        let f = *self.facts.get(reg)?;
        (f.line + LINE_LIMIT > self.line_no).then_some(f)
    }
}

/// 8 lowercase hex digits; negative results print as their low 32 bits.
fn fmt_addr(addr: i64) -> String {
    format!("{:08x}", addr as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auipc_then_addi_resolves() {
        let mut a = Annotator::new();
        assert_eq!(a.feed("    1084:  97 02        auipc   a5,2"), None);
        assert_eq!(a.feed("    1086:  93 85 a7 12  addi    a1,a5,10"), Some(0x308e));
    }

    #[test]
    fn lui_is_absolute() {
        let mut a = Annotator::new();
        assert_eq!(a.feed("    1000:  37 15 00 00  lui     a0,1"), None);
        assert_eq!(a.feed("    1004:  03 25 c5 ff  lw      a2,-4(a0)"), Some(0xffc));
    }

    #[test]
    fn fact_expires_after_window() {
        let mut a = Annotator::new();
        a.feed("    1084:  97 02        auipc   a5,2");
        a.feed("nop");
        a.feed("nop");
        a.feed("nop");
        // observed at line 1, consumer at line 5: 1 + 4 > 5 fails
        assert_eq!(a.feed("    1094:  93 85 a7 12  addi    a1,a5,10"), None);
    }

    #[test]
    fn last_line_inside_window_still_resolves() {
        let mut a = Annotator::new();
        a.feed("    1084:  97 02        auipc   a5,2");
        a.feed("nop");
        a.feed("nop");
        assert_eq!(a.feed("    1090:  93 85 a7 12  addi    a1,a5,10"), Some(0x308e));
    }

    #[test]
    fn sp_is_never_recorded() {
        let mut a = Annotator::new();
        a.feed("    1084:  17 01 00 00  auipc   sp,5");
        assert_eq!(a.feed("    1088:  13 01 01 01  addi    sp,sp,16"), None);
        a.feed("    108c:  37 51 00 00  lui     sp,5");
        assert_eq!(a.feed("    1090:  03 25 c1 00  lw      a0,12(sp)"), None);
    }

    #[test]
    fn redefinition_overwrites_fact() {
        let mut a = Annotator::new();
        a.feed("    1084:  97 02        auipc   a5,2");
        a.feed("    1088:  b7 35 00 00  lui     a5,3");
        assert_eq!(a.feed("    108c:  93 85 07 01  addi    a1,a5,16"), Some(0x3010));
    }

    #[test]
    fn sw_uses_base_register_fact() {
        let mut a = Annotator::new();
        a.feed("    1084:  97 02        auipc   a5,2");
        // stored register a1 has no fact; base a5 does
        assert_eq!(a.feed("    1088:  23 20 b7 00  sw      a1,8(a5)"), Some(0x308c));
    }

    #[test]
    fn jr_resolves_through_base() {
        let mut a = Annotator::new();
        a.feed("    1084:  b7 15 00 00  lui     a1,4096");
        assert_eq!(a.feed("    1088:  67 80 45 00  jr      4(a1)"), Some(0x100_0004));
    }

    #[test]
    fn uppercase_input_matches_lowercase() {
        let mut upper = Annotator::new();
        upper.feed("    1084:  97 02        AUIPC   A5,2");
        let got = upper.feed("    1086:  93 85 a7 12  addi    a1,a5,0");

        let mut lower = Annotator::new();
        lower.feed("    1084:  97 02        auipc   a5,2");
        assert_eq!(got, lower.feed("    1086:  93 85 a7 12  addi    a1,a5,0"));
    }

    #[test]
    fn negative_result_prints_low_32_bits() {
        let mut a = Annotator::new();
        let mut out = Vec::new();
        let input = "    1000:  37 05 00 00  lui     a0,0\n    1004:  03 25 c5 ff  lw      a2,-4(a0)\n";
        a.annotate(&mut input.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("lw      a2,-4(a0)   # fffffffc\n"));
    }
}
