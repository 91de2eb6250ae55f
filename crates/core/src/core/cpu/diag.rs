//! Diagnostic Hooks.
//!
//! Two independently toggleable hooks fire after every successfully
//! dispatched instruction (never for serialization requests):
//! 1. **Commit log:** One line per retired instruction on a dedicated
//!    append-only sink — privilege digit, program counter, the raw bits
//!    masked to the encoded length, and the register write if one
//!    occurred.
//! 2. **PC histogram:** A sparse per-program-counter execution counter
//!    for hot-code profiling over the full address domain.

use std::collections::HashMap;
use std::io::Write;

use super::{Processor, RegDest, RegWrite};
use crate::core::arch::mode::PrivilegeMode;
use crate::isa::Insn;

impl Processor {
    /// Writes one commit-log line for a retired instruction.
    ///
    /// Format: `P 0xPC (0xBITS)` plus ` cNN 0xVALUE` when the instruction
    /// wrote a register, where `P` is the privilege digit and `c` is `x`
    /// for integer or `f` for floating-point destinations.
    pub(crate) fn commit_log_line(
        &mut self,
        prv: PrivilegeMode,
        pc: u64,
        insn: Insn,
        reg_write: Option<RegWrite>,
    ) {
        let bits = insn.masked_bits();
        let line = match reg_write {
            Some(RegWrite { dest, value }) => {
                let (class, idx) = match dest {
                    RegDest::Int(i) => ('x', i),
                    RegDest::Fp(i) => ('f', i),
                };
                format!(
                    "{} 0x{:016x} (0x{:08x}) {}{:2} 0x{:016x}",
                    prv.to_u8(),
                    pc,
                    bits,
                    class,
                    idx,
                    value
                )
            }
            None => format!("{} 0x{:016x} (0x{:08x})", prv.to_u8(), pc, bits),
        };
        // The commit log is best-effort output; a broken sink must not
        // perturb simulation.
        let _ = writeln!(&mut self.commit_out, "{line}");
    }

    /// Bumps the execution counter for `pc`.
    pub(crate) fn update_histogram(&mut self, pc: u64) {
        *self.pc_histogram.entry(pc).or_insert(0) += 1;
    }

    /// Emits the instrumented-path trace record for one instruction.
    pub(crate) fn trace_insn(&self, pc: u64, insn: Insn) {
        tracing::trace!(hart = self.hart_id, pc, insn = %insn, "exec");
    }

    /// The per-pc execution histogram collected so far.
    pub const fn histogram(&self) -> &HashMap<u64, u64> {
        &self.pc_histogram
    }

    /// Dumps the histogram to stderr, hottest program counters first.
    pub fn dump_histogram(&self) {
        let mut entries: Vec<(u64, u64)> = self
            .pc_histogram
            .iter()
            .map(|(&pc, &count)| (pc, count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        eprintln!("PC histogram, hart {} ({} pcs):", self.hart_id, entries.len());
        for (pc, count) in entries {
            eprintln!("  {pc:#018x} {count}");
        }
    }
}
