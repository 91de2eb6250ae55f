//! Step Loop and Instruction Dispatch.
//!
//! The fetch/dispatch/execute loop — the hot path of the simulator. Each
//! call to [`Processor::step`] runs bounded batches of instructions,
//! interleaving:
//! 1. **Trap/Interrupt Polling:** Once per batch, before any instruction.
//! 2. **Path Selection:** The instrumented (trace) path or the fast path
//!    through the decoded-instruction cache, chosen per batch.
//! 3. **Diagnostic Hooks:** Commit log and pc histogram after each
//!    successfully dispatched instruction.
//! 4. **Trap Unwinding:** A trap raised anywhere in a batch unwinds
//!    directly to the batch boundary with the faulting pc; the retired
//!    count accumulated so far is committed before the trap vectors.

use super::{FetchResult, NextPc, Processor};
use crate::common::constants::MAX_INSN_LENGTH;
use crate::common::error::Trap;

/// Why an inner batch loop ended without trapping.
enum BatchExit {
    /// The batch quota was consumed.
    Quota,
    /// An instruction requested serialization; the step call halts.
    Serialized,
}

impl Processor {
    /// Executes up to `n` instructions, resuming from the saved program
    /// counter.
    ///
    /// Returns early when the run flag is cleared (cooperatively, after
    /// the in-flight instruction completes — never mid-instruction) or
    /// when an instruction requests serialization; traps are handled
    /// internally and do not end the call. Callable repeatedly; each
    /// call resumes where the previous one stopped.
    pub fn step(&mut self, mut n: u64) {
        while self.running && n > 0 {
            let mut instret: u64 = 0;
            let mut pc = self.pc;

            let exit = self.run_batch(n, &mut pc, &mut instret);

            // The batch's retired count commits before any trap vectoring.
            self.minstret += instret;
            self.stats.instructions_retired += instret;
            n -= instret;

            match exit {
                Ok(BatchExit::Quota) => {}
                Ok(BatchExit::Serialized) => break,
                Err(trap) => self.take_trap(&trap, pc),
            }
        }
    }

    /// One batch: poll the trap/interrupt controller, then run whichever
    /// execution path the debug flag selects.
    fn run_batch(&mut self, n: u64, pc: &mut u64, instret: &mut u64) -> Result<BatchExit, Trap> {
        self.check_timer();
        self.take_interrupt()?;

        if self.instrumented {
            self.run_instrumented(n, pc, instret)
        } else {
            self.run_cached(n, pc, instret)
        }
    }

    /// Instrumented path: cold fetch and trace every instruction.
    fn run_instrumented(
        &mut self,
        n: u64,
        pc: &mut u64,
        instret: &mut u64,
    ) -> Result<BatchExit, Trap> {
        while *instret < n && self.running {
            if self.injector.arm_if_due(self.total_steps) {
                tracing::info!(
                    step = self.total_steps,
                    "fault injection armed for instruction fetch"
                );
            }

            let fetch = self.fetch_cold(*pc)?;
            if !self.serialized {
                self.trace_insn(*pc, fetch.insn);
            }
            match self.dispatch(*pc, fetch)? {
                NextPc::Serialize => return Ok(self.serialize_batch()),
                NextPc::Addr(npc) => {
                    self.pc = npc;
                    *pc = npc;
                    *instret += 1;
                }
            }
        }
        Ok(BatchExit::Quota)
    }

    /// Fast path: dispatch out of the decoded-instruction cache, walking
    /// consecutive lines while execution stays sequential.
    fn run_cached(&mut self, n: u64, pc: &mut u64, instret: &mut u64) -> Result<BatchExit, Trap> {
        while *instret < n && self.running {
            let mut fetch = self.fetch_cached(*pc)?;
            let mut slot = self.icache.index(*pc);

            loop {
                let executed_pc = *pc;
                let next = self.dispatch(*pc, fetch)?;
                slot += 1;

                let npc = match next {
                    NextPc::Serialize => return Ok(self.serialize_batch()),
                    NextPc::Addr(a) => a,
                };
                self.pc = npc;
                *pc = npc;
                *instret += 1;

                if slot == self.icache.entries() {
                    // End of the line group; the outer loop re-indexes.
                    break;
                }
                match self.icache.lookup_at(slot, npc) {
                    Some(hit) => {
                        if *instret == n || !self.running {
                            break;
                        }
                        self.stats.icache_hits += 1;
                        fetch = hit;
                    }
                    None => {
                        // Refill only when execution fell through
                        // sequentially; past a taken branch the refill
                        // would be wasted work.
                        if npc > executed_pc && npc <= executed_pc + MAX_INSN_LENGTH {
                            self.refill_sequential(npc);
                        }
                        break;
                    }
                }
            }
        }
        Ok(BatchExit::Quota)
    }

    /// Dispatches one instruction and fires the diagnostic hooks if it
    /// retired (hooks are skipped for serialization requests).
    fn dispatch(&mut self, pc: u64, fetch: FetchResult) -> Result<NextPc, Trap> {
        // Privilege is stashed before execution: the commit log reports
        // the mode the instruction ran in, not the one it switched to.
        let prv = self.privilege;
        let exec = fetch.exec;
        let outcome = exec(self, fetch.insn, pc)?;

        if !matches!(outcome.next_pc, NextPc::Serialize) {
            if self.commit_log {
                self.commit_log_line(prv, pc, fetch.insn, outcome.reg_write);
            }
            if self.histogram {
                self.update_histogram(pc);
            }
        }
        Ok(outcome.next_pc)
    }

    /// Marks the serialization point: the current instruction is not
    /// counted as retired and the program counter stays on it, so the
    /// next `step` call re-fetches the same instruction.
    fn serialize_batch(&mut self) -> BatchExit {
        self.serialized = true;
        self.stats.serializations += 1;
        BatchExit::Serialized
    }
}
