//! Fetch Unit.
//!
//! Produces [`FetchResult`]s for the step loop. Two modes:
//! 1. **Cold fetch:** Delegates translation and decode to the external
//!    memory/decode collaborator. Always correct; no cache side effects.
//! 2. **Cache-assisted fetch:** Consults the decoded-instruction cache
//!    first and populates the missed line from a cold fetch.
//!
//! The armed fault-injection hook intercepts cold fetches, substituting an
//! instruction access fault for the decoded result exactly once per
//! arming.

use super::{FetchResult, Processor};
use crate::common::error::Trap;

/// The memory/decode collaborator of the core.
///
/// Implementations perform address translation and decode the instruction
/// at a program counter into an executable [`FetchResult`], or report the
/// architectural fault that prevents it. Out of scope for the core itself:
/// the memory map, MMIO dispatch, and per-encoding decode tables all live
/// behind this seam.
pub trait FetchPort {
    /// Translates `pc` and decodes the instruction there.
    fn decode_and_translate(&mut self, pc: u64) -> Result<FetchResult, Trap>;
}

impl Processor {
    /// Cold fetch: translation + decode via the port, bypassing the cache.
    ///
    /// The instrumented path fetches cold every instruction; the fast path
    /// uses it to service misses and sequential refills.
    pub(crate) fn fetch_cold(&mut self, pc: u64) -> Result<FetchResult, Trap> {
        if self.injector.fire() {
            self.stats.injected_faults += 1;
            tracing::warn!(pc, "injected instruction fetch fault");
            return Err(Trap::InstructionAccessFault(pc));
        }
        self.port.decode_and_translate(pc)
    }

    /// Cache-assisted fetch: hit in the decoded-instruction cache, or
    /// cold-fetch and install the line.
    pub(crate) fn fetch_cached(&mut self, pc: u64) -> Result<FetchResult, Trap> {
        if let Some(hit) = self.icache.lookup(pc) {
            self.stats.icache_hits += 1;
            return Ok(hit);
        }
        self.stats.icache_misses += 1;
        let fetched = self.fetch_cold(pc)?;
        self.icache.fill(pc, fetched);
        Ok(fetched)
    }

    /// Sequential refill: pre-installs the line for `pc` after the
    /// fast-path walk left the cached region without a taken branch, so
    /// the next access hits.
    ///
    /// The refill is a prefetch: a fetch fault here is swallowed, and the
    /// demand fetch raises it precisely if execution actually reaches
    /// `pc`. This keeps traps attributable to instructions that run, not
    /// to refill speculation.
    pub(crate) fn refill_sequential(&mut self, pc: u64) {
        if let Ok(fetched) = self.fetch_cold(pc) {
            self.icache.fill(pc, fetched);
            self.stats.icache_refills += 1;
        }
    }
}
