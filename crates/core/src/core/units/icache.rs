//! Decoded-instruction cache.
//!
//! A small direct-mapped cache of fetch results keyed by program counter.
//! It absorbs the translation + decode cost across repeated execution of
//! the same code region; it never affects architectural behavior, only the
//! cost of reproducing it.
//!
//! Invariant: a line whose tag equals `pc` holds a fetch result that is
//! bit-identical to what a cold fetch at `pc` would produce, as long as the
//! owning collaborator has honored the invalidation contract (a call to
//! [`ICache::invalidate_all`] on any translation-affecting event before the
//! next fetch). A stale tag surviving past that contract is a simulator
//! bug, not a simulated condition.

use crate::common::constants::IC_INDEX_SHIFT;
use crate::core::cpu::FetchResult;

/// One cache line: the program counter it was filled for plus the decoded
/// fetch result. Absent lines are invalid.
#[derive(Clone, Copy, Debug)]
struct Line {
    tag: u64,
    data: FetchResult,
}

/// Direct-mapped cache of decoded fetch results.
#[derive(Debug)]
pub struct ICache {
    lines: Vec<Option<Line>>,
}

impl ICache {
    /// Creates a cache with `entries` lines.
    ///
    /// # Panics
    ///
    /// Panics if `entries` is not a nonzero power of two; the index
    /// function relies on mask addressing. Callers constructing from
    /// untrusted configuration validate first (`Config::validate`).
    pub fn new(entries: usize) -> Self {
        assert!(
            entries.is_power_of_two(),
            "icache entries must be a nonzero power of two, got {entries}"
        );
        Self {
            lines: vec![None; entries],
        }
    }

    /// Number of lines in the cache.
    #[inline(always)]
    pub fn entries(&self) -> usize {
        self.lines.len()
    }

    /// The line index a program counter maps to.
    ///
    /// Sequential 32-bit instructions occupy consecutive lines, so the
    /// fast-path walk can advance one line per instruction.
    #[inline(always)]
    pub fn index(&self, pc: u64) -> usize {
        (pc >> IC_INDEX_SHIFT) as usize & (self.lines.len() - 1)
    }

    /// Looks up the line `pc` canonically maps to. Hit iff the tag matches.
    #[inline(always)]
    pub fn lookup(&self, pc: u64) -> Option<FetchResult> {
        self.lookup_at(self.index(pc), pc)
    }

    /// Looks up an explicit `slot`, hitting only on an exact tag match.
    ///
    /// The fast-path walk probes the *next sequential slot* rather than the
    /// canonical index; the tag comparison alone guarantees correctness,
    /// the slot choice is a locality heuristic.
    #[inline(always)]
    pub fn lookup_at(&self, slot: usize, pc: u64) -> Option<FetchResult> {
        match &self.lines[slot] {
            Some(line) if line.tag == pc => Some(line.data),
            _ => None,
        }
    }

    /// Installs `data` for `pc` at its canonical index, evicting whatever
    /// the line previously held.
    #[inline(always)]
    pub fn fill(&mut self, pc: u64, data: FetchResult) {
        let idx = self.index(pc);
        self.lines[idx] = Some(Line { tag: pc, data });
    }

    /// Invalidates every line.
    ///
    /// The collaborator that owns translation state must call this on any
    /// event that can change what a fetch at a cached pc would produce
    /// (page table update, self-modifying code, `FENCE.I`), before the
    /// next fetch on this core.
    pub fn invalidate_all(&mut self) {
        for line in &mut self.lines {
            *line = None;
        }
    }
}
