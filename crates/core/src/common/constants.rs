//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator core:
//! 1. **Instruction Constants:** Length bounds and alignment for RISC-V encodings.
//! 2. **Cause Constants:** The interrupt bit used in `mcause`/`scause` values.
//! 3. **Cache Constants:** Default geometry for the decoded-instruction cache.

/// Maximum length of a single RISC-V instruction encoding, in bytes.
///
/// Bounds the sequential-refill window of the instruction cache: a new
/// program counter within `(tag, tag + MAX_INSN_LENGTH]` of the last
/// executed instruction is treated as fall-through rather than a taken
/// branch. The exact window is a locality heuristic, not an
/// architectural requirement.
pub const MAX_INSN_LENGTH: u64 = 8;

/// Instruction address granule used to index the instruction cache.
///
/// Sequential 32-bit instructions advance the cache index by one line.
pub const IC_INDEX_SHIFT: u64 = 2;

/// Default number of lines in the decoded-instruction cache.
///
/// Must be a power of two; the index function masks with `entries - 1`.
pub const ICACHE_ENTRIES: usize = 1024;

/// Bit mask indicating that a trap cause value represents an interrupt.
pub const CAUSE_INTERRUPT_BIT: u64 = 1 << 63;
