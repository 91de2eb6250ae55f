//! Processor core: architectural state, step loop, and functional units.

/// Architectural state (privilege modes, trap CSRs).
pub mod arch;

/// The processor, its step loop, fetch unit, trap controller, and
/// diagnostic hooks.
pub mod cpu;

/// Functional units owned by the core (decoded-instruction cache).
pub mod units;

pub use cpu::Processor;
