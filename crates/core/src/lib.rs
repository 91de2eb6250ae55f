//! Functional RISC-V instruction-set simulator core.
//!
//! This crate implements the execution core of a functional RV64
//! simulator:
//! 1. **Step Loop:** Bounded-batch fetch/dispatch/execute with an
//!    instrumented (trace) path and a fast path through a decoded-
//!    instruction cache.
//! 2. **Trap/Interrupt Controller:** Per-batch timer and interrupt
//!    polling, precise trap dispatch with M/S delegation.
//! 3. **Diagnostics:** Commit log, per-pc histogram, and a transient
//!    fetch-fault injection hook.
//! 4. **Host Driver:** Cooperative round-robin scheduling of multiple
//!    cores with a shared real-time clock.
//!
//! Decoding of individual instruction encodings and the memory map live
//! behind the [`FetchPort`] seam: the core consumes opaque
//! [`FetchResult`]s and never interprets an encoding itself.

/// Common types and constants (traps, registers, length bounds).
pub mod common;
/// Simulator configuration (runtime flags, cache geometry, host loop).
pub mod config;
/// Processor core (step loop, fetch unit, trap controller, icache).
pub mod core;
/// Instruction-set definitions the loop depends on (instruction handle,
/// cause codes).
pub mod isa;
/// Multi-core host driver.
pub mod sim;
/// Execution statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Trap representation, the architectural error channel.
pub use crate::common::Trap;
/// Main processor type; owns state, icache, and diagnostic hooks.
pub use crate::core::Processor;
/// Privilege mode levels and trap CSR state.
pub use crate::core::arch::{Csrs, PrivilegeMode};
/// Dispatch contract types for external decoders.
pub use crate::core::cpu::{
    ExecFn, ExecOutcome, FaultInjector, FetchPort, FetchResult, InjectTarget, NextPc, RegDest,
    RegWrite,
};
/// Opaque decoded-instruction handle.
pub use crate::isa::Insn;
/// Cooperative multi-core driver.
pub use crate::sim::Simulator;
