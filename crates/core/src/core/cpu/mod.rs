//! Processor Core Definition and Dispatch Contracts.
//!
//! This module defines the central `Processor` structure and the contracts
//! between the step loop and its collaborators:
//! 1. **State Management:** Program counter, privilege mode, registers,
//!    trap CSRs, and the retired-instruction counter.
//! 2. **Dispatch Contract:** [`FetchResult`], [`ExecFn`], [`ExecOutcome`],
//!    and [`NextPc`] — the seam through which externally decoded
//!    instructions execute.
//! 3. **Integration:** Instruction cache, fault injector, diagnostic
//!    hooks, and the host-clock views the trap controller polls.

/// Diagnostic hooks: commit log and program-counter histogram.
pub mod diag;

/// Step loop and instruction dispatch.
pub mod execution;

/// Fetch unit: cold and cache-assisted instruction fetch.
pub mod fetch;

/// Transient fetch-fault injection hook.
pub mod inject;

/// Trap and interrupt controller.
pub mod trap;

use std::collections::HashMap;
use std::io::{self, Write};

use crate::common::RegisterFile;
use crate::common::error::Trap;
use crate::config::Config;
use crate::core::arch::csr::Csrs;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::units::ICache;
use crate::isa::Insn;
use crate::stats::SimStats;

pub use fetch::FetchPort;
pub use inject::{FaultInjector, InjectTarget};

/// The program counter produced by one instruction's execution.
///
/// `Addr` commits a successor address; `Serialize` is a control signal, not
/// an address: the batch must stop so that state changed by this
/// instruction is observed before the *same* instruction is re-fetched on
/// the next call to [`Processor::step`]. A serializing behavior returns
/// `Serialize` once, then — seeing [`Processor::serialized`] set on
/// re-execution — clears the flag and completes normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextPc {
    /// Commit this address as the next program counter.
    Addr(u64),
    /// Halt the batch and re-fetch this instruction next time.
    Serialize,
}

/// Destination of an architectural register write, for the commit log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegDest {
    /// Integer register file (`x0`-`x31`).
    Int(u8),
    /// Floating-point register file (`f0`-`f31`).
    Fp(u8),
}

/// Record of the register write performed by one instruction, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegWrite {
    /// Which register was written.
    pub dest: RegDest,
    /// The value written.
    pub value: u64,
}

/// Everything one instruction's execution reports back to the dispatcher.
///
/// The register-write record is an explicit return value rather than a
/// shared buffer, so there is no stale state to clear between
/// instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Where control goes next.
    pub next_pc: NextPc,
    /// The register write this instruction performed, for the commit log.
    pub reg_write: Option<RegWrite>,
}

impl ExecOutcome {
    /// An outcome that transfers control to `pc` with no logged write.
    #[inline(always)]
    pub const fn jump(pc: u64) -> Self {
        Self {
            next_pc: NextPc::Addr(pc),
            reg_write: None,
        }
    }

    /// An outcome that transfers control to `pc` after writing a register.
    #[inline(always)]
    pub const fn jump_with_write(pc: u64, dest: RegDest, value: u64) -> Self {
        Self {
            next_pc: NextPc::Addr(pc),
            reg_write: Some(RegWrite { dest, value }),
        }
    }

    /// An outcome requesting serialization.
    #[inline(always)]
    pub const fn serialize() -> Self {
        Self {
            next_pc: NextPc::Serialize,
            reg_write: None,
        }
    }
}

/// Per-instruction behavior function, supplied by the external decoder.
///
/// Given the processor, the decoded instruction, and its address, performs
/// the instruction's architectural effect and reports the outcome, or
/// raises a [`Trap`]. The loop never interprets the instruction itself.
pub type ExecFn = fn(&mut Processor, Insn, u64) -> Result<ExecOutcome, Trap>;

/// A decoded instruction paired with its behavior.
///
/// Immutable once produced; safe to cache and re-dispatch for the same
/// program counter as long as the underlying translation remains valid.
#[derive(Clone, Copy, Debug)]
pub struct FetchResult {
    /// The decoded instruction (raw bits and length, for diagnostics).
    pub insn: Insn,
    /// The instruction's execution function.
    pub exec: ExecFn,
}

/// A single simulated processor core.
///
/// Owns its architectural state, instruction cache, and diagnostic
/// side-channels exclusively; the host must never call [`Processor::step`]
/// on the same core from two threads. Cancellation is cooperative: clearing
/// [`Processor::running`] stops the loop once the in-flight instruction
/// completes.
pub struct Processor {
    /// General-purpose and floating-point registers. Opaque to the loop;
    /// only behavior functions read or write them.
    pub regs: RegisterFile,
    /// Program counter of the next instruction to execute.
    pub pc: u64,
    /// Trap-related control and status registers.
    pub csrs: Csrs,
    /// Current privilege mode.
    pub privilege: PrivilegeMode,
    /// Cumulative retired-instruction count (`minstret`).
    pub minstret: u64,
    /// Set when the previous batch halted at a serialization point.
    /// Consumed (cleared) by the serializing instruction on re-execution.
    pub serialized: bool,
    /// Run flag; cleared externally to request a cooperative stop.
    pub running: bool,

    /// Memory/decode collaborator performing translation and decode.
    pub port: Box<dyn FetchPort>,
    /// Decoded-instruction cache.
    pub icache: ICache,
    /// Transient fetch-fault injection hook, driven by an external
    /// test controller.
    pub injector: FaultInjector,
    /// Execution statistics.
    pub stats: SimStats,

    hart_id: usize,
    /// Host machine-timer view, synced by the driver before each slice.
    mtime: u64,
    /// Host global step counter view, synced by the driver.
    total_steps: u64,

    instrumented: bool,
    commit_log: bool,
    histogram: bool,
    commit_out: Box<dyn Write>,
    pc_histogram: HashMap<u64, u64>,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("hart_id", &self.hart_id)
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("privilege", &self.privilege)
            .field("minstret", &self.minstret)
            .field("serialized", &self.serialized)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Processor {
    /// Creates a core with the given hart id, memory/decode port, and
    /// configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configured instruction-cache geometry is invalid;
    /// hosts taking untrusted configuration should run
    /// [`Config::validate`] first.
    pub fn new(hart_id: usize, port: Box<dyn FetchPort>, config: &Config) -> Self {
        Self {
            regs: RegisterFile::new(),
            pc: config.core.start_pc,
            csrs: Csrs::default(),
            privilege: PrivilegeMode::Machine,
            minstret: 0,
            serialized: false,
            running: true,
            port,
            icache: ICache::new(config.icache.entries),
            injector: FaultInjector::default(),
            stats: SimStats::default(),
            hart_id,
            mtime: 0,
            total_steps: 0,
            instrumented: config.core.instrumented,
            commit_log: config.core.commit_log,
            histogram: config.core.histogram,
            commit_out: Box::new(io::stderr()),
            pc_histogram: HashMap::new(),
        }
    }

    /// This core's hart id.
    pub const fn hart_id(&self) -> usize {
        self.hart_id
    }

    /// Syncs the host-owned clock values this core polls: the machine
    /// timer and the global step counter. Called by the driver before
    /// each execution slice.
    pub const fn sync_host(&mut self, mtime: u64, total_steps: u64) {
        self.mtime = mtime;
        self.total_steps = total_steps;
    }

    /// Requests a cooperative stop: the step loop exits after the
    /// in-flight instruction completes, never mid-instruction.
    pub const fn stop(&mut self) {
        self.running = false;
    }

    /// Enables or disables the instrumented (trace) execution path.
    /// Read at the top of each batch.
    pub const fn set_instrumented(&mut self, on: bool) {
        self.instrumented = on;
    }

    /// Enables or disables the per-pc execution histogram.
    pub const fn set_histogram(&mut self, on: bool) {
        self.histogram = on;
    }

    /// Enables or disables the commit log.
    pub const fn set_commit_log(&mut self, on: bool) {
        self.commit_log = on;
    }

    /// Redirects the commit-log side channel (stderr by default).
    pub fn set_commit_sink(&mut self, sink: Box<dyn Write>) {
        self.commit_out = sink;
    }

    /// Invalidates every decoded-instruction cache line.
    ///
    /// The collaborator owning translation state must call this on page
    /// table updates, self-modifying code, or `FENCE.I` before the next
    /// fetch on this core.
    pub fn flush_icache(&mut self) {
        tracing::debug!(hart = self.hart_id, "icache flush");
        self.icache.invalidate_all();
    }

    /// Dumps the program counter and integer registers to stderr.
    pub fn dump_state(&self) {
        eprintln!("hart {} pc = {:#018x}", self.hart_id, self.pc);
        self.regs.dump();
    }
}
