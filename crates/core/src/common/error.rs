//! Trap and fatal error definitions.
//!
//! This module defines the error channels of the simulator core:
//! 1. **Trap:** Architectural exceptions and interrupts. Always caught at the
//!    step-loop batch boundary, never visible outside the core.
//! 2. **ConfigError:** Fatal construction-time errors. These indicate a
//!    misconfigured simulator, not a simulated architectural condition.

use thiserror::Error;

use super::constants::CAUSE_INTERRUPT_BIT;
use crate::isa::cause::{exception, interrupt};

/// RISC-V trap types representing synchronous exceptions and asynchronous
/// interrupts.
///
/// A `Trap` is produced by an instruction behavior function (or by the
/// interrupt/timer poll at the top of a batch) and propagates through the
/// dispatch call chain as the `Err` arm of a `Result` — nothing between the
/// raising instruction and the batch boundary observes it. It is consumed
/// exactly once by [`Processor::take_trap`](crate::core::cpu::Processor::take_trap).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// Program counter not aligned to the instruction size.
    #[error("InstructionAddressMisaligned({0:#x})")]
    InstructionAddressMisaligned(u64),
    /// Instruction fetch violated memory protection or hit invalid memory.
    #[error("InstructionAccessFault({0:#x})")]
    InstructionAccessFault(u64),
    /// Invalid or unimplemented instruction encoding (payload: the encoding).
    #[error("IllegalInstruction({0:#x})")]
    IllegalInstruction(u64),
    /// Breakpoint instruction or hardware breakpoint (payload: the pc).
    #[error("Breakpoint({0:#x})")]
    Breakpoint(u64),
    /// Load from a misaligned address.
    #[error("LoadAddressMisaligned({0:#x})")]
    LoadAddressMisaligned(u64),
    /// Load violated memory protection or hit invalid memory.
    #[error("LoadAccessFault({0:#x})")]
    LoadAccessFault(u64),
    /// Store/AMO to a misaligned address.
    #[error("StoreAddressMisaligned({0:#x})")]
    StoreAddressMisaligned(u64),
    /// Store/AMO violated memory protection or hit invalid memory.
    #[error("StoreAccessFault({0:#x})")]
    StoreAccessFault(u64),
    /// `ECALL` executed in user mode.
    #[error("EnvironmentCallFromUMode")]
    EnvironmentCallFromUMode,
    /// `ECALL` executed in supervisor mode.
    #[error("EnvironmentCallFromSMode")]
    EnvironmentCallFromSMode,
    /// `ECALL` executed in machine mode.
    #[error("EnvironmentCallFromMMode")]
    EnvironmentCallFromMMode,
    /// Instruction fetch caused a page fault.
    #[error("InstructionPageFault({0:#x})")]
    InstructionPageFault(u64),
    /// Load caused a page fault.
    #[error("LoadPageFault({0:#x})")]
    LoadPageFault(u64),
    /// Store/AMO caused a page fault.
    #[error("StorePageFault({0:#x})")]
    StorePageFault(u64),
    /// Software interrupt targeting supervisor mode.
    #[error("SupervisorSoftwareInterrupt")]
    SupervisorSoftwareInterrupt,
    /// Software interrupt targeting machine mode.
    #[error("MachineSoftwareInterrupt")]
    MachineSoftwareInterrupt,
    /// Timer interrupt targeting supervisor mode.
    #[error("SupervisorTimerInterrupt")]
    SupervisorTimerInterrupt,
    /// Timer interrupt targeting machine mode.
    #[error("MachineTimerInterrupt")]
    MachineTimerInterrupt,
    /// External interrupt targeting supervisor mode.
    #[error("SupervisorExternalInterrupt")]
    SupervisorExternalInterrupt,
    /// External interrupt targeting machine mode.
    #[error("MachineExternalInterrupt")]
    MachineExternalInterrupt,
}

impl Trap {
    /// Returns `(is_interrupt, cause_code)` for this trap.
    ///
    /// The cause code is the exception/interrupt number without the
    /// interrupt bit; [`Trap::mcause`] composes the full CSR value.
    pub const fn cause(&self) -> (bool, u64) {
        match self {
            Self::InstructionAddressMisaligned(_) => {
                (false, exception::INSTRUCTION_ADDRESS_MISALIGNED)
            }
            Self::InstructionAccessFault(_) => (false, exception::INSTRUCTION_ACCESS_FAULT),
            Self::IllegalInstruction(_) => (false, exception::ILLEGAL_INSTRUCTION),
            Self::Breakpoint(_) => (false, exception::BREAKPOINT),
            Self::LoadAddressMisaligned(_) => (false, exception::LOAD_ADDRESS_MISALIGNED),
            Self::LoadAccessFault(_) => (false, exception::LOAD_ACCESS_FAULT),
            Self::StoreAddressMisaligned(_) => (false, exception::STORE_ADDRESS_MISALIGNED),
            Self::StoreAccessFault(_) => (false, exception::STORE_ACCESS_FAULT),
            Self::EnvironmentCallFromUMode => (false, exception::ENVIRONMENT_CALL_FROM_U_MODE),
            Self::EnvironmentCallFromSMode => (false, exception::ENVIRONMENT_CALL_FROM_S_MODE),
            Self::EnvironmentCallFromMMode => (false, exception::ENVIRONMENT_CALL_FROM_M_MODE),
            Self::InstructionPageFault(_) => (false, exception::INSTRUCTION_PAGE_FAULT),
            Self::LoadPageFault(_) => (false, exception::LOAD_PAGE_FAULT),
            Self::StorePageFault(_) => (false, exception::STORE_PAGE_FAULT),
            Self::SupervisorSoftwareInterrupt => {
                (true, interrupt::SUPERVISOR_SOFTWARE & !CAUSE_INTERRUPT_BIT)
            }
            Self::MachineSoftwareInterrupt => {
                (true, interrupt::MACHINE_SOFTWARE & !CAUSE_INTERRUPT_BIT)
            }
            Self::SupervisorTimerInterrupt => {
                (true, interrupt::SUPERVISOR_TIMER & !CAUSE_INTERRUPT_BIT)
            }
            Self::MachineTimerInterrupt => (true, interrupt::MACHINE_TIMER & !CAUSE_INTERRUPT_BIT),
            Self::SupervisorExternalInterrupt => {
                (true, interrupt::SUPERVISOR_EXTERNAL & !CAUSE_INTERRUPT_BIT)
            }
            Self::MachineExternalInterrupt => {
                (true, interrupt::MACHINE_EXTERNAL & !CAUSE_INTERRUPT_BIT)
            }
        }
    }

    /// The value written to `mcause`/`scause` when this trap is taken.
    pub const fn mcause(&self) -> u64 {
        let (is_interrupt, code) = self.cause();
        if is_interrupt {
            CAUSE_INTERRUPT_BIT | code
        } else {
            code
        }
    }

    /// The value written to `mtval`/`stval` when this trap is taken.
    ///
    /// Faulting address for memory traps, the offending encoding for
    /// illegal-instruction traps, zero otherwise.
    pub const fn tval(&self) -> u64 {
        match self {
            Self::InstructionAddressMisaligned(a)
            | Self::InstructionAccessFault(a)
            | Self::LoadAddressMisaligned(a)
            | Self::LoadAccessFault(a)
            | Self::StoreAddressMisaligned(a)
            | Self::StoreAccessFault(a)
            | Self::InstructionPageFault(a)
            | Self::LoadPageFault(a)
            | Self::StorePageFault(a)
            | Self::IllegalInstruction(a) => *a,
            _ => 0,
        }
    }

    /// Whether this trap is an asynchronous interrupt.
    pub const fn is_interrupt(&self) -> bool {
        self.cause().0
    }
}

/// Fatal simulator construction errors.
///
/// Unlike [`Trap`], these never model architectural behavior: they mean the
/// host asked for a configuration the simulator cannot honor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The instruction cache line count is not a power of two.
    #[error("icache entries must be a nonzero power of two, got {0}")]
    BadIcacheGeometry(usize),
    /// The host-loop interleave quantum is zero.
    #[error("host interleave quantum must be nonzero")]
    ZeroInterleave,
    /// Configuration JSON failed to parse.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
