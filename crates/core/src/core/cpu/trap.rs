//! Trap/Interrupt Controller.
//!
//! Polled once at the top of every batch and invoked exactly once when a
//! trap unwinds out of the inner loop. It performs:
//! 1. **Timer Check:** Pends the machine timer interrupt from the host
//!    timer view.
//! 2. **Interrupt Selection:** Converts enabled pending bits into a trap,
//!    honoring privilege gating and `mideleg`.
//! 3. **Trap Dispatch:** Saves the faulting context into the target
//!    mode's CSRs, switches privilege, and redirects the program counter
//!    to the trap vector.

use super::Processor;
use crate::common::error::Trap;
use crate::core::arch::csr::{
    self, Csrs, MIP_MEIP, MIP_MSIP, MIP_MTIP, MIP_SEIP, MIP_SSIP, MIP_STIP,
};
use crate::core::arch::mode::PrivilegeMode;

/// Interrupt priority, highest first: MEI, MSI, MTI, SEI, SSI, STI.
const PRIORITY: [u64; 6] = [MIP_MEIP, MIP_MSIP, MIP_MTIP, MIP_SEIP, MIP_SSIP, MIP_STIP];

/// Picks the highest-priority set bit out of a nonzero pending mask.
const fn highest_priority(pending: u64) -> u64 {
    let mut i = 0;
    while i < PRIORITY.len() {
        if pending & PRIORITY[i] != 0 {
            return PRIORITY[i];
        }
        i += 1;
    }
    0
}

/// Converts an interrupt pending bit into its trap variant.
///
/// Unrecognized bits map to the machine timer interrupt.
const fn irq_to_trap(bit: u64) -> Trap {
    match bit {
        MIP_SSIP => Trap::SupervisorSoftwareInterrupt,
        MIP_MSIP => Trap::MachineSoftwareInterrupt,
        MIP_STIP => Trap::SupervisorTimerInterrupt,
        MIP_SEIP => Trap::SupervisorExternalInterrupt,
        MIP_MEIP => Trap::MachineExternalInterrupt,
        _ => Trap::MachineTimerInterrupt,
    }
}

impl Processor {
    /// Updates the machine timer pending bit from the host timer view.
    ///
    /// A zero `mtimecmp` disables the comparison entirely.
    pub(crate) const fn check_timer(&mut self) {
        if self.csrs.mtimecmp != 0 && self.mtime >= self.csrs.mtimecmp {
            self.csrs.mip |= MIP_MTIP;
        } else {
            self.csrs.mip &= !MIP_MTIP;
        }
    }

    /// Takes the highest-priority enabled pending interrupt, if any.
    ///
    /// Returns `Err` with the interrupt trap to be handled exactly like a
    /// trap raised mid-execution; `Ok(())` when nothing is deliverable.
    /// Machine-level interrupts are deliverable below M-mode
    /// unconditionally and in M-mode when `mstatus.MIE` is set; delegated
    /// interrupts follow the same rule one level down.
    pub(crate) fn take_interrupt(&mut self) -> Result<(), Trap> {
        let pending = self.csrs.mip & self.csrs.mie;
        if pending == 0 {
            return Ok(());
        }

        let m_pending = pending & !self.csrs.mideleg;
        let m_enabled = self.privilege < PrivilegeMode::Machine
            || (self.csrs.mstatus & csr::MSTATUS_MIE) != 0;
        if m_enabled && m_pending != 0 {
            return Err(irq_to_trap(highest_priority(m_pending)));
        }

        let s_pending = pending & self.csrs.mideleg;
        let s_enabled = self.privilege < PrivilegeMode::Supervisor
            || (self.privilege == PrivilegeMode::Supervisor
                && (self.csrs.mstatus & csr::MSTATUS_SIE) != 0);
        if s_enabled && s_pending != 0 {
            return Err(irq_to_trap(highest_priority(s_pending)));
        }

        Ok(())
    }

    /// Handles a trap: saves context, switches privilege, and redirects
    /// the program counter to the trap vector.
    ///
    /// `epc` is the faulting program counter — the address of the
    /// instruction that raised the trap, or of the next instruction to
    /// execute for interrupts taken at the batch boundary. After this
    /// returns, the step loop resumes its outer loop at the redirected
    /// program counter.
    pub fn take_trap(&mut self, trap: &Trap, epc: u64) {
        let (is_interrupt, code) = trap.cause();

        tracing::debug!(
            hart = self.hart_id,
            cause = %trap,
            epc,
            prv = %self.privilege,
            "trap taken"
        );
        self.stats.traps_taken += 1;
        if is_interrupt {
            self.stats.interrupts_taken += 1;
        }

        let deleg = if is_interrupt {
            self.csrs.mideleg
        } else {
            self.csrs.medeleg
        };
        let delegate_to_s =
            self.privilege <= PrivilegeMode::Supervisor && ((deleg >> code) & 1) != 0;

        if delegate_to_s {
            self.csrs.scause = trap.mcause();
            self.csrs.sepc = epc;
            self.csrs.stval = trap.tval();

            let mut sstatus = self.csrs.sstatus;
            if (sstatus & csr::MSTATUS_SIE) != 0 {
                sstatus |= csr::MSTATUS_SPIE;
            } else {
                sstatus &= !csr::MSTATUS_SPIE;
            }
            if self.privilege == PrivilegeMode::Supervisor {
                sstatus |= csr::MSTATUS_SPP;
            } else {
                sstatus &= !csr::MSTATUS_SPP;
            }
            sstatus &= !csr::MSTATUS_SIE;
            self.csrs.sstatus = sstatus;

            // sstatus is a view of mstatus; keep the shared bits coherent.
            let mask = csr::MSTATUS_SIE | csr::MSTATUS_SPIE | csr::MSTATUS_SPP;
            self.csrs.mstatus = (self.csrs.mstatus & !mask) | (sstatus & mask);

            self.privilege = PrivilegeMode::Supervisor;
            self.pc = Csrs::trap_vector(self.csrs.stvec, is_interrupt, code);
        } else {
            self.csrs.mcause = trap.mcause();
            self.csrs.mepc = epc;
            self.csrs.mtval = trap.tval();

            let mut mstatus = self.csrs.mstatus;
            if (mstatus & csr::MSTATUS_MIE) != 0 {
                mstatus |= csr::MSTATUS_MPIE;
            } else {
                mstatus &= !csr::MSTATUS_MPIE;
            }
            mstatus &= !csr::MSTATUS_MPP;
            mstatus |= u64::from(self.privilege.to_u8()) << csr::MSTATUS_MPP_SHIFT;
            mstatus &= !csr::MSTATUS_MIE;
            self.csrs.mstatus = mstatus;

            self.privilege = PrivilegeMode::Machine;
            self.pc = Csrs::trap_vector(self.csrs.mtvec, is_interrupt, code);
        }
    }

    /// Returns from a machine-mode trap handler (`MRET` semantics), for
    /// use by the external decoder's behavior functions.
    pub fn do_mret(&mut self) {
        self.pc = self.csrs.mepc & !1;
        let mstatus = self.csrs.mstatus;
        let mpp = (mstatus >> csr::MSTATUS_MPP_SHIFT) & csr::MSTATUS_MPP_MASK;
        let mpie = (mstatus & csr::MSTATUS_MPIE) != 0;

        self.privilege = PrivilegeMode::from_u8(mpp as u8);
        let mut new_mstatus = mstatus;
        if mpie {
            new_mstatus |= csr::MSTATUS_MIE;
        } else {
            new_mstatus &= !csr::MSTATUS_MIE;
        }
        new_mstatus |= csr::MSTATUS_MPIE;
        new_mstatus &= !csr::MSTATUS_MPP;
        self.csrs.mstatus = new_mstatus;
    }

    /// Returns from a supervisor-mode trap handler (`SRET` semantics).
    pub fn do_sret(&mut self) {
        self.pc = self.csrs.sepc & !1;
        let sstatus = self.csrs.sstatus;
        let spp = (sstatus & csr::MSTATUS_SPP) != 0;
        let spie = (sstatus & csr::MSTATUS_SPIE) != 0;

        self.privilege = if spp {
            PrivilegeMode::Supervisor
        } else {
            PrivilegeMode::User
        };
        let mut new_sstatus = sstatus;
        if spie {
            new_sstatus |= csr::MSTATUS_SIE;
        } else {
            new_sstatus &= !csr::MSTATUS_SIE;
        }
        new_sstatus |= csr::MSTATUS_SPIE;
        new_sstatus &= !csr::MSTATUS_SPP;
        self.csrs.sstatus = new_sstatus;

        let mask = csr::MSTATUS_SIE | csr::MSTATUS_SPIE | csr::MSTATUS_SPP;
        self.csrs.mstatus = (self.csrs.mstatus & !mask) | (new_sstatus & mask);
    }
}
