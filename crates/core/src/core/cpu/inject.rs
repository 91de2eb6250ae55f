//! Transient fetch-fault injection.
//!
//! Models single-event memory faults for resilience studies: an external
//! test controller configures a trigger step; when the instrumented loop
//! observes the global step counter matching it, the hook arms, and the
//! next fetch matching the target substitutes an access fault for the
//! normal fetch result. Injection changes only *whether* a fault occurs —
//! the fault then propagates through the ordinary trap path.

/// What kind of access an armed injection victimizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InjectTarget {
    /// Instruction fetches (the only target this core consumes).
    #[default]
    InstructionFetch,
    /// Data loads and stores, consumed by the memory collaborator.
    DataAccess,
}

/// Fault-injection control state.
///
/// Fields are public: they are mutated by the external injection
/// controller and only read (and disarmed) by the fetch unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct FaultInjector {
    /// Master enable. Cleared automatically when an injection fires, so
    /// each arming produces exactly one fault.
    pub enabled: bool,
    /// Which access kind to victimize.
    pub target: InjectTarget,
    /// Global step count at which to arm.
    pub trigger_step: u64,
    /// Set when the trigger has matched; the next matching fetch fires.
    pub armed: bool,
}

impl FaultInjector {
    /// Arms the hook if the trigger step has been reached and the target
    /// is instruction fetch. Returns `true` on the transition to armed.
    pub const fn arm_if_due(&mut self, total_steps: u64) -> bool {
        if self.enabled
            && !self.armed
            && matches!(self.target, InjectTarget::InstructionFetch)
            && total_steps == self.trigger_step
        {
            self.armed = true;
            return true;
        }
        false
    }

    /// Consumes an armed injection. Returns `true` exactly once per
    /// arming; firing also drops the master enable so the hook stays
    /// one-shot until the controller re-enables it.
    pub const fn fire(&mut self) -> bool {
        if self.armed {
            self.armed = false;
            self.enabled = false;
            return true;
        }
        false
    }
}
