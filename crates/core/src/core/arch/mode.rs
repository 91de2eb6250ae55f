//! RISC-V Privilege Modes.
//!
//! Privilege levels supported by the core: User (U), Supervisor (S), and
//! Machine (M). The ordering of the enum follows the architectural
//! encoding, so `PartialOrd` comparisons express "at most supervisor" tests
//! directly.

/// RISC-V privilege mode levels.
///
/// Machine mode is the highest privilege level. The discriminants are the
/// architectural mode encodings used in `mstatus.MPP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivilegeMode {
    /// User mode (U-mode), for application code.
    User = 0,
    /// Supervisor mode (S-mode), for operating system kernels.
    Supervisor = 1,
    /// Machine mode (M-mode), for firmware and low-level control.
    Machine = 3,
}

impl PrivilegeMode {
    /// Converts an architectural mode encoding to a privilege mode.
    ///
    /// Invalid encodings (the reserved value 2) decode as `Machine`.
    pub const fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::User,
            1 => Self::Supervisor,
            _ => Self::Machine,
        }
    }

    /// The architectural mode encoding (0, 1, or 3).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable mode name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Supervisor => "Supervisor",
            Self::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
