//! Simulator error type.

use std::fmt;

/// Reason a simulated call stopped before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The word at `pc` does not decode.
    IllegalInstruction {
        /// Address of the instruction.
        pc: u64,
        /// The raw bits (a halfword for compressed encodings).
        raw: u32,
    },

    /// `ebreak` was executed.
    Breakpoint {
        /// Address of the `ebreak`.
        pc: u64,
    },

    /// `ecall` was executed.
    EnvironmentCall {
        /// Address of the `ecall`.
        pc: u64,
    },

    /// An access touched unmapped memory.
    MemoryFault {
        /// Faulting address.
        addr: u64,
        /// Access width in bytes.
        size: usize,
    },

    /// An atomic access or an instruction fetch was not naturally aligned.
    MisalignedAccess {
        /// Faulting address.
        addr: u64,
        /// Required alignment in bytes.
        align: usize,
    },

    /// The call executed more instructions than the configured limit.
    StepLimit {
        /// The configured limit.
        limit: u64,
    },

    /// Finalized code could not be placed in simulated memory.
    Load {
        /// Description of the problem.
        detail: String,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::IllegalInstruction { pc, raw } => {
                write!(f, "illegal instruction {:#010x} at {:#x}", raw, pc)
            }
            SimError::Breakpoint { pc } => write!(f, "breakpoint at {:#x}", pc),
            SimError::EnvironmentCall { pc } => write!(f, "environment call at {:#x}", pc),
            SimError::MemoryFault { addr, size } => {
                write!(f, "{}-byte access to unmapped address {:#x}", size, addr)
            }
            SimError::MisalignedAccess { addr, align } => {
                write!(f, "address {:#x} is not {}-byte aligned", addr, align)
            }
            SimError::StepLimit { limit } => {
                write!(f, "step limit of {} instructions exceeded", limit)
            }
            SimError::Load { detail } => write!(f, "cannot load code: {}", detail),
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = SimError::IllegalInstruction { pc: 0x10000, raw: 0 };
        assert_eq!(e.to_string(), "illegal instruction 0x00000000 at 0x10000");
        let e = SimError::MisalignedAccess { addr: 0x1002, align: 8 };
        assert_eq!(e.to_string(), "address 0x1002 is not 8-byte aligned");
        let e = SimError::StepLimit { limit: 10 };
        assert!(e.to_string().contains("10 instructions"));
    }
}
