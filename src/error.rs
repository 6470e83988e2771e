//! Error taxonomy for circuit construction, flattening and simulation.
//!
//! Every variant describes a mistake in the circuit description (or a
//! circuit that cannot settle). None of them are transient, so nothing in the
//! crate retries: the operation that detects the problem returns it
//! immediately.

use thiserror::Error;

use crate::types::ModuleId;

/// Errors raised while building or simulating a circuit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error("module name `{0}` is already registered with a different signature")]
    DuplicateModuleName(String),

    #[error("module `{module}` declares pin `{pin}` more than once")]
    DuplicatePinName { module: String, pin: String },

    #[error("pin `{pin}` of module `{module}` has invalid width {width}")]
    InvalidWidth {
        module: String,
        pin: String,
        width: usize,
    },

    #[error("pin `{pin}` of module `{module}` is {expected} bits wide, got {actual}")]
    PinWidthMismatch {
        module: String,
        pin: String,
        expected: usize,
        actual: usize,
    },

    #[error("output pin `{pin}` of module `{module}` (id {id}) has no driver")]
    UnconnectedOutputPin {
        module: String,
        id: ModuleId,
        pin: String,
    },

    #[error("pin `{pin}` of module `{module}` (id {id}) is not connected")]
    UnconnectedPin {
        module: String,
        id: ModuleId,
        pin: String,
    },

    #[error("net `{net}` has {drivers} drivers")]
    MultipleDrivers { net: String, drivers: usize },

    #[error("net `{net}` is wired back onto itself through structural modules")]
    StructuralLoop { net: String },

    #[error("circuit has combinational feedback through {remaining} modules; use the event-driven simulator")]
    CircuitHasFeedback { remaining: usize },

    #[error("invalid pin value: {0}")]
    InvalidPinValue(String),

    #[error("module `{module}` has no pin `{pin}`")]
    UnknownPin { module: String, pin: String },

    #[error("no module with id {0}")]
    UnknownModule(ModuleId),

    #[error("circuit did not settle after {rounds} convergence rounds")]
    NonConvergence { rounds: usize },

    #[error("invalid simulator options: {0}")]
    InvalidOptions(String),
}

/// Result type for circuit operations.
pub type CircuitResult<T> = Result<T, CircuitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CircuitError::PinWidthMismatch {
            module: "adder8".to_string(),
            pin: "a".to_string(),
            expected: 8,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "pin `a` of module `adder8` is 8 bits wide, got 4"
        );

        let err = CircuitError::CircuitHasFeedback { remaining: 2 };
        assert!(err.to_string().contains("event-driven"));
    }
}
