//! Core type definitions for the circuit engine.
//!
//! This module defines the identifiers shared by the graph builder, the
//! flattener, the state store and both simulators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of one instantiated module.
///
/// Allocated by the owning [`Circuit`](crate::circuit::Circuit) from a
/// monotonically increasing counter starting at 1. Never reused.
pub type ModuleId = u32;

/// Index of a single pin bit within a module's signature.
///
/// Input bits come first (declaration order, buses most-significant bit
/// first), followed by output bits in the same manner.
pub type PinSlot = u16;

/// Direction of a pin relative to the module that declares it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Consumed by the module.
    Input,
    /// Produced by the module.
    Output,
}

impl Direction {
    /// Returns true for [`Direction::Input`].
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input)
    }

    /// Returns true for [`Direction::Output`].
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Identifier of a net: one bit of one pin of one module instance.
///
/// Nets are the unit of connection, state, and fan-in/fan-out bookkeeping.
/// The human-readable `"<bitPinName>:<moduleId>"` form is produced by
/// [`Circuit::net_name`](crate::circuit::Circuit::net_name), which knows the
/// signature needed to name the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetId {
    /// The module instance owning the pin
    pub module: ModuleId,
    /// The bit slot within that module's signature
    pub slot: PinSlot,
}

impl NetId {
    /// Creates a new net identifier.
    pub fn new(module: ModuleId, slot: PinSlot) -> Self {
        Self { module, slot }
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.slot, self.module)
    }
}
