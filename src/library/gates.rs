//! Combinational logic gates.
//!
//! Two-input gates take `a` and `b`; `not` and `buffer` take only `a`. All
//! gates drive a single output `q`.

use serde::{Deserialize, Serialize};

use crate::error::CircuitResult;
use crate::module::{Behavior, ModuleDef, PinAccess};
use crate::signature::Signature;

/// The boolean function of a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOp {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
    Buffer,
}

impl GateOp {
    /// Every gate operation.
    pub const ALL: [GateOp; 8] = [
        GateOp::And,
        GateOp::Or,
        GateOp::Not,
        GateOp::Nand,
        GateOp::Nor,
        GateOp::Xor,
        GateOp::Xnor,
        GateOp::Buffer,
    ];

    /// Returns the module type name.
    pub fn name(self) -> &'static str {
        match self {
            GateOp::And => "and",
            GateOp::Or => "or",
            GateOp::Not => "not",
            GateOp::Nand => "nand",
            GateOp::Nor => "nor",
            GateOp::Xor => "xor",
            GateOp::Xnor => "xnor",
            GateOp::Buffer => "buffer",
        }
    }

    /// Returns the number of inputs.
    pub fn arity(self) -> usize {
        match self {
            GateOp::Not | GateOp::Buffer => 1,
            _ => 2,
        }
    }

    /// Applies the function. `b` is ignored by single-input gates.
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            GateOp::And => a && b,
            GateOp::Or => a || b,
            GateOp::Not => !a,
            GateOp::Nand => !(a && b),
            GateOp::Nor => !(a || b),
            GateOp::Xor => a ^ b,
            GateOp::Xnor => !(a ^ b),
            GateOp::Buffer => a,
        }
    }
}

/// Behavior shared by all gates.
#[derive(Clone, Copy, Debug)]
pub struct Gate {
    op: GateOp,
}

impl Gate {
    /// Creates a gate behavior.
    pub fn new(op: GateOp) -> Self {
        Self { op }
    }
}

impl Behavior for Gate {
    fn evaluate(&mut self, pins: &mut PinAccess<'_>) -> CircuitResult<()> {
        let a = pins.input("a")?;
        let b = if self.op.arity() == 2 {
            pins.input("b")?
        } else {
            false
        };
        pins.set_output("q", self.op.apply(a, b))
    }
}

/// Defines a gate module.
pub fn gate(op: GateOp) -> CircuitResult<ModuleDef> {
    let mut builder = Signature::builder(op.name()).input("a", 1);
    if op.arity() == 2 {
        builder = builder.input("b", 1);
    }
    let sig = builder.output("q", 1).build()?;
    Ok(ModuleDef::primitive(sig, move || Box::new(Gate::new(op))))
}
