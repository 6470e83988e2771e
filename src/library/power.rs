//! The implicit power module.
//!
//! Every circuit gets at most one instance, created the first time a literal
//! 0 or 1 is wired to a pin.

use crate::error::CircuitResult;
use crate::module::{Behavior, ModuleDef, PinAccess};
use crate::signature::Signature;

/// Type name of the power module.
pub const POWER: &str = "power";
/// Output pin carrying constant 1.
pub const VCC: &str = "vcc";
/// Output pin carrying constant 0.
pub const GND: &str = "gnd";

/// Drives `vcc` high and `gnd` low.
#[derive(Debug, Default)]
pub struct Power;

impl Behavior for Power {
    fn evaluate(&mut self, pins: &mut PinAccess<'_>) -> CircuitResult<()> {
        pins.set_output(VCC, true)?;
        pins.set_output(GND, false)
    }
}

/// Defines the power module.
pub fn power() -> CircuitResult<ModuleDef> {
    let sig = Signature::builder(POWER)
        .output(VCC, 1)
        .output(GND, 1)
        .build()?;
    Ok(ModuleDef::primitive(sig, || Box::new(Power)))
}
