//! Edge-triggered storage.

use crate::error::CircuitResult;
use crate::module::{Behavior, ModuleDef, PinAccess};
use crate::signature::Signature;

/// A parallel-load register.
///
/// On a rising edge of `clk` with `load` high the register captures `d`.
/// The previous clock level is kept per instance, so the first evaluation
/// with `clk` high counts as an edge.
#[derive(Clone, Debug)]
pub struct Register {
    bits: Vec<bool>,
    prev_clk: bool,
}

impl Register {
    /// Creates a cleared register of `width` bits.
    pub fn new(width: usize) -> Self {
        Self {
            bits: vec![false; width],
            prev_clk: false,
        }
    }
}

impl Behavior for Register {
    fn init(&mut self) {
        self.bits.iter_mut().for_each(|b| *b = false);
        self.prev_clk = false;
    }

    fn evaluate(&mut self, pins: &mut PinAccess<'_>) -> CircuitResult<()> {
        let clk = pins.input("clk")?;
        if clk && !self.prev_clk && pins.input("load")? {
            self.bits = pins.input_bus("d")?;
        }
        self.prev_clk = clk;
        pins.set_output_bus("q", &self.bits)
    }
}

/// `register{width}`: `d(width)`, `load`, `clk` -> `q(width)`.
pub fn register(width: usize) -> CircuitResult<ModuleDef> {
    let sig = Signature::builder(format!("register{width}"))
        .input("d", width)
        .input("load", 1)
        .input("clk", 1)
        .output("q", width)
        .build()?;
    Ok(ModuleDef::primitive(sig, move || Box::new(Register::new(width))))
}
