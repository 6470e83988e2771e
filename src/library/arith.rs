//! Adders built structurally from gates.
//!
//! Carry pins are named `carryIn` / `carryOut` throughout the library.

use crate::error::CircuitResult;
use crate::library::gates::{gate, GateOp};
use crate::module::ModuleDef;
use crate::pin::Signal;
use crate::signature::Signature;

/// `half_adder`: `a`, `b` -> `sum`, `carryOut`.
pub fn half_adder() -> CircuitResult<ModuleDef> {
    let xor = gate(GateOp::Xor)?;
    let and = gate(GateOp::And)?;
    let sig = Signature::builder("half_adder")
        .input("a", 1)
        .input("b", 1)
        .output("sum", 1)
        .output("carryOut", 1)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let a = w.input("a")?;
        let b = w.input("b")?;

        let sum = w.instantiate(&xor)?;
        w.set_input(&sum, "a", &a)?;
        w.set_input(&sum, "b", &b)?;

        let carry = w.instantiate(&and)?;
        w.set_input(&carry, "a", a)?;
        w.set_input(&carry, "b", b)?;

        w.set_output("sum", sum.output("q")?)?;
        w.set_output("carryOut", carry.output("q")?)
    }))
}

/// `full_adder`: `a`, `b`, `carryIn` -> `sum`, `carryOut`.
///
/// Two half adders with their carries or-ed together.
pub fn full_adder() -> CircuitResult<ModuleDef> {
    let half = half_adder()?;
    let or = gate(GateOp::Or)?;
    let sig = Signature::builder("full_adder")
        .input("a", 1)
        .input("b", 1)
        .input("carryIn", 1)
        .output("sum", 1)
        .output("carryOut", 1)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let first = w.instantiate(&half)?;
        w.set_input(&first, "a", w.input("a")?)?;
        w.set_input(&first, "b", w.input("b")?)?;

        let second = w.instantiate(&half)?;
        w.set_input(&second, "a", first.output("sum")?)?;
        w.set_input(&second, "b", w.input("carryIn")?)?;

        let carry = w.instantiate(&or)?;
        w.set_input(&carry, "a", first.output("carryOut")?)?;
        w.set_input(&carry, "b", second.output("carryOut")?)?;

        w.set_output("sum", second.output("sum")?)?;
        w.set_output("carryOut", carry.output("q")?)
    }))
}

/// `adder{width}`: `a(width)`, `b(width)`, `carryIn` -> `sum(width)`, `carryOut`.
///
/// A chain of full adders from the least-significant bit up.
pub fn ripple_adder(width: usize) -> CircuitResult<ModuleDef> {
    let full = full_adder()?;
    let sig = Signature::builder(format!("adder{width}"))
        .input("a", width)
        .input("b", width)
        .input("carryIn", 1)
        .output("sum", width)
        .output("carryOut", 1)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let a = w.input("a")?;
        let b = w.input("b")?;
        let mut carry = w.input("carryIn")?;
        let mut sums = Vec::with_capacity(width);

        for i in 0..width {
            let stage = w.instantiate(&full)?;
            w.set_input(&stage, "a", a.bit(i)?)?;
            w.set_input(&stage, "b", b.bit(i)?)?;
            w.set_input(&stage, "carryIn", carry)?;
            sums.push(stage.output("sum")?);
            carry = stage.output("carryOut")?;
        }

        // collected LSB first
        sums.reverse();
        w.set_output("sum", Signal::concat(sums))?;
        w.set_output("carryOut", carry)
    }))
}
