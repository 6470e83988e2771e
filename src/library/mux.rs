//! Multiplexers.
//!
//! `sel` picks `b` over `a` when high. Wider selectors are decoded as a tree
//! of two-way multiplexers, one level per select bit.

use crate::error::CircuitResult;
use crate::library::gates::{gate, GateOp};
use crate::module::ModuleDef;
use crate::pin::Signal;
use crate::signature::Signature;

/// `mux2`: `a`, `b`, `sel` -> `q`.
pub fn mux2() -> CircuitResult<ModuleDef> {
    let not = gate(GateOp::Not)?;
    let and = gate(GateOp::And)?;
    let or = gate(GateOp::Or)?;
    let sig = Signature::builder("mux2")
        .input("a", 1)
        .input("b", 1)
        .input("sel", 1)
        .output("q", 1)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let sel = w.input("sel")?;

        let inv = w.instantiate(&not)?;
        w.set_input(&inv, "a", &sel)?;

        let pick_a = w.instantiate(&and)?;
        w.set_input(&pick_a, "a", w.input("a")?)?;
        w.set_input(&pick_a, "b", inv.output("q")?)?;

        let pick_b = w.instantiate(&and)?;
        w.set_input(&pick_b, "a", w.input("b")?)?;
        w.set_input(&pick_b, "b", sel)?;

        let merge = w.instantiate(&or)?;
        w.set_input(&merge, "a", pick_a.output("q")?)?;
        w.set_input(&merge, "b", pick_b.output("q")?)?;

        w.set_output("q", merge.output("q")?)
    }))
}

/// `mux2x{width}`: `a(width)`, `b(width)`, `sel` -> `q(width)`.
pub fn mux2_bus(width: usize) -> CircuitResult<ModuleDef> {
    let bit = mux2()?;
    let sig = Signature::builder(format!("mux2x{width}"))
        .input("a", width)
        .input("b", width)
        .input("sel", 1)
        .output("q", width)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let a = w.input("a")?;
        let b = w.input("b")?;
        let sel = w.input("sel")?;

        let mut outputs = Vec::with_capacity(width);
        for i in (0..width).rev() {
            let m = w.instantiate(&bit)?;
            w.set_input(&m, "a", a.bit(i)?)?;
            w.set_input(&m, "b", b.bit(i)?)?;
            w.set_input(&m, "sel", &sel)?;
            outputs.push(m.output("q")?);
        }
        w.set_output("q", Signal::concat(outputs))
    }))
}

/// `mux4x{width}`: `d0`..`d3` (each `width` bits), `sel(2)` -> `q(width)`.
pub fn mux4(width: usize) -> CircuitResult<ModuleDef> {
    let pair = mux2_bus(width)?;
    let sig = Signature::builder(format!("mux4x{width}"))
        .input("d0", width)
        .input("d1", width)
        .input("d2", width)
        .input("d3", width)
        .input("sel", 2)
        .output("q", width)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let sel = w.input("sel")?;
        let low_sel = sel.bit(0)?;

        let low = w.instantiate(&pair)?;
        w.set_input(&low, "a", w.input("d0")?)?;
        w.set_input(&low, "b", w.input("d1")?)?;
        w.set_input(&low, "sel", &low_sel)?;

        let high = w.instantiate(&pair)?;
        w.set_input(&high, "a", w.input("d2")?)?;
        w.set_input(&high, "b", w.input("d3")?)?;
        w.set_input(&high, "sel", low_sel)?;

        let top = w.instantiate(&pair)?;
        w.set_input(&top, "a", low.output("q")?)?;
        w.set_input(&top, "b", high.output("q")?)?;
        w.set_input(&top, "sel", sel.bit(1)?)?;

        w.set_output("q", top.output("q")?)
    }))
}
