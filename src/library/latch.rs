//! Cross-coupled latches.
//!
//! These contain combinational feedback, so only the event-driven simulator
//! accepts them.

use crate::error::CircuitResult;
use crate::library::gates::{gate, GateOp};
use crate::module::ModuleDef;
use crate::signature::Signature;

/// `sr_latch`: `s`, `r` -> `q`, `qbar`.
///
/// A pair of cross-coupled nand gates behind input inverters, so `s` and `r`
/// are active high. Holding both high is not a valid input.
pub fn sr_latch() -> CircuitResult<ModuleDef> {
    let not = gate(GateOp::Not)?;
    let nand = gate(GateOp::Nand)?;
    let sig = Signature::builder("sr_latch")
        .input("s", 1)
        .input("r", 1)
        .output("q", 1)
        .output("qbar", 1)
        .build()?;

    Ok(ModuleDef::compound(sig, move |w| {
        let set = w.instantiate(&not)?;
        w.set_input(&set, "a", w.input("s")?)?;
        let reset = w.instantiate(&not)?;
        w.set_input(&reset, "a", w.input("r")?)?;

        let upper = w.instantiate(&nand)?;
        let lower = w.instantiate(&nand)?;
        w.set_input(&upper, "a", set.output("q")?)?;
        w.set_input(&upper, "b", lower.output("q")?)?;
        w.set_input(&lower, "a", reset.output("q")?)?;
        w.set_input(&lower, "b", upper.output("q")?)?;

        w.set_output("q", upper.output("q")?)?;
        w.set_output("qbar", lower.output("q")?)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::types::NetId;

    #[test]
    fn test_cross_coupling() {
        let circuit = Circuit::with_top(&sr_latch().unwrap()).unwrap();
        assert_eq!(circuit.primitive_count(), 4);

        // ids: 1 latch, 2/3 inverters, 4/5 nands; nand q is slot 2
        let upper_q = NetId::new(4, 2);
        let lower_b = NetId::new(5, 1);
        assert!(circuit.net(upper_q).unwrap().outputs.contains(&lower_b));
    }
}
