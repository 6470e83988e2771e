//! Circuit construction, flattening and integrity checking through the
//! public API.

use kairo::flatten::{source_net, target_primitive_mods, without_compound_modules};
use kairo::integrity::check_connections;
use kairo::library::{full_adder, gate, mux2_bus, ripple_adder, GateOp};
use kairo::{
    create_simulator, Approach, Circuit, CircuitError, ModuleDef, NetId, SimOptions, Signal,
    Signature,
};

fn wrapper(name: &str, width: usize, inner: ModuleDef, drive: impl Fn(Signal) -> Signal + Send + Sync + 'static) -> ModuleDef {
    let sig = Signature::builder(name)
        .input("a", width)
        .input("b", width)
        .input("sel", 1)
        .output("q", width)
        .build()
        .unwrap();
    ModuleDef::compound(sig, move |w| {
        let m = w.instantiate(&inner)?;
        w.set_input(&m, "a", drive(w.input("a")?))?;
        w.set_input(&m, "b", w.input("b")?)?;
        w.set_input(&m, "sel", w.input("sel")?)?;
        w.set_output("q", m.output("q")?)
    })
}

#[test]
fn test_widths_must_match_exactly() {
    let ok = wrapper("ok4", 4, mux2_bus(4).unwrap(), |s| s);
    assert!(Circuit::with_top(&ok).is_ok());

    // one bit short
    let short = wrapper("short4", 4, mux2_bus(4).unwrap(), |s| s.slice(2, 0).unwrap());
    let err = Circuit::with_top(&short).unwrap_err();
    assert_eq!(
        err,
        CircuitError::PinWidthMismatch {
            module: "mux2x4".to_string(),
            pin: "a".to_string(),
            expected: 4,
            actual: 3,
        }
    );

    // one bit long
    let long = wrapper("long4", 4, mux2_bus(4).unwrap(), |s| Signal::concat([Signal::from(false), s]));
    assert!(matches!(
        Circuit::with_top(&long),
        Err(CircuitError::PinWidthMismatch { expected: 4, actual: 5, .. })
    ));
}

#[test]
fn test_every_bit_gets_a_net() {
    let circuit = Circuit::with_top(&ripple_adder(8).unwrap()).unwrap();
    let top = circuit.module(1).unwrap();
    assert_eq!(top.signature.slot_count(), 8 + 8 + 1 + 8 + 1);
    for slot in 0..top.signature.slot_count() as u16 {
        assert!(circuit.net(NetId::new(1, slot)).is_some());
    }
    let total: usize = circuit.modules().map(|m| m.signature.slot_count()).sum();
    assert_eq!(circuit.net_count(), total);
}

#[test]
fn test_unconnected_pin_detected() {
    let and = gate(GateOp::And).unwrap();
    let sig = Signature::builder("forgot_b").input("a", 1).output("q", 1).build().unwrap();
    let forgot = ModuleDef::compound(sig, move |w| {
        let g = w.instantiate(&and)?;
        w.set_input(&g, "a", w.input("a")?)?;
        w.set_output("q", g.output("q")?)
    });

    let circuit = Circuit::with_top(&forgot).unwrap();
    assert!(matches!(
        check_connections(&circuit),
        Err(CircuitError::UnconnectedPin { ref pin, id: 2, .. }) if pin == "b"
    ));

    for approach in [Approach::Levelization, Approach::EventDriven] {
        assert!(matches!(
            create_simulator(&forgot, &SimOptions::new(approach)),
            Err(CircuitError::UnconnectedPin { .. })
        ));
    }
}

#[test]
fn test_flatten_full_adder() {
    let circuit = Circuit::with_top(&full_adder().unwrap()).unwrap();
    let flat = without_compound_modules(&circuit).unwrap();

    assert_eq!(flat.module_count(), circuit.primitive_count());
    assert!(flat.modules().all(|m| m.is_primitive() && m.parent.is_none()));

    // carryIn reaches only the second half adder's gates
    let consumers = target_primitive_mods(&circuit, NetId::new(1, 2));
    let names: Vec<&str> = consumers
        .iter()
        .map(|id| circuit.module(*id).unwrap().name())
        .collect();
    assert_eq!(names, vec!["xor", "and"]);

    // the carry out comes from the or gate
    let carry = source_net(&circuit, NetId::new(1, 4)).unwrap();
    assert_eq!(circuit.module(carry.module).unwrap().name(), "or");
}

#[test]
fn test_hierarchy_is_exported() {
    let circuit = Circuit::with_top(&ripple_adder(2).unwrap()).unwrap();
    let snapshot = serde_json::to_value(circuit.snapshot()).unwrap();

    let modules = snapshot["modules"].as_array().unwrap();
    assert_eq!(modules.len(), circuit.module_count());
    assert_eq!(modules[0]["name"], "adder2");
    assert_eq!(modules[0]["sub_modules"].as_array().unwrap().len(), 2);

    let names: Vec<&str> = circuit.signatures().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["adder2", "and", "full_adder", "half_adder", "or", "xor"]);
}

#[test]
fn test_ids_are_per_circuit() {
    let adder = full_adder().unwrap();
    let one = Circuit::with_top(&adder).unwrap();
    let two = Circuit::with_top(&adder).unwrap();
    assert_eq!(one.top(), Some(1));
    assert_eq!(two.top(), Some(1));
    assert_eq!(one.module_count(), two.module_count());
}
