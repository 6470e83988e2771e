//! Properties that hold across simulators and runs.
//!
//! - Both simulators agree on acyclic circuits, constant sources included
//! - Repeated runs give identical results
//! - Reading never changes state

use kairo::library::{gate, mux4, ripple_adder, GateOp};
use kairo::{
    create_simulator, Approach, Behavior, CircuitResult, InputVector, Logic, ModuleDef, PinAccess,
    Signature, SimOptions, Simulator,
};

/// Deterministic xorshift so the vectors are reproducible without a rng crate.
fn vectors(seed: u64, count: usize) -> Vec<(u64, u64, bool)> {
    let mut x = seed;
    let mut next = move || {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        x
    };
    (0..count)
        .map(|_| (next() & 0xff, next() & 0xff, next() & 1 == 1))
        .collect()
}

fn run_adder(approach: Approach) -> Vec<(Vec<Logic>, Vec<Logic>)> {
    let adder = ripple_adder(8).unwrap();
    let mut sim = create_simulator(&adder, &SimOptions::new(approach)).unwrap();
    vectors(0x9e37_79b9_7f4a_7c15, 64)
        .into_iter()
        .map(|(a, b, c)| {
            sim.input(&InputVector::new().value("a", a).value("b", b).bit("carryIn", c))
                .unwrap();
            (sim.read("sum").unwrap(), sim.read("carryOut").unwrap())
        })
        .collect()
}

#[test]
fn test_simulators_agree_on_adder() {
    let levelized = run_adder(Approach::Levelization);
    let event = run_adder(Approach::EventDriven);
    assert_eq!(levelized, event);
}

#[test]
fn test_adder_matches_arithmetic() {
    let adder = ripple_adder(8).unwrap();
    let mut sim = create_simulator(&adder, &SimOptions::new(Approach::EventDriven)).unwrap();
    for (a, b, c) in vectors(42, 32) {
        sim.input(&InputVector::new().value("a", a).value("b", b).bit("carryIn", c))
            .unwrap();
        let total = a + b + u64::from(c);
        assert_eq!(sim.read_u64("sum").unwrap(), Some(total & 0xff));
        assert_eq!(sim.read_bit("carryOut").unwrap(), Logic::from(total > 0xff));
    }
}

#[test]
fn test_simulators_agree_on_mux() {
    let mux = mux4(8).unwrap();
    let mut sims: Vec<Box<dyn Simulator>> = [Approach::Levelization, Approach::EventDriven]
        .into_iter()
        .map(|a| create_simulator(&mux, &SimOptions::new(a)).unwrap())
        .collect();

    for (i, (x, y, _)) in vectors(7, 16).into_iter().enumerate() {
        let inputs = InputVector::new()
            .value("d0", x)
            .value("d1", y)
            .value("d2", x ^ y)
            .value("d3", !x & 0xff)
            .value("sel", (i % 4) as u64);
        let outputs: Vec<Vec<Logic>> = sims
            .iter_mut()
            .map(|sim| {
                sim.input(&inputs).unwrap();
                sim.read("q").unwrap()
            })
            .collect();
        assert_eq!(outputs[0], outputs[1]);
    }
}

/// A primitive with no inputs that always drives its output high.
struct One;

impl Behavior for One {
    fn evaluate(&mut self, pins: &mut PinAccess<'_>) -> CircuitResult<()> {
        pins.set_output("q", true)
    }
}

fn gated_source() -> ModuleDef {
    let one = ModuleDef::primitive(
        Signature::builder("one").output("q", 1).build().unwrap(),
        || Box::new(One),
    );
    let and = gate(GateOp::And).unwrap();
    let sig = Signature::builder("gated").input("a", 1).output("q", 1).build().unwrap();
    ModuleDef::compound(sig, move |w| {
        let src = w.instantiate(&one)?;
        let g = w.instantiate(&and)?;
        w.set_input(&g, "a", w.input("a")?)?;
        w.set_input(&g, "b", src.output("q")?)?;
        w.set_output("q", g.output("q")?)
    })
}

#[test]
fn test_simulators_agree_on_constant_source() {
    let gated = gated_source();
    let mut sims: Vec<Box<dyn Simulator>> = [Approach::Levelization, Approach::EventDriven]
        .into_iter()
        .map(|a| create_simulator(&gated, &SimOptions::new(a)).unwrap())
        .collect();

    for (a, expected) in [(true, Logic::One), (false, Logic::Zero), (true, Logic::One)] {
        for sim in sims.iter_mut() {
            sim.input(&InputVector::new().bit("a", a)).unwrap();
            assert_eq!(sim.read_bit("q").unwrap(), expected, "{}", sim.approach());
        }
    }
}

#[test]
fn test_runs_are_deterministic() {
    assert_eq!(run_adder(Approach::EventDriven), run_adder(Approach::EventDriven));

    let stats = |approach| {
        let adder: ModuleDef = ripple_adder(8).unwrap();
        let mut sim = create_simulator(&adder, &SimOptions::new(approach)).unwrap();
        sim.input(&InputVector::new().value("a", 99).value("b", 1).bit("carryIn", false))
            .unwrap();
        sim.export_stats()["activity"].clone()
    };
    let first = stats(Approach::EventDriven);
    let second = stats(Approach::EventDriven);
    assert_eq!(first["events_processed"], second["events_processed"]);
    assert_eq!(first["evaluations"], second["evaluations"]);
}

#[test]
fn test_read_is_idempotent() {
    let adder = ripple_adder(8).unwrap();
    let mut sim = create_simulator(&adder, &SimOptions::new(Approach::EventDriven)).unwrap();
    sim.input(&InputVector::new().value("a", 5).value("b", 6).bit("carryIn", true)).unwrap();

    let evaluations = sim.stats().activity.evaluations;
    let first = sim.read("sum").unwrap();
    let second = sim.read("sum").unwrap();
    assert_eq!(first, second);
    assert_eq!(sim.read_u64("sum").unwrap(), Some(12));
    assert_eq!(sim.stats().activity.evaluations, evaluations);
}

#[test]
fn test_event_simulator_does_less_work_on_small_changes() {
    let adder = ripple_adder(8).unwrap();
    let mut levelized = create_simulator(&adder, &SimOptions::new(Approach::Levelization)).unwrap();
    let mut event = create_simulator(&adder, &SimOptions::new(Approach::EventDriven)).unwrap();

    let base = InputVector::new().value("a", 0).value("b", 0).bit("carryIn", false);
    levelized.input(&base).unwrap();
    event.input(&base).unwrap();
    let before = event.stats().activity.evaluations;

    // flip the top bit of a: only the last stage should react
    let change = InputVector::new().value("a", 0x80);
    levelized.input(&change).unwrap();
    event.input(&change).unwrap();

    assert_eq!(levelized.stats().activity.evaluations, 80);
    assert!(event.stats().activity.evaluations - before < 40);
    assert_eq!(levelized.read("sum").unwrap(), event.read("sum").unwrap());
}
