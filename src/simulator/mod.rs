//! Simulator trait, shared core and construction.
//!
//! Both simulators run over the same pieces: the hierarchical circuit (for
//! reading top-level pins), its flattened primitive-only form (for ordering
//! and fan-out), one state store, and one boxed [`Behavior`] per primitive.
//! [`SimCore`] owns those pieces; the simulators differ only in which
//! primitives they evaluate and when.
//!
//! # Example
//!
//! ```
//! use kairo::library::gates::{gate, GateOp};
//! use kairo::pin::Logic;
//! use kairo::simulator::{create_simulator, Approach, InputVector, SimOptions};
//!
//! let and = gate(GateOp::And).unwrap();
//! let mut sim = create_simulator(&and, &SimOptions::new(Approach::EventDriven)).unwrap();
//!
//! sim.input(&InputVector::new().bit("a", true).bit("b", true)).unwrap();
//! assert_eq!(sim.read_bit("q").unwrap(), Logic::One);
//! ```

pub mod event;
pub mod levelized;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};
use crate::flatten::without_compound_modules;
use crate::integrity::check_connections;
use crate::module::{Behavior, ModuleDef, ModuleKind, PinAccess};
use crate::pin::{bin, logic_to_u64, parse_bits, Connection, Logic};
use crate::state::CircuitState;
use crate::stats::SimulationStats;
use crate::types::{Direction, ModuleId, NetId, PinSlot};

pub use event::EventSimulator;
pub use levelized::LevelizedSimulator;

/// Default bound on event-driven convergence rounds per `input` call.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Simulation strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Approach {
    /// Evaluate every primitive once per step in dependency order
    #[default]
    Levelization,
    /// Re-evaluate only primitives whose inputs changed, until settled
    EventDriven,
}

impl Approach {
    /// Returns the configuration name of the approach.
    pub fn name(self) -> &'static str {
        match self {
            Approach::Levelization => "levelization",
            Approach::EventDriven => "event-driven",
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for [`create_simulator`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimOptions {
    /// Which simulator to build
    pub approach: Approach,
    /// Run the connection-integrity checker before simulating
    pub check_connections: bool,
    /// Bound on event-driven convergence rounds; `None` never gives up
    pub max_iterations: Option<usize>,
}

impl SimOptions {
    /// Default options for the given approach.
    pub fn new(approach: Approach) -> Self {
        Self {
            approach,
            ..Self::default()
        }
    }

    /// Rejects option combinations no simulator can run with.
    pub fn validate(&self) -> CircuitResult<()> {
        if self.max_iterations == Some(0) {
            return Err(CircuitError::InvalidOptions(
                "max_iterations must be positive (use None for no bound)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            approach: Approach::default(),
            check_connections: true,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
        }
    }
}

/// A value for one top-level input pin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinValue {
    /// Explicit bits, most-significant first; must match the pin width
    Bits(Vec<bool>),
    /// An unsigned integer; must fit in the pin width
    Unsigned(u64),
}

impl PinValue {
    /// Parses `"0"`, `"1"`, `"0b1010"` or `"8'23"`.
    pub fn parse(text: &str) -> CircuitResult<Self> {
        parse_bits(text).map(PinValue::Bits)
    }

    /// Expands the value to exactly `width` bits for pin `pin` of `module`.
    pub fn to_bits(&self, module: &str, pin: &str, width: usize) -> CircuitResult<Vec<bool>> {
        match self {
            PinValue::Bits(bits) if bits.len() == width => Ok(bits.clone()),
            PinValue::Bits(bits) => Err(CircuitError::PinWidthMismatch {
                module: module.to_string(),
                pin: pin.to_string(),
                expected: width,
                actual: bits.len(),
            }),
            PinValue::Unsigned(value) if width >= 64 || value >> width == 0 => {
                Ok(bin(*value, width))
            }
            PinValue::Unsigned(value) => Err(CircuitError::InvalidPinValue(format!(
                "{value} does not fit the {width}-bit pin `{pin}` of `{module}`"
            ))),
        }
    }
}

/// Values for the top-level inputs, applied together by [`Simulator::input`].
///
/// Pins left out keep whatever value they had.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputVector {
    values: BTreeMap<String, PinValue>,
}

impl InputVector {
    /// Creates an empty input vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single-bit pin.
    pub fn bit(self, pin: impl Into<String>, value: bool) -> Self {
        self.with(pin, PinValue::Bits(vec![value]))
    }

    /// Sets a bus from bits, most-significant first.
    pub fn bus(self, pin: impl Into<String>, bits: impl Into<Vec<bool>>) -> Self {
        self.with(pin, PinValue::Bits(bits.into()))
    }

    /// Sets a pin from an unsigned integer.
    pub fn value(self, pin: impl Into<String>, value: u64) -> Self {
        self.with(pin, PinValue::Unsigned(value))
    }

    /// Sets a pin from text, see [`PinValue::parse`].
    pub fn parse(self, pin: impl Into<String>, text: &str) -> CircuitResult<Self> {
        Ok(self.with(pin, PinValue::parse(text)?))
    }

    /// Sets a pin.
    pub fn with(mut self, pin: impl Into<String>, value: PinValue) -> Self {
        self.values.insert(pin.into(), value);
        self
    }

    /// Sets a pin in place.
    pub fn set(&mut self, pin: impl Into<String>, value: PinValue) {
        self.values.insert(pin.into(), value);
    }

    /// Iterates pins in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PinValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of pins set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no pin is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The circuit, state and behaviors shared by both simulators.
pub struct SimCore {
    circuit: Circuit,
    flat: Circuit,
    pub(crate) state: CircuitState,
    behaviors: BTreeMap<ModuleId, Box<dyn Behavior>>,
    top: ModuleId,
    pub(crate) stats: SimulationStats,
}

impl SimCore {
    /// Instantiates `def` as the top module and prepares it for simulation.
    pub fn build(def: &ModuleDef, options: &SimOptions) -> CircuitResult<Self> {
        let circuit = Circuit::with_top(def)?;
        Self::from_circuit(circuit, options)
    }

    /// Prepares an already built circuit for simulation.
    pub fn from_circuit(circuit: Circuit, options: &SimOptions) -> CircuitResult<Self> {
        options.validate()?;
        let top = circuit.top().ok_or(CircuitError::UnknownModule(0))?;
        if options.check_connections {
            check_connections(&circuit)?;
        }

        let flat = without_compound_modules(&circuit)?;

        let mut state = CircuitState::new(circuit.nets().map(|n| n.id));
        for net in circuit.nets() {
            if let [driver] = net.inputs.as_slice() {
                state.bind(net.id, *driver);
            }
        }

        let mut behaviors = BTreeMap::new();
        for node in flat.modules() {
            if let ModuleKind::Primitive(factory) = &node.kind {
                let mut behavior = (**factory)();
                behavior.init();
                behaviors.insert(node.id, behavior);
            }
        }

        let mut stats = SimulationStats::for_circuit(circuit.module(top)?.name(), options.approach.name());
        stats.structure.primitive_modules = flat.module_count();
        stats.structure.nets = circuit.net_count();

        Ok(Self {
            circuit,
            flat,
            state,
            behaviors,
            top,
            stats,
        })
    }

    /// Returns the hierarchical circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Returns the flattened primitive-only circuit.
    pub fn flat(&self) -> &Circuit {
        &self.flat
    }

    /// Returns the state store.
    pub fn state(&self) -> &CircuitState {
        &self.state
    }

    /// Returns the id of the top module.
    pub fn top(&self) -> ModuleId {
        self.top
    }

    /// Returns the statistics collected so far.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Resolves an input vector to top-level input nets and bit values.
    pub(crate) fn input_bits(&self, inputs: &InputVector) -> CircuitResult<Vec<(NetId, bool)>> {
        let signature = &self.circuit.module(self.top)?.signature;
        let mut bits = Vec::new();
        for (pin, value) in inputs.iter() {
            let slots = signature.require_pin_dir(pin, Direction::Input)?;
            let values = value.to_bits(&signature.name, pin, slots.len())?;
            bits.extend(slots.map(|s| NetId::new(self.top, s)).zip(values));
        }
        Ok(bits)
    }

    /// Evaluates one primitive and returns the outputs it assigned.
    pub(crate) fn evaluate(&mut self, id: ModuleId) -> CircuitResult<Vec<(NetId, bool)>> {
        let node = self.flat.module(id)?;
        let behavior = self
            .behaviors
            .get_mut(&id)
            .ok_or(CircuitError::UnknownModule(id))?;

        let mut outputs = vec![None; node.signature.output_bit_count()];
        {
            let mut pins = PinAccess::new(id, &node.signature, &self.state, &mut outputs);
            behavior.evaluate(&mut pins)?;
        }
        self.stats.activity.evaluations += 1;

        let base = node.signature.input_bit_count();
        Ok(outputs
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (NetId::new(id, (base + i) as PinSlot), v)))
            .collect())
    }

    /// Reads a top-level pin, most-significant bit first.
    pub fn read(&self, pin: &str) -> CircuitResult<Vec<Logic>> {
        let signature = &self.circuit.module(self.top)?.signature;
        let (_, slots) = signature.require_pin(pin)?;
        Ok(slots
            .map(|s| self.state.deref(NetId::new(self.top, s)))
            .collect())
    }
}

impl fmt::Debug for SimCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimCore")
            .field("top", &self.top)
            .field("modules", &self.circuit.module_count())
            .field("primitives", &self.behaviors.len())
            .field("nets", &self.state.len())
            .finish()
    }
}

/// A circuit simulator.
///
/// `input` applies new values to top-level inputs and settles the circuit;
/// the `read` family then inspects any top-level pin. Reads never change
/// state, so reading twice gives the same answer.
pub trait Simulator: Send {
    /// Returns the simulation approach.
    fn approach(&self) -> Approach;

    /// Applies top-level input values and evaluates the circuit.
    fn input(&mut self, inputs: &InputVector) -> CircuitResult<()>;

    /// Returns the shared simulation core.
    fn core(&self) -> &SimCore;

    /// Reads a top-level pin, most-significant bit first.
    fn read(&self, pin: &str) -> CircuitResult<Vec<Logic>> {
        self.core().read(pin)
    }

    /// Reads a single-bit top-level pin.
    fn read_bit(&self, pin: &str) -> CircuitResult<Logic> {
        match self.read(pin)?.as_slice() {
            [bit] => Ok(*bit),
            bits => Err(CircuitError::PinWidthMismatch {
                module: self.circuit().module(self.core().top())?.name().to_string(),
                pin: pin.to_string(),
                expected: bits.len(),
                actual: 1,
            }),
        }
    }

    /// Reads a top-level pin as an unsigned integer, `None` if any bit is unknown.
    fn read_u64(&self, pin: &str) -> CircuitResult<Option<u64>> {
        Ok(logic_to_u64(&self.read(pin)?))
    }

    /// Reads any connection; constants read as themselves.
    fn read_connection(&self, connection: Connection) -> Logic {
        self.state().read_connection(connection)
    }

    /// Returns the state store.
    fn state(&self) -> &CircuitState {
        self.core().state()
    }

    /// Returns the hierarchical circuit.
    fn circuit(&self) -> &Circuit {
        self.core().circuit()
    }

    /// Returns the statistics collected so far.
    fn stats(&self) -> &SimulationStats {
        self.core().stats()
    }

    /// Exports statistics as JSON.
    fn export_stats(&self) -> serde_json::Value {
        serde_json::to_value(self.stats()).unwrap_or(serde_json::Value::Null)
    }
}

/// Builds a simulator for `top`.
pub fn create_simulator(top: &ModuleDef, options: &SimOptions) -> CircuitResult<Box<dyn Simulator>> {
    let core = SimCore::build(top, options)?;
    simulator_for_core(core, options)
}

/// Builds a simulator around an already built circuit.
pub fn create_simulator_for(circuit: Circuit, options: &SimOptions) -> CircuitResult<Box<dyn Simulator>> {
    let core = SimCore::from_circuit(circuit, options)?;
    simulator_for_core(core, options)
}

fn simulator_for_core(core: SimCore, options: &SimOptions) -> CircuitResult<Box<dyn Simulator>> {
    tracing::info!(
        top = %core.stats.metadata.top,
        approach = %options.approach,
        primitives = core.flat.module_count(),
        "creating simulator"
    );
    let simulator: Box<dyn Simulator> = match options.approach {
        Approach::Levelization => Box::new(LevelizedSimulator::from_core(core)?),
        Approach::EventDriven => Box::new(EventSimulator::from_core(core, options.max_iterations)?),
    };
    Ok(simulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::arith::ripple_adder;
    use crate::library::gates::{gate, GateOp};

    #[test]
    fn test_options_default() {
        let options = SimOptions::default();
        assert_eq!(options.approach, Approach::Levelization);
        assert!(options.check_connections);
        assert_eq!(options.max_iterations, Some(DEFAULT_MAX_ITERATIONS));

        let event = SimOptions::new(Approach::EventDriven);
        assert_eq!(event.approach, Approach::EventDriven);
        assert!(event.check_connections);
    }

    #[test]
    fn test_zero_iteration_bound_rejected() {
        let and = gate(GateOp::And).unwrap();
        for approach in [Approach::Levelization, Approach::EventDriven] {
            let options = SimOptions {
                max_iterations: Some(0),
                ..SimOptions::new(approach)
            };
            assert!(matches!(options.validate(), Err(CircuitError::InvalidOptions(_))));
            assert!(matches!(
                create_simulator(&and, &options),
                Err(CircuitError::InvalidOptions(_))
            ));
        }
        assert!(SimOptions { max_iterations: None, ..SimOptions::default() }.validate().is_ok());
    }

    #[test]
    fn test_approach_serde() {
        assert_eq!(serde_json::to_string(&Approach::EventDriven).unwrap(), "\"event-driven\"");
        let parsed: Approach = serde_json::from_str("\"levelization\"").unwrap();
        assert_eq!(parsed, Approach::Levelization);
        assert_eq!(Approach::EventDriven.to_string(), "event-driven");
    }

    #[test]
    fn test_pin_value_widths() {
        assert_eq!(PinValue::Unsigned(5).to_bits("m", "p", 4).unwrap(), bin(5, 4));
        assert!(matches!(
            PinValue::Unsigned(16).to_bits("m", "p", 4),
            Err(CircuitError::InvalidPinValue(_))
        ));
        assert!(matches!(
            PinValue::Bits(vec![true]).to_bits("m", "p", 2),
            Err(CircuitError::PinWidthMismatch { expected: 2, actual: 1, .. })
        ));
        assert_eq!(PinValue::parse("0b10").unwrap(), PinValue::Bits(vec![true, false]));
        assert!(PinValue::parse("x").is_err());
    }

    #[test]
    fn test_input_vector() {
        let inputs = InputVector::new()
            .value("b", 3)
            .bit("a", true)
            .parse("c", "0b01")
            .unwrap();
        assert_eq!(inputs.len(), 3);
        let names: Vec<&str> = inputs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_core_initial_state() {
        let core = SimCore::build(&ripple_adder(4).unwrap(), &SimOptions::default()).unwrap();
        assert_eq!(core.top(), 1);
        assert_eq!(core.flat().module_count(), 20);
        assert_eq!(core.stats().structure.primitive_modules, 20);
        assert!(core.read("sum").unwrap().iter().all(|l| *l == Logic::X));
    }

    #[test]
    fn test_core_rejects_unknown_input_pin() {
        let core = SimCore::build(&gate(GateOp::And).unwrap(), &SimOptions::default()).unwrap();
        let err = core.input_bits(&InputVector::new().bit("q", true)).unwrap_err();
        assert!(matches!(err, CircuitError::UnknownPin { .. }));
        assert!(core.read("nope").is_err());
    }

    #[test]
    fn test_integrity_check_can_be_skipped() {
        let and = gate(GateOp::And).unwrap();
        let sig = crate::signature::Signature::builder("loose")
            .input("a", 1)
            .output("q", 1)
            .build()
            .unwrap();
        let loose = ModuleDef::compound(sig, move |w| {
            let g = w.instantiate(&and)?;
            w.set_input(&g, "a", w.input("a")?)?;
            w.set_output("q", g.output("q")?)
        });

        assert!(matches!(
            SimCore::build(&loose, &SimOptions::default()),
            Err(CircuitError::UnconnectedPin { .. })
        ));

        let options = SimOptions {
            check_connections: false,
            ..SimOptions::default()
        };
        assert!(SimCore::build(&loose, &options).is_ok());
    }
}
