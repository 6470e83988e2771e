//! Module definitions, instances and the `Behavior` trait.
//!
//! A module is either *primitive* (a leaf with a [`Behavior`]) or *compound*
//! (defined entirely by a wiring function that instantiates and connects
//! sub-modules). The distinction is an explicit [`ModuleKind`] rather than
//! something inferred from the definition's shape.

use std::fmt;
use std::sync::Arc;

use crate::circuit::Wiring;
use crate::error::{CircuitError, CircuitResult};
use crate::pin::{bin, to_u64, Logic};
use crate::signature::Signature;
use crate::state::CircuitState;
use crate::types::{Direction, ModuleId, NetId, PinSlot};

/// Simulation behavior of a primitive module instance.
///
/// One boxed behavior is created per instance when a simulator is built, so
/// implementations may keep private state (a register's stored bits, the
/// previous clock level for edge detection).
pub trait Behavior: Send {
    /// Reset internal state. Called once before the first evaluation.
    fn init(&mut self) {}

    /// Compute outputs from the current inputs.
    ///
    /// Outputs that are not assigned keep their previous value.
    fn evaluate(&mut self, pins: &mut PinAccess<'_>) -> CircuitResult<()>;
}

/// Factory creating a fresh behavior for every primitive instance.
pub type BehaviorFactory = Arc<dyn Fn() -> Box<dyn Behavior> + Send + Sync>;

/// Wiring function of a compound module.
pub type WiringFn = Arc<dyn Fn(&mut Wiring<'_>) -> CircuitResult<()> + Send + Sync>;

/// Primitive or compound.
#[derive(Clone)]
pub enum ModuleKind {
    /// A leaf with simulation behavior
    Primitive(BehaviorFactory),
    /// A structural module built from sub-modules
    Compound(WiringFn),
}

impl ModuleKind {
    /// Returns true for [`ModuleKind::Primitive`].
    pub fn is_primitive(&self) -> bool {
        matches!(self, ModuleKind::Primitive(_))
    }
}

impl fmt::Debug for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Primitive(_) => f.write_str("Primitive"),
            ModuleKind::Compound(_) => f.write_str("Compound"),
        }
    }
}

/// A module definition: the only way new structure enters a circuit.
///
/// Cheap to clone; compound wiring functions usually capture the definitions
/// of their sub-modules.
#[derive(Clone, Debug)]
pub struct ModuleDef {
    signature: Arc<Signature>,
    kind: ModuleKind,
}

impl ModuleDef {
    /// Defines a primitive module.
    ///
    /// # Example
    ///
    /// ```
    /// use kairo::module::{Behavior, ModuleDef, PinAccess};
    /// use kairo::signature::Signature;
    /// use kairo::CircuitResult;
    ///
    /// struct Inverter;
    ///
    /// impl Behavior for Inverter {
    ///     fn evaluate(&mut self, pins: &mut PinAccess<'_>) -> CircuitResult<()> {
    ///         let a = pins.input("a")?;
    ///         pins.set_output("q", !a)
    ///     }
    /// }
    ///
    /// let sig = Signature::builder("inv").input("a", 1).output("q", 1).build().unwrap();
    /// let inv = ModuleDef::primitive(sig, || Box::new(Inverter));
    /// assert!(inv.is_primitive());
    /// ```
    pub fn primitive<F>(signature: Signature, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Behavior> + Send + Sync + 'static,
    {
        Self {
            signature: Arc::new(signature),
            kind: ModuleKind::Primitive(Arc::new(factory)),
        }
    }

    /// Defines a compound module from a wiring function.
    pub fn compound<F>(signature: Signature, wiring: F) -> Self
    where
        F: Fn(&mut Wiring<'_>) -> CircuitResult<()> + Send + Sync + 'static,
    {
        Self {
            signature: Arc::new(signature),
            kind: ModuleKind::Compound(Arc::new(wiring)),
        }
    }

    /// Returns the module type name.
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Arc<Signature> {
        &self.signature
    }

    /// Returns the module kind.
    pub fn kind(&self) -> &ModuleKind {
        &self.kind
    }

    /// Returns true if the module has simulation behavior.
    pub fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }
}

/// Per-bit connection lists of one module instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PinTable {
    /// Drivers recorded for each input bit (index = input slot)
    pub inputs: Vec<Vec<NetId>>,
    /// Consumers recorded for each output bit (index = slot - input bits)
    pub outputs: Vec<Vec<NetId>>,
}

impl PinTable {
    fn for_signature(signature: &Signature) -> Self {
        Self {
            inputs: vec![Vec::new(); signature.input_bit_count()],
            outputs: vec![Vec::new(); signature.output_bit_count()],
        }
    }
}

/// An instantiated module.
#[derive(Clone, Debug)]
pub struct ModuleNode {
    /// Unique identifier within the circuit
    pub id: ModuleId,
    /// Shared signature of the module type
    pub signature: Arc<Signature>,
    /// Primitive behavior factory or compound wiring
    pub kind: ModuleKind,
    /// Enclosing compound module, if any
    pub parent: Option<ModuleId>,
    /// Direct hierarchical children, in instantiation order
    pub sub_modules: Vec<ModuleId>,
    /// Recorded connections per bit
    pub pins: PinTable,
}

impl ModuleNode {
    pub(crate) fn new(id: ModuleId, def: &ModuleDef, parent: Option<ModuleId>) -> Self {
        Self {
            id,
            signature: Arc::clone(&def.signature),
            kind: def.kind.clone(),
            parent,
            sub_modules: Vec::new(),
            pins: PinTable::for_signature(&def.signature),
        }
    }

    /// Returns the module type name.
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Returns true if the module has simulation behavior.
    pub fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }

    /// Returns the net of the given slot.
    pub fn net(&self, slot: PinSlot) -> NetId {
        NetId::new(self.id, slot)
    }

    /// Iterates the nets of all input bits.
    pub fn input_nets(&self) -> impl Iterator<Item = NetId> + '_ {
        self.signature.input_slots().map(move |s| NetId::new(self.id, s))
    }

    /// Iterates the nets of all output bits.
    pub fn output_nets(&self) -> impl Iterator<Item = NetId> + '_ {
        self.signature.output_slots().map(move |s| NetId::new(self.id, s))
    }

    /// Returns the drivers recorded for an input bit by name.
    pub fn drivers_of(&self, bit_name: &str) -> Option<&[NetId]> {
        let slot = self.signature.slot_of_bit(bit_name)? as usize;
        self.pins.inputs.get(slot).map(Vec::as_slice)
    }

    /// Returns the consumers recorded for an output bit by name.
    pub fn consumers_of(&self, bit_name: &str) -> Option<&[NetId]> {
        let slot = self.signature.slot_of_bit(bit_name)? as usize;
        let offset = slot.checked_sub(self.signature.input_bit_count())?;
        self.pins.outputs.get(offset).map(Vec::as_slice)
    }

    pub(crate) fn record_driver(&mut self, slot: PinSlot, driver: NetId) {
        if let Some(list) = self.pins.inputs.get_mut(slot as usize) {
            list.push(driver);
        }
    }

    pub(crate) fn record_consumer(&mut self, slot: PinSlot, consumer: NetId) {
        let offset = (slot as usize).wrapping_sub(self.signature.input_bit_count());
        if let Some(list) = self.pins.outputs.get_mut(offset) {
            list.push(consumer);
        }
    }
}

/// Typed pin access handed to a [`Behavior`] during evaluation.
///
/// Inputs are read through the state store (following aliases to the driving
/// net); outputs are collected into a buffer the simulator applies afterwards.
/// An input that was never driven reads as `false`; use
/// [`PinAccess::input_logic`] to distinguish it.
pub struct PinAccess<'a> {
    id: ModuleId,
    signature: &'a Signature,
    state: &'a CircuitState,
    outputs: &'a mut [Option<bool>],
}

impl<'a> PinAccess<'a> {
    pub(crate) fn new(
        id: ModuleId,
        signature: &'a Signature,
        state: &'a CircuitState,
        outputs: &'a mut [Option<bool>],
    ) -> Self {
        Self {
            id,
            signature,
            state,
            outputs,
        }
    }

    /// Returns the id of the module being evaluated.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Returns the signature of the module being evaluated.
    pub fn signature(&self) -> &Signature {
        self.signature
    }

    fn single_bit(&self, name: &str, direction: Direction) -> CircuitResult<PinSlot> {
        let slots = self.signature.require_pin_dir(name, direction)?;
        if slots.len() != 1 {
            return Err(CircuitError::PinWidthMismatch {
                module: self.signature.name.clone(),
                pin: name.to_string(),
                expected: slots.len(),
                actual: 1,
            });
        }
        Ok(slots.start)
    }

    /// Reads a single-bit input as a logic level.
    pub fn input_logic(&self, name: &str) -> CircuitResult<Logic> {
        let slot = self.single_bit(name, Direction::Input)?;
        Ok(self.state.deref(NetId::new(self.id, slot)))
    }

    /// Reads a single-bit input.
    pub fn input(&self, name: &str) -> CircuitResult<bool> {
        Ok(self.input_logic(name)? == Logic::One)
    }

    /// Reads an input bus, most-significant bit first.
    pub fn input_bus(&self, name: &str) -> CircuitResult<Vec<bool>> {
        let slots = self.signature.require_pin_dir(name, Direction::Input)?;
        Ok(slots
            .map(|s| self.state.deref(NetId::new(self.id, s)) == Logic::One)
            .collect())
    }

    /// Reads an input bus as an unsigned integer.
    pub fn input_value(&self, name: &str) -> CircuitResult<u64> {
        Ok(to_u64(&self.input_bus(name)?))
    }

    /// Assigns a single-bit output.
    pub fn set_output(&mut self, name: &str, value: bool) -> CircuitResult<()> {
        let slot = self.single_bit(name, Direction::Output)?;
        let offset = slot as usize - self.signature.input_bit_count();
        self.outputs[offset] = Some(value);
        Ok(())
    }

    /// Assigns an output bus, most-significant bit first.
    pub fn set_output_bus(&mut self, name: &str, bits: &[bool]) -> CircuitResult<()> {
        let slots = self.signature.require_pin_dir(name, Direction::Output)?;
        if slots.len() != bits.len() {
            return Err(CircuitError::PinWidthMismatch {
                module: self.signature.name.clone(),
                pin: name.to_string(),
                expected: slots.len(),
                actual: bits.len(),
            });
        }
        let base = self.signature.input_bit_count();
        for (slot, &bit) in slots.zip(bits) {
            self.outputs[slot as usize - base] = Some(bit);
        }
        Ok(())
    }

    /// Assigns an output bus from an unsigned integer (truncated to the pin width).
    pub fn set_output_value(&mut self, name: &str, value: u64) -> CircuitResult<()> {
        let (_, slots) = self.signature.require_pin(name)?;
        self.set_output_bus(name, &bin(value, slots.len()))
    }
}
