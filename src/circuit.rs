//! The hierarchical circuit graph.
//!
//! A [`Circuit`] owns every module instance, one [`Net`] per pin bit, the
//! signature registry and the id counter. Compound modules are expanded at
//! instantiation time by running their wiring function against a
//! [`Wiring`] context bound to the new instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{CircuitError, CircuitResult};
use crate::library::power;
use crate::module::{ModuleDef, ModuleKind, ModuleNode};
use crate::pin::{Connection, Signal};
use crate::registry::SignatureRegistry;
use crate::signature::Signature;
use crate::types::{Direction, ModuleId, NetId, PinSlot};

/// Fan-in/fan-out record of one net.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Net {
    /// This net
    pub id: NetId,
    /// Nets feeding this net
    pub inputs: Vec<NetId>,
    /// Nets this net feeds
    pub outputs: Vec<NetId>,
}

impl Net {
    /// Creates an unconnected net record.
    pub fn new(id: NetId) -> Self {
        Self {
            id,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// A circuit: module instances, nets and registered signatures.
#[derive(Clone, Debug, Default)]
pub struct Circuit {
    next_id: ModuleId,
    pub(crate) modules: BTreeMap<ModuleId, ModuleNode>,
    pub(crate) nets: BTreeMap<NetId, Net>,
    pub(crate) signatures: SignatureRegistry,
    pub(crate) power: Option<ModuleId>,
    pub(crate) top: Option<ModuleId>,
}

impl Circuit {
    /// Creates an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a circuit around a top-level module.
    pub fn with_top(def: &ModuleDef) -> CircuitResult<Self> {
        let mut circuit = Self::new();
        circuit.instantiate_top(def)?;
        Ok(circuit)
    }

    fn allocate_id(&mut self) -> ModuleId {
        self.next_id += 1;
        self.next_id
    }

    /// Registers a signature explicitly.
    ///
    /// Fails with `DuplicateModuleName` if the name is already registered.
    pub fn register_signature(&mut self, signature: Signature) -> CircuitResult<Arc<Signature>> {
        let signature = Arc::new(signature);
        self.signatures.register(Arc::clone(&signature))?;
        Ok(signature)
    }

    /// Instantiates the top-level module of the circuit.
    ///
    /// Its inputs are the circuit inputs driven by a simulator.
    pub fn instantiate_top(&mut self, def: &ModuleDef) -> CircuitResult<ModuleHandle> {
        let handle = self.instantiate_in(def, None)?;
        self.top = Some(handle.id);
        Ok(handle)
    }

    /// Instantiates a module with no enclosing compound module.
    pub fn instantiate(&mut self, def: &ModuleDef) -> CircuitResult<ModuleHandle> {
        self.instantiate_in(def, None)
    }

    fn instantiate_in(
        &mut self,
        def: &ModuleDef,
        parent: Option<ModuleId>,
    ) -> CircuitResult<ModuleHandle> {
        self.signatures.ensure(def.signature())?;

        let id = self.allocate_id();
        let signature = Arc::clone(def.signature());
        for slot in 0..signature.slot_count() as PinSlot {
            let net = NetId::new(id, slot);
            self.nets.insert(net, Net::new(net));
        }
        self.modules.insert(id, ModuleNode::new(id, def, parent));
        if let Some(parent) = parent {
            self.module_mut(parent)?.sub_modules.push(id);
        }

        tracing::debug!(
            module = %signature.name,
            id,
            parent = ?parent,
            primitive = def.is_primitive(),
            "instantiated module"
        );

        if let ModuleKind::Compound(wiring) = def.kind() {
            let wiring = Arc::clone(wiring);
            let mut ctx = Wiring {
                circuit: self,
                module: id,
                signature: Arc::clone(&signature),
            };
            (*wiring)(&mut ctx)?;
            self.check_outputs_driven(id)?;
        }

        Ok(ModuleHandle { id, signature })
    }

    fn check_outputs_driven(&self, id: ModuleId) -> CircuitResult<()> {
        let node = self.module(id)?;
        for net in node.output_nets() {
            let driven = self.nets.get(&net).is_some_and(|n| !n.inputs.is_empty());
            if !driven {
                return Err(CircuitError::UnconnectedOutputPin {
                    module: node.name().to_string(),
                    id,
                    pin: self.bit_name(net),
                });
            }
        }
        Ok(())
    }

    /// Returns the `vcc` (true) or `gnd` (false) net, creating the power
    /// module on first use.
    pub fn power_net(&mut self, value: bool) -> CircuitResult<NetId> {
        let id = match self.power {
            Some(id) => id,
            None => {
                let handle = self.instantiate_in(&power::power()?, None)?;
                self.power = Some(handle.id);
                handle.id
            }
        };
        let pin = if value { power::VCC } else { power::GND };
        let signature = &self.module(id)?.signature;
        let slots = signature.require_pin_dir(pin, Direction::Output)?;
        Ok(NetId::new(id, slots.start))
    }

    /// Records a directed edge `source -> dest`.
    ///
    /// Constants are wired to the power module. The edge is appended to both
    /// nets' adjacency and to the owning modules' pin tables.
    pub fn connect(&mut self, dest: NetId, source: Connection) -> CircuitResult<()> {
        let src = match source {
            Connection::Const(value) => self.power_net(value)?,
            Connection::Net(net) => net,
        };
        if !self.nets.contains_key(&src) {
            return Err(CircuitError::UnknownModule(src.module));
        }
        if !self.nets.contains_key(&dest) {
            return Err(CircuitError::UnknownModule(dest.module));
        }

        if let Some(net) = self.nets.get_mut(&src) {
            net.outputs.push(dest);
        }
        if let Some(net) = self.nets.get_mut(&dest) {
            net.inputs.push(src);
        }

        let dest_node = self.module_mut(dest.module)?;
        if dest_node.signature.direction(dest.slot) == Some(Direction::Input) {
            dest_node.record_driver(dest.slot, src);
        }
        let src_node = self.module_mut(src.module)?;
        if src_node.signature.direction(src.slot) == Some(Direction::Output) {
            src_node.record_consumer(src.slot, dest);
        }
        Ok(())
    }

    /// Connects a whole pin of `module` to `value`, bit by bit.
    ///
    /// The signal width must equal the declared pin width exactly.
    pub fn connect_pin(
        &mut self,
        module: ModuleId,
        pin: &str,
        direction: Direction,
        value: Signal,
    ) -> CircuitResult<()> {
        let slots = {
            let signature = &self.module(module)?.signature;
            let slots = signature.require_pin_dir(pin, direction)?;
            if slots.len() != value.width() {
                return Err(CircuitError::PinWidthMismatch {
                    module: signature.name.clone(),
                    pin: pin.to_string(),
                    expected: slots.len(),
                    actual: value.width(),
                });
            }
            slots
        };
        for (slot, connection) in slots.zip(value.iter()) {
            self.connect(NetId::new(module, slot), *connection)?;
        }
        Ok(())
    }

    /// Returns a module instance.
    pub fn module(&self, id: ModuleId) -> CircuitResult<&ModuleNode> {
        self.modules.get(&id).ok_or(CircuitError::UnknownModule(id))
    }

    fn module_mut(&mut self, id: ModuleId) -> CircuitResult<&mut ModuleNode> {
        self.modules.get_mut(&id).ok_or(CircuitError::UnknownModule(id))
    }

    /// Iterates module instances in id order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.modules.values()
    }

    /// Returns a net record.
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(&id)
    }

    /// Iterates net records in id order.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.values()
    }

    /// Returns the signature registry.
    pub fn signatures(&self) -> &SignatureRegistry {
        &self.signatures
    }

    /// Returns the id of the top-level module.
    pub fn top(&self) -> Option<ModuleId> {
        self.top
    }

    /// Returns the id of the power module, if it was created.
    pub fn power(&self) -> Option<ModuleId> {
        self.power
    }

    /// Returns the direct hierarchical children of a module.
    pub fn children(&self, id: ModuleId) -> CircuitResult<&[ModuleId]> {
        Ok(&self.module(id)?.sub_modules)
    }

    /// Returns the number of module instances.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Returns the number of primitive module instances.
    pub fn primitive_count(&self) -> usize {
        self.modules.values().filter(|m| m.is_primitive()).count()
    }

    /// Returns the number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns true if the net belongs to a primitive module.
    pub fn is_primitive_net(&self, net: NetId) -> bool {
        self.modules
            .get(&net.module)
            .is_some_and(ModuleNode::is_primitive)
    }

    fn bit_name(&self, net: NetId) -> String {
        self.modules
            .get(&net.module)
            .and_then(|m| m.signature.bit_name(net.slot))
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", net.slot))
    }

    /// Renders a net as `"<bitPinName>:<moduleId>"`.
    pub fn net_name(&self, net: NetId) -> String {
        format!("{}:{}", self.bit_name(net), net.module)
    }

    /// Builds a circuit sharing this one's registry and bookkeeping but holding
    /// only the given modules and nets.
    pub(crate) fn reduced(
        &self,
        modules: BTreeMap<ModuleId, ModuleNode>,
        nets: BTreeMap<NetId, Net>,
    ) -> Circuit {
        Circuit {
            next_id: self.next_id,
            modules,
            nets,
            signatures: self.signatures.clone(),
            power: self.power,
            top: self.top,
        }
    }

    /// Takes a serializable snapshot of the graph for exporters.
    pub fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot {
            top: self.top,
            power: self.power,
            signatures: self.signatures.iter().map(|s| s.as_ref().clone()).collect(),
            modules: self
                .modules
                .values()
                .map(|m| ModuleSnapshot {
                    id: m.id,
                    name: m.name().to_string(),
                    primitive: m.is_primitive(),
                    parent: m.parent,
                    sub_modules: m.sub_modules.clone(),
                })
                .collect(),
            nets: self.nets.values().cloned().collect(),
        }
    }
}

/// Handle to an instantiated module, used to reach its pins while wiring.
#[derive(Clone, Debug)]
pub struct ModuleHandle {
    id: ModuleId,
    signature: Arc<Signature>,
}

impl ModuleHandle {
    /// Returns the instance id.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Returns the module type name.
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    fn pin_signal(&self, pin: &str, direction: Direction) -> CircuitResult<Signal> {
        let slots = self.signature.require_pin_dir(pin, direction)?;
        Ok(Signal::new(
            slots
                .map(|s| Connection::Net(NetId::new(self.id, s)))
                .collect(),
        ))
    }

    /// Returns an output pin as a signal, most-significant bit first.
    pub fn output(&self, pin: &str) -> CircuitResult<Signal> {
        self.pin_signal(pin, Direction::Output)
    }

    /// Returns an input pin as a signal, most-significant bit first.
    pub fn input(&self, pin: &str) -> CircuitResult<Signal> {
        self.pin_signal(pin, Direction::Input)
    }

    /// Returns the net of an expanded bit name such as `"sum0"`.
    pub fn net(&self, bit_name: &str) -> CircuitResult<NetId> {
        self.signature
            .slot_of_bit(bit_name)
            .map(|slot| NetId::new(self.id, slot))
            .ok_or_else(|| CircuitError::UnknownPin {
                module: self.signature.name.clone(),
                pin: bit_name.to_string(),
            })
    }
}

/// Wiring context handed to a compound module's wiring function.
///
/// Inside the context the compound's own inputs act as sources and its own
/// outputs as sinks.
///
/// # Example
///
/// ```
/// use kairo::circuit::Circuit;
/// use kairo::library::gates::{gate, GateOp};
/// use kairo::module::ModuleDef;
/// use kairo::signature::Signature;
///
/// let nand = gate(GateOp::Nand).unwrap();
/// let sig = Signature::builder("inverter").input("a", 1).output("q", 1).build().unwrap();
/// let inverter = ModuleDef::compound(sig, move |w| {
///     let g = w.instantiate(&nand)?;
///     let a = w.input("a")?;
///     w.set_input(&g, "a", a.clone())?;
///     w.set_input(&g, "b", a)?;
///     w.set_output("q", g.output("q")?)
/// });
///
/// let circuit = Circuit::with_top(&inverter).unwrap();
/// assert_eq!(circuit.module_count(), 2);
/// ```
pub struct Wiring<'c> {
    circuit: &'c mut Circuit,
    module: ModuleId,
    signature: Arc<Signature>,
}

impl<'c> Wiring<'c> {
    /// Returns the id of the compound module being wired.
    pub fn id(&self) -> ModuleId {
        self.module
    }

    /// Returns the signature of the compound module being wired.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the circuit built so far.
    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    /// Returns one of the compound's own inputs as a source signal.
    pub fn input(&self, pin: &str) -> CircuitResult<Signal> {
        let slots = self.signature.require_pin_dir(pin, Direction::Input)?;
        Ok(Signal::new(
            slots
                .map(|s| Connection::Net(NetId::new(self.module, s)))
                .collect(),
        ))
    }

    /// Instantiates a sub-module of the compound.
    pub fn instantiate(&mut self, def: &ModuleDef) -> CircuitResult<ModuleHandle> {
        self.circuit.instantiate_in(def, Some(self.module))
    }

    /// Drives an input pin of a sub-module.
    pub fn set_input(
        &mut self,
        sub: &ModuleHandle,
        pin: &str,
        value: impl Into<Signal>,
    ) -> CircuitResult<()> {
        let parent = self.circuit.module(sub.id)?.parent;
        if parent != Some(self.module) {
            return Err(CircuitError::InvalidPinValue(format!(
                "module {} ({}) is not a sub-module of {} ({})",
                sub.name(),
                sub.id,
                self.signature.name,
                self.module
            )));
        }
        self.circuit
            .connect_pin(sub.id, pin, Direction::Input, value.into())
    }

    /// Drives one of the compound's own outputs.
    pub fn set_output(&mut self, pin: &str, value: impl Into<Signal>) -> CircuitResult<()> {
        self.circuit
            .connect_pin(self.module, pin, Direction::Output, value.into())
    }
}

/// Serializable view of a module instance.
#[derive(Clone, Debug, Serialize)]
pub struct ModuleSnapshot {
    pub id: ModuleId,
    pub name: String,
    pub primitive: bool,
    pub parent: Option<ModuleId>,
    pub sub_modules: Vec<ModuleId>,
}

/// Serializable view of a whole circuit, for external exporters.
#[derive(Clone, Debug, Serialize)]
pub struct CircuitSnapshot {
    pub top: Option<ModuleId>,
    pub power: Option<ModuleId>,
    pub signatures: Vec<Signature>,
    pub modules: Vec<ModuleSnapshot>,
    pub nets: Vec<Net>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::gates::{gate, GateOp};

    fn pass_through(name: &str, inner: ModuleDef) -> ModuleDef {
        let sig = Signature::builder(name)
            .input("a", 1)
            .input("b", 1)
            .output("q", 1)
            .build()
            .unwrap();
        ModuleDef::compound(sig, move |w| {
            let g = w.instantiate(&inner)?;
            w.set_input(&g, "a", w.input("a")?)?;
            w.set_input(&g, "b", w.input("b")?)?;
            w.set_output("q", g.output("q")?)
        })
    }

    #[test]
    fn test_ids_are_sequential_from_one() {
        let mut circuit = Circuit::new();
        let and = gate(GateOp::And).unwrap();
        let first = circuit.instantiate(&and).unwrap();
        let second = circuit.instantiate(&and).unwrap();
        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert_eq!(circuit.net_count(), 6);
    }

    #[test]
    fn test_compound_records_hierarchy_and_nets() {
        let wrapper = pass_through("wrapped_and", gate(GateOp::And).unwrap());
        let circuit = Circuit::with_top(&wrapper).unwrap();

        assert_eq!(circuit.top(), Some(1));
        assert_eq!(circuit.children(1).unwrap(), &[2]);
        assert_eq!(circuit.module(2).unwrap().parent, Some(1));

        let top_a = NetId::new(1, 0);
        let gate_a = NetId::new(2, 0);
        assert_eq!(circuit.net(top_a).unwrap().outputs, vec![gate_a]);
        assert_eq!(circuit.net(gate_a).unwrap().inputs, vec![top_a]);
        assert_eq!(circuit.module(2).unwrap().drivers_of("a").unwrap(), &[top_a]);

        let gate_q = NetId::new(2, 2);
        let top_q = NetId::new(1, 2);
        assert_eq!(circuit.module(2).unwrap().consumers_of("q").unwrap(), &[top_q]);
        assert_eq!(circuit.net(top_q).unwrap().inputs, vec![gate_q]);
        assert_eq!(circuit.net_name(gate_q), "q:2");
    }

    #[test]
    fn test_constants_wire_to_single_power_module() {
        let and = gate(GateOp::And).unwrap();
        let sig = Signature::builder("tied")
            .output("q", 1)
            .output("r", 1)
            .build()
            .unwrap();
        let tied = ModuleDef::compound(sig, move |w| {
            let g = w.instantiate(&and)?;
            w.set_input(&g, "a", true)?;
            w.set_input(&g, "b", false)?;
            w.set_output("q", g.output("q")?)?;
            w.set_output("r", true)
        });

        let circuit = Circuit::with_top(&tied).unwrap();
        let power = circuit.power().unwrap();
        assert_eq!(circuit.module(power).unwrap().name(), "power");
        assert_eq!(
            circuit.modules().filter(|m| m.name() == "power").count(),
            1
        );
        assert_eq!(circuit.module(power).unwrap().parent, None);
        let vcc = circuit.module(power).unwrap().consumers_of("vcc").unwrap();
        assert_eq!(vcc.len(), 2);
    }

    #[test]
    fn test_width_mismatch() {
        let and = gate(GateOp::And).unwrap();
        let sig = Signature::builder("bad").output("q", 1).build().unwrap();
        let bad = ModuleDef::compound(sig, move |w| {
            let g = w.instantiate(&and)?;
            w.set_input(&g, "a", Signal::constant(1, 2))?;
            w.set_input(&g, "b", true)?;
            w.set_output("q", g.output("q")?)
        });

        let err = Circuit::with_top(&bad).unwrap_err();
        assert_eq!(
            err,
            CircuitError::PinWidthMismatch {
                module: "and".to_string(),
                pin: "a".to_string(),
                expected: 1,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_unconnected_output() {
        let sig = Signature::builder("empty")
            .input("a", 1)
            .output("q", 2)
            .build()
            .unwrap();
        let empty = ModuleDef::compound(sig, |w| {
            let a = w.input("a")?;
            w.set_output("q", Signal::concat([a, Signal::from(false)]))
        });
        assert!(Circuit::with_top(&empty).is_ok());

        let sig = Signature::builder("dangling")
            .input("a", 1)
            .output("q", 1)
            .build()
            .unwrap();
        let dangling = ModuleDef::compound(sig, |_| Ok(()));
        let err = Circuit::with_top(&dangling).unwrap_err();
        assert!(matches!(err, CircuitError::UnconnectedOutputPin { ref pin, .. } if pin == "q"));
    }

    #[test]
    fn test_conflicting_definitions_share_a_name() {
        let one = gate(GateOp::And).unwrap();
        let sig = Signature::builder("and").input("a", 2).output("q", 1).build().unwrap();
        let other = ModuleDef::compound(sig, |w| w.set_output("q", false));

        let mut circuit = Circuit::new();
        circuit.instantiate(&one).unwrap();
        let err = circuit.instantiate(&other).unwrap_err();
        assert_eq!(err, CircuitError::DuplicateModuleName("and".to_string()));
    }

    #[test]
    fn test_register_signature_twice() {
        let mut circuit = Circuit::new();
        let sig = || Signature::builder("x").input("a", 1).build().unwrap();
        circuit.register_signature(sig()).unwrap();
        assert!(matches!(
            circuit.register_signature(sig()),
            Err(CircuitError::DuplicateModuleName(_))
        ));
    }

    #[test]
    fn test_set_input_on_foreign_module() {
        let and = gate(GateOp::And).unwrap();
        let inner = pass_through("inner", and.clone());
        let sig = Signature::builder("outer").output("q", 1).build().unwrap();
        let outer = ModuleDef::compound(sig, move |w| {
            let wrapper = w.instantiate(&inner)?;
            let grandchild = w.circuit().children(wrapper.id())?[0];
            let handle = ModuleHandle {
                id: grandchild,
                signature: Arc::clone(and.signature()),
            };
            w.set_input(&handle, "a", true)?;
            w.set_output("q", false)
        });

        let err = Circuit::with_top(&outer).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidPinValue(_)));
    }

    #[test]
    fn test_snapshot_serializes() {
        let wrapper = pass_through("wrapped_or", gate(GateOp::Or).unwrap());
        let circuit = Circuit::with_top(&wrapper).unwrap();
        let json = serde_json::to_value(circuit.snapshot()).unwrap();

        assert_eq!(json["top"], 1);
        assert_eq!(json["modules"].as_array().unwrap().len(), 2);
        assert_eq!(json["modules"][1]["name"], "or");
        assert_eq!(json["signatures"].as_array().unwrap().len(), 2);
    }
}
