//! Net resolution: seeing through compound modules.
//!
//! Compound modules only forward signals. These functions follow a net through
//! any number of structural layers to the primitive pin that actually drives
//! it, or to the primitive modules that actually consume it, and build the
//! reduced circuit the simulators run on.

use std::collections::{BTreeMap, BTreeSet};

use crate::circuit::{Circuit, Net};
use crate::error::{CircuitError, CircuitResult};
use crate::module::ModuleNode;
use crate::types::{Direction, ModuleId, NetId};

/// Returns the net that ultimately drives `net`.
///
/// A net owned by a primitive module is its own source, and so is an
/// undriven compound net (a top-level input, typically). A compound net with
/// one driver resolves to that driver's source. More than one driver fails
/// with `MultipleDrivers`; a driver chain that comes back to a net already
/// visited fails with `StructuralLoop`.
pub fn source_net(circuit: &Circuit, net: NetId) -> CircuitResult<NetId> {
    let mut visited = BTreeSet::new();
    let mut current = net;
    loop {
        if circuit.is_primitive_net(current) {
            return Ok(current);
        }
        if !visited.insert(current) {
            return Err(CircuitError::StructuralLoop {
                net: circuit.net_name(current),
            });
        }
        let record = circuit
            .net(current)
            .ok_or(CircuitError::UnknownModule(current.module))?;
        match record.inputs.as_slice() {
            [] => return Ok(current),
            [driver] => current = *driver,
            drivers => {
                return Err(CircuitError::MultipleDrivers {
                    net: circuit.net_name(current),
                    drivers: drivers.len(),
                })
            }
        }
    }
}

/// Returns the primitive input nets that ultimately consume `net`.
///
/// An input pin of a primitive module consumes itself.
pub fn target_primitive_nets(circuit: &Circuit, net: NetId) -> BTreeSet<NetId> {
    let mut targets = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![net];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if circuit.is_primitive_net(current) && is_input(circuit, current) {
            targets.insert(current);
            continue;
        }
        if let Some(record) = circuit.net(current) {
            stack.extend(record.outputs.iter().copied());
        }
    }
    targets
}

/// Returns the primitive modules that ultimately consume `net`.
pub fn target_primitive_mods(circuit: &Circuit, net: NetId) -> BTreeSet<ModuleId> {
    target_primitive_nets(circuit, net)
        .into_iter()
        .map(|n| n.module)
        .collect()
}

fn is_input(circuit: &Circuit, net: NetId) -> bool {
    circuit
        .module(net.module)
        .ok()
        .and_then(|m| m.signature.direction(net.slot))
        == Some(Direction::Input)
}

/// Builds a circuit holding only the primitive modules of `circuit`.
///
/// Every primitive input is rewired straight to its source net, and every
/// primitive output lists the primitive inputs it reaches. The nets of the top
/// module are kept as the circuit boundary. The input circuit is not
/// modified; any resolution error aborts the whole reduction.
pub fn without_compound_modules(circuit: &Circuit) -> CircuitResult<Circuit> {
    let mut modules: BTreeMap<ModuleId, ModuleNode> = BTreeMap::new();
    let mut nets: BTreeMap<NetId, Net> = BTreeMap::new();

    let compound_top = match circuit.top() {
        Some(top) if !circuit.module(top)?.is_primitive() => Some(circuit.module(top)?),
        _ => None,
    };
    if let Some(top) = compound_top {
        for net in top.input_nets().chain(top.output_nets()) {
            nets.insert(net, Net::new(net));
        }
    }

    for node in circuit.modules().filter(|m| m.is_primitive()) {
        let mut flat = node.clone();
        flat.parent = None;
        flat.sub_modules.clear();

        for (slot, net) in node.input_nets().enumerate() {
            let source = match node.pins.inputs[slot].as_slice() {
                [] => None,
                _ => Some(source_net(circuit, net)?),
            };
            flat.pins.inputs[slot] = source.into_iter().collect();
        }
        for (offset, net) in node.output_nets().enumerate() {
            flat.pins.outputs[offset] = target_primitive_nets(circuit, net).into_iter().collect();
        }

        for net in node.input_nets().chain(node.output_nets()) {
            nets.insert(net, Net::new(net));
        }
        modules.insert(node.id, flat);
    }

    // Rebuild adjacency from the resolved pin tables so both sides agree.
    let mut edges: Vec<(NetId, NetId)> = Vec::new();
    for node in modules.values() {
        for (net, sources) in node.input_nets().zip(&node.pins.inputs) {
            edges.extend(sources.iter().map(|&src| (src, net)));
        }
    }
    for (src, dest) in edges {
        nets.entry(src).or_insert_with(|| Net::new(src)).outputs.push(dest);
        nets.entry(dest).or_insert_with(|| Net::new(dest)).inputs.push(src);
    }
    // Boundary outputs are consumers too.
    if let Some(top) = compound_top {
        for net in top.output_nets() {
            let source = source_net(circuit, net)?;
            if source != net {
                nets.entry(source).or_insert_with(|| Net::new(source)).outputs.push(net);
                nets.entry(net).or_insert_with(|| Net::new(net)).inputs.push(source);
            }
        }
    }

    tracing::debug!(
        modules = modules.len(),
        nets = nets.len(),
        removed = circuit.module_count() - modules.len(),
        "flattened circuit"
    );

    Ok(circuit.reduced(modules, nets))
}
