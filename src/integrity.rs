//! Connection-integrity checking.
//!
//! Before simulation every pin that something must drive is required to have
//! exactly one driver: the input bits of every module except the top-level
//! module (whose inputs the simulator drives) and the output bits of every
//! compound module. Primitive outputs are driven by their behavior and may be
//! left unconsumed.

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};
use crate::module::ModuleNode;
use crate::types::{NetId, PinSlot};

/// Checks every module of `circuit`, reporting the violation of the lowest
/// module id.
pub fn check_connections(circuit: &Circuit) -> CircuitResult<()> {
    let modules: Vec<&ModuleNode> = circuit.modules().collect();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let first = modules
            .par_iter()
            .filter_map(|m| check_module(circuit, m).err().map(|e| (m.id, e)))
            .min_by_key(|(id, _)| *id);
        if let Some((_, err)) = first {
            return Err(err);
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        for node in modules {
            check_module(circuit, node)?;
        }
    }

    tracing::debug!(modules = circuit.module_count(), "connections verified");
    Ok(())
}

/// Checks the pins of a single module.
pub fn check_module(circuit: &Circuit, node: &ModuleNode) -> CircuitResult<()> {
    if circuit.top() != Some(node.id) {
        for (slot, drivers) in node.pins.inputs.iter().enumerate() {
            expect_single_driver(circuit, node, NetId::new(node.id, slot as PinSlot), drivers.len())?;
        }
    }

    if !node.is_primitive() {
        for net in node.output_nets() {
            let drivers = circuit.net(net).map_or(0, |n| n.inputs.len());
            expect_single_driver(circuit, node, net, drivers)?;
        }
    }
    Ok(())
}

fn expect_single_driver(
    circuit: &Circuit,
    node: &ModuleNode,
    net: NetId,
    drivers: usize,
) -> CircuitResult<()> {
    match drivers {
        1 => Ok(()),
        0 => Err(CircuitError::UnconnectedPin {
            module: node.name().to_string(),
            id: node.id,
            pin: node
                .signature
                .bit_name(net.slot)
                .unwrap_or_default()
                .to_string(),
        }),
        n => Err(CircuitError::MultipleDrivers {
            net: circuit.net_name(net),
            drivers: n,
        }),
    }
}
