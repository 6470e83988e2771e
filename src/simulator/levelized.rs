//! Levelized simulator.
//!
//! Primitives are sorted into levels with Kahn's algorithm: a primitive sits
//! one level above the deepest primitive driving any of its inputs. Each
//! `input` call evaluates every primitive exactly once, level by level, so
//! combinational logic settles in a single pass. Circuits with combinational
//! feedback have no such order and are rejected.

use std::collections::{BTreeMap, BTreeSet};

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};
use crate::module::ModuleDef;
use crate::simulator::{Approach, InputVector, SimCore, SimOptions, Simulator};
use crate::stats::Timer;
use crate::types::ModuleId;

/// Returns the primitives that drive inputs of `id`, excluding `id` itself.
pub fn dependencies(flat: &Circuit, id: ModuleId) -> CircuitResult<BTreeSet<ModuleId>> {
    let node = flat.module(id)?;
    Ok(node
        .pins
        .inputs
        .iter()
        .flatten()
        .filter(|src| src.module != id && flat.is_primitive_net(**src))
        .map(|src| src.module)
        .collect())
}

/// Groups the primitives of a flattened circuit into evaluation levels.
///
/// Fails with `CircuitHasFeedback` when some primitives can never become
/// ready because they depend on each other.
pub fn compute_levels(flat: &Circuit) -> CircuitResult<Vec<Vec<ModuleId>>> {
    let mut in_degree: BTreeMap<ModuleId, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<ModuleId, Vec<ModuleId>> = BTreeMap::new();

    for node in flat.modules().filter(|m| m.is_primitive()) {
        let deps = dependencies(flat, node.id)?;
        in_degree.insert(node.id, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(node.id);
        }
    }

    let mut ready: Vec<ModuleId> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut levels = Vec::new();
    let mut placed = 0;

    while !ready.is_empty() {
        let mut next = Vec::new();
        for id in &ready {
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }
        placed += ready.len();
        levels.push(ready);
        next.sort_unstable();
        ready = next;
    }

    if placed != in_degree.len() {
        return Err(CircuitError::CircuitHasFeedback {
            remaining: in_degree.len() - placed,
        });
    }
    Ok(levels)
}

/// Evaluates every primitive once per input, in dependency order.
#[derive(Debug)]
pub struct LevelizedSimulator {
    core: SimCore,
    levels: Vec<Vec<ModuleId>>,
}

impl LevelizedSimulator {
    /// Builds a levelized simulator for `top`.
    pub fn new(top: &ModuleDef, options: &SimOptions) -> CircuitResult<Self> {
        Self::from_core(SimCore::build(top, options)?)
    }

    /// Orders the primitives of a prepared core.
    pub fn from_core(mut core: SimCore) -> CircuitResult<Self> {
        let levels = compute_levels(core.flat())?;
        core.stats.structure.levels = Some(levels.len());
        tracing::debug!(
            levels = levels.len(),
            primitives = core.flat().module_count(),
            "levelized circuit"
        );
        Ok(Self { core, levels })
    }

    /// Returns the evaluation levels.
    pub fn levels(&self) -> &[Vec<ModuleId>] {
        &self.levels
    }

    /// Iterates primitives in evaluation order.
    pub fn execution_order(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.levels.iter().flatten().copied()
    }
}

impl Simulator for LevelizedSimulator {
    fn approach(&self) -> Approach {
        Approach::Levelization
    }

    fn input(&mut self, inputs: &InputVector) -> CircuitResult<()> {
        let timer = Timer::start();

        for (net, value) in self.core.input_bits(inputs)? {
            self.core.state.set(net, value);
        }
        for level in &self.levels {
            for &id in level {
                for (net, value) in self.core.evaluate(id)? {
                    self.core.state.set(net, value);
                }
            }
        }

        self.core.stats.activity.inputs_applied += 1;
        self.core.stats.add_wall_time(timer.elapsed_ms());
        Ok(())
    }

    fn core(&self) -> &SimCore {
        &self.core
    }
}
