//! Event-driven simulator.
//!
//! Two FIFO queues drive evaluation: net value changes (events) and modules
//! waiting to be evaluated (gates). A round drains all pending events, writing
//! each value and queueing the primitives that read the net, then drains the
//! gate queue, turning every output that changed (or was never driven) into a
//! new event. Rounds repeat until both queues are empty, so feedback loops
//! such as latches settle naturally. Circuits that never settle hit the
//! convergence bound instead of spinning forever.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{CircuitError, CircuitResult};
use crate::module::ModuleDef;
use crate::simulator::{Approach, InputVector, SimCore, SimOptions, Simulator};
use crate::stats::Timer;
use crate::types::{ModuleId, NetId};

/// Re-evaluates only the primitives whose inputs changed.
#[derive(Debug)]
pub struct EventSimulator {
    core: SimCore,
    fanout: BTreeMap<NetId, Vec<ModuleId>>,
    events: VecDeque<(NetId, bool)>,
    gates: VecDeque<ModuleId>,
    queued: BTreeSet<ModuleId>,
    max_iterations: Option<usize>,
}

impl EventSimulator {
    /// Builds an event-driven simulator for `top`.
    pub fn new(top: &ModuleDef, options: &SimOptions) -> CircuitResult<Self> {
        Self::from_core(SimCore::build(top, options)?, options.max_iterations)
    }

    /// Builds the fan-out table of a prepared core and seeds the constant sources.
    ///
    /// Primitives without input bits (the power rails and any user-defined
    /// source) are evaluated once here. Their outputs are written straight
    /// away, so constants read correctly before the first input, and their
    /// readers wait in the gate queue for the first [`Simulator::input`].
    pub fn from_core(mut core: SimCore, max_iterations: Option<usize>) -> CircuitResult<Self> {
        if max_iterations == Some(0) {
            return Err(CircuitError::InvalidOptions(
                "max_iterations must be positive (use None for no bound)".to_string(),
            ));
        }

        let mut fanout: BTreeMap<NetId, BTreeSet<ModuleId>> = BTreeMap::new();
        for node in core.flat().modules() {
            for (net, sources) in node.input_nets().zip(&node.pins.inputs) {
                // an undriven primitive input is its own source
                let source = sources.first().copied().unwrap_or(net);
                fanout.entry(source).or_default().insert(node.id);
            }
        }
        let fanout: BTreeMap<NetId, Vec<ModuleId>> = fanout
            .into_iter()
            .map(|(net, mods)| (net, mods.into_iter().collect()))
            .collect();

        let sources: Vec<ModuleId> = core
            .flat()
            .modules()
            .filter(|node| node.signature.input_bit_count() == 0)
            .map(|node| node.id)
            .collect();

        let mut gates = VecDeque::new();
        let mut queued = BTreeSet::new();
        for id in sources {
            for (net, value) in core.evaluate(id)? {
                core.state.set(net, value);
                for &reader in fanout.get(&net).map(Vec::as_slice).unwrap_or(&[]) {
                    if queued.insert(reader) {
                        gates.push_back(reader);
                    }
                }
            }
        }
        tracing::debug!(pending = gates.len(), "seeded constant sources");

        Ok(Self {
            core,
            fanout,
            events: VecDeque::new(),
            gates,
            queued,
            max_iterations,
        })
    }

    /// Returns the primitives reading `net`.
    pub fn fanout(&self, net: NetId) -> &[ModuleId] {
        self.fanout.get(&net).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of events waiting to be processed.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Returns the number of primitives waiting to be evaluated.
    pub fn pending_gates(&self) -> usize {
        self.gates.len()
    }

    fn clear_queues(&mut self) {
        self.events.clear();
        self.gates.clear();
        self.queued.clear();
    }

    fn push_if_changed(&mut self, net: NetId, value: bool) {
        if self.core.state.value(net) != Some((value, true)) {
            self.events.push_back((net, value));
        }
    }

    /// Runs rounds until both queues are empty or the bound is hit.
    fn converge(&mut self) -> CircuitResult<()> {
        let mut rounds = 0;

        while !self.events.is_empty() || !self.gates.is_empty() {
            if self.max_iterations.is_some_and(|max| rounds >= max) {
                tracing::warn!(rounds, pending = self.events.len(), "circuit did not settle");
                self.core.stats.activity.convergence_rounds += rounds as u64;
                self.core.stats.activity.non_convergence += 1;
                return Err(CircuitError::NonConvergence { rounds });
            }
            rounds += 1;

            let activity = &mut self.core.stats.activity;
            activity.peak_event_queue = activity.peak_event_queue.max(self.events.len());

            while let Some((net, value)) = self.events.pop_front() {
                self.core.state.set(net, value);
                self.core.stats.activity.events_processed += 1;
                tracing::trace!(%net, value, "event");

                if let Some(consumers) = self.fanout.get(&net) {
                    for &id in consumers {
                        if self.queued.insert(id) {
                            self.gates.push_back(id);
                        }
                    }
                }
            }

            let activity = &mut self.core.stats.activity;
            activity.peak_gate_queue = activity.peak_gate_queue.max(self.gates.len());

            while let Some(id) = self.gates.pop_front() {
                for (net, value) in self.core.evaluate(id)? {
                    let before = self.events.len();
                    self.push_if_changed(net, value);
                    self.core.stats.activity.events_generated += (self.events.len() - before) as u64;
                }
            }
            self.queued.clear();
        }

        self.core.stats.activity.convergence_rounds += rounds as u64;
        Ok(())
    }
}

impl Simulator for EventSimulator {
    fn approach(&self) -> Approach {
        Approach::EventDriven
    }

    fn input(&mut self, inputs: &InputVector) -> CircuitResult<()> {
        let timer = Timer::start();

        for (net, value) in self.core.input_bits(inputs)? {
            self.push_if_changed(net, value);
        }
        if let Err(err) = self.converge() {
            self.clear_queues();
            return Err(err);
        }

        self.core.stats.activity.inputs_applied += 1;
        self.core.stats.add_wall_time(timer.elapsed_ms());
        Ok(())
    }

    fn core(&self) -> &SimCore {
        &self.core
    }
}
