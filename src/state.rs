//! The state store: one cell per net.
//!
//! A cell either holds a concrete value or aliases another net. Aliases let a
//! wired pin share its driver's value without copying it on every step; the
//! simulators only ever write the `Const` cells of primitive outputs and
//! top-level inputs.

use std::collections::HashMap;

use crate::pin::{Connection, Logic};
use crate::types::NetId;

/// A state cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    /// A concrete value. `initialized` is false until the net is first driven.
    Const { value: bool, initialized: bool },
    /// An alias of another net.
    Ref(NetId),
}

impl Cell {
    /// The cell every net starts with.
    pub const UNDRIVEN: Cell = Cell::Const {
        value: false,
        initialized: false,
    };
}

/// Mapping from net to [`Cell`].
#[derive(Clone, Debug, Default)]
pub struct CircuitState {
    cells: HashMap<NetId, Cell>,
}

impl CircuitState {
    /// Creates a store with an undriven cell for every given net.
    pub fn new<I>(nets: I) -> Self
    where
        I: IntoIterator<Item = NetId>,
    {
        Self {
            cells: nets.into_iter().map(|n| (n, Cell::UNDRIVEN)).collect(),
        }
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the store has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the raw cell of a net.
    pub fn cell(&self, net: NetId) -> Option<Cell> {
        self.cells.get(&net).copied()
    }

    /// Rebinds a net to alias `target`.
    pub fn bind(&mut self, net: NetId, target: NetId) {
        self.cells.insert(net, Cell::Ref(target));
    }

    /// Writes a driven value.
    pub fn set(&mut self, net: NetId, value: bool) {
        self.cells.insert(
            net,
            Cell::Const {
                value,
                initialized: true,
            },
        );
    }

    /// Follows aliases to the net holding the concrete value.
    ///
    /// Returns `None` for unknown nets or an alias cycle, which a correctly
    /// built circuit never contains.
    pub fn resolve(&self, net: NetId) -> Option<NetId> {
        let mut current = net;
        for _ in 0..=self.cells.len() {
            match self.cells.get(&current)? {
                Cell::Const { .. } => return Some(current),
                Cell::Ref(next) => current = *next,
            }
        }
        None
    }

    /// Returns `(value, initialized)` of the concrete cell behind `net`.
    pub fn value(&self, net: NetId) -> Option<(bool, bool)> {
        let resolved = self.resolve(net)?;
        match self.cells.get(&resolved)? {
            Cell::Const { value, initialized } => Some((*value, *initialized)),
            Cell::Ref(_) => None,
        }
    }

    /// Dereferences a net to a logic level. Never-driven nets read as `X`.
    pub fn deref(&self, net: NetId) -> Logic {
        match self.value(net) {
            Some((value, true)) => Logic::from(value),
            _ => Logic::X,
        }
    }

    /// Dereferences a connection, taking constants at face value.
    pub fn read_connection(&self, connection: Connection) -> Logic {
        match connection {
            Connection::Const(value) => Logic::from(value),
            Connection::Net(net) => self.deref(net),
        }
    }

    /// Returns true if the concrete cell behind `net` has been driven.
    pub fn is_initialized(&self, net: NetId) -> bool {
        matches!(self.value(net), Some((_, true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nets() -> [NetId; 3] {
        [NetId::new(1, 0), NetId::new(2, 0), NetId::new(3, 0)]
    }

    #[test]
    fn test_initial_cells_are_undriven() {
        let state = CircuitState::new(nets());
        assert_eq!(state.len(), 3);
        assert_eq!(state.cell(nets()[0]), Some(Cell::UNDRIVEN));
        assert_eq!(state.deref(nets()[0]), Logic::X);
        assert!(!state.is_initialized(nets()[0]));
    }

    #[test]
    fn test_alias_chain() {
        let [a, b, c] = nets();
        let mut state = CircuitState::new(nets());
        state.bind(c, b);
        state.bind(b, a);
        state.set(a, true);

        assert_eq!(state.resolve(c), Some(a));
        assert_eq!(state.deref(c), Logic::One);
        assert!(state.is_initialized(c));
    }

    #[test]
    fn test_driven_zero_is_not_unknown() {
        let [a, _, _] = nets();
        let mut state = CircuitState::new(nets());
        state.set(a, false);
        assert_eq!(state.deref(a), Logic::Zero);
    }

    #[test]
    fn test_alias_cycle_reads_unknown() {
        let [a, b, _] = nets();
        let mut state = CircuitState::new(nets());
        state.bind(a, b);
        state.bind(b, a);
        assert_eq!(state.resolve(a), None);
        assert_eq!(state.deref(a), Logic::X);
    }

    #[test]
    fn test_read_connection_constants() {
        let state = CircuitState::default();
        assert_eq!(state.read_connection(Connection::Const(true)), Logic::One);
        assert_eq!(state.read_connection(Connection::Const(false)), Logic::Zero);
        assert_eq!(state.read_connection(Connection::Net(NetId::new(9, 9))), Logic::X);
    }
}
