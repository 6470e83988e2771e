//! Pin and width model.
//!
//! Buses are always handled most-significant bit first: index 0 of a
//! `Vec<bool>` or a [`Signal`] is bit `W-1`, matching the expanded pin names
//! `pin(W-1) .. pin0`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, CircuitResult};
use crate::types::NetId;

/// A three-valued logic level as read back from the state store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Logic {
    /// Driven low
    Zero,
    /// Driven high
    One,
    /// Never driven
    X,
}

impl Logic {
    /// Returns the boolean value, or `None` for [`Logic::X`].
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Logic::Zero => Some(false),
            Logic::One => Some(true),
            Logic::X => None,
        }
    }

    /// Returns true if the level is known.
    pub fn is_known(self) -> bool {
        !matches!(self, Logic::X)
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => f.write_str("0"),
            Logic::One => f.write_str("1"),
            Logic::X => f.write_str("x"),
        }
    }
}

/// The shape of a declared pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// A single bit, named by its base name.
    Bit,
    /// A bit-vector of the given width, bits named `base(W-1) .. base0`.
    Bus(usize),
}

impl PinKind {
    /// Picks [`PinKind::Bit`] for width 1 and [`PinKind::Bus`] otherwise.
    pub fn from_width(width: usize) -> Self {
        if width == 1 {
            PinKind::Bit
        } else {
            PinKind::Bus(width)
        }
    }

    /// Returns the number of bits.
    pub fn width(self) -> usize {
        match self {
            PinKind::Bit => 1,
            PinKind::Bus(width) => width,
        }
    }

    /// Expands a base name into its single-bit pin names, MSB first.
    pub fn bit_names(self, base: &str) -> Vec<String> {
        match self {
            PinKind::Bit => vec![base.to_string()],
            PinKind::Bus(width) => (0..width).rev().map(|i| format!("{base}{i}")).collect(),
        }
    }
}

/// One bit of a connection: a literal constant or a net.
///
/// Constants are turned into references to the power module's `vcc`/`gnd`
/// nets when the connection is recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connection {
    /// A literal 0 or 1
    Const(bool),
    /// A reference to another module's pin bit
    Net(NetId),
}

impl From<bool> for Connection {
    fn from(value: bool) -> Self {
        Connection::Const(value)
    }
}

impl From<NetId> for Connection {
    fn from(net: NetId) -> Self {
        Connection::Net(net)
    }
}

/// An ordered bundle of connections, most-significant bit first.
///
/// Signals are what wiring code passes around: they are produced by module
/// handles (`handle.output("q")`), by literals (`Signal::from(true)`,
/// `Signal::constant(5, 4)`) and by slicing or concatenating other signals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signal {
    bits: Vec<Connection>,
}

impl Signal {
    /// Creates a signal from connections ordered MSB first.
    pub fn new(bits: Vec<Connection>) -> Self {
        Self { bits }
    }

    /// Creates a constant signal of `width` bits holding `value`.
    pub fn constant(value: u64, width: usize) -> Self {
        bin(value, width).into()
    }

    /// Concatenates signals; the first one ends up in the most-significant bits.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Signal>,
    {
        Self {
            bits: parts.into_iter().flat_map(|s| s.bits).collect(),
        }
    }

    /// Returns the number of bits.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if the signal carries no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns bit `index`, where 0 is the least-significant bit.
    pub fn bit(&self, index: usize) -> CircuitResult<Signal> {
        let width = self.width();
        if index >= width {
            return Err(CircuitError::InvalidPinValue(format!(
                "bit {index} out of range for a {width}-bit signal"
            )));
        }
        Ok(Signal::new(vec![self.bits[width - 1 - index]]))
    }

    /// Returns bits `hi..=lo` (LSB-relative indices), MSB first.
    pub fn slice(&self, hi: usize, lo: usize) -> CircuitResult<Signal> {
        let width = self.width();
        if lo > hi || hi >= width {
            return Err(CircuitError::InvalidPinValue(format!(
                "slice [{hi}:{lo}] out of range for a {width}-bit signal"
            )));
        }
        let start = width - 1 - hi;
        let end = width - lo;
        Ok(Signal::new(self.bits[start..end].to_vec()))
    }

    /// Iterates connections MSB first.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.bits.iter()
    }

    /// Returns the connections MSB first.
    pub fn connections(&self) -> &[Connection] {
        &self.bits
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        Signal::new(vec![Connection::Const(value)])
    }
}

impl From<Connection> for Signal {
    fn from(connection: Connection) -> Self {
        Signal::new(vec![connection])
    }
}

impl From<NetId> for Signal {
    fn from(net: NetId) -> Self {
        Signal::new(vec![Connection::Net(net)])
    }
}

impl From<Vec<bool>> for Signal {
    fn from(bits: Vec<bool>) -> Self {
        Signal::new(bits.into_iter().map(Connection::Const).collect())
    }
}

impl From<&[bool]> for Signal {
    fn from(bits: &[bool]) -> Self {
        Signal::new(bits.iter().copied().map(Connection::Const).collect())
    }
}

impl From<&Signal> for Signal {
    fn from(signal: &Signal) -> Self {
        signal.clone()
    }
}

/// Encodes `value` as `width` bits, most-significant bit first.
///
/// Bits above `width` are dropped, so `bin(5, 2)` is `[false, true]`.
pub fn bin(value: u64, width: usize) -> Vec<bool> {
    (0..width)
        .rev()
        .map(|i| i < 64 && (value >> i) & 1 == 1)
        .collect()
}

/// Decodes bits ordered most-significant first into an integer.
pub fn to_u64(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, &b| (acc << 1) | u64::from(b))
}

/// Decodes logic levels ordered most-significant first, `None` if any is `X`.
pub fn logic_to_u64(bits: &[Logic]) -> Option<u64> {
    bits.iter()
        .try_fold(0u64, |acc, l| l.to_bool().map(|b| (acc << 1) | u64::from(b)))
}

/// Parses a textual pin value into bits, most-significant first.
///
/// Accepts `"0"`, `"1"`, binary literals such as `"0b1010"` (underscores
/// allowed), and `width'decimal` literals such as `"8'23"`.
pub fn parse_bits(text: &str) -> CircuitResult<Vec<bool>> {
    let text = text.trim();
    match text {
        "0" => return Ok(vec![false]),
        "1" => return Ok(vec![true]),
        _ => {}
    }

    if let Some(digits) = text.strip_prefix("0b") {
        let bits: Option<Vec<bool>> = digits
            .chars()
            .filter(|c| *c != '_')
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect();
        return match bits {
            Some(bits) if !bits.is_empty() => Ok(bits),
            _ => Err(CircuitError::InvalidPinValue(text.to_string())),
        };
    }

    if let Some((width, value)) = text.split_once('\'') {
        let width: usize = width
            .parse()
            .map_err(|_| CircuitError::InvalidPinValue(text.to_string()))?;
        let value: u64 = value
            .parse()
            .map_err(|_| CircuitError::InvalidPinValue(text.to_string()))?;
        if width == 0 || (width < 64 && value >> width != 0) {
            return Err(CircuitError::InvalidPinValue(text.to_string()));
        }
        return Ok(bin(value, width));
    }

    Err(CircuitError::InvalidPinValue(text.to_string()))
}
