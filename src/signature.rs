//! Module signatures: the named input/output width contract of a module type.
//!
//! A signature also owns the bit-slot layout shared by every instance of the
//! module: all input bits first, then all output bits, each bus expanded most
//! significant bit first. [`NetId`](crate::types::NetId) slots index into this
//! layout.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use serde::Serialize;

use crate::error::{CircuitError, CircuitResult};
use crate::pin::PinKind;
use crate::types::{Direction, PinSlot};

/// A declared pin: base name plus shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PinDecl {
    /// Base name of the pin (e.g. "a", "sum", "clk")
    pub name: String,
    /// Bit or bus
    pub kind: PinKind,
}

impl PinDecl {
    /// Creates a pin declaration of the given width.
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            kind: PinKind::from_width(width),
        }
    }

    /// Returns the pin width in bits.
    pub fn width(&self) -> usize {
        self.kind.width()
    }
}

/// One expanded bit of a declared pin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BitPin {
    /// Expanded single-bit name (e.g. "a7")
    pub name: String,
    /// Direction of the declaring pin
    pub direction: Direction,
    /// Base name of the declaring pin
    pub pin: String,
}

/// The named input/output contract of a module type.
///
/// Built with [`Signature::builder`]. Equality compares name, pins and
/// attributes, which is what registration uses to tell a re-instantiation of
/// the same module apart from a conflicting definition.
#[derive(Clone, Debug, Serialize)]
pub struct Signature {
    /// Module type name
    pub name: String,
    /// Input pins in declaration order
    pub inputs: Vec<PinDecl>,
    /// Output pins in declaration order
    pub outputs: Vec<PinDecl>,
    /// Opaque annotations for exporters (e.g. `kicad`, `lcsc`)
    pub attrs: BTreeMap<String, String>,
    #[serde(skip)]
    bits: Vec<BitPin>,
    #[serde(skip)]
    input_bits: usize,
    #[serde(skip)]
    pin_ranges: HashMap<String, (Direction, Range<usize>)>,
    #[serde(skip)]
    bit_slots: HashMap<String, PinSlot>,
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.attrs == other.attrs
    }
}

impl Eq for Signature {}

impl Signature {
    /// Starts building a signature for the named module type.
    pub fn builder(name: impl Into<String>) -> SignatureBuilder {
        SignatureBuilder {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Total number of bit slots (inputs and outputs).
    pub fn slot_count(&self) -> usize {
        self.bits.len()
    }

    /// Number of input bit slots.
    pub fn input_bit_count(&self) -> usize {
        self.input_bits
    }

    /// Number of output bit slots.
    pub fn output_bit_count(&self) -> usize {
        self.bits.len() - self.input_bits
    }

    /// Slots of all input bits.
    pub fn input_slots(&self) -> Range<PinSlot> {
        0..self.input_bits as PinSlot
    }

    /// Slots of all output bits.
    pub fn output_slots(&self) -> Range<PinSlot> {
        self.input_bits as PinSlot..self.bits.len() as PinSlot
    }

    /// Returns the expanded bit at `slot`.
    pub fn bit(&self, slot: PinSlot) -> Option<&BitPin> {
        self.bits.get(slot as usize)
    }

    /// Returns the expanded bit name at `slot`.
    pub fn bit_name(&self, slot: PinSlot) -> Option<&str> {
        self.bit(slot).map(|b| b.name.as_str())
    }

    /// Returns the direction of `slot`.
    pub fn direction(&self, slot: PinSlot) -> Option<Direction> {
        self.bit(slot).map(|b| b.direction)
    }

    /// Looks up the slot of an expanded bit name such as `"sum3"`.
    pub fn slot_of_bit(&self, bit_name: &str) -> Option<PinSlot> {
        self.bit_slots.get(bit_name).copied()
    }

    /// Looks up a declared pin by base name: its direction and slots, MSB first.
    pub fn pin(&self, name: &str) -> Option<(Direction, Range<PinSlot>)> {
        self.pin_ranges
            .get(name)
            .map(|(dir, r)| (*dir, r.start as PinSlot..r.end as PinSlot))
    }

    /// Like [`Signature::pin`] but fails with `UnknownPin`.
    pub fn require_pin(&self, name: &str) -> CircuitResult<(Direction, Range<PinSlot>)> {
        self.pin(name).ok_or_else(|| CircuitError::UnknownPin {
            module: self.name.clone(),
            pin: name.to_string(),
        })
    }

    /// Looks up a declared pin that must have the given direction.
    pub fn require_pin_dir(&self, name: &str, direction: Direction) -> CircuitResult<Range<PinSlot>> {
        match self.pin(name) {
            Some((dir, slots)) if dir == direction => Ok(slots),
            _ => Err(CircuitError::UnknownPin {
                module: self.name.clone(),
                pin: name.to_string(),
            }),
        }
    }

    /// Returns an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Returns true if the module has no pins of any kind.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// Builder for [`Signature`].
#[derive(Clone, Debug)]
pub struct SignatureBuilder {
    name: String,
    inputs: Vec<PinDecl>,
    outputs: Vec<PinDecl>,
    attrs: BTreeMap<String, String>,
}

impl SignatureBuilder {
    /// Declares an input pin of `width` bits.
    pub fn input(mut self, name: impl Into<String>, width: usize) -> Self {
        self.inputs.push(PinDecl::new(name, width));
        self
    }

    /// Declares an output pin of `width` bits.
    pub fn output(mut self, name: impl Into<String>, width: usize) -> Self {
        self.outputs.push(PinDecl::new(name, width));
        self
    }

    /// Attaches an opaque annotation such as a KiCad symbol or an LCSC part number.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Validates the pin set and computes the slot layout.
    ///
    /// Fails with `DuplicatePinName` if a base name appears twice (in either
    /// direction) and with `InvalidWidth` for zero-width pins or signatures
    /// that do not fit the slot index type.
    pub fn build(self) -> CircuitResult<Signature> {
        let mut bits = Vec::new();
        let mut pin_ranges = HashMap::new();
        let mut bit_slots = HashMap::new();

        let declared = self
            .inputs
            .iter()
            .map(|p| (Direction::Input, p))
            .chain(self.outputs.iter().map(|p| (Direction::Output, p)));

        for (direction, decl) in declared {
            if decl.width() == 0 {
                return Err(CircuitError::InvalidWidth {
                    module: self.name.clone(),
                    pin: decl.name.clone(),
                    width: 0,
                });
            }
            let start = bits.len();
            for bit_name in decl.kind.bit_names(&decl.name) {
                let slot = bits.len();
                if bit_slots.insert(bit_name.clone(), slot as PinSlot).is_some() {
                    return Err(CircuitError::DuplicatePinName {
                        module: self.name.clone(),
                        pin: bit_name,
                    });
                }
                bits.push(BitPin {
                    name: bit_name,
                    direction,
                    pin: decl.name.clone(),
                });
            }
            if pin_ranges
                .insert(decl.name.clone(), (direction, start..bits.len()))
                .is_some()
            {
                return Err(CircuitError::DuplicatePinName {
                    module: self.name.clone(),
                    pin: decl.name.clone(),
                });
            }
        }

        if bits.len() > PinSlot::MAX as usize {
            return Err(CircuitError::InvalidWidth {
                module: self.name.clone(),
                pin: "*".to_string(),
                width: bits.len(),
            });
        }

        let input_bits = self.inputs.iter().map(PinDecl::width).sum();

        Ok(Signature {
            name: self.name,
            inputs: self.inputs,
            outputs: self.outputs,
            attrs: self.attrs,
            bits,
            input_bits,
            pin_ranges,
            bit_slots,
        })
    }
}
