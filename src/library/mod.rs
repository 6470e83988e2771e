//! Built-in module definitions.
//!
//! This module contains ready-made primitive and compound modules that can be
//! used directly or as references for writing custom ones.
//!
//! # Available Modules
//!
//! ## Primitives
//! - [`gates::gate`] - `and`, `or`, `not`, `nand`, `nor`, `xor`, `xnor`, `buffer`
//! - [`register::register`] - rising-edge register with load enable
//! - [`power::power`] - the implicit `vcc`/`gnd` source
//!
//! ## Compounds
//! - [`arith::half_adder`], [`arith::full_adder`], [`arith::ripple_adder`]
//! - [`mux::mux2`], [`mux::mux2_bus`], [`mux::mux4`]
//! - [`latch::sr_latch`] - set/reset latch built from NAND gates

pub mod arith;
pub mod gates;
pub mod latch;
pub mod mux;
pub mod power;
pub mod register;

pub use arith::{full_adder, half_adder, ripple_adder};
pub use gates::{gate, Gate, GateOp};
pub use latch::sr_latch;
pub use mux::{mux2, mux2_bus, mux4};
pub use register::{register, Register};
