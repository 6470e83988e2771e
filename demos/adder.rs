//! Ripple-carry adder example.
//!
//! Builds an 8-bit adder out of full adders, runs the same additions through
//! both simulators and prints the results alongside the work each simulator
//! did.

use kairo::library::ripple_adder;
use kairo::{create_simulator, Approach, CircuitResult, InputVector, SimOptions};

const WIDTH: usize = 8;
const SUMS: [(u64, u64, bool); 5] = [(16, 7, false), (200, 100, true), (255, 1, false), (0, 0, true), (85, 170, false)];

fn main() -> CircuitResult<()> {
    kairo::init_logging("info");

    let adder = ripple_adder(WIDTH)?;

    for approach in [Approach::Levelization, Approach::EventDriven] {
        let mut sim = create_simulator(&adder, &SimOptions::new(approach))?;
        println!("--- {approach} ---");

        for (a, b, carry) in SUMS {
            sim.input(
                &InputVector::new()
                    .value("a", a)
                    .value("b", b)
                    .bit("carryIn", carry),
            )?;
            let sum = sim.read_u64("sum")?.unwrap_or_default();
            let carry_out = sim.read_bit("carryOut")?;
            println!("{a:>3} + {b:>3} + {} = {sum:>3} carry {carry_out}", u8::from(carry));
        }

        println!("{}", sim.stats().summary());
    }

    Ok(())
}
