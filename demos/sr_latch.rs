//! SR latch example.
//!
//! A latch is combinational feedback, which the levelized simulator refuses.
//! The event-driven simulator settles it and keeps the stored bit between
//! inputs. The simulator itself is set up from a YAML configuration against
//! the built-in module library.

use kairo::library::sr_latch;
use kairo::{
    create_default_library, create_simulator, Approach, CircuitError, ConfigError, InputVector,
    SimConfig, SimOptions,
};

const CONFIG: &str = r#"
simulation:
  approach: event-driven
  max_iterations: 1000
  log_level: info
  collect_stats: true

top: sr_latch
"#;

fn main() -> Result<(), ConfigError> {
    let config = SimConfig::from_yaml(CONFIG)?;
    config.init_logging();

    match create_simulator(&sr_latch()?, &SimOptions::new(Approach::Levelization)) {
        Err(CircuitError::CircuitHasFeedback { remaining }) => {
            println!("levelization: feedback through {remaining} modules");
        }
        Err(err) => return Err(err.into()),
        Ok(_) => println!("levelization: unexpectedly accepted"),
    }

    let mut sim = config.build_simulator(&create_default_library()?)?;
    let steps = [
        ("set", true, false),
        ("hold", false, false),
        ("reset", false, true),
        ("hold", false, false),
    ];

    for (label, s, r) in steps {
        sim.input(&InputVector::new().bit("s", s).bit("r", r))?;
        println!(
            "{label:<5} s={} r={} -> q={} qbar={}",
            u8::from(s),
            u8::from(r),
            sim.read_bit("q")?,
            sim.read_bit("qbar")?
        );
    }

    if let Some(report) = config.stats_report(sim.as_ref()) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
