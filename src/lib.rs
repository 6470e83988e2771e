//! # Kairo
//!
//! A digital circuit construction and simulation engine.
//!
//! Circuits are built declaratively from module definitions: *primitive*
//! modules carry simulation behavior, *compound* modules are wired together
//! from sub-modules. Instantiating a top-level module expands the whole
//! hierarchy into a graph of per-bit nets, which is then flattened to
//! primitives only and simulated.
//!
//! ## Design Principles
//!
//! - **Explicit structure**: compound modules receive a [`circuit::Wiring`]
//!   context; the circuit owns its id counter and there is no global state.
//! - **Fail fast**: width mismatches, undriven outputs, duplicate names and
//!   multiply-driven nets are errors at the point they are detected.
//! - **Two simulators**:
//!   - **Levelized**: every primitive evaluated once per step in dependency
//!     order. Fast, but rejects combinational feedback.
//!   - **Event-driven**: only primitives whose inputs changed are
//!     re-evaluated until the circuit settles. Handles latches.
//!
//! ## Features
//!
//! - `parallel` - Run the connection-integrity check with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use kairo::library::ripple_adder;
//! use kairo::{create_simulator, Approach, InputVector, SimOptions};
//!
//! let adder = ripple_adder(8).unwrap();
//! let mut sim = create_simulator(&adder, &SimOptions::new(Approach::Levelization)).unwrap();
//!
//! sim.input(
//!     &InputVector::new()
//!         .value("a", 16)
//!         .value("b", 7)
//!         .bit("carryIn", false),
//! )
//! .unwrap();
//!
//! assert_eq!(sim.read_u64("sum").unwrap(), Some(23));
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use kairo::config::SimConfig;
//! use kairo::registry::create_default_library;
//!
//! let config = SimConfig::from_yaml_file("simulation.yaml")?;
//! let mut sim = config.build_simulator(&create_default_library()?)?;
//! ```

pub mod types;
pub mod error;
pub mod pin;
pub mod signature;
pub mod registry;
pub mod module;
pub mod circuit;
pub mod flatten;
pub mod state;
pub mod integrity;
pub mod simulator;
pub mod config;
pub mod stats;
pub mod library;

// Re-export commonly used types
pub use types::{Direction, ModuleId, NetId, PinSlot};
pub use error::{CircuitError, CircuitResult};
pub use pin::{bin, to_u64, Connection, Logic, PinKind, Signal};
pub use signature::{Signature, SignatureBuilder};
pub use registry::{create_default_library, ModuleLibrary, SignatureRegistry};
pub use module::{Behavior, ModuleDef, ModuleKind, PinAccess};
pub use circuit::{Circuit, CircuitSnapshot, ModuleHandle, Net, Wiring};
pub use state::{Cell, CircuitState};
pub use simulator::{
    create_simulator, Approach, EventSimulator, InputVector, LevelizedSimulator, PinValue,
    SimOptions, Simulator,
};
pub use config::{ConfigError, SimConfig, SimConfigBuilder};
pub use stats::{SimulationStats, Timer};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// overrides `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// kairo::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
