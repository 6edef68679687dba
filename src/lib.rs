//! # Tumble
//!
//! A simulation-state layer over a 2D rigid-body engine: schedule forces
//! that act over windows of simulated time, step the world on a monotonic
//! simulation clock, and ask when any two objects started touching.
//!
//! - `clock`: monotonic simulated time
//! - `forces`: time-windowed force schedules
//! - `contacts`: contact start-time ledger
//! - `object`: body + collider + force schedule
//! - `simulation`: main orchestrator
//! - `config`: world configuration (YAML)

mod clock;
mod config;
mod contacts;
mod error;
mod forces;
mod object;
mod simulation;

pub use clock::SimClock;
pub use config::{SimulationConfig, SolverConfig};
pub use contacts::ContactLedger;
pub use error::SimError;
pub use forces::{ForceSchedule, PointForce, TimedForce};
pub use object::{ObjectId, ShapeDesc};
pub use simulation::Simulation;
