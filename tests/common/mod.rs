use nalgebra::Vector2;
use tumble::{Simulation, TimedForce};

/// Step increment used by the scenario tests.
pub const DT: f64 = 0.1;

pub fn zero_gravity_sim() -> Simulation {
    Simulation::new(Vector2::zeros())
}

pub fn earth_gravity_sim() -> Simulation {
    Simulation::new(Vector2::new(0.0, -9.8))
}

/// A force along +x with the given window.
pub fn thrust_x(magnitude: f64, duration: f64, start_time: f64) -> TimedForce {
    TimedForce::new(Vector2::new(1.0, 0.0), magnitude, duration, start_time)
}

/// A unit box (1 x 1, mass 1 at default density) at rest.
pub fn unit_box_at(sim: &mut Simulation, x: f64, y: f64) -> tumble::ObjectId {
    sim.add_box(
        Vector2::new(x, y),
        0.0,
        Vector2::zeros(),
        Vector2::new(1.0, 1.0),
    )
}
