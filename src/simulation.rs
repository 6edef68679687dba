use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::contacts::ContactLedger;
use crate::error::SimError;
use crate::forces::TimedForce;
use crate::object::{ObjectId, ShapeDesc, SimObject};
use nalgebra::{Point2, Vector2};
use rapier2d_f64::prelude::{
    ActiveEvents, CCDSolver, ColliderBuilder, ColliderSet, CollisionEvent, ContactPair,
    DefaultBroadPhase, EventHandler, ImpulseJointSet, IntegrationParameters, IslandManager,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, RigidBodyBuilder, RigidBodySet,
};
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Buffers the engine's collision events while the pipeline steps.
///
/// The engine invokes the handler through `&self` during `step`; events are
/// drained synchronously by the owning `Simulation` before that same step
/// returns, so the mutex is never contended.
#[derive(Default)]
struct EventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl EventCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *self.collisions.lock().unwrap())
    }
}

impl EventHandler for EventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions.lock().unwrap().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f64,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f64,
    ) {
        // Contact force reporting is not used.
    }
}

/// A 2D rigid-body world with a simulated clock, per-object force
/// schedules, and contact-start bookkeeping.
///
/// Each step: scheduled forces active "as of now" are forwarded to their
/// bodies, the engine advances by `dt` (collision events fire here and are
/// stamped with the not-yet-advanced clock), then the clock advances.
pub struct Simulation {
    config: SimulationConfig,
    gravity: Vector2<f64>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    events: EventCollector,
    clock: SimClock,
    objects: Vec<SimObject>,
    contacts: ContactLedger,
}

impl Simulation {
    pub fn new(gravity: Vector2<f64>) -> Self {
        Self::with_config(SimulationConfig {
            gravity,
            ..SimulationConfig::default()
        })
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        if let Some(iterations) = NonZeroUsize::new(config.solver.velocity_iterations) {
            integration_parameters.num_solver_iterations = iterations;
        }
        integration_parameters.num_internal_pgs_iterations = config.solver.position_iterations;

        log::info!(
            "creating world: gravity {:?}, time step {}",
            config.gravity,
            config.time_step
        );

        Self {
            gravity: config.gravity,
            config,
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            events: EventCollector::default(),
            clock: SimClock::new(),
            objects: Vec::new(),
            contacts: ContactLedger::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vector2<f64>) {
        self.gravity = gravity;
    }

    /// Add a dynamic box with the given initial position, rotation,
    /// velocity and full extents.
    pub fn add_box(
        &mut self,
        position: Vector2<f64>,
        rotation: f64,
        velocity: Vector2<f64>,
        size: Vector2<f64>,
    ) -> ObjectId {
        self.add_object(position, rotation, velocity, ShapeDesc::Box { size })
    }

    /// Add a dynamic circle with the given initial position, rotation,
    /// velocity and radius.
    pub fn add_circle(
        &mut self,
        position: Vector2<f64>,
        rotation: f64,
        velocity: Vector2<f64>,
        radius: f64,
    ) -> ObjectId {
        self.add_object(position, rotation, velocity, ShapeDesc::Circle { radius })
    }

    fn add_object(
        &mut self,
        position: Vector2<f64>,
        rotation: f64,
        velocity: Vector2<f64>,
        shape: ShapeDesc,
    ) -> ObjectId {
        let object = SimObject::spawn(
            position,
            rotation,
            velocity,
            shape,
            &mut self.bodies,
            &mut self.colliders,
        );
        self.objects.push(object);
        let id = ObjectId(self.objects.len() - 1);
        log::debug!("added object {:?}: {:?} at {:?}", id, shape, position);
        id
    }

    /// Create the static ground: a wide flat slab whose top surface sits at
    /// `height`.
    pub fn make_ground(&mut self, height: f64, friction: f64) -> ObjectId {
        let body = RigidBodyBuilder::fixed()
            .translation(Vector2::new(0.0, height - 10.0))
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cuboid(10_000.0, 10.0)
            .density(1.0)
            .friction(friction)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.objects.push(SimObject::from_parts(handle, collider));
        let id = ObjectId(self.objects.len() - 1);
        log::info!("ground created at height {height} with friction {friction}");
        id
    }

    /// Advance the world by `dt` seconds and return the new simulated time.
    ///
    /// A negative `dt` fails before any force is applied or state mutated.
    pub fn step(&mut self, dt: f64) -> Result<f64, SimError> {
        if dt < 0.0 {
            return Err(SimError::InvalidArgument(format!(
                "negative time step: {dt}"
            )));
        }

        // Forces active as of the *current* clock are the ones applied
        // this step.
        let now = self.clock.now();
        for object in &mut self.objects {
            object.apply_forces(now, &mut self.bodies);
        }

        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.events,
        );

        // Contact events fired during the pipeline step; stamp them with
        // the clock value that was current while the engine advanced.
        for event in self.events.drain() {
            match event {
                CollisionEvent::Started(a, b, _) => self.contacts.begin(a, b, now),
                CollisionEvent::Stopped(a, b, _) => self.contacts.end(a, b),
            }
        }

        self.clock.step(dt)
    }

    /// Step repeatedly with the configured fixed increment until
    /// `total_time` has elapsed. A trailing partial increment is stepped,
    /// never dropped, so the steps sum to `total_time` exactly (up to
    /// floating-point rounding of the remainder).
    pub fn run(&mut self, total_time: f64) -> Result<f64, SimError> {
        if total_time < 0.0 {
            return Err(SimError::InvalidArgument(format!(
                "negative run time: {total_time}"
            )));
        }
        log::debug!(
            "running for {total_time}s in {}s increments",
            self.config.time_step
        );

        let mut remaining = total_time;
        while remaining > 0.0 {
            let dt = remaining.min(self.config.time_step);
            self.step(dt)?;
            remaining -= dt;
        }
        Ok(self.clock.now())
    }

    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Schedule a force through the object's center of mass.
    pub fn schedule_force(&mut self, id: ObjectId, force: TimedForce) -> Result<(), SimError> {
        let object = self.objects.get_mut(id.0).ok_or(SimError::UnknownObject(id))?;
        object.schedule_centered(force);
        Ok(())
    }

    /// Schedule a force applied at a world point.
    pub fn schedule_force_at_point(
        &mut self,
        id: ObjectId,
        force: TimedForce,
        point: Point2<f64>,
    ) -> Result<(), SimError> {
        let object = self.objects.get_mut(id.0).ok_or(SimError::UnknownObject(id))?;
        object.schedule_at_point(force, point);
        Ok(())
    }

    /// Live geometric touching check between two objects.
    pub fn is_touching(&self, a: ObjectId, b: ObjectId) -> Result<bool, SimError> {
        let obj_a = self.objects.get(a.0).ok_or(SimError::UnknownObject(a))?;
        let obj_b = self.objects.get(b.0).ok_or(SimError::UnknownObject(b))?;
        Ok(obj_a.is_touching(obj_b, &self.narrow_phase))
    }

    /// Simulated time at which two objects started touching, if they are
    /// in recorded contact. `None` is "no contact", distinct from a start
    /// time of zero.
    pub fn impact_start_time(&self, a: ObjectId, b: ObjectId) -> Result<Option<f64>, SimError> {
        let obj_a = self.objects.get(a.0).ok_or(SimError::UnknownObject(a))?;
        let obj_b = self.objects.get(b.0).ok_or(SimError::UnknownObject(b))?;
        Ok(self.contacts.impact_start(obj_a.collider, obj_b.collider))
    }

    pub fn position(&self, id: ObjectId) -> Result<Vector2<f64>, SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        Ok(object.position(&self.bodies))
    }

    pub fn set_position(&mut self, id: ObjectId, position: Vector2<f64>) -> Result<(), SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        object.set_position(position, &mut self.bodies);
        Ok(())
    }

    pub fn rotation(&self, id: ObjectId) -> Result<f64, SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        Ok(object.rotation(&self.bodies))
    }

    pub fn set_rotation(&mut self, id: ObjectId, rotation: f64) -> Result<(), SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        object.set_rotation(rotation, &mut self.bodies);
        Ok(())
    }

    pub fn velocity(&self, id: ObjectId) -> Result<Vector2<f64>, SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        Ok(object.velocity(&self.bodies))
    }

    pub fn set_velocity(&mut self, id: ObjectId, velocity: Vector2<f64>) -> Result<(), SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        object.set_velocity(velocity, &mut self.bodies);
        Ok(())
    }

    pub fn angular_velocity(&self, id: ObjectId) -> Result<f64, SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        Ok(object.angular_velocity(&self.bodies))
    }

    pub fn set_angular_velocity(&mut self, id: ObjectId, velocity: f64) -> Result<(), SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        object.set_angular_velocity(velocity, &mut self.bodies);
        Ok(())
    }

    pub fn mass(&self, id: ObjectId) -> Result<f64, SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        Ok(object.mass(&self.bodies))
    }

    pub fn set_density(&mut self, id: ObjectId, density: f64) -> Result<(), SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        object.set_density(density, &mut self.bodies, &mut self.colliders);
        Ok(())
    }

    pub fn set_friction(&mut self, id: ObjectId, friction: f64) -> Result<(), SimError> {
        let object = self.objects.get(id.0).ok_or(SimError::UnknownObject(id))?;
        object.set_friction(friction, &mut self.colliders);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_dt_fails_before_any_mutation() {
        let mut sim = Simulation::new(Vector2::new(0.0, -9.8));
        let id = sim.add_box(
            Vector2::new(0.0, 10.0),
            0.0,
            Vector2::zeros(),
            Vector2::new(1.0, 1.0),
        );
        let pos_before = sim.position(id).unwrap();

        assert!(sim.step(-0.1).is_err());
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.position(id).unwrap(), pos_before);
    }

    #[test]
    fn test_run_never_drops_the_remainder() {
        let mut sim = Simulation::new(Vector2::zeros());
        // 0.25 is not a multiple of the 1/60 default increment.
        let end = sim.run(0.25).unwrap();
        assert!((end - 0.25).abs() < 1e-9, "ended at {end}");
    }

    #[test]
    fn test_run_rejects_negative_total_time() {
        let mut sim = Simulation::new(Vector2::zeros());
        assert!(sim.run(-1.0).is_err());
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn test_unknown_object_is_an_error() {
        let mut sim = Simulation::new(Vector2::zeros());
        let bogus = ObjectId(7);
        assert!(sim.position(bogus).is_err());
        assert!(sim.schedule_force(
            bogus,
            TimedForce::new(Vector2::new(1.0, 0.0), 1.0, 1.0, 0.0)
        )
        .is_err());
    }

    #[test]
    fn test_step_returns_advanced_time() {
        let mut sim = Simulation::new(Vector2::zeros());
        assert!((sim.step(0.5).unwrap() - 0.5).abs() < 1e-12);
        assert!((sim.step(0.25).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_objects_are_registered() {
        let mut sim = Simulation::new(Vector2::new(0.0, -9.8));
        sim.add_circle(Vector2::zeros(), 0.0, Vector2::zeros(), 1.0);
        sim.make_ground(0.0, 0.5);
        assert_eq!(sim.object_count(), 2);
    }
}
