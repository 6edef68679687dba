use crate::forces::{ForceSchedule, TimedForce};
use nalgebra::{Point2, UnitComplex, Vector2};
use rapier2d_f64::prelude::{
    ActiveEvents, ColliderBuilder, ColliderHandle, ColliderSet, NarrowPhase, RigidBodyBuilder,
    RigidBodyHandle, RigidBodySet,
};

/// Density every object starts with; mass follows from the shape.
const DEFAULT_DENSITY: f64 = 1.0;
const DEFAULT_FRICTION: f64 = 1.0;

/// Identifies one object inside the `Simulation` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

/// Shape of an object's single collider.
#[derive(Debug, Clone, Copy)]
pub enum ShapeDesc {
    /// Axis-aligned box given by its full extents.
    Box { size: Vector2<f64> },
    Circle { radius: f64 },
}

impl ShapeDesc {
    fn collider(&self) -> ColliderBuilder {
        match *self {
            ShapeDesc::Box { size } => ColliderBuilder::cuboid(size.x / 2.0, size.y / 2.0),
            ShapeDesc::Circle { radius } => ColliderBuilder::ball(radius),
        }
    }
}

/// One dynamic body, its single collider, and the forces scheduled on it.
///
/// All engine state lives in the owning `Simulation`'s body and collider
/// sets; this couples the handles to the force schedule and keeps the
/// kinematic surface in one place.
#[derive(Debug)]
pub struct SimObject {
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) schedule: ForceSchedule,
}

impl SimObject {
    /// Wrap handles created elsewhere (the static ground) so they share
    /// the same query surface as dynamic objects.
    pub(crate) fn from_parts(body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            body,
            collider,
            schedule: ForceSchedule::new(),
        }
    }

    pub(crate) fn spawn(
        position: Vector2<f64>,
        rotation: f64,
        velocity: Vector2<f64>,
        shape: ShapeDesc,
        bodies: &mut RigidBodySet,
        colliders: &mut ColliderSet,
    ) -> Self {
        let rb = RigidBodyBuilder::dynamic()
            .translation(position)
            .rotation(rotation)
            .linvel(velocity)
            .build();
        let body = bodies.insert(rb);

        let collider = shape
            .collider()
            .density(DEFAULT_DENSITY)
            .friction(DEFAULT_FRICTION)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = colliders.insert_with_parent(collider, body, bodies);

        Self {
            body,
            collider,
            schedule: ForceSchedule::new(),
        }
    }

    /// Expire and forward this step's active forces to the engine body.
    ///
    /// The engine does not retain forces between steps; the accumulator is
    /// cleared and active forces are re-applied on every step while their
    /// window stays open.
    pub(crate) fn apply_forces(&mut self, now: f64, bodies: &mut RigidBodySet) {
        self.schedule.expire(now);

        let rb = &mut bodies[self.body];
        rb.reset_forces(false);

        let resultant = self.schedule.resultant_centered(now);
        if resultant != Vector2::zeros() {
            rb.add_force(resultant, true);
        }
        for entry in self.schedule.active_at_point(now) {
            rb.add_force_at_point(entry.force.vector(), entry.point, true);
        }
    }

    pub(crate) fn schedule_centered(&mut self, force: TimedForce) {
        self.schedule.push_centered(force);
    }

    pub(crate) fn schedule_at_point(&mut self, force: TimedForce, point: Point2<f64>) {
        self.schedule.push_at_point(force, point);
    }

    /// Live geometric check against the narrow phase, independent of any
    /// recorded contact timing.
    pub(crate) fn is_touching(&self, other: &SimObject, narrow_phase: &NarrowPhase) -> bool {
        narrow_phase
            .contact_pair(self.collider, other.collider)
            .map(|pair| pair.has_any_active_contact)
            .unwrap_or(false)
    }

    pub(crate) fn position(&self, bodies: &RigidBodySet) -> Vector2<f64> {
        *bodies[self.body].translation()
    }

    pub(crate) fn set_position(&self, position: Vector2<f64>, bodies: &mut RigidBodySet) {
        bodies[self.body].set_translation(position, true);
    }

    pub(crate) fn rotation(&self, bodies: &RigidBodySet) -> f64 {
        bodies[self.body].rotation().angle()
    }

    pub(crate) fn set_rotation(&self, rotation: f64, bodies: &mut RigidBodySet) {
        bodies[self.body].set_rotation(UnitComplex::new(rotation), true);
    }

    pub(crate) fn velocity(&self, bodies: &RigidBodySet) -> Vector2<f64> {
        *bodies[self.body].linvel()
    }

    pub(crate) fn set_velocity(&self, velocity: Vector2<f64>, bodies: &mut RigidBodySet) {
        bodies[self.body].set_linvel(velocity, true);
    }

    pub(crate) fn angular_velocity(&self, bodies: &RigidBodySet) -> f64 {
        bodies[self.body].angvel()
    }

    pub(crate) fn set_angular_velocity(&self, velocity: f64, bodies: &mut RigidBodySet) {
        bodies[self.body].set_angvel(velocity, true);
    }

    pub(crate) fn mass(&self, bodies: &RigidBodySet) -> f64 {
        bodies[self.body].mass()
    }

    /// Change the collider density and immediately recompute the body's
    /// mass properties. Mass is derived, never cached, so a read right
    /// after this reflects the new density.
    pub(crate) fn set_density(
        &self,
        density: f64,
        bodies: &mut RigidBodySet,
        colliders: &mut ColliderSet,
    ) {
        colliders[self.collider].set_density(density);
        bodies[self.body].recompute_mass_properties_from_colliders(colliders);
    }

    pub(crate) fn set_friction(&self, friction: f64, colliders: &mut ColliderSet) {
        colliders[self.collider].set_friction(friction);
    }
}
