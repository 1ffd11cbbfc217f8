//! ═══════════════════════════════════════════════════════════════════════════════
//! PHYSICS — The Rigid-Body Engine Seam
//! ═══════════════════════════════════════════════════════════════════════════════
//! The perception core never talks to a concrete engine. Everything it needs
//! from the simulator is behind the object-safe [`PhysicsWorld`] trait:
//! stepping, snapshot/restore, body state and mutation, proximity queries and
//! collision events. `flatworld` provides the in-crate implementation used by
//! tests and the demo binary.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

/// Handle to a body owned by the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub usize);

/// Opaque handle to a saved world state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub u64);

/// A resting contact between two bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// The other body
    pub body: BodyId,
    /// Contact points in world coordinates
    pub pts: Vec<[f64; 2]>,
}

/// A collision recorded while stepping: `a` ran into `b`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub a: BodyId,
    pub b: BodyId,
    /// Relative speed at first contact
    pub dv: f64,
}

/// Everything the perception core requires from a 2D rigid-body engine.
///
/// Snapshot handles form a stack in practice (the oracle enforces LIFO
/// restore); an implementation only has to store and retrieve them by id.
pub trait PhysicsWorld {
    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f64);

    /// True when every dynamic body is asleep
    fn settled(&self) -> bool;

    /// Wake every dynamic body
    fn wake_all(&mut self);

    /// Capture the complete world state
    fn save_snapshot(&mut self) -> SnapshotId;

    /// Restore a previously captured state, keeping the snapshot
    fn restore_snapshot(&mut self, id: SnapshotId);

    /// Drop a snapshot that will not be restored again
    fn discard_snapshot(&mut self, id: SnapshotId);

    fn is_static(&self, body: BodyId) -> bool;
    fn is_active(&self, body: BodyId) -> bool;
    /// Linear speed in scene units per second
    fn linear_speed(&self, body: BodyId) -> f64;
    /// Rotation in radians
    fn angle(&self, body: BodyId) -> f64;
    /// Center position in scene units
    fn position(&self, body: BodyId) -> [f64; 2];
    fn mass(&self, body: BodyId) -> f64;

    /// Apply a continuous central force for the duration of subsequent steps
    fn apply_force(&mut self, body: BodyId, fx: f64, fy: f64);
    /// Clear any force previously applied to the body
    fn clear_force(&mut self, body: BodyId);
    /// Instantaneous central impulse
    fn apply_impulse(&mut self, body: BodyId, ix: f64, iy: f64);
    fn set_sleeping_allowed(&mut self, body: BodyId, allowed: bool);
    /// Deactivated bodies neither move nor collide
    fn set_active(&mut self, body: BodyId, active: bool);
    fn make_static(&mut self, body: BodyId);
    fn make_dynamic(&mut self, body: BodyId);

    /// All dynamic bodies, active or not
    fn dynamic_bodies(&self) -> Vec<BodyId>;
    /// Surface (not center) distance between two bodies, physics units
    fn surface_distance(&self, a: BodyId, b: BodyId) -> f64;
    /// Distance the body center moved since the last snapshot boundary
    fn distance_moved(&self, body: BodyId) -> f64;
    /// Bodies currently in resting contact with `body`
    fn contacts(&self, body: BodyId) -> Vec<Contact>;
    /// Collisions observed since the last drain
    fn drain_collision_events(&mut self) -> Vec<CollisionEvent>;
}
