//! ═══════════════════════════════════════════════════════════════════════════════
//! ORACLE — Named States and Counterfactual Sandboxing
//! ═══════════════════════════════════════════════════════════════════════════════
//! The oracle is the perception core's only handle on the simulator: it can
//! navigate between named snapshots ("start", "end", …), run what-if futures
//! that roll back exactly, throw stock impulses, observe collisions while a
//! scene plays out, and answer proximity queries.
//!
//! Single-owner, single-threaded. `analyze_future` may nest; restores are
//! strictly LIFO, so nothing a sandboxed closure does survives the call.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::HashMap;

use crate::config::PerceptionConfig;
use crate::physics::{BodyId, CollisionEvent, Contact, PhysicsWorld, SnapshotId};

/// Axis of a stock impulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit vector in scene coordinates (y grows downward)
    pub fn unit(self) -> [f64; 2] {
        match self {
            Direction::Left => [-1.0, 0.0],
            Direction::Right => [1.0, 0.0],
            Direction::Up => [0.0, -1.0],
            Direction::Down => [0.0, 1.0],
        }
    }
}

/// Strength of a stock impulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magnitude {
    Small,
    Medium,
}

/// Stepping increment while observing collisions
const OBSERVE_STEP: f64 = 1.0 / 60.0;
/// Upper bound on observed simulation time, seconds
const OBSERVE_LIMIT: f64 = 10.0;

/// Abstract handle to the physics simulator
pub struct Oracle {
    world: Box<dyn PhysicsWorld>,
    states: HashMap<String, SnapshotId>,
    /// Sandbox frames currently open, innermost last
    sandbox: Vec<SnapshotId>,
    /// The currently named state, if any
    pub curr_state: Option<String>,
    config: PerceptionConfig,
}

impl Oracle {
    pub fn new(world: Box<dyn PhysicsWorld>, config: PerceptionConfig) -> Self {
        Self {
            world,
            states: HashMap::new(),
            sandbox: Vec::new(),
            curr_state: None,
            config,
        }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Name the current simulator state
    pub fn save_state(&mut self, name: &str) {
        let snap = self.world.save_snapshot();
        if let Some(old) = self.states.insert(name.to_string(), snap) {
            self.world.discard_snapshot(old);
        }
        self.curr_state = Some(name.to_string());
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Restore a named state. Idempotent when already there.
    /// Returns false for a name that was never saved.
    pub fn goto_state(&mut self, name: &str) -> bool {
        if self.curr_state.as_deref() == Some(name) {
            return true;
        }
        match self.states.get(name) {
            Some(&snap) => {
                self.world.restore_snapshot(snap);
                self.curr_state = Some(name.to_string());
                true
            }
            None => false,
        }
    }

    /// Run a sandboxed future: apply `before`, step `dt` seconds, evaluate
    /// `after`, then restore the prior state exactly. Every side effect of
    /// the closures rolls back; only `after`'s value escapes. Nesting is
    /// allowed and restores LIFO.
    pub fn analyze_future<T>(
        &mut self,
        dt: f64,
        before: Option<&mut dyn FnMut(&mut Oracle)>,
        after: impl FnOnce(&mut Oracle) -> T,
    ) -> T {
        let snap = self.world.save_snapshot();
        self.sandbox.push(snap);
        let outer_state = self.curr_state.clone();

        if let Some(f) = before {
            f(self);
        }
        if dt > 0.0 {
            self.world.step(dt);
        }
        let out = after(self);

        if let Some(snap) = self.sandbox.pop() {
            self.world.restore_snapshot(snap);
            self.world.discard_snapshot(snap);
        }
        self.curr_state = outer_state;
        out
    }

    /// Stock central impulse scaled by the body's mass
    pub fn apply_central_impulse(&mut self, body: BodyId, dir: Direction, mag: Magnitude) {
        let factor = match mag {
            Magnitude::Small => self.config.impulse_small,
            Magnitude::Medium => self.config.impulse_medium,
        };
        let strength = factor * self.world.mass(body);
        let [ux, uy] = dir.unit();
        self.world.apply_impulse(body, ux * strength, uy * strength);
    }

    /// Step from "start" until the scene settles, recording every collision,
    /// and name the settled state "end".
    pub fn observe_collisions(&mut self) -> Vec<CollisionEvent> {
        self.goto_state("start");
        self.world.wake_all();
        self.world.drain_collision_events();

        let mut recorded = Vec::new();
        let mut elapsed = 0.0;
        while elapsed < OBSERVE_LIMIT {
            self.world.step(OBSERVE_STEP);
            elapsed += OBSERVE_STEP;
            recorded.extend(self.world.drain_collision_events());
            if self.world.settled() {
                break;
            }
        }
        self.save_state("end");
        recorded
    }

    // ── Pass-through queries ───────────────────────────────────────────────

    pub fn is_static(&self, body: BodyId) -> bool {
        self.world.is_static(body)
    }

    pub fn wake_up(&mut self) {
        self.world.wake_all();
    }

    pub fn for_each_dynamic_body(&self, mut f: impl FnMut(BodyId)) {
        for b in self.world.dynamic_bodies() {
            f(b);
        }
    }

    /// Distance the body moved since the innermost snapshot boundary
    pub fn body_distance(&self, body: BodyId) -> f64 {
        self.world.distance_moved(body)
    }

    pub fn linear_speed(&self, body: BodyId) -> f64 {
        self.world.linear_speed(body)
    }

    pub fn angle(&self, body: BodyId) -> f64 {
        self.world.angle(body)
    }

    pub fn position(&self, body: BodyId) -> [f64; 2] {
        self.world.position(body)
    }

    pub fn mass(&self, body: BodyId) -> f64 {
        self.world.mass(body)
    }

    pub fn surface_distance(&self, a: BodyId, b: BodyId) -> f64 {
        self.world.surface_distance(a, b)
    }

    pub fn apply_force(&mut self, body: BodyId, fx: f64, fy: f64) {
        self.world.apply_force(body, fx, fy);
    }

    pub fn set_sleeping_allowed(&mut self, body: BodyId, allowed: bool) {
        self.world.set_sleeping_allowed(body, allowed);
    }

    pub fn set_active(&mut self, body: BodyId, active: bool) {
        self.world.set_active(body, active);
    }

    pub fn make_static(&mut self, body: BodyId) {
        self.world.make_static(body);
    }

    pub fn step(&mut self, dt: f64) {
        self.world.step(dt);
    }

    /// Closest other dynamic body and its surface distance
    pub fn closest_body_with_dist(&self, body: BodyId) -> Option<(BodyId, f64)> {
        self.world
            .dynamic_bodies()
            .into_iter()
            .filter(|&b| b != body && self.world.is_active(b))
            .map(|b| (b, self.world.surface_distance(body, b)))
            .min_by(|a, b| crate::math::float_cmp(&a.1, &b.1))
    }

    /// Bodies in resting contact with `body`, with contact points
    pub fn touched_bodies_with_pos(&self, body: BodyId) -> Vec<Contact> {
        self.world.contacts(body)
    }

    /// Single-link clustering of bodies by surface distance.
    /// `max_dist` is a fraction of the 100-unit scene.
    pub fn spatial_groups(&self, max_dist: f64, bodies: Option<Vec<BodyId>>) -> Vec<Vec<BodyId>> {
        let bodies = bodies.unwrap_or_else(|| self.world.dynamic_bodies());
        let threshold = max_dist * 100.0;
        let n = bodies.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut Vec<usize>, i: usize) -> usize {
            let mut root = i;
            while parent[root] != root {
                root = parent[root];
            }
            let mut cur = i;
            while parent[cur] != root {
                let next = parent[cur];
                parent[cur] = root;
                cur = next;
            }
            root
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if self.world.surface_distance(bodies[i], bodies[j]) <= threshold {
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        parent[ri] = rj;
                    }
                }
            }
        }

        let mut groups: HashMap<usize, Vec<BodyId>> = HashMap::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(bodies[i]);
        }
        let mut out: Vec<Vec<BodyId>> = groups.into_values().collect();
        out.sort_by_key(|g| g.first().copied());
        out
    }
}
