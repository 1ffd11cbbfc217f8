//! ═══════════════════════════════════════════════════════════════════════════════
//! FLATWORLD — Minimal Deterministic 2D World
//! ═══════════════════════════════════════════════════════════════════════════════
//! A deliberately small rigid-body model implementing [`PhysicsWorld`]:
//! gravity, circles and axis-aligned boxes, an inverted-box frame, positional
//! contact resolution with per-body friction, sleeping, snapshots and
//! collision events. It exists so the perception tests and the demo binary can
//! drive real counterfactual probes with repeatable outcomes; it is not a
//! production engine (no rotation dynamics, no restitution).
//!
//! Coordinates are scene units, y growing downward; gravity is +y.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::{HashMap, HashSet};

use crate::physics::{BodyId, CollisionEvent, Contact, PhysicsWorld, SnapshotId};

/// Integration substep, seconds
const SUBSTEP: f64 = 1.0 / 240.0;
/// Friction decay rate per second of contact
const FRICTION_RATE: f64 = 60.0;
/// Speed below which a body is considered still
const SLEEP_SPEED: f64 = 0.05;
/// Still substeps before falling asleep
const SLEEP_DELAY: u32 = 30;
/// Surface distance at or below which bodies are in resting contact
const CONTACT_EPS: f64 = 0.1;
/// Minimum approach speed that registers as a collision event
const EVENT_SPEED: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
enum Collider {
    Circle { r: f64 },
    Box { hw: f64, hh: f64 },
    /// Inverted box: walls enclosing the interior region
    Frame { min: [f64; 2], max: [f64; 2] },
}

#[derive(Debug, Clone)]
struct FlatBody {
    collider: Collider,
    pos: [f64; 2],
    vel: [f64; 2],
    angle: f64,
    mass: f64,
    friction: f64,
    dynamic: bool,
    active: bool,
    sleeping_allowed: bool,
    asleep: bool,
    still_substeps: u32,
    force: [f64; 2],
    /// Position at the last snapshot boundary
    anchor: [f64; 2],
}

impl FlatBody {
    fn speed(&self) -> f64 {
        (self.vel[0] * self.vel[0] + self.vel[1] * self.vel[1]).sqrt()
    }

    fn wake(&mut self) {
        self.asleep = false;
        self.still_substeps = 0;
    }
}

#[derive(Debug, Clone)]
struct SavedState {
    bodies: Vec<FlatBody>,
    touching: HashSet<(usize, usize)>,
    time: f64,
}

/// One separation between two overlapping bodies
struct Overlap {
    /// Unit normal pushing `a` out of `b`
    normal: [f64; 2],
    depth: f64,
}

/// The deterministic test world
#[derive(Debug, Default)]
pub struct FlatWorld {
    bodies: Vec<FlatBody>,
    gravity: f64,
    snapshots: HashMap<u64, SavedState>,
    next_snapshot: u64,
    touching: HashSet<(usize, usize)>,
    events: Vec<CollisionEvent>,
    time: f64,
}

impl FlatWorld {
    pub fn new() -> Self {
        Self {
            gravity: 10.0,
            ..Default::default()
        }
    }

    fn add_body(&mut self, collider: Collider, x: f64, y: f64, mass: f64, dynamic: bool) -> BodyId {
        self.bodies.push(FlatBody {
            collider,
            pos: [x, y],
            vel: [0.0, 0.0],
            angle: 0.0,
            mass,
            friction: 0.2,
            dynamic,
            active: true,
            sleeping_allowed: true,
            asleep: false,
            still_substeps: 0,
            force: [0.0, 0.0],
            anchor: [x, y],
        });
        BodyId(self.bodies.len() - 1)
    }

    pub fn add_circle(&mut self, x: f64, y: f64, r: f64, mass: f64) -> BodyId {
        self.add_body(Collider::Circle { r }, x, y, mass, true)
    }

    pub fn add_box(&mut self, x: f64, y: f64, hw: f64, hh: f64, mass: f64) -> BodyId {
        self.add_body(Collider::Box { hw, hh }, x, y, mass, true)
    }

    /// Static box spanning the full scene width with its top edge at `top_y`
    pub fn add_ground(&mut self, top_y: f64, thickness: f64) -> BodyId {
        self.add_body(
            Collider::Box {
                hw: 60.0,
                hh: thickness / 2.0,
            },
            50.0,
            top_y + thickness / 2.0,
            0.0,
            false,
        )
    }

    /// Static box, e.g. a shelf or platform
    pub fn add_static_box(&mut self, x: f64, y: f64, hw: f64, hh: f64) -> BodyId {
        self.add_body(Collider::Box { hw, hh }, x, y, 0.0, false)
    }

    /// Static enclosing frame around the given interior region
    pub fn add_frame(&mut self, min: [f64; 2], max: [f64; 2]) -> BodyId {
        let cx = (min[0] + max[0]) / 2.0;
        let cy = (min[1] + max[1]) / 2.0;
        self.add_body(Collider::Frame { min, max }, cx, cy, 0.0, false)
    }

    /// Per-body slide friction; low values keep pushed bodies sliding
    pub fn set_friction(&mut self, body: BodyId, friction: f64) {
        self.bodies[body.0].friction = friction.max(0.0);
    }

    pub fn set_velocity(&mut self, body: BodyId, vx: f64, vy: f64) {
        let b = &mut self.bodies[body.0];
        b.vel = [vx, vy];
        b.wake();
    }

    fn movable(&self, i: usize) -> bool {
        let b = &self.bodies[i];
        b.dynamic && b.active
    }

    fn overlap(&self, i: usize, j: usize) -> Option<Overlap> {
        let a = &self.bodies[i];
        let b = &self.bodies[j];
        match (&a.collider, &b.collider) {
            (Collider::Circle { r: ra }, Collider::Circle { r: rb }) => {
                let d = [a.pos[0] - b.pos[0], a.pos[1] - b.pos[1]];
                let dist = (d[0] * d[0] + d[1] * d[1]).sqrt();
                let depth = ra + rb - dist;
                if depth <= 0.0 {
                    return None;
                }
                let n = if dist > 1e-9 {
                    [d[0] / dist, d[1] / dist]
                } else {
                    [0.0, -1.0]
                };
                Some(Overlap { normal: n, depth })
            }
            (Collider::Box { hw: aw, hh: ah }, Collider::Box { hw: bw, hh: bh }) => {
                let dx = a.pos[0] - b.pos[0];
                let dy = a.pos[1] - b.pos[1];
                let ox = aw + bw - dx.abs();
                let oy = ah + bh - dy.abs();
                if ox <= 0.0 || oy <= 0.0 {
                    return None;
                }
                if ox < oy {
                    Some(Overlap {
                        normal: [dx.signum(), 0.0],
                        depth: ox,
                    })
                } else {
                    Some(Overlap {
                        normal: [0.0, dy.signum()],
                        depth: oy,
                    })
                }
            }
            (Collider::Circle { r }, Collider::Box { hw, hh }) => {
                circle_box(a.pos, *r, b.pos, *hw, *hh)
            }
            (Collider::Box { hw, hh }, Collider::Circle { r }) => {
                circle_box(b.pos, *r, a.pos, *hw, *hh).map(|o| Overlap {
                    normal: [-o.normal[0], -o.normal[1]],
                    depth: o.depth,
                })
            }
            (_, Collider::Frame { min, max }) => frame_overlap(a, *min, *max),
            (Collider::Frame { min, max }, _) => frame_overlap(b, *min, *max).map(|o| Overlap {
                normal: [-o.normal[0], -o.normal[1]],
                depth: o.depth,
            }),
        }
    }

    fn substep(&mut self) {
        // Integrate
        for b in &mut self.bodies {
            if !b.dynamic || !b.active || b.asleep {
                continue;
            }
            let ax = b.force[0] / b.mass.max(1e-9);
            let ay = self.gravity + b.force[1] / b.mass.max(1e-9);
            b.vel[0] += ax * SUBSTEP;
            b.vel[1] += ay * SUBSTEP;
            b.pos[0] += b.vel[0] * SUBSTEP;
            b.pos[1] += b.vel[1] * SUBSTEP;
        }

        // Resolve contacts
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.bodies[i].active || !self.bodies[j].active {
                    continue;
                }
                let i_mov = self.movable(i);
                let j_mov = self.movable(j);
                if !i_mov && !j_mov {
                    continue;
                }
                let Some(ov) = self.overlap(i, j) else {
                    if self.surface_distance_idx(i, j) > CONTACT_EPS {
                        self.touching.remove(&(i, j));
                    }
                    continue;
                };

                // Approach speed along the normal, before correction
                let rel = [
                    self.bodies[i].vel[0] - self.bodies[j].vel[0],
                    self.bodies[i].vel[1] - self.bodies[j].vel[1],
                ];
                let vn = rel[0] * ov.normal[0] + rel[1] * ov.normal[1];

                if !self.touching.contains(&(i, j)) && vn < -EVENT_SPEED {
                    // New contact with closing speed: a collision. The faster
                    // body is the one doing the hitting.
                    let (a, b) = if self.bodies[i].speed() >= self.bodies[j].speed() {
                        (i, j)
                    } else {
                        (j, i)
                    };
                    self.events.push(CollisionEvent {
                        a: BodyId(a),
                        b: BodyId(b),
                        dv: vn.abs(),
                    });
                }
                self.touching.insert((i, j));

                // Wake a sleeping body that something awake runs into
                if self.bodies[i].asleep && !self.bodies[j].asleep && self.bodies[j].speed() > 0.1 {
                    self.bodies[i].wake();
                }
                if self.bodies[j].asleep && !self.bodies[i].asleep && self.bodies[i].speed() > 0.1 {
                    self.bodies[j].wake();
                }

                // Positional correction
                if i_mov && j_mov {
                    for (idx, sign) in [(i, 0.5), (j, -0.5)] {
                        let b = &mut self.bodies[idx];
                        b.pos[0] += ov.normal[0] * ov.depth * sign;
                        b.pos[1] += ov.normal[1] * ov.depth * sign;
                    }
                } else {
                    let (idx, sign) = if i_mov { (i, 1.0) } else { (j, -1.0) };
                    let b = &mut self.bodies[idx];
                    b.pos[0] += ov.normal[0] * ov.depth * sign;
                    b.pos[1] += ov.normal[1] * ov.depth * sign;
                }

                // Kill the closing velocity and rub off tangential speed
                if vn < 0.0 {
                    if i_mov && j_mov {
                        for (idx, sign) in [(i, -0.5), (j, 0.5)] {
                            let b = &mut self.bodies[idx];
                            b.vel[0] += ov.normal[0] * vn * sign;
                            b.vel[1] += ov.normal[1] * vn * sign;
                        }
                    } else {
                        let (idx, sign) = if i_mov { (i, -1.0) } else { (j, 1.0) };
                        let b = &mut self.bodies[idx];
                        b.vel[0] += ov.normal[0] * vn * sign;
                        b.vel[1] += ov.normal[1] * vn * sign;
                    }
                }
                let tangent = [-ov.normal[1], ov.normal[0]];
                for idx in [i, j] {
                    if !self.movable(idx) {
                        continue;
                    }
                    let b = &mut self.bodies[idx];
                    let vt = b.vel[0] * tangent[0] + b.vel[1] * tangent[1];
                    let decay = (1.0 - b.friction * FRICTION_RATE * SUBSTEP).max(0.0);
                    let delta = vt * (1.0 - decay);
                    b.vel[0] -= tangent[0] * delta;
                    b.vel[1] -= tangent[1] * delta;
                }
            }
        }

        // Sleep bookkeeping
        for b in &mut self.bodies {
            if !b.dynamic || !b.active || b.asleep {
                continue;
            }
            if b.speed() < SLEEP_SPEED && b.force == [0.0, 0.0] {
                b.still_substeps += 1;
                if b.sleeping_allowed && b.still_substeps >= SLEEP_DELAY {
                    b.asleep = true;
                    b.vel = [0.0, 0.0];
                }
            } else {
                b.still_substeps = 0;
            }
        }

        self.time += SUBSTEP;
    }

    fn surface_distance_idx(&self, i: usize, j: usize) -> f64 {
        let a = &self.bodies[i];
        let b = &self.bodies[j];
        match (&a.collider, &b.collider) {
            (Collider::Circle { r: ra }, Collider::Circle { r: rb }) => {
                let d = ((a.pos[0] - b.pos[0]).powi(2) + (a.pos[1] - b.pos[1]).powi(2)).sqrt();
                (d - ra - rb).max(0.0)
            }
            (Collider::Box { hw: aw, hh: ah }, Collider::Box { hw: bw, hh: bh }) => {
                let gx = (a.pos[0] - b.pos[0]).abs() - (aw + bw);
                let gy = (a.pos[1] - b.pos[1]).abs() - (ah + bh);
                if gx <= 0.0 && gy <= 0.0 {
                    0.0
                } else {
                    (gx.max(0.0).powi(2) + gy.max(0.0).powi(2)).sqrt()
                }
            }
            (Collider::Circle { r }, Collider::Box { hw, hh }) => {
                point_box_distance(a.pos, b.pos, *hw, *hh) - r
            }
            (Collider::Box { hw, hh }, Collider::Circle { r }) => {
                point_box_distance(b.pos, a.pos, *hw, *hh) - r
            }
            (_, Collider::Frame { min, max }) => frame_distance(a, *min, *max),
            (Collider::Frame { min, max }, _) => frame_distance(b, *min, *max),
        }
        .max(0.0)
    }
}

fn circle_box(cpos: [f64; 2], r: f64, bpos: [f64; 2], hw: f64, hh: f64) -> Option<Overlap> {
    let closest = [
        cpos[0].clamp(bpos[0] - hw, bpos[0] + hw),
        cpos[1].clamp(bpos[1] - hh, bpos[1] + hh),
    ];
    let d = [cpos[0] - closest[0], cpos[1] - closest[1]];
    let dist = (d[0] * d[0] + d[1] * d[1]).sqrt();
    if dist >= r {
        return None;
    }
    let normal = if dist > 1e-9 {
        [d[0] / dist, d[1] / dist]
    } else {
        // Center inside the box: push along the shallower axis
        let px = hw - (cpos[0] - bpos[0]).abs();
        let py = hh - (cpos[1] - bpos[1]).abs();
        if px < py {
            [(cpos[0] - bpos[0]).signum(), 0.0]
        } else {
            [0.0, (cpos[1] - bpos[1]).signum()]
        }
    };
    Some(Overlap {
        normal,
        depth: r - dist,
    })
}

fn body_extents(b: &FlatBody) -> ([f64; 2], [f64; 2]) {
    match &b.collider {
        Collider::Circle { r } => ([b.pos[0] - r, b.pos[1] - r], [b.pos[0] + r, b.pos[1] + r]),
        Collider::Box { hw, hh } => (
            [b.pos[0] - hw, b.pos[1] - hh],
            [b.pos[0] + hw, b.pos[1] + hh],
        ),
        Collider::Frame { min, max } => (*min, *max),
    }
}

/// Deepest wall penetration of a body escaping the frame interior
fn frame_overlap(b: &FlatBody, min: [f64; 2], max: [f64; 2]) -> Option<Overlap> {
    let (bmin, bmax) = body_extents(b);
    let mut best: Option<Overlap> = None;
    let walls = [
        // (penetration depth, inward normal)
        (min[0] - bmin[0], [1.0, 0.0]),
        (bmax[0] - max[0], [-1.0, 0.0]),
        (min[1] - bmin[1], [0.0, 1.0]),
        (bmax[1] - max[1], [0.0, -1.0]),
    ];
    for (depth, normal) in walls {
        if depth > 0.0 && best.as_ref().map_or(true, |o| depth > o.depth) {
            best = Some(Overlap { normal, depth });
        }
    }
    best
}

/// Distance from a body's surface to the nearest frame wall
fn frame_distance(b: &FlatBody, min: [f64; 2], max: [f64; 2]) -> f64 {
    let (bmin, bmax) = body_extents(b);
    let gaps = [
        bmin[0] - min[0],
        max[0] - bmax[0],
        bmin[1] - min[1],
        max[1] - bmax[1],
    ];
    gaps.into_iter().fold(f64::INFINITY, f64::min)
}

fn point_box_distance(p: [f64; 2], bpos: [f64; 2], hw: f64, hh: f64) -> f64 {
    let dx = ((p[0] - bpos[0]).abs() - hw).max(0.0);
    let dy = ((p[1] - bpos[1]).abs() - hh).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

impl PhysicsWorld for FlatWorld {
    fn step(&mut self, dt: f64) {
        let steps = (dt / SUBSTEP).round().max(1.0) as usize;
        for _ in 0..steps {
            self.substep();
        }
    }

    fn settled(&self) -> bool {
        self.bodies
            .iter()
            .filter(|b| b.dynamic && b.active)
            .all(|b| b.asleep)
    }

    fn wake_all(&mut self) {
        for b in &mut self.bodies {
            if b.dynamic && b.active {
                b.wake();
            }
        }
    }

    fn save_snapshot(&mut self) -> SnapshotId {
        for b in &mut self.bodies {
            b.anchor = b.pos;
        }
        let id = self.next_snapshot;
        self.next_snapshot += 1;
        self.snapshots.insert(
            id,
            SavedState {
                bodies: self.bodies.clone(),
                touching: self.touching.clone(),
                time: self.time,
            },
        );
        SnapshotId(id)
    }

    fn restore_snapshot(&mut self, id: SnapshotId) {
        if let Some(state) = self.snapshots.get(&id.0) {
            self.bodies = state.bodies.clone();
            self.touching = state.touching.clone();
            self.time = state.time;
            self.events.clear();
        }
    }

    fn discard_snapshot(&mut self, id: SnapshotId) {
        self.snapshots.remove(&id.0);
    }

    fn is_static(&self, body: BodyId) -> bool {
        !self.bodies[body.0].dynamic
    }

    fn is_active(&self, body: BodyId) -> bool {
        self.bodies[body.0].active
    }

    fn linear_speed(&self, body: BodyId) -> f64 {
        self.bodies[body.0].speed()
    }

    fn angle(&self, body: BodyId) -> f64 {
        self.bodies[body.0].angle
    }

    fn position(&self, body: BodyId) -> [f64; 2] {
        self.bodies[body.0].pos
    }

    fn mass(&self, body: BodyId) -> f64 {
        self.bodies[body.0].mass
    }

    fn apply_force(&mut self, body: BodyId, fx: f64, fy: f64) {
        let b = &mut self.bodies[body.0];
        b.force = [fx, fy];
        b.wake();
    }

    fn clear_force(&mut self, body: BodyId) {
        self.bodies[body.0].force = [0.0, 0.0];
    }

    fn apply_impulse(&mut self, body: BodyId, ix: f64, iy: f64) {
        let b = &mut self.bodies[body.0];
        if b.dynamic && b.active {
            b.vel[0] += ix / b.mass.max(1e-9);
            b.vel[1] += iy / b.mass.max(1e-9);
            b.wake();
        }
    }

    fn set_sleeping_allowed(&mut self, body: BodyId, allowed: bool) {
        let b = &mut self.bodies[body.0];
        b.sleeping_allowed = allowed;
        if !allowed {
            b.wake();
        }
    }

    fn set_active(&mut self, body: BodyId, active: bool) {
        self.bodies[body.0].active = active;
    }

    fn make_static(&mut self, body: BodyId) {
        let b = &mut self.bodies[body.0];
        b.dynamic = false;
        b.vel = [0.0, 0.0];
    }

    fn make_dynamic(&mut self, body: BodyId) {
        self.bodies[body.0].dynamic = true;
    }

    fn dynamic_bodies(&self) -> Vec<BodyId> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| b.dynamic)
            .map(|(i, _)| BodyId(i))
            .collect()
    }

    fn surface_distance(&self, a: BodyId, b: BodyId) -> f64 {
        self.surface_distance_idx(a.0, b.0)
    }

    fn distance_moved(&self, body: BodyId) -> f64 {
        let b = &self.bodies[body.0];
        ((b.pos[0] - b.anchor[0]).powi(2) + (b.pos[1] - b.anchor[1]).powi(2)).sqrt()
    }

    fn contacts(&self, body: BodyId) -> Vec<Contact> {
        let mut out = Vec::new();
        for j in 0..self.bodies.len() {
            if j == body.0 || !self.bodies[j].active || !self.bodies[body.0].active {
                continue;
            }
            if self.surface_distance_idx(body.0, j) > CONTACT_EPS {
                continue;
            }
            let pts = match (&self.bodies[body.0].collider, &self.bodies[j].collider) {
                (_, Collider::Frame { min, max }) => {
                    frame_contact_points(&self.bodies[body.0], *min, *max)
                }
                (Collider::Frame { min, max }, _) => {
                    frame_contact_points(&self.bodies[j], *min, *max)
                }
                _ => {
                    let a = &self.bodies[body.0];
                    let b = &self.bodies[j];
                    vec![[(a.pos[0] + b.pos[0]) / 2.0, (a.pos[1] + b.pos[1]) / 2.0]]
                }
            };
            out.push(Contact {
                body: BodyId(j),
                pts,
            });
        }
        out
    }

    fn drain_collision_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Points where a body touches the frame walls
fn frame_contact_points(b: &FlatBody, min: [f64; 2], max: [f64; 2]) -> Vec<[f64; 2]> {
    let (bmin, bmax) = body_extents(b);
    let mut pts = Vec::new();
    if bmin[0] - min[0] <= CONTACT_EPS {
        pts.push([min[0], b.pos[1]]);
    }
    if max[0] - bmax[0] <= CONTACT_EPS {
        pts.push([max[0], b.pos[1]]);
    }
    if bmin[1] - min[1] <= CONTACT_EPS {
        pts.push([b.pos[0], min[1]]);
    }
    if max[1] - bmax[1] <= CONTACT_EPS {
        pts.push([b.pos[0], max[1]]);
    }
    pts
}
