//! Counterfactual object attributes: motion, support, stability, liftability.
//!
//! Each probe runs inside `Oracle::analyze_future`, so nothing it does to the
//! simulator survives the call. A probe never fails: bodies the simulator
//! cannot meaningfully perturb short-circuit to a defined fallback.

use serde::Serialize;

use crate::error::SceneResult;
use crate::math::motion_membership;
use crate::oracle::{Direction, Magnitude, Oracle};

use super::{Percept, SceneView};

/// Speed above which an object counts as already moving (scene units/s)
const MOVING_SPEED: f64 = 0.25;
/// Post-push speed limit for a stable body
const STABLE_SPEED: f64 = 0.4;
/// Post-push travel limit for a stable body (scene units)
const STABLE_TRAVEL: f64 = 0.2;
/// Post-push rotation limit, degrees
const STABLE_ROTATION: f64 = 9.0;
/// Rotation limit for circles, degrees (rolling in place is fine)
const STABLE_ROTATION_CIRCLE: f64 = 60.0;
/// Threshold relaxation for the small-push retry
const RETRY_FACTOR: f64 = 2.0 / 3.0;

/// Current speed in scene units per second
fn scene_speed(view: &SceneView, oracle: &Oracle, obj: usize) -> f64 {
    let s = view.shape(obj);
    oracle.linear_speed(s.body) * s.phys_scale
}

/// Membership of "this object moves", now or within the probe lookahead
pub(super) fn moves_activity(view: &SceneView, oracle: &mut Oracle, obj: usize) -> f64 {
    let dt = oracle.config().motion_probe_dt;
    let now = motion_membership(scene_speed(view, oracle, obj));
    let future = oracle.analyze_future(dt, None, |o| motion_membership(scene_speed(view, o, obj)));
    now.max(future)
}

pub(super) fn moves(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let act = moves_activity(view, oracle, obj);
    Ok(Percept::attr("moves", "moves", act, act))
}

/// Motion membership with every other dynamic body frozen in place
pub(super) fn is_supported(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let dt = oracle.config().motion_probe_dt;
    let body = view.shape(obj).body;
    let now = motion_membership(scene_speed(view, oracle, obj));
    let future = oracle.analyze_future(
        dt,
        Some(&mut |o: &mut Oracle| {
            let mut frozen = Vec::new();
            o.for_each_dynamic_body(|b| {
                if b != body {
                    frozen.push(b);
                }
            });
            for b in frozen {
                o.make_static(b);
            }
            o.wake_up();
        }),
        |o| motion_membership(scene_speed(view, o, obj)),
    );
    let act = now.max(future);
    Ok(Percept::attr("is_supported", "supported", act, act))
}

/// Fine-grained stability verdict; the label collapses to stable/unstable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StabilityKind {
    Moving,
    Unstable,
    SlightlyUnstable,
    Stable,
}

impl StabilityKind {
    /// Reported label: slight instability still reads as stable
    pub fn label(self) -> &'static str {
        match self {
            StabilityKind::Stable | StabilityKind::SlightlyUnstable => "stable",
            StabilityKind::Unstable | StabilityKind::Moving => "unstable",
        }
    }

    /// Degree to which the reported label applies
    pub fn activity(self) -> f64 {
        match self {
            StabilityKind::Stable => 1.0,
            StabilityKind::SlightlyUnstable => 0.7,
            StabilityKind::Unstable => 1.0,
            StabilityKind::Moving => 1.0,
        }
    }
}

/// Push the object sideways and watch whether it settles back
fn push_survives(
    view: &SceneView,
    oracle: &mut Oracle,
    obj: usize,
    dir: Direction,
    mag: Magnitude,
    relax: f64,
) -> bool {
    let s = view.shape(obj);
    let body = s.body;
    let scale = s.phys_scale;
    let dt = oracle.config().stability_probe_dt;
    let angle_before = oracle.angle(body);
    let rotation_limit = if s.is_circle() {
        STABLE_ROTATION_CIRCLE
    } else {
        STABLE_ROTATION
    } * relax;

    oracle.analyze_future(
        dt,
        Some(&mut |o: &mut Oracle| {
            o.apply_central_impulse(body, dir, mag);
        }),
        |o| {
            let speed = o.linear_speed(body) * scale;
            let travel = o.body_distance(body) * scale;
            let rotation = (o.angle(body) - angle_before).to_degrees().abs();
            speed < STABLE_SPEED * relax && travel < STABLE_TRAVEL * relax && rotation < rotation_limit
        },
    )
}

pub(super) fn stability_kind(view: &SceneView, oracle: &mut Oracle, obj: usize) -> StabilityKind {
    let body = view.shape(obj).body;
    if oracle.is_static(body) {
        return StabilityKind::Stable;
    }
    if scene_speed(view, oracle, obj) > MOVING_SPEED {
        return StabilityKind::Moving;
    }
    let survives_both = |o: &mut Oracle, mag: Magnitude, relax: f64| {
        push_survives(view, o, obj, Direction::Left, mag, relax)
            && push_survives(view, o, obj, Direction::Right, mag, relax)
    };
    if survives_both(oracle, Magnitude::Medium, 1.0) {
        StabilityKind::Stable
    } else if survives_both(oracle, Magnitude::Small, RETRY_FACTOR) {
        StabilityKind::SlightlyUnstable
    } else {
        StabilityKind::Unstable
    }
}

pub(super) fn stability(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let kind = stability_kind(view, oracle, obj);
    let mut p = Percept::attr("stability", kind.label(), kind.activity(), 0.0);
    p.value = match kind {
        StabilityKind::Moving => 0.0,
        StabilityKind::Unstable => 1.0,
        StabilityKind::SlightlyUnstable => 2.0,
        StabilityKind::Stable => 3.0,
    };
    Ok(p)
}

/// Can the object be pushed up and out: lift it hard for a while, then check
/// whether it ended pinned against the top of the frame.
pub(super) fn can_move_up(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let s = view.shape(obj);
    let body = s.body;
    let Some(frame) = view.frame else {
        return Ok(Percept::attr("can_move_up", "can_move_up", 0.0, 0.0));
    };
    if oracle.is_static(body) {
        return Ok(Percept::attr("can_move_up", "can_move_up", 0.0, 0.0));
    }
    let frame_shape = view.shape(frame);
    let frame_bb = frame_shape.bounding_box();
    let frame_top = frame_shape.y + frame_bb.y;
    let dt = oracle.config().lift_probe_dt;
    let force = oracle.config().lift_force_factor * oracle.mass(body);
    let scale = s.phys_scale;

    let reached_top = oracle.analyze_future(
        dt,
        Some(&mut |o: &mut Oracle| {
            o.set_sleeping_allowed(body, false);
            o.apply_force(body, 0.0, -force);
        }),
        |o| {
            o.touched_bodies_with_pos(body)
                .into_iter()
                .filter(|c| c.body == frame_shape.body)
                .flat_map(|c| c.pts)
                .any(|p| p[1] * scale < frame_top + 0.1)
        },
    );
    let act = if reached_top { 1.0 } else { 0.0 };
    Ok(Percept::attr("can_move_up", "can_move_up", act, act))
}
