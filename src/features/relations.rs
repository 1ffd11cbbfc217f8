//! Binary object relations: direction, proximity, contact, collision history,
//! and the counterfactual `supports`.

use serde::Serialize;

use crate::error::{SceneError, SceneResult};
use crate::geom::Shape;
use crate::math::{close_membership, far_membership, touch_membership};
use crate::oracle::Oracle;

use super::dynamics::{moves_activity, stability_kind};
use super::spatial::{SpatialAnalyzer, SpatialDir};
use super::{Percept, SceneView};

fn analyzer() -> SpatialAnalyzer {
    SpatialAnalyzer::default()
}

fn directional(
    key: &'static str,
    view: &SceneView,
    a: usize,
    b: usize,
    dir: SpatialDir,
) -> Percept {
    let val = analyzer().relation_value(view.shape(a), view.shape(b), dir);
    Percept::rel(key, key, val, val, b)
}

pub(super) fn left_of(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(directional("left_of", view, a, b, SpatialDir::Left))
}

pub(super) fn right_of(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(directional("right_of", view, a, b, SpatialDir::Right))
}

pub(super) fn above(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(directional("above", view, a, b, SpatialDir::Above))
}

pub(super) fn below(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(directional("below", view, a, b, SpatialDir::Below))
}

pub(super) fn beside(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    let an = analyzer();
    let left = an.relation_value(view.shape(a), view.shape(b), SpatialDir::Left);
    let right = an.relation_value(view.shape(a), view.shape(b), SpatialDir::Right);
    let val = left.max(right);
    Ok(Percept::rel("beside", "beside", val, val, b))
}

/// Surface distance in physics units
fn phys_distance(view: &SceneView, oracle: &Oracle, a: usize, b: usize) -> f64 {
    oracle.surface_distance(view.shape(a).body, view.shape(b).body)
}

pub(super) fn touch_activity(view: &SceneView, oracle: &Oracle, a: usize, b: usize) -> f64 {
    let threshold = oracle.config().touch_distance;
    touch_membership(phys_distance(view, oracle, a, b), threshold)
}

pub(super) fn touch(view: &SceneView, oracle: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    let d = phys_distance(view, oracle, a, b);
    let act = touch_membership(d, oracle.config().touch_distance);
    Ok(Percept::rel("touch", "touch", act, d, b))
}

pub(super) fn close(view: &SceneView, oracle: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    let d = phys_distance(view, oracle, a, b) * view.shape(a).phys_scale;
    Ok(Percept::rel("close", "close", close_membership(d), d, b))
}

pub(super) fn far(view: &SceneView, oracle: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    let d = phys_distance(view, oracle, a, b) * view.shape(a).phys_scale;
    Ok(Percept::rel("far", "far", far_membership(d), d, b))
}

/// Degraded proximity for shapes living in different scenes: no engine can
/// measure across simulators, so fall back to ⅔ of the center distance.
pub fn cross_scene_close(a: &Shape, b: &Shape) -> Percept {
    let d = a.center_distance(b) * 2.0 / 3.0;
    Percept::attr("close", "close", close_membership(d), d)
}

fn collision_percept(
    key: &'static str,
    view: &SceneView,
    a: usize,
    b: usize,
    matches: impl Fn(usize, usize) -> bool,
) -> Percept {
    let max_dv = view
        .collisions
        .iter()
        .filter(|c| matches(c.a, c.b))
        .map(|c| c.dv)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_dv.is_finite() {
        Percept::rel(key, key, 1.0, max_dv, b)
    } else {
        Percept::rel(key, key, 0.0, 0.0, b)
    }
}

pub(super) fn hits(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(collision_percept("hits", view, a, b, |ca, cb| ca == a && cb == b))
}

pub(super) fn gets_hit(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(collision_percept("gets_hit", view, a, b, |ca, cb| ca == b && cb == a))
}

pub(super) fn collides(view: &SceneView, _o: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    Ok(collision_percept("collides", view, a, b, |ca, cb| {
        (ca == a && cb == b) || (ca == b && cb == a)
    }))
}

pub(super) fn on_top_of(view: &SceneView, oracle: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    let val = on_top_of_value(view, oracle, a, b);
    Ok(Percept::rel("on_top_of", "on_top_of", val, val, b))
}

fn on_top_of_value(view: &SceneView, oracle: &Oracle, a: usize, b: usize) -> f64 {
    let an = analyzer();
    let sa = view.shape(a);
    let sb = view.shape(b);
    let above_ab = an.relation_value(sa, sb, SpatialDir::Above);
    let below_ba = an.relation_value(sb, sa, SpatialDir::Below);
    touch_activity(view, oracle, a, b) * above_ab.max(below_ba)
}

/// The four support levels and their fixed activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupportKind {
    Directly,
    Indirectly,
    Stabilizes,
    Not,
}

impl SupportKind {
    pub fn label(self) -> &'static str {
        match self {
            SupportKind::Directly => "directly",
            SupportKind::Indirectly => "indirectly",
            SupportKind::Stabilizes => "stabilizes",
            SupportKind::Not => "not",
        }
    }

    pub fn activity(self) -> f64 {
        match self {
            SupportKind::Directly => 1.0,
            SupportKind::Indirectly => 0.7,
            SupportKind::Stabilizes => 0.4,
            SupportKind::Not => 0.0,
        }
    }

    /// Reverse mapping; anything off the four levels is a bug
    pub fn from_activity(v: f64) -> SceneResult<Self> {
        match v {
            v if v == 1.0 => Ok(SupportKind::Directly),
            v if v == 0.7 => Ok(SupportKind::Indirectly),
            v if v == 0.4 => Ok(SupportKind::Stabilizes),
            v if v == 0.0 => Ok(SupportKind::Not),
            other => Err(SceneError::UnknownSupportValue(other)),
        }
    }
}

/// Does A hold B up? Counterfactually remove A and watch B.
///
/// `not` if A is B or B already moves. Otherwise deactivate A inside a
/// zero-time sandbox and reperceive `moves(B)`: if B now moves, A supports it
/// `directly` when they touch, else `indirectly`. If B does not depend on A,
/// A may still `stabilize` B: when B rests on top of A, or when a close A
/// turns out to be the difference between B stable and B unstable.
pub(super) fn supports(view: &SceneView, oracle: &mut Oracle, a: usize, b: usize) -> SceneResult<Percept> {
    let kind = support_kind(view, oracle, a, b);
    Ok(Percept::rel("supports", kind.label(), kind.activity(), kind.activity(), b))
}

fn support_kind(view: &SceneView, oracle: &mut Oracle, a: usize, b: usize) -> SupportKind {
    if a == b {
        return SupportKind::Not;
    }
    let threshold = oracle.config().activation_threshold;
    if moves_activity(view, oracle, b) >= threshold {
        return SupportKind::Not;
    }

    let a_body = view.shape(a).body;
    let b_moves_without_a = oracle.analyze_future(
        0.0,
        Some(&mut |o: &mut Oracle| {
            o.set_active(a_body, false);
            o.wake_up();
        }),
        |o| moves_activity(view, o, b),
    );
    if b_moves_without_a >= threshold {
        return if touch_activity(view, oracle, a, b) >= threshold {
            SupportKind::Directly
        } else {
            SupportKind::Indirectly
        };
    }

    // B does not depend on A for holding still
    if on_top_of_value(view, oracle, b, a) >= threshold {
        return SupportKind::Stabilizes;
    }
    let d = phys_distance(view, oracle, a, b) * view.shape(a).phys_scale;
    if close_membership(d) >= threshold {
        let b_stable = stability_kind(view, oracle, b).label() == "stable";
        if b_stable {
            let still_stable = oracle.analyze_future(
                0.0,
                Some(&mut |o: &mut Oracle| {
                    o.set_active(a_body, false);
                    o.wake_up();
                }),
                |o| stability_kind(view, o, b).label() == "stable",
            );
            if !still_stable {
                return SupportKind::Stabilizes;
            }
        }
    }
    SupportKind::Not
}
