//! ═══════════════════════════════════════════════════════════════════════════════
//! MATH — Graded Membership Primitives
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Every feature in the library reports an activity in [0,1] produced by one
//! of the sigmoid memberships below. The convention throughout:
//!
//!   σ(k, m, x) = 1 / (1 + exp(k·(m − x)))
//!
//! rising in x, with midpoint m and steepness k. Distances are fed in scene
//! units (the scene is 100×100) and normalized to scene fraction inside the
//! membership.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::cmp::Ordering;

/// Rising sigmoid with midpoint `m` and steepness `k`
pub fn sigmoid(k: f64, m: f64, x: f64) -> f64 {
    1.0 / (1.0 + (k * (m - x)).exp())
}

/// Membership of "the surface distance d (scene units) is close"
pub fn close_membership(d: f64) -> f64 {
    1.0 - sigmoid(30.0, 0.2, d / 100.0)
}

/// Membership of "the surface distance d (scene units) is far"
pub fn far_membership(d: f64) -> f64 {
    sigmoid(20.0, 0.25, d / 100.0)
}

/// Crisp touch membership: within `threshold` scene units of contact
pub fn touch_membership(d: f64, threshold: f64) -> f64 {
    if d <= threshold {
        1.0
    } else {
        0.0
    }
}

/// Membership of "the linear speed v (scene units/s) counts as moving"
pub fn motion_membership(v: f64) -> f64 {
    sigmoid(40.0, 0.1, v)
}

/// Total order over f64 for max-by selection; NaN sorts first
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Less)
}
