//! Static object attributes: shape class, size, position, extrema, company.

use serde::Serialize;

use crate::error::{SceneError, SceneResult};
use crate::geom::Shape;
use crate::math::{close_membership, sigmoid, touch_membership};
use crate::oracle::Oracle;

use super::{Percept, SceneView};

/// Result of geometric shape classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShapeClass {
    Circle,
    Triangle,
    Rectangle,
    Square,
    Unknown,
}

impl ShapeClass {
    pub fn label(self) -> &'static str {
        match self {
            ShapeClass::Circle => "circle",
            ShapeClass::Triangle => "triangle",
            ShapeClass::Rectangle => "rectangle",
            ShapeClass::Square => "square",
            ShapeClass::Unknown => "unknown",
        }
    }
}

/// Classify a shape geometrically.
///
/// Triangle: closed polygon with 3 points. Rectangle: closed polygon with 4
/// points, every corner angle within [70°, 110°]. Square: a rectangle whose
/// shortest/longest edge ratio is at least 0.7.
pub fn classify(s: &Shape) -> ShapeClass {
    if s.is_circle() {
        return ShapeClass::Circle;
    }
    if !s.is_closed() {
        return ShapeClass::Unknown;
    }
    match s.vertex_count() {
        3 => ShapeClass::Triangle,
        4 => {
            let right_angled = (0..4).all(|i| {
                let a = s.angle(i);
                (70.0..=110.0).contains(&a)
            });
            if !right_angled {
                return ShapeClass::Unknown;
            }
            let lengths = s.edge_lengths(true);
            let ratio = lengths[0] / lengths[3].max(1e-12);
            if ratio >= 0.7 {
                ShapeClass::Square
            } else {
                ShapeClass::Rectangle
            }
        }
        _ => ShapeClass::Unknown,
    }
}

pub(super) fn shape(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let class = classify(view.shape(obj));
    let activity = if class == ShapeClass::Unknown { 0.0 } else { 1.0 };
    Ok(Percept::attr("shape", class.label(), activity, activity))
}

pub(super) fn circle(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let act = if classify(view.shape(obj)) == ShapeClass::Circle {
        1.0
    } else {
        0.0
    };
    Ok(Percept::attr("circle", "circle", act, act))
}

pub(super) fn square(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let act = if classify(view.shape(obj)) == ShapeClass::Square {
        1.0
    } else {
        0.0
    };
    Ok(Percept::attr("square", "square", act, act))
}

pub(super) fn rect(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    // A square still reads as a weak rectangle
    let act = match classify(view.shape(obj)) {
        ShapeClass::Rectangle => 1.0,
        ShapeClass::Square => 0.4,
        _ => 0.0,
    };
    Ok(Percept::attr("rect", "rect", act, act))
}

pub(super) fn triangle(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let act = if classify(view.shape(obj)) == ShapeClass::Triangle {
        1.0
    } else {
        0.0
    };
    Ok(Percept::attr("triangle", "triangle", act, act))
}

/// Area as percent of the 100×100 scene
fn area_percent(s: &Shape) -> f64 {
    s.area() / 10_000.0 * 100.0
}

pub(super) fn small(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let pct = area_percent(view.shape(obj));
    Ok(Percept::attr("small", "small", 1.0 - sigmoid(4.0, 1.8, pct), pct))
}

pub(super) fn large(view: &SceneView, _oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let pct = area_percent(view.shape(obj));
    Ok(Percept::attr("large", "large", sigmoid(4.0, 2.0, pct), pct))
}

fn current_x(view: &SceneView, oracle: &Oracle, obj: usize) -> f64 {
    let s = view.shape(obj);
    oracle.position(s.body)[0] * s.phys_scale
}

fn current_y(view: &SceneView, oracle: &Oracle, obj: usize) -> f64 {
    let s = view.shape(obj);
    oracle.position(s.body)[1] * s.phys_scale
}

pub(super) fn left_pos(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let x = current_x(view, oracle, obj);
    Ok(Percept::attr("left_pos", "left", 1.0 - sigmoid(20.0, 0.4, x / 100.0), x))
}

pub(super) fn right_pos(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let from_right = 100.0 - current_x(view, oracle, obj);
    Ok(Percept::attr(
        "right_pos",
        "right",
        1.0 - sigmoid(20.0, 0.4, from_right / 100.0),
        from_right,
    ))
}

/// Lowest reachable y: the top surface of the ground, or the scene bottom
fn max_y(view: &SceneView) -> f64 {
    match view.ground {
        Some(g) => {
            let s = view.shape(g);
            let bb = s.bounding_box();
            s.y + bb.y + bb.height
        }
        None => 100.0,
    }
}

pub(super) fn top_pos(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let y = current_y(view, oracle, obj);
    let maxy = max_y(view);
    Ok(Percept::attr("top_pos", "top", 1.0 - sigmoid(20.0, 0.45, y / maxy), y))
}

pub(super) fn bottom_pos(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let maxy = max_y(view);
    let from_bottom = maxy - current_y(view, oracle, obj);
    Ok(Percept::attr(
        "bottom_pos",
        "bottom",
        1.0 - sigmoid(20.0, 0.3, from_bottom / maxy),
        from_bottom,
    ))
}

/// Fuzzy "this object sits at the extremum" along an axis
fn most_percept(
    key: &'static str,
    label: &'static str,
    val: f64,
    extremum: f64,
) -> Percept {
    let act = close_membership(2.5 * (val - extremum).abs());
    Percept::attr(key, label, act, val)
}

fn extremum_over_movables(
    view: &SceneView,
    oracle: &Oracle,
    axis_x: bool,
    take_min: bool,
    key: &'static str,
) -> SceneResult<f64> {
    if view.movables.is_empty() {
        return Err(SceneError::NoObjects(key));
    }
    let vals = view.movables.iter().map(|&i| {
        if axis_x {
            current_x(view, oracle, i)
        } else {
            current_y(view, oracle, i)
        }
    });
    Ok(if take_min {
        vals.fold(f64::INFINITY, f64::min)
    } else {
        vals.fold(f64::NEG_INFINITY, f64::max)
    })
}

pub(super) fn left_most(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let min_x = extremum_over_movables(view, oracle, true, true, "left_most")?;
    Ok(most_percept("left_most", "left_most", current_x(view, oracle, obj), min_x))
}

pub(super) fn right_most(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let max_x = extremum_over_movables(view, oracle, true, false, "right_most")?;
    Ok(most_percept("right_most", "right_most", current_x(view, oracle, obj), max_x))
}

pub(super) fn top_most(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    // y grows downward: topmost is the smallest y
    let min_y = extremum_over_movables(view, oracle, false, true, "top_most")?;
    Ok(most_percept("top_most", "top_most", current_y(view, oracle, obj), min_y))
}

pub(super) fn single(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let s = view.shape(obj);
    let nearest = view
        .movables
        .iter()
        .filter(|&&i| i != obj)
        .map(|&i| oracle.surface_distance(s.body, view.shape(i).body))
        .fold(f64::INFINITY, f64::min);
    if nearest.is_infinite() {
        // Nothing else in the scene: maximally single
        return Ok(Percept::attr("single", "single", 1.0, nearest));
    }
    let scene_dist = nearest * s.phys_scale;
    let touch_dist = oracle.config().touch_distance;
    let act = (sigmoid(40.0, 0.03, scene_dist / 100.0) - touch_membership(nearest, touch_dist))
        .clamp(0.0, 1.0);
    Ok(Percept::attr("single", "single", act, nearest))
}

pub(super) fn on_ground(view: &SceneView, oracle: &mut Oracle, obj: usize) -> SceneResult<Percept> {
    let act = match view.ground {
        Some(g) => {
            let d = oracle.surface_distance(view.shape(obj).body, view.shape(g).body);
            touch_membership(d, oracle.config().touch_distance)
        }
        None => 0.0,
    };
    Ok(Percept::attr("on_ground", "on_ground", act, act))
}
