//! ═══════════════════════════════════════════════════════════════════════════════
//! FEATURES — Graded Perception Library
//! ═══════════════════════════════════════════════════════════════════════════════
//! Every feature is a small perception module producing an activity in [0,1]
//! and a label. Features are classified along four axes: target (object or
//! group), arity (1 or 2), constancy (independent of simulator time) and, for
//! relations, symmetry. The three registries below are the typed rendition of
//! the classic prototype tables: static descriptor slices populated at
//! compile time, one evaluator function per feature.
//! ═══════════════════════════════════════════════════════════════════════════════

mod attrs;
mod dynamics;
mod groups;
mod relations;
mod spatial;

pub use attrs::ShapeClass;
pub use dynamics::StabilityKind;
pub use relations::{cross_scene_close, SupportKind};
pub use spatial::{SpatialAnalyzer, SpatialDir};

use serde::Serialize;

use crate::error::{SceneError, SceneResult};
use crate::geom::Shape;
use crate::oracle::Oracle;

/// The state key constant features are cached under
pub const START_TIME: &str = "start";

/// A collision recorded for one scene, in shape indices
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Collision {
    pub a: usize,
    pub b: usize,
    /// Relative speed at contact
    pub dv: f64,
}

/// A computed feature value: label plus graded activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percept {
    pub key: &'static str,
    /// Stable for the percept's lifetime
    pub label: String,
    /// Membership in [0,1]; ≥ threshold means the label applies
    pub activity: f64,
    /// Raw measured value behind the activity
    pub value: f64,
    /// Partner shape index for relations
    pub other: Option<usize>,
}

impl Percept {
    pub fn attr(key: &'static str, label: impl Into<String>, activity: f64, value: f64) -> Self {
        Self {
            key,
            label: label.into(),
            activity,
            value,
            other: None,
        }
    }

    pub fn rel(
        key: &'static str,
        label: impl Into<String>,
        activity: f64,
        value: f64,
        other: usize,
    ) -> Self {
        Self {
            key,
            label: label.into(),
            activity,
            value,
            other: Some(other),
        }
    }

    pub fn get_activity(&self) -> f64 {
        self.activity
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }
}

/// Immutable view of one scene, handed to every evaluator alongside the
/// oracle. Splitting the two lets sandboxed closures re-enter evaluators
/// while the oracle is mutably held by `analyze_future`.
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub shapes: &'a [Shape],
    /// Indices of movable shapes
    pub movables: &'a [usize],
    pub ground: Option<usize>,
    pub frame: Option<usize>,
    pub collisions: &'a [Collision],
}

impl<'a> SceneView<'a> {
    pub fn shape(&self, idx: usize) -> &'a Shape {
        &self.shapes[idx]
    }
}

/// Perception target of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    Obj,
    Group,
}

pub type ObjAttrEval = fn(&SceneView, &mut Oracle, usize) -> SceneResult<Percept>;
pub type ObjRelEval = fn(&SceneView, &mut Oracle, usize, usize) -> SceneResult<Percept>;
pub type GroupAttrEval = fn(&SceneView, &mut Oracle, &[usize]) -> SceneResult<Percept>;

/// How a feature is evaluated
pub enum Eval {
    Attr(ObjAttrEval),
    Rel(ObjRelEval),
    Group(GroupAttrEval),
}

/// Static metadata plus constructor for one feature
pub struct FeatureDescriptor {
    pub key: &'static str,
    pub arity: u8,
    pub target: Target,
    /// Constant features resolve against "start" regardless of requested time
    pub constant: bool,
    /// Relations only: value is direction-independent
    pub symmetric: bool,
    /// Hook for relations that accept a group partner. No relation in the
    /// default registry sets it; `perceive` honors it anyway.
    pub group_partner: bool,
    pub eval: Eval,
}

macro_rules! attr {
    ($key:literal, constant: $c:expr, $f:path) => {
        FeatureDescriptor {
            key: $key,
            arity: 1,
            target: Target::Obj,
            constant: $c,
            symmetric: false,
            group_partner: false,
            eval: Eval::Attr($f),
        }
    };
}

macro_rules! rel {
    ($key:literal, constant: $c:expr, symmetric: $s:expr, $f:path) => {
        FeatureDescriptor {
            key: $key,
            arity: 2,
            target: Target::Obj,
            constant: $c,
            symmetric: $s,
            group_partner: false,
            eval: Eval::Rel($f),
        }
    };
}

macro_rules! group_attr {
    ($key:literal, constant: $c:expr, $f:path) => {
        FeatureDescriptor {
            key: $key,
            arity: 1,
            target: Target::Group,
            constant: $c,
            symmetric: false,
            group_partner: false,
            eval: Eval::Group($f),
        }
    };
}

/// Object attributes, keyed as the selectors refer to them
pub static OBJ_ATTRS: &[FeatureDescriptor] = &[
    attr!("shape", constant: true, attrs::shape),
    attr!("circle", constant: true, attrs::circle),
    attr!("square", constant: true, attrs::square),
    attr!("rect", constant: true, attrs::rect),
    attr!("triangle", constant: true, attrs::triangle),
    attr!("small", constant: true, attrs::small),
    attr!("large", constant: true, attrs::large),
    attr!("left_pos", constant: false, attrs::left_pos),
    attr!("right_pos", constant: false, attrs::right_pos),
    attr!("top_pos", constant: false, attrs::top_pos),
    attr!("bottom_pos", constant: false, attrs::bottom_pos),
    attr!("left_most", constant: false, attrs::left_most),
    attr!("right_most", constant: false, attrs::right_most),
    attr!("top_most", constant: false, attrs::top_most),
    attr!("single", constant: false, attrs::single),
    attr!("on_ground", constant: false, attrs::on_ground),
    attr!("moves", constant: false, dynamics::moves),
    attr!("is_supported", constant: false, dynamics::is_supported),
    attr!("stability", constant: false, dynamics::stability),
    attr!("can_move_up", constant: false, dynamics::can_move_up),
];

/// Binary object relations
pub static OBJ_RELS: &[FeatureDescriptor] = &[
    rel!("left_of", constant: false, symmetric: false, relations::left_of),
    rel!("right_of", constant: false, symmetric: false, relations::right_of),
    rel!("above", constant: false, symmetric: false, relations::above),
    rel!("below", constant: false, symmetric: false, relations::below),
    rel!("beside", constant: false, symmetric: true, relations::beside),
    rel!("on_top_of", constant: false, symmetric: false, relations::on_top_of),
    rel!("touch", constant: false, symmetric: true, relations::touch),
    rel!("close", constant: false, symmetric: true, relations::close),
    rel!("far", constant: false, symmetric: true, relations::far),
    rel!("hits", constant: true, symmetric: false, relations::hits),
    rel!("gets_hit", constant: true, symmetric: false, relations::gets_hit),
    rel!("collides", constant: true, symmetric: true, relations::collides),
    rel!("supports", constant: false, symmetric: false, relations::supports),
];

/// Group attributes
pub static GROUP_ATTRS: &[FeatureDescriptor] = &[
    group_attr!("count", constant: true, groups::count),
    group_attr!("close", constant: false, groups::close),
    group_attr!("touching", constant: false, groups::touching),
    group_attr!("far", constant: false, groups::far),
];

pub fn obj_attr(key: &str) -> Option<&'static FeatureDescriptor> {
    OBJ_ATTRS.iter().find(|d| d.key == key)
}

pub fn obj_rel(key: &str) -> Option<&'static FeatureDescriptor> {
    OBJ_RELS.iter().find(|d| d.key == key)
}

pub fn group_attr(key: &str) -> Option<&'static FeatureDescriptor> {
    GROUP_ATTRS.iter().find(|d| d.key == key)
}

/// Look up an object-targeted feature or fail with UnknownFeature
pub fn obj_feature(key: &str) -> SceneResult<&'static FeatureDescriptor> {
    obj_attr(key)
        .or_else(|| obj_rel(key))
        .ok_or_else(|| SceneError::UnknownFeature(key.to_string()))
}

/// Look up a group-targeted feature or fail with UnknownFeature
pub fn group_feature(key: &str) -> SceneResult<&'static FeatureDescriptor> {
    group_attr(key).ok_or_else(|| SceneError::UnknownFeature(key.to_string()))
}
