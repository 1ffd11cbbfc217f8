//! One scene: shapes, ground, frame, collisions, objects, oracle.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::config::PerceptionConfig;
use crate::error::{SceneError, SceneResult};
use crate::features::{self, Collision, Eval, FeatureDescriptor, Percept, SceneView, START_TIME};
use crate::geom::{Scene, Shape, FRAME_ID, GROUND_ID};
use crate::oracle::Oracle;
use crate::physics::BodyId;

use super::object_node::ObjectNode;

/// What a feature evaluator is pointed at
pub(crate) enum EvalTarget<'m> {
    Obj(usize),
    Pair(usize, usize),
    Group(&'m [usize]),
}

/// Bundles a scene with its oracle and the per-object perception caches
pub struct SceneNode {
    pub scene: Scene,
    oracle: Oracle,
    objs: Vec<ObjectNode>,
    /// Shape indices of the movables, parallel to `objs`
    movables: Vec<usize>,
    ground: Option<usize>,
    frame: Option<usize>,
    collisions: Vec<Collision>,
    /// Named times perception runs over, in order
    times: Vec<String>,
    /// Set by Solution::check_scene
    pub fits_solution: Option<bool>,
}

impl SceneNode {
    /// Wrap a scene, register its objects, and name the current simulator
    /// state "start" if nothing is named yet.
    pub fn new(scene: Scene, mut oracle: Oracle) -> Self {
        if oracle.curr_state.is_none() {
            oracle.save_state(START_TIME);
        }
        let mut objs = Vec::new();
        let mut movables = Vec::new();
        let mut ground = None;
        let mut frame = None;
        for (idx, shape) in scene.shapes.iter().enumerate() {
            if shape.id == GROUND_ID {
                ground = Some(idx);
            } else if shape.id == FRAME_ID {
                frame = Some(idx);
            } else if shape.movable {
                objs.push(ObjectNode::new(idx));
                movables.push(idx);
            }
        }
        Self {
            scene,
            oracle,
            objs,
            movables,
            ground,
            frame,
            collisions: Vec::new(),
            times: vec!["start".to_string(), "end".to_string()],
            fits_solution: None,
        }
    }

    pub fn obj_count(&self) -> usize {
        self.objs.len()
    }

    pub fn obj_node(&self, obj: usize) -> &ObjectNode {
        &self.objs[obj]
    }

    pub(crate) fn obj_node_mut(&mut self, obj: usize) -> &mut ObjectNode {
        &mut self.objs[obj]
    }

    pub fn obj_shape(&self, obj: usize) -> &Shape {
        &self.scene.shapes[self.objs[obj].shape_idx]
    }

    /// Shape indices of all movables, in object order
    pub fn movable_shapes(&self) -> &[usize] {
        &self.movables
    }

    /// Object index owning a shape, if the shape is movable
    pub fn obj_of_shape(&self, shape_idx: usize) -> Option<usize> {
        self.objs.iter().position(|o| o.shape_idx == shape_idx)
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn times(&self) -> &[String] {
        &self.times
    }

    pub fn config(&self) -> &PerceptionConfig {
        self.oracle.config()
    }

    pub fn activation_threshold(&self) -> f64 {
        self.oracle.config().activation_threshold
    }

    pub(crate) fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub(crate) fn oracle_mut(&mut self) -> &mut Oracle {
        &mut self.oracle
    }

    /// Constant features resolve against "start"; otherwise the requested
    /// time, falling back to the oracle's current named state.
    fn resolve_time(&self, constant: bool, time: Option<&str>) -> Option<String> {
        if constant {
            Some(START_TIME.to_string())
        } else if let Some(t) = time {
            Some(t.to_string())
        } else {
            self.oracle.curr_state.clone()
        }
    }

    pub(crate) fn eval_feature(
        &mut self,
        desc: &'static FeatureDescriptor,
        target: EvalTarget<'_>,
    ) -> SceneResult<Percept> {
        let view = SceneView {
            shapes: &self.scene.shapes,
            movables: &self.movables,
            ground: self.ground,
            frame: self.frame,
            collisions: &self.collisions,
        };
        match (&desc.eval, target) {
            (Eval::Attr(f), EvalTarget::Obj(s)) => f(&view, &mut self.oracle, s),
            (Eval::Rel(f), EvalTarget::Pair(a, b)) => f(&view, &mut self.oracle, a, b),
            (Eval::Group(f), EvalTarget::Group(members)) => f(&view, &mut self.oracle, members),
            _ => Err(SceneError::Internal(format!(
                "feature '{}' evaluated against the wrong target kind",
                desc.key
            ))),
        }
    }

    /// Attribute resolution. Computes on a cache miss; results are cached
    /// only under named times. Asking for a relation here is a caller bug.
    pub fn get_attr(&mut self, obj: usize, key: &str, time: Option<&str>) -> SceneResult<Percept> {
        let desc = features::obj_feature(key)?;
        if matches!(desc.eval, Eval::Rel(_)) {
            return Err(SceneError::MissingPartner(desc.key));
        }
        self.get_attr_desc(obj, desc, time)
    }

    fn get_attr_desc(
        &mut self,
        obj: usize,
        desc: &'static FeatureDescriptor,
        time: Option<&str>,
    ) -> SceneResult<Percept> {
        let rtime = self.resolve_time(desc.constant, time);
        if let Some(t) = &rtime {
            if let Some(p) = self.objs[obj].cached_attr(t, desc.key) {
                return Ok(p.clone());
            }
            self.oracle.goto_state(t);
        }
        let shape_idx = self.objs[obj].shape_idx;
        let p = self.eval_feature(desc, EvalTarget::Obj(shape_idx))?;
        if let Some(t) = &rtime {
            self.objs[obj].insert_attr(t, p.clone());
        }
        Ok(p)
    }

    /// Cache-only attribute lookup: miss is `None`, nothing is computed
    pub fn get_attr_cached(&self, obj: usize, key: &str, time: Option<&str>) -> Option<Percept> {
        let desc = features::obj_attr(key)?;
        let t = self.resolve_time(desc.constant, time)?;
        self.objs[obj].cached_attr(&t, desc.key).cloned()
    }

    /// Relation resolution, partner given as an object index
    pub fn get_rel(
        &mut self,
        obj: usize,
        key: &str,
        other: usize,
        time: Option<&str>,
    ) -> SceneResult<Percept> {
        let desc = features::obj_feature(key)?;
        if !matches!(desc.eval, Eval::Rel(_)) {
            return Err(SceneError::Internal(format!(
                "'{}' is not a relation",
                desc.key
            )));
        }
        self.get_rel_desc(obj, desc, other, time)
    }

    fn get_rel_desc(
        &mut self,
        obj: usize,
        desc: &'static FeatureDescriptor,
        other: usize,
        time: Option<&str>,
    ) -> SceneResult<Percept> {
        let other_shape = self.objs[other].shape_idx;
        let rtime = self.resolve_time(desc.constant, time);
        if let Some(t) = &rtime {
            if let Some(p) = self.objs[obj].cached_rel(t, desc.key, other_shape) {
                return Ok(p.clone());
            }
            self.oracle.goto_state(t);
        }
        let shape_idx = self.objs[obj].shape_idx;
        let p = self.eval_feature(desc, EvalTarget::Pair(shape_idx, other_shape))?;
        if let Some(t) = &rtime {
            self.objs[obj].insert_rel(t, p.clone());
        }
        Ok(p)
    }

    /// Cache-only relation lookup
    pub fn get_rel_cached(
        &self,
        obj: usize,
        key: &str,
        other: usize,
        time: Option<&str>,
    ) -> Option<Percept> {
        let desc = features::obj_rel(key)?;
        let t = self.resolve_time(desc.constant, time)?;
        let other_shape = self.objs[other].shape_idx;
        self.objs[obj].cached_rel(&t, desc.key, other_shape).cloned()
    }

    /// Cache-only: every cached relation percept of this key
    pub fn get_rels_cached(&self, obj: usize, key: &str, time: Option<&str>) -> Vec<Percept> {
        let Some(desc) = features::obj_rel(key) else {
            return Vec::new();
        };
        let Some(t) = self.resolve_time(desc.constant, time) else {
            return Vec::new();
        };
        self.objs[obj]
            .cached_rels(&t, desc.key)
            .into_iter()
            .cloned()
            .collect()
    }

    /// True iff the cache holds a relation of this key to `other` whose
    /// activity polarity (against the activation threshold) matches `active`
    /// and, when given, whose label matches.
    pub fn has_relation(
        &self,
        obj: usize,
        key: &str,
        time: Option<&str>,
        label: Option<&str>,
        active: bool,
        other: usize,
    ) -> bool {
        match self.get_rel_cached(obj, key, other, time) {
            Some(p) => {
                (p.activity >= self.activation_threshold()) == active
                    && label.map_or(true, |l| p.label == l)
            }
            None => false,
        }
    }

    /// Eagerly instantiate every registered feature for every object at the
    /// named time. Relations cover every other object; relations against
    /// groups are skipped unless the relation declares a group partner
    /// (none in the default registry do).
    pub fn perceive(&mut self, time: &str) -> SceneResult<()> {
        self.oracle.goto_state(time);
        for obj in 0..self.objs.len() {
            for desc in features::OBJ_ATTRS {
                self.get_attr_desc(obj, desc, Some(time))?;
            }
            for desc in features::OBJ_RELS {
                for other in 0..self.objs.len() {
                    if other != obj {
                        self.get_rel_desc(obj, desc, other, Some(time))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Play the scene out from "start", recording collisions in shape terms
    /// and naming the settled state "end".
    pub fn perceive_collisions(&mut self) -> SceneResult<()> {
        self.oracle.goto_state(START_TIME);
        let events = self.oracle.observe_collisions();
        let body_to_shape: HashMap<BodyId, usize> = self
            .scene
            .shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.body, i))
            .collect();
        self.collisions = events
            .into_iter()
            .filter_map(|e| {
                Some(Collision {
                    a: *body_to_shape.get(&e.a)?,
                    b: *body_to_shape.get(&e.b)?,
                    dv: e.dv,
                })
            })
            .collect();
        Ok(())
    }

    /// Full perception pass: collisions first, then every named time
    pub fn perceive_all(&mut self) -> SceneResult<()> {
        self.perceive_collisions()?;
        let times = self.times.clone();
        for t in &times {
            self.perceive(t)?;
        }
        Ok(())
    }

    /// Readable summary of one object's active percepts
    pub fn describe_object(&self, obj: usize, time: &str) -> String {
        let threshold = self.activation_threshold();
        let node = &self.objs[obj];
        let shape = self.obj_shape(obj);
        let mut out = format!("{}:", shape.id);
        for p in node.active_percepts(time, threshold) {
            match p.other {
                Some(other) => {
                    let _ = write!(out, " {}({})", p.key, self.scene.shapes[other].id);
                }
                None => {
                    let _ = write!(out, " {}", p.label);
                }
            }
        }
        out
    }

    /// Scene summary across all objects
    pub fn describe(&self, time: &str) -> String {
        (0..self.objs.len())
            .map(|o| self.describe_object(o, time))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
