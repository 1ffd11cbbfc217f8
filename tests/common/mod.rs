//! Shared scene builders for the integration suites.
#![allow(dead_code)]

use scenesense::{
    BodyId, FlatWorld, Oracle, PerceptionConfig, PhysicsWorld, Scene, SceneNode, Shape, ShapeKind,
    FRAME_ID, GROUND_ID,
};

pub fn box_kind(hw: f64, hh: f64) -> ShapeKind {
    ShapeKind::Polygon {
        pts: vec![[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]],
        closed: true,
    }
}

pub fn shape(id: &str, x: f64, y: f64, kind: ShapeKind, body: BodyId, movable: bool) -> Shape {
    Shape {
        id: id.to_string(),
        x,
        y,
        movable,
        kind,
        body,
        phys_scale: 1.0,
    }
}

/// Specification of one movable body for `build_scene`
pub enum Obj {
    /// id, x, radius, mass
    Circle(&'static str, f64, f64, f64),
    /// id, x, half-width, half-height, mass
    Box(&'static str, f64, f64, f64, f64),
}

/// Ground + frame + the given movables resting on the ground, settled
pub fn build_scene(id: &str, objs: &[Obj]) -> SceneNode {
    let mut w = FlatWorld::new();
    let frame = w.add_frame([0.0, 0.0], [100.0, 100.0]);
    let ground = w.add_ground(95.0, 10.0);
    let mut shapes = vec![
        shape(FRAME_ID, 50.0, 50.0, box_kind(50.0, 50.0), frame, false),
        shape(GROUND_ID, 50.0, 100.0, box_kind(60.0, 5.0), ground, false),
    ];
    for obj in objs {
        match *obj {
            Obj::Circle(oid, x, r, mass) => {
                let y = 95.0 - r;
                let body = w.add_circle(x, y, r, mass);
                shapes.push(shape(oid, x, y, ShapeKind::Circle { r }, body, true));
            }
            Obj::Box(oid, x, hw, hh, mass) => {
                let y = 95.0 - hh;
                let body = w.add_box(x, y, hw, hh, mass);
                shapes.push(shape(oid, x, y, box_kind(hw, hh), body, true));
            }
        }
    }
    w.step(2.0);
    let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
    SceneNode::new(Scene::new(id, shapes), oracle)
}
