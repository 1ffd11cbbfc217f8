//! Perceive a canned demo scene and print the result as JSON.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use scenesense::{
    AttrMatcher, FlatWorld, GroupNode, Oracle, PerceptionConfig, PhysicsWorld, Scene, SceneNode,
    Selector, Shape, ShapeKind, FRAME_ID, GROUND_ID,
};

#[derive(Parser)]
#[command(name = "scene_report", about = "Graded perception report for a demo scene")]
struct Args {
    /// Which canned scene to build: tower | row
    #[arg(long, default_value = "tower")]
    scene: String,

    /// Named time to report: start | end
    #[arg(long, default_value = "start")]
    time: String,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct PerceptReport {
    key: String,
    label: String,
    activity: f64,
    partner: Option<String>,
}

#[derive(Serialize)]
struct ObjectReport {
    id: String,
    active: Vec<PerceptReport>,
}

#[derive(Serialize)]
struct SceneReport {
    scene: String,
    time: String,
    objects: Vec<ObjectReport>,
    spatial_groups: Vec<Vec<String>>,
    small_objects: Vec<String>,
}

fn box_pts(hw: f64, hh: f64) -> Vec<[f64; 2]> {
    vec![[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]]
}

/// A base box with a rider on top, plus a lone circle
fn tower_scene() -> SceneNode {
    let mut w = FlatWorld::new();
    let frame = w.add_frame([0.0, 0.0], [100.0, 100.0]);
    let ground = w.add_ground(95.0, 10.0);
    let base = w.add_box(30.0, 90.0, 5.0, 5.0, 4.0);
    let rider = w.add_box(30.0, 82.0, 3.0, 3.0, 1.0);
    let lone = w.add_circle(75.0, 92.0, 3.0, 1.0);
    w.step(2.0);

    let shapes = vec![
        shape(FRAME_ID, 50.0, 50.0, box_kind(50.0, 50.0), frame, false),
        shape(GROUND_ID, 50.0, 100.0, box_kind(60.0, 5.0), ground, false),
        shape("base", 30.0, 90.0, box_kind(5.0, 5.0), base, true),
        shape("rider", 30.0, 82.0, box_kind(3.0, 3.0), rider, true),
        shape("lone", 75.0, 92.0, ShapeKind::Circle { r: 3.0 }, lone, true),
    ];
    let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
    SceneNode::new(Scene::new("tower", shapes), oracle)
}

/// A row of mixed shapes on the ground
fn row_scene() -> SceneNode {
    let mut w = FlatWorld::new();
    let frame = w.add_frame([0.0, 0.0], [100.0, 100.0]);
    let ground = w.add_ground(95.0, 10.0);
    let a = w.add_circle(15.0, 92.0, 2.0, 0.5);
    let b = w.add_box(40.0, 91.0, 4.0, 4.0, 2.0);
    let c = w.add_box(65.0, 93.0, 6.0, 2.0, 2.0);
    let d = w.add_circle(85.0, 90.0, 5.0, 2.0);
    w.step(2.0);

    let shapes = vec![
        shape(FRAME_ID, 50.0, 50.0, box_kind(50.0, 50.0), frame, false),
        shape(GROUND_ID, 50.0, 100.0, box_kind(60.0, 5.0), ground, false),
        shape("a", 15.0, 92.0, ShapeKind::Circle { r: 2.0 }, a, true),
        shape("b", 40.0, 91.0, box_kind(4.0, 4.0), b, true),
        shape("c", 65.0, 93.0, box_kind(6.0, 2.0), c, true),
        shape("d", 85.0, 90.0, ShapeKind::Circle { r: 5.0 }, d, true),
    ];
    let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
    SceneNode::new(Scene::new("row", shapes), oracle)
}

fn box_kind(hw: f64, hh: f64) -> ShapeKind {
    ShapeKind::Polygon {
        pts: box_pts(hw, hh),
        closed: true,
    }
}

fn shape(
    id: &str,
    x: f64,
    y: f64,
    kind: ShapeKind,
    body: scenesense::BodyId,
    movable: bool,
) -> Shape {
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

fn main() -> Result<()> {
    let args = Args::parse();
    let mut scene = match args.scene.as_str() {
        "row" => row_scene(),
        _ => tower_scene(),
    };
    scene.perceive_all()?;

    let threshold = scene.activation_threshold();
    let objects: Vec<ObjectReport> = (0..scene.obj_count())
        .map(|obj| ObjectReport {
            id: scene.obj_shape(obj).id.clone(),
            active: scene
                .obj_node(obj)
                .active_percepts(&args.time, threshold)
                .into_iter()
                .map(|p| PerceptReport {
                    key: p.key.to_string(),
                    label: p.label.clone(),
                    activity: (p.activity * 1000.0).round() / 1000.0,
                    partner: p.other.map(|s| scene.scene.shapes[s].id.clone()),
                })
                .collect(),
        })
        .collect();

    let max_dist = scene.config().max_dist;
    let spatial_groups = GroupNode::spatial_groups(&mut scene, max_dist)
        .into_iter()
        .map(|g| {
            g.members()
                .iter()
                .map(|&s| scene.scene.shapes[s].id.clone())
                .collect()
        })
        .collect();

    let small_sel = Selector::new().with_attr(AttrMatcher::object("small", "small")?);
    let everything = GroupNode::scene_group(&scene, None);
    let small_objects = small_sel
        .select(&everything, &mut scene)?
        .members()
        .iter()
        .map(|&s| scene.scene.shapes[s].id.clone())
        .collect();

    let report = SceneReport {
        scene: scene.scene.id.clone(),
        time: args.time,
        objects,
        spatial_groups,
        small_objects,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
