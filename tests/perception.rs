//! End-to-end perception over flatworld scenes: determinism, caching
//! discipline, sandbox purity and the concrete feature scenarios.

mod common;

use common::{box_kind, build_scene, shape, Obj};
use scenesense::{
    math, AttrMatcher, FlatWorld, Oracle, PerceptionConfig, PhysicsWorld, Scene, SceneNode,
    ShapeKind, GROUND_ID,
};

/// S1: a circle of area 120 reads small, not large, and classifies as circle
#[test]
fn scenario_sizes_and_shape_class() {
    let r = (120.0 / std::f64::consts::PI).sqrt();
    let mut scene = build_scene("sizes", &[Obj::Circle("c", 20.0, r, 1.0)]);

    let shape_p = scene.get_attr(0, "shape", None).unwrap();
    assert_eq!(shape_p.label, "circle");
    assert_eq!(shape_p.activity, 1.0);

    let small = scene.get_attr(0, "small", None).unwrap();
    let large = scene.get_attr(0, "large", None).unwrap();
    let area_pct = 1.2;
    assert!((small.activity - (1.0 - math::sigmoid(4.0, 1.8, area_pct))).abs() < 1e-6);
    assert!((large.activity - math::sigmoid(4.0, 2.0, area_pct)).abs() < 1e-6);
    assert!((large.activity - 0.039).abs() < 0.01);
}

/// S2: an 85°-cornered 2×5 parallelogram is a rectangle, not a square
#[test]
fn scenario_skewed_rectangle() {
    let mut w = FlatWorld::new();
    let ground = w.add_ground(95.0, 10.0);
    let body = w.add_box(50.0, 92.0, 2.5, 1.0, 1.0);
    w.step(1.0);
    let off = 2.0 * (85.0_f64).to_radians().cos();
    let h = 2.0 * (85.0_f64).to_radians().sin();
    let pts = vec![
        [0.0, 0.0],
        [5.0, 0.0],
        [5.0 + off, h],
        [off, h],
    ];
    let shapes = vec![
        shape(GROUND_ID, 50.0, 100.0, box_kind(60.0, 5.0), ground, false),
        shape(
            "r",
            50.0,
            92.0,
            ShapeKind::Polygon { pts, closed: true },
            body,
            true,
        ),
    ];
    let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
    let mut scene = SceneNode::new(Scene::new("skewed", shapes), oracle);

    let p = scene.get_attr(0, "shape", None).unwrap();
    assert_eq!(p.label, "rectangle");
    assert_eq!(scene.get_attr(0, "rect", None).unwrap().activity, 1.0);
    assert_eq!(scene.get_attr(0, "square", None).unwrap().activity, 0.0);
}

/// S3: two circles 0.3 apart touch and are close, not far
#[test]
fn scenario_proximity() {
    let mut scene = build_scene(
        "prox",
        &[Obj::Circle("a", 40.0, 3.0, 1.0), Obj::Circle("b", 46.3, 3.0, 1.0)],
    );
    let touch = scene.get_rel(0, "touch", 1, Some("start")).unwrap();
    assert_eq!(touch.activity, 1.0);
    assert!((touch.value - 0.3).abs() < 0.05);
    let close = scene.get_rel(0, "close", 1, Some("start")).unwrap();
    assert!(close.activity > 0.99);
    let far = scene.get_rel(0, "far", 1, Some("start")).unwrap();
    assert!(far.activity < 0.01);
}

/// S4: a resting rider on a base is stable and on top of it
#[test]
fn scenario_tower_stability() {
    let mut w = FlatWorld::new();
    let ground = w.add_ground(95.0, 10.0);
    let base = w.add_box(30.0, 90.0, 5.0, 5.0, 4.0);
    let rider = w.add_box(30.0, 82.0, 3.0, 3.0, 1.0);
    w.step(2.0);
    let shapes = vec![
        shape(GROUND_ID, 50.0, 100.0, box_kind(60.0, 5.0), ground, false),
        shape("base", 30.0, 90.0, box_kind(5.0, 5.0), base, true),
        shape("rider", 30.0, 82.0, box_kind(3.0, 3.0), rider, true),
    ];
    let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
    let mut scene = SceneNode::new(Scene::new("tower", shapes), oracle);

    let stability = scene.get_attr(1, "stability", Some("start")).unwrap();
    assert_eq!(stability.label, "stable");
    let top = scene.get_rel(1, "on_top_of", 0, Some("start")).unwrap();
    assert!(top.activity > 0.9);

    // S5: the base directly supports the rider
    let sup = scene.get_rel(0, "supports", 1, Some("start")).unwrap();
    assert_eq!(sup.label, "directly");
    assert_eq!(sup.activity, 1.0);
}

/// P1: repeated perception of the same feature on the same state agrees
#[test]
fn determinism_across_instances() {
    let build = || {
        build_scene(
            "det",
            &[Obj::Circle("a", 25.0, 3.0, 1.0), Obj::Box("b", 70.0, 4.0, 4.0, 2.0)],
        )
    };
    let mut s1 = build();
    let mut s2 = build();
    for key in ["small", "left_pos", "moves", "stability", "single"] {
        let p1 = s1.get_attr(0, key, Some("start")).unwrap();
        let p2 = s2.get_attr(0, key, Some("start")).unwrap();
        assert_eq!(p1.activity, p2.activity, "{}", key);
        assert_eq!(p1.label, p2.label, "{}", key);
        // And the cached copy answers identically
        let again = s1.get_attr(0, key, Some("start")).unwrap();
        assert_eq!(p1, again, "{}", key);
    }
}

/// P2: constant features resolve to the same cached percept at every time
#[test]
fn constancy_pins_to_start() {
    let mut scene = build_scene("const", &[Obj::Circle("a", 25.0, 3.0, 1.0)]);
    scene.perceive_all().unwrap();
    let at_start = scene.get_attr(0, "shape", Some("start")).unwrap();
    let at_end = scene.get_attr(0, "shape", Some("end")).unwrap();
    assert_eq!(at_start, at_end);
    // The cache holds it under "start" only
    assert!(scene.get_attr_cached(0, "shape", Some("start")).is_some());
}

/// P3 + P4: a counterfactual probe leaves every existing cache entry alone,
/// and a successful get inserts exactly one entry
#[test]
fn sandbox_purity_and_cache_monotonicity() {
    let mut scene = build_scene(
        "pure",
        &[Obj::Box("a", 30.0, 4.0, 4.0, 2.0), Obj::Box("b", 60.0, 4.0, 4.0, 2.0)],
    );
    // Warm a few cache entries, but leave `supports` uncomputed
    let moves_before = scene.get_attr(0, "moves", Some("start")).unwrap();
    scene.get_attr(1, "moves", Some("start")).unwrap();
    scene.get_attr(1, "stability", Some("start")).unwrap();
    let counts_before: Vec<usize> = (0..scene.obj_count())
        .map(|o| scene.obj_node(o).cached_count("start"))
        .collect();

    // supports runs nested counterfactuals (deactivation, motion and
    // stability probes) inside sandbox frames
    let sup = scene.get_rel(0, "supports", 1, Some("start")).unwrap();
    assert_eq!(sup.label, "not");

    let moves_after = scene.get_attr_cached(0, "moves", Some("start")).unwrap();
    assert_eq!(moves_before, moves_after, "sandbox side effects leaked");
    let counts_after: Vec<usize> = (0..scene.obj_count())
        .map(|o| scene.obj_node(o).cached_count("start"))
        .collect();
    // P4: exactly one new entry, on the asking node, nothing on the partner
    assert_eq!(counts_after[0], counts_before[0] + 1);
    assert_eq!(counts_after[1], counts_before[1]);

    // Repeating the get inserts nothing further
    scene.get_rel(0, "supports", 1, Some("start")).unwrap();
    let counts_repeat: Vec<usize> = (0..scene.obj_count())
        .map(|o| scene.obj_node(o).cached_count("start"))
        .collect();
    assert_eq!(counts_after, counts_repeat);
}

/// P5: symmetric relations report the same value in both directions
#[test]
fn symmetry_obedience() {
    let mut scene = build_scene(
        "sym",
        &[Obj::Circle("a", 30.0, 3.0, 1.0), Obj::Circle("b", 44.0, 4.0, 1.0)],
    );
    for key in ["touch", "close", "far", "beside"] {
        let ab = scene.get_rel(0, key, 1, Some("start")).unwrap();
        let ba = scene.get_rel(1, key, 0, Some("start")).unwrap();
        assert!(
            (ab.value - ba.value).abs() < 1e-9,
            "{}: {} vs {}",
            key,
            ab.value,
            ba.value
        );
    }
}

/// P6: attribute matchers combine label equality with threshold polarity
#[test]
fn threshold_semantics() {
    let mut scene = build_scene("thr", &[Obj::Circle("a", 25.0, 3.0, 1.0)]);
    let small_active = AttrMatcher::object("small", "small").unwrap();
    assert!(small_active.matches_object(&mut scene, 0).unwrap());
    let large_active = AttrMatcher::object("large", "large").unwrap();
    assert!(!large_active.matches_object(&mut scene, 0).unwrap());
    let large_inactive = large_active.negated();
    assert!(large_inactive.matches_object(&mut scene, 0).unwrap());
    // Label mismatch fails regardless of activity
    let wrong_label = AttrMatcher::object("shape", "rectangle").unwrap();
    assert!(!wrong_label.matches_object(&mut scene, 0).unwrap());
}

/// R3: eager perception is idempotent under a frozen oracle state
#[test]
fn perceive_idempotent() {
    let mut scene = build_scene(
        "idem",
        &[Obj::Circle("a", 25.0, 3.0, 1.0), Obj::Box("b", 70.0, 4.0, 4.0, 2.0)],
    );
    scene.perceive("start").unwrap();
    let counts: Vec<usize> = (0..scene.obj_count())
        .map(|o| scene.obj_node(o).cached_count("start"))
        .collect();
    let sample = scene.get_attr_cached(0, "stability", Some("start")).unwrap();
    scene.perceive("start").unwrap();
    let counts_again: Vec<usize> = (0..scene.obj_count())
        .map(|o| scene.obj_node(o).cached_count("start"))
        .collect();
    assert_eq!(counts, counts_again);
    assert_eq!(
        scene.get_attr_cached(0, "stability", Some("start")).unwrap(),
        sample
    );
}

/// Collisions observed between "start" and "end" feed the constant
/// hits/gets_hit/collides relations
#[test]
fn collision_history_end_to_end() {
    let mut w = FlatWorld::new();
    let ground = w.add_ground(95.0, 10.0);
    // One ball in mid-air above a resting one, slightly offset so the
    // faller knocks into it on the way down
    let resting = w.add_circle(50.0, 92.0, 3.0, 1.0);
    let faller = w.add_circle(50.5, 60.0, 3.0, 1.0);
    let shapes = vec![
        shape(GROUND_ID, 50.0, 100.0, box_kind(60.0, 5.0), ground, false),
        shape("resting", 50.0, 92.0, ShapeKind::Circle { r: 3.0 }, resting, true),
        shape("faller", 50.5, 60.0, ShapeKind::Circle { r: 3.0 }, faller, true),
    ];
    let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
    let mut scene = SceneNode::new(Scene::new("impact", shapes), oracle);
    scene.perceive_all().unwrap();

    assert!(!scene.collisions().is_empty());
    let hits = scene.get_rel(1, "hits", 0, None).unwrap();
    let gets_hit = scene.get_rel(0, "gets_hit", 1, None).unwrap();
    let collides = scene.get_rel(0, "collides", 1, None).unwrap();
    assert_eq!(hits.activity, 1.0, "faller hits the resting ball");
    assert_eq!(gets_hit.activity, 1.0);
    assert_eq!(collides.activity, 1.0);
    assert!(hits.value > 1.0, "impact speed recorded: {}", hits.value);
}

/// Extremum attributes agree with the layout and fail on empty scenes
#[test]
fn extrema_and_positions() {
    let mut scene = build_scene(
        "extrema",
        &[
            Obj::Circle("l", 15.0, 3.0, 1.0),
            Obj::Circle("m", 50.0, 3.0, 1.0),
            Obj::Circle("r", 85.0, 3.0, 1.0),
        ],
    );
    let threshold = scene.activation_threshold();
    assert!(scene.get_attr(0, "left_most", None).unwrap().activity >= threshold);
    assert!(scene.get_attr(1, "left_most", None).unwrap().activity < threshold);
    assert!(scene.get_attr(2, "right_most", None).unwrap().activity >= threshold);
    assert!(scene.get_attr(0, "left_pos", None).unwrap().activity >= threshold);
    assert!(scene.get_attr(2, "right_pos", None).unwrap().activity >= threshold);
    assert!(scene.get_attr(0, "on_ground", None).unwrap().activity >= threshold);
    // All three rest on the ground: bottom, not top
    assert!(scene.get_attr(0, "bottom_pos", None).unwrap().activity >= threshold);
    assert!(scene.get_attr(0, "top_pos", None).unwrap().activity < threshold);
}

/// The "single" attribute separates lone objects from crowded ones
#[test]
fn single_membership() {
    let mut scene = build_scene(
        "single",
        &[
            Obj::Circle("crowded_a", 30.0, 3.0, 1.0),
            Obj::Circle("crowded_b", 37.0, 3.0, 1.0),
            Obj::Circle("lone", 85.0, 3.0, 1.0),
        ],
    );
    let threshold = scene.activation_threshold();
    assert!(scene.get_attr(2, "single", None).unwrap().activity >= threshold);
    assert!(scene.get_attr(0, "single", None).unwrap().activity < threshold);
}
