//! Selector and solution behavior across scene pairs: quantification,
//! negation universality, side classification and the full solving loop.

mod common;

use common::{build_scene, Obj};
use scenesense::{
    AttrMatcher, GroupNode, Mode, RelMatcher, SceneNode, Selector, Side, Solution,
};

/// `small ∧ left_of(rectangle)`
fn small_left_of_rect() -> Selector {
    let rect_sel = Selector::new().with_attr(AttrMatcher::object("shape", "rectangle").unwrap());
    Selector::new()
        .with_attr(AttrMatcher::object("small", "small").unwrap())
        .with_rel(RelMatcher::new("left_of", "left_of", rect_sel).unwrap())
}

/// A small circle left of a big rectangle
fn left_style_scene(idx: usize) -> SceneNode {
    let x = 15.0 + idx as f64;
    build_scene(
        "left",
        &[
            Obj::Circle("c", x, 3.0, 1.0),
            Obj::Box("r", 65.0, 10.0, 6.0, 4.0),
        ],
    )
}

/// The same ingredients with the circle on the other side
fn right_style_scene(idx: usize) -> SceneNode {
    let x = 80.0 - idx as f64;
    build_scene(
        "right",
        &[
            Obj::Circle("c", x, 3.0, 1.0),
            Obj::Box("r", 30.0, 10.0, 6.0, 4.0),
        ],
    )
}

#[test]
fn select_filters_members() {
    let mut scene = left_style_scene(0);
    let group = GroupNode::scene_group(&scene, None);
    assert_eq!(group.len(), 2);
    let sel = small_left_of_rect();
    let picked = sel.select(&group, &mut scene).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(scene.scene.shapes[picked.members()[0]].id, "c");
    // The result group records the selector that produced it
    assert_eq!(picked.selectors.len(), 1);
    assert!(picked.selectors[0].equals(&sel));
}

#[test]
fn blank_selector_passes_everything() {
    let mut scene = left_style_scene(0);
    let group = GroupNode::scene_group(&scene, None);
    let blank = Selector::new();
    let out = blank.select(&group, &mut scene).unwrap();
    assert!(out.same_members(&group));
    // Returned unchanged: no selector bookkeeping on the blank path
    assert!(out.selectors.is_empty());

    // Same when the input group already carries provenance
    let sel = small_left_of_rect();
    let picked = sel.select(&group, &mut scene).unwrap();
    let repassed = blank.select(&picked, &mut scene).unwrap();
    assert!(repassed.same_members(&picked));
    assert_eq!(repassed.selectors.len(), picked.selectors.len());
    assert!(repassed.selectors[0].equals(&picked.selectors[0]));
}

/// P7: a negated relation matcher is a universal negation
#[test]
fn negation_is_universal() {
    let rect_sel = Selector::new().with_attr(AttrMatcher::object("shape", "rectangle").unwrap());
    let not_left_of_rect = Selector::new()
        .with_attr(AttrMatcher::object("small", "small").unwrap())
        .with_rel(
            RelMatcher::new("left_of", "left_of", rect_sel.clone())
                .unwrap()
                .negated(),
        );

    // Circle right of the rectangle: nothing rectangular to its left-of
    let mut right = right_style_scene(0);
    assert!(not_left_of_rect.matches_object(&mut right, 0, None, None).unwrap());

    // Circle left of one rectangle: the negation fails even though another
    // rectangle sits to its left side of the scene
    let mut two_rects = build_scene(
        "two_rects",
        &[
            Obj::Circle("c", 45.0, 3.0, 1.0),
            Obj::Box("r1", 15.0, 10.0, 6.0, 4.0),
            Obj::Box("r2", 80.0, 10.0, 6.0, 4.0),
        ],
    );
    assert!(!not_left_of_rect
        .matches_object(&mut two_rects, 0, None, None)
        .unwrap());
}

/// Unique partner quantification wants exactly one matching partner
#[test]
fn unique_partner_quantification() {
    let unique_rect = Selector::new()
        .with_attr(AttrMatcher::object("shape", "rectangle").unwrap())
        .set_unique(true);
    let sel = Selector::new()
        .with_attr(AttrMatcher::object("small", "small").unwrap())
        .with_rel(RelMatcher::new("left_of", "left_of", unique_rect).unwrap());

    // One rectangle to the right: exactly one partner
    let mut one = left_style_scene(0);
    assert!(sel.matches_object(&mut one, 0, None, None).unwrap());

    // Two rectangles to the right: quantification fails
    let mut two = build_scene(
        "two_right",
        &[
            Obj::Circle("c", 10.0, 3.0, 1.0),
            Obj::Box("r1", 45.0, 10.0, 6.0, 4.0),
            Obj::Box("r2", 80.0, 10.0, 6.0, 4.0),
        ],
    );
    assert!(!sel.matches_object(&mut two, 0, None, None).unwrap());
}

/// Group matchers gate the selection result
#[test]
fn group_selector_gates() {
    let mut scene = build_scene(
        "trio",
        &[
            Obj::Circle("a", 20.0, 3.0, 1.0),
            Obj::Circle("b", 27.0, 3.0, 1.0),
            Obj::Circle("c", 34.0, 3.0, 1.0),
        ],
    );
    let group = GroupNode::scene_group(&scene, None);

    let wants_three = Selector::new().with_attr(AttrMatcher::group("count", "3").unwrap());
    let out = wants_three.select(&group, &mut scene).unwrap();
    assert_eq!(out.len(), 3);

    let wants_two = Selector::new().with_attr(AttrMatcher::group("count", "2").unwrap());
    let out = wants_two.select(&group, &mut scene).unwrap();
    assert!(out.is_empty(), "failed group attr empties the group");
    assert_eq!(out.selectors.len(), 1, "the selector is still recorded");
}

/// S6 + P8: the full solving loop over 8 scene pairs
#[test]
fn solution_over_eight_pairs() {
    let mut solution = Solution::new(small_left_of_rect(), Mode::Exists, 8);
    for i in 0..8 {
        let mut left = left_style_scene(i);
        let mut right = right_style_scene(i);
        solution
            .check_scene_pair(&mut left, &mut right, &format!("pair-{}", i))
            .unwrap();
        assert!(left.fits_solution == Some(true));
        assert!(right.fits_solution == Some(false));
    }
    assert_eq!(solution.lmatches, 8);
    assert_eq!(solution.rmatches, 0);
    assert_eq!(solution.main_side, Side::Left);
    assert!(solution.is_solution());
    assert_eq!(solution.matched_against.len(), 8);
}

/// A selector matching both sides classifies as Both and never solves
#[test]
fn both_sides_never_solves() {
    let anything_small = Selector::new().with_attr(AttrMatcher::object("small", "small").unwrap());
    let mut solution = Solution::new(anything_small, Mode::Exists, 8);
    for i in 0..8 {
        let mut left = left_style_scene(i);
        let mut right = right_style_scene(i);
        solution
            .check_scene_pair(&mut left, &mut right, &format!("pair-{}", i))
            .unwrap();
    }
    assert_eq!(solution.main_side, Side::Both);
    assert!(!solution.is_solution());
}

/// Mode semantics: unique wants exactly one survivor, all wants everyone
#[test]
fn solution_modes() {
    let mut scene = build_scene(
        "modes",
        &[
            Obj::Circle("a", 20.0, 3.0, 1.0),
            Obj::Circle("b", 60.0, 3.0, 1.0),
            Obj::Box("r", 80.0, 10.0, 6.0, 4.0),
        ],
    );
    let small = Selector::new().with_attr(AttrMatcher::object("small", "small").unwrap());

    // Two small circles survive: exists yes, unique no, all no
    let sol = Solution::new(small.clone(), Mode::Exists, 8);
    assert_eq!(sol.check_scene(&mut scene).unwrap(), Some(2));
    let sol = Solution::new(small.clone(), Mode::Unique, 8);
    assert_eq!(sol.check_scene(&mut scene).unwrap(), None);
    assert_eq!(scene.fits_solution, Some(false));
    let sol = Solution::new(small.clone(), Mode::All, 8);
    assert_eq!(sol.check_scene(&mut scene).unwrap(), None);

    // Blank selector keeps everyone: all passes
    let sol = Solution::new(Selector::new(), Mode::All, 8);
    assert_eq!(sol.check_scene(&mut scene).unwrap(), Some(3));
}

/// R1/R2 against live scenes: merged and cloned selectors select identically
#[test]
fn merge_and_clone_select_identically() {
    let sel = small_left_of_rect();
    let merged = sel.merged_with(&sel);
    assert!(merged.equals(&sel));

    let mut scene = left_style_scene(0);
    let group = GroupNode::scene_group(&scene, None);
    let a = sel.select(&group, &mut scene).unwrap();
    let b = merged.select(&group, &mut scene).unwrap();
    let c = sel.clone().select(&group, &mut scene).unwrap();
    assert!(a.same_members(&b));
    assert!(a.same_members(&c));
}

/// Matched objects remember the selectors describing them
#[test]
fn objects_remember_selectors() {
    let mut scene = left_style_scene(0);
    let group = GroupNode::scene_group(&scene, None);
    let sel = small_left_of_rect();
    sel.select(&group, &mut scene).unwrap();
    // Selecting twice does not duplicate the record
    sel.select(&group, &mut scene).unwrap();
    let circle_obj = scene.obj_of_shape(group.members()[0]).unwrap();
    assert_eq!(scene.obj_shape(circle_obj).id, "c");
    assert_eq!(scene.obj_node(circle_obj).selectors.len(), 1);
}
