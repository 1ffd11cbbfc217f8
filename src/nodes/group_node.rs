//! Object groups with a shared attribute cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::SceneResult;
use crate::features::{self, Percept, START_TIME};
use crate::selector::Selector;

use super::scene_node::{EvalTarget, SceneNode};

type GroupCache = HashMap<String, HashMap<&'static str, Percept>>;

/// An ordered subset of a scene's movable shapes.
///
/// Cloning shares the percept cache by reference: refinements of a group
/// reuse group attributes computed on the original.
#[derive(Debug, Clone, Default)]
pub struct GroupNode {
    /// Shape indices, in scene order
    members: Vec<usize>,
    cache: Rc<RefCell<GroupCache>>,
    /// Selectors that produced this group
    pub selectors: Vec<Selector>,
}

impl GroupNode {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_members(members: Vec<usize>) -> Self {
        Self {
            members,
            cache: Rc::new(RefCell::new(HashMap::new())),
            selectors: Vec::new(),
        }
    }

    /// Every movable in the scene, minus an optional key object
    pub fn scene_group(scene: &SceneNode, key_obj: Option<usize>) -> Self {
        let skip = key_obj.map(|o| scene.obj_node(o).shape_idx);
        let members = scene
            .movable_shapes()
            .iter()
            .copied()
            .filter(|&s| Some(s) != skip)
            .collect();
        Self::from_members(members)
    }

    /// Cluster the scene's movables by surface distance
    pub fn spatial_groups(scene: &mut SceneNode, max_dist: f64) -> Vec<Self> {
        let bodies: Vec<_> = scene
            .movable_shapes()
            .iter()
            .map(|&s| scene.scene.shapes[s].body)
            .collect();
        let shape_of_body: HashMap<_, _> = scene
            .movable_shapes()
            .iter()
            .map(|&s| (scene.scene.shapes[s].body, s))
            .collect();
        scene
            .oracle()
            .spatial_groups(max_dist, Some(bodies))
            .into_iter()
            .map(|bodies| {
                let mut members: Vec<usize> = bodies
                    .into_iter()
                    .filter_map(|b| shape_of_body.get(&b).copied())
                    .collect();
                members.sort_unstable();
                Self::from_members(members)
            })
            .collect()
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, shape_idx: usize) -> bool {
        self.members.contains(&shape_idx)
    }

    /// Same members in the same order
    pub fn same_members(&self, other: &GroupNode) -> bool {
        self.members == other.members
    }

    /// A group with the given members that shares this group's cache
    pub fn refined(&self, members: Vec<usize>) -> Self {
        Self {
            members,
            cache: Rc::clone(&self.cache),
            selectors: self.selectors.clone(),
        }
    }

    /// Group attribute resolution with the same time rules as objects:
    /// constant features pin to "start", unnamed times are never cached.
    pub fn get_attr(
        &self,
        scene: &mut SceneNode,
        key: &str,
        time: Option<&str>,
    ) -> SceneResult<Percept> {
        let desc = features::group_feature(key)?;
        let rtime = if desc.constant {
            Some(START_TIME.to_string())
        } else if let Some(t) = time {
            Some(t.to_string())
        } else {
            scene.oracle().curr_state.clone()
        };
        if let Some(t) = &rtime {
            if let Some(p) = self.cache.borrow().get(t).and_then(|m| m.get(desc.key)) {
                return Ok(p.clone());
            }
            scene.oracle_mut().goto_state(t);
        }
        let p = scene.eval_feature(desc, EvalTarget::Group(&self.members))?;
        if let Some(t) = rtime {
            self.cache
                .borrow_mut()
                .entry(t)
                .or_default()
                .insert(desc.key, p.clone());
        }
        Ok(p)
    }

    /// Cache-only group attribute lookup
    pub fn get_attr_cached(&self, key: &str, time: &str) -> Option<Percept> {
        let desc = features::group_attr(key)?;
        let t = if desc.constant { START_TIME } else { time };
        self.cache.borrow().get(t).and_then(|m| m.get(desc.key)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerceptionConfig;
    use crate::flatworld::FlatWorld;
    use crate::geom::{Scene, Shape, ShapeKind, GROUND_ID};
    use crate::oracle::Oracle;
    use crate::physics::PhysicsWorld;

    fn cluster_scene() -> SceneNode {
        let mut w = FlatWorld::new();
        let ground = w.add_ground(95.0, 10.0);
        let mut shapes = vec![Shape {
            id: GROUND_ID.to_string(),
            x: 50.0,
            y: 100.0,
            movable: false,
            kind: ShapeKind::Polygon {
                pts: vec![[-60.0, -5.0], [60.0, -5.0], [60.0, 5.0], [-60.0, 5.0]],
                closed: true,
            },
            body: ground,
            phys_scale: 1.0,
        }];
        for (i, x) in [20.0, 27.0, 80.0].into_iter().enumerate() {
            let body = w.add_circle(x, 92.0, 3.0, 1.0);
            shapes.push(Shape {
                id: format!("c{}", i),
                x,
                y: 92.0,
                movable: true,
                kind: ShapeKind::Circle { r: 3.0 },
                body,
                phys_scale: 1.0,
            });
        }
        w.step(1.0);
        let oracle = Oracle::new(Box::new(w), PerceptionConfig::default());
        SceneNode::new(Scene::new("cluster", shapes), oracle)
    }

    #[test]
    fn test_scene_group_and_key_object() {
        let scene = cluster_scene();
        let all = GroupNode::scene_group(&scene, None);
        assert_eq!(all.len(), 3);
        let minus = GroupNode::scene_group(&scene, Some(0));
        assert_eq!(minus.len(), 2);
        assert!(!minus.contains(scene.obj_node(0).shape_idx));
    }

    #[test]
    fn test_spatial_groups_split() {
        let mut scene = cluster_scene();
        let max_dist = scene.config().max_dist;
        let groups = GroupNode::spatial_groups(&mut scene, max_dist);
        assert_eq!(groups.len(), 2);
        let mut sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 2]);
    }

    #[test]
    fn test_count_label() {
        let mut scene = cluster_scene();
        let g = GroupNode::scene_group(&scene, None);
        let p = g.get_attr(&mut scene, "count", None).unwrap();
        assert_eq!(p.label, "3");
        assert_eq!(p.activity, 1.0);
    }

    #[test]
    fn test_clone_shares_cache() {
        let mut scene = cluster_scene();
        let g = GroupNode::scene_group(&scene, None);
        g.get_attr(&mut scene, "count", Some("start")).unwrap();
        let clone = g.clone();
        assert!(clone.get_attr_cached("count", "start").is_some());
        // And the refinement keeps the cache reference too
        let refined = g.refined(g.members()[..2].to_vec());
        assert!(refined.get_attr_cached("count", "start").is_some());
    }

    #[test]
    fn test_unknown_group_feature() {
        let mut scene = cluster_scene();
        let g = GroupNode::scene_group(&scene, None);
        assert!(g.get_attr(&mut scene, "sparkles", None).is_err());
    }
}
