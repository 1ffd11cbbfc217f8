//! Group attributes: cardinality and spatial cohesion.

use crate::error::SceneResult;
use crate::math::{close_membership, far_membership, touch_membership};
use crate::oracle::Oracle;

use super::{Percept, SceneView};

pub(super) fn count(_view: &SceneView, _o: &mut Oracle, members: &[usize]) -> SceneResult<Percept> {
    let n = members.len();
    let label = if n < 4 {
        n.to_string()
    } else {
        ">=4".to_string()
    };
    Ok(Percept::attr("count", label, 1.0, n as f64))
}

/// Pairwise surface distances in scene units
fn pair_distances(view: &SceneView, oracle: &Oracle, members: &[usize]) -> Vec<(usize, usize, f64)> {
    let mut edges = Vec::new();
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let a = view.shape(members[i]);
            let b = view.shape(members[j]);
            let d = oracle.surface_distance(a.body, b.body) * a.phys_scale;
            edges.push((i, j, d));
        }
    }
    edges
}

/// Longest edge of the minimum spanning tree over pairwise surface
/// distances: the critical gap that still holds the group together.
fn critical_distance(view: &SceneView, oracle: &Oracle, members: &[usize]) -> Option<f64> {
    if members.len() < 2 {
        return None;
    }
    let mut edges = pair_distances(view, oracle, members);
    edges.sort_by(|a, b| crate::math::float_cmp(&a.2, &b.2));

    let mut parent: Vec<usize> = (0..members.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cur = i;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }

    let mut critical = 0.0;
    let mut joined = 1;
    for (i, j, d) in edges {
        let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
        if ri != rj {
            parent[ri] = rj;
            critical = d;
            joined += 1;
            if joined == members.len() {
                break;
            }
        }
    }
    Some(critical)
}

pub(super) fn close(view: &SceneView, oracle: &mut Oracle, members: &[usize]) -> SceneResult<Percept> {
    match critical_distance(view, oracle, members) {
        Some(d) => Ok(Percept::attr("close", "close", close_membership(d), d)),
        None => Ok(Percept::attr("close", "close", 0.0, 0.0)),
    }
}

pub(super) fn touching(view: &SceneView, oracle: &mut Oracle, members: &[usize]) -> SceneResult<Percept> {
    match critical_distance(view, oracle, members) {
        // Critical gap back in physics units for the touch test
        Some(d) => {
            let scale = view.shape(members[0]).phys_scale.max(1e-12);
            Ok(Percept::attr(
                "touching",
                "touching",
                touch_membership(d / scale, oracle.config().touch_distance),
                d,
            ))
        }
        None => Ok(Percept::attr("touching", "touching", 0.0, 0.0)),
    }
}

pub(super) fn far(view: &SceneView, oracle: &mut Oracle, members: &[usize]) -> SceneResult<Percept> {
    if members.len() < 2 {
        return Ok(Percept::attr("far", "far", 0.0, 0.0));
    }
    let min_dist = pair_distances(view, oracle, members)
        .into_iter()
        .map(|(_, _, d)| d)
        .fold(f64::INFINITY, f64::min);
    Ok(Percept::attr("far", "far", far_membership(min_dist), min_dist))
}
