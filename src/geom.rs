//! Shape contract: the geometry the feature library perceives.
//!
//! Scene coordinates are 100×100 with y growing downward (SVG convention).
//! Polygon points are stored relative to the shape's position. The ground
//! carries id `"_"`, the frame id `"|"`.

use serde::{Deserialize, Serialize};

use crate::physics::BodyId;

/// Shape id of the ground body
pub const GROUND_ID: &str = "_";
/// Shape id of the enclosing frame
pub const FRAME_ID: &str = "|";

/// Axis-aligned bounding box, relative to the shape position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Geometric kind of a shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Polygon {
        /// Vertices relative to the shape position
        pts: Vec<[f64; 2]>,
        closed: bool,
    },
    Circle {
        r: f64,
    },
}

/// One scene shape, bound to a physics body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub id: String,
    /// Position in scene units
    pub x: f64,
    pub y: f64,
    pub movable: bool,
    pub kind: ShapeKind,
    /// Handle into the physics world
    pub body: BodyId,
    /// Physics units → scene units
    pub phys_scale: f64,
}

impl Shape {
    pub fn is_circle(&self) -> bool {
        matches!(self.kind, ShapeKind::Circle { .. })
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.kind, ShapeKind::Polygon { .. })
    }

    /// Enclosed area in scene units²
    pub fn area(&self) -> f64 {
        match &self.kind {
            ShapeKind::Circle { r } => std::f64::consts::PI * r * r,
            ShapeKind::Polygon { pts, .. } => shoelace(pts).abs(),
        }
    }

    /// Bounding box relative to the shape position
    pub fn bounding_box(&self) -> BBox {
        match &self.kind {
            ShapeKind::Circle { r } => BBox {
                x: -r,
                y: -r,
                width: 2.0 * r,
                height: 2.0 * r,
            },
            ShapeKind::Polygon { pts, .. } => {
                let mut min = [f64::INFINITY, f64::INFINITY];
                let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
                for p in pts {
                    for axis in 0..2 {
                        min[axis] = min[axis].min(p[axis]);
                        max[axis] = max[axis].max(p[axis]);
                    }
                }
                if pts.is_empty() {
                    return BBox {
                        x: 0.0,
                        y: 0.0,
                        width: 0.0,
                        height: 0.0,
                    };
                }
                BBox {
                    x: min[0],
                    y: min[1],
                    width: max[0] - min[0],
                    height: max[1] - min[1],
                }
            }
        }
    }

    /// Polygon vertices in counter-clockwise order (empty for circles)
    pub fn ordered_pts(&self) -> Vec<[f64; 2]> {
        match &self.kind {
            ShapeKind::Circle { .. } => vec![],
            ShapeKind::Polygon { pts, .. } => {
                // Positive shoelace sum = counter-clockwise in y-down coordinates
                if shoelace(pts) < 0.0 {
                    pts.iter().rev().copied().collect()
                } else {
                    pts.clone()
                }
            }
        }
    }

    /// Number of polygon vertices
    pub fn vertex_count(&self) -> usize {
        match &self.kind {
            ShapeKind::Circle { .. } => 0,
            ShapeKind::Polygon { pts, .. } => pts.len(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.kind {
            ShapeKind::Circle { .. } => true,
            ShapeKind::Polygon { closed, .. } => *closed,
        }
    }

    /// Edge lengths of the polygon outline, optionally sorted ascending
    pub fn edge_lengths(&self, sorted: bool) -> Vec<f64> {
        let pts = self.ordered_pts();
        if pts.len() < 2 {
            return vec![];
        }
        let n = pts.len();
        let count = if self.is_closed() { n } else { n - 1 };
        let mut lengths: Vec<f64> = (0..count)
            .map(|i| {
                let a = pts[i];
                let b = pts[(i + 1) % n];
                ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
            })
            .collect();
        if sorted {
            lengths.sort_by(crate::math::float_cmp);
        }
        lengths
    }

    /// Interior angle at vertex `i` in degrees (0 for circles)
    pub fn angle(&self, i: usize) -> f64 {
        let pts = self.ordered_pts();
        let n = pts.len();
        if n < 3 || i >= n {
            return 0.0;
        }
        let prev = pts[(i + n - 1) % n];
        let here = pts[i];
        let next = pts[(i + 1) % n];
        let u = [prev[0] - here[0], prev[1] - here[1]];
        let v = [next[0] - here[0], next[1] - here[1]];
        let lu = (u[0] * u[0] + u[1] * u[1]).sqrt();
        let lv = (v[0] * v[0] + v[1] * v[1]).sqrt();
        if lu < 1e-12 || lv < 1e-12 {
            return 0.0;
        }
        let cos = ((u[0] * v[0] + u[1] * v[1]) / (lu * lv)).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }

    /// Center-to-center distance to another shape, scene units
    pub fn center_distance(&self, other: &Shape) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Signed shoelace area; positive for counter-clockwise order in y-down
/// coordinates
fn shoelace(pts: &[[f64; 2]]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    sum / 2.0
}

/// A raw scene: shapes plus an identifier, as handed over by the loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(id: impl Into<String>, shapes: Vec<Shape>) -> Self {
        Self {
            id: id.into(),
            shapes,
        }
    }
}
