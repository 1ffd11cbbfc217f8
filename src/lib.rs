//! ═══════════════════════════════════════════════════════════════════════════════
//! SCENESENSE — Graded Perception over 2D Physical Scenes
//! ═══════════════════════════════════════════════════════════════════════════════
//! Perceives rigid-body scenes through a fixed taxonomy of graded features —
//! object attributes, group attributes and binary relations, including
//! counterfactual probes run in a rollback sandbox — and reasons over them
//! with compositional selectors that distinguish left-side from right-side
//! example scenes.
//!
//! The physics engine stays external behind the [`physics::PhysicsWorld`]
//! trait; [`flatworld`] is the deterministic in-crate world the tests and the
//! demo binary run against.
//! ═══════════════════════════════════════════════════════════════════════════════

// ═══════════════════════════════════════════════════════════════════════════════
// FOUNDATION — errors, settings, membership math, geometry
// ═══════════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod geom;
pub mod math;

// Re-export common error types
pub use error::{SceneError, SceneResult};

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATION — the engine seam, the test world, the oracle
// ═══════════════════════════════════════════════════════════════════════════════

pub mod flatworld;
pub mod oracle;
pub mod physics;

// ═══════════════════════════════════════════════════════════════════════════════
// PERCEPTION — feature library and the scene graph it fills
// ═══════════════════════════════════════════════════════════════════════════════

pub mod features;
pub mod nodes;

// ═══════════════════════════════════════════════════════════════════════════════
// REASONING — selectors and solutions
// ═══════════════════════════════════════════════════════════════════════════════

pub mod selector;
pub mod solution;

pub use config::PerceptionConfig;
pub use features::{
    Collision, Percept, ShapeClass, SpatialAnalyzer, SpatialDir, StabilityKind, SupportKind,
};
pub use flatworld::FlatWorld;
pub use geom::{BBox, Scene, Shape, ShapeKind, FRAME_ID, GROUND_ID};
pub use nodes::{GroupNode, ObjectNode, SceneNode};
pub use oracle::{Direction, Magnitude, Oracle};
pub use physics::{BodyId, CollisionEvent, Contact, PhysicsWorld, SnapshotId};
pub use selector::{AttrMatcher, MatcherTarget, RelMatcher, Selector, SelectorType};
pub use solution::{Mode, Side, Solution};
