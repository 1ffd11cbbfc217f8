//! ═══════════════════════════════════════════════════════════════════════════════
//! NODES — Scene Graph with Perception Caching
//! ═══════════════════════════════════════════════════════════════════════════════
//! A SceneNode owns the shape arena, one ObjectNode per movable shape, the
//! recorded collision list and the oracle. Percepts are cached per node under
//! (named time, feature key); constant features always resolve against
//! "start". Group nodes carry their own attribute cache, shared by reference
//! across clones so refinements of a group reuse earlier work.
//! ═══════════════════════════════════════════════════════════════════════════════

mod group_node;
mod object_node;
mod scene_node;

pub use group_node::GroupNode;
pub use object_node::ObjectNode;
pub use scene_node::SceneNode;
