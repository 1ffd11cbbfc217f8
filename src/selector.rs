//! ═══════════════════════════════════════════════════════════════════════════════
//! SELECTOR — Compositional Predicates over Scene Nodes
//! ═══════════════════════════════════════════════════════════════════════════════
//! A selector is a conjunction of attribute matchers (object- and
//! group-targeted) and relation matchers. Relation matchers carry a nested,
//! relation-free partner selector; quantification over partners depends on
//! polarity: negation is universal ("nobody stands in this relation"), a
//! unique partner selector demands exactly one, anything else at least one.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::cell::Cell;

use serde::Serialize;

use crate::error::{SceneError, SceneResult};
use crate::features::{self, START_TIME};
use crate::nodes::{GroupNode, SceneNode};

/// What an attribute matcher is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatcherTarget {
    Object,
    Group,
}

/// Predicate callback that replaces a selector's relation check
pub type TestFn<'a> = &'a mut dyn FnMut(&mut SceneNode, usize) -> SceneResult<bool>;

/// Matches one attribute percept by label and activation polarity
#[derive(Debug, Clone, Serialize)]
pub struct AttrMatcher {
    pub key: String,
    pub label: String,
    pub active: bool,
    pub time: String,
    pub target: MatcherTarget,
    pub constant: bool,
}

impl AttrMatcher {
    /// Object-attribute matcher; constancy comes from the registry
    pub fn object(key: &str, label: &str) -> SceneResult<Self> {
        let desc = features::obj_attr(key)
            .ok_or_else(|| SceneError::UnknownFeature(key.to_string()))?;
        Ok(Self {
            key: key.to_string(),
            label: label.to_string(),
            active: true,
            time: START_TIME.to_string(),
            target: MatcherTarget::Object,
            constant: desc.constant,
        })
    }

    /// Group-attribute matcher
    pub fn group(key: &str, label: &str) -> SceneResult<Self> {
        let desc = features::group_attr(key)
            .ok_or_else(|| SceneError::UnknownFeature(key.to_string()))?;
        Ok(Self {
            key: key.to_string(),
            label: label.to_string(),
            active: true,
            time: START_TIME.to_string(),
            target: MatcherTarget::Group,
            constant: desc.constant,
        })
    }

    pub fn negated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn at(mut self, time: &str) -> Self {
        self.time = time.to_string();
        self
    }

    fn resolved_time(&self) -> &str {
        if self.constant {
            START_TIME
        } else {
            &self.time
        }
    }

    pub fn matches_object(&self, scene: &mut SceneNode, obj: usize) -> SceneResult<bool> {
        let p = scene.get_attr(obj, &self.key, Some(self.resolved_time()))?;
        let threshold = scene.activation_threshold();
        Ok(p.label == self.label && (p.activity >= threshold) == self.active)
    }

    pub fn matches_group(&self, scene: &mut SceneNode, group: &GroupNode) -> SceneResult<bool> {
        let p = group.get_attr(scene, &self.key, Some(self.resolved_time()))?;
        let threshold = scene.activation_threshold();
        Ok(p.label == self.label && (p.activity >= threshold) == self.active)
    }

    pub fn complexity(&self) -> u32 {
        let mut c = 1;
        if self.time != START_TIME {
            c += 1;
        }
        if !self.active {
            c += 2;
        }
        c
    }

    /// Dedup identity: later matchers with the same signature win on merge
    fn signature(&self) -> (&str, &str, MatcherTarget) {
        (&self.key, &self.time, self.target)
    }

    pub fn equals(&self, other: &AttrMatcher) -> bool {
        self.key == other.key
            && self.label == other.label
            && self.active == other.active
            && self.time == other.time
            && self.target == other.target
    }
}

/// Matches a relation to partners described by a nested selector
#[derive(Debug, Clone, Serialize)]
pub struct RelMatcher {
    pub key: String,
    pub label: String,
    pub active: bool,
    pub time: String,
    pub constant: bool,
    pub symmetric: bool,
    pub other_sel: Box<Selector>,
}

impl RelMatcher {
    /// The partner selector must itself be relation-free
    pub fn new(key: &str, label: &str, other_sel: Selector) -> SceneResult<Self> {
        let desc = features::obj_rel(key)
            .ok_or_else(|| SceneError::UnknownFeature(key.to_string()))?;
        if !other_sel.rels.is_empty() {
            return Err(SceneError::IllegalNesting);
        }
        Ok(Self {
            key: key.to_string(),
            label: label.to_string(),
            active: true,
            time: START_TIME.to_string(),
            constant: desc.constant,
            symmetric: desc.symmetric,
            other_sel: Box::new(other_sel),
        })
    }

    pub fn negated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn at(mut self, time: &str) -> Self {
        self.time = time.to_string();
        self
    }

    fn resolved_time(&self) -> &str {
        if self.constant {
            START_TIME
        } else {
            &self.time
        }
    }

    /// Partner quantification: negation is universal, a unique partner
    /// selector wants exactly one partner, otherwise at least one.
    pub fn matches(
        &self,
        scene: &mut SceneNode,
        obj: usize,
        others: Option<&[usize]>,
    ) -> SceneResult<bool> {
        let others: Vec<usize> = match others {
            Some(o) => o.to_vec(),
            None => (0..scene.obj_count()).filter(|&o| o != obj).collect(),
        };
        let time = self.resolved_time().to_string();
        let mut matching = 0usize;
        for o in others {
            if o == obj {
                continue;
            }
            let mut holds = |scene: &mut SceneNode, partner: usize| -> SceneResult<bool> {
                let p = scene.get_rel(obj, &self.key, partner, Some(&time))?;
                let threshold = scene.activation_threshold();
                Ok(p.label == self.label && p.activity >= threshold)
            };
            if self.other_sel.matches_object(scene, o, None, Some(&mut holds))? {
                matching += 1;
            }
        }
        if !self.active {
            Ok(matching == 0)
        } else if self.other_sel.unique {
            Ok(matching == 1)
        } else {
            Ok(matching >= 1)
        }
    }

    pub fn complexity(&self) -> u32 {
        let mut c = 1;
        if self.time != START_TIME {
            c += 1;
        }
        if !self.active {
            c += 2;
        }
        c + self.other_sel.complexity()
    }

    pub fn equals(&self, other: &RelMatcher) -> bool {
        self.key == other.key
            && self.label == other.label
            && self.active == other.active
            && self.time == other.time
            && self.other_sel.equals(&other.other_sel)
    }
}

/// Overall shape of a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorType {
    Blank,
    Object,
    Group,
    Mixed,
}

/// Conjunction of attribute and relation matchers
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selector {
    pub obj_attrs: Vec<AttrMatcher>,
    pub grp_attrs: Vec<AttrMatcher>,
    pub rels: Vec<RelMatcher>,
    /// Changes partner quantification when this selector is nested in a
    /// relation matcher; unused anywhere else.
    pub unique: bool,
    #[serde(skip)]
    cached_complexity: Cell<Option<u32>>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Add an attribute matcher; an existing matcher with the same
    /// (key, time, target) signature is replaced — later wins.
    pub fn add_attr(&mut self, matcher: AttrMatcher) {
        let list = match matcher.target {
            MatcherTarget::Object => &mut self.obj_attrs,
            MatcherTarget::Group => &mut self.grp_attrs,
        };
        list.retain(|m| m.signature() != matcher.signature());
        list.push(matcher);
        self.cached_complexity.set(None);
    }

    /// Add a relation matcher; an existing one with the same key, time and
    /// equal partner selector is replaced — later wins.
    pub fn add_rel(&mut self, matcher: RelMatcher) {
        self.rels.retain(|m| {
            !(m.key == matcher.key
                && m.time == matcher.time
                && m.other_sel.equals(&matcher.other_sel))
        });
        self.rels.push(matcher);
        self.cached_complexity.set(None);
    }

    pub fn with_attr(mut self, matcher: AttrMatcher) -> Self {
        self.add_attr(matcher);
        self
    }

    pub fn with_rel(mut self, matcher: RelMatcher) -> Self {
        self.add_rel(matcher);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.obj_attrs.is_empty() && self.grp_attrs.is_empty() && self.rels.is_empty()
    }

    pub fn sel_type(&self) -> SelectorType {
        if self.is_blank() {
            SelectorType::Blank
        } else if self.grp_attrs.is_empty() {
            SelectorType::Object
        } else if self.obj_attrs.is_empty() && self.rels.is_empty() {
            SelectorType::Group
        } else {
            SelectorType::Mixed
        }
    }

    /// Matcher count weighted by non-start times, negation and nesting;
    /// orders candidate selectors from simple to complex.
    pub fn complexity(&self) -> u32 {
        self.obj_attrs
            .iter()
            .chain(self.grp_attrs.iter())
            .map(AttrMatcher::complexity)
            .sum::<u32>()
            + self.rels.iter().map(RelMatcher::complexity).sum::<u32>()
    }

    /// Complexity with staleness checking: a cached value that disagrees
    /// with recomputation means the selector was mutated behind our back.
    pub fn checked_complexity(&self) -> SceneResult<u32> {
        let fresh = self.complexity();
        if let Some(cached) = self.cached_complexity.get() {
            if cached != fresh {
                return Err(SceneError::Internal(format!(
                    "stale cached complexity: {} vs {}",
                    cached, fresh
                )));
            }
        }
        self.cached_complexity.set(Some(fresh));
        Ok(fresh)
    }

    /// Object-level match: every object attribute matcher holds, and either
    /// the supplied test replaces the relation check or every relation
    /// matcher holds.
    pub fn matches_object(
        &self,
        scene: &mut SceneNode,
        obj: usize,
        others: Option<&[usize]>,
        test_fn: Option<TestFn<'_>>,
    ) -> SceneResult<bool> {
        for m in &self.obj_attrs {
            if !m.matches_object(scene, obj)? {
                return Ok(false);
            }
        }
        match test_fn {
            Some(f) => f(scene, obj),
            None => {
                for r in &self.rels {
                    if !r.matches(scene, obj, others)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Filter a group through this selector.
    ///
    /// A blank selector returns the group unchanged, selectors and all.
    /// Otherwise object and mixed selectors filter the member shapes; group
    /// and mixed selectors then gate the result on the group attributes,
    /// collapsing to an empty group (still carrying the selector) when one
    /// fails.
    pub fn select(&self, group: &GroupNode, scene: &mut SceneNode) -> SceneResult<GroupNode> {
        if self.is_blank() {
            return Ok(group.clone());
        }
        let merged = match group.selectors.first() {
            Some(first) => first.merged_with(self),
            None => self.clone(),
        };

        let ty = self.sel_type();
        let mut members = group.members().to_vec();
        if matches!(ty, SelectorType::Object | SelectorType::Mixed) {
            let mut kept = Vec::with_capacity(members.len());
            for shape_idx in members {
                let Some(obj) = scene.obj_of_shape(shape_idx) else {
                    continue;
                };
                if self.matches_object(scene, obj, None, None)? {
                    kept.push(shape_idx);
                }
            }
            members = kept;
        }

        let mut out = group.refined(members);
        out.selectors = vec![merged];
        if matches!(ty, SelectorType::Group | SelectorType::Mixed) {
            for m in &self.grp_attrs {
                if !m.matches_group(scene, &out)? {
                    let mut empty = GroupNode::empty();
                    empty.selectors = out.selectors;
                    return Ok(empty);
                }
            }
        }

        // Bookkeeping: surviving objects remember the selector describing them
        for &shape_idx in out.members() {
            if let Some(obj) = scene.obj_of_shape(shape_idx) {
                let node = scene.obj_node_mut(obj);
                if !node.selectors.iter().any(|s| s.equals(self)) {
                    node.selectors.push(self.clone());
                }
            }
        }
        Ok(out)
    }

    /// Concatenate matcher lists with later-wins dedup
    pub fn merged_with(&self, other: &Selector) -> Selector {
        let mut out = self.clone();
        out.cached_complexity.set(None);
        for m in &other.obj_attrs {
            out.add_attr(m.clone());
        }
        for m in &other.grp_attrs {
            out.add_attr(m.clone());
        }
        for r in &other.rels {
            out.add_rel(r.clone());
        }
        out.unique = out.unique || other.unique;
        out
    }

    /// Structural equality, ignoring the complexity cache
    pub fn equals(&self, other: &Selector) -> bool {
        self.unique == other.unique
            && self.obj_attrs.len() == other.obj_attrs.len()
            && self.grp_attrs.len() == other.grp_attrs.len()
            && self.rels.len() == other.rels.len()
            && self
                .obj_attrs
                .iter()
                .zip(&other.obj_attrs)
                .all(|(a, b)| a.equals(b))
            && self
                .grp_attrs
                .iter()
                .zip(&other.grp_attrs)
                .all(|(a, b)| a.equals(b))
            && self.rels.iter().zip(&other.rels).all(|(a, b)| a.equals(b))
    }

    /// Short human-readable rendering, e.g. `small ∧ left_of(rect)`
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for m in self.obj_attrs.iter().chain(self.grp_attrs.iter()) {
            let mut s = String::new();
            if !m.active {
                s.push('!');
            }
            s.push_str(&m.label);
            parts.push(s);
        }
        for r in &self.rels {
            let inner = r.other_sel.describe();
            let mut s = String::new();
            if !r.active {
                s.push('!');
            }
            s.push_str(&format!("{}({})", r.key, inner));
            parts.push(s);
        }
        if parts.is_empty() {
            "anything".to_string()
        } else {
            parts.join(" ∧ ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> AttrMatcher {
        AttrMatcher::object("small", "small").unwrap()
    }

    fn rect_sel() -> Selector {
        Selector::new().with_attr(AttrMatcher::object("shape", "rectangle").unwrap())
    }

    #[test]
    fn test_selector_types() {
        assert_eq!(Selector::new().sel_type(), SelectorType::Blank);
        let obj = Selector::new().with_attr(small());
        assert_eq!(obj.sel_type(), SelectorType::Object);
        let grp = Selector::new().with_attr(AttrMatcher::group("count", "2").unwrap());
        assert_eq!(grp.sel_type(), SelectorType::Group);
        let mixed = obj.clone().with_attr(AttrMatcher::group("count", "2").unwrap());
        assert_eq!(mixed.sel_type(), SelectorType::Mixed);
    }

    #[test]
    fn test_illegal_nesting_rejected() {
        let inner_with_rel = Selector::new()
            .with_rel(RelMatcher::new("touch", "touch", Selector::new()).unwrap());
        let err = RelMatcher::new("left_of", "left_of", inner_with_rel);
        assert!(matches!(err, Err(SceneError::IllegalNesting)));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AttrMatcher::object("sparkles", "x").is_err());
        assert!(AttrMatcher::group("sparkles", "x").is_err());
        assert!(RelMatcher::new("sparkles", "x", Selector::new()).is_err());
    }

    #[test]
    fn test_complexity_weights() {
        let plain = Selector::new().with_attr(small());
        assert_eq!(plain.complexity(), 1);
        let timed = Selector::new().with_attr(small().at("end"));
        assert_eq!(timed.complexity(), 2);
        let negated = Selector::new().with_attr(small().negated());
        assert_eq!(negated.complexity(), 3);
        let with_rel = Selector::new()
            .with_rel(RelMatcher::new("left_of", "left_of", rect_sel()).unwrap());
        // 1 for the rel matcher + 1 for the nested shape matcher
        assert_eq!(with_rel.complexity(), 2);
    }

    #[test]
    fn test_checked_complexity_detects_staleness() {
        let sel = Selector::new().with_attr(small());
        assert_eq!(sel.checked_complexity().unwrap(), 1);
        // Behind-the-back mutation: bypass add_attr's cache reset
        let mut broken = sel.clone();
        broken.checked_complexity().unwrap();
        broken.obj_attrs.push(small().negated().at("end"));
        assert!(broken.checked_complexity().is_err());
    }

    #[test]
    fn test_merge_dedup_later_wins() {
        let a = Selector::new().with_attr(small());
        let b = Selector::new().with_attr(AttrMatcher {
            label: "not-actually-small".to_string(),
            ..small()
        });
        let merged = a.merged_with(&b);
        assert_eq!(merged.obj_attrs.len(), 1);
        assert_eq!(merged.obj_attrs[0].label, "not-actually-small");
    }

    #[test]
    fn test_merge_idempotent() {
        let sel = Selector::new()
            .with_attr(small())
            .with_rel(RelMatcher::new("left_of", "left_of", rect_sel()).unwrap());
        let merged = sel.merged_with(&sel);
        assert!(merged.equals(&sel));
    }

    #[test]
    fn test_clone_structurally_independent() {
        let sel = Selector::new().with_attr(small());
        let mut clone = sel.clone();
        assert!(clone.equals(&sel));
        clone.add_attr(small().negated().at("end"));
        assert!(!clone.equals(&sel));
        assert_eq!(sel.obj_attrs.len(), 1);
    }

    #[test]
    fn test_describe() {
        let sel = Selector::new()
            .with_attr(small())
            .with_rel(RelMatcher::new("left_of", "left_of", rect_sel()).unwrap());
        let text = sel.describe();
        assert!(text.contains("small"));
        assert!(text.contains("left_of(rectangle)"));
    }
}
