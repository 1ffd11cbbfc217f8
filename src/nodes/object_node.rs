//! Per-object perception cache.

use std::collections::HashMap;

use crate::features::Percept;
use crate::selector::Selector;

/// Cache entry: one attribute percept, or one relation percept per partner
#[derive(Debug, Clone)]
pub(crate) enum PerceptSlot {
    Attr(Percept),
    Rels(Vec<Percept>),
}

/// Wraps one movable shape with its time-indexed percepts
#[derive(Debug, Default)]
pub struct ObjectNode {
    /// Index of the owned shape in the scene arena
    pub shape_idx: usize,
    /// time key → feature key → percept(s)
    times: HashMap<String, HashMap<&'static str, PerceptSlot>>,
    /// Selectors that currently describe this object
    pub selectors: Vec<Selector>,
}

impl ObjectNode {
    pub fn new(shape_idx: usize) -> Self {
        Self {
            shape_idx,
            times: HashMap::new(),
            selectors: Vec::new(),
        }
    }

    pub fn cached_attr(&self, time: &str, key: &str) -> Option<&Percept> {
        match self.times.get(time)?.get(key)? {
            PerceptSlot::Attr(p) => Some(p),
            PerceptSlot::Rels(_) => None,
        }
    }

    /// Linear scan of the per-key relation list for the given partner
    pub fn cached_rel(&self, time: &str, key: &str, other_shape: usize) -> Option<&Percept> {
        match self.times.get(time)?.get(key)? {
            PerceptSlot::Rels(list) => list.iter().find(|p| p.other == Some(other_shape)),
            PerceptSlot::Attr(_) => None,
        }
    }

    /// Every cached relation percept of this key at this time
    pub fn cached_rels(&self, time: &str, key: &str) -> Vec<&Percept> {
        match self.times.get(time).and_then(|m| m.get(key)) {
            Some(PerceptSlot::Rels(list)) => list.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Insert an attribute percept; at most one per (time, key)
    pub(crate) fn insert_attr(&mut self, time: &str, percept: Percept) {
        self.times
            .entry(time.to_string())
            .or_default()
            .insert(percept.key, PerceptSlot::Attr(percept));
    }

    /// Append a relation percept; at most one per (time, key, other)
    pub(crate) fn insert_rel(&mut self, time: &str, percept: Percept) {
        let slot = self
            .times
            .entry(time.to_string())
            .or_default()
            .entry(percept.key)
            .or_insert_with(|| PerceptSlot::Rels(Vec::new()));
        if let PerceptSlot::Rels(list) = slot {
            if !list.iter().any(|p| p.other == percept.other) {
                list.push(percept);
            }
        }
    }

    /// Number of cached entries under a time key (relations count per partner)
    pub fn cached_count(&self, time: &str) -> usize {
        self.times
            .get(time)
            .map(|m| {
                m.values()
                    .map(|slot| match slot {
                        PerceptSlot::Attr(_) => 1,
                        PerceptSlot::Rels(list) => list.len(),
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Active percepts at a time, for summaries
    pub fn active_percepts(&self, time: &str, threshold: f64) -> Vec<&Percept> {
        let mut out = Vec::new();
        if let Some(m) = self.times.get(time) {
            for slot in m.values() {
                match slot {
                    PerceptSlot::Attr(p) => {
                        if p.activity >= threshold {
                            out.push(p);
                        }
                    }
                    PerceptSlot::Rels(list) => {
                        out.extend(list.iter().filter(|p| p.activity >= threshold));
                    }
                }
            }
        }
        out.sort_by(|a, b| a.key.cmp(b.key));
        out
    }
}
