//! ═══════════════════════════════════════════════════════════════════════════════
//! SOLUTION — A Selector with a Side and a Mode
//! ═══════════════════════════════════════════════════════════════════════════════
//! A candidate answer to a scene-pair problem: a selector, the side its
//! matches are supposed to live on, and a cardinality mode validated per
//! scene. Match statistics accumulate over the presented pairs; a solution
//! holds once one side matched every pair and the other side none.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::Serialize;

use crate::error::SceneResult;
use crate::nodes::{GroupNode, SceneNode};
use crate::selector::Selector;

/// Post-selection cardinality test per scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Exactly one object survives
    Unique,
    /// At least one object survives
    Exists,
    /// Every original object survives
    All,
}

/// Which side of the problem the selector fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
    Both,
    Fail,
}

/// Selector + side assignment + mode, with running match statistics
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub selector: Selector,
    pub mode: Mode,
    pub main_side: Side,
    pub lchecks: usize,
    pub rchecks: usize,
    pub lmatches: usize,
    pub rmatches: usize,
    /// Ids of the scene pairs this solution was checked against
    pub matched_against: Vec<String>,
    scene_pair_count: usize,
}

impl Solution {
    pub fn new(selector: Selector, mode: Mode, scene_pair_count: usize) -> Self {
        Self {
            selector,
            mode,
            main_side: Side::Both,
            lchecks: 0,
            rchecks: 0,
            lmatches: 0,
            rmatches: 0,
            matched_against: Vec::new(),
            scene_pair_count,
        }
    }

    /// Apply the selector to the whole scene and validate the mode.
    /// Returns the surviving object count on success; also records the
    /// verdict on the scene.
    pub fn check_scene(&self, scene: &mut SceneNode) -> SceneResult<Option<usize>> {
        let group = GroupNode::scene_group(scene, None);
        let total = group.len();
        let result = self.selector.select(&group, scene)?;
        let survivors = result.len();
        let fits = match self.mode {
            Mode::Unique => survivors == 1,
            Mode::Exists => survivors >= 1,
            Mode::All => survivors == total && total > 0,
        };
        scene.fits_solution = Some(fits);
        Ok(if fits { Some(survivors) } else { None })
    }

    /// Check one left/right pair and update counters and side assignment
    pub fn check_scene_pair(
        &mut self,
        left: &mut SceneNode,
        right: &mut SceneNode,
        pair_id: &str,
    ) -> SceneResult<()> {
        self.lchecks += 1;
        if self.check_scene(left)?.is_some() {
            self.lmatches += 1;
        }
        self.rchecks += 1;
        if self.check_scene(right)?.is_some() {
            self.rmatches += 1;
        }
        self.matched_against.push(pair_id.to_string());
        self.main_side = self.classify_side();
        Ok(())
    }

    /// Side classification over the statistics so far
    fn classify_side(&self) -> Side {
        if self.lmatches == 0 && self.rmatches == self.rchecks && self.rchecks > 0 {
            Side::Right
        } else if self.rmatches == 0 && self.lmatches == self.lchecks && self.lchecks > 0 {
            Side::Left
        } else if self.lmatches == self.lchecks && self.rmatches == self.rchecks {
            Side::Both
        } else {
            Side::Fail
        }
    }

    /// One side matched every presented pair, the other side none
    pub fn is_solution(&self) -> bool {
        let n = self.scene_pair_count;
        (self.lmatches == n && self.lchecks == n && self.rmatches == 0)
            || (self.rmatches == n && self.rchecks == n && self.lmatches == 0)
    }

    /// Screens candidate pairs for merge viability: merging cannot rescue
    /// two solutions that already failed on opposite sides.
    pub fn compatible_with(&self, other: &Solution) -> bool {
        if self.main_side == Side::Fail || other.main_side == Side::Fail {
            return false;
        }
        self.main_side == other.main_side
            || self.main_side == Side::Both
            || other.main_side == Side::Both
    }

    /// Merge two candidate solutions into one with the combined selector
    pub fn merged_with(&self, other: &Solution) -> Solution {
        Solution::new(
            self.selector.merged_with(&other.selector),
            self.mode,
            self.scene_pair_count,
        )
    }

    pub fn describe(&self) -> String {
        let mode = match self.mode {
            Mode::Unique => "unique",
            Mode::Exists => "exists",
            Mode::All => "all",
        };
        format!("{} [{:?}/{}]", self.selector.describe(), self.main_side, mode)
    }
}
