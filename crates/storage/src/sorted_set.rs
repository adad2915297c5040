//! Sorted set: members ordered by (score, member)
//!
//! Two structures are kept in lockstep:
//! - `scores`: member → score, for O(1) membership and rescoring
//! - `ordered`: (score, member) in ascending order, for range scans
//!
//! Members with equal scores are ordered byte-wise, which is what makes
//! lexicographic range scans meaningful when every member shares a score.

use recordkv_core::{LexBound, Limit, ScoreBound};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Total order over f64 scores
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Members ordered by score, then byte-wise by member
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl SortedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member or update its score
    ///
    /// Returns true if the member was not present before. NaN scores must
    /// be rejected by the caller.
    pub fn insert(&mut self, member: String, score: f64) -> bool {
        // -0.0 and 0.0 must land on the same position
        let score = if score == 0.0 { 0.0 } else { score };
        match self.scores.insert(member.clone(), score) {
            Some(old) => {
                self.ordered.remove(&(Score(old), member.clone()));
                self.ordered.insert((Score(score), member));
                false
            }
            None => {
                self.ordered.insert((Score(score), member));
                true
            }
        }
    }

    /// Remove a member, returning true if it was present
    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(Score(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    /// Score of a member
    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Members within a lexicographic range, in set order
    pub fn range_by_lex(&self, min: &LexBound, max: &LexBound, limit: Option<Limit>) -> Vec<String> {
        let matching = self
            .ordered
            .iter()
            .map(|(_, member)| member)
            .skip_while(|m| !min.admits_as_min(m))
            .take_while(|m| max.admits_as_max(m))
            .cloned();
        apply_limit(matching, limit)
    }

    /// Members and scores within a score range, in set order
    pub fn range_by_score(
        &self,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<Limit>,
    ) -> Vec<(String, f64)> {
        let matching = self
            .ordered
            .iter()
            .skip_while(|(score, _)| !min.admits_as_min(score.0))
            .take_while(|(score, _)| max.admits_as_max(score.0))
            .map(|(score, member)| (member.clone(), score.0));
        apply_limit(matching, limit)
    }
}

fn apply_limit<T>(items: impl Iterator<Item = T>, limit: Option<Limit>) -> Vec<T> {
    match limit {
        Some(Limit { offset, count }) => items.skip(offset).take(count).collect(),
        None => items.collect(),
    }
}
