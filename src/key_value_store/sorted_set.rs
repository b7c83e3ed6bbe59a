use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Score(f64);

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

/// Members ordered by score, ties broken by member name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl SortedSet {
    /// Returns `true` when `member` was not present before.
    pub fn insert(&mut self, member: &str, score: f64) -> bool {
        let previous = self.scores.insert(member.to_string(), score);

        if let Some(previous) = previous {
            self.ordered.remove(&(Score(previous), member.to_string()));
        }

        self.ordered.insert((Score(score), member.to_string()));
        previous.is_none()
    }

    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(Score(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn rank(&self, member: &str) -> Option<usize> {
        let score = self.score(member)?;

        self.ordered
            .iter()
            .position(|(candidate_score, candidate)| {
                *candidate_score == Score(score) && candidate == member
            })
    }

    /// Inclusive range by rank; negative indexes count from the end.
    pub fn range(&self, start: i64, stop: i64) -> Vec<(&str, f64)> {
        let length = self.len() as i64;
        let start = if start < 0 { (length + start).max(0) } else { start };
        let stop = if stop < 0 { length + stop } else { stop.min(length - 1) };

        if start > stop || start >= length {
            return Vec::new();
        }

        self.ordered
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|(score, member)| (member.as_str(), score.0))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ordered
            .iter()
            .map(|(score, member)| (member.as_str(), score.0))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
