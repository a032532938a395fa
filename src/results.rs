use crate::error::LabelError;
use crate::labels::LabelCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw score for one class as reported by a classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub index: usize,
    pub score: f32,
}

impl ClassScore {
    pub fn new(index: usize, score: f32) -> Self {
        Self { index, score }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f32,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Ranked labels for one frame: descending score, at most `top_k` entries,
/// none below the threshold. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: Vec<ScoredLabel>,
}

impl ResultSet {
    /// Value held as "previous results" before the first frame arrives.
    pub fn placeholder() -> Self {
        Self {
            entries: vec![ScoredLabel::new("label", 0.0)],
        }
    }

    pub fn build(
        scores: &[ClassScore],
        catalog: &LabelCatalog,
        top_k: usize,
        threshold: f32,
    ) -> Result<Self, LabelError> {
        let mut ranked: Vec<ClassScore> = scores
            .iter()
            .copied()
            .filter(|s| s.score >= threshold)
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_k);
        let entries = ranked
            .into_iter()
            .map(|s| -> Result<ScoredLabel, LabelError> {
                Ok(ScoredLabel::new(catalog.resolve(s.index)?, s.score))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    pub fn top(&self) -> Option<&ScoredLabel> {
        self.entries.first()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels().any(|l| l == label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredLabel> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ScoredLabel> for ResultSet {
    /// Collects entries as given; callers are responsible for ordering.
    fn from_iter<I: IntoIterator<Item = ScoredLabel>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ScoredLabel;
    type IntoIter = std::slice::Iter<'a, ScoredLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, " {}, score={:.2}", entry.label, entry.score)?;
        }
        Ok(())
    }
}
