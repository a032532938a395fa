use crate::error::LabelError;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Maps model class indices to human-readable labels.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: HashMap<usize, String>,
}

impl LabelCatalog {
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&text)?;
        debug!(path = %path.display(), count = catalog.len(), "loaded labels");
        Ok(catalog)
    }

    /// Parses `<index> <label>` lines. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self, LabelError> {
        let mut labels = HashMap::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (index, label) = parse_line(line).ok_or_else(|| LabelError::Malformed {
                line: number + 1,
                text: line.to_string(),
            })?;
            labels.insert(index, label.to_string());
        }
        Ok(Self { labels })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn resolve(&self, index: usize) -> Result<&str, LabelError> {
        self.get(index).ok_or(LabelError::Missing(index))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(usize, String)> for LabelCatalog {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

fn parse_line(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_start();
    let digits = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
    if digits == 0 {
        return None;
    }
    let index = line[..digits].parse().ok()?;
    let label = line[digits..].trim();
    if label.is_empty() {
        return None;
    }
    Some((index, label))
}
