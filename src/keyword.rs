//! Keyword-overlap retriever: a no-embedding fallback over the same corpus
//! directory. Scores each document by summed hint occurrence counts and
//! returns the best-scoring documents, each prefixed with its file name.

use crate::error::Result;
use std::path::Path;

pub const DEFAULT_TOP_K: usize = 3;

pub struct KeywordRetriever {
    docs: Vec<(String, String)>,
}

impl KeywordRetriever {
    /// Read every `.md` file in `dir`. A missing directory yields an empty
    /// retriever, matching the index's degrade-to-empty policy.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut docs = Vec::new();
        if dir.is_dir() {
            let mut paths: Vec<_> = std::fs::read_dir(dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("md"))
                .collect();
            paths.sort();
            for path in paths {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let text = std::fs::read_to_string(&path)?;
                docs.push((name, text));
            }
        }
        Ok(Self { docs })
    }

    /// Top documents by summed hint-occurrence count; zero-scoring documents
    /// are dropped. Ties keep corpus order.
    pub fn retrieve(&self, hints: &[String], top_k: usize) -> Vec<String> {
        if hints.is_empty() || self.docs.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, usize)> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(idx, (_, content))| {
                let score: usize = hints.iter().map(|h| content.matches(h.as_str()).count()).sum();
                (score > 0).then_some((score, idx))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(top_k)
            .map(|(_, idx)| {
                let (name, content) = &self.docs[idx];
                format!("{}:\n{}", name, content)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
