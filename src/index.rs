//! Knowledge index: a small flat inner-product index over a directory of
//! text documents, persisted as a JSON artifact plus a line-oriented
//! `.meta` sidecar of (doc_id, text) records.
//!
//! Load policy: a persisted index that cannot be read back, or whose sidecar
//! disagrees with it, fails loudly with `IndexCorruption`. We never silently
//! rebuild over a broken artifact; rebuilds happen offline via `kb_index`.

use crate::embeddings::Embedder;
use crate::error::{InsuraError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    version: u32,
    dim: usize,
    built_at: DateTime<Utc>,
    vectors: Vec<Vec<f32>>,
}

/// Flat cosine index over the knowledge corpus. One instance per process,
/// opened once and shared behind an `Arc`; concurrent rebuild-while-search
/// is unsupported.
pub struct KnowledgeIndex {
    embedder: Arc<dyn Embedder>,
    index_path: PathBuf,
    vectors: Vec<Vec<f32>>,
    /// Parallel to `vectors`: (doc_id, raw text). Doc ids are opaque and
    /// need not be unique.
    docs: Vec<(String, String)>,
}

impl std::fmt::Debug for KnowledgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeIndex")
            .field("index_path", &self.index_path)
            .field("vectors", &self.vectors.len())
            .field("docs", &self.docs.len())
            .finish_non_exhaustive()
    }
}

impl KnowledgeIndex {
    /// Load the persisted index if both artifacts exist, otherwise build
    /// from the corpus directory. An empty or missing corpus yields an
    /// empty index, not an error.
    pub async fn open(
        knowledge_dir: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let index_path = index_path.as_ref().to_path_buf();
        let meta_path = meta_path_for(&index_path);

        if index_path.is_file() && meta_path.is_file() {
            let mut index = Self::create(index_path, embedder);
            index.load()?;
            info!("Loaded knowledge index ({} documents)", index.len());
            return Ok(index);
        }

        let mut index = Self::create(index_path, embedder);
        index.build(knowledge_dir).await?;
        Ok(index)
    }

    /// Empty index bound to a persistence path; nothing is read or written
    /// until [`build`](Self::build) runs. This is the rebuild entry point:
    /// it skips loading, so a corrupt artifact can be overwritten.
    pub fn create(index_path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index_path: index_path.into(),
            vectors: Vec::new(),
            docs: Vec::new(),
        }
    }

    /// (Re)build the index from every `.md`/`.txt` file in `corpus_dir`,
    /// then persist it. File name is the document id. Files are walked in
    /// sorted order so builds are reproducible.
    pub async fn build(&mut self, corpus_dir: impl AsRef<Path>) -> Result<()> {
        let corpus_dir = corpus_dir.as_ref();
        let mut contents: Vec<(String, String)> = Vec::new();

        if corpus_dir.is_dir() {
            let mut names: Vec<_> = std::fs::read_dir(corpus_dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    matches!(
                        path.extension().and_then(|ext| ext.to_str()),
                        Some("md") | Some("txt")
                    )
                })
                .collect();
            names.sort();
            for path in names {
                let doc_id = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let text = std::fs::read_to_string(&path)?;
                contents.push((doc_id, text));
            }
        } else {
            warn!(
                "Knowledge directory {:?} missing, building empty index",
                corpus_dir
            );
        }

        if contents.is_empty() {
            // Degrade-to-empty: keep the embedder's dimension, persist nothing.
            self.vectors.clear();
            self.docs.clear();
            info!("Built empty knowledge index ({} dims)", self.embedder.dimensions());
            return Ok(());
        }

        let mut vectors = Vec::with_capacity(contents.len());
        for (_, text) in &contents {
            vectors.push(self.embedder.embed(text).await?);
        }
        self.vectors = vectors;
        self.docs = contents;
        self.persist()?;
        info!("Built knowledge index ({} documents)", self.len());
        Ok(())
    }

    /// Embed each query, take the top_k nearest documents per query, then
    /// flatten across queries preserving first-seen order with stable
    /// de-duplication by document index (not by text content).
    pub async fn search(&self, queries: &[String], top_k: usize) -> Result<Vec<String>> {
        if self.vectors.is_empty() || queries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut rows: Vec<Vec<usize>> = Vec::with_capacity(queries.len());
        for query in queries {
            let q = self.embedder.embed(query).await?;
            rows.push(self.nearest(&q, top_k));
        }

        let mut seen = std::collections::HashSet::new();
        let mut results = Vec::new();
        for row in rows {
            for idx in row {
                if seen.insert(idx) {
                    results.push(self.docs[idx].1.clone());
                }
            }
        }
        debug!("Knowledge search returned {} documents", results.len());
        Ok(results)
    }

    fn nearest(&self, query: &[f32], top_k: usize) -> Vec<usize> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (idx, dot(query, vec)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        scored.into_iter().map(|(idx, _)| idx).collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let artifact = IndexArtifact {
            version: INDEX_FORMAT_VERSION,
            dim: self.embedder.dimensions(),
            built_at: Utc::now(),
            vectors: self.vectors.clone(),
        };
        std::fs::write(&self.index_path, serde_json::to_vec(&artifact)?)?;

        let mut meta = String::new();
        for (doc_id, text) in &self.docs {
            meta.push_str(&escape_field(doc_id));
            meta.push('\t');
            meta.push_str(&escape_field(text));
            meta.push('\n');
        }
        std::fs::write(meta_path_for(&self.index_path), meta)?;
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        let raw = std::fs::read_to_string(&self.index_path)?;
        let artifact: IndexArtifact =
            serde_json::from_str(&raw).map_err(|e| InsuraError::IndexCorruption {
                message: format!("unreadable index artifact {:?}: {}", self.index_path, e),
            })?;
        if artifact.version != INDEX_FORMAT_VERSION {
            return Err(InsuraError::IndexCorruption {
                message: format!(
                    "index format version {} unsupported (expected {})",
                    artifact.version, INDEX_FORMAT_VERSION
                ),
            });
        }
        if let Some(vec) = artifact.vectors.iter().find(|v| v.len() != artifact.dim) {
            return Err(InsuraError::IndexCorruption {
                message: format!(
                    "vector of length {} does not match declared dim {}",
                    vec.len(),
                    artifact.dim
                ),
            });
        }

        let meta_path = meta_path_for(&self.index_path);
        let meta = std::fs::read_to_string(&meta_path)?;
        let mut docs = Vec::new();
        for (line_no, line) in meta.lines().enumerate() {
            let Some((doc_id, text)) = line.split_once('\t') else {
                return Err(InsuraError::IndexCorruption {
                    message: format!("{:?} line {}: missing tab separator", meta_path, line_no + 1),
                });
            };
            docs.push((unescape_field(doc_id), unescape_field(text)));
        }

        if docs.len() != artifact.vectors.len() {
            return Err(InsuraError::IndexCorruption {
                message: format!(
                    "metadata holds {} records but index holds {} vectors",
                    docs.len(),
                    artifact.vectors.len()
                ),
            });
        }

        self.vectors = artifact.vectors;
        self.docs = docs;
        Ok(())
    }
}

fn meta_path_for(index_path: &Path) -> PathBuf {
    let mut os = index_path.as_os_str().to_owned();
    os.push(".meta");
    PathBuf::from(os)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// Documents may span many lines; records must stay one per line.
fn escape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
