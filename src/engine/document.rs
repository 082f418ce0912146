//! Paragraph arena.
//!
//! The document is stored as an ordered list of paragraphs addressed by
//! stable index, each carrying a content hash recomputed only when that
//! paragraph is edited. Cache keys (issue cache, verdict cache) are built
//! from `(index, hash)` / `hash`, so a pass over an unchanged document never
//! rehashes anything.

use std::hash::{Hash, Hasher};

/// Fast non-cryptographic content hash. Collision resistance only needs to
/// hold within one editing session, so the std hasher is plenty.
pub fn content_hash(text: &str) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// One paragraph with its cached content hash.
#[derive(Debug, Clone)]
pub struct Paragraph {
    text: String,
    hash: u64,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let hash = content_hash(&text);
        Paragraph { text, hash }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

/// An ordered paragraph list, the unit a lint pass runs over.
#[derive(Debug, Clone, Default)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
}

impl Document {
    /// Split `text` into paragraphs on newlines. Empty lines are kept as
    /// empty paragraphs so indices line up with the editor's line model.
    pub fn new(text: &str) -> Self {
        Document { paragraphs: text.split('\n').map(Paragraph::new).collect() }
    }

    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Document { paragraphs: paragraphs.into_iter().map(Paragraph::new).collect() }
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn paragraph(&self, idx: usize) -> Option<&Paragraph> {
        self.paragraphs.get(idx)
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs.iter()
    }

    /// Borrowed paragraph texts in order (the shape document rules consume).
    pub fn texts(&self) -> Vec<&str> {
        self.paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    /// Replace one paragraph's text, rehashing only that paragraph.
    /// Out-of-range indices are ignored.
    pub fn replace_paragraph(&mut self, idx: usize, text: impl Into<String>) {
        if let Some(p) = self.paragraphs.get_mut(idx) {
            *p = Paragraph::new(text);
        }
    }

    pub fn insert_paragraph(&mut self, idx: usize, text: impl Into<String>) {
        let idx = idx.min(self.paragraphs.len());
        self.paragraphs.insert(idx, Paragraph::new(text));
    }

    pub fn remove_paragraph(&mut self, idx: usize) {
        if idx < self.paragraphs.len() {
            self.paragraphs.remove(idx);
        }
    }
}
