use std::collections::HashSet;

/// Set of normalized identities accepted so far across the whole run.
///
/// The run controller owns the single instance and lends it mutably to one
/// source harvest at a time, in source order. Later sources therefore see
/// every identity earlier sources accepted, including synthetic ones.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.seen.contains(identity)
    }

    /// Registers an identity. Returns false if it was already present.
    pub fn insert(&mut self, identity: impl Into<String>) -> bool {
        self.seen.insert(identity.into())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
