//! Batch accounting for index-bounded draw ranges.
//!
//! Every component emitting indexed geometry allocates and grows batch
//! records through an [`IndexCache`]. The cache only accounts; callers are
//! responsible for opening a new entry before a write would push an entry
//! past the representable-index ceiling.

/// A contiguous, index-safe run of geometry drawable with one indexed draw
/// call.
///
/// Index values stored for an entry are relative to `vertex_offset`; a
/// consumer issues the draw with `vertex_offset` as the base vertex and
/// `index_offset..index_offset + index_count` as the index-buffer sub-range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexCacheEntry {
    pub vertex_offset: usize,
    pub vertex_count: usize,
    pub index_offset: usize,
    pub index_count: usize,
}

/// Ordered list of batch records for one output stream.
///
/// Entries are appended in creation order and never reordered.
#[derive(Debug, Clone, Default)]
pub struct IndexCache {
    entries: Vec<IndexCacheEntry>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries, keeping allocated storage.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> &IndexCacheEntry {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[IndexCacheEntry] {
        &self.entries
    }

    /// Start a fresh batch immediately after the last one.
    ///
    /// Returns the new entry's position.
    pub fn add_new(&mut self) -> usize {
        let entry = match self.entries.last() {
            Some(last) => IndexCacheEntry {
                vertex_offset: last.vertex_offset + last.vertex_count,
                vertex_count: 0,
                index_offset: last.index_offset + last.index_count,
                index_count: 0,
            },
            None => IndexCacheEntry::default(),
        };
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Start a batch copying the counters of an existing entry, so a stroke
    /// join can keep referencing the vertices it was built against.
    pub fn add_new_from(&mut self, index: usize) -> usize {
        let entry = self.entries[index];
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Position of the current open batch, creating one if none exists.
    pub fn get_last(&mut self) -> usize {
        if self.entries.is_empty() {
            self.add_new()
        } else {
            self.entries.len() - 1
        }
    }

    /// Account for indices and vertices written into an entry.
    pub fn inc_counts(&mut self, index: usize, index_delta: usize, vertex_delta: usize) {
        let entry = &mut self.entries[index];
        entry.index_count += index_delta;
        entry.vertex_count += vertex_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_new_chains_offsets() {
        let mut cache = IndexCache::new();
        let first = cache.add_new();
        cache.inc_counts(first, 6, 4);
        let second = cache.add_new();

        let entry = *cache.entry(second);
        assert_eq!(entry.vertex_offset, 4);
        assert_eq!(entry.index_offset, 6);
        assert_eq!(entry.vertex_count, 0);
        assert_eq!(entry.index_count, 0);
    }

    #[test]
    fn test_get_last_creates_entry() {
        let mut cache = IndexCache::new();
        assert!(cache.is_empty());
        let index = cache.get_last();
        assert_eq!(index, 0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_last(), 0);
    }

    #[test]
    fn test_add_new_from_copies_counters() {
        let mut cache = IndexCache::new();
        let first = cache.add_new();
        cache.inc_counts(first, 12, 8);

        let copy = cache.add_new_from(first);
        assert_eq!(cache.entry(copy), cache.entry(first));
    }
}
