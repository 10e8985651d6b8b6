//! Raw triangle-index partitioning into index-safe batches.
//!
//! Triangle topologies with known index structure (explicit triangles, fans,
//! strips, quads) first produce a flat index list in source-vertex space.
//! [`split_raw_indices`] cuts that list into batches that never address more
//! than the representable-index count of distinct vertices, duplicating the
//! minimal set of vertices shared across a batch boundary.

use std::ops::Range;

/// One index-safe batch cut from a raw triangle list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexBatch {
    /// Contiguous source-vertex range copied into the batch first. May be
    /// empty when every referenced vertex is a duplicate.
    pub vertex_range: Range<u32>,
    /// Source vertices already flushed into earlier batches, re-copied after
    /// the contiguous range in exactly this order.
    pub duplicates: Vec<u32>,
    /// Batch-relative indices, one per raw index consumed.
    pub indices: Vec<u16>,
}

impl RawIndexBatch {
    /// Total vertices this batch copies (contiguous range plus duplicates).
    pub fn vertex_count(&self) -> usize {
        self.vertex_range.len() + self.duplicates.len()
    }
}

/// Partition a raw triangle-index list so every batch stays addressable
/// within `max_batch_vertices` distinct vertices.
///
/// Walks triangles in order, keeping a reference vertex that maps to batch
/// position zero. Indices behind the reference belong to an earlier batch
/// and are resolved through a sorted duplicate list appended behind the
/// batch's contiguous vertex range. A batch closes as soon as fewer than
/// three vertex slots remain, so the next triangle always fits.
pub fn split_raw_indices(raw: &[u32], max_batch_vertices: usize) -> Vec<RawIndexBatch> {
    debug_assert!(raw.len() % 3 == 0, "raw index list must describe whole triangles");
    debug_assert!(max_batch_vertices >= 4, "batch ceiling too small to hold a triangle");

    let mut batches = Vec::new();
    if raw.is_empty() {
        return batches;
    }

    // Source id mapped to batch position zero.
    let mut base: i64 = 0;
    // Highest relative index referenced in the open batch.
    let mut max_rel: i64 = -1;
    // Sorted source ids referenced from behind `base`.
    let mut duplicates: Vec<u32> = Vec::new();
    // Emitted slots: non-negative values are relative indices, negative
    // values encode a pending duplicate as -(id + 1).
    let mut pending: Vec<i64> = Vec::new();

    let triangle_count = raw.len() / 3;
    for (t, tri) in raw.chunks_exact(3).enumerate() {
        for &id in tri {
            let rel = id as i64 - base;
            if rel < 0 {
                if let Err(slot) = duplicates.binary_search(&id) {
                    duplicates.insert(slot, id);
                }
                pending.push(-(id as i64) - 1);
            } else {
                max_rel = max_rel.max(rel);
                pending.push(rel);
            }
        }

        let used = (max_rel + 1) as usize + duplicates.len();
        let exhausted = t + 1 == triangle_count;
        if used + 3 > max_batch_vertices || exhausted {
            let dup_base = (max_rel + 1) as usize;
            let indices = pending
                .drain(..)
                .map(|slot| {
                    if slot >= 0 {
                        slot as u16
                    } else {
                        let id = (-slot - 1) as u32;
                        let position = duplicates
                            .binary_search(&id)
                            .expect("pending duplicate must be recorded");
                        (dup_base + position) as u16
                    }
                })
                .collect();

            batches.push(RawIndexBatch {
                vertex_range: base as u32..(base + max_rel + 1) as u32,
                duplicates: std::mem::take(&mut duplicates),
                indices,
            });

            base += max_rel + 1;
            max_rel = -1;
        }
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_batch_passthrough() {
        let raw = [0, 1, 2, 0, 2, 3];
        let batches = split_raw_indices(&raw, 65536);

        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.vertex_range, 0..4);
        assert!(batch.duplicates.is_empty());
        assert_eq!(batch.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_split_produces_multiple_batches() {
        // A strip-like list over 8 vertices with a ceiling of 6 must split.
        let raw = [0, 1, 2, 1, 3, 2, 2, 3, 4, 3, 5, 4, 4, 5, 6, 5, 7, 6];
        let batches = split_raw_indices(&raw, 6);

        assert!(batches.len() >= 2);
        // Every batch respects the ceiling and its indices stay in range.
        for batch in &batches {
            assert!(batch.vertex_count() <= 6);
            for &index in &batch.indices {
                assert!((index as usize) < batch.vertex_count());
            }
        }
        // Each raw index slot is consumed exactly once.
        let total: usize = batches.iter().map(|b| b.indices.len()).sum();
        assert_eq!(total, raw.len());
    }

    #[test]
    fn test_duplicates_resolve_to_source_vertices() {
        let raw = [0, 1, 2, 1, 3, 2, 2, 3, 4, 3, 5, 4, 4, 5, 6, 5, 7, 6];
        let batches = split_raw_indices(&raw, 6);

        // Re-resolve every emitted triangle back to source-vertex ids and
        // compare against the raw list.
        let mut resolved = Vec::new();
        for batch in &batches {
            let contiguous = batch.vertex_range.clone().collect::<Vec<_>>();
            for &index in &batch.indices {
                let index = index as usize;
                let id = if index < contiguous.len() {
                    contiguous[index]
                } else {
                    batch.duplicates[index - contiguous.len()]
                };
                resolved.push(id);
            }
        }
        assert_eq!(resolved, raw);
    }

    #[test]
    fn test_duplicate_list_is_minimal_and_sorted() {
        let raw = [0, 1, 2, 1, 3, 2, 2, 3, 4, 3, 5, 4, 4, 5, 6, 5, 7, 6];
        let batches = split_raw_indices(&raw, 6);

        for batch in &batches[1..] {
            let mut sorted = batch.duplicates.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted, batch.duplicates);
            // Duplicates only reference vertices from earlier batches.
            for &id in &batch.duplicates {
                assert!(id < batch.vertex_range.start);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(split_raw_indices(&[], 16).is_empty());
    }
}
