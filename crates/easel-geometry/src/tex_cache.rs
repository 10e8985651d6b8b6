//! Texture run grouping over the polygon index stream.
//!
//! Groups contiguous polygon-index ranges by texture image so the draw loop
//! pays one bind transition per run instead of one per shape.

/// Opaque handle to a texture image owned by the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// A contiguous polygon-index range drawn with one bound texture.
///
/// `first_index`/`last_index` are absolute (inclusive) positions in the
/// polygon index stream; `first_cache`/`last_cache` are the IndexCache entry
/// positions the range starts and ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexCacheEntry {
    pub texture: Option<TextureId>,
    pub first_index: usize,
    pub last_index: usize,
    pub first_cache: usize,
    pub last_cache: usize,
}

/// Texture bind/unbind transition reported while iterating runs at draw
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureSwitch {
    /// Texture the caller must unbind before this run, if any.
    pub unbind: Option<TextureId>,
    /// Texture the caller must bind for this run, if any.
    pub bind: Option<TextureId>,
}

/// Ordered texture runs covering the polygon index stream.
#[derive(Debug, Clone, Default)]
pub struct TexCache {
    entries: Vec<TexCacheEntry>,
    bound: Option<TextureId>,
}

impl TexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all runs, keeping allocated storage.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.bound = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> &TexCacheEntry {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[TexCacheEntry] {
        &self.entries
    }

    /// Append a run, extending the previous run in place when it used the
    /// same texture image.
    pub fn add_texture(
        &mut self,
        texture: Option<TextureId>,
        first_index: usize,
        first_cache: usize,
        last_index: usize,
        last_cache: usize,
    ) {
        if let Some(last) = self.entries.last_mut() {
            if last.texture == texture {
                last.last_index = last_index;
                last.last_cache = last_cache;
                return;
            }
        }
        self.entries.push(TexCacheEntry {
            texture,
            first_index,
            last_index,
            first_cache,
            last_cache,
        });
    }

    /// Extend the tail run's index range.
    pub fn set_last_index(&mut self, last_index: usize, last_cache: usize) {
        if let Some(last) = self.entries.last_mut() {
            last.last_index = last_index;
            last.last_cache = last_cache;
        }
    }

    /// Start a draw pass; no texture is considered bound.
    pub fn begin_render(&mut self) {
        self.bound = None;
    }

    /// Texture transition required to draw run `index`.
    ///
    /// Reports an unbind when moving to a differently-textured run,
    /// including to and from untextured runs.
    pub fn texture(&mut self, index: usize) -> TextureSwitch {
        let next = self.entries[index].texture;
        if next == self.bound {
            return TextureSwitch::default();
        }
        let switch = TextureSwitch {
            unbind: self.bound,
            bind: next,
        };
        self.bound = next;
        switch
    }

    /// Finish a draw pass, reporting the texture left bound, if any.
    pub fn end_render(&mut self) -> Option<TextureId> {
        self.bound.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_texture_runs_coalesce() {
        let mut cache = TexCache::new();
        let tex = Some(TextureId(7));
        cache.add_texture(tex, 0, 0, 5, 0);
        cache.add_texture(tex, 6, 0, 11, 1);

        assert_eq!(cache.len(), 1);
        let entry = cache.entry(0);
        assert_eq!(entry.first_index, 0);
        assert_eq!(entry.last_index, 11);
        assert_eq!(entry.last_cache, 1);
    }

    #[test]
    fn test_different_textures_stay_separate() {
        let mut cache = TexCache::new();
        cache.add_texture(Some(TextureId(1)), 0, 0, 5, 0);
        cache.add_texture(None, 6, 0, 11, 0);
        cache.add_texture(Some(TextureId(1)), 12, 0, 17, 0);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_render_transitions() {
        let mut cache = TexCache::new();
        cache.add_texture(Some(TextureId(1)), 0, 0, 5, 0);
        cache.add_texture(None, 6, 0, 11, 0);

        cache.begin_render();
        let first = cache.texture(0);
        assert_eq!(first.bind, Some(TextureId(1)));
        assert_eq!(first.unbind, None);

        let second = cache.texture(1);
        assert_eq!(second.bind, None);
        assert_eq!(second.unbind, Some(TextureId(1)));

        assert_eq!(cache.end_render(), None);
    }
}
