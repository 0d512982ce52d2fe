//! Fixed-length historical windows of bracket pairs.

use std::slice::ChunksExact;

use crate::Bracket;

/// Contiguous storage for `len()` windows of `window_size` brackets each.
///
/// Window `j` occupies `data[j * window_size .. (j + 1) * window_size]`,
/// so the whole set maps directly onto a `(N, window_size, 2, D)` array.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindows<const D: usize> {
    window_size: usize,
    data: Vec<Bracket<D>>,
}

impl<const D: usize> SlidingWindows<D> {
    /// Empty set with room for `count` windows
    pub fn with_capacity(window_size: usize, count: usize) -> Self {
        Self {
            window_size,
            data: Vec::with_capacity(window_size.saturating_mul(count)),
        }
    }

    /// Append one window; `window.len()` must equal `window_size`
    pub fn push_window(&mut self, window: &[Bracket<D>]) {
        debug_assert_eq!(window.len(), self.window_size);
        self.data.extend_from_slice(window);
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        if self.window_size == 0 {
            0
        } else {
            self.data.len() / self.window_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self, index: usize) -> Option<&[Bracket<D>]> {
        let start = index.checked_mul(self.window_size)?;
        self.data.get(start..start + self.window_size)
    }

    pub fn iter(&self) -> ChunksExact<'_, Bracket<D>> {
        self.data.chunks_exact(self.window_size.max(1))
    }

    /// Flat bracket storage in window order
    pub fn as_flat(&self) -> &[Bracket<D>] {
        &self.data
    }

    /// Remove the first `count` windows (clamped to `len()`)
    pub fn drop_front(&mut self, count: usize) {
        let count = count.min(self.len());
        self.data.drain(..count * self.window_size);
    }

    /// Remove the last `count` windows (clamped to `len()`)
    pub fn drop_back(&mut self, count: usize) {
        let keep = self.len().saturating_sub(count);
        self.data.truncate(keep * self.window_size);
    }
}
