//! Page and page-set data model.

use smallvec::SmallVec;

/// One displayable page: a contiguous run of top-level blocks whose
/// cumulative measured height fits the viewport budget, or a single
/// oversized block that exceeds it on its own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    markup: String,
    height_px: f32,
    oversized: bool,
    blocks: SmallVec<[usize; 8]>,
}

impl Page {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one block's markup and measured height.
    pub fn push_block(&mut self, markup: &str, block_index: usize, height_px: f32) {
        self.markup.push_str(markup);
        self.height_px += height_px;
        self.blocks.push(block_index);
    }

    /// Mark this page as holding a single block taller than the budget.
    pub fn mark_oversized(&mut self) {
        self.oversized = true;
    }

    /// Concatenated markup fragment for display.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Cumulative measured height at pagination time.
    pub fn height_px(&self) -> f32 {
        self.height_px
    }

    /// Whether this page holds one block that alone exceeds the budget.
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }

    /// Ordinals of the chapter blocks on this page, in document order.
    pub fn block_indices(&self) -> &[usize] {
        &self.blocks
    }

    /// Whether no block has been placed yet.
    pub fn is_blank(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Ordered pages for one chapter plus the current 0-based page index.
///
/// Invariant: when non-empty, the index is always within
/// `[0, len - 1]`. An empty set has no valid current page and all
/// navigation is a no-op.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSet {
    pages: Vec<Page>,
    current: usize,
}

impl PageSet {
    /// Build a page set positioned at the first page.
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages, current: 0 }
    }

    /// Page count.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the chapter produced no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Current 0-based index. Meaningless when the set is empty.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Page at `index`, if in bounds.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Page at the current index, `None` when empty.
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    /// Re-seat a prior page index after a rebuild: floored into
    /// `[0, len - 1]`, `0` when the set is empty.
    pub fn clamp_current_to(&mut self, previous_index: usize) -> usize {
        let last = self.pages.len().saturating_sub(1);
        self.current = previous_index.min(last);
        self.current
    }

    /// Set the current index if in bounds. Returns `false` (and leaves
    /// the index untouched) otherwise.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.pages.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    /// Move the index by `delta`, clamped to the valid range. Returns
    /// `true` only when the index actually changed.
    pub fn step(&mut self, delta: isize) -> bool {
        if self.pages.is_empty() {
            return false;
        }
        let last = self.pages.len() - 1;
        let target = self
            .current
            .saturating_add_signed(delta)
            .min(last);
        if target == self.current {
            return false;
        }
        self.current = target;
        true
    }
}
