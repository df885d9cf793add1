//! Greedy viewport paginator: measurement, packing, navigation, reflow.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::error::PageflowError;
use crate::markup::{split_blocks, BlockKind, MarkupLimits};
use crate::page::{Page, PageSet};
use crate::surface::{RenderSurface, ResizeToken};

/// Fraction of the viewport height an image block may occupy.
///
/// Applied before measurement so a single oversized image cannot
/// dominate layout disproportionately.
const DEFAULT_IMAGE_CLAMP_RATIO: f32 = 0.8;

/// Page-change observer: `(current_page, total_pages)`, 1-based page
/// number and non-negative count.
///
/// Fires once per completed pagination run and once per navigation that
/// changes the displayed page. Invoked after the engine's internal lock
/// is released, so the callback may query the paginator freely;
/// navigating from inside the callback is unsupported (the callback
/// slot itself is not re-entrant).
pub type PageChangeCallback = Box<dyn FnMut(usize, usize) + Send + 'static>;

/// Pending `(current_page, total_pages)` notification, delivered once
/// the core lock has been released.
type PageChange = (usize, usize);

fn deliver(observer: &Mutex<Option<PageChangeCallback>>, note: PageChange) {
    let mut slot = match observer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(observer) = slot.as_mut() {
        observer(note.0, note.1);
    }
}

/// Paginator options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaginatorConfig {
    /// Image height clamp as a fraction of the viewport height.
    pub image_clamp_ratio: f32,
    /// Block-splitting limits.
    pub limits: MarkupLimits,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            image_clamp_ratio: DEFAULT_IMAGE_CLAMP_RATIO,
            limits: MarkupLimits::default(),
        }
    }
}

struct PaginatorCore {
    surface: Arc<dyn RenderSurface>,
    source: String,
    config: PaginatorConfig,
    pages: PageSet,
}

impl PaginatorCore {
    /// Full pagination run: measure every block against the current
    /// viewport and rebuild the page set wholesale. Returns the
    /// notification the caller delivers once the core lock is released.
    fn repaginate(&mut self) -> Result<PageChange, PageflowError> {
        let blocks = split_blocks(&self.source, &self.config.limits)?;
        self.surface.prepare(&self.source);
        // The budget may change between runs (window resize); always
        // re-read it, never cache it.
        let budget = self.surface.viewport_height();

        let mut pages: Vec<Page> = Vec::new();
        if budget.is_finite() && budget > 0.0 {
            let image_cap = budget * self.config.image_clamp_ratio;
            let mut page = Page::new();
            for block in &blocks {
                let height_cap = (block.kind == BlockKind::Image).then_some(image_cap);
                let height = self.surface.measure_block(block.markup, height_cap);
                if !page.is_blank() && page.height_px() + height > budget {
                    pages.push(core::mem::take(&mut page));
                }
                let was_blank = page.is_blank();
                page.push_block(block.markup, block.index, height);
                if was_blank && height > budget {
                    // A block taller than the budget still forms its own
                    // page; it is never dropped or retried.
                    page.mark_oversized();
                }
            }
            if !page.is_blank() {
                pages.push(page);
            }
        } else if !blocks.is_empty() {
            // A zero-height budget would close a page per block forever;
            // fall back to one page holding the whole chapter.
            log::warn!(
                "viewport budget {} is degenerate; emitting a single page with all content",
                budget
            );
            let mut page = Page::new();
            for block in &blocks {
                page.push_block(block.markup, block.index, 0.0);
            }
            pages.push(page);
        }

        log::debug!(
            "paginated chapter: blocks={} budget={} pages={}",
            blocks.len(),
            budget,
            pages.len()
        );

        let previous_index = self.pages.current_index();
        self.pages = PageSet::new(pages);
        self.pages.clamp_current_to(previous_index);
        Ok(self.present_current())
    }

    /// Resize-triggered rerun. A constructed paginator never fails here:
    /// the source markup already split once, and degenerate budgets take
    /// the single-page fallback.
    fn reflow(&mut self) -> Option<PageChange> {
        match self.repaginate() {
            Ok(note) => Some(note),
            Err(err) => {
                log::warn!("reflow failed; keeping previous pages: {}", err);
                None
            }
        }
    }

    fn present_current(&mut self) -> PageChange {
        let fragment = self.pages.current_page().map(Page::markup).unwrap_or("");
        self.surface.present(fragment);
        (self.pages.current_index() + 1, self.pages.len())
    }

    fn step(&mut self, delta: isize) -> Option<PageChange> {
        if self.pages.step(delta) {
            Some(self.present_current())
        } else {
            None
        }
    }

    fn go_to_page(&mut self, page_number: usize) -> Option<PageChange> {
        if page_number == 0 {
            return None;
        }
        let index = page_number - 1;
        if index == self.pages.current_index() && !self.pages.is_empty() {
            // Already displayed; nothing changes and no observer fires.
            return None;
        }
        if self.pages.set_current(index) {
            Some(self.present_current())
        } else {
            None
        }
    }
}

/// Owns one chapter's page set and drives one [`RenderSurface`].
///
/// Construction measures and displays the first page synchronously.
/// All pagination work runs on the caller's thread; a resize
/// notification re-runs the full algorithm, and the displayed fragment
/// is only swapped after a complete page set has been computed.
///
/// Resize events are not coalesced here; a host integrating under
/// bursty resize should debounce before they reach the surface.
pub struct Paginator {
    core: Arc<Mutex<PaginatorCore>>,
    surface: Arc<dyn RenderSurface>,
    observer: Arc<Mutex<Option<PageChangeCallback>>>,
    resize_token: Option<ResizeToken>,
}

impl Paginator {
    /// Build a paginator over an attached, measurable surface and run
    /// the initial pagination.
    ///
    /// Fails with [`PageflowError::DegenerateViewport`] when the
    /// container height is not positive at construction time, and with
    /// a markup error when the chapter cannot be split. No partial
    /// paginator exists after a failure.
    pub fn new(
        surface: Arc<dyn RenderSurface>,
        markup: impl Into<String>,
        config: PaginatorConfig,
        observer: Option<PageChangeCallback>,
    ) -> Result<Self, PageflowError> {
        let height = surface.viewport_height();
        if !height.is_finite() || height <= 0.0 {
            return Err(PageflowError::DegenerateViewport { height });
        }

        let mut core = PaginatorCore {
            surface: Arc::clone(&surface),
            source: markup.into(),
            config,
            pages: PageSet::default(),
        };
        let note = core.repaginate()?;

        let core = Arc::new(Mutex::new(core));
        let observer = Arc::new(Mutex::new(observer));
        deliver(&observer, note);

        let weak_core: Weak<Mutex<PaginatorCore>> = Arc::downgrade(&core);
        let weak_observer = Arc::downgrade(&observer);
        let resize_token = surface.subscribe_resize(Arc::new(move || {
            let Some(core) = weak_core.upgrade() else {
                return;
            };
            // The core lock is released before the observer runs.
            let note = match core.lock() {
                Ok(mut core) => core.reflow(),
                Err(_) => None,
            };
            if let Some(note) = note {
                if let Some(observer) = weak_observer.upgrade() {
                    deliver(&observer, note);
                }
            }
        }));

        Ok(Self {
            core,
            surface,
            observer,
            resize_token: Some(resize_token),
        })
    }

    fn lock_core(&self) -> MutexGuard<'_, PaginatorCore> {
        match self.core.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fire the observer for a completed change, outside the core lock.
    fn deliver_note(&self, note: Option<PageChange>) -> bool {
        match note {
            Some(note) => {
                deliver(&self.observer, note);
                true
            }
            None => false,
        }
    }

    /// Advance to the next page. Clamps at the last page; returns
    /// `true` only when the displayed page changed.
    pub fn next_page(&self) -> bool {
        let note = self.lock_core().step(1);
        self.deliver_note(note)
    }

    /// Go back one page. Clamps at the first page; returns `true` only
    /// when the displayed page changed.
    pub fn previous_page(&self) -> bool {
        let note = self.lock_core().step(-1);
        self.deliver_note(note)
    }

    /// Navigate to a 1-based page number. Out-of-range targets are a
    /// silent no-op returning `false`; so is the already-current page.
    pub fn go_to_page(&self, page_number: usize) -> bool {
        let note = self.lock_core().go_to_page(page_number);
        self.deliver_note(note)
    }

    /// Current 1-based page number.
    ///
    /// Returns 1 even for an empty page set; callers must gate on
    /// [`total_pages`](Self::total_pages) before treating it as
    /// displayable.
    pub fn current_page(&self) -> usize {
        self.lock_core().pages.current_index() + 1
    }

    /// Total page count; 0 for an empty chapter.
    pub fn total_pages(&self) -> usize {
        self.lock_core().pages.len()
    }

    /// Whether the chapter produced no pages.
    pub fn is_empty(&self) -> bool {
        self.lock_core().pages.is_empty()
    }

    /// Markup fragment of the currently displayed page.
    pub fn current_fragment(&self) -> Option<String> {
        self.lock_core()
            .pages
            .current_page()
            .map(|page| page.markup().to_string())
    }

    /// Snapshot of the current page set.
    pub fn pages(&self) -> PageSet {
        self.lock_core().pages.clone()
    }

    /// Measured height of the page at 1-based `page_number`.
    pub fn page_height(&self, page_number: usize) -> Option<f32> {
        let core = self.lock_core();
        page_number
            .checked_sub(1)
            .and_then(|index| core.pages.page(index))
            .map(Page::height_px)
    }

    /// Re-run the full pagination against current viewport geometry.
    ///
    /// Equivalent to a resize notification; exposed for hosts whose
    /// surface has no event source of its own.
    pub fn reflow(&self) {
        let note = self.lock_core().reflow();
        self.deliver_note(note);
    }

    /// Replace the chapter source and rebuild the page set wholesale,
    /// repositioned at the first page.
    pub fn set_content(&self, markup: impl Into<String>) -> Result<(), PageflowError> {
        let markup = markup.into();
        let note = {
            let mut core = self.lock_core();
            // Validate before mutating so a bad chapter leaves the old
            // pages displayed.
            split_blocks(&markup, &core.config.limits)?;
            core.source = markup;
            core.pages = PageSet::default();
            core.repaginate()?
        };
        deliver(&self.observer, note);
        Ok(())
    }

    /// Release the resize registration made at construction.
    ///
    /// Idempotent; also performed on drop. No other shared state is
    /// mutated.
    pub fn destroy(&mut self) {
        if let Some(token) = self.resize_token.take() {
            self.surface.unsubscribe_resize(token);
        }
    }
}

impl Drop for Paginator {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl core::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Paginator")
            .field("total_pages", &self.total_pages())
            .field("current_page", &self.current_page())
            .field("subscribed", &self.resize_token.is_some())
            .finish()
    }
}
