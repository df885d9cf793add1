//! Per-chapter pagination session owned by the host application.
//!
//! A session bundles one surface, one chapter's immutable markup, and
//! the paginator derived from them. Hosts hold a session per open
//! document instead of tracking reader state in ambient globals, which
//! keeps multi-document and multi-window use safe.

use std::sync::Arc;

use crate::error::PageflowError;
use crate::paginator::{PageChangeCallback, Paginator, PaginatorConfig};
use crate::surface::RenderSurface;

/// One chapter's pagination state bound to one render surface.
///
/// The page set is rebuilt wholesale when the viewport resizes or when
/// [`open_chapter`](Self::open_chapter) swaps in new markup; there is no
/// cross-chapter page numbering.
pub struct PaginationSession {
    paginator: Paginator,
    chapter_index: usize,
}

impl PaginationSession {
    /// Open a session on `surface` with the first chapter's markup.
    ///
    /// The first page is measured and displayed before this returns,
    /// and `observer` fires once with the initial `(page, total)`.
    pub fn open(
        surface: Arc<dyn RenderSurface>,
        markup: impl Into<String>,
        config: PaginatorConfig,
        observer: Option<PageChangeCallback>,
    ) -> Result<Self, PageflowError> {
        let paginator = Paginator::new(surface, markup, config, observer)?;
        Ok(Self {
            paginator,
            chapter_index: 0,
        })
    }

    /// Replace the session content with another chapter (or spine
    /// item), rebuilding the page set at page one.
    pub fn open_chapter(
        &mut self,
        chapter_index: usize,
        markup: impl Into<String>,
    ) -> Result<(), PageflowError> {
        self.paginator.set_content(markup)?;
        self.chapter_index = chapter_index;
        Ok(())
    }

    /// Index of the chapter currently paginated.
    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    /// The paginator driving this session.
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Advance one page. See [`Paginator::next_page`].
    pub fn next_page(&self) -> bool {
        self.paginator.next_page()
    }

    /// Go back one page. See [`Paginator::previous_page`].
    pub fn previous_page(&self) -> bool {
        self.paginator.previous_page()
    }

    /// Navigate to a 1-based page number. See [`Paginator::go_to_page`].
    pub fn go_to_page(&self, page_number: usize) -> bool {
        self.paginator.go_to_page(page_number)
    }

    /// Current 1-based page number.
    pub fn current_page(&self) -> usize {
        self.paginator.current_page()
    }

    /// Total page count for the open chapter.
    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages()
    }

    /// Tear the session down, releasing its resize registration.
    ///
    /// Dropping the session has the same effect.
    pub fn close(mut self) {
        self.paginator.destroy();
    }
}
