//! Viewport pagination engine for reflowable chapter markup.
//!
//! `pageflow` splits one chapter's marked-up content into discrete,
//! screen-sized page fragments and navigates among them. The packing
//! algorithm is independent of any concrete rendering surface: all
//! measurement and display go through the [`RenderSurface`] port, so the
//! same engine runs against a live layout tree or a deterministic
//! headless backend (see the `pageflow-headless` crate).
//!
//! # Usage
//!
//! ```rust,no_run
//! use pageflow::{Paginator, PaginatorConfig, RenderSurface};
//! use std::sync::Arc;
//!
//! # fn example(surface: Arc<dyn RenderSurface>) -> Result<(), pageflow::PageflowError> {
//! let markup = "<p>First paragraph.</p><p>Second paragraph.</p>";
//! let paginator = Paginator::new(surface, markup, PaginatorConfig::default(), None)?;
//! assert!(paginator.total_pages() >= 1);
//! paginator.next_page();
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod error;
pub mod markup;
pub mod page;
pub mod paginator;
pub mod session;
pub mod surface;

pub use error::PageflowError;
pub use markup::{split_blocks, BlockKind, BlockNode, MarkupLimits};
pub use page::{Page, PageSet};
pub use paginator::{PageChangeCallback, Paginator, PaginatorConfig};
pub use session::PaginationSession;
pub use surface::{RenderSurface, ResizeListener, ResizeToken};
