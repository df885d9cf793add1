//! Render-surface port: measurement, display, and resize notification.
//!
//! The packing algorithm never touches a concrete layout engine. It
//! measures and displays through this trait, so a backend may wrap a
//! live layout tree (where measurement means mounting a real node and
//! reading its box height) or a deterministic model of one.

use std::sync::Arc;

/// Callback invoked by a backend when the viewport geometry changes.
pub type ResizeListener = Arc<dyn Fn() + Send + Sync + 'static>;

/// Stable handle for one resize registration.
///
/// Teardown must release exactly the registration made at construction;
/// an opaque token makes that identity explicit instead of relying on
/// closure identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResizeToken(u64);

impl ResizeToken {
    /// Wrap a backend-assigned registration id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Backend-assigned registration id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Measurement and display surface for one container/content pair.
///
/// The implementor owns both the fixed-size container (whose height is
/// the packing budget) and the content surface whose markup is swapped
/// per page. Exactly one paginator may drive a surface at a time.
pub trait RenderSurface: Send + Sync {
    /// Current content width. Part of the layout conditions that make
    /// measured heights valid for this run only.
    fn viewport_width(&self) -> f32;

    /// Current container height: the packing budget. Re-read on every
    /// pagination run, never cached across runs.
    fn viewport_height(&self) -> f32;

    /// Reset the content surface to natural (unconstrained) height and
    /// mount the full chapter markup so per-block measurement sees real
    /// layout conditions (fonts, image intrinsic sizes, width).
    fn prepare(&self, markup: &str);

    /// Measure one block's rendered height by mounting an isolated
    /// clone and reading its actual box height, then removing it.
    ///
    /// `height_cap` limits the block's rendered height before
    /// measurement (used to clamp images against the viewport).
    fn measure_block(&self, markup: &str, height_cap: Option<f32>) -> f32;

    /// Replace the displayed fragment with one page's markup.
    fn present(&self, markup: &str);

    /// Register a resize listener, returning a stable token.
    fn subscribe_resize(&self, listener: ResizeListener) -> ResizeToken;

    /// Release the registration identified by `token`. Unknown tokens
    /// are ignored.
    fn unsubscribe_resize(&self, token: ResizeToken);
}
