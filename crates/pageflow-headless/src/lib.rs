//! Deterministic headless [`RenderSurface`] backend for `pageflow`.
//!
//! Stands in for a live layout engine with a fixed-metrics text model:
//! a block's height is its wrapped line count times the line height,
//! wrapping at `viewport_width / char_width` characters. Image heights
//! come from the markup's `height` attribute. The model is deliberately
//! simple; what matters for pagination is that it is deterministic and
//! responds to viewport geometry the way a real surface does.
//!
//! Hosts (and the engine's own integration tests) drive resize through
//! [`HeadlessSurface::set_viewport`], which fires every registered
//! resize listener synchronously.

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

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use pageflow::{PageflowError, RenderSurface, ResizeListener, ResizeToken};

/// Fixed text metrics for the headless layout model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadlessMetrics {
    /// Advance width assumed for every character.
    pub char_width_px: f32,
    /// Height of one wrapped text line.
    pub line_height_px: f32,
    /// Vertical gap added after every block.
    pub block_gap_px: f32,
    /// Image height when the markup carries no `height` attribute.
    pub default_image_height_px: f32,
}

impl Default for HeadlessMetrics {
    fn default() -> Self {
        Self {
            char_width_px: 8.0,
            line_height_px: 18.0,
            block_gap_px: 0.0,
            default_image_height_px: 300.0,
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Text content of a markup fragment with tags removed and whitespace
/// collapsed, the way a layout engine would see it for line breaking.
fn visible_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_height_attr(markup: &str) -> Option<f32> {
    let rest = markup.split("height=\"").nth(1)?;
    rest.split('"').next()?.trim().parse().ok()
}

fn is_image_markup(markup: &str) -> bool {
    let trimmed = markup.trim_start();
    let lower = trimmed.get(..5.min(trimmed.len())).unwrap_or("");
    lower.eq_ignore_ascii_case("<img ")
        || lower.eq_ignore_ascii_case("<img/")
        || lower.eq_ignore_ascii_case("<img>")
        || trimmed
            .get(..7.min(trimmed.len()))
            .map(|p| p.eq_ignore_ascii_case("<image ") || p.eq_ignore_ascii_case("<image/"))
            .unwrap_or(false)
}

/// In-memory render surface with deterministic measurement.
pub struct HeadlessSurface {
    metrics: HeadlessMetrics,
    width: Mutex<f32>,
    height: Mutex<f32>,
    mounted: Mutex<String>,
    displayed: Mutex<String>,
    listeners: Mutex<Vec<(u64, ResizeListener)>>,
    next_token: AtomicU64,
}

impl HeadlessSurface {
    /// Create a surface with the given viewport geometry and default
    /// metrics.
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_metrics(width, height, HeadlessMetrics::default())
    }

    /// Create a surface with explicit metrics.
    pub fn with_metrics(width: f32, height: f32, metrics: HeadlessMetrics) -> Self {
        Self {
            metrics,
            width: Mutex::new(width),
            height: Mutex::new(height),
            mounted: Mutex::new(String::new()),
            displayed: Mutex::new(String::new()),
            listeners: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Shared surface handle ready to hand to a paginator.
    pub fn shared(width: f32, height: f32) -> Arc<Self> {
        Arc::new(Self::new(width, height))
    }

    /// Metrics in effect for this surface.
    pub fn metrics(&self) -> HeadlessMetrics {
        self.metrics
    }

    /// Change the viewport geometry and fire every registered resize
    /// listener synchronously.
    pub fn set_viewport(&self, width: f32, height: f32) {
        *lock_or_recover(&self.width) = width;
        *lock_or_recover(&self.height) = height;
        let listeners: Vec<ResizeListener> = lock_or_recover(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        log::debug!(
            "headless viewport set to {}x{}; notifying {} listener(s)",
            width,
            height,
            listeners.len()
        );
        for listener in listeners {
            listener();
        }
    }

    /// Markup currently mounted for measurement (scratch content).
    pub fn mounted_markup(&self) -> String {
        lock_or_recover(&self.mounted).clone()
    }

    /// Markup of the fragment currently displayed.
    pub fn displayed_markup(&self) -> String {
        lock_or_recover(&self.displayed).clone()
    }

    /// Number of live resize registrations.
    pub fn resize_listener_count(&self) -> usize {
        lock_or_recover(&self.listeners).len()
    }

    fn text_height(&self, markup: &str, width: f32) -> f32 {
        let text = visible_text(markup);
        if text.is_empty() {
            return self.metrics.block_gap_px;
        }
        let per_line = (width / self.metrics.char_width_px).floor().max(1.0) as usize;
        let chars = text.chars().count();
        let lines = chars.div_ceil(per_line).max(1);
        lines as f32 * self.metrics.line_height_px + self.metrics.block_gap_px
    }
}

impl RenderSurface for HeadlessSurface {
    fn viewport_width(&self) -> f32 {
        *lock_or_recover(&self.width)
    }

    fn viewport_height(&self) -> f32 {
        *lock_or_recover(&self.height)
    }

    fn prepare(&self, markup: &str) {
        let mut mounted = lock_or_recover(&self.mounted);
        mounted.clear();
        mounted.push_str(markup);
    }

    fn measure_block(&self, markup: &str, height_cap: Option<f32>) -> f32 {
        let height = if is_image_markup(markup) {
            parse_height_attr(markup).unwrap_or(self.metrics.default_image_height_px)
        } else {
            self.text_height(markup, self.viewport_width())
        };
        match height_cap {
            Some(cap) => height.min(cap),
            None => height,
        }
    }

    fn present(&self, markup: &str) {
        let mut displayed = lock_or_recover(&self.displayed);
        displayed.clear();
        displayed.push_str(markup);
    }

    fn subscribe_resize(&self, listener: ResizeListener) -> ResizeToken {
        let raw = self.next_token.fetch_add(1, Ordering::Relaxed);
        lock_or_recover(&self.listeners).push((raw, listener));
        ResizeToken::new(raw)
    }

    fn unsubscribe_resize(&self, token: ResizeToken) {
        lock_or_recover(&self.listeners).retain(|(raw, _)| *raw != token.raw());
    }
}

impl core::fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("width", &self.viewport_width())
            .field("height", &self.viewport_height())
            .field("metrics", &self.metrics)
            .field("listeners", &self.resize_listener_count())
            .finish()
    }
}

/// Minimal element registry standing in for a document tree.
///
/// Hosts construct a surface by resolving a container/content locator
/// pair, mirroring reader UIs that look both elements up once at
/// startup. Unresolvable locators are a hard error, not a degraded
/// surface.
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    elements: Mutex<BTreeMap<String, (f32, f32)>>,
}

impl HeadlessDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element with its laid-out geometry.
    pub fn insert_element(&self, id: impl Into<String>, width: f32, height: f32) {
        lock_or_recover(&self.elements).insert(id.into(), (width, height));
    }

    /// Resolve a container/content pair into a surface sized by the
    /// container's geometry.
    pub fn resolve_surface(
        &self,
        container_id: &str,
        content_id: &str,
        metrics: HeadlessMetrics,
    ) -> Result<Arc<HeadlessSurface>, PageflowError> {
        let elements = lock_or_recover(&self.elements);
        let (width, height) = *elements.get(container_id).ok_or_else(|| {
            PageflowError::new_surface_unavailable(
                "container_not_found",
                format!("no element with id '{}'", container_id),
            )
        })?;
        if !elements.contains_key(content_id) {
            return Err(PageflowError::new_surface_unavailable(
                "content_not_found",
                format!("no element with id '{}'", content_id),
            ));
        }
        Ok(Arc::new(HeadlessSurface::with_metrics(
            width, height, metrics,
        )))
    }
}
