//! Shared helpers for integration tests.

use pageflow::PageChangeCallback;
use std::sync::{Arc, Mutex};

/// Records every `(current_page, total_pages)` observer invocation.
#[derive(Clone, Default)]
pub struct PageChangeRecorder {
    events: Arc<Mutex<Vec<(usize, usize)>>>,
}

// Not every test binary uses every helper.
#[allow(dead_code)]
impl PageChangeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer callback feeding this recorder.
    pub fn callback(&self) -> PageChangeCallback {
        let events = Arc::clone(&self.events);
        Box::new(move |current, total| {
            events.lock().unwrap().push((current, total));
        })
    }

    pub fn events(&self) -> Vec<(usize, usize)> {
        self.events.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(usize, usize)> {
        self.events.lock().unwrap().last().copied()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}
