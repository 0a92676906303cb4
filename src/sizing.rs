//! Page sizes derived from the viewport.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::SizingConfig;

/// Rows that fit a viewport plus a buffer, never below `min_page_size`
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "floored and clamped to zero before the cast"
)]
pub fn optimal_page_size(viewport_height: f64, config: &SizingConfig) -> usize {
    let visible = if config.estimated_row_height > 0.0 && viewport_height.is_finite() {
        (viewport_height / config.estimated_row_height).floor().max(0.0) as usize
    } else {
        0
    };
    (visible + config.buffer_rows).max(config.min_page_size)
}

/// Picks the page size of each request
#[derive(Debug)]
pub struct PageSizer {
    config: SizingConfig,
    base: usize,
    current: usize,
    last_signal: Option<Instant>,
}

impl PageSizer {
    /// Sizer with a fixed base size
    #[must_use]
    pub fn new(config: SizingConfig, base: usize) -> Self {
        let base = base.max(1);
        Self { config, base, current: base, last_signal: None }
    }

    /// Size of the first page of a session
    #[must_use]
    pub fn initial_for_viewport(&self, viewport_height: f64) -> usize {
        optimal_page_size(viewport_height, &self.config)
    }

    /// Start over with a new base size
    pub fn reset(&mut self, base: usize) {
        self.base = base.max(1);
        self.current = self.base;
        self.last_signal = None;
    }

    /// Size for the next request
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.current
    }

    /// Record a trigger signal.
    ///
    /// Only does anything in adaptive mode: the base follows the reported
    /// viewport and is doubled when signals come in faster than the window.
    pub fn signal(&mut self, viewport_height: Option<f64>, now: Instant) -> usize {
        if !self.config.adaptive {
            return self.current;
        }
        if let Some(height) = viewport_height {
            self.base = optimal_page_size(height, &self.config);
        }
        let window = Duration::from_millis(self.config.fast_scroll_window_ms);
        let fast = self.last_signal.is_some_and(|last| now.saturating_duration_since(last) < window);
        self.last_signal = Some(now);
        self.current = if fast { self.base.saturating_mul(2) } else { self.base };
        self.current
    }
}
