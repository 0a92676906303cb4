//! Loader configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::trigger::TriggerKind;

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Loader settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Records per page when no viewport is known
    pub page_size: usize,
    /// When a scroll position asks for the next page
    pub trigger: TriggerKind,
    /// Viewport based sizing
    pub sizing: SizingConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            trigger: TriggerKind::default(),
            sizing: SizingConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Read a json config file, missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config '{}'", path.display()))
    }
}

/// Viewport based page sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Follow the viewport and double pages on fast scrolling
    pub adaptive: bool,
    /// Pixel height assumed for one row
    pub estimated_row_height: f64,
    /// Rows fetched beyond the visible ones
    pub buffer_rows: usize,
    /// Floor of a computed page size
    pub min_page_size: usize,
    /// Two signals closer than this count as fast scrolling
    pub fast_scroll_window_ms: u64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            adaptive: false,
            estimated_row_height: 40.0,
            buffer_rows: 5,
            min_page_size: 10,
            fast_scroll_window_ms: 50,
        }
    }
}
