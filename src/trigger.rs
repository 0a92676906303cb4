//! Scroll triggers.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// Scroll geometry reported by a renderer, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPosition {
    /// Distance scrolled from the top of the content
    pub scroll_top: f64,
    /// Height of the visible area
    pub viewport_height: f64,
    /// Full height of the scrollable content
    pub content_height: f64,
}

impl ScrollPosition {
    /// Build a position
    #[must_use]
    pub const fn new(scroll_top: f64, viewport_height: f64, content_height: f64) -> Self {
        Self { scroll_top, viewport_height, content_height }
    }

    /// Share of the content seen so far. Empty content counts as fully seen.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.content_height <= 0.0 {
            return 1.0;
        }
        (self.scroll_top + self.viewport_height) / self.content_height
    }

    /// Pixels left below the viewport
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.content_height - (self.scroll_top + self.viewport_height)
    }
}

/// Kind of scroll trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[enum_dispatch]
pub enum TriggerKind {
    /// Fire past a share of the content
    Fraction(FractionTrigger),
    /// Fire within a pixel distance of the bottom
    BottomMargin(MarginTrigger),
}

/// Trait to implement scroll triggers
#[enum_dispatch(TriggerKind)]
pub trait Trigger {
    /// Whether the position asks for the next page
    fn crossed(&self, position: &ScrollPosition) -> bool;
}

impl Default for TriggerKind {
    fn default() -> Self {
        Self::Fraction(FractionTrigger::default())
    }
}

/// Fires once `(scroll_top + viewport_height) / content_height >= threshold`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionTrigger {
    /// Share of the content, usually between 0.6 and 0.9
    pub threshold: f64,
}

impl Default for FractionTrigger {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

impl Trigger for FractionTrigger {
    fn crossed(&self, position: &ScrollPosition) -> bool {
        position.fraction() >= self.threshold
    }
}

/// Fires once the bottom of the viewport is within `pixels` of the content end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginTrigger {
    /// Distance from the bottom
    pub pixels: f64,
}

impl Trigger for MarginTrigger {
    fn crossed(&self, position: &ScrollPosition) -> bool {
        position.remaining() <= self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_threshold_is_inclusive() {
        let trigger = TriggerKind::Fraction(FractionTrigger { threshold: 0.8 });
        assert!(!trigger.crossed(&ScrollPosition::new(0.0, 500.0, 1000.0)));
        assert!(!trigger.crossed(&ScrollPosition::new(250.0, 500.0, 1000.0)));
        assert!(trigger.crossed(&ScrollPosition::new(300.0, 500.0, 1000.0)));
        assert!(trigger.crossed(&ScrollPosition::new(500.0, 500.0, 1000.0)));
    }

    #[test]
    fn empty_content_triggers() {
        let trigger = TriggerKind::default();
        assert!(trigger.crossed(&ScrollPosition::new(0.0, 800.0, 0.0)));
    }

    #[test]
    fn nan_geometry_never_triggers() {
        let trigger = TriggerKind::default();
        assert!(!trigger.crossed(&ScrollPosition::new(f64::NAN, 800.0, 1000.0)));
    }

    #[test]
    fn bottom_margin() {
        let trigger = TriggerKind::BottomMargin(MarginTrigger { pixels: 50.0 });
        assert!(!trigger.crossed(&ScrollPosition::new(400.0, 500.0, 1000.0)));
        assert!(trigger.crossed(&ScrollPosition::new(450.0, 500.0, 1000.0)));
    }

    #[test]
    fn trigger_config_is_tagged() {
        let trigger: TriggerKind =
            serde_json::from_str(r#"{"kind":"bottom_margin","pixels":50.0}"#).unwrap();
        assert_eq!(trigger, TriggerKind::BottomMargin(MarginTrigger { pixels: 50.0 }));
    }
}
