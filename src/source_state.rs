// src/source_state.rs
//! Sticky/discovery memory of which association layout last worked.

use serde::{Deserialize, Serialize};

use crate::model::Layout;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    /// Boot, or the sticky layout just failed: probe layouts in discovery order.
    #[default]
    Unknown,
    NewLayout,
    ClassicLayout,
}

impl From<Layout> for SourceState {
    fn from(l: Layout) -> Self {
        match l {
            Layout::New => SourceState::NewLayout,
            Layout::Classic => SourceState::ClassicLayout,
        }
    }
}

impl SourceState {
    /// Layout to fast-track, if any.
    pub fn sticky(self) -> Option<Layout> {
        match self {
            SourceState::Unknown => None,
            SourceState::NewLayout => Some(Layout::New),
            SourceState::ClassicLayout => Some(Layout::Classic),
        }
    }

    pub fn on_success(self, layout: Layout) -> Self {
        layout.into()
    }

    /// Any failure of the sticky layout drops back to discovery.
    pub fn on_failure(self) -> Self {
        SourceState::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceState::Unknown => "unknown",
            SourceState::NewLayout => "new_layout",
            SourceState::ClassicLayout => "classic_layout",
        }
    }
}

/// Layouts to probe during discovery, skipping one that already failed this cycle.
pub fn discovery_order(classic_fallback: bool, already_failed: Option<Layout>) -> Vec<Layout> {
    let mut order = vec![Layout::New];
    if classic_fallback {
        order.push(Layout::Classic);
    }
    order.retain(|l| Some(*l) != already_failed);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        assert_eq!(SourceState::Unknown.sticky(), None);
        assert_eq!(
            SourceState::Unknown.on_success(Layout::Classic),
            SourceState::ClassicLayout
        );
        assert_eq!(SourceState::NewLayout.on_failure(), SourceState::Unknown);
        assert_eq!(SourceState::ClassicLayout.sticky(), Some(Layout::Classic));
    }

    #[test]
    fn discovery_respects_fallback_toggle_and_failed_layout() {
        assert_eq!(discovery_order(true, None), vec![Layout::New, Layout::Classic]);
        assert_eq!(discovery_order(false, None), vec![Layout::New]);
        assert_eq!(discovery_order(true, Some(Layout::New)), vec![Layout::Classic]);
        assert_eq!(discovery_order(true, Some(Layout::Classic)), vec![Layout::New]);
        assert!(discovery_order(false, Some(Layout::New)).is_empty());
    }
}
