#![forbid(unsafe_code)]

//! Dashboard display modes driven by container hover.

use std::fmt;

use dashgrid_core::geometry::{Point, Rect, is_hovering};
use serde::{Deserialize, Serialize};

/// How much room the dashboard takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardMode {
    #[default]
    Condensed,
    Expanded,
    FullScreen,
}

impl DashboardMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Condensed => "condensed",
            Self::Expanded => "expanded",
            Self::FullScreen => "full-screen",
        }
    }
}

impl fmt::Display for DashboardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expands the dashboard while the pointer is over it and condenses it when
/// the pointer leaves. Full-screen is sticky until set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoverModeTracker {
    mode: DashboardMode,
}

impl HoverModeTracker {
    #[must_use]
    pub const fn new(mode: DashboardMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> DashboardMode {
        self.mode
    }

    /// Force a mode. Returns `true` if it changed.
    pub fn set(&mut self, mode: DashboardMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Feed one pointer position. Returns the new mode only when it changed.
    pub fn update(&mut self, container: Rect, pointer: Point) -> Option<DashboardMode> {
        if self.mode == DashboardMode::FullScreen {
            return None;
        }
        let next = if is_hovering(container, pointer.x, pointer.y) {
            DashboardMode::Expanded
        } else {
            DashboardMode::Condensed
        };
        self.set(next).then_some(next)
    }
}
