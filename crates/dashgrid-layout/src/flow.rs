#![forbid(unsafe_code)]

//! Responsive column flow.
//!
//! Places tiles row-major in slot order onto an equal-width column grid. The
//! column count follows the available width: as many columns of at least
//! `min_column_width` as fit (gaps included), capped at `max_columns`. A tile
//! spans `span` columns (clamped to the column count) and wraps to the next
//! row when it does not fit in the remainder of the current one.

use dashgrid_core::geometry::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowGrid {
    /// Narrowest column before the grid drops a column.
    pub min_column_width: f64,
    /// Height of one row.
    pub row_height: f64,
    /// Gap between columns and between rows.
    pub gap: f64,
    /// Upper bound on the column count (`0` means unbounded).
    pub max_columns: u16,
}

impl Default for FlowGrid {
    fn default() -> Self {
        Self {
            min_column_width: 240.0,
            row_height: 160.0,
            gap: 16.0,
            max_columns: 4,
        }
    }
}

impl FlowGrid {
    #[must_use]
    pub fn new(min_column_width: f64, row_height: f64, gap: f64) -> Self {
        Self {
            min_column_width,
            row_height,
            gap,
            max_columns: 0,
        }
    }

    #[must_use]
    pub fn with_max_columns(mut self, max_columns: u16) -> Self {
        self.max_columns = max_columns;
        self
    }

    /// Column count for the given width. Never less than one.
    #[must_use]
    pub fn columns(&self, available_width: f64) -> u16 {
        let stride = self.min_column_width + self.gap;
        if available_width <= 0.0 || stride <= 0.0 {
            return 1;
        }
        let fit = ((available_width + self.gap) / stride).floor();
        let fit = if fit >= f64::from(u16::MAX) {
            u16::MAX
        } else {
            fit as u16
        };
        let capped = if self.max_columns == 0 {
            fit
        } else {
            fit.min(self.max_columns)
        };
        capped.max(1)
    }

    /// Width of one column for the given width.
    #[must_use]
    pub fn column_width(&self, available_width: f64) -> f64 {
        let columns = f64::from(self.columns(available_width));
        ((available_width - self.gap * (columns - 1.0)) / columns).max(0.0)
    }

    /// Boxes for tiles with the given column spans, in the same order.
    #[must_use]
    pub fn place(&self, area: Rect, spans: &[u16]) -> Vec<Rect> {
        let columns = self.columns(area.width);
        let column_width = self.column_width(area.width);
        let mut out = Vec::with_capacity(spans.len());
        let mut row = 0u32;
        let mut col = 0u16;

        for &span in spans {
            let span = span.clamp(1, columns);
            if col + span > columns {
                row += 1;
                col = 0;
            }
            let x = area.x + f64::from(col) * (column_width + self.gap);
            let y = area.y + f64::from(row) * (self.row_height + self.gap);
            let width = f64::from(span) * column_width + f64::from(span - 1) * self.gap;
            out.push(Rect::new(x, y, width, self.row_height));
            col += span;
        }

        out
    }

    /// Total height occupied by the placed tiles.
    #[must_use]
    pub fn content_height(&self, area: Rect, spans: &[u16]) -> f64 {
        self.place(area, spans)
            .iter()
            .map(|rect| rect.bottom() - area.y)
            .fold(0.0, f64::max)
    }
}
