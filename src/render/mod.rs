//! SVG rendering of bucket tables.
//!
//! Charts are presentation artifacts: they consume an ordered table plus a
//! per-bucket style and are never read back.

pub mod bar;
pub mod bubble;
pub mod palette;

pub use bar::render_stacked_bar;
pub use bubble::render_bubble;
pub use palette::{parse_hex, FALLBACK_GREY};

use crate::error::BucketError;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolved drawing style of one bucket.
#[derive(Debug, Clone)]
pub struct BucketStyle {
    /// Bucket name as it appears in the table.
    pub name: String,
    /// Legend text.
    pub label: String,
    /// Fill color.
    pub color: RGBColor,
}

/// Horizontal stacked bar chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    #[serde(default = "default_x_label")]
    pub x_label: String,
    #[serde(default = "default_y_label")]
    pub y_label: String,
    pub legend_title: String,
    #[serde(default = "default_bar_size")]
    pub size: (u32, u32),
}

/// Bubble chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleChart {
    pub title: String,
    /// Bubble area per unit value, in square points.
    pub scale: f64,
    /// Reference values shown in the bubble-size legend.
    #[serde(default)]
    pub size_legend: Vec<f64>,
    pub size_legend_title: String,
    pub color_legend_title: String,
    #[serde(default = "default_bubble_size")]
    pub size: (u32, u32),
}

/// Which chart to draw and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    StackedBar {
        path: PathBuf,
        #[serde(flatten)]
        options: BarChart,
    },
    Bubble {
        path: PathBuf,
        #[serde(flatten)]
        options: BubbleChart,
    },
}

impl ChartSpec {
    /// Output file of the chart.
    pub fn path(&self) -> &PathBuf {
        match self {
            ChartSpec::StackedBar { path, .. } | ChartSpec::Bubble { path, .. } => path,
        }
    }
}

fn default_x_label() -> String {
    "Relative Abundance".to_string()
}

fn default_y_label() -> String {
    "Sample Depth (cm)".to_string()
}

fn default_bar_size() -> (u32, u32) {
    (1000, 700)
}

fn default_bubble_size() -> (u32, u32) {
    (1200, 800)
}

/// Map any plotters error into the library error.
pub(crate) fn chart_err<E: std::fmt::Display>(e: E) -> BucketError {
    BucketError::Chart(e.to_string())
}

/// Label of a segmented axis position, for categorical axes.
pub(crate) fn segment_label(
    labels: &[String],
    value: &SegmentValue<i32>,
) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Shape drawn next to each legend entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Square,
    Circle,
}

/// Draw a titled legend in pixel coordinates, returning the next free row.
pub(crate) fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    entries: &[(String, RGBColor)],
    marker: Marker,
    top: i32,
) -> crate::error::Result<i32> {
    const ROW: i32 = 20;
    const LEFT: i32 = 10;

    area.draw(&Text::new(
        title.to_string(),
        (LEFT, top),
        ("sans-serif", 15).into_font(),
    ))
    .map_err(chart_err)?;

    let mut y = top + ROW + 4;
    for (label, color) in entries {
        match marker {
            Marker::Square => area
                .draw(&Rectangle::new(
                    [(LEFT, y), (LEFT + 12, y + 12)],
                    color.filled(),
                ))
                .map_err(chart_err)?,
            Marker::Circle => area
                .draw(&Circle::new((LEFT + 6, y + 6), 6, color.mix(0.6).filled()))
                .map_err(chart_err)?,
        }
        area.draw(&Text::new(
            label.clone(),
            (LEFT + 20, y),
            ("sans-serif", 13).into_font(),
        ))
        .map_err(chart_err)?;
        y += ROW;
    }
    Ok(y + ROW)
}
