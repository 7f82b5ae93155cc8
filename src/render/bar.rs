//! Horizontal stacked bar chart: one bar per sample, one segment per bucket.

use super::{chart_err, draw_legend, segment_label, BarChart, BucketStyle, Marker, FALLBACK_GREY};
use crate::data::BucketTable;
use crate::error::{BucketError, Result};
use plotters::prelude::*;
use std::path::Path;

/// Share of the canvas width given to the plot; the rest holds the legend.
const PLOT_FRACTION: f64 = 0.72;

/// Draw `table` as stacked horizontal bars into an SVG file.
///
/// The first sample column is drawn at the top. Buckets are stacked left to
/// right in row order; NaN and non-positive cells are skipped. Buckets
/// without a style fall back to grey.
pub fn render_stacked_bar<P: AsRef<Path>>(
    path: P,
    table: &BucketTable,
    styles: &[BucketStyle],
    chart: &BarChart,
) -> Result<()> {
    let n_samples = table.n_samples();
    if n_samples == 0 || table.n_buckets() == 0 {
        return Err(BucketError::EmptyData(
            "cannot draw a bar chart of an empty table".to_string(),
        ));
    }

    // Segment k counts from the bottom, so the label list runs backwards.
    let plot_labels: Vec<String> = table.sample_ids().iter().rev().cloned().collect();
    let widest = table
        .col_sums()
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let x_max = if widest > 0.0 { widest * 1.02 } else { 1.0 };

    let root = SVGBackend::new(path.as_ref(), chart.size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let (plot_area, legend_area) =
        root.split_horizontally((chart.size.0 as f64 * PLOT_FRACTION) as i32);

    let mut ctx = ChartBuilder::on(&plot_area)
        .caption(&chart.title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..x_max, (0..n_samples as i32).into_segmented())
        .map_err(chart_err)?;

    let y_fmt = |v: &SegmentValue<i32>| segment_label(&plot_labels, v);
    ctx.configure_mesh()
        .disable_y_mesh()
        .y_labels(n_samples)
        .y_label_formatter(&y_fmt)
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()
        .map_err(chart_err)?;

    let colors: Vec<RGBColor> = table
        .bucket_ids()
        .iter()
        .map(|b| style_of(styles, b).map_or(FALLBACK_GREY, |s| s.color))
        .collect();

    for k in 0..n_samples {
        let j = n_samples - 1 - k;
        let row = k as i32;
        let mut left = 0.0;
        for (i, color) in colors.iter().enumerate() {
            let value = table.get(i, j);
            if !value.is_finite() || value <= 0.0 {
                continue;
            }
            let mut bar = Rectangle::new(
                [
                    (left, SegmentValue::Exact(row)),
                    (left + value, SegmentValue::Exact(row + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(4, 4, 0, 0);
            ctx.draw_series(std::iter::once(bar)).map_err(chart_err)?;
            left += value;
        }
    }

    let entries: Vec<(String, RGBColor)> = table
        .bucket_ids()
        .iter()
        .zip(&colors)
        .map(|(b, c)| {
            let label = style_of(styles, b).map_or_else(|| b.clone(), |s| s.label.clone());
            (label, *c)
        })
        .collect();
    draw_legend(&legend_area, &chart.legend_title, &entries, Marker::Square, 40)?;

    root.present().map_err(chart_err)?;
    tracing::debug!("Wrote stacked bar chart to {:?}", path.as_ref());
    Ok(())
}

fn style_of<'a>(styles: &'a [BucketStyle], bucket: &str) -> Option<&'a BucketStyle> {
    styles.iter().find(|s| s.name == bucket)
}
