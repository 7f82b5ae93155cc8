//! Bubble chart: buckets on x, samples on y, area proportional to value.

use super::{chart_err, draw_legend, segment_label, BubbleChart, BucketStyle, Marker, FALLBACK_GREY};
use crate::data::BucketTable;
use crate::error::{BucketError, Result};
use plotters::prelude::*;
use std::path::Path;

const PLOT_FRACTION: f64 = 0.75;

/// Pixel radius of a bubble whose area is `value * scale` square points.
pub fn bubble_radius(value: f64, scale: f64) -> i32 {
    // 1 pt = 4/3 px; radius = sqrt(area) / 2.
    let radius = (value * scale).max(0.0).sqrt() * 2.0 / 3.0;
    radius.round().max(1.0) as i32
}

/// Draw `table` as a bubble chart into an SVG file.
///
/// Each bucket takes the color of its style, which callers set to the color
/// of the bucket's group. `groups` lists the color legend entries. Zero and
/// NaN cells draw nothing. The first sample column is drawn at the top.
pub fn render_bubble<P: AsRef<Path>>(
    path: P,
    table: &BucketTable,
    styles: &[BucketStyle],
    groups: &[(String, RGBColor)],
    chart: &BubbleChart,
) -> Result<()> {
    let n_buckets = table.n_buckets();
    let n_samples = table.n_samples();
    if n_samples == 0 || n_buckets == 0 {
        return Err(BucketError::EmptyData(
            "cannot draw a bubble chart of an empty table".to_string(),
        ));
    }
    if chart.scale.is_nan() || chart.scale <= 0.0 {
        return Err(BucketError::InvalidParameter(format!(
            "bubble scale must be positive, got {}",
            chart.scale
        )));
    }

    let bucket_labels: Vec<String> = table
        .bucket_ids()
        .iter()
        .map(|b| {
            styles
                .iter()
                .find(|s| &s.name == b)
                .map_or_else(|| b.clone(), |s| s.label.clone())
        })
        .collect();
    let sample_labels: Vec<String> = table.sample_ids().iter().rev().cloned().collect();

    let root = SVGBackend::new(path.as_ref(), chart.size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let (plot_area, legend_area) =
        root.split_horizontally((chart.size.0 as f64 * PLOT_FRACTION) as i32);

    let mut ctx = ChartBuilder::on(&plot_area)
        .caption(&chart.title, ("sans-serif", 18))
        .margin(15)
        .top_x_label_area_size(140)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (0..n_buckets as i32).into_segmented(),
            (0..n_samples as i32).into_segmented(),
        )
        .map_err(chart_err)?;

    let x_fmt = |v: &SegmentValue<i32>| segment_label(&bucket_labels, v);
    let y_fmt = |v: &SegmentValue<i32>| segment_label(&sample_labels, v);
    ctx.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n_buckets)
        .y_labels(n_samples)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_label_style(
            ("sans-serif", 11)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_desc("Sample Depth (cm)")
        .draw()
        .map_err(chart_err)?;

    for (i, bucket) in table.bucket_ids().iter().enumerate() {
        let color = styles
            .iter()
            .find(|s| &s.name == bucket)
            .map_or(FALLBACK_GREY, |s| s.color);
        for k in 0..n_samples {
            let value = table.get(i, n_samples - 1 - k);
            if !value.is_finite() || value <= 0.0 {
                continue;
            }
            let center = (SegmentValue::CenterOf(i as i32), SegmentValue::CenterOf(k as i32));
            let radius = bubble_radius(value, chart.scale);
            ctx.draw_series(vec![
                Circle::new(center.clone(), radius, color.mix(0.6).filled()),
                Circle::new(center, radius, BLACK.stroke_width(1)),
            ])
            .map_err(chart_err)?;
        }
    }

    let mut y = draw_size_legend(&legend_area, chart, 40)?;
    y = draw_legend(&legend_area, &chart.color_legend_title, groups, Marker::Circle, y)?;
    tracing::trace!("Bubble legend ends at y={}", y);

    root.present().map_err(chart_err)?;
    tracing::debug!("Wrote bubble chart to {:?}", path.as_ref());
    Ok(())
}

fn draw_size_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    chart: &BubbleChart,
    top: i32,
) -> Result<i32> {
    if chart.size_legend.is_empty() {
        return Ok(top);
    }
    area.draw(&Text::new(
        chart.size_legend_title.clone(),
        (10, top),
        ("sans-serif", 15).into_font(),
    ))
    .map_err(chart_err)?;

    let mut y = top + 24;
    for &value in &chart.size_legend {
        let radius = bubble_radius(value, chart.scale);
        area.draw(&Circle::new((10 + radius, y + radius), radius, BLACK.stroke_width(1)))
            .map_err(chart_err)?;
        area.draw(&Text::new(
            format!("{}", value),
            (20 + 2 * radius, y + radius - 6),
            ("sans-serif", 13).into_font(),
        ))
        .map_err(chart_err)?;
        y += 2 * radius + 8;
    }
    Ok(y + 20)
}
