//! Aggregations behind the case charts and their PNG rendering.
//!
//! Charts carry no text; bar order and slice order follow the aggregated
//! series, which is sorted deterministically, so equal input renders to
//! identical bytes.
//!
//! Titles, axis labels, slice labels and percentages are not drawn.

use anyhow::{Context as _, Result, bail};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder as _, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use polars::prelude::*;

/// Countries shown in the confirmed-cases chart.
pub const TOP_COUNTRIES: usize = 10;

pub const BAR_CHART_SIZE: (u32, u32) = (1000, 600);
pub const PIE_CHART_SIZE: u32 = 800;

/// First slice starts at this angle, counter-clockwise from the x-axis.
const PIE_START_DEGREES: f64 = 140.0;
const MARGIN: u32 = 50;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const BAR: Rgb<u8> = Rgb([0x1f, 0x77, 0xb4]);
const PALETTE: [Rgb<u8>; 10] = [
    Rgb([0x1f, 0x77, 0xb4]),
    Rgb([0xff, 0x7f, 0x0e]),
    Rgb([0x2c, 0xa0, 0x2c]),
    Rgb([0xd6, 0x27, 0x28]),
    Rgb([0x94, 0x67, 0xbd]),
    Rgb([0x8c, 0x56, 0x4b]),
    Rgb([0xe3, 0x77, 0xc2]),
    Rgb([0x7f, 0x7f, 0x7f]),
    Rgb([0xbc, 0xbd, 0x22]),
    Rgb([0x17, 0xbe, 0xcf]),
];

enum Agg {
    Max,
    Sum,
}

/// Peak `Confirmed` per `Country/Region`, largest first, truncated to `n`.
/// Ties are broken by country name.
pub fn top_countries_by_confirmed(df: &DataFrame, n: usize) -> Result<Vec<(String, f64)>> {
    let mut totals = aggregate(df, "Country/Region", "Confirmed", Agg::Max)?;
    totals.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    totals.truncate(n);
    Ok(totals)
}

/// Total `TotalCases` per `Continent`, ordered by continent name.
pub fn cases_by_continent(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    let mut totals = aggregate(df, "Continent", "TotalCases", Agg::Sum)?;
    totals.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(totals)
}

/// Bar chart of the ten countries with the highest confirmed counts.
pub fn plot_cases(df: &DataFrame) -> Result<Vec<u8>> {
    let top = top_countries_by_confirmed(df, TOP_COUNTRIES)?;
    tracing::debug!("Plotting confirmed cases for {} countries", top.len());
    let values: Vec<f64> = top.iter().map(|(_, v)| *v).collect();
    render_bar_chart(&values, BAR_CHART_SIZE.0, BAR_CHART_SIZE.1)
}

/// Pie chart of total cases per continent.
pub fn plot_cases_by_continent(df: &DataFrame) -> Result<Vec<u8>> {
    let totals = cases_by_continent(df)?;
    tracing::debug!("Plotting case share for {} continents", totals.len());
    let values: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();
    render_pie_chart(&values, PIE_CHART_SIZE)
}

fn aggregate(df: &DataFrame, key: &str, value: &str, agg: Agg) -> Result<Vec<(String, f64)>> {
    for name in [key, value] {
        df.column(name)
            .with_context(|| format!("Column '{name}' not found"))?;
    }

    let expr = match agg {
        Agg::Max => col(value).max(),
        Agg::Sum => col(value).sum(),
    };
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg([expr.alias(value)])
        .collect()
        .with_context(|| format!("Failed to aggregate '{value}' by '{key}'"))?;

    let keys = grouped
        .column(key)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = grouped
        .column(value)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    Ok(keys
        .str()?
        .into_iter()
        .zip(values.f64()?)
        .filter_map(|(k, v)| Some((k?.to_owned(), v.unwrap_or(0.0))))
        .collect())
}

/// Vertical bars scaled to the largest value, left to right in input order.
pub fn render_bar_chart(values: &[f64], width: u32, height: u32) -> Result<Vec<u8>> {
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        bail!("Chart of {width}x{height} leaves no plot area");
    }
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let plot_w = width - 2 * MARGIN;
    let plot_h = height - 2 * MARGIN;
    let baseline = height - MARGIN;
    let peak = values.iter().copied().fold(0.0_f64, f64::max);

    if !values.is_empty() && peak > 0.0 {
        let slot = plot_w / u32::try_from(values.len()).unwrap_or(u32::MAX).max(1);
        if slot == 0 {
            bail!("{} bars do not fit in a {width} pixel wide chart", values.len());
        }
        let bar_w = (slot * 4 / 5).max(1);
        for (i, value) in values.iter().enumerate() {
            let bar_h = (value.max(0.0) / peak * f64::from(plot_h)).round() as u32;
            if bar_h == 0 {
                continue;
            }
            let x = MARGIN + slot * u32::try_from(i)? + (slot - bar_w) / 2;
            let rect = Rect::at(x as i32, (baseline - bar_h) as i32).of_size(bar_w, bar_h);
            draw_filled_rect_mut(&mut img, rect, BAR);
        }
    }

    let (left, right) = (MARGIN as f32, (width - MARGIN) as f32);
    let (top, bottom) = (MARGIN as f32, baseline as f32);
    draw_line_segment_mut(&mut img, (left, bottom), (right, bottom), AXIS);
    draw_line_segment_mut(&mut img, (left, top), (left, bottom), AXIS);

    encode_png(&img)
}

/// Pie chart with slices proportional to `values`, starting at 140 degrees
/// and running counter-clockwise. Negative values are rejected.
pub fn render_pie_chart(values: &[f64], size: u32) -> Result<Vec<u8>> {
    if let Some(bad) = values.iter().find(|v| **v < 0.0 || v.is_nan()) {
        bail!("Pie slices must be non-negative, got {bad}");
    }
    let mut img = RgbImage::from_pixel(size, size, BACKGROUND);

    let total: f64 = values.iter().sum();
    if total > 0.0 {
        let mut bounds = Vec::with_capacity(values.len());
        let mut running = 0.0;
        for value in values {
            running += value / total;
            bounds.push(running);
        }

        let center = f64::from(size) / 2.0;
        let radius = f64::from(size) * 0.4;
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let dx = f64::from(x) + 0.5 - center;
            let dy = center - (f64::from(y) + 0.5);
            if dx.hypot(dy) > radius {
                continue;
            }
            let angle = dy.atan2(dx).to_degrees();
            let share = (angle - PIE_START_DEGREES).rem_euclid(360.0) / 360.0;
            let slice = bounds
                .iter()
                .position(|bound| share < *bound)
                .unwrap_or(bounds.len() - 1);
            *pixel = PALETTE[slice % PALETTE.len()];
        }
    }

    encode_png(&img)
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, ColorType::Rgb8)
        .context("Failed to encode PNG")?;
    Ok(buffer)
}
