//! Daily deposits/withdrawals timeline rendered to a PNG.

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use stmt_core::DailyTotal;

pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 400;

const MARGIN_LEFT: i64 = 60;
const MARGIN_RIGHT: i64 = 30;
const MARGIN_TOP: i64 = 40;
const MARGIN_BOTTOM: i64 = 40;
pub const GRID_LINES: i64 = 4;
const MARKER_RADIUS: i64 = 3;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const DEPOSIT_COLOR: Rgb<u8> = Rgb([31, 140, 60]);
pub const WITHDRAWAL_COLOR: Rgb<u8> = Rgb([200, 40, 40]);

/// Draw deposits and withdrawals per day as two line series.
///
/// Returns `None` when there are no days to plot.
pub fn render_timeline(days: &[DailyTotal]) -> Option<RgbImage> {
    let first = days.first()?.date;
    let last = days.last()?.date;
    let span_days = (last - first).num_days().max(1) as f64;

    let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, WHITE);
    let (w, h) = (CHART_WIDTH as i64, CHART_HEIGHT as i64);
    let (x0, x1) = (MARGIN_LEFT, w - MARGIN_RIGHT);
    let (y_top, y_base) = (MARGIN_TOP, h - MARGIN_BOTTOM);

    let y_max = y_axis_ceiling(days);

    for i in 1..=GRID_LINES {
        let y = y_base - (y_base - y_top) * i / GRID_LINES;
        draw_line(&mut img, x0, y, x1, y, GRID);
    }
    draw_line(&mut img, x0, y_base, x1, y_base, AXIS);
    draw_line(&mut img, x0, y_top, x0, y_base, AXIS);

    let to_point = |d: &DailyTotal, value: f64| -> (i64, i64) {
        let x = if days.len() == 1 {
            (x0 + x1) / 2
        } else {
            let frac = (d.date - first).num_days() as f64 / span_days;
            x0 + (frac * (x1 - x0) as f64).round() as i64
        };
        let y = y_base - ((value / y_max) * (y_base - y_top) as f64).round() as i64;
        (x, y)
    };

    for (color, pick) in [
        (DEPOSIT_COLOR, (|d: &DailyTotal| d.deposits) as fn(&DailyTotal) -> f64),
        (WITHDRAWAL_COLOR, |d: &DailyTotal| d.withdrawals),
    ] {
        let points: Vec<(i64, i64)> = days.iter().map(|d| to_point(d, pick(d))).collect();
        for pair in points.windows(2) {
            draw_line(&mut img, pair[0].0, pair[0].1, pair[1].0, pair[1].1, color);
        }
        for &(x, y) in &points {
            fill_square(&mut img, x, y, MARKER_RADIUS, color);
        }
    }

    // Legend swatches: deposits then withdrawals, top left.
    fill_square(&mut img, x0 + 10, MARGIN_TOP / 2, 5, DEPOSIT_COLOR);
    fill_square(&mut img, x0 + 30, MARGIN_TOP / 2, 5, WITHDRAWAL_COLOR);

    Some(img)
}

/// Top of the y axis: the largest daily total rounded up to a round value.
pub fn y_axis_ceiling(days: &[DailyTotal]) -> f64 {
    let max = days
        .iter()
        .map(|d| d.deposits.max(d.withdrawals))
        .fold(0.0_f64, f64::max);
    nice_ceiling(max)
}

pub fn save_png(path: impl AsRef<Path>, img: &RgbImage) -> Result<()> {
    let path = path.as_ref();
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing chart {}", path.display()))
}

/// Round up to 1, 2 or 5 times a power of ten so grid lines land on round values.
fn nice_ceiling(v: f64) -> f64 {
    if v <= 0.0 {
        return 1.0;
    }
    let mag = 10f64.powf(v.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * mag)
        .find(|c| *c >= v)
        .unwrap_or(10.0 * mag)
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

// Bresenham, clipped per pixel.
fn draw_line(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
    let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_square(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            put(img, x, y, color);
        }
    }
}
