//! Chart rasterization for the graphs report.
//!
//! Every chart becomes a PNG-encoded [`RasterImage`] as soon as it is drawn,
//! so at most one uncompressed canvas exists at a time. [`rasterize_all`] is
//! the ordered pipeline stage: a chart that fails is logged and left out,
//! and the others carry on.

use std::io::Cursor;

use printpdf::image_crate::{self, DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::{debug, warn};

use crate::aggregate::parse_timestamp;
use crate::document::RasterImage;
use crate::error::RasterizationError;
use crate::models::SensorReading;
use crate::stats::{compute_values, SensorField};

// ---

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 600;
const MAX_SIDE: u32 = 4000;
const PLOT_PAD: u32 = 40;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([120, 120, 120]);
const MAX_GUIDE: Rgb<u8> = Rgb([239, 68, 68]);
const MIN_GUIDE: Rgb<u8> = Rgb([59, 130, 246]);
const LINE: Rgb<u8> = Rgb([34, 197, 94]);

/// Anything that can be turned into one raster image for the document.
pub trait ChartSource: Send + Sync {
    fn label(&self) -> &str;
    fn rasterize(&self) -> Result<RasterImage, RasterizationError>;
}

/// One sensor metric over time, drawn as a polyline with min/max guides.
/// The label becomes the image caption.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChart {
    pub label: String,
    pub points: Vec<f64>,
    pub width: u32,
    pub height: u32,
}

impl SeriesChart {
    pub fn new(label: impl Into<String>, points: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            points,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Build the series for `field` in timestamp order. Readings without a
    /// usable value or timestamp are skipped.
    pub fn from_readings(field: SensorField, readings: &[SensorReading]) -> Self {
        // ---
        let mut timed: Vec<_> = readings
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let at = r.timestamp.as_deref().and_then(|t| parse_timestamp(t).ok())?;
                field.value(r).map(|v| (at, i, v))
            })
            .collect();
        timed.sort_by_key(|(at, i, _)| (*at, *i));

        Self::new(field.label(), timed.into_iter().map(|(_, _, v)| v).collect())
    }

    fn draw(&self) -> Result<RgbImage, RasterizationError> {
        // ---
        if self.width < PLOT_PAD * 3
            || self.height < PLOT_PAD * 3
            || self.width > MAX_SIDE
            || self.height > MAX_SIDE
        {
            return Err(RasterizationError::InvalidSize {
                label: self.label.clone(),
                width: self.width,
                height: self.height,
            });
        }

        let stats = compute_values(self.points.iter().map(|v| Some(*v)));
        let (Some(min), Some(max)) = (stats.min, stats.max) else {
            return Err(RasterizationError::EmptySeries(self.label.clone()));
        };

        let (lo, hi) = if (max - min).abs() < f64::EPSILON {
            (min - 1.0, max + 1.0)
        } else {
            (min, max)
        };

        let mut canvas = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let left = PLOT_PAD as i64;
        let right = (self.width - PLOT_PAD) as i64;
        let top = PLOT_PAD as i64;
        let bottom = (self.height - PLOT_PAD) as i64;

        let y_of = |v: f64| -> i64 {
            let t = (v - lo) / (hi - lo);
            bottom - (t * (bottom - top) as f64).round() as i64
        };
        let points: Vec<f64> = self.points.iter().copied().filter(|v| v.is_finite()).collect();
        let x_of = |i: usize| -> i64 {
            if points.len() <= 1 {
                (left + right) / 2
            } else {
                left + ((i as f64 / (points.len() - 1) as f64) * (right - left) as f64).round() as i64
            }
        };

        line(&mut canvas, (left, top), (left, bottom), AXIS, 1);
        line(&mut canvas, (left, bottom), (right, bottom), AXIS, 1);
        line(&mut canvas, (left, y_of(max)), (right, y_of(max)), MAX_GUIDE, 1);
        line(&mut canvas, (left, y_of(min)), (right, y_of(min)), MIN_GUIDE, 1);

        let mut prev: Option<(i64, i64)> = None;
        for (i, v) in points.iter().enumerate() {
            let here = (x_of(i), y_of(*v));
            match prev {
                Some(from) => line(&mut canvas, from, here, LINE, 2),
                None => line(&mut canvas, here, here, LINE, 3),
            }
            prev = Some(here);
        }

        Ok(canvas)
    }
}

impl ChartSource for SeriesChart {
    fn label(&self) -> &str {
        &self.label
    }

    fn rasterize(&self) -> Result<RasterImage, RasterizationError> {
        // ---
        let canvas = self.draw()?;
        encode_png(&self.label, Some(&self.label), DynamicImage::ImageRgb8(canvas))
    }
}

/// A chart that arrives already rendered (PNG or JPEG bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedChart {
    pub label: String,
    pub bytes: Vec<u8>,
}

impl EncodedChart {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes,
        }
    }
}

impl ChartSource for EncodedChart {
    fn label(&self) -> &str {
        &self.label
    }

    fn rasterize(&self) -> Result<RasterImage, RasterizationError> {
        // ---
        let decoded =
            image_crate::load_from_memory(&self.bytes).map_err(|e| RasterizationError::Decode {
                label: self.label.clone(),
                reason: e.to_string(),
            })?;

        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(RasterizationError::InvalidSize {
                label: self.label.clone(),
                width: decoded.width(),
                height: decoded.height(),
            });
        }

        // Alpha is flattened; the PDF page is white anyway. Pre-rendered
        // charts carry their title in the pixels.
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
        encode_png(&self.label, None, rgb)
    }
}

fn encode_png(
    label: &str,
    caption: Option<&str>,
    image: DynamicImage,
) -> Result<RasterImage, RasterizationError> {
    // ---
    let (width, height) = (image.width(), image.height());
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| RasterizationError::Encode {
            label: label.to_string(),
            reason: e.to_string(),
        })?;

    Ok(RasterImage {
        label: label.to_string(),
        caption: caption.map(str::to_string),
        width,
        height,
        png,
    })
}

/// Rasterize charts one after another, in order. Failures are logged and
/// skipped.
pub fn rasterize_all(charts: &[Box<dyn ChartSource>]) -> Vec<RasterImage> {
    // ---
    let mut images = Vec::with_capacity(charts.len());

    for (index, chart) in charts.iter().enumerate() {
        match chart.rasterize() {
            Ok(image) => {
                debug!(chart = chart.label(), bytes = image.png.len(), "Rasterized chart");
                images.push(image);
            }
            Err(e) => {
                warn!(index, chart = chart.label(), reason = %e, "Skipping chart");
            }
        }
    }

    images
}

/// One chart per sensor metric that has at least one value.
pub fn sensor_charts(readings: &[SensorReading]) -> Vec<Box<dyn ChartSource>> {
    SensorField::ALL
        .iter()
        .map(|&field| Box::new(SeriesChart::from_readings(field, readings)) as Box<dyn ChartSource>)
        .collect()
}

// Bresenham with a square brush.
fn line(canvas: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>, thickness: i64) {
    // ---
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let half = thickness / 2;

    loop {
        for ox in -half..=half {
            for oy in -half..=half {
                let (px, py) = (x + ox, y + oy);
                if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }

        if x == to.0 && y == to.1 {
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
