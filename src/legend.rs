use crate::scale::{LinearScale, Rgb, SequentialScale};
use crate::svg;
use std::fmt::Write;

const SWATCH_HEIGHT: f64 = 10.0;
const SWATCH_GAP: f64 = 1.0;
const LABEL_FONT_SIZE: u32 = 12;

/// Most swatches a legend will draw.
pub const MAX_BUCKETS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub start: f64,
    pub x: f64,
    pub width: f64,
    pub fill: Rgb,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub swatches: Vec<Swatch>,
}

/// Number of `step`-wide buckets needed to cover `[min, max)`.
pub fn bucket_count(price_min: f64, price_max: f64, step: f64) -> f64 {
    let count = ((price_max - price_min) / step).ceil();
    if count > 0.0 { count } else { 0.0 }
}

/// Bucket starts `min, min + step, ...` strictly below `max`, at most
/// [`MAX_BUCKETS`] of them.
pub fn bucket_starts(price_min: f64, price_max: f64, step: f64) -> Vec<f64> {
    let count = bucket_count(price_min, price_max, step).min(MAX_BUCKETS as f64);
    (0..count as usize).map(|i| price_min + i as f64 * step).collect()
}

impl Legend {
    pub fn build(color: &SequentialScale, canvas_width: f64, step: f64) -> Self {
        let (price_min, price_max) = color.domain();
        let starts = bucket_starts(price_min, price_max, step);
        let position = LinearScale::new((price_min, price_max), (0.0, canvas_width - step));
        let width = canvas_width / starts.len().max(1) as f64 - SWATCH_GAP;

        let swatches = starts
            .into_iter()
            .map(|start| Swatch {
                start,
                x: position.apply(start),
                width,
                fill: color.apply(start),
                label: format!("[{},{})", start, start + step),
            })
            .collect();
        Self { swatches }
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::from("<g class=\"legend\">");
        for s in &self.swatches {
            let _ = write!(
                out,
                "<rect x=\"{}\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                svg::num(s.x),
                svg::num(s.width),
                SWATCH_HEIGHT,
                s.fill
            );
        }
        for s in &self.swatches {
            let _ = write!(
                out,
                "<text x=\"{}\" y=\"{}\" font-size=\"{}\">{}</text>",
                svg::num(s.x),
                SWATCH_HEIGHT * 2.5,
                LABEL_FONT_SIZE,
                svg::escape(&s.label)
            );
        }
        out.push_str("</g>");
        out
    }
}
