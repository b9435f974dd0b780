use crate::config::DisplayConfig;
use anyhow::{Result, ensure};

/// Space kept on every side of the chart plot area for axes and titles.
pub const CHART_MARGIN: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub map: Canvas,
    pub chart: Canvas,
}

impl Layout {
    /// Landscape screens get map and chart side by side, portrait screens
    /// stack a square map above a half-height chart.
    pub fn from_display(display: &DisplayConfig) -> Result<Self> {
        ensure!(
            display.width > 0.0 && display.height > 0.0 && display.pixel_ratio > 0.0,
            "display size and pixel ratio must be positive"
        );
        let width = display.width * display.pixel_ratio;
        let height = display.height * display.pixel_ratio;

        let layout = if width > height {
            Layout {
                map: Canvas { width: width / 2.0 - 100.0, height: height * 0.75 },
                chart: Canvas { width: width / 2.0 - 200.0, height: height / 2.0 },
            }
        } else {
            Layout {
                map: Canvas { width, height: width },
                chart: Canvas { width, height: width / 2.0 },
            }
        };

        ensure!(
            layout.chart.width > 2.0 * CHART_MARGIN && layout.chart.height > 2.0 * CHART_MARGIN,
            "display {}x{} leaves no room for the chart plot area",
            width,
            height
        );
        Ok(layout)
    }
}
