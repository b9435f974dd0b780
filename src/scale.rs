//! Scales shared by the map, the legend and the chart.
//!
//! Behaviour follows the usual browser charting conventions: a degenerate
//! linear domain maps to the middle of the range, band scales center their
//! bands, and color output is `rgb(r, g, b)` with rounded channels.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const GREEN: Rgb = Rgb { r: 0, g: 128, b: 0 };
    pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let channel = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb { r: channel(r), g: channel(g), b: channel(b) }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn apply(&self, value: f64) -> f64 {
        let t = normalize(self.domain, value);
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    /// Roughly `count` evenly spaced round values covering the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (mut start, mut stop) = self.domain;
        if start == stop {
            return vec![start];
        }
        let reverse = stop < start;
        if reverse {
            std::mem::swap(&mut start, &mut stop);
        }
        let Some((i1, i2, inc)) = tick_spec(start, stop, count as f64) else {
            return Vec::new();
        };
        let mut ticks: Vec<f64> = (i1..=i2)
            .map(|i| {
                let i = i as f64;
                if inc < 0.0 { i / -inc } else { i * inc }
            })
            .collect();
        if reverse {
            ticks.reverse();
        }
        ticks
    }
}

fn normalize(domain: (f64, f64), value: f64) -> f64 {
    let span = domain.1 - domain.0;
    if span == 0.0 {
        0.5
    } else {
        (value - domain.0) / span
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    const E10: f64 = 7.0710678118654755; // sqrt(50)
    const E5: f64 = 3.1622776601683795; // sqrt(10)
    const E2: f64 = std::f64::consts::SQRT_2;

    if !(count > 0.0) || !start.is_finite() || !stop.is_finite() {
        return None;
    }
    let step = (stop - start) / count;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let mut i1;
    let mut i2;
    let inc;
    if power < 0.0 {
        let scaled = 10f64.powf(-power) / factor;
        i1 = (start * scaled).round();
        i2 = (stop * scaled).round();
        if i1 / scaled < start {
            i1 += 1.0;
        }
        if i2 / scaled > stop {
            i2 -= 1.0;
        }
        inc = -scaled;
    } else {
        let step = 10f64.powf(power) * factor;
        i1 = (start / step).round();
        i2 = (stop / step).round();
        if i1 * step < start {
            i1 += 1.0;
        }
        if i2 * step > stop {
            i2 -= 1.0;
        }
        inc = step;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    if i2 < i1 {
        return None;
    }
    Some((i1 as i64, i2 as i64, inc))
}

/// Discrete categories laid out as equal bands with padding between and
/// around them. Categories keep the order they were given in.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<f64>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    pub fn new(domain: Vec<f64>, range: (f64, f64), padding: f64) -> Self {
        let n = domain.len() as f64;
        let step = (range.1 - range.0) / (n - padding + padding * 2.0).max(1.0);
        let start = range.0 + (range.1 - range.0 - step * (n - padding)) * 0.5;
        let bandwidth = step * (1.0 - padding);
        Self { domain, start, step, bandwidth }
    }

    /// Left edge of the band for `key`, or `None` for an unknown key.
    pub fn apply(&self, key: f64) -> Option<f64> {
        self.domain
            .iter()
            .position(|k| *k == key)
            .map(|i| self.start + self.step * i as f64)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn domain(&self) -> &[f64] {
        &self.domain
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolator {
    /// Straight per-channel RGB blend between two colors.
    Rgb(Rgb, Rgb),
    /// Purple to cyan to green cubehelix ramp.
    Cool,
}

impl Interpolator {
    pub fn at(&self, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Interpolator::Rgb(a, b) => {
                let lerp = |x: u8, y: u8| {
                    (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8
                };
                Rgb { r: lerp(a.r, b.r), g: lerp(a.g, b.g), b: lerp(a.b, b.b) }
            }
            Interpolator::Cool => cubehelix(-100.0 + 180.0 * t, 0.75 + 0.75 * t, 0.35 + 0.45 * t),
        }
    }
}

fn cubehelix(hue_deg: f64, saturation: f64, lightness: f64) -> Rgb {
    const A: f64 = -0.14861;
    const B: f64 = 1.78277;
    const C: f64 = -0.29227;
    const D: f64 = -0.90649;
    const E: f64 = 1.97294;

    let h = (hue_deg + 120.0).to_radians();
    let l = lightness;
    let a = saturation * l * (1.0 - l);
    let (sinh, cosh) = h.sin_cos();
    Rgb::from_unit(
        l + a * (A * cosh + B * sinh),
        l + a * (C * cosh + D * sinh),
        l + a * (E * cosh),
    )
}

/// Continuous numeric domain onto a color ramp. Values outside the domain
/// take the nearest endpoint color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialScale {
    domain: (f64, f64),
    interpolator: Interpolator,
}

impl SequentialScale {
    pub fn new(domain: (f64, f64), interpolator: Interpolator) -> Self {
        Self { domain, interpolator }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn apply(&self, value: f64) -> Rgb {
        self.interpolator.at(normalize(self.domain, value))
    }
}

/// Exponential ease-in-out, exactly 0 at `t = 0` and 1 at `t = 1`.
pub fn ease_exp_in_out(t: f64) -> f64 {
    fn tpmt(x: f64) -> f64 {
        (2f64.powf(-10.0 * x) - 0.0009765625) * 1.0009775171065494
    }
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        tpmt(1.0 - t) / 2.0
    } else {
        (2.0 - tpmt(t - 1.0)) / 2.0
    }
}

/// Cubic bezier control points approximating [`ease_exp_in_out`], for
/// renderers that only accept splines.
pub const EXP_IN_OUT_SPLINE: [f64; 4] = [0.87, 0.0, 0.13, 1.0];
