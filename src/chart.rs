//! Bar chart of listings per bedroom count for one neighborhood.

use crate::layout::{CHART_MARGIN, Canvas};
use crate::scale::{self, BandScale, Interpolator, LinearScale, Rgb, SequentialScale};
use crate::svg;
use crate::types::{BedroomCount, Neighborhood};
use std::fmt::Write;

pub const BAR_GROWTH_MS: u64 = 1250;
pub const BAR_STAGGER_MS: u64 = 100;
pub const BAND_PADDING: f64 = 0.1;
pub const CAPTION: &str = "Y: No. of properties | X: No. of bedrooms";

const Y_TICK_COUNT: usize = 10;
const TICK_SIZE: f64 = 6.0;
const LABEL_OFFSET: f64 = 10.0;

/// Bedroom count to number of listings, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartDataset {
    entries: Vec<(f64, f64)>,
}

impl ChartDataset {
    /// Records without a bedroom count are skipped. A repeated bedroom count
    /// keeps its first position and takes the later total.
    pub fn from_records(records: &[BedroomCount]) -> Self {
        let mut dataset = Self::default();
        for record in records {
            if let Some(bedrooms) = record.bedrooms {
                dataset.insert(bedrooms, record.total);
            }
        }
        dataset
    }

    pub fn insert(&mut self, bedrooms: f64, total: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == bedrooms) {
            Some(entry) => entry.1 = total,
            None => self.entries.push((bedrooms, total)),
        }
    }

    pub fn entries(&self) -> &[(f64, f64)] {
        &self.entries
    }

    pub fn keys(&self) -> Vec<f64> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bedrooms_max(&self) -> Option<f64> {
        self.entries.iter().map(|(k, _)| *k).reduce(f64::max)
    }

    pub fn properties_max(&self) -> Option<f64> {
        self.entries.iter().map(|(_, v)| *v).reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub fill: Rgb,
}

/// A bar grows from the baseline (`start_y`, height 0) to its final
/// geometry after `delay_ms`, over [`BAR_GROWTH_MS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub key: f64,
    pub value: f64,
    pub x: f64,
    pub width: f64,
    pub start_y: f64,
    pub y: f64,
    pub height: f64,
    pub fill: Rgb,
    pub delay_ms: u64,
    pub label: ValueLabel,
}

impl Bar {
    pub fn element_id(key: f64) -> String {
        format!("bar-{}", svg::num(key))
    }

    pub fn label_element_id(key: f64) -> String {
        format!("text-{}", svg::num(key))
    }

    /// Geometry `(y, height)` at `elapsed_ms` after the chart appeared.
    pub fn frame_at(&self, elapsed_ms: u64) -> (f64, f64) {
        let t = elapsed_ms.saturating_sub(self.delay_ms) as f64 / BAR_GROWTH_MS as f64;
        let k = scale::ease_exp_in_out(t);
        (
            self.start_y + (self.y - self.start_y) * k,
            self.height * k,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct BarChart {
    pub canvas: Canvas,
    /// Plot area inside the margins.
    pub plot: Canvas,
    pub title: String,
    pub dataset: ChartDataset,
    pub bedrooms_max: Option<f64>,
    pub properties_max: f64,
    pub x: BandScale,
    pub y: LinearScale,
    pub color: SequentialScale,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn build(neighborhood: &Neighborhood, canvas: Canvas) -> Self {
        let dataset = ChartDataset::from_records(&neighborhood.bedrooms);
        let plot = Canvas {
            width: canvas.width - 2.0 * CHART_MARGIN,
            height: canvas.height - 2.0 * CHART_MARGIN,
        };

        let bedrooms_max = dataset.bedrooms_max();
        let properties_max = dataset.properties_max().unwrap_or(0.0);

        let x = BandScale::new(dataset.keys(), (0.0, plot.width), BAND_PADDING);
        let y = LinearScale::new((0.0, properties_max), (plot.height, 0.0));
        let color = SequentialScale::new((0.0, properties_max), Interpolator::Cool);

        let bars = dataset
            .entries()
            .iter()
            .enumerate()
            .filter_map(|(i, &(key, value))| {
                let left = x.apply(key)?;
                let top = y.apply(value);
                let fill = color.apply(value);
                Some(Bar {
                    key,
                    value,
                    x: left,
                    width: x.bandwidth(),
                    start_y: y.apply(0.0),
                    y: top,
                    height: plot.height - top,
                    fill,
                    delay_ms: i as u64 * BAR_STAGGER_MS,
                    label: ValueLabel {
                        x: left + x.bandwidth() / 2.0,
                        y: top - LABEL_OFFSET,
                        text: svg::num(value),
                        fill,
                    },
                })
            })
            .collect();

        let x_ticks = dataset
            .keys()
            .into_iter()
            .filter_map(|key| {
                x.apply(key).map(|left| Tick {
                    position: left + x.bandwidth() / 2.0,
                    label: svg::num(key),
                })
            })
            .collect();
        let y_ticks = y
            .ticks(Y_TICK_COUNT)
            .into_iter()
            .map(|v| Tick { position: y.apply(v), label: svg::num(v) })
            .collect();

        Self {
            canvas,
            plot,
            title: neighborhood.name.clone(),
            dataset,
            bedrooms_max,
            properties_max,
            x,
            y,
            color,
            x_ticks,
            y_ticks,
            bars,
        }
    }

    pub fn bar(&self, key: f64) -> Option<&Bar> {
        self.bars.iter().find(|b| b.key == key)
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"chart\" width=\"{}\" height=\"{}\">\
             <g transform=\"translate({}, {})\">",
            svg::num(self.canvas.width),
            svg::num(self.canvas.height),
            CHART_MARGIN,
            CHART_MARGIN
        );
        self.write_x_axis(&mut out);
        self.write_y_axis(&mut out);

        out.push_str("<g class=\"bars\">");
        for bar in &self.bars {
            let _ = write!(
                out,
                "<rect id=\"{}\" data-key=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"0\" \
                 fill=\"{}\" opacity=\"1\">",
                Bar::element_id(bar.key),
                svg::num(bar.key),
                svg::num(bar.x),
                svg::num(bar.start_y),
                svg::num(bar.width),
                bar.fill
            );
            write_growth(&mut out, "y", bar.start_y, bar.y, bar.delay_ms);
            write_growth(&mut out, "height", 0.0, bar.height, bar.delay_ms);
            out.push_str("</rect>");
        }
        out.push_str("</g><g class=\"labels\">");
        for bar in &self.bars {
            let _ = write!(
                out,
                "<text id=\"{}\" x=\"{}\" y=\"{}\" text-anchor=\"middle\" opacity=\"0\" \
                 fill=\"{}\">{}</text>",
                Bar::label_element_id(bar.key),
                svg::num(bar.label.x),
                svg::num(bar.label.y),
                bar.label.fill,
                bar.label.text
            );
        }
        let _ = write!(
            out,
            "</g><g><text x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text></g>\
             <g><text x=\"{}\" y=\"-30\" text-anchor=\"middle\" font-weight=\"bold\">{}</text></g>",
            svg::num(self.plot.width / 2.0),
            svg::num(self.plot.height + 50.0),
            svg::escape(CAPTION),
            svg::num(self.plot.width / 2.0),
            svg::escape(&self.title)
        );
        out.push_str("</g></svg>");
        out
    }

    fn write_x_axis(&self, out: &mut String) {
        let _ = write!(
            out,
            "<g class=\"x-axis\" transform=\"translate(0,{})\" font-size=\"10\" \
             text-anchor=\"middle\">\
             <path stroke=\"currentColor\" fill=\"none\" d=\"M0,{}V0H{}V{}\"/>",
            svg::num(self.plot.height),
            TICK_SIZE,
            svg::num(self.plot.width),
            TICK_SIZE
        );
        for tick in &self.x_ticks {
            let _ = write!(
                out,
                "<g transform=\"translate({},0)\"><line stroke=\"currentColor\" y2=\"{}\"/>\
                 <text fill=\"currentColor\" y=\"{}\" dy=\"0.71em\">{}</text></g>",
                svg::num(tick.position),
                TICK_SIZE,
                TICK_SIZE + 3.0,
                tick.label
            );
        }
        out.push_str("</g>");
    }

    fn write_y_axis(&self, out: &mut String) {
        let _ = write!(
            out,
            "<g class=\"y-axis\" font-size=\"10\" text-anchor=\"end\">\
             <path stroke=\"currentColor\" fill=\"none\" d=\"M-{},{}H0V0H-{}\"/>",
            TICK_SIZE,
            svg::num(self.plot.height),
            TICK_SIZE
        );
        for tick in &self.y_ticks {
            let _ = write!(
                out,
                "<g transform=\"translate(0,{})\"><line stroke=\"currentColor\" x2=\"-{}\"/>\
                 <text fill=\"currentColor\" x=\"-{}\" dy=\"0.32em\">{}</text></g>",
                svg::num(tick.position),
                TICK_SIZE,
                TICK_SIZE + 3.0,
                tick.label
            );
        }
        out.push_str("</g>");
    }
}

fn write_growth(out: &mut String, attribute: &str, from: f64, to: f64, delay_ms: u64) {
    let [x1, y1, x2, y2] = scale::EXP_IN_OUT_SPLINE;
    let _ = write!(
        out,
        "<animate attributeName=\"{}\" from=\"{}\" to=\"{}\" begin=\"{}ms\" dur=\"{}ms\" \
         fill=\"freeze\" calcMode=\"spline\" keyTimes=\"0;1\" keySplines=\"{} {} {} {}\"/>",
        attribute,
        svg::num(from),
        svg::num(to),
        delay_ms,
        BAR_GROWTH_MS,
        x1,
        y1,
        x2,
        y2
    );
}
