use crate::layout::Canvas;
use crate::legend::{self, Legend};
use crate::projection::{self, Mercator};
use crate::scale::{Interpolator, Rgb, SequentialScale};
use crate::svg;
use crate::types::Neighborhood;
use anyhow::{Result, anyhow, ensure};
use geo::MultiPolygon;
use rayon::prelude::*;
use std::fmt::Write;
use tracing::info;

/// Room left above the map for the legend.
pub const LEGEND_INSET: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Shape {
    pub id: usize,
    /// Geometry in map canvas coordinates.
    pub projected: MultiPolygon<f64>,
    pub path: String,
    pub base_fill: Rgb,
}

impl Shape {
    pub fn element_id(id: usize) -> String {
        format!("shape-{}", id)
    }
}

/// Everything drawn on the map canvas. Built once after loading and never
/// mutated; interaction state lives in [`crate::ui::Interaction`].
#[derive(Debug, Clone)]
pub struct ChoroplethMap {
    pub canvas: Canvas,
    pub projection: Mercator,
    pub price_range: (f64, f64),
    pub color: SequentialScale,
    pub legend: Legend,
    pub shapes: Vec<Shape>,
}

pub fn price_range(neighborhoods: &[Neighborhood]) -> Option<(f64, f64)> {
    neighborhoods.iter().map(|n| n.avg_price).fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
    })
}

impl ChoroplethMap {
    pub fn build(neighborhoods: &[Neighborhood], canvas: Canvas, price_step: f64) -> Result<Self> {
        let price_range =
            price_range(neighborhoods).ok_or_else(|| anyhow!("no neighborhoods to draw"))?;
        let buckets = legend::bucket_count(price_range.0, price_range.1, price_step);
        ensure!(
            buckets <= legend::MAX_BUCKETS as f64,
            "prices {}..{} need {} legend buckets of {}, more than {}; raise legend.price_step",
            price_range.0,
            price_range.1,
            buckets,
            price_step,
            legend::MAX_BUCKETS
        );

        let projection = Mercator::fit_extent(
            [[0.0, LEGEND_INSET], [canvas.width, canvas.height]],
            neighborhoods.iter().map(|n| &n.geometry),
        )?;

        let color = SequentialScale::new(price_range, Interpolator::Rgb(Rgb::GREEN, Rgb::RED));
        let legend = Legend::build(&color, canvas.width, price_step);

        let shapes: Vec<Shape> = neighborhoods
            .par_iter()
            .map(|n| {
                let projected = projection.project_geometry(&n.geometry);
                Shape {
                    id: n.id,
                    path: projection::svg_path(&projected),
                    projected,
                    base_fill: color.apply(n.avg_price),
                }
            })
            .collect();

        info!(
            "Projected {} shapes, prices {}..{}, {} legend buckets",
            shapes.len(),
            price_range.0,
            price_range.1,
            legend.swatches.len()
        );

        Ok(Self { canvas, projection, price_range, color, legend, shapes })
    }

    pub fn shape(&self, id: usize) -> Option<&Shape> {
        self.shapes.get(id).filter(|s| s.id == id)
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"map\" width=\"{}\" height=\"{}\"><g>",
            svg::num(self.canvas.width),
            svg::num(self.canvas.height)
        );
        out.push_str(&self.legend.to_svg());
        for shape in &self.shapes {
            let _ = write!(
                out,
                "<path id=\"{}\" data-id=\"{}\" d=\"{}\" fill=\"{}\" opacity=\"1\"/>",
                Shape::element_id(shape.id),
                shape.id,
                shape.path,
                shape.base_fill
            );
        }
        out.push_str("</g></svg>");
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::BedroomCount;
    use geo::polygon;

    pub(crate) fn neighborhood(id: usize, name: &str, price: f64, lon: f64) -> Neighborhood {
        Neighborhood {
            id,
            name: name.to_string(),
            avg_price: price,
            bedrooms: vec![
                BedroomCount { bedrooms: Some(1.0), total: 5.0 },
                BedroomCount { bedrooms: None, total: 3.0 },
                BedroomCount { bedrooms: Some(2.0), total: 8.0 },
            ],
            geometry: MultiPolygon::new(vec![polygon![
                (x: lon, y: 40.40),
                (x: lon + 0.01, y: 40.40),
                (x: lon + 0.01, y: 40.41),
                (x: lon, y: 40.41),
                (x: lon, y: 40.40),
            ]]),
        }
    }

    fn canvas() -> Canvas {
        Canvas { width: 800.0, height: 600.0 }
    }

    pub(crate) fn sample() -> Vec<Neighborhood> {
        vec![
            neighborhood(0, "Sol", 100.0, -3.71),
            neighborhood(1, "Lavapiés", 40.0, -3.70),
            neighborhood(2, "Chamberí", 70.0, -3.69),
        ]
    }

    #[test]
    fn price_range_spans_all_features() {
        assert_eq!(price_range(&sample()), Some((40.0, 100.0)));
        assert_eq!(price_range(&[]), None);
    }

    #[test]
    fn fills_follow_price() {
        let map = ChoroplethMap::build(&sample(), canvas(), 15.0).unwrap();
        assert_eq!(map.shapes[0].base_fill, Rgb::RED);
        assert_eq!(map.shapes[1].base_fill, Rgb::GREEN);
        assert_eq!(map.legend.swatches.len(), 4);
        assert_eq!(map.shape(2).map(|s| s.id), Some(2));
        assert!(map.shape(3).is_none());
    }

    #[test]
    fn svg_has_one_path_per_feature() {
        let map = ChoroplethMap::build(&sample(), canvas(), 15.0).unwrap();
        let doc = map.to_svg();
        assert_eq!(doc.matches("<path ").count(), 3);
        assert!(doc.contains("id=\"shape-1\""));
        assert!(doc.contains("fill=\"rgb(0, 128, 0)\""));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(ChoroplethMap::build(&[], canvas(), 15.0).is_err());
    }

    #[test]
    fn outlier_price_is_rejected_instead_of_bucketed() {
        let mut input = sample();
        input.push(neighborhood(3, "Outlier", 1e12, -3.68));
        let err = ChoroplethMap::build(&input, canvas(), 15.0).unwrap_err();
        assert!(err.to_string().contains("legend buckets"));

        // A coarser step brings it back under the limit.
        assert!(ChoroplethMap::build(&input, canvas(), 1e10).is_ok());
    }
}
