use anyhow::{Result, bail};
use geo::{Coord, CoordsIter, LineString, MapCoords, MultiPolygon};
use std::f64::consts::FRAC_PI_4;
use std::fmt::Write;

use crate::svg;

const MAX_LATITUDE: f64 = 85.05112878;

/// Spherical Mercator with y growing downwards, scaled and translated into
/// canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: (f64, f64),
}

fn raw(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (lon.to_radians(), -(FRAC_PI_4 + lat / 2.0).tan().ln())
}

impl Mercator {
    /// Fit every geometry into `[[x0, y0], [x1, y1]]`, preserving aspect
    /// ratio and centering the slack.
    pub fn fit_extent<'a>(
        extent: [[f64; 2]; 2],
        geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
    ) -> Result<Self> {
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for geometry in geometries {
            for c in geometry.coords_iter() {
                let (x, y) = raw(c.x, c.y);
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
        if !min_x.is_finite() || !max_x.is_finite() {
            bail!("cannot fit a projection to geometries without coordinates");
        }

        let [[x0, y0], [x1, y1]] = extent;
        let (w, h) = (x1 - x0, y1 - y0);
        let (dx, dy) = (max_x - min_x, max_y - min_y);
        if dx == 0.0 && dy == 0.0 {
            bail!("cannot fit a projection to a single point");
        }
        let scale = (w / dx).min(h / dy);
        let translate = (
            x0 + (w - scale * (max_x + min_x)) / 2.0,
            y0 + (h - scale * (max_y + min_y)) / 2.0,
        );
        Ok(Self { scale, translate })
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = raw(lon, lat);
        (self.translate.0 + self.scale * x, self.translate.1 + self.scale * y)
    }

    pub fn project_geometry(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c| {
            let (x, y) = self.project(c.x, c.y);
            Coord { x, y }
        })
    }
}

/// SVG path data for an already projected geometry, one closed subpath per
/// ring.
pub fn svg_path(projected: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in projected {
        push_ring(&mut d, polygon.exterior());
        for interior in polygon.interiors() {
            push_ring(&mut d, interior);
        }
    }
    d
}

fn push_ring(d: &mut String, ring: &LineString<f64>) {
    let mut coords: &[Coord<f64>] = &ring.0;
    if coords.len() > 1 && coords.first() == coords.last() {
        coords = &coords[..coords.len() - 1];
    }
    for (i, c) in coords.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{}{},{}", cmd, svg::num(c.x), svg::num(c.y));
    }
    if !coords.is_empty() {
        d.push('Z');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BoundingRect, polygon};

    fn square(lon: f64, lat: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: lon, y: lat),
            (x: lon + size, y: lat),
            (x: lon + size, y: lat + size),
            (x: lon, y: lat + size),
            (x: lon, y: lat),
        ]])
    }

    #[test]
    fn fitted_shapes_stay_inside_extent() {
        let shapes = vec![square(-3.72, 40.40, 0.02), square(-3.68, 40.43, 0.03)];
        let projection = Mercator::fit_extent([[0.0, 50.0], [800.0, 600.0]], &shapes).unwrap();

        let projected: Vec<_> = shapes.iter().map(|s| projection.project_geometry(s)).collect();
        let bounds = MultiPolygon::new(projected.into_iter().flat_map(|mp| mp.0).collect())
            .bounding_rect()
            .unwrap();
        let eps = 1e-6;
        assert!(bounds.min().x >= -eps && bounds.min().y >= 50.0 - eps);
        assert!(bounds.max().x <= 800.0 + eps && bounds.max().y <= 600.0 + eps);
        // One axis is filled completely.
        let filled_x = (bounds.width() - 800.0).abs() < 1e-6;
        let filled_y = (bounds.height() - 550.0).abs() < 1e-6;
        assert!(filled_x || filled_y);
    }

    #[test]
    fn north_is_up() {
        let shapes = vec![square(-3.7, 40.4, 0.1)];
        let projection = Mercator::fit_extent([[0.0, 50.0], [500.0, 500.0]], &shapes).unwrap();
        let (_, south) = projection.project(-3.65, 40.4);
        let (_, north) = projection.project(-3.65, 40.5);
        assert!(north < south);
    }

    #[test]
    fn single_point_cannot_be_fitted() {
        let point = MultiPolygon::new(vec![polygon![(x: 1.0, y: 1.0), (x: 1.0, y: 1.0)]]);
        assert!(Mercator::fit_extent([[0.0, 0.0], [10.0, 10.0]], [&point]).is_err());
    }

    #[test]
    fn path_closes_each_ring() {
        let d = svg_path(&square(0.0, 0.0, 1.5));
        assert_eq!(d, "M0,0L1.5,0L1.5,1.5L0,1.5Z");
    }
}
