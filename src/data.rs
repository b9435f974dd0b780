use crate::config::AppConfig;
use crate::types::{BedroomCount, Neighborhood};
use anyhow::{Context, Result, anyhow, bail};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson};
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, info};

pub fn load_data(config: &AppConfig) -> Result<Vec<Neighborhood>> {
    info!("Loading neighborhoods from {:?}...", config.input.data);
    let file = File::open(&config.input.data)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", config.input.data))?;
    let reader = BufReader::new(file);

    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;
    let neighborhoods = parse_neighborhoods(geojson)?;

    info!("Loaded {} neighborhoods", neighborhoods.len());
    Ok(neighborhoods)
}

pub fn parse_neighborhoods(geojson: GeoJson) -> Result<Vec<Neighborhood>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    if collection.features.is_empty() {
        bail!("FeatureCollection has no features");
    }

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(id, feature)| {
            parse_feature(id, feature).with_context(|| format!("Invalid feature #{}", id))
        })
        .collect()
}

fn parse_feature(id: usize, feature: Feature) -> Result<Neighborhood> {
    let name = match feature.property("name") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => bail!("`name` must be a string, got {}", other),
        None => bail!("missing `name` property"),
    };

    let avg_price = feature
        .property("avgprice")
        .ok_or_else(|| anyhow!("missing `avgprice` property"))?
        .as_f64()
        .filter(|p| p.is_finite())
        .ok_or_else(|| anyhow!("`avgprice` must be a finite number"))?;

    let bedrooms = match feature.property("avgbedrooms") {
        Some(serde_json::Value::Null) | None => {
            debug!("{} has no avgbedrooms, its chart will be empty", name);
            Vec::new()
        }
        Some(value) => serde_json::from_value::<Vec<BedroomCount>>(value.clone())
            .context("`avgbedrooms` must be a list of {bedrooms, total} records")?,
    };

    let geometry = match feature.geometry {
        Some(geo) => {
            let valid_geo: geo::Geometry<f64> = geo
                .value
                .try_into()
                .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;

            match valid_geo {
                geo::Geometry::MultiPolygon(mp) => mp,
                geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                _ => bail!("geometry of {} is not a Polygon or MultiPolygon", name),
            }
        }
        None => bail!("{} has no geometry", name),
    };

    Ok(Neighborhood {
        id,
        name,
        avg_price,
        bedrooms,
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(features: &str) -> GeoJson {
        format!(r#"{{"type":"FeatureCollection","features":[{features}]}}"#)
            .parse()
            .unwrap()
    }

    const SQUARE: &str =
        r#"{"type":"Polygon","coordinates":[[[-3.70,40.41],[-3.69,40.41],[-3.69,40.42],[-3.70,40.42],[-3.70,40.41]]]}"#;

    #[test]
    fn keeps_unlabelled_bedroom_records_until_charting() {
        let gj = collection(&format!(
            r#"{{"type":"Feature","geometry":{SQUARE},"properties":{{
                "name":"Sol","avgprice":87.5,
                "avgbedrooms":[{{"bedrooms":1,"total":5}},{{"total":3}},{{"bedrooms":null,"total":2}}]
            }}}}"#
        ));
        let areas = parse_neighborhoods(gj).unwrap();
        assert_eq!(areas.len(), 1);
        let sol = &areas[0];
        assert_eq!(sol.id, 0);
        assert_eq!(sol.name, "Sol");
        assert_eq!(sol.avg_price, 87.5);
        assert_eq!(
            sol.bedrooms,
            vec![
                BedroomCount { bedrooms: Some(1.0), total: 5.0 },
                BedroomCount { bedrooms: None, total: 3.0 },
                BedroomCount { bedrooms: None, total: 2.0 },
            ]
        );
        assert_eq!(sol.geometry.0.len(), 1);
    }

    #[test]
    fn missing_avgbedrooms_means_no_bars() {
        let gj = collection(&format!(
            r#"{{"type":"Feature","geometry":{SQUARE},"properties":{{"name":"Sol","avgprice":60}}}}"#
        ));
        let areas = parse_neighborhoods(gj).unwrap();
        assert!(areas[0].bedrooms.is_empty());
    }

    #[test]
    fn rejects_empty_collection() {
        let err = parse_neighborhoods(collection("")).unwrap_err();
        assert!(err.to_string().contains("no features"));
    }

    #[test]
    fn rejects_missing_price() {
        let gj = collection(&format!(
            r#"{{"type":"Feature","geometry":{SQUARE},"properties":{{"name":"Sol"}}}}"#
        ));
        let err = parse_neighborhoods(gj).unwrap_err();
        assert!(format!("{:#}", err).contains("avgprice"));
    }

    #[test]
    fn rejects_point_geometry() {
        let gj = collection(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[-3.7,40.4]},"properties":{"name":"Sol","avgprice":60}}"#,
        );
        let err = parse_neighborhoods(gj).unwrap_err();
        assert!(format!("{:#}", err).contains("not a Polygon"));
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_neighborhoods(SQUARE.parse().unwrap()).unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
    }
}
