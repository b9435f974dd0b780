use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Neighborhood {
    /// Position of the feature in the input collection.
    pub id: usize,
    pub name: String,
    pub avg_price: f64,
    pub bedrooms: Vec<BedroomCount>,
    pub geometry: MultiPolygon<f64>,
}

/// One `avgbedrooms` record. `bedrooms` is absent or null for listings
/// without a bedroom count; those never reach the chart.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BedroomCount {
    #[serde(default)]
    pub bedrooms: Option<f64>,
    pub total: f64,
}

/// What the tooltip and the hit-test API report about a neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborhoodSummary {
    pub id: usize,
    pub name: String,
    pub avgprice: f64,
}

impl From<&Neighborhood> for NeighborhoodSummary {
    fn from(n: &Neighborhood) -> Self {
        Self {
            id: n.id,
            name: n.name.clone(),
            avgprice: n.avg_price,
        }
    }
}
