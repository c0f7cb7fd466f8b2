use error_stack::Report;
use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub const MIN_BOUNDARY_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Polygon of at least three (lat, lon) vertices outlining the parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    points: Vec<LatLon>,
}

impl Boundary {
    pub fn new(points: Vec<LatLon>) -> Result<Self> {
        if points.len() < MIN_BOUNDARY_POINTS {
            return Err(Report::new(AnalysisError::InvalidBoundary)
                .attach_printable(format!("got {} points", points.len())));
        }
        Ok(Self { points })
    }

    /// Builds a boundary from `[lat, lon]` pairs as they arrive over the wire.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|&[lat, lon]| LatLon { lat, lon })
                .collect(),
        )
    }

    pub fn points(&self) -> &[LatLon] {
        &self.points
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let init = BoundingBox {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        self.points.iter().fold(init, |bbox, p| BoundingBox {
            min_lat: bbox.min_lat.min(p.lat),
            max_lat: bbox.max_lat.max(p.lat),
            min_lon: bbox.min_lon.min(p.lon),
            max_lon: bbox.max_lon.max(p.lon),
        })
    }

    /// Arithmetic mean of the vertices, clamped to valid WGS84 ranges.
    pub fn centroid(&self) -> LatLon {
        let n = self.points.len() as f64;
        let (sum_lat, sum_lon) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));

        LatLon {
            lat: (sum_lat / n).clamp(-90.0, 90.0),
            lon: (sum_lon / n).clamp(-180.0, 180.0),
        }
    }

    /// Closed polygon feature in GeoJSON (lon, lat) axis order.
    pub fn to_geojson_feature(&self, name: &str) -> Feature {
        let mut ring: Vec<Vec<f64>> = self.points.iter().map(|p| vec![p.lon, p.lat]).collect();
        if self.points.first() != self.points.last() {
            ring.push(vec![self.points[0].lon, self.points[0].lat]);
        }

        let mut properties = JsonObject::new();
        properties.insert("name".to_string(), serde_json::Value::from(name));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    pub fn to_geojson(&self, name: &str) -> String {
        GeoJson::Feature(self.to_geojson_feature(name)).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(pairs: &[[f64; 2]]) -> Boundary {
        Boundary::from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_bounding_box() {
        let bbox = boundary(&[[10.0, 20.0], [10.0, 22.0], [12.0, 21.0]]).bounding_box();
        assert_eq!(bbox.min_lat, 10.0);
        assert_eq!(bbox.max_lat, 12.0);
        assert_eq!(bbox.min_lon, 20.0);
        assert_eq!(bbox.max_lon, 22.0);
    }

    #[test]
    fn test_centroid_is_mean() {
        let c = boundary(&[[0.0, 0.0], [3.0, 0.0], [0.0, 6.0]]).centroid();
        assert!((c.lat - 1.0).abs() < 1e-12);
        assert!((c.lon - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_clamped() {
        let c = boundary(&[[95.0, 190.0], [100.0, 200.0], [91.0, 181.0]]).centroid();
        assert_eq!(c.lat, 90.0);
        assert_eq!(c.lon, 180.0);

        let c = boundary(&[[-95.0, -190.0], [-100.0, -200.0], [-91.0, -181.0]]).centroid();
        assert_eq!(c.lat, -90.0);
        assert_eq!(c.lon, -180.0);
    }

    #[test]
    fn test_too_few_points() {
        let err = Boundary::from_pairs(&[[10.0, 20.0], [11.0, 21.0]]).unwrap_err();
        assert!(matches!(err.current_context(), AnalysisError::InvalidBoundary));
        assert!(Boundary::from_pairs(&[]).is_err());
    }

    #[test]
    fn test_geojson_ring_is_closed_lon_lat() {
        let feature = boundary(&[[10.0, 20.0], [10.0, 22.0], [12.0, 21.0]]).to_geojson_feature("plot");
        match feature.geometry.unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 4);
                assert_eq!(rings[0][0], vec![20.0, 10.0]);
                assert_eq!(rings[0][3], rings[0][0]);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        assert_eq!(feature.properties.unwrap()["name"], "plot");
    }
}
