//! Location models: coordinates, bounding boxes and geocoded places

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A point on the map in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Latitude in decimal degrees
    pub latitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Build from a `[lon, lat]` pair as used by GeoJSON and Mapbox
    #[must_use]
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    /// `[lon, lat]` pair as used by GeoJSON and Mapbox
    #[must_use]
    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Whether both components are finite and within WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Axis-aligned bounding box, south-west and north-east corners
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    /// Smallest box containing all points, `None` for an empty iterator
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinates>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            south_west: *first,
            north_east: *first,
        };
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: &Coordinates) {
        self.south_west.longitude = self.south_west.longitude.min(point.longitude);
        self.south_west.latitude = self.south_west.latitude.min(point.latitude);
        self.north_east.longitude = self.north_east.longitude.max(point.longitude);
        self.north_east.latitude = self.north_east.latitude.max(point.latitude);
    }

    #[must_use]
    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
        )
    }
}

/// Where a geocoded coordinate came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeocodeSource {
    /// Built-in city table
    Table,
    /// Earlier remote lookup held in memory
    Cache,
    /// Remote geocoding API
    Remote,
    /// Substring match against the built-in table
    Fuzzy,
    /// Coordinates supplied with the extraction itself
    Provided,
}

/// A place name resolved to coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedLocation {
    /// Name as requested
    pub name: String,
    pub coordinates: Coordinates,
    /// Full place name reported by the resolver, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    pub source: GeocodeSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_paris_london() {
        let paris = Coordinates::new(2.3522, 48.8566);
        let london = Coordinates::new(-0.1276, 51.5072);
        let km = paris.distance_km(&london);
        assert!((km - 344.0).abs() < 5.0, "got {km}");
    }

    #[test]
    fn test_validity() {
        assert!(Coordinates::new(2.35, 48.85).is_valid());
        assert!(!Coordinates::new(200.0, 48.85).is_valid());
        assert!(!Coordinates::new(2.35, f64::NAN).is_valid());
    }

    #[test]
    fn test_bounds_from_points() {
        let points = [
            Coordinates::new(2.0, 48.0),
            Coordinates::new(-1.0, 52.0),
            Coordinates::new(4.0, 50.0),
        ];
        let bounds = Bounds::from_points(&points).unwrap();
        assert_eq!(bounds.south_west, Coordinates::new(-1.0, 48.0));
        assert_eq!(bounds.north_east, Coordinates::new(4.0, 52.0));
        assert_eq!(bounds.center(), Coordinates::new(1.5, 50.0));
        assert!(Bounds::from_points(&Vec::<Coordinates>::new()).is_none());
    }
}
