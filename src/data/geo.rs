use crate::errors::{Error, Result};

/// Fixed-point scale applied to degrees before storage.
pub const SCALE: i64 = 10_000_000;

/// A point in scaled integer degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub lat: i64,
    pub lon: i64,
}

impl Coord {
    pub fn new(lat: i64, lon: i64) -> Self {
        Coord { lat, lon }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Coord {
            lat: to_scaled(lat),
            lon: to_scaled(lon),
        }
    }

    pub fn lat_degrees(&self) -> f64 {
        self.lat as f64 / SCALE as f64
    }

    pub fn lon_degrees(&self) -> f64 {
        self.lon as f64 / SCALE as f64
    }

    pub fn in_world(&self) -> bool {
        (-90 * SCALE..=90 * SCALE).contains(&self.lat) && (-180 * SCALE..=180 * SCALE).contains(&self.lon)
    }
}

pub fn to_scaled(degrees: f64) -> i64 {
    (degrees * SCALE as f64).round() as i64
}

/// Parses a decimal degree string into its scaled value.
pub fn parse_scaled(value: &str) -> Result<i64> {
    let degrees: f64 = value.trim().parse()?;
    if !degrees.is_finite() {
        return Err(Error::bad_xml(format!("{} is not a number", value)));
    }
    Ok(to_scaled(degrees))
}

/// Renders a scaled value as plain decimal text with seven places, e.g. `0.0000400`.
pub fn format_scaled(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let scale = SCALE as u64;
    format!("{}{}.{:07}", sign, abs / scale, abs % scale)
}

/// Smallest rectangle covering a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_lon: i64,
    pub min_lat: i64,
    pub max_lon: i64,
    pub max_lat: i64,
}

impl BoundingBox {
    pub fn from_coord(coord: Coord) -> Self {
        BoundingBox {
            min_lon: coord.lon,
            min_lat: coord.lat,
            max_lon: coord.lon,
            max_lat: coord.lat,
        }
    }

    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let mut bbox = BoundingBox::from_coord(*iter.next()?);
        for coord in iter {
            bbox.expand(*coord);
        }
        Some(bbox)
    }

    pub fn expand(&mut self, coord: Coord) {
        self.min_lon = self.min_lon.min(coord.lon);
        self.min_lat = self.min_lat.min(coord.lat);
        self.max_lon = self.max_lon.max(coord.lon);
        self.max_lat = self.max_lat.max(coord.lat);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.min_lon
            && self.min_lat <= other.min_lat
            && self.max_lon >= other.max_lon
            && self.max_lat >= other.max_lat
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_format_scaled_is_plain_decimal() {
        assert_eq!(format_scaled(to_scaled(0.00004)), "0.0000400");
        assert_eq!(format_scaled(-515_000_000), "-51.5000000");
        assert_eq!(format_scaled(0), "0.0000000");
        assert_eq!(format_scaled(-1), "-0.0000001");
    }

    #[test]
    fn test_parse_scaled() {
        assert_eq!(parse_scaled("0.00008").unwrap(), 800);
        assert_eq!(parse_scaled("-180").unwrap(), -180 * SCALE);
        assert!(parse_scaled("north").is_err());
        assert!(parse_scaled("NaN").is_err());
    }

    #[test]
    fn test_in_world() {
        assert!(Coord::from_degrees(90.0, -180.0).in_world());
        assert!(!Coord::from_degrees(90.1, 0.0).in_world());
        assert!(!Coord::from_degrees(0.0, 180.5).in_world());
    }

    #[test]
    fn test_from_coords_empty() {
        assert_eq!(BoundingBox::from_coords(&[]), None);
    }

    proptest! {
        #[test]
        fn expand_never_shrinks(points in prop::collection::vec((-900i64..900, -1800i64..1800), 1..40)) {
            let coords: Vec<Coord> = points.iter().map(|(lat, lon)| Coord::new(*lat, *lon)).collect();
            let mut bbox = BoundingBox::from_coord(coords[0]);
            for coord in &coords[1..] {
                let before = bbox;
                bbox.expand(*coord);
                prop_assert!(bbox.contains(&before));
                prop_assert!(bbox.contains(&BoundingBox::from_coord(*coord)));
            }
            prop_assert_eq!(Some(bbox), BoundingBox::from_coords(&coords));
        }
    }
}
