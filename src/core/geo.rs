use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::core::constants::MAX_TILE_LATITUDE;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Wraps longitude into [-180, 180)
    pub fn wrap_lng(lng: f64) -> f64 {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }

    /// Clamps latitude to the range covered by Mercator tiles
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_TILE_LATITUDE, MAX_TILE_LATITUDE)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Creates a tile coordinate from a LatLng and zoom level
    pub fn from_lat_lng(lat_lng: &LatLng, zoom: u8) -> Self {
        let x = wrap_tile_x(lng_to_tile_x(lat_lng.lng, zoom), zoom);
        let y = lat_to_tile_y(lat_lng.lat, zoom).clamp(0, max_tile_index(zoom) as i64);
        Self::new(x, y as u32, zoom)
    }

    /// Checks if the tile is valid for the given zoom level
    pub fn is_valid(&self) -> bool {
        let count = tiles_per_axis(self.z);
        (self.x as u64) < count && (self.y as u64) < count
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom` (`2^zoom`).
pub fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Largest valid tile index at `zoom`.
pub fn max_tile_index(zoom: u8) -> u64 {
    tiles_per_axis(zoom) - 1
}

/// Unwrapped tile column containing `lng`. Longitudes outside [-180, 180)
/// produce columns outside [0, 2^zoom); use [`wrap_tile_x`] to address a tile.
pub fn lng_to_tile_x(lng: f64, zoom: u8) -> i64 {
    ((lng + 180.0) / 360.0 * tiles_per_axis(zoom) as f64).floor() as i64
}

/// Tile row containing `lat`. The latitude is clamped to the Mercator limit first,
/// so the result only leaves [0, 2^zoom) by rounding at the poles.
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> i64 {
    let lat_rad = LatLng::clamp_lat(lat).to_radians();
    let merc = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln();
    ((1.0 - merc / PI) / 2.0 * tiles_per_axis(zoom) as f64).floor() as i64
}

/// Longitude of the west edge of tile column `x`.
pub fn tile_x_to_lng(x: i64, zoom: u8) -> f64 {
    x as f64 / tiles_per_axis(zoom) as f64 * 360.0 - 180.0
}

/// Latitude of the north edge of tile row `y`.
pub fn tile_y_to_lat(y: i64, zoom: u8) -> f64 {
    let n = PI - 2.0 * PI * y as f64 / tiles_per_axis(zoom) as f64;
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

/// Wraps an unwrapped tile column into [0, 2^zoom).
pub fn wrap_tile_x(x: i64, zoom: u8) -> u32 {
    x.rem_euclid(tiles_per_axis(zoom) as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_coord_display() {
        let coord = TileCoord::new(4, 7, 5);
        assert_eq!(coord.to_string(), "5/4/7");
        assert!(coord.is_valid());
        assert!(!TileCoord::new(32, 0, 5).is_valid());
    }

    #[test]
    fn test_tile_coord_conversion() {
        let lat_lng = LatLng::new(40.7128, -74.0060);
        let tile = TileCoord::from_lat_lng(&lat_lng, 10);
        assert_eq!(tile, TileCoord::new(301, 385, 10));

        let (x, y) = (tile.x as i64, tile.y as i64);
        assert!(tile_x_to_lng(x, 10) <= lat_lng.lng && lat_lng.lng < tile_x_to_lng(x + 1, 10));
        assert!(tile_y_to_lat(y + 1, 10) < lat_lng.lat && lat_lng.lat <= tile_y_to_lat(y, 10));
    }

    #[test]
    fn test_world_corners() {
        assert_eq!(lng_to_tile_x(-180.0, 4), 0);
        assert_eq!(lng_to_tile_x(179.999, 4), 15);
        assert_eq!(lat_to_tile_y(90.0, 4), 0);
        assert_eq!(lat_to_tile_y(-90.0, 4), 15);
        assert_eq!(tile_x_to_lng(0, 4), -180.0);
        assert_eq!(tile_x_to_lng(16, 4), 180.0);
        assert!((tile_y_to_lat(0, 4) - 85.0511).abs() < 1e-3);
        assert!((tile_y_to_lat(8, 4)).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_inverse_round_trips_tile_edges() {
        for zoom in [3u8, 8, 13] {
            for y in [1i64, 3, 5] {
                let lat = tile_y_to_lat(y, zoom) - 1e-9;
                assert_eq!(lat_to_tile_y(lat, zoom), y);
            }
        }
    }

    #[test]
    fn test_wrap_tile_x() {
        assert_eq!(wrap_tile_x(-1, 3), 7);
        assert_eq!(wrap_tile_x(8, 3), 0);
        assert_eq!(wrap_tile_x(17, 3), 1);
        assert_eq!(wrap_tile_x(lng_to_tile_x(190.0, 3), 3), lng_to_tile_x(-170.0, 3) as u32);
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(190.0), -170.0);
        assert_eq!(LatLng::wrap_lng(-190.0), 170.0);
        assert_eq!(LatLng::wrap_lng(45.0), 45.0);
        assert_eq!(LatLng::wrap_lng(180.0), -180.0);
        assert_eq!(LatLng::wrap_lng(-180.0), -180.0);
        assert!((LatLng::wrap_lng(36000.0 - 0.12) + 0.12).abs() < 1e-9);

        let huge = LatLng::wrap_lng(1e18);
        assert!((-180.0..180.0).contains(&huge));
    }
}
