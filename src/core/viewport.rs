//! Viewport window: the lat/lng rectangle currently painted onto the surface
//!
//! The globe reports a center point and an altitude. From those the window derives
//! a span in degrees (twice as wide as tall, so the square surface keeps the 2:1
//! aspect of equirectangular degrees), snaps the center so the texture offset the
//! renderer computes is exact in its float precision, and maps degrees to surface
//! pixels for both the base underlay and Mercator tiles.

use serde::{Deserialize, Serialize};

use crate::core::config::CompositorConfig;
use crate::core::geo::{tile_x_to_lng, tile_y_to_lat, LatLng};
use crate::rendering::surface::{PixelRect, SourceRect};

/// Float precision the consuming renderer uses for texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TexturePrecision {
    /// 32-bit texture math (WebGL, most GPU pipelines); the center is snapped
    #[default]
    Single,
    /// 64-bit texture math; no snapping needed
    Double,
}

impl TexturePrecision {
    /// Nearest value representable in this precision
    pub fn round(self, value: f64) -> f64 {
        match self {
            Self::Single => value as f32 as f64,
            Self::Double => value,
        }
    }

    /// Correction (in degrees) to add to a requested center so that the texture
    /// offset derived from it survives rounding to this precision unchanged.
    pub fn snap_correction(
        self,
        center_lat: f64,
        center_lng: f64,
        lat_span: f64,
        lng_span: f64,
    ) -> LatLng {
        let ideal_x = -((center_lng + 180.0) / 360.0) * (360.0 / lng_span) + 0.5;
        let ideal_y = -((center_lat + 90.0) / 180.0) * (180.0 / lat_span) + 0.5;
        LatLng::new(
            (ideal_y - self.round(ideal_y)) * lat_span,
            (ideal_x - self.round(ideal_x)) * lng_span,
        )
    }
}

/// Normalized equirectangular texture rectangle covered by the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvBounds {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl UvBounds {
    pub fn width(&self) -> f64 {
        self.u_max - self.u_min
    }

    pub fn height(&self) -> f64 {
        self.v_max - self.v_min
    }

    /// Repeat/offset pair that maps the surface back onto a whole-world UV layout
    pub fn texture_transform(&self) -> TextureTransform {
        let repeat_u = 1.0 / self.width();
        let repeat_v = 1.0 / self.height();
        TextureTransform {
            repeat: (repeat_u, repeat_v),
            offset: (-self.u_min * repeat_u, -self.v_min * repeat_v),
        }
    }
}

/// Texture matrix parameters in the form 3D engines expose them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureTransform {
    pub repeat: (f64, f64),
    pub offset: (f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewWindow {
    pub view_lat: f64,
    pub view_lng: f64,
    pub lat_span: f64,
    pub lng_span: f64,
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self {
            view_lat: 0.0,
            view_lng: 0.0,
            lat_span: 30.0,
            lng_span: 60.0,
        }
    }
}

impl ViewWindow {
    /// Derive the window for a globe looking at `(center_lat, center_lng)` from `altitude`
    pub fn from_viewport(
        center_lat: f64,
        center_lng: f64,
        altitude: f64,
        config: &CompositorConfig,
    ) -> Self {
        let lat_span = (altitude * config.altitude_scale)
            .clamp(config.min_lat_span, config.max_lat_span);
        let lng_span = lat_span * 2.0;
        // Snap against the canonical longitude
        let center_lng = LatLng::wrap_lng(center_lng);

        let snap = config
            .precision
            .snap_correction(center_lat, center_lng, lat_span, lng_span);

        Self {
            view_lat: (center_lat + snap.lat).clamp(-config.max_view_lat, config.max_view_lat),
            view_lng: center_lng + snap.lng,
            lat_span,
            lng_span,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.view_lat, self.view_lng)
    }

    pub fn west(&self) -> f64 {
        self.view_lng - self.lng_span / 2.0
    }

    pub fn east(&self) -> f64 {
        self.view_lng + self.lng_span / 2.0
    }

    pub fn north(&self) -> f64 {
        self.view_lat + self.lat_span / 2.0
    }

    pub fn south(&self) -> f64 {
        self.view_lat - self.lat_span / 2.0
    }

    /// Tile zoom whose native resolution best matches the surface resolution
    pub fn tile_zoom(&self, config: &CompositorConfig) -> u8 {
        let ratio =
            360.0 * config.canvas_size as f64 / (config.tile_size as f64 * self.lng_span);
        let zoom = ratio.log2().round();
        zoom.clamp(config.min_zoom as f64, config.max_zoom as f64) as u8
    }

    pub fn uv_bounds(&self) -> UvBounds {
        UvBounds {
            u_min: (self.west() + 180.0) / 360.0,
            u_max: (self.east() + 180.0) / 360.0,
            v_min: (self.south() + 90.0) / 180.0,
            v_max: (self.north() + 90.0) / 180.0,
        }
    }

    /// Surface pixels per degree of longitude and latitude
    pub fn pixels_per_degree(&self, canvas_size: u32) -> (f64, f64) {
        (
            canvas_size as f64 / self.lng_span,
            canvas_size as f64 / self.lat_span,
        )
    }

    /// Surface rectangle covered by tile `(column, row)` at `zoom`. `column` is the
    /// unwrapped tile column, so tiles across the antimeridian land on the right side.
    pub fn tile_rect(&self, column: i64, row: i64, zoom: u8, canvas_size: u32) -> PixelRect {
        let (px_lng, px_lat) = self.pixels_per_degree(canvas_size);
        let west = self.west();
        let north = self.north();

        let x = ((tile_x_to_lng(column, zoom) - west) * px_lng).floor();
        let y = ((north - tile_y_to_lat(row, zoom)) * px_lat).floor();
        let x2 = ((tile_x_to_lng(column + 1, zoom) - west) * px_lng).ceil();
        let y2 = ((north - tile_y_to_lat(row + 1, zoom)) * px_lat).ceil();

        PixelRect {
            x: x as i64,
            y: y as i64,
            width: (x2 - x).max(0.0) as u32,
            height: (y2 - y).max(0.0) as u32,
        }
    }

    /// Region of a `width` x `height` equirectangular world image under the window
    pub fn base_source_rect(&self, width: u32, height: u32) -> SourceRect {
        let width = width as f64;
        let height = height as f64;
        SourceRect {
            x: (self.west() + 180.0) / 360.0 * width,
            y: (90.0 - self.north()) / 180.0 * height,
            width: self.lng_span / 360.0 * width,
            height: self.lat_span / 180.0 * height,
        }
    }
}
