//! Core constants derived from slippy-map conventions and the globe texture layout.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Edge length of the square compositing surface, in pixels.
pub const CANVAS_SIZE: u32 = 2048;

/// Default square tile size in pixels served by slippy-map tile sources.
pub const TILE_SIZE: u32 = 256;

/// Lowest tile zoom the compositor will request.
pub const MIN_ZOOM: u8 = 3;

/// Highest tile zoom the compositor will request.
pub const MAX_ZOOM: u8 = 19;

/// Latitude limit of the Web Mercator tile pyramid (degrees).
pub const MAX_TILE_LATITUDE: f64 = 85.051;

/// The viewport center is kept inside this latitude band (degrees).
pub const MAX_VIEW_LATITUDE: f64 = 85.0;

/// Simultaneous tile downloads.
pub const MAX_CONCURRENT_FETCHES: usize = 12;

/// Degrees of latitude covered by the surface per unit of globe altitude.
pub const ALTITUDE_TO_LAT_SPAN: f64 = 150.0;

/// Smallest latitude span the surface may cover (degrees).
pub const MIN_LAT_SPAN: f64 = 0.001;

/// Largest latitude span the surface may cover (degrees).
pub const MAX_LAT_SPAN: f64 = 60.0;

/// Extra ring of tiles requested around the viewport window.
pub const TILE_MARGIN: u32 = 1;

/// Altitude at or below which the globe should switch to the composited texture.
pub const TILE_THRESHOLD: f64 = 0.4;
