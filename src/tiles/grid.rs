use crate::core::geo::{lat_to_tile_y, lng_to_tile_x, tiles_per_axis, wrap_tile_x, TileCoord};
use crate::core::viewport::ViewWindow;
use crate::prelude::{HashMap, HashSet};

/// A tile covering part of the viewport window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleTile {
    /// Address with the column wrapped into `[0, 2^z)`
    pub coord: TileCoord,
    /// Unwrapped column, used to place the tile relative to the window
    pub column: i64,
    /// L1 distance in tiles from the tile under the view center
    pub distance: u32,
}

/// Tile column and row under the center of `window` at `zoom` (column unwrapped)
pub fn center_tile(window: &ViewWindow, zoom: u8) -> (i64, i64) {
    (
        lng_to_tile_x(window.view_lng, zoom),
        lat_to_tile_y(window.view_lat, zoom),
    )
}

/// Tiles covering `window` at `zoom`, grown by `margin` tiles on each side and
/// sorted nearest to the center first.
///
/// Rows beyond the Mercator limit are skipped. Columns wrap around the world; when
/// two unwrapped columns map to the same address, only the nearer one is kept.
pub fn visible_tiles(window: &ViewWindow, zoom: u8, margin: u32) -> Vec<VisibleTile> {
    let margin = margin as i64;
    let count = tiles_per_axis(zoom) as i64;

    let left = lng_to_tile_x(window.west(), zoom).saturating_sub(margin);
    // One lap around the world covers every address
    let right = lng_to_tile_x(window.east(), zoom)
        .saturating_add(margin)
        .min(left.saturating_add(count - 1));
    let top = lat_to_tile_y(window.north(), zoom).saturating_sub(margin).max(0);
    let bottom = lat_to_tile_y(window.south(), zoom)
        .saturating_add(margin)
        .min(count - 1);

    let (center_column, center_row) = center_tile(window, zoom);

    let mut tiles: Vec<VisibleTile> = Vec::new();
    for column in left..=right {
        for row in top..=bottom {
            let distance = column
                .abs_diff(center_column)
                .saturating_add(row.abs_diff(center_row));
            tiles.push(VisibleTile {
                coord: TileCoord::new(wrap_tile_x(column, zoom), row as u32, zoom),
                column,
                distance: distance.min(u32::MAX as u64) as u32,
            });
        }
    }

    // Stable, so equal distances stay in column-major order
    tiles.sort_by_key(|tile| tile.distance);

    let mut seen = HashSet::default();
    tiles.retain(|tile| seen.insert(tile.coord));
    tiles
}

/// Queue priorities keyed by address, as consumed by the fetch scheduler
pub fn distance_map(tiles: &[VisibleTile]) -> HashMap<TileCoord, u32> {
    tiles.iter().map(|tile| (tile.coord, tile.distance)).collect()
}

/// Unwrapped column for wrapped column `x` that lies nearest to `center_column`.
/// Ties go west, matching the instance [`visible_tiles`] keeps.
pub fn unwrap_column(x: u32, center_column: i64, zoom: u8) -> i64 {
    let count = tiles_per_axis(zoom) as i64;
    let offset = (x as i64 - center_column).rem_euclid(count);
    if offset * 2 >= count {
        center_column + offset - count
    } else {
        center_column + offset
    }
}
