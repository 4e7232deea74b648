use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

/// Integer destination rectangle on the surface; may extend past its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Whether any part of the rectangle falls on a `size` x `size` surface
    pub fn intersects(&self, size: u32) -> bool {
        let size = size as i64;
        self.width > 0
            && self.height > 0
            && self.x < size
            && self.y < size
            && self.x + self.width as i64 > 0
            && self.y + self.height as i64 > 0
    }
}

/// Fractional source rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fixed-size square RGBA raster the compositor paints into
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Allocate a transparent `size` x `size` surface
    pub fn new(size: u32) -> Self {
        Self {
            pixels: RgbaImage::new(size, size),
        }
    }

    pub fn size(&self) -> u32 {
        self.pixels.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Stretch `rect` of `source` over the whole surface, replacing its content.
    ///
    /// Sampling is bilinear. Columns wrap around the source horizontally, rows
    /// clamp at its top and bottom edges, matching an equirectangular world image.
    pub fn draw_underlay(&mut self, source: &RgbaImage, rect: SourceRect) {
        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 {
            return;
        }

        let size = self.size();
        let scale_x = rect.width / size as f64;
        let scale_y = rect.height / size as f64;

        let columns: Vec<(u32, u32, f32)> = (0..size)
            .map(|dx| {
                let sx = rect.x + (dx as f64 + 0.5) * scale_x - 0.5;
                let x0 = sx.floor();
                let left = (x0 as i64).rem_euclid(src_w as i64) as u32;
                (left, (left + 1) % src_w, (sx - x0) as f32)
            })
            .collect();

        let last_row = src_h as i64 - 1;
        for dy in 0..size {
            let sy = rect.y + (dy as f64 + 0.5) * scale_y - 0.5;
            let y0 = sy.floor();
            let ty = (sy - y0) as f32;
            let top = (y0 as i64).clamp(0, last_row) as u32;
            let bottom = (y0 as i64 + 1).clamp(0, last_row) as u32;

            for (dx, &(left, right, tx)) in columns.iter().enumerate() {
                let pixel = bilinear(
                    source.get_pixel(left, top),
                    source.get_pixel(right, top),
                    source.get_pixel(left, bottom),
                    source.get_pixel(right, bottom),
                    tx,
                    ty,
                );
                self.pixels.put_pixel(dx as u32, dy, pixel);
            }
        }
    }

    /// Scale `tile` to `dest` and blend it over the surface.
    /// Returns `false` when the rectangle misses the surface entirely.
    pub fn draw_tile(&mut self, tile: &RgbaImage, dest: PixelRect) -> bool {
        if !dest.intersects(self.size()) {
            return false;
        }

        if tile.dimensions() == (dest.width, dest.height) {
            imageops::overlay(&mut self.pixels, tile, dest.x, dest.y);
        } else {
            let scaled = imageops::resize(tile, dest.width, dest.height, FilterType::Triangle);
            imageops::overlay(&mut self.pixels, &scaled, dest.x, dest.y);
        }
        true
    }
}

fn bilinear(
    top_left: &Rgba<u8>,
    top_right: &Rgba<u8>,
    bottom_left: &Rgba<u8>,
    bottom_right: &Rgba<u8>,
    tx: f32,
    ty: f32,
) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for (channel, value) in out.iter_mut().enumerate() {
        let top = top_left[channel] as f32 * (1.0 - tx) + top_right[channel] as f32 * tx;
        let bottom = bottom_left[channel] as f32 * (1.0 - tx) + bottom_right[channel] as f32 * tx;
        *value = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = Surface::new(16);
        assert_eq!(surface.size(), 16);
        assert!(surface.image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_underlay_covers_whole_surface() {
        let source = RgbaImage::from_pixel(8, 4, RED);
        let mut surface = Surface::new(32);
        surface.draw_underlay(
            &source,
            SourceRect {
                x: 2.0,
                y: 1.0,
                width: 1.5,
                height: 0.75,
            },
        );
        assert!(surface.image().pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_underlay_wraps_horizontally() {
        // Left half red, right half blue
        let source = RgbaImage::from_fn(8, 4, |x, _| if x < 4 { RED } else { BLUE });
        let mut surface = Surface::new(16);
        // Window straddling the right edge of the image: blue, then wrapped red
        surface.draw_underlay(
            &source,
            SourceRect {
                x: 6.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
            },
        );
        assert_eq!(*surface.image().get_pixel(1, 8), BLUE);
        assert_eq!(*surface.image().get_pixel(14, 8), RED);
    }

    #[test]
    fn test_draw_tile_clips_and_rejects() {
        let tile = RgbaImage::from_pixel(8, 8, BLUE);
        let mut surface = Surface::new(16);

        let partial = PixelRect {
            x: -4,
            y: 12,
            width: 8,
            height: 8,
        };
        assert!(surface.draw_tile(&tile, partial));
        assert_eq!(*surface.image().get_pixel(0, 15), BLUE);
        assert_eq!(*surface.image().get_pixel(5, 15), Rgba([0, 0, 0, 0]));

        let outside = PixelRect {
            x: 16,
            y: 0,
            width: 8,
            height: 8,
        };
        assert!(!surface.draw_tile(&tile, outside));
    }

    #[test]
    fn test_clear_resets_pixels() {
        let mut surface = Surface::new(4);
        surface.draw_tile(
            &RgbaImage::from_pixel(4, 4, RED),
            PixelRect {
                x: 0,
                y: 0,
                width: 4,
                height: 4,
            },
        );
        surface.clear();
        assert!(surface.image().pixels().all(|p| p[3] == 0));
    }
}
