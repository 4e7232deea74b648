//! Shared fixtures: an in-memory tile server and a compositor wired to it

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use globetex::prelude::*;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

pub const BASE_URL: &str = "mem://base.png";
pub const TILE_TEMPLATE: &str = "mem://{z}/{x}/{y}.png";

pub const BASE_COLOR: Rgba<u8> = Rgba([200, 30, 30, 255]);
pub const TILE_COLOR: Rgba<u8> = Rgba([20, 40, 220, 255]);

pub fn png(image: RgbaImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub fn base_image() -> RgbaImage {
    RgbaImage::from_pixel(64, 32, BASE_COLOR)
}

/// Serves the base image and every tile from memory, recording each request
pub struct MemoryFetcher {
    base: Vec<u8>,
    tile: Vec<u8>,
    requests: Mutex<Vec<String>>,
    fail_tiles: AtomicBool,
    fail_base: AtomicBool,
}

impl MemoryFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: png(base_image()),
            tile: png(RgbaImage::from_pixel(8, 8, TILE_COLOR)),
            requests: Mutex::new(Vec::new()),
            fail_tiles: AtomicBool::new(false),
            fail_base: AtomicBool::new(false),
        })
    }

    pub fn fail_tiles(&self, fail: bool) {
        self.fail_tiles.store(fail, Ordering::SeqCst);
    }

    pub fn fail_base(&self, fail: bool) {
        self.fail_base.store(fail, Ordering::SeqCst);
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tile_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|url| url != BASE_URL)
            .collect()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl TileFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());

        if url == BASE_URL {
            if self.fail_base.load(Ordering::SeqCst) {
                return Err(CompositorError::Http {
                    status: 404,
                    url: url.to_string(),
                });
            }
            return Ok(self.base.clone());
        }

        if self.fail_tiles.load(Ordering::SeqCst) {
            return Err(CompositorError::Http {
                status: 503,
                url: url.to_string(),
            });
        }
        Ok(self.tile.clone())
    }
}

pub fn tile_url(z: u8, x: u32, y: u32) -> String {
    format!("mem://{z}/{x}/{y}.png")
}

pub struct Harness {
    pub compositor: TileCompositor,
    pub fetcher: Arc<MemoryFetcher>,
    pub spawner: DeferredSpawner,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CompositorConfig::for_testing())
    }

    pub fn with_config(config: CompositorConfig) -> Self {
        let fetcher = MemoryFetcher::new();
        let spawner = DeferredSpawner::new();
        let compositor = TileCompositor::builder()
            .with_config(config)
            .with_tile_source(UrlTemplateSource::new(TILE_TEMPLATE).with_attribution("Test tiles"))
            .with_shared_fetcher(fetcher.clone())
            .with_spawner(spawner.clone())
            .build()
            .unwrap();
        Self {
            compositor,
            fetcher,
            spawner,
        }
    }

    /// A harness whose compositor already has its base image
    pub fn ready() -> Self {
        let mut harness = Self::new();
        harness.compositor.init_with_image(base_image()).unwrap();
        harness
    }

    /// Run every started download and apply the results until nothing is left
    pub fn settle(&mut self) {
        loop {
            self.spawner.run_all();
            if self.compositor.poll() == 0 {
                break;
            }
        }
    }
}
