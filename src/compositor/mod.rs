//! The tile compositor
//!
//! `TileCompositor` owns a fixed-size square surface and keeps it showing the part
//! of the world under the globe's camera. Every [`TileCompositor::update`] redraws
//! the surface from scratch: a stretched crop of the base image first, then every
//! cached tile at the current zoom. Missing tiles are queued nearest-first and
//! downloaded on the configured spawner; finished downloads come back over a
//! channel and are applied by [`TileCompositor::poll`] on the owner's thread.

mod stats;

pub use stats::CompositorStats;

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::FutureExt;
use image::RgbaImage;

use crate::core::builder::TileCompositorBuilder;
use crate::core::config::CompositorConfig;
use crate::core::geo::TileCoord;
use crate::core::viewport::{TextureTransform, UvBounds, ViewWindow};
use crate::rendering::surface::Surface;
use crate::runtime::AsyncSpawner;
use crate::tiles::cache::TileCache;
use crate::tiles::grid::{center_tile, distance_map, unwrap_column, visible_tiles};
use crate::tiles::loader::{fetch_image, TileFetcher};
use crate::tiles::queue::FetchScheduler;
use crate::tiles::source::TileSource;
use crate::{CompositorError, Result};

type UpdateCallback = Box<dyn FnMut() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Waiting for a base image
    Uninitialized,
    Ready,
    /// The base image could not be loaded; permanent
    Failed,
    Disposed,
}

/// Outcome of one tile download, sent back to the owning compositor
struct FetchCompletion {
    coord: TileCoord,
    result: Result<RgbaImage>,
}

pub struct TileCompositor {
    config: CompositorConfig,
    source: Arc<dyn TileSource>,
    fetcher: Arc<dyn TileFetcher>,
    spawner: Arc<dyn AsyncSpawner>,
    surface: Surface,
    base_image: Option<RgbaImage>,
    lifecycle: Lifecycle,
    window: ViewWindow,
    zoom: Option<u8>,
    cache: TileCache,
    scheduler: FetchScheduler,
    completion_tx: Sender<FetchCompletion>,
    completion_rx: Receiver<FetchCompletion>,
    on_update: Option<UpdateCallback>,
    tiles_drawn: usize,
    fetches_started: u64,
}

impl TileCompositor {
    pub fn builder() -> TileCompositorBuilder {
        TileCompositorBuilder::new()
    }

    /// Allocates the surface eagerly; nothing is drawn until a base image is installed.
    pub(crate) fn new(
        config: CompositorConfig,
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetcher>,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            surface: Surface::new(config.canvas_size),
            cache: TileCache::new(config.cache_capacity),
            scheduler: FetchScheduler::new(config.max_concurrent),
            config,
            source,
            fetcher,
            spawner,
            base_image: None,
            lifecycle: Lifecycle::Uninitialized,
            window: ViewWindow::default(),
            zoom: None,
            completion_tx,
            completion_rx,
            on_update: None,
            tiles_drawn: 0,
            fetches_started: 0,
        }
    }

    /// Download and decode the whole-world base image.
    ///
    /// Until this succeeds every [`update`](Self::update) is a no-op. A failure is
    /// permanent: the error is returned here and later calls get
    /// [`CompositorError::NotReady`].
    pub async fn init(&mut self, base_image_url: &str) -> Result<()> {
        self.check_initializable()?;

        let fetcher = self.fetcher.clone();
        match fetch_image(fetcher.as_ref(), base_image_url).await {
            Ok(image) => self.install_base_image(image),
            Err(err) => {
                log::error!("base image {} failed to load: {}", base_image_url, err);
                self.lifecycle = Lifecycle::Failed;
                Err(err)
            }
        }
    }

    /// Install an already decoded base image, with the same readiness rules as [`init`](Self::init)
    pub fn init_with_image(&mut self, image: RgbaImage) -> Result<()> {
        self.check_initializable()?;
        self.install_base_image(image)
    }

    fn check_initializable(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Uninitialized | Lifecycle::Ready => Ok(()),
            Lifecycle::Failed => Err(CompositorError::NotReady(
                "base image failed to load".to_string(),
            )),
            Lifecycle::Disposed => Err(CompositorError::NotReady(
                "compositor was disposed".to_string(),
            )),
        }
    }

    fn install_base_image(&mut self, image: RgbaImage) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            self.lifecycle = Lifecycle::Failed;
            return Err(CompositorError::InvalidImage(
                "base image is empty".to_string(),
            ));
        }

        log::info!(
            "base image ready ({}x{}), surface {}px",
            image.width(),
            image.height(),
            self.config.canvas_size
        );
        self.base_image = Some(image);
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    /// Register the callback fired whenever the surface's pixels change
    pub fn set_on_update<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_update = Some(Box::new(callback));
    }

    /// Recompose the surface for a globe looking at `(center_lat, center_lng)` from `altitude`.
    ///
    /// Draws the base underlay and every cached tile, queues the missing tiles
    /// nearest-first and starts as many downloads as the concurrency limit allows.
    /// Never fails: before readiness, after disposal, or with non-finite input it
    /// does nothing.
    pub fn update(&mut self, center_lat: f64, center_lng: f64, altitude: f64) {
        if !self.is_ready() {
            log::trace!("update ignored, compositor not ready");
            return;
        }
        if !(center_lat.is_finite() && center_lng.is_finite() && altitude.is_finite()) {
            log::warn!(
                "ignoring non-finite viewport ({}, {}, {})",
                center_lat,
                center_lng,
                altitude
            );
            return;
        }

        let window = ViewWindow::from_viewport(center_lat, center_lng, altitude, &self.config);
        let zoom = window.tile_zoom(&self.config);

        if let Some(previous) = self.zoom.filter(|&previous| previous != zoom) {
            let dropped = self.scheduler.drop_queued();
            log::debug!(
                "zoom {} -> {}, dropped {} queued tile requests",
                previous,
                zoom,
                dropped
            );
        }

        self.window = window;
        self.zoom = Some(zoom);

        self.compose(zoom);
        self.pump();
        self.notify();
    }

    /// Underlay plus cached tiles; queues whatever is missing
    fn compose(&mut self, zoom: u8) {
        let Some(base) = self.base_image.as_ref() else {
            return;
        };
        let window = self.window;
        let canvas_size = self.config.canvas_size;

        self.surface
            .draw_underlay(base, window.base_source_rect(base.width(), base.height()));
        self.tiles_drawn = 0;

        let visible = visible_tiles(&window, zoom, self.config.tile_margin);
        self.scheduler.reprioritize(&distance_map(&visible));

        let mut queued = 0;
        for tile in &visible {
            if let Some(image) = self.cache.get(&tile.coord) {
                let rect = window.tile_rect(tile.column, tile.coord.y as i64, zoom, canvas_size);
                if self.surface.draw_tile(&image, rect) {
                    self.tiles_drawn += 1;
                }
            } else if self.scheduler.enqueue(tile.coord, tile.distance) {
                queued += 1;
            }
        }

        log::trace!(
            "composed z{}: {} visible, {} drawn from cache, {} newly queued",
            zoom,
            visible.len(),
            self.tiles_drawn,
            queued
        );
    }

    /// Start downloads until the concurrency limit is reached or the queue is empty
    fn pump(&mut self) {
        while let Some(coord) = self.scheduler.admit() {
            if self.cache.contains(&coord) {
                self.scheduler.release(&coord);
                continue;
            }

            let url = self.source.url(coord);
            log::debug!("fetching tile {} from {}", coord, url);
            self.fetches_started += 1;

            let fetcher = self.fetcher.clone();
            let completion_tx = self.completion_tx.clone();
            self.spawner.spawn_boxed(
                async move {
                    let result = fetch_image(fetcher.as_ref(), &url).await;
                    // The compositor may be gone; nothing left to deliver to
                    let _ = completion_tx.send(FetchCompletion { coord, result });
                }
                .boxed(),
            );
        }
    }

    /// Apply every download that finished since the last call and refill free
    /// download slots. Returns the number of completions applied.
    ///
    /// Hosts call this from the thread that owns the compositor, typically once per frame.
    pub fn poll(&mut self) -> usize {
        if self.lifecycle == Lifecycle::Disposed {
            let discarded = self.completion_rx.try_iter().count();
            if discarded > 0 {
                log::trace!("discarded {} completions after dispose", discarded);
            }
            return 0;
        }

        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion);
            self.pump();
            applied += 1;
        }
        applied
    }

    fn apply_completion(&mut self, completion: FetchCompletion) {
        let coord = completion.coord;
        match completion.result {
            Ok(image) => {
                self.scheduler.complete(&coord);
                let image = Arc::new(image);
                if let Some(evicted) = self.cache.insert(coord, image.clone()) {
                    log::trace!("evicted tile {} from cache", evicted);
                }

                if self.zoom != Some(coord.z) {
                    log::debug!("tile {} arrived after zoom change, cached only", coord);
                    return;
                }

                let (center_column, _) = center_tile(&self.window, coord.z);
                let column = unwrap_column(coord.x, center_column, coord.z);
                let rect =
                    self.window
                        .tile_rect(column, coord.y as i64, coord.z, self.config.canvas_size);
                if self.surface.draw_tile(&image, rect) {
                    self.tiles_drawn += 1;
                }
                self.notify();
            }
            Err(err) => {
                self.scheduler.fail(coord);
                log::warn!("tile {} failed, not retrying: {}", coord, err);
            }
        }
    }

    fn notify(&mut self) {
        if let Some(callback) = self.on_update.as_mut() {
            callback();
        }
    }

    /// The drawable raster
    pub fn surface(&self) -> &RgbaImage {
        self.surface.image()
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Texture-space rectangle the surface covers, as of the latest update
    pub fn uv_bounds(&self) -> UvBounds {
        self.window.uv_bounds()
    }

    pub fn texture_transform(&self) -> TextureTransform {
        self.uv_bounds().texture_transform()
    }

    pub fn view_window(&self) -> ViewWindow {
        self.window
    }

    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    /// Whether the surface currently shows at least one tile. While it does, the
    /// host has to display [`attribution`](Self::attribution).
    pub fn tiles_active(&self) -> bool {
        self.tiles_drawn > 0
    }

    pub fn attribution(&self) -> &str {
        self.source.attribution()
    }

    pub fn stats(&self) -> CompositorStats {
        CompositorStats {
            zoom: self.zoom,
            cached_tiles: self.cache.len(),
            queued: self.scheduler.queued_len(),
            in_flight: self.scheduler.in_flight_len(),
            failed: self.scheduler.failed_len(),
            tiles_drawn: self.tiles_drawn,
            fetches_started: self.fetches_started,
        }
    }

    /// No queued and no running downloads
    pub fn is_idle(&self) -> bool {
        self.scheduler.queued_len() == 0 && self.scheduler.in_flight_len() == 0
    }

    /// Release cached tiles and pending state and blank the surface. Downloads
    /// already running are not aborted; their results are discarded. The
    /// compositor stays not ready.
    pub fn dispose(&mut self) {
        self.release();
        self.surface.clear();
    }

    fn release(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        log::debug!(
            "disposing compositor: {} cached, {} queued, {} in flight",
            self.cache.len(),
            self.scheduler.queued_len(),
            self.scheduler.in_flight_len()
        );

        self.lifecycle = Lifecycle::Disposed;
        self.cache.clear();
        self.scheduler.clear();
        self.base_image = None;
        self.zoom = None;
        self.tiles_drawn = 0;
        self.on_update = None;
        self.completion_rx.try_iter().for_each(drop);
    }
}

impl Drop for TileCompositor {
    // The surface is freed with the compositor
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for TileCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCompositor")
            .field("lifecycle", &self.lifecycle)
            .field("window", &self.window)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
