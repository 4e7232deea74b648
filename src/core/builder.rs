//! Compositor builder for fluent configuration
//!
//! Wires a [`TileCompositor`] together from a config, a tile source, a fetcher and
//! a spawner. Anything left unset gets the production default: OpenStreetMap
//! tiles over HTTP, driven by the ambient Tokio runtime.

use std::sync::Arc;

use crate::{
    compositor::TileCompositor,
    core::config::CompositorConfig,
    runtime::AsyncSpawner,
    tiles::{HttpFetcher, OpenStreetMapSource, TileFetcher, TileSource},
    Result,
};

/// Builder for creating and configuring TileCompositor instances
#[derive(Default)]
pub struct TileCompositorBuilder {
    config: CompositorConfig,
    source: Option<Arc<dyn TileSource>>,
    fetcher: Option<Arc<dyn TileFetcher>>,
    spawner: Option<Arc<dyn AsyncSpawner>>,
}

impl TileCompositorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: CompositorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set where tiles come from (defaults to OpenStreetMap)
    pub fn with_tile_source(mut self, source: impl TileSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Set how URLs are downloaded (defaults to an [`HttpFetcher`] built from the config)
    pub fn with_fetcher(mut self, fetcher: impl TileFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Share a fetcher with other code, e.g. to observe requests
    pub fn with_shared_fetcher(mut self, fetcher: Arc<dyn TileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the executor for downloads (defaults to the current Tokio runtime)
    pub fn with_spawner(mut self, spawner: impl AsyncSpawner) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// Validate the configuration and build the compositor
    pub fn build(self) -> Result<TileCompositor> {
        self.config.validate()?;

        let source = match self.source {
            Some(source) => source,
            None => Arc::new(OpenStreetMapSource::new()),
        };
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&self.config)?),
        };
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => default_spawner()?,
        };

        Ok(TileCompositor::new(self.config, source, fetcher, spawner))
    }
}

#[cfg(feature = "tokio-runtime")]
fn default_spawner() -> Result<Arc<dyn AsyncSpawner>> {
    Ok(Arc::new(crate::runtime::TokioSpawner::current()?))
}

#[cfg(not(feature = "tokio-runtime"))]
fn default_spawner() -> Result<Arc<dyn AsyncSpawner>> {
    Err(crate::CompositorError::Runtime(
        "no spawner configured and the tokio-runtime feature is disabled".to_string(),
    ))
}
