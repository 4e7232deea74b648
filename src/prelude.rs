//! Prelude module for common globetex types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use globetex::prelude::*;`

pub use crate::compositor::{CompositorStats, TileCompositor};

pub use crate::core::{
    builder::TileCompositorBuilder,
    config::CompositorConfig,
    geo::{LatLng, TileCoord},
    viewport::{TexturePrecision, TextureTransform, UvBounds, ViewWindow},
};

pub use crate::runtime::{AsyncSpawner, DeferredSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::tiles::{
    cache::TileCache,
    loader::{HttpFetcher, TileFetcher},
    source::{OpenStreetMapSource, TileSource, UrlTemplateSource},
};

pub use crate::{CompositorError, Result};

pub use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
