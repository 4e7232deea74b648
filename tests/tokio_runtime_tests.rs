#![cfg(feature = "tokio-runtime")]

mod common;

use std::time::Duration;

use common::*;
use globetex::prelude::*;

/// The compositor driven by real Tokio tasks instead of the deferred executor
#[cfg(test)]
mod tokio_runtime_tests {
    use super::*;

    async fn wait_until_idle(compositor: &mut TileCompositor) {
        for _ in 0..500 {
            compositor.poll();
            if compositor.is_idle() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("compositor never settled: {:?}", compositor.stats());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_default_spawner_loads_tiles() {
        let fetcher = MemoryFetcher::new();
        let mut compositor = TileCompositor::builder()
            .with_config(CompositorConfig::for_testing())
            .with_tile_source(UrlTemplateSource::new(TILE_TEMPLATE))
            .with_shared_fetcher(fetcher.clone())
            .build()
            .unwrap();

        compositor.init(BASE_URL).await.unwrap();
        compositor.update(51.5, -0.12, 0.01);
        assert!(compositor.stats().in_flight <= 12);

        wait_until_idle(&mut compositor).await;

        let stats = compositor.stats();
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.cached_tiles as u64, stats.fetches_started);
        assert!(compositor.tiles_active());
        assert_eq!(fetcher.tile_requests().len() as u64, stats.fetches_started);
    }

    #[tokio::test]
    async fn test_zoom_out_after_zoom_in_reuses_cache() {
        let fetcher = MemoryFetcher::new();
        let mut compositor = TileCompositor::builder()
            .with_config(CompositorConfig::for_testing())
            .with_tile_source(UrlTemplateSource::new(TILE_TEMPLATE))
            .with_shared_fetcher(fetcher.clone())
            .build()
            .unwrap();
        compositor.init_with_image(base_image()).unwrap();

        compositor.update(48.85, 2.35, 0.01);
        wait_until_idle(&mut compositor).await;
        let first_pass = fetcher.tile_requests().len();

        compositor.update(48.85, 2.35, 0.0005);
        wait_until_idle(&mut compositor).await;
        let second_pass = fetcher.tile_requests().len();
        assert!(second_pass > first_pass);

        compositor.update(48.85, 2.35, 0.01);
        wait_until_idle(&mut compositor).await;
        assert_eq!(fetcher.tile_requests().len(), second_pass);
    }
}
