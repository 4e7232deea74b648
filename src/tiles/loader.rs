use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;

use crate::core::config::CompositorConfig;
use crate::{CompositorError, Result};

/// Anything that can retrieve the raw bytes behind a URL.
///
/// The compositor only ever talks to the network through this trait, so hosts
/// can plug in their own transport and tests can serve tiles from memory.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Async HTTP fetcher optimized for tile downloads
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CompositorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_concurrent)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CompositorError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode PNG/JPEG bytes into an RGBA raster
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(CompositorError::InvalidImage("decoded image is empty".to_string()));
    }
    Ok(image)
}

/// Fetch `url` and decode the body
pub async fn fetch_image(fetcher: &dyn TileFetcher, url: &str) -> Result<RgbaImage> {
    let bytes = fetcher.fetch(url).await?;
    decode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgba};
    use std::io::Cursor;

    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl TileFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let image = decode_image(&png_bytes(3, 2)).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(*image.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(CompositorError::Decode(_))
        ));
    }

    #[test]
    fn test_fetch_image_decodes_body() {
        let fetcher = StaticFetcher(png_bytes(4, 4));
        let image = futures::executor::block_on(fetch_image(&fetcher, "mem://x")).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
    }

    #[test]
    fn test_http_fetcher_builds_from_config() {
        assert!(HttpFetcher::new(&CompositorConfig::default()).is_ok());
    }
}
