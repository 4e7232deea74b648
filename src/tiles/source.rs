use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Credit line the host must display while tiles from this source are shown.
    fn attribution(&self) -> &str;
}

/// The public OpenStreetMap tile servers, round-robined over `a`, `b`, `c`.
///
/// The rotation counter belongs to the instance, so two compositors never
/// influence each other's subdomain choice.
#[derive(Debug)]
pub struct OpenStreetMapSource {
    subdomains: Vec<&'static str>,
    next: AtomicUsize,
}

impl OpenStreetMapSource {
    pub fn new() -> Self {
        Self {
            subdomains: vec!["a", "b", "c"],
            next: AtomicUsize::new(0),
        }
    }
}

impl Default for OpenStreetMapSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSource for OpenStreetMapSource {
    fn url(&self, coord: TileCoord) -> String {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.subdomains.len();
        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            self.subdomains[idx], coord.z, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &str {
        "© OpenStreetMap contributors"
    }
}

/// Tile source built from a Leaflet-style template such as
/// `https://{s}.tile.example.org/{z}/{x}/{y}.png`.
#[derive(Debug)]
pub struct UrlTemplateSource {
    template: String,
    subdomains: Vec<String>,
    attribution: String,
    next: AtomicUsize,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: Vec::new(),
            attribution: String::new(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if url.contains("{s}") {
            let sub = if self.subdomains.is_empty() {
                ""
            } else {
                let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.subdomains.len();
                self.subdomains[idx].as_str()
            };
            url = url.replace("{s}", sub);
        }
        url
    }

    fn attribution(&self) -> &str {
        &self.attribution
    }
}
