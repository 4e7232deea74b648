use serde::Serialize;

/// Snapshot of the compositor's tile bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompositorStats {
    /// Zoom of the most recent update, if any
    pub zoom: Option<u8>,
    pub cached_tiles: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub failed: usize,
    /// Tiles drawn on the surface since the last underlay
    pub tiles_drawn: usize,
    /// Downloads started over the compositor's lifetime
    pub fetches_started: u64,
}

impl CompositorStats {
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && self.in_flight == 0
    }
}
