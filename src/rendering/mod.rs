pub mod surface;

// Re-export main types
pub use surface::{PixelRect, SourceRect, Surface};
