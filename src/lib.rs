//! Scan overlay for a live camera preview.
//!
//! Composites a darkened viewfinder mask, an animated scan line, fading
//! detector hints and a frozen result image over the preview, fed by a decode
//! thread. The library is display-agnostic: it draws into a [`FrameBuffer`]
//! and tells the host when the next frame is due.

pub mod animation;
pub mod config;
pub mod draw;
pub mod error;
pub mod frozen;
pub mod geometry;
pub mod markers;
pub mod overlay;
pub mod pipeline;
pub mod renderer;
pub mod scheduler;
pub mod types;

pub use animation::ScanState;
pub use config::OverlayConfig;
pub use error::Error;
pub use frozen::DecodedImage;
pub use overlay::ViewfinderOverlay;
pub use types::{FrameBuffer, Orientation, Rect, ResultPoint};
