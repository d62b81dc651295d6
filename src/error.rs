// Crate error type. Every variant states *where* things went wrong.
use std::path::PathBuf;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String),
    #[error("Window update error: {0}")]
    WindowUpdate(String),
    #[error("Camera init error: {0}")]
    CameraInit(String),
    #[error("Camera frame error: {0}")]
    CameraFrame(String),
    #[error("Failed to load asset '{}': {source}", path.display())]
    Asset {
        path: PathBuf,
        source: image::ImageError,
    },
    /// The decoded image could not be scaled into the framing rectangle.
    #[error("Frozen result unavailable: {0}")]
    FrozenImage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to spawn decode worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
