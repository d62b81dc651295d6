//! The frozen result: a successfully decoded frame shown in place of the live
//! scan view.
//!
//! [`DecodedImage`] carries the resource's release hook and runs it from
//! `Drop`, so every path that lets go of the image (reset, teardown, a failed
//! preparation, a panic unwinding through the overlay) releases it exactly once.

use std::fmt;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::error::Error;
use crate::types::{Rect, Sprite};

/// Opacity of the frozen image over the framing rectangle.
pub const FROZEN_RESULT_ALPHA: u8 = 0xA0;

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Image handed over by the decode pipeline.
pub struct DecodedImage {
    image: RgbaImage,
    release: Option<ReleaseHook>,
}

impl DecodedImage {
    pub fn new(image: RgbaImage) -> Self {
        Self { image, release: None }
    }

    /// `hook` runs once, when this image is dropped.
    pub fn with_release(image: RgbaImage, hook: impl FnOnce() + Send + 'static) -> Self {
        Self { image, release: Some(Box::new(hook)) }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl Drop for DecodedImage {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("dimensions", &self.image.dimensions())
            .field("has_release_hook", &self.release.is_some())
            .finish()
    }
}

/// A decoded image scaled to the framing rectangle, ready to blit.
pub struct FrozenResult {
    source: DecodedImage,
    scaled: Sprite,
    target: Rect,
}

impl FrozenResult {
    /// Scale `source` into `frame`. On failure `source` is dropped, which
    /// releases it.
    pub fn prepare(source: DecodedImage, frame: Rect) -> Result<Self, Error> {
        let scaled = scale_into(&source.image, frame)?;
        Ok(Self { source, scaled, target: frame })
    }

    /// Re-fit the retained source to a new framing rectangle.
    pub fn rescale(&mut self, frame: Rect) -> Result<(), Error> {
        if frame == self.target {
            return Ok(());
        }
        self.scaled = scale_into(&self.source.image, frame)?;
        self.target = frame;
        Ok(())
    }

    pub fn sprite(&self) -> &Sprite {
        &self.scaled
    }

    /// The rectangle the sprite was scaled for.
    pub fn target(&self) -> Rect {
        self.target
    }
}

fn scale_into(img: &RgbaImage, frame: Rect) -> Result<Sprite, Error> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(Error::FrozenImage("decoded image is empty".into()));
    }
    if frame.is_empty() {
        return Err(Error::FrozenImage(format!("framing rectangle {frame:?} is empty")));
    }
    let resized = imageops::resize(img, frame.width() as u32, frame.height() as u32, FilterType::Triangle);
    Ok(Sprite::from_rgba(&resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(w: u32, h: u32) -> (DecodedImage, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let img = DecodedImage::with_release(RgbaImage::new(w, h), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (img, count)
    }

    #[test]
    fn prepared_result_matches_frame_size() {
        let (img, count) = counted(64, 32);
        let frozen = FrozenResult::prepare(img, Rect::new(10, 10, 110, 60)).unwrap();
        assert_eq!((frozen.sprite().width, frozen.sprite().height), (100, 50));
        assert_eq!(count.load(Ordering::SeqCst), 0, "still owned");
        drop(frozen);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_preparation_releases_the_image() {
        let (img, count) = counted(0, 0);
        let err = FrozenResult::prepare(img, Rect::new(0, 0, 10, 10)).err().expect("empty image");
        assert!(matches!(err, Error::FrozenImage(_)));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let (img, count) = counted(8, 8);
        assert!(FrozenResult::prepare(img, Rect::new(5, 5, 5, 9)).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rescale_keeps_the_source() {
        let (img, count) = counted(16, 16);
        let mut frozen = FrozenResult::prepare(img, Rect::new(0, 0, 20, 20)).unwrap();
        frozen.rescale(Rect::new(0, 0, 40, 10)).unwrap();
        assert_eq!((frozen.sprite().width, frozen.sprite().height), (40, 10));
        assert_eq!(frozen.target(), Rect::new(0, 0, 40, 10));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
