//! Framing geometry: the scan target in display coordinates, the same area in
//! preview-buffer coordinates, and the scale between the two.

use crate::types::{Orientation, Rect, ResultPoint};

/// Portrait framing: square side as a fraction of the short display side.
const PORTRAIT_SIDE: (i32, i32) = (5, 8);
/// Landscape framing: width and height as fractions of the display.
const LANDSCAPE_WIDTH: (i32, i32) = (7, 8);
const LANDSCAPE_HEIGHT: (i32, i32) = (3, 8);

/// Display pixels per preview pixel along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    pub x: f32,
    pub y: f32,
}

/// A validated frame/preview pair. Only exists once geometry is known, so
/// mapping a point can never happen "before configuration".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    frame: Rect,
    preview: Rect,
    scale: ScaleTransform,
}

impl Framing {
    /// Returns None for empty or inverted rectangles.
    pub fn new(frame: Rect, preview: Rect) -> Option<Self> {
        if frame.is_empty() || preview.is_empty() {
            return None;
        }
        let scale = ScaleTransform {
            x: frame.width() as f32 / preview.width() as f32,
            y: frame.height() as f32 / preview.height() as f32,
        };
        Some(Self { frame, preview, scale })
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn preview(&self) -> Rect {
        self.preview
    }

    pub fn scale(&self) -> ScaleTransform {
        self.scale
    }

    /// Map a hint (relative to the preview rectangle) onto the display surface.
    pub fn map_preview_point_to_display(&self, p: &ResultPoint) -> (f32, f32) {
        (
            self.frame.left as f32 + p.x * self.scale.x,
            self.frame.top as f32 + p.y * self.scale.y,
        )
    }
}

/// Holds the current framing, if any. Written only on the render thread.
#[derive(Debug, Default)]
pub struct FramingGeometry {
    current: Option<Framing>,
}

impl FramingGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new frame/preview pair and recompute the scale.
    /// Malformed input makes the geometry not-ready (the previous pair is
    /// dropped too) and returns false.
    pub fn set_frames(&mut self, frame: Rect, preview: Rect) -> bool {
        self.current = Framing::new(frame, preview);
        if self.current.is_none() {
            log::warn!("Rejected framing geometry frame={frame:?} preview={preview:?}");
        }
        self.current.is_some()
    }

    pub fn framing(&self) -> Option<&Framing> {
        self.current.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

/// Work out a centered framing rectangle for a display and the matching
/// rectangle in a preview buffer of `preview_size`.
/// Visual: portrait gets a square target, landscape a wide barcode strip.
pub fn framing_rects(
    display_size: (usize, usize),
    preview_size: (u32, u32),
    orientation: Orientation,
) -> Option<(Rect, Rect)> {
    let (dw, dh) = (display_size.0 as i32, display_size.1 as i32);
    let (pw, ph) = (preview_size.0 as i64, preview_size.1 as i64);
    if dw <= 0 || dh <= 0 || pw <= 0 || ph <= 0 {
        return None;
    }

    let (w, h) = match orientation {
        Orientation::Portrait => {
            let side = dw.min(dh) * PORTRAIT_SIDE.0 / PORTRAIT_SIDE.1;
            (side, side)
        }
        Orientation::Landscape => (
            dw * LANDSCAPE_WIDTH.0 / LANDSCAPE_WIDTH.1,
            dh * LANDSCAPE_HEIGHT.0 / LANDSCAPE_HEIGHT.1,
        ),
    };
    let frame = Rect::from_origin_size((dw - w) / 2, (dh - h) / 2, w, h);
    if frame.is_empty() {
        return None;
    }

    // Same physical area in preview pixels (the preview fills the display).
    let to_preview_x = |x: i32| (x as i64 * pw / dw as i64) as i32;
    let to_preview_y = |y: i32| (y as i64 * ph / dh as i64) as i32;
    let preview = Rect::new(
        to_preview_x(frame.left),
        to_preview_y(frame.top),
        to_preview_x(frame.right),
        to_preview_y(frame.bottom),
    );
    if preview.is_empty() {
        return None;
    }
    Some((frame, preview))
}
