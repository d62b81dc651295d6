// Core types shared by the overlay: the surface we draw into, rectangles in
// both pixel spaces (display and preview buffer), sprites and detector hints.

use image::RgbaImage;

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the surface is on screen (pixels)
    pub height: usize,     // how tall the surface is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A black surface of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// The whole surface as a rectangle, `(0, 0, width, height)`.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Copy out the pixels inside `rect` (clipped to the surface).
    /// Returns None if nothing of `rect` lies on the surface.
    pub fn crop(&self, rect: Rect) -> Option<FrameBuffer> {
        let r = rect.intersect(&self.bounds())?;
        let (w, h) = (r.width() as usize, r.height() as usize);
        let mut out = Vec::with_capacity(w * h);
        for y in r.top..r.bottom {
            let row = y as usize * self.width;
            out.extend_from_slice(&self.pixels[row + r.left as usize..row + r.right as usize]);
        }
        Some(FrameBuffer { width: w, height: h, pixels: out })
    }

    /// Convert to an RGBA image (opaque), e.g. to hand a preview frame over as a frozen result.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let px = self.get(x as usize, y as usize);
            image::Rgba([(px >> 16) as u8, (px >> 8) as u8, px as u8, 0xFF])
        })
    }
}

/// Axis-aligned rectangle; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub const fn from_origin_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self { left, top, right: left + width, bottom: top + height }
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Empty or inverted rectangles cover no pixels.
    pub const fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }
}

/// A detector hint in preview-buffer coordinates, relative to the preview
/// rectangle's origin (the detector only ever sees that crop).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultPoint {
    pub x: f32,
    pub y: f32,
    pub estimated_module_size: Option<f32>,
}

impl ResultPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, estimated_module_size: None }
    }

    pub const fn with_module_size(x: f32, y: f32, size: f32) -> Self {
        Self { x, y, estimated_module_size: Some(size) }
    }
}

/// Which way the framing rectangle is laid out, and so which way the scan line sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Square QR framing; the line sweeps top to bottom.
    #[default]
    Portrait,
    /// Wide barcode framing; the line sweeps left to right.
    Landscape,
}

impl Orientation {
    pub const fn from_vertical(vertical: bool) -> Self {
        if vertical { Orientation::Portrait } else { Orientation::Landscape }
    }

    /// True when the sweep runs along the vertical axis.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Orientation::Portrait)
    }

    pub const fn flipped(self) -> Self {
        match self {
            Orientation::Portrait => Orientation::Landscape,
            Orientation::Landscape => Orientation::Portrait,
        }
    }
}

/// Image with straight alpha, one 0xAARRGGBB word per pixel.
/// Visual: border frames and scan lines are drawn from these.
#[derive(Clone)]
pub struct Sprite {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Sprite {
    pub fn from_rgba(img: &RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                ((p[3] as u32) << 24) | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
            })
            .collect();
        Self { width: w as usize, height: h as usize, pixels }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}
