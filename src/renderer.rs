//! Overlay rendering.
//!
//! [`OverlayRenderer::render_frame`] draws one frame from the current framing,
//! animation state, a marker snapshot and the optional frozen result. It does
//! no I/O and never blocks; the only state it touches is one animation step.

use std::path::Path;

use image::RgbaImage;

use crate::animation::ScanAnimation;
use crate::config::{AssetConfig, CaptionConfig, ColorConfig, OverlayConfig};
use crate::draw::{self, blit_scaled, fill_circle, fill_rect};
use crate::error::Error;
use crate::frozen::{FROZEN_RESULT_ALPHA, FrozenResult};
use crate::geometry::Framing;
use crate::markers::MarkerSnapshot;
use crate::types::{FrameBuffer, Orientation, Rect, ResultPoint, Sprite};

/// Hint marker radius, density-independent pixels.
pub const POINT_SIZE_DP: f32 = 6.0;
/// Caption text size, density-independent pixels.
pub const TEXT_SIZE_DP: f32 = 16.0;
/// Gap between the frame's bottom edge and the caption.
pub const TEXT_PADDING_TOP_DP: f32 = 30.0;

/// Opacity of the faded (previous) hint batch.
const PREVIOUS_POINT_OPACITY: u8 = 0x7F;

// procedural sprite dimensions
const BORDER_SIZE: u32 = 200;
const BORDER_CORNER: u32 = 30;
const BORDER_THICKNESS: u32 = 2;
const LINE_LENGTH: u32 = 256;
const LINE_THICKNESS: u32 = 3;

/// Sprites drawn while scanning.
#[derive(Clone)]
pub struct OverlayAssets {
    pub border: Sprite,
    /// Drawn across the frame while sweeping top to bottom.
    pub scan_line_horizontal: Sprite,
    /// Drawn down the frame while sweeping left to right.
    pub scan_line_vertical: Sprite,
    /// Generated lines pulse with the laser alpha; loaded ones are drawn as-is.
    pulse_lines: bool,
}

impl OverlayAssets {
    /// Corner-bracket border and soft laser lines in `laser` color.
    pub fn procedural(laser: u32) -> Self {
        Self {
            border: corner_border(laser),
            scan_line_horizontal: laser_line(laser, true),
            scan_line_vertical: laser_line(laser, false),
            pulse_lines: true,
        }
    }

    /// Load configured PNGs, generating anything not configured.
    pub fn load(assets: &AssetConfig, laser: u32) -> Result<Self, Error> {
        let mut out = Self::procedural(laser);
        if let Some(path) = &assets.border {
            out.border = load_sprite(path)?;
        }
        if let Some(path) = &assets.scan_line_horizontal {
            out.scan_line_horizontal = load_sprite(path)?;
            out.pulse_lines = false;
        }
        if let Some(path) = &assets.scan_line_vertical {
            out.scan_line_vertical = load_sprite(path)?;
            out.pulse_lines = false;
        }
        Ok(out)
    }

    fn scan_line(&self, orientation: Orientation) -> &Sprite {
        if orientation.is_vertical() { &self.scan_line_horizontal } else { &self.scan_line_vertical }
    }
}

fn load_sprite(path: &Path) -> Result<Sprite, Error> {
    let img = image::open(path).map_err(|source| Error::Asset { path: path.to_path_buf(), source })?;
    log::debug!("Loaded sprite {} ({}x{})", path.display(), img.width(), img.height());
    Ok(Sprite::from_rgba(&img.to_rgba8()))
}

fn argb_to_rgba(argb: u32, alpha: u8) -> image::Rgba<u8> {
    image::Rgba([(argb >> 16) as u8, (argb >> 8) as u8, argb as u8, alpha])
}

/// Visual: four L-shaped corners marking the scan target.
fn corner_border(color: u32) -> Sprite {
    let (n, c, t) = (BORDER_SIZE, BORDER_CORNER, BORDER_THICKNESS);
    let img = RgbaImage::from_fn(n, n, |x, y| {
        let near_x = x < t || x >= n - t;
        let near_y = y < t || y >= n - t;
        let in_corner_x = x < c || x >= n - c;
        let in_corner_y = y < c || y >= n - c;
        if (near_x && in_corner_y) || (near_y && in_corner_x) {
            argb_to_rgba(color, 0xFF)
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    Sprite::from_rgba(&img)
}

/// Visual: a laser bar that fades out toward both ends.
fn laser_line(color: u32, horizontal: bool) -> Sprite {
    let (w, h) = if horizontal { (LINE_LENGTH, LINE_THICKNESS) } else { (LINE_THICKNESS, LINE_LENGTH) };
    let img = RgbaImage::from_fn(w, h, |x, y| {
        let along = (if horizontal { x } else { y }) as f32 / (LINE_LENGTH - 1) as f32;
        // 0 at the ends, 1 in the middle
        let ramp = 1.0 - (2.0 * along - 1.0).abs();
        argb_to_rgba(color, (ramp.sqrt() * 255.0).round() as u8)
    });
    Sprite::from_rgba(&img)
}

/// What a render pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Region that animates; the next scheduled redraw only needs this.
    pub dirty: Rect,
    /// Region this pass actually drew into. Hosts only need to present this.
    pub repainted: Rect,
    /// Y just below the caption, when one was laid out.
    pub caption_bottom: Option<i32>,
}

pub struct OverlayRenderer {
    assets: OverlayAssets,
    colors: ColorConfig,
    captions: CaptionConfig,
    density: f32,
}

impl OverlayRenderer {
    pub fn new(config: &OverlayConfig, assets: OverlayAssets) -> Self {
        Self {
            assets,
            colors: config.colors.clone(),
            captions: config.captions.clone(),
            density: config.display.density.max(0.1),
        }
    }

    fn dp(&self, v: f32) -> f32 {
        v * self.density
    }

    fn text_scale(&self) -> i32 {
        (self.dp(TEXT_SIZE_DP) / draw::line_height(1) as f32).round().max(1.0) as i32
    }

    /// Draw one frame over whatever is already on `fb` (the camera preview).
    ///
    /// `region` limits drawing to part of the surface (None redraws all of
    /// it); pixels outside it are left exactly as they were. Returns None,
    /// drawing nothing, when the framing rectangle does not lie inside the
    /// surface.
    pub fn render_frame(
        &self,
        fb: &mut FrameBuffer,
        framing: &Framing,
        animation: &mut ScanAnimation,
        markers: &MarkerSnapshot,
        frozen: Option<&FrozenResult>,
        region: Option<Rect>,
    ) -> Option<FrameOutcome> {
        let frame = framing.frame();
        let bounds = fb.bounds();
        if !bounds.contains_rect(&frame) {
            log::debug!("Frame {frame:?} outside surface {bounds:?}, skipping render");
            return None;
        }
        // an off-surface region still counts as a pass, it just draws nothing
        let clip = match region {
            Some(r) => r.intersect(&bounds).unwrap_or_default(),
            None => bounds,
        };
        let inner = frame.intersect(&clip).unwrap_or_default();

        // 1) Darken everything outside the frame
        let tint = if frozen.is_some() { self.colors.result } else { self.colors.mask };
        for r in [
            Rect::new(0, 0, bounds.right, frame.top),
            Rect::new(0, frame.top, frame.left, frame.bottom),
            Rect::new(frame.right, frame.top, bounds.right, frame.bottom),
            Rect::new(0, frame.bottom, bounds.right, bounds.bottom),
        ] {
            if let Some(r) = r.intersect(&clip) {
                fill_rect(fb, r, tint, 255);
            }
        }

        // 2) Frozen result replaces the live view
        if let Some(frozen) = frozen {
            blit_scaled(fb, frozen.sprite(), frame, inner, FROZEN_RESULT_ALPHA);
            return Some(FrameOutcome { dirty: frame, repainted: clip, caption_bottom: None });
        }

        // 3) Live: border, moving line, caption, hints
        animation.tick();
        blit_scaled(fb, &self.assets.border, frame, inner, 255);
        self.draw_scan_line(fb, frame, inner, animation);
        let caption_bottom = self.draw_caption(fb, frame, clip, animation.orientation());

        let radius = self.dp(POINT_SIZE_DP);
        self.draw_points(fb, framing, &markers.current, clip, radius, 255);
        self.draw_points(fb, framing, &markers.previous, clip, radius / 2.0, PREVIOUS_POINT_OPACITY);

        Some(FrameOutcome { dirty: frame, repainted: clip, caption_bottom: Some(caption_bottom) })
    }

    /// The line at the current offset, never past the frame (`inner` is the
    /// frame already cut down to the redraw region).
    fn draw_scan_line(&self, fb: &mut FrameBuffer, frame: Rect, inner: Rect, animation: &ScanAnimation) {
        let orientation = animation.orientation();
        let line = self.assets.scan_line(orientation);
        let slide = animation.offset();
        let dst = if orientation.is_vertical() {
            Rect::new(frame.left, slide, frame.right, slide + line.height as i32)
        } else {
            Rect::new(slide, frame.top, slide + line.width as i32, frame.bottom)
        };
        let opacity = if self.assets.pulse_lines {
            128 + animation.laser_alpha() / 2
        } else {
            255
        };
        blit_scaled(fb, line, dst, inner, opacity);
    }

    /// Centered under the frame. Returns the y just below the text.
    ///
    /// The caption never changes while scanning, so a pass whose `clip` does
    /// not cover all of it leaves the pixels from the last full pass alone.
    fn draw_caption(&self, fb: &mut FrameBuffer, frame: Rect, clip: Rect, orientation: Orientation) -> i32 {
        let text = if orientation.is_vertical() { &self.captions.portrait } else { &self.captions.landscape };
        let scale = self.text_scale();
        let x = (fb.width as i32 - draw::text_width(text, scale)) / 2;
        let y = frame.bottom + self.dp(TEXT_PADDING_TOP_DP).round() as i32;
        // glyphs plus their shadow
        let area = Rect::from_origin_size(x, y, draw::text_width(text, scale) + scale, draw::line_height(scale));
        if area.intersect(&fb.bounds()).is_some_and(|visible| clip.contains_rect(&visible)) {
            draw::draw_text_5x7(fb, x, y, text, scale, self.colors.caption);
        }
        y + draw::line_height(scale)
    }

    fn draw_points(
        &self,
        fb: &mut FrameBuffer,
        framing: &Framing,
        points: &[ResultPoint],
        clip: Rect,
        radius: f32,
        opacity: u8,
    ) {
        for p in points {
            let (x, y) = framing.map_preview_point_to_display(p);
            fill_circle(fb, x.trunc(), y.trunc(), radius, clip, self.colors.result_points, opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frozen::DecodedImage;
    use std::sync::Arc;

    const W: usize = 200;
    const H: usize = 200;

    fn setup() -> (OverlayRenderer, Framing, ScanAnimation) {
        let mut config = OverlayConfig::default();
        config.colors.mask = 0xFF10_1010;
        config.colors.result = 0xFF20_2020;
        config.colors.result_points = 0xFF00_FF00;
        let renderer = OverlayRenderer::new(&config, OverlayAssets::procedural(config.colors.laser));
        let framing = Framing::new(Rect::new(50, 40, 150, 140), Rect::new(0, 0, 50, 50)).unwrap();
        let mut anim = ScanAnimation::new();
        anim.align(framing.frame(), Orientation::Portrait);
        (renderer, framing, anim)
    }

    #[test]
    fn mask_covers_only_the_exterior() {
        let (renderer, framing, mut anim) = setup();
        let mut fb = FrameBuffer::new(W, H);
        let out = renderer
            .render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None)
            .expect("frame inside surface");
        assert_eq!(out.dirty, framing.frame());
        assert_eq!(fb.get(0, 0), 0x0010_1010);
        assert_eq!(fb.get(49, 100), 0x0010_1010);
        assert_eq!(fb.get(150, 100), 0x0010_1010);
        assert_eq!(fb.get(100, 39), 0x0010_1010);
        assert_eq!(fb.get(100, 100), 0, "interior untouched");
    }

    #[test]
    fn live_render_advances_one_step() {
        let (renderer, framing, mut anim) = setup();
        let mut fb = FrameBuffer::new(W, H);
        renderer.render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None);
        assert_eq!(anim.offset(), 45);
        renderer.render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None);
        assert_eq!(anim.offset(), 50);
    }

    #[test]
    fn caption_sits_below_the_frame() {
        let (renderer, framing, mut anim) = setup();
        let mut fb = FrameBuffer::new(W, H);
        let out = renderer
            .render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None)
            .unwrap();
        // 140 + 30dp, 16dp text => scale 2, line height 16
        assert_eq!(out.caption_bottom, Some(140 + 30 + 16));
    }

    #[test]
    fn markers_land_on_mapped_positions() {
        let (renderer, framing, mut anim) = setup();
        let mut fb = FrameBuffer::new(W, H);
        let snap = MarkerSnapshot {
            current: vec![ResultPoint::new(10.0, 10.0)],
            previous: Arc::new(vec![ResultPoint::new(40.0, 40.0)]),
        };
        renderer.render_frame(&mut fb, &framing, &mut anim, &snap, None, None);
        // scale 2: (10,10) -> (70,60), (40,40) -> (130,120)
        assert_eq!(fb.get(70, 60), 0x0000_FF00, "current batch at full opacity");
        assert_eq!(fb.get(75, 60), 0x0000_FF00, "radius 6");
        assert_eq!(fb.get(77, 60), 0, "nothing past the radius");
        let faded = fb.get(130, 120);
        assert!(faded != 0 && faded != 0x0000_FF00, "previous batch is half opacity: {faded:#x}");
        assert_eq!(fb.get(134, 120), 0, "previous batch uses half radius");
    }

    #[test]
    fn frozen_result_replaces_live_view() {
        let (renderer, framing, mut anim) = setup();
        anim.show_result();
        let img = RgbaImage::from_pixel(10, 10, image::Rgba([255, 255, 255, 255]));
        let frozen = FrozenResult::prepare(DecodedImage::new(img), framing.frame()).unwrap();
        let snap = MarkerSnapshot { current: vec![ResultPoint::new(10.0, 10.0)], ..Default::default() };

        let mut fb = FrameBuffer::new(W, H);
        let out = renderer.render_frame(&mut fb, &framing, &mut anim, &snap, Some(&frozen), None).unwrap();
        assert_eq!(out.caption_bottom, None);
        assert_eq!(fb.get(0, 0), 0x0020_2020, "result tint");
        assert_eq!(fb.get(70, 60), 0x00A0_A0A0, "white at 0xA0 over black, no marker");
        assert_eq!(anim.offset(), 40, "line frozen");
    }

    #[test]
    fn frame_outside_surface_draws_nothing() {
        let (renderer, _, mut anim) = setup();
        let framing = Framing::new(Rect::new(150, 150, 250, 250), Rect::new(0, 0, 10, 10)).unwrap();
        let mut fb = FrameBuffer::new(W, H);
        let out = renderer.render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None);
        assert!(out.is_none());
        assert!(fb.pixels.iter().all(|&p| p == 0));
    }

    fn solid(width: usize, height: usize, argb: u32) -> Sprite {
        Sprite { width, height, pixels: vec![argb; width * height] }
    }

    /// Opaque mask, and a blue horizontal / red vertical line that do not pulse.
    fn solid_line_renderer(config: &mut OverlayConfig) -> OverlayRenderer {
        config.colors.mask = 0xFF10_1010;
        let mut assets = OverlayAssets::procedural(config.colors.laser);
        assets.scan_line_horizontal = solid(1, 20, 0xFF00_00FF);
        assets.scan_line_vertical = solid(20, 1, 0xFFFF_0000);
        assets.pulse_lines = false;
        OverlayRenderer::new(config, assets)
    }

    #[test]
    fn restricted_pass_leaves_outside_pixels_alone() {
        let (renderer, framing, mut anim) = setup();
        let mut fb = FrameBuffer::new(W, H);
        let first = renderer
            .render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None)
            .unwrap();
        assert_eq!(first.repainted, Rect::new(0, 0, W as i32, H as i32));

        fb.pixels[0] = 0x00AB_CDEF;
        // straddles the left frame edge at (50,90)
        let snap = MarkerSnapshot { current: vec![ResultPoint::new(0.0, 25.0)], ..Default::default() };
        let out = renderer
            .render_frame(&mut fb, &framing, &mut anim, &snap, None, Some(first.dirty))
            .unwrap();
        assert_eq!(out.repainted, framing.frame());
        assert_eq!(fb.get(0, 0), 0x00AB_CDEF, "outside the region");
        assert_eq!(fb.get(46, 90), 0x0010_1010, "marker cut at the region edge");
        assert_eq!(fb.get(52, 90), 0x0000_FF00);
        assert_eq!(anim.offset(), 50);
    }

    #[test]
    fn scan_line_is_cut_at_the_far_edge() {
        let (_, framing, mut anim) = setup();
        let renderer = solid_line_renderer(&mut OverlayConfig::default());
        for _ in 0..17 {
            anim.tick();
        }
        let mut fb = FrameBuffer::new(W, H);
        renderer.render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None);

        // 20px line at 130 runs past the frame bottom (140)
        assert_eq!(anim.offset(), 130);
        assert_eq!(fb.get(100, 130), 0x0000_00FF);
        assert_eq!(fb.get(100, 139), 0x0000_00FF);
        assert_eq!(fb.get(100, 140), 0x0010_1010, "only mask below the frame");
        assert_eq!(fb.get(100, 149), 0x0010_1010);
    }

    #[test]
    fn landscape_sweeps_sideways_with_barcode_caption() {
        let mut config = OverlayConfig::default();
        config.captions.landscape = "BAR".into();
        let renderer = solid_line_renderer(&mut config);
        let framing = Framing::new(Rect::new(50, 40, 150, 140), Rect::new(0, 0, 50, 50)).unwrap();
        let mut anim = ScanAnimation::new();
        anim.align(framing.frame(), Orientation::Landscape);

        let mut fb = FrameBuffer::new(W, H);
        let out = renderer
            .render_frame(&mut fb, &framing, &mut anim, &MarkerSnapshot::default(), None, None)
            .unwrap();
        assert_eq!(anim.offset(), 55);
        assert_eq!(fb.get(60, 90), 0x00FF_0000, "vertical line at the offset");
        assert_eq!(fb.get(80, 90), 0, "20 wide");
        assert!(!fb.pixels.contains(&0x0000_00FF), "portrait line unused");

        // "BAR" at scale 2 is 34 wide, centered: x = 83
        assert_eq!(fb.get(83, 170), 0x00D8_D8D8);
        assert_eq!(out.caption_bottom, Some(170 + 16));
    }
}
