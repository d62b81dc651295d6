//! The viewfinder overlay: one context object that owns the framing geometry,
//! the scan animation, the hint buffer, the frozen result and the redraw
//! scheduler, and exposes the inputs the camera/decode side calls.
//!
//! Everything here runs on the render thread. The only piece shared with the
//! decode thread is the marker buffer, reached through [`MarkerSink`].

use std::time::Instant;

use crate::animation::{ScanAnimation, ScanState};
use crate::config::OverlayConfig;
use crate::error::Error;
use crate::frozen::{DecodedImage, FrozenResult};
use crate::geometry::FramingGeometry;
use crate::markers::{MarkerBuffer, MarkerSink, MarkerSnapshot};
use crate::renderer::{FrameOutcome, OverlayAssets, OverlayRenderer};
use crate::scheduler::RedrawScheduler;
use crate::types::{FrameBuffer, Orientation, Rect, ResultPoint};

pub struct ViewfinderOverlay {
    geometry: FramingGeometry,
    animation: ScanAnimation,
    markers: MarkerBuffer,
    frozen: Option<FrozenResult>,
    renderer: OverlayRenderer,
    scheduler: RedrawScheduler,
    caption_bottom: Option<i32>,
}

impl ViewfinderOverlay {
    /// Build from configuration, loading any configured sprite assets.
    pub fn create(config: &OverlayConfig) -> Result<Self, Error> {
        let assets = OverlayAssets::load(&config.assets, config.colors.laser)?;
        Ok(Self::with_assets(config, assets))
    }

    pub fn with_assets(config: &OverlayConfig, assets: OverlayAssets) -> Self {
        Self {
            geometry: FramingGeometry::new(),
            animation: ScanAnimation::new(),
            markers: MarkerBuffer::new(),
            frozen: None,
            renderer: OverlayRenderer::new(config, assets),
            scheduler: RedrawScheduler::default(),
            caption_bottom: None,
        }
    }

    /// Writer handle for the decode thread.
    pub fn marker_sink(&self) -> MarkerSink {
        self.markers.sink()
    }

    pub fn state(&self) -> ScanState {
        self.animation.state()
    }

    pub fn animation(&self) -> &ScanAnimation {
        &self.animation
    }

    pub fn geometry(&self) -> &FramingGeometry {
        &self.geometry
    }

    pub fn markers(&self) -> &MarkerBuffer {
        &self.markers
    }

    pub fn scheduler(&self) -> &RedrawScheduler {
        &self.scheduler
    }

    pub fn has_frozen_result(&self) -> bool {
        self.frozen.is_some()
    }

    /// Y just below the caption of the last scanning frame, for laying out
    /// host widgets under the viewfinder.
    pub fn caption_bottom(&self) -> Option<i32> {
        self.caption_bottom
    }

    /// The camera side published new capture geometry.
    pub fn on_frame_geometry_changed(
        &mut self,
        frame: Rect,
        preview: Rect,
        orientation_is_vertical: bool,
        now: Instant,
    ) {
        if !self.geometry.set_frames(frame, preview) {
            // not-ready until valid geometry arrives; nothing to draw
            return;
        }
        self.animation.align(frame, Orientation::from_vertical(orientation_is_vertical));

        let rescaled = match self.frozen.as_mut() {
            Some(frozen) => frozen.rescale(frame),
            None => Ok(()),
        };
        if let Err(e) = rescaled {
            log::warn!("{e}; back to scanning");
            self.release_frozen();
            self.animation.resume();
        }
        self.scheduler.request_now(now);
    }

    /// A detector hint from the decode side (any thread may use the sink instead).
    pub fn on_possible_result_point(&self, p: ResultPoint) {
        self.markers.add_point(p);
    }

    /// Freeze `image` over the frame. Returns false, releasing the image and
    /// staying as-is, when it cannot be shown.
    pub fn on_decode_success(&mut self, image: DecodedImage, now: Instant) -> bool {
        if self.animation.state() != ScanState::Scanning {
            log::warn!("Decode result ignored in state {:?}", self.animation.state());
            return false;
        }
        let Some(framing) = self.geometry.framing() else {
            log::warn!("Decode result ignored: no framing geometry");
            return false;
        };

        match FrozenResult::prepare(image, framing.frame()) {
            Ok(frozen) => {
                self.frozen = Some(frozen);
                self.animation.show_result();
                // one redraw for the frozen frame, nothing scheduled after it
                self.scheduler.cancel();
                self.scheduler.request_now(now);
                log::info!("Result displayed");
                true
            }
            Err(e) => {
                log::warn!("{e}; keep scanning");
                false
            }
        }
    }

    /// Back to live scanning: release the frozen image, drop all hints and
    /// rewind the scan line.
    pub fn on_reset(&mut self, now: Instant) {
        self.release_frozen();
        self.markers.clear();
        self.animation.resume();
        self.scheduler.request_now(now);
        log::info!("Overlay reset ({:?})", self.animation.state());
    }

    /// Render if a redraw is due, drawing only inside the request's region.
    /// Returns what was drawn, if anything.
    pub fn tick(&mut self, fb: &mut FrameBuffer, now: Instant) -> Option<FrameOutcome> {
        let request = self.scheduler.take_due(now)?;
        self.render_pass(fb, request.region, now)
    }

    fn render_pass(&mut self, fb: &mut FrameBuffer, region: Option<Rect>, now: Instant) -> Option<FrameOutcome> {
        let Some(framing) = self.geometry.framing() else {
            log::trace!("Render skipped: geometry not ready");
            return None;
        };

        // The frozen view draws no hints, so leave the buffer alone then.
        let snapshot = if self.frozen.is_none() {
            self.markers.snapshot_and_rotate()
        } else {
            MarkerSnapshot::default()
        };

        let outcome = self.renderer.render_frame(
            fb,
            framing,
            &mut self.animation,
            &snapshot,
            self.frozen.as_ref(),
            region,
        )?;

        if outcome.caption_bottom.is_some() {
            self.caption_bottom = outcome.caption_bottom;
        }
        if self.animation.state() == ScanState::Scanning {
            self.scheduler.schedule_next(now, outcome.dirty);
        }
        Some(outcome)
    }

    fn release_frozen(&mut self) {
        if self.frozen.take().is_some() {
            log::debug!("Frozen result released");
        }
    }

    /// Cancel any pending redraw and release everything held.
    pub fn teardown(mut self) {
        self.scheduler.cancel();
        self.release_frozen();
        self.markers.clear();
        log::debug!("Overlay torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::time::Duration;

    fn overlay() -> ViewfinderOverlay {
        let config = OverlayConfig::default();
        ViewfinderOverlay::with_assets(&config, OverlayAssets::procedural(config.colors.laser))
    }

    #[test]
    fn nothing_renders_before_geometry() {
        let mut o = overlay();
        let mut fb = FrameBuffer::new(100, 100);
        let t0 = Instant::now();
        o.on_reset(t0);
        assert!(o.tick(&mut fb, t0).is_none());
        assert_eq!(o.state(), ScanState::Uninitialized);
        assert!(o.scheduler().pending().is_none(), "no render, no follow-up");
    }

    #[test]
    fn malformed_geometry_keeps_overlay_idle() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.on_frame_geometry_changed(Rect::new(50, 50, 10, 10), Rect::new(0, 0, 10, 10), true, t0);
        assert!(!o.geometry().is_ready());
        assert_eq!(o.state(), ScanState::Uninitialized);
        assert!(o.scheduler().pending().is_none());
    }

    #[test]
    fn malformed_publish_drops_the_last_good_geometry() {
        let mut o = overlay();
        let mut fb = FrameBuffer::new(100, 100);
        let t0 = Instant::now();
        o.on_frame_geometry_changed(Rect::new(10, 10, 90, 90), Rect::new(0, 0, 40, 40), true, t0);
        assert!(o.tick(&mut fb, t0).is_some());

        o.on_frame_geometry_changed(Rect::new(90, 10, 10, 90), Rect::new(0, 0, 40, 40), true, t0);
        assert!(!o.geometry().is_ready());
        assert!(o.tick(&mut fb, t0 + Duration::from_millis(40)).is_none());
        assert!(o.scheduler().pending().is_none(), "idle until valid geometry arrives");
    }

    #[test]
    fn decode_success_before_geometry_is_refused() {
        let mut o = overlay();
        assert!(!o.on_decode_success(DecodedImage::new(RgbaImage::new(4, 4)), Instant::now()));
        assert!(!o.has_frozen_result());
    }

    #[test]
    fn unpreparable_image_keeps_scanning() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.on_frame_geometry_changed(Rect::new(10, 10, 90, 90), Rect::new(0, 0, 40, 40), true, t0);
        assert!(!o.on_decode_success(DecodedImage::new(RgbaImage::new(0, 0)), t0));
        assert_eq!(o.state(), ScanState::Scanning);
        assert!(!o.has_frozen_result());
    }

    #[test]
    fn geometry_change_forces_one_immediate_redraw() {
        let mut o = overlay();
        let mut fb = FrameBuffer::new(100, 100);
        let t0 = Instant::now();
        o.on_frame_geometry_changed(Rect::new(10, 10, 90, 90), Rect::new(0, 0, 40, 40), true, t0);
        assert!(o.tick(&mut fb, t0).is_some());

        // a forced redraw before the scheduled one fires replaces it
        let t1 = t0 + Duration::from_millis(10);
        o.on_frame_geometry_changed(Rect::new(10, 20, 90, 80), Rect::new(0, 0, 40, 30), true, t1);
        assert!(o.tick(&mut fb, t1).is_some());
        assert!(o.tick(&mut fb, t1 + Duration::from_millis(39)).is_none());
        assert!(o.tick(&mut fb, t1 + Duration::from_millis(40)).is_some());
        assert_eq!(o.animation().sweep_bounds(), (20, 80));
    }

    #[test]
    fn frozen_result_follows_geometry_changes() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.on_frame_geometry_changed(Rect::new(10, 10, 90, 90), Rect::new(0, 0, 40, 40), true, t0);
        assert!(o.on_decode_success(DecodedImage::new(RgbaImage::new(8, 8)), t0));
        o.on_frame_geometry_changed(Rect::new(0, 20, 100, 70), Rect::new(0, 0, 40, 20), false, t0);
        assert_eq!(o.state(), ScanState::ResultDisplayed);
        assert!(o.has_frozen_result());

        let mut fb = FrameBuffer::new(100, 100);
        let out = o.tick(&mut fb, t0).expect("forced redraw");
        assert_eq!(out.dirty, Rect::new(0, 20, 100, 70));
        assert_eq!(out.repainted, fb.bounds(), "forced redraws cover the whole surface");
        assert!(o.scheduler().pending().is_none());
    }
}
