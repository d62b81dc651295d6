// What you SEE:
// • Live camera fills the window, darkened outside a centered scan frame.
// • A laser line sweeps the frame; yellow dots mark high-contrast spots the
//   decode thread reports, fading for one frame after they stop.
// • SPACE freezes the current frame as a "result"; R goes back to scanning.
// • O flips between QR (square) and barcode (wide) framing. ESC quits.

mod camera;
mod window;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use camera::CameraCapture;
use clap::Parser;
use scan_overlay::draw::stretch_into;
use scan_overlay::geometry::framing_rects;
use scan_overlay::pipeline::{ContrastHintDetector, DecodeWorker};
use scan_overlay::{
    DecodedImage, Error, FrameBuffer, Orientation, OverlayConfig, Rect, ScanState, ViewfinderOverlay,
};
use window::Drawer;

/// Longest we sleep while waiting for the next redraw (keeps keys responsive).
const IDLE_SLICE: Duration = Duration::from_millis(5);

/// Camera preview with an animated scan overlay.
#[derive(Parser)]
#[command(name = "scan-overlay", version)]
struct Args {
    /// TOML config file (defaults to ./scan-overlay.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Camera index, overrides the config
    #[arg(long)]
    device: Option<u32>,
    /// Start with barcode (wide) framing
    #[arg(long)]
    landscape: bool,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();
    let config = OverlayConfig::load(args.config.as_deref())?;

    /* --- Camera + window setup ---
       Visual: window opens; nothing drawn until the first tick. */
    let device = args.device.unwrap_or(config.camera.device);
    let mut cam = CameraCapture::new(device, config.camera.width, config.camera.height)?;
    let preview_size = cam.resolution();
    let display = (config.display.width, config.display.height);
    let mut drawer = Drawer::new("Scan Overlay", display.0, display.1)?;
    let mut screen = FrameBuffer::new(display.0, display.1);

    /* --- Overlay + decode thread --- */
    let mut overlay = ViewfinderOverlay::create(&config)?;
    let mut worker = DecodeWorker::spawn(ContrastHintDetector::default(), overlay.marker_sink())?;

    let mut orientation = Orientation::from_vertical(!args.landscape);
    let mut preview_rect = apply_framing(&mut overlay, display, preview_size, orientation, Instant::now());
    let mut last_live: Option<FrameBuffer> = None;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Inputs, all applied here on the render thread */
        if drawer.o_pressed_once() {
            orientation = orientation.flipped();
            preview_rect = apply_framing(&mut overlay, display, preview_size, orientation, now);
        }
        if drawer.r_pressed_once() {
            overlay.on_reset(now);
            worker.resume();
        }
        if drawer.space_pressed_once() && overlay.state() == ScanState::Scanning {
            let crop = preview_rect.zip(last_live.as_ref()).and_then(|(r, live)| live.crop(r));
            if let Some(crop) = crop {
                if !overlay.on_decode_success(DecodedImage::new(crop.to_rgba_image()), now) {
                    log::warn!("Could not freeze the current frame");
                }
            }
        }
        while let Some(event) = worker.try_event() {
            worker.apply_event(event, &mut overlay, now);
        }

        /* 2) Wait for the scheduler; a frozen result schedules nothing, so the
              last frame simply stays on screen. */
        match overlay.scheduler().time_until_due(now) {
            Some(wait) if wait.is_zero() => {}
            Some(wait) => {
                drawer.pump();
                thread::sleep(wait.min(IDLE_SLICE));
                continue;
            }
            None => {
                drawer.pump();
                thread::sleep(IDLE_SLICE);
                continue;
            }
        }

        /* 3) Fresh preview, feed the decoder, draw the overlay on top.
              Only the due request's region is refreshed; the rest of the
              screen keeps the last full redraw. */
        let live = cam.next_frame()?;
        if overlay.state() == ScanState::Scanning {
            if let Some(crop) = preview_rect.and_then(|r| live.crop(r)) {
                worker.submit(crop);
            }
        }
        let region = overlay.scheduler().pending().and_then(|req| req.region).unwrap_or(screen.bounds());
        stretch_into(&mut screen, &live, region);
        if let Some(out) = overlay.tick(&mut screen, Instant::now()) {
            log::trace!("Drew {:?}, caption ends at {:?}", out.repainted, out.caption_bottom);
        }
        drawer.present(&screen)?;
        last_live = Some(live);
    }

    worker.stop();
    overlay.teardown();
    Ok(())
}

/// Publish framing for the current orientation. Returns the preview-buffer
/// rectangle the decoder should look at.
fn apply_framing(
    overlay: &mut ViewfinderOverlay,
    display: (usize, usize),
    preview_size: (u32, u32),
    orientation: Orientation,
    now: Instant,
) -> Option<Rect> {
    let Some((frame, preview)) = framing_rects(display, preview_size, orientation) else {
        log::warn!("No framing fits display {display:?} / preview {preview_size:?}");
        return None;
    };
    overlay.on_frame_geometry_changed(frame, preview, orientation.is_vertical(), now);
    Some(preview)
}
