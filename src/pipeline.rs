//! Background decode thread.
//!
//! The render thread submits preview crops; the worker runs a [`Detector`] on
//! each, writes hints straight into the marker buffer and sends decode
//! successes back as [`DecodeEvent`]s for the render thread to apply. The
//! worker never touches overlay state other than through the [`MarkerSink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::frozen::DecodedImage;
use crate::markers::MarkerSink;
use crate::overlay::ViewfinderOverlay;
use crate::types::{FrameBuffer, ResultPoint};

/// How often an idle worker checks the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Something that looks for a code in a preview crop.
pub trait Detector: Send + 'static {
    /// Scan `crop`. Candidate feature locations (relative to the crop) go to
    /// `hint`; returns the decoded text on success.
    fn detect(&mut self, crop: &FrameBuffer, hint: &mut dyn FnMut(ResultPoint)) -> Option<String>;
}

/// Sent from the worker to the render thread.
#[derive(Debug)]
pub enum DecodeEvent {
    Decoded { text: String, image: DecodedImage },
}

pub struct DecodeWorker {
    frames: Option<SyncSender<FrameBuffer>>,
    events: Receiver<DecodeEvent>,
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl DecodeWorker {
    /// Start the worker thread.
    pub fn spawn(detector: impl Detector, sink: MarkerSink) -> Result<Self, Error> {
        // one frame in flight; anything more is dropped at submit
        let (frame_tx, frame_rx) = mpsc::sync_channel::<FrameBuffer>(1);
        let (event_tx, event_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(false));

        let handle = {
            let stop = Arc::clone(&stop);
            let paused = Arc::clone(&paused);
            thread::Builder::new()
                .name("decode".into())
                .spawn(move || run_decode_loop(detector, sink, frame_rx, event_tx, stop, paused))
                .map_err(Error::WorkerSpawn)?
        };
        log::info!("Decode worker started");

        Ok(Self {
            frames: Some(frame_tx),
            events: event_rx,
            stop,
            paused,
            dropped: Arc::new(AtomicU64::new(0)),
            handle: Some(handle),
        })
    }

    /// Offer a crop to the worker. Returns false if it was dropped because the
    /// worker is busy, paused after a success, or stopped.
    pub fn submit(&self, crop: FrameBuffer) -> bool {
        if self.paused.load(Ordering::Acquire) {
            return false;
        }
        let Some(tx) = &self.frames else { return false };
        match tx.try_send(crop) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Next event, if one is waiting.
    pub fn try_event(&self) -> Option<DecodeEvent> {
        self.events.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<DecodeEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Hand an event to the overlay on the render thread. Returns whether a
    /// result is now displayed.
    ///
    /// A result the overlay refuses leaves it scanning, so the worker is
    /// resumed rather than staying paused until the next reset.
    pub fn apply_event(&self, event: DecodeEvent, overlay: &mut ViewfinderOverlay, now: Instant) -> bool {
        match event {
            DecodeEvent::Decoded { text, image } => {
                if overlay.on_decode_success(image, now) {
                    log::info!("Showing result {text:?}");
                    true
                } else {
                    log::debug!("Result {text:?} not shown, detection resumes");
                    self.resume();
                    false
                }
            }
        }
    }

    /// The worker pauses itself after a success; call when scanning resumes.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Crops dropped because the worker was still busy.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the thread and wait for it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.frames = None; // disconnects the worker's receiver
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Decode worker panicked");
            }
            log::info!("Decode worker stopped ({} frames dropped)", self.dropped_frames());
        }
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_decode_loop(
    mut detector: impl Detector,
    sink: MarkerSink,
    frames: Receiver<FrameBuffer>,
    events: mpsc::Sender<DecodeEvent>,
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Acquire) {
        let crop = match frames.recv_timeout(POLL_INTERVAL) {
            Ok(crop) => crop,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        // a crop queued just before a success is stale
        if paused.load(Ordering::Acquire) {
            continue;
        }

        let decoded = detector.detect(&crop, &mut |p| sink.add_point(p));
        if let Some(text) = decoded {
            log::info!("Decoded: {text}");
            paused.store(true, Ordering::Release);
            let image = DecodedImage::with_release(crop.to_rgba_image(), || {
                log::debug!("Decoded frame released");
            });
            if events.send(DecodeEvent::Decoded { text, image }).is_err() {
                break; // render side is gone
            }
        }
    }
}

/// Cell size for [`ContrastHintDetector`], preview pixels.
const HINT_CELL: usize = 16;
/// Minimum luma spread in a cell for it to count as a hint.
const HINT_MIN_CONTRAST: u8 = 96;

/// Emits hints at the highest-contrast cells of the crop. Never decodes.
/// Visual: yellow dots gather on sharp dark/light edges (printed codes).
#[derive(Debug, Clone)]
pub struct ContrastHintDetector {
    max_hints: usize,
}

impl ContrastHintDetector {
    pub fn new(max_hints: usize) -> Self {
        Self { max_hints }
    }
}

impl Default for ContrastHintDetector {
    fn default() -> Self {
        Self::new(6)
    }
}

#[inline]
fn luma(px: u32) -> u8 {
    let r = (px >> 16) & 0xFF;
    let g = (px >> 8) & 0xFF;
    let b = px & 0xFF;
    ((r * 299 + g * 587 + b * 114) / 1000) as u8
}

impl Detector for ContrastHintDetector {
    fn detect(&mut self, crop: &FrameBuffer, hint: &mut dyn FnMut(ResultPoint)) -> Option<String> {
        let mut cells = Vec::new();
        for cy in (0..crop.height / HINT_CELL).map(|c| c * HINT_CELL) {
            for cx in (0..crop.width / HINT_CELL).map(|c| c * HINT_CELL) {
                let (mut lo, mut hi) = (u8::MAX, u8::MIN);
                for y in cy..cy + HINT_CELL {
                    for x in cx..cx + HINT_CELL {
                        let l = luma(crop.get(x, y));
                        lo = lo.min(l);
                        hi = hi.max(l);
                    }
                }
                let contrast = hi - lo;
                if contrast >= HINT_MIN_CONTRAST {
                    cells.push((contrast, cx, cy));
                }
            }
        }

        cells.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        let half = HINT_CELL as f32 / 2.0;
        for &(_, cx, cy) in cells.iter().take(self.max_hints) {
            hint(ResultPoint::with_module_size(cx as f32 + half, cy as f32 + half, half));
        }
        None
    }
}
