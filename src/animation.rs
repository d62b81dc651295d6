// Scan animation state machine.
// Visual: a line sweeps through the framing rectangle 5 px per tick and wraps
// back to the start edge; while a result is frozen the line stops.

use crate::types::{Orientation, Rect};

/// Pixels the scan line moves per tick.
pub const SCAN_LINE_STEP: i32 = 5;
/// Laser pulse, one entry per tick.
pub const SCANNER_ALPHA: [u8; 8] = [0, 64, 128, 192, 255, 192, 128, 64];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No valid framing rectangle seen yet.
    Uninitialized,
    Scanning,
    /// A frozen result is on screen; nothing animates.
    ResultDisplayed,
}

#[derive(Debug, Clone)]
pub struct ScanAnimation {
    state: ScanState,
    orientation: Orientation,
    sweep_start: i32, // top (portrait) or left (landscape) edge of the frame
    sweep_end: i32,   // bottom or right edge; reaching it wraps
    offset: i32,
    alpha_index: usize,
}

impl Default for ScanAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanAnimation {
    pub fn new() -> Self {
        Self {
            state: ScanState::Uninitialized,
            orientation: Orientation::Portrait,
            sweep_start: 0,
            sweep_end: 0,
            offset: 0,
            alpha_index: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Current scan-line position along the sweep axis (display pixels).
    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn sweep_bounds(&self) -> (i32, i32) {
        (self.sweep_start, self.sweep_end)
    }

    pub fn laser_alpha(&self) -> u8 {
        SCANNER_ALPHA[self.alpha_index]
    }

    /// Line up the sweep with a (new) framing rectangle.
    ///
    /// The first valid frame moves `Uninitialized -> Scanning`. Later frames
    /// only realign (offset back to the start edge) when the orientation
    /// flips or the sweep edges move. Returns true when it realigned.
    pub fn align(&mut self, frame: Rect, orientation: Orientation) -> bool {
        let (start, end) = if orientation.is_vertical() {
            (frame.top, frame.bottom)
        } else {
            (frame.left, frame.right)
        };

        let first = self.state == ScanState::Uninitialized;
        let changed = orientation != self.orientation
            || start != self.sweep_start
            || end != self.sweep_end;
        if !first && !changed {
            return false;
        }

        self.orientation = orientation;
        self.sweep_start = start;
        self.sweep_end = end;
        self.offset = start;
        if first {
            log::info!("Scan animation started ({orientation:?}, sweep {start}..{end})");
            self.state = ScanState::Scanning;
        } else {
            log::debug!("Sweep realigned ({orientation:?}, sweep {start}..{end})");
        }
        true
    }

    /// Advance one tick. Only moves while scanning.
    pub fn tick(&mut self) {
        if self.state != ScanState::Scanning {
            return;
        }
        self.offset += SCAN_LINE_STEP;
        if self.offset >= self.sweep_end {
            self.offset = self.sweep_start;
        }
        self.alpha_index = (self.alpha_index + 1) % SCANNER_ALPHA.len();
    }

    /// `Scanning -> ResultDisplayed`. Returns false from any other state.
    pub fn show_result(&mut self) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.state = ScanState::ResultDisplayed;
        true
    }

    /// Back to scanning with the line at the start edge.
    /// Stays `Uninitialized` if no frame was ever seen.
    pub fn resume(&mut self) {
        if self.state == ScanState::Uninitialized {
            return;
        }
        self.state = ScanState::Scanning;
        self.offset = self.sweep_start;
        self.alpha_index = 0;
    }
}
