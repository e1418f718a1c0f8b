//! Drives a frame source through a detector set.

use std::time::{Duration, Instant};

use crate::frame::FrameSource;
use crate::kernel::SimilarityMatcher;
use crate::set::DetectorSet;
use crate::trace::{trace_event, trace_span};
use crate::util::SpeedScanResult;

/// Progress is reported every time this many percent of the stream is done.
const PROGRESS_STEP_PERCENT: u64 = 10;

/// Counters for a finished scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanReport {
    /// Frames read from the source.
    pub frames: u64,
    /// Index of the last frame the set has accepted.
    pub last_index: Option<u64>,
    /// Wall-clock time spent processing frames.
    pub elapsed: Duration,
}

impl ScanReport {
    /// Processing throughput in frames per second.
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Decides when a scan has advanced far enough to report progress.
#[derive(Debug)]
struct Progress {
    total: u64,
    done: u64,
    reported_percent: u64,
    window_started: Instant,
    window_frames: u64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Self {
            total,
            done: 0,
            reported_percent: 0,
            window_started: Instant::now(),
            window_frames: 0,
        }
    }

    /// Counts one frame. Returns the percentage to report, rounded down to
    /// a whole step, and the frame rate since the previous report.
    fn tick(&mut self) -> Option<(u64, f64)> {
        self.done += 1;
        self.window_frames += 1;
        if self.total == 0 {
            return None;
        }
        let percent = self.done * 100 / self.total;
        if percent < self.reported_percent + PROGRESS_STEP_PERCENT {
            return None;
        }
        self.reported_percent = percent - percent % PROGRESS_STEP_PERCENT;
        let window_secs = self.window_started.elapsed().as_secs_f64();
        let fps = if window_secs > 0.0 {
            self.window_frames as f64 / window_secs
        } else {
            0.0
        };
        self.window_started = Instant::now();
        self.window_frames = 0;
        Some((self.reported_percent, fps))
    }
}

/// Feeds every frame of `source` to `set`, in order, until the source ends.
///
/// A decode error from the source or an out-of-order frame index aborts the
/// scan. Detectors that never trigger are not an error here; that is decided
/// when the summary is built.
pub fn scan_frames<S, M>(source: S, set: &mut DetectorSet<M>) -> SpeedScanResult<ScanReport>
where
    S: FrameSource,
    M: SimilarityMatcher,
{
    let rate = source.frame_rate();
    let mut progress = source.frame_count().map(Progress::new);
    let _guard = trace_span!("scan_frames", detectors = set.len()).entered();

    let started = Instant::now();
    let frames_before = set.frames_processed();

    for frame in source {
        let frame = frame?;
        set.process_frame(frame.image().view(), frame.index())?;

        if let Some((percent, fps)) = progress.as_mut().and_then(Progress::tick) {
            trace_event!(
                "scan_progress",
                percent = percent,
                fps = fps,
                speed = fps / rate.as_f64(),
            );
        }
    }

    let report = ScanReport {
        frames: set.frames_processed() - frames_before,
        last_index: set.last_frame_index(),
        elapsed: started.elapsed(),
    };
    trace_event!(
        "scan_finished",
        frames = report.frames,
        fps = report.frames_per_second(),
        triggered = set.iter().filter(|detector| detector.triggered()).count(),
    );
    Ok(report)
}
