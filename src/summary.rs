//! Timestamps and the final run summary.

use std::fmt;

use crate::frame::FrameRate;
use crate::kernel::SimilarityMatcher;
use crate::set::DetectorSet;
use crate::util::{SpeedScanError, SpeedScanResult};

/// Time offset into the video, in seconds.
///
/// `Display` renders the short `1h 1m 1.20s` form: hours appear only past
/// one hour and minutes only past one minute of remainder.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seconds = self.0;
        if seconds > 3600.0 {
            write!(f, "{}h ", (seconds / 3600.0).floor() as u64)?;
            seconds %= 3600.0;
        }
        if seconds > 60.0 {
            write!(f, "{}m ", (seconds / 60.0).floor() as u64)?;
            seconds %= 60.0;
        }
        write!(f, "{seconds:.2}s")
    }
}

/// Start, end and real-time duration of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub start: Timestamp,
    pub start_frame: u64,
    pub end: Timestamp,
    pub end_frame: u64,
    pub duration: Timestamp,
}

impl RunSummary {
    /// Summarizes a finished scan from its start and end detectors.
    ///
    /// Both detectors must have triggered; a run whose end precedes its
    /// start is rejected.
    pub fn from_set<M: SimilarityMatcher>(
        set: &DetectorSet<M>,
        start: &str,
        end: &str,
        rate: FrameRate,
    ) -> SpeedScanResult<Self> {
        let start_frame = trigger_frame(set, start)?;
        let end_frame = trigger_frame(set, end)?;
        Self::from_frames(start_frame, end_frame, rate)
    }

    /// Summarizes a run from its start and end frame indices.
    pub fn from_frames(start_frame: u64, end_frame: u64, rate: FrameRate) -> SpeedScanResult<Self> {
        if end_frame < start_frame {
            return Err(SpeedScanError::EndBeforeStart {
                start: start_frame,
                end: end_frame,
            });
        }
        Ok(Self {
            start: rate.timestamp(start_frame),
            start_frame,
            end: rate.timestamp(end_frame),
            end_frame,
            duration: rate.timestamp(end_frame - start_frame),
        })
    }
}

fn trigger_frame<M: SimilarityMatcher>(set: &DetectorSet<M>, name: &str) -> SpeedScanResult<u64> {
    let detector = set.get(name).ok_or_else(|| SpeedScanError::UnknownDetector {
        name: name.to_string(),
    })?;
    if detector.failure().is_some() {
        return Err(SpeedScanError::DetectorFailed {
            name: name.to_string(),
        });
    }
    detector
        .trigger_index()
        .ok_or_else(|| SpeedScanError::NotTriggered {
            name: name.to_string(),
        })
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run analysis:")?;
        writeln!(f, "\tStart: {} (frame {})", self.start, self.start_frame)?;
        writeln!(f, "\tEnd: {} (frame {})", self.end, self.end_frame)?;
        write!(f, "\tDuration RTA: {}", self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::{RunSummary, Timestamp};
    use crate::{FrameRate, SpeedScanError};

    #[test]
    fn pretty_print_splits_hours_and_minutes() {
        assert_eq!(Timestamp::from_seconds(3661.2).to_string(), "1h 1m 1.20s");
        assert_eq!(Timestamp::from_seconds(75.5).to_string(), "1m 15.50s");
        assert_eq!(Timestamp::from_seconds(5.0).to_string(), "5.00s");
        assert_eq!(Timestamp::from_seconds(7200.0 + 30.0).to_string(), "2h 30.00s");
    }

    #[test]
    fn exact_minute_stays_in_seconds() {
        assert_eq!(Timestamp::from_seconds(60.0).to_string(), "60.00s");
    }

    #[test]
    fn summary_from_frames() {
        let rate = FrameRate::from_fps(30).unwrap();
        let summary = RunSummary::from_frames(150, 1950, rate).unwrap();
        assert_eq!(summary.start.seconds(), 5.0);
        assert_eq!(summary.end.seconds(), 65.0);
        assert_eq!(summary.duration.seconds(), 60.0);
        assert_eq!(
            summary.to_string(),
            "Run analysis:\n\tStart: 5.00s (frame 150)\n\tEnd: 1m 5.00s (frame 1950)\n\tDuration RTA: 60.00s"
        );
    }

    #[test]
    fn end_before_start_is_rejected() {
        let rate = FrameRate::from_fps(60).unwrap();
        assert_eq!(
            RunSummary::from_frames(100, 40, rate).unwrap_err(),
            SpeedScanError::EndBeforeStart { start: 100, end: 40 }
        );
    }
}
