use std::cmp::Ordering;

use super::carrier_log::{CarrierLog, CarrierPoint};
use super::frame::CanFrame;

/// A single entry of the combined timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEntry<'a> {
    Frame(&'a CanFrame),
    Carrier(&'a CarrierPoint),
}

impl TimelineEntry<'_> {
    pub fn time_ms(&self) -> f64 {
        match self {
            Self::Frame(frame) => frame.time_ms(),
            Self::Carrier(point) => point.time_ms as f64,
        }
    }
}

/// DecodeSession pairs the frames of a decoded trace with a carrier log.
///
/// Frames are sorted by absolute time on construction (stable, so frames sharing a
/// timestamp keep trace order).
#[derive(Debug, Clone, Default)]
pub struct DecodeSession {
    frames: Vec<CanFrame>,
    carrier: CarrierLog,
}

impl DecodeSession {
    pub fn new(mut frames: Vec<CanFrame>, carrier: CarrierLog) -> Self {
        frames.sort_by(|a, b| a.time_ms().total_cmp(&b.time_ms()));
        Self { frames, carrier }
    }

    pub fn frames(&self) -> &[CanFrame] {
        &self.frames
    }

    pub fn carrier(&self) -> &CarrierLog {
        &self.carrier
    }

    /// Both sources merged into one sequence ordered by absolute time. On ties frames
    /// come first.
    pub fn timeline(&self) -> Vec<TimelineEntry<'_>> {
        let mut points: Vec<&CarrierPoint> = self.carrier.points().iter().collect();
        points.sort_by_key(|p| p.time_ms);

        let mut merged = Vec::with_capacity(self.frames.len() + points.len());
        let mut frames = self.frames.iter().peekable();
        let mut points = points.into_iter().peekable();
        loop {
            let take_frame = match (frames.peek(), points.peek()) {
                (Some(f), Some(p)) => {
                    f.time_ms().total_cmp(&(p.time_ms as f64)) != Ordering::Greater
                }
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_frame {
                if let Some(frame) = frames.next() {
                    merged.push(TimelineEntry::Frame(frame));
                }
            } else if let Some(point) = points.next() {
                merged.push(TimelineEntry::Carrier(point));
            }
        }
        merged
    }

    /// The absolute time span covered by both sources, if they overlap at all
    pub fn overlap_ms(&self) -> Option<(f64, f64)> {
        let frame_start = self.frames.first()?.time_ms();
        let frame_end = self.frames.last()?.time_ms();
        let carrier_start = self.carrier.points().iter().map(|p| p.time_ms).min()? as f64;
        let carrier_end = self.carrier.points().iter().map(|p| p.time_ms).max()? as f64;
        let start = frame_start.max(carrier_start);
        let end = frame_end.min(carrier_end);
        if start <= end {
            Some((start, end))
        } else {
            None
        }
    }
}
