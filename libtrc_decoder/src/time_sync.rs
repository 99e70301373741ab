use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;
use super::frame::CanFrame;

/// Absolute time carried by an anchor frame, in milliseconds.
///
/// Bytes 4..8 hold hundredths, seconds, minutes and hours. Returns 0 for payloads
/// shorter than 8 bytes.
pub fn anchor_time_ms(payload: &[u8]) -> f64 {
    if payload.len() < 8 {
        return 0.0;
    }
    let ms = payload[7] as i64 * MS_PER_HOUR
        + payload[6] as i64 * MS_PER_MINUTE
        + payload[5] as i64 * MS_PER_SECOND
        + payload[4] as i64 * ANCHOR_TICK_MS;
    ms as f64
}

/// Time embedded in a brake-light frame: hours, minutes, then a 16-bit millisecond count.
///
/// Returns None for payloads shorter than 4 bytes.
pub fn brake_light_time_ms(payload: &[u8]) -> Option<f64> {
    if payload.len() < 4 {
        return None;
    }
    let sub_minute = LittleEndian::read_u16(&payload[2..4]) as i64;
    let ms = payload[0] as i64 * MS_PER_HOUR + payload[1] as i64 * MS_PER_MINUTE + sub_minute;
    Some(ms as f64)
}

/// The most recent anchor frame's two clocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorReference {
    pub time_ms: f64,
    pub time_offset: f64,
}

impl AnchorReference {
    /// Absolute time of something seen at `time_offset` on the relative clock
    pub fn project(&self, time_offset: f64) -> f64 {
        self.time_ms + (time_offset - self.time_offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SyncState {
    #[default]
    Unanchored,
    Anchored(AnchorReference),
}

/// What happened to a frame passing through the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// First anchor of the trace; earlier frames were rewritten
    FirstAnchor { backfilled: usize },
    /// Any later anchor; only the reference moved
    Reanchored,
    /// Non-anchor frame timed from the last anchor
    Propagated,
    /// Non-anchor frame before any anchor; its time stays at the relative offset
    Deferred,
}

/// TimeSynchronizer ties the relative clock of a trace to the absolute clock broadcast
/// in anchor frames.
///
/// Once the first anchor is seen the synchronizer stays anchored for the rest of the
/// trace. Every later frame is timed against the nearest preceding anchor.
#[derive(Debug, Clone)]
pub struct TimeSynchronizer {
    anchor_identifier: u32,
    state: SyncState,
}

impl Default for TimeSynchronizer {
    fn default() -> Self {
        Self::new(ANCHOR_IDENTIFIER)
    }
}

impl TimeSynchronizer {
    pub fn new(anchor_identifier: u32) -> Self {
        Self {
            anchor_identifier,
            state: SyncState::Unanchored,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_anchored(&self) -> bool {
        matches!(self.state, SyncState::Anchored(_))
    }

    /// Assign an absolute time to `frame`.
    ///
    /// `history` is every frame accepted before this one. It is only written when
    /// `frame` is the first anchor of the trace.
    pub fn synchronize(&mut self, frame: &mut CanFrame, history: &mut [CanFrame]) -> SyncEvent {
        if frame.identifier() == self.anchor_identifier {
            frame.set_time_ms(anchor_time_ms(frame.payload()));
            let reference = AnchorReference {
                time_ms: frame.time_ms(),
                time_offset: frame.time_offset(),
            };
            let event = match self.state {
                SyncState::Unanchored => {
                    for past in history.iter_mut() {
                        past.set_time_ms(reference.project(past.time_offset()));
                    }
                    SyncEvent::FirstAnchor {
                        backfilled: history.len(),
                    }
                }
                SyncState::Anchored(_) => SyncEvent::Reanchored,
            };
            self.state = SyncState::Anchored(reference);
            event
        } else {
            match self.state {
                SyncState::Anchored(reference) => {
                    frame.set_time_ms(reference.project(frame.time_offset()));
                    SyncEvent::Propagated
                }
                SyncState::Unanchored => SyncEvent::Deferred,
            }
        }
    }
}
