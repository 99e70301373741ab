use std::borrow::Cow;
use std::io::{BufRead, Write};

use super::constants::BRAKE_LIGHT_IDENTIFIER;
use super::error::{LineError, TraceError};
use super::frame::CanFrame;
use super::signal_table::{SignalRow, SignalTable};
use super::table_writer::TableWriter;
use super::time_sync::{brake_light_time_ms, SyncEvent, TimeSynchronizer};
use super::trace_line::{classify_line, tokenize, LineClass};

/// Counters describing one pass over a trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub lines_malformed: usize,
    pub frames_accepted: usize,
    pub anchors_seen: usize,
    pub frames_backfilled: usize,
}

/// The result of accepting one line: the stored frame and its signal values
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow<'a> {
    pub frame: &'a CanFrame,
    pub signals: SignalRow,
    pub sync: SyncEvent,
}

/// TraceDecoder turns the lines of a trace into frames and table rows.
///
/// Every accepted frame is kept, in trace order, until the decoder is dropped; the first
/// anchor frame needs to rewrite the times of everything before it.
#[derive(Debug, Clone)]
pub struct TraceDecoder {
    table: &'static SignalTable,
    sync: TimeSynchronizer,
    frames: Vec<CanFrame>,
    summary: DecodeSummary,
}

impl Default for TraceDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceDecoder {
    pub fn new() -> Self {
        Self {
            table: SignalTable::global(),
            sync: TimeSynchronizer::default(),
            frames: Vec::new(),
            summary: DecodeSummary::default(),
        }
    }

    /// Decode a single physical line. `line_number` is 1-based.
    ///
    /// Returns `Ok(None)` for lines that are not data (header, comments, short lines) and
    /// an error for data lines that could not be parsed. Neither changes decoder state
    /// beyond the counters.
    pub fn decode_line(
        &mut self,
        line_number: usize,
        raw: &str,
    ) -> Result<Option<DecodedRow<'_>>, LineError> {
        self.summary.lines_read += 1;
        let data = match classify_line(line_number, raw) {
            LineClass::Data(data) => data,
            _ => {
                self.summary.lines_skipped += 1;
                return Ok(None);
            }
        };
        let tokens = match tokenize(data) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.summary.lines_malformed += 1;
                return Err(e);
            }
        };

        let mut frame = CanFrame::from(tokens);
        let sync = self.sync.synchronize(&mut frame, &mut self.frames);
        match sync {
            SyncEvent::FirstAnchor { backfilled } => {
                spdlog::info!(
                    "First anchor frame found on line {line_number}; backfilled {backfilled} earlier frames"
                );
                self.summary.anchors_seen += 1;
                self.summary.frames_backfilled += backfilled;
            }
            SyncEvent::Reanchored => self.summary.anchors_seen += 1,
            SyncEvent::Propagated | SyncEvent::Deferred => (),
        }

        let signals = self.table.decode_frame(&frame);
        self.frames.push(frame);
        self.summary.frames_accepted += 1;
        Ok(Some(DecodedRow {
            frame: &self.frames[self.frames.len() - 1],
            signals,
            sync,
        }))
    }

    /// Like [`TraceDecoder::decode_line`], but malformed lines are reported and skipped
    pub fn push_line(&mut self, line_number: usize, raw: &str) -> Option<DecodedRow<'_>> {
        match self.decode_line(line_number, raw) {
            Ok(row) => row,
            Err(e) => {
                spdlog::warn!("Skipping line {line_number}: {e}\n    {}", raw.trim());
                None
            }
        }
    }

    /// Decode a whole trace, streaming a row into the writer for every accepted line
    pub fn decode<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        writer: &mut TableWriter<W>,
    ) -> Result<DecodeSummary, TraceError> {
        self.decode_with_progress(reader, writer, |_| Ok(()))
    }

    /// Decode a whole trace, handing the size in bytes of every line read to `on_bytes`.
    ///
    /// An error from `on_bytes` stops the decode and is returned as is. Lines that are not
    /// valid UTF-8 are decoded with the invalid bytes replaced, so they fail (or are
    /// skipped) on their own like any other line.
    pub fn decode_with_progress<R, W, F, E>(
        &mut self,
        mut reader: R,
        writer: &mut TableWriter<W>,
        mut on_bytes: F,
    ) -> Result<DecodeSummary, E>
    where
        R: BufRead,
        W: Write,
        F: FnMut(u64) -> Result<(), E>,
        E: From<TraceError>,
    {
        let mut buffer: Vec<u8> = Vec::new();
        let mut line_number: usize = 0;
        loop {
            buffer.clear();
            let n_bytes = reader
                .read_until(b'\n', &mut buffer)
                .map_err(TraceError::from)?;
            if n_bytes == 0 {
                break;
            }
            line_number += 1;
            on_bytes(n_bytes as u64)?;

            let line = String::from_utf8_lossy(&buffer);
            if let Cow::Owned(_) = line {
                spdlog::warn!("Line {line_number} is not valid UTF-8; invalid bytes were replaced");
            }
            if let Some(row) = self.push_line(line_number, &line) {
                writer
                    .write_row(row.frame, &row.signals)
                    .map_err(TraceError::from)?;
            }
        }
        if !self.sync.is_anchored() {
            spdlog::warn!("Trace contained no anchor frames; times are relative offsets only");
        }
        Ok(self.summary.clone())
    }

    pub fn is_anchored(&self) -> bool {
        self.sync.is_anchored()
    }

    pub fn frames(&self) -> &[CanFrame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<CanFrame> {
        self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn summary(&self) -> &DecodeSummary {
        &self.summary
    }

    /// All frames with the given identifier, or None if there are none
    pub fn frames_with_identifier(&self, identifier: u32) -> Option<Vec<&CanFrame>> {
        let matches: Vec<&CanFrame> = self
            .frames
            .iter()
            .filter(|frame| frame.identifier() == identifier)
            .collect();
        if matches.is_empty() {
            None
        } else {
            Some(matches)
        }
    }

    /// Retime brake-light frames from their own payload clock.
    ///
    /// Brake-light frames carry their own time of day, so they are taken out of the
    /// anchor timeline. Frames with fewer than 4 payload bytes keep their time.
    /// Returns the number of frames that were retimed.
    pub fn apply_brake_light_timing(&mut self) -> usize {
        let count = match self.frames_with_identifier(BRAKE_LIGHT_IDENTIFIER) {
            Some(frames) => frames.len(),
            None => return 0,
        };
        let mut retimed = 0;
        for frame in self
            .frames
            .iter_mut()
            .filter(|frame| frame.identifier() == BRAKE_LIGHT_IDENTIFIER)
        {
            if let Some(time_ms) = brake_light_time_ms(frame.payload()) {
                frame.set_time_ms(time_ms);
                retimed += 1;
            }
        }
        spdlog::info!("Retimed {retimed} of {count} brake-light frames");
        retimed
    }
}
