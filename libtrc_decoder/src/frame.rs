use super::constants::{MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND};
use super::trace_line::TraceTokens;

/// Format a millisecond time as `hour:minute:second:millisecond`.
///
/// The time is truncated to an integer first and every stage uses truncating division,
/// so hours are not wrapped at 24.
pub fn format_time_ms(time_ms: f64) -> String {
    let total = time_ms as i64;
    let hour = total / MS_PER_HOUR;
    let mut rem = total % MS_PER_HOUR;
    let minute = rem / MS_PER_MINUTE;
    rem %= MS_PER_MINUTE;
    let second = rem / MS_PER_SECOND;
    let ms = rem % MS_PER_SECOND;
    format!("{hour}:{minute}:{second}:{ms}")
}

/// CanFrame is a single frame recovered from one data line of a trace.
///
/// Everything except the absolute time is fixed at construction. The absolute time
/// starts out equal to the relative offset and can only be changed through
/// [`CanFrame::set_time_ms`], which also refreshes the formatted time string.
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    sequence_number: u64,
    time_offset: f64,
    identifier: u32,
    declared_length: usize,
    payload: Vec<u8>,
    time_ms: f64,
    time_string: String,
}

impl CanFrame {
    /// Construct a frame with its absolute time defaulted to the relative offset
    pub fn new(
        sequence_number: u64,
        time_offset: f64,
        identifier: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            sequence_number,
            time_offset,
            identifier,
            declared_length: payload.len(),
            payload,
            time_ms: time_offset,
            time_string: format_time_ms(time_offset),
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    pub fn declared_length(&self) -> usize {
        self.declared_length
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn time_string(&self) -> &str {
        &self.time_string
    }

    /// Overwrite the absolute time, keeping the formatted string in step
    pub fn set_time_ms(&mut self, time_ms: f64) {
        self.time_ms = time_ms;
        self.time_string = format_time_ms(time_ms);
    }

    /// Identifier as lowercase hex text with a `0x` prefix
    pub fn identifier_hex(&self) -> String {
        format!("{:#x}", self.identifier)
    }

    /// Payload as space separated, two digit uppercase hex bytes
    pub fn payload_hex(&self) -> String {
        self.payload
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl From<TraceTokens> for CanFrame {
    fn from(tokens: TraceTokens) -> Self {
        Self::new(
            tokens.sequence_number,
            tokens.time_offset,
            tokens.identifier,
            tokens.payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time_ms(0.0), "0:0:0:0");
        assert_eq!(format_time_ms(1000.0), "0:0:1:0");
        // 1h 2m 3s 456ms plus a fraction that must be truncated
        assert_eq!(format_time_ms(3_723_456.9), "1:2:3:456");
        assert_eq!(format_time_ms(25.0 * 3_600_000.0), "25:0:0:0");
    }

    #[test]
    fn test_time_string_follows_time() {
        let mut frame = CanFrame::new(7, 12.5, 0x601, vec![0x0A, 0xFF]);
        assert_eq!(frame.time_ms(), 12.5);
        assert_eq!(frame.time_string(), "0:0:0:12");
        assert_eq!(frame.declared_length(), 2);

        frame.set_time_ms(61_001.0);
        assert_eq!(frame.time_ms(), 61_001.0);
        assert_eq!(frame.time_string(), "0:1:1:1");
        // Nothing else moves
        assert_eq!(frame.time_offset(), 12.5);
        assert_eq!(frame.sequence_number(), 7);
    }

    #[test]
    fn test_hex_text() {
        let frame = CanFrame::new(1, 0.0, 0x60E, vec![0x0A, 0x00, 0xFF]);
        assert_eq!(frame.identifier_hex(), "0x60e");
        assert_eq!(frame.payload_hex(), "0A 00 FF");
    }
}
