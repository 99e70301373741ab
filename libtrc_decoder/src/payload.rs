use byteorder::{ByteOrder, LittleEndian};

/// How a field is laid out inside a payload. All formats are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    Unsigned16,
    #[default]
    Signed16,
    Signed32,
    Signed64,
}

impl PayloadFormat {
    /// Number of payload bytes consumed by the format
    pub fn width(&self) -> usize {
        match self {
            Self::Unsigned16 | Self::Signed16 => 2,
            Self::Signed32 => 4,
            Self::Signed64 => 8,
        }
    }
}

/// Read the raw integer at `offset`.
///
/// Returns None if the payload does not hold `offset + width` bytes.
pub fn read_raw(payload: &[u8], offset: usize, format: PayloadFormat) -> Option<i64> {
    let end = offset.checked_add(format.width())?;
    let bytes = payload.get(offset..end)?;
    let value = match format {
        PayloadFormat::Unsigned16 => LittleEndian::read_u16(bytes) as i64,
        PayloadFormat::Signed16 => LittleEndian::read_i16(bytes) as i64,
        PayloadFormat::Signed32 => LittleEndian::read_i32(bytes) as i64,
        PayloadFormat::Signed64 => LittleEndian::read_i64(bytes),
    };
    Some(value)
}

/// Decode a field into physical units.
///
/// A payload too short for the requested read yields 0.0 for every format.
pub fn decode(payload: &[u8], offset: usize, scale: f64, format: PayloadFormat) -> f64 {
    match read_raw(payload, offset, format) {
        Some(raw) => raw as f64 * scale,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed16() {
        assert_eq!(decode(&[0xFF, 0xFF], 0, 0.01, PayloadFormat::Signed16), -0.01);
        assert_eq!(decode(&[0xFF, 0xFF], 0, 1.0, PayloadFormat::default()), -1.0);
        assert_eq!(
            decode(&[0x00, 0x00, 0xE8, 0x03], 2, 1.0, PayloadFormat::Signed16),
            1000.0
        );
    }

    #[test]
    fn test_unsigned16_is_distinct() {
        assert_eq!(
            decode(&[0xFF, 0xFF], 0, 1.0, PayloadFormat::Unsigned16),
            65535.0
        );
        assert_eq!(read_raw(&[0x10, 0x27], 0, PayloadFormat::Unsigned16), Some(10_000));
    }

    #[test]
    fn test_wide_formats() {
        let payload = [0x40, 0x42, 0x0F, 0x00, 0x80, 0x84, 0x1E, 0x00];
        assert_eq!(read_raw(&payload, 0, PayloadFormat::Signed32), Some(1_000_000));
        assert_eq!(read_raw(&payload, 4, PayloadFormat::Signed32), Some(2_000_000));
        assert_eq!(
            read_raw(&[0xFE, 0xFF, 0xFF, 0xFF], 0, PayloadFormat::Signed32),
            Some(-2)
        );
        assert_eq!(
            read_raw(&[0xFF; 8], 0, PayloadFormat::Signed64),
            Some(-1)
        );
        assert_eq!(
            read_raw(&[0x01, 0, 0, 0, 0, 0, 0, 0x01], 0, PayloadFormat::Signed64),
            Some(0x0100_0000_0000_0001)
        );
    }

    #[test]
    fn test_short_payload_sentinel() {
        assert_eq!(decode(&[0x05], 0, 1.0, PayloadFormat::Signed16), 0.0);
        assert_eq!(decode(&[0x05, 0x00], 1, 1.0, PayloadFormat::Unsigned16), 0.0);
        assert_eq!(decode(&[0x05, 0x00, 0x00], 0, 1.0, PayloadFormat::Signed32), 0.0);
        assert_eq!(decode(&[0x01; 7], 0, 1.0, PayloadFormat::Signed64), 0.0);
        assert_eq!(read_raw(&[0x01; 8], usize::MAX, PayloadFormat::Signed16), None);
    }
}
