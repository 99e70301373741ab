use super::constants::*;
use super::error::LineError;

/// What a physical line of a trace turned out to be.
///
/// Only `Data` lines are handed to the tokenizer; everything else is skipped without
/// a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    Blank,
    Comment,
    Header,
    Short,
    Data(&'a str),
}

/// Classify a raw line. `line_number` is 1-based.
pub fn classify_line(line_number: usize, raw: &str) -> LineClass<'_> {
    let line = raw.trim();
    if line.is_empty() {
        LineClass::Blank
    } else if line.starts_with(COMMENT_MARKER) {
        LineClass::Comment
    } else if line_number <= HEADER_LINE_COUNT {
        LineClass::Header
    } else if line.chars().count() <= MIN_DATA_LINE_LENGTH {
        LineClass::Short
    } else {
        LineClass::Data(line)
    }
}

/// The typed fields pulled out of a single data line.
///
/// Layout: `<seq>) <offset> <bus> <dir> <idHex> <reserved> <length> <byte0> ...`.
/// Bus, direction and the reserved column are not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceTokens {
    pub sequence_number: u64,
    pub time_offset: f64,
    pub identifier: u32,
    pub payload: Vec<u8>,
}

/// Split a trimmed data line on whitespace and parse the fields we care about.
pub fn tokenize(line: &str) -> Result<TraceTokens, LineError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS_PER_LINE {
        return Err(LineError::TooFewTokens(tokens.len()));
    }

    let seq_token = tokens[SEQUENCE_TOKEN];
    let sequence_number = seq_token
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .parse::<u64>()
        .map_err(|_| LineError::BadSequence(seq_token.to_string()))?;

    let offset_token = tokens[OFFSET_TOKEN];
    let time_offset = offset_token
        .parse::<f64>()
        .map_err(|_| LineError::BadOffset(offset_token.to_string()))?;

    let id_token = tokens[IDENTIFIER_TOKEN];
    let identifier = u32::from_str_radix(id_token.trim_start_matches("0x"), 16)
        .map_err(|_| LineError::BadIdentifier(id_token.to_string()))?;

    let length_token = tokens[LENGTH_TOKEN];
    let declared_length = length_token
        .parse::<usize>()
        .map_err(|_| LineError::BadLength(length_token.to_string()))?;

    let available = tokens.len() - PAYLOAD_TOKEN;
    if declared_length > available {
        return Err(LineError::PayloadTruncated {
            declared: declared_length,
            available,
        });
    }

    let payload = tokens[PAYLOAD_TOKEN..PAYLOAD_TOKEN + declared_length]
        .iter()
        .map(|tok| {
            u8::from_str_radix(tok, 16).map_err(|_| LineError::BadPayloadByte(tok.to_string()))
        })
        .collect::<Result<Vec<u8>, LineError>>()?;

    Ok(TraceTokens {
        sequence_number,
        time_offset,
        identifier,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHOR_LINE: &str = "3) 12.500 1 Rx 600 0 8 0A 00 00 00 64 00 00 00";

    #[test]
    fn test_tokenize_anchor_line() {
        let tokens = tokenize(ANCHOR_LINE).unwrap();
        assert_eq!(tokens.sequence_number, 3);
        assert_eq!(tokens.time_offset, 12.5);
        assert_eq!(tokens.identifier, 0x600);
        assert_eq!(
            tokens.payload,
            vec![0x0A, 0x00, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_payload_matches_declared_length() {
        // Trailing tokens past the declared length are ignored
        let tokens = tokenize("12) 1.0 1 Rx 0603 - 2 10 00 FF FF").unwrap();
        assert_eq!(tokens.payload, vec![0x10, 0x00]);

        let tokens = tokenize("13) 1.0 1 Rx 0603 - 0").unwrap();
        assert!(tokens.payload.is_empty());
    }

    #[test]
    fn test_declared_length_too_long() {
        assert_eq!(
            tokenize("5) 21.000 1 Rx 0607 - 8 01 02 03"),
            Err(LineError::PayloadTruncated {
                declared: 8,
                available: 3
            })
        );
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(
            tokenize("1) 1.0 1 Rx 600 0"),
            Err(LineError::TooFewTokens(6))
        );
        assert_eq!(
            tokenize("x) 1.0 1 Rx 600 0 1 00"),
            Err(LineError::BadSequence(String::from("x)")))
        );
        assert_eq!(
            tokenize("1) abc 1 Rx 600 0 1 00"),
            Err(LineError::BadOffset(String::from("abc")))
        );
        assert_eq!(
            tokenize("1) 1.0 1 Rx 6G0 0 1 00"),
            Err(LineError::BadIdentifier(String::from("6G0")))
        );
        assert_eq!(
            tokenize("1) 1.0 1 Rx 600 0 eight 00"),
            Err(LineError::BadLength(String::from("eight")))
        );
        assert_eq!(
            tokenize("1) 1.0 1 Rx 600 0 1 ZZ"),
            Err(LineError::BadPayloadByte(String::from("ZZ")))
        );
    }

    #[test]
    fn test_classify_line() {
        let data = "     1)        10.000 1  Rx         0601 -  8    40 42 0F 00 80 84 1E 00";
        assert_eq!(classify_line(1, data), LineClass::Header);
        assert_eq!(classify_line(20, data), LineClass::Header);
        assert_eq!(classify_line(21, data), LineClass::Data(data.trim()));
        assert_eq!(classify_line(30, "   "), LineClass::Blank);
        assert_eq!(classify_line(30, ";$FILEVERSION=1.3"), LineClass::Comment);
        assert_eq!(classify_line(30, "9) 41.0 1 Rx 601 - 1 00"), LineClass::Short);
        // Exactly forty characters is still too short
        let forty = "1) 1.0 1 Rx 601 - 7 00 00 00 00 00 00 00";
        assert_eq!(forty.len(), 40);
        assert_eq!(classify_line(30, forty), LineClass::Short);
    }
}
