// Trace layout
pub const HEADER_LINE_COUNT: usize = 20; // Physical lines 1..=20 are the trace header
pub const MIN_DATA_LINE_LENGTH: usize = 40; // Trimmed lines this long or shorter are not data
pub const MIN_TOKENS_PER_LINE: usize = 7;
pub const COMMENT_MARKER: char = ';';

// Token positions within a data line
pub const SEQUENCE_TOKEN: usize = 0;
pub const OFFSET_TOKEN: usize = 1;
pub const IDENTIFIER_TOKEN: usize = 4;
pub const LENGTH_TOKEN: usize = 6;
pub const PAYLOAD_TOKEN: usize = 7;

// Special identifiers
pub const ANCHOR_IDENTIFIER: u32 = 0x600;
pub const BRAKE_LIGHT_IDENTIFIER: u32 = 0x570;

// Clock arithmetic
pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_SECOND: i64 = 1_000;
pub const ANCHOR_TICK_MS: i64 = 10; // Anchor frames count hundredths of a second

/// Every carrier log timestamp is shifted by this amount. Kept as found in the field data.
pub const CARRIER_TIME_OFFSET_MS: i64 = 17_000;

// Output table
pub const NOT_APPLICABLE: &str = "N/A";
pub const METADATA_COLUMNS: [&str; 7] = [
    "MessageNumber",
    "TimeOffset",
    "MessageID(hex)",
    "Length",
    "Payload(hex)",
    "TimeMs",
    "TimeString",
];
pub const TABLE_EXTENSION: &str = "csv";
pub const SPLIT_DIRECTORY_NAME: &str = "split";
