use std::path::PathBuf;
use thiserror::Error;

use super::constants::MIN_TOKENS_PER_LINE;
use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("Trace line has {0} tokens; expected at least {min}", min=MIN_TOKENS_PER_LINE)]
    TooFewTokens(usize),
    #[error("Could not parse sequence number from token {0:?}")]
    BadSequence(String),
    #[error("Could not parse time offset from token {0:?}")]
    BadOffset(String),
    #[error("Could not parse hex identifier from token {0:?}")]
    BadIdentifier(String),
    #[error("Could not parse declared length from token {0:?}")]
    BadLength(String),
    #[error("Could not parse payload byte from token {0:?}")]
    BadPayloadByte(String),
    #[error("Declared length {declared} exceeds the {available} payload tokens on the line")]
    PayloadTruncated { declared: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum TableWriterError {
    #[error("TableWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Could not open trace because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Reading trace failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Trace decoding failed due to TableWriter error: {0}")]
    WriterError(#[from] TableWriterError),
}

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("Could not open carrier log because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Carrier log failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Splitter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Splitter was given a table {0:?} without a header row")]
    MissingHeader(PathBuf),
    #[error("Splitter was given a table whose header has {0} columns; expected at least {1}")]
    BadFileFormat(usize, usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Trace path {0:?} has no file name to derive an output name from")]
    BadTraceName(PathBuf),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Trace error: {0}")]
    TraceError(#[from] TraceError),
    #[error("Processor failed due to TableWriter error: {0}")]
    WriterError(#[from] TableWriterError),
    #[error("Processor failed due to carrier log error: {0}")]
    CarrierError(#[from] CarrierError),
    #[error("Processor failed due to Splitter error: {0}")]
    SplitError(#[from] SplitError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
