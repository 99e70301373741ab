use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::constants::{METADATA_COLUMNS, NOT_APPLICABLE};
use super::error::TableWriterError;
use super::frame::CanFrame;
use super::signal_table::{SignalRow, SignalTable};

const DELIMITER: &str = ",";

/// Header of the wide table: the frame metadata followed by every signal field
pub fn table_header(table: &SignalTable) -> Vec<&'static str> {
    METADATA_COLUMNS
        .iter()
        .copied()
        .chain(table.column_names())
        .collect()
}

/// A thin buffered writer for the wide table.
///
/// Rows are appended as they are decoded. Real-valued cells always carry a decimal point
/// (`10.0`, not `10`). Signal cells that do not belong to the row's
/// frame are written as the not-applicable marker.
#[derive(Debug)]
pub struct TableWriter<W: Write> {
    sink: W,
    table: &'static SignalTable,
    path: Option<PathBuf>,
    rows_written: u64,
    first_time_ms: Option<f64>,
    last_time_ms: Option<f64>,
}

impl TableWriter<BufWriter<File>> {
    /// Create the table file at path and write the header
    pub fn create(path: &Path) -> Result<Self, TableWriterError> {
        let file = File::create(path)?;
        let mut writer = Self::from_writer(BufWriter::new(file))?;
        writer.path = Some(path.to_path_buf());
        Ok(writer)
    }
}

impl<W: Write> TableWriter<W> {
    /// Wrap any sink, writing the header immediately
    pub fn from_writer(mut sink: W) -> Result<Self, TableWriterError> {
        let table = SignalTable::global();
        writeln!(sink, "{}", table_header(table).join(DELIMITER))?;
        Ok(Self {
            sink,
            table,
            path: None,
            rows_written: 0,
            first_time_ms: None,
            last_time_ms: None,
        })
    }

    /// Append one row for a decoded frame
    pub fn write_row(
        &mut self,
        frame: &CanFrame,
        signals: &SignalRow,
    ) -> Result<(), TableWriterError> {
        let mut cells: Vec<String> = vec![
            frame.sequence_number().to_string(),
            format!("{:?}", frame.time_offset()),
            frame.identifier_hex(),
            frame.declared_length().to_string(),
            frame.payload_hex(),
            format!("{:?}", frame.time_ms()),
            frame.time_string().to_string(),
        ];
        cells.extend(signals.cells(self.table).map(|cell| match cell {
            Some(value) => format!("{value:?}"),
            None => String::from(NOT_APPLICABLE),
        }));
        writeln!(self.sink, "{}", cells.join(DELIMITER))?;

        if self.first_time_ms.is_none() {
            self.first_time_ms = Some(frame.time_ms());
        }
        self.last_time_ms = Some(frame.time_ms());
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush everything and hand back the sink
    pub fn close(mut self) -> Result<W, TableWriterError> {
        self.sink.flush()?;
        let target = match &self.path {
            Some(p) => p.display().to_string(),
            None => String::from("<memory>"),
        };
        match (self.first_time_ms, self.last_time_ms) {
            (Some(first), Some(last)) => spdlog::info!(
                "{} rows written to {}. Trace spans {:.3} seconds.",
                self.rows_written,
                target,
                (last - first) / 1000.0
            ),
            _ => spdlog::warn!("No rows were written to {}!", target),
        }
        Ok(self.sink)
    }
}
