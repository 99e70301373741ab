use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::constants::{METADATA_COLUMNS, NOT_APPLICABLE, TABLE_EXTENSION};
use super::error::SplitError;
use super::signal_table::SignalTable;

fn is_empty_cell(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell == NOT_APPLICABLE
}

/// Split a wide table into one narrow table per signal group.
///
/// Each narrow table holds the metadata columns plus the group's own columns, and only
/// the rows in which at least one of the group's cells has a value. Returns the paths
/// of the tables written, in group order.
pub fn split_table(table_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, SplitError> {
    let contents = std::fs::read_to_string(table_path)?;
    let mut lines = contents.lines();
    let header: Vec<&str> = match lines.next() {
        Some(line) => line.split(',').collect(),
        None => return Err(SplitError::MissingHeader(table_path.to_path_buf())),
    };
    let n_meta = METADATA_COLUMNS.len();
    if header.len() < n_meta {
        return Err(SplitError::BadFileFormat(header.len(), n_meta));
    }
    let rows: Vec<Vec<&str>> = lines.map(|line| line.split(',').collect()).collect();

    let stem = table_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("table"));

    let table = SignalTable::global();
    let mut written = Vec::new();
    for (group, range) in table.groups().iter().zip(table.group_column_ranges()) {
        let columns = (n_meta + range.start)..(n_meta + range.end);
        if columns.end > header.len() {
            spdlog::warn!(
                "Group {} needs column {} but the table only has {}; skipping it",
                group.name,
                columns.end,
                header.len()
            );
            continue;
        }

        let out_path = output_dir.join(format!("{stem}_{}.{TABLE_EXTENSION}", group.name));
        let mut out = BufWriter::new(File::create(&out_path)?);
        let narrow_header: Vec<&str> = header[..n_meta]
            .iter()
            .chain(header[columns.clone()].iter())
            .copied()
            .collect();
        writeln!(out, "{}", narrow_header.join(","))?;

        let mut kept = 0;
        for row in rows.iter() {
            let group_cells = row.get(columns.clone()).unwrap_or(&[]);
            if group_cells.iter().all(|cell| is_empty_cell(cell)) {
                continue;
            }
            let narrow_row: Vec<&str> = row[..n_meta.min(row.len())]
                .iter()
                .chain(group_cells.iter())
                .copied()
                .collect();
            writeln!(out, "{}", narrow_row.join(","))?;
            kept += 1;
        }
        out.flush()?;
        spdlog::info!("Wrote {kept} rows to {}", out_path.display());
        written.push(out_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_writer::TableWriter;
    use crate::trace_decoder::TraceDecoder;

    #[test]
    fn test_split_sample() {
        let dir = tempfile::tempdir().unwrap();
        let wide = dir.path().join("sample.csv");
        let mut writer = TableWriter::create(&wide).unwrap();
        let mut decoder = TraceDecoder::new();
        decoder
            .decode(include_str!("data/sample_trace.trc").as_bytes(), &mut writer)
            .unwrap();
        writer.close().unwrap();

        let written = split_table(&wide, dir.path()).unwrap();
        assert_eq!(written.len(), SignalTable::global().groups().len());

        let accel = std::fs::read_to_string(dir.path().join("sample_accel.csv")).unwrap();
        let lines: Vec<&str> = accel.lines().collect();
        assert_eq!(
            lines[0],
            "MessageNumber,TimeOffset,MessageID(hex),Length,Payload(hex),TimeMs,TimeString,AccelX,AccelY,AccelZ"
        );
        // Only frame 4 carries acceleration
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("4,20.0,0x605,8,"));
        assert!(lines[1].ends_with(",1.0,-1.0,0.0"));

        // No altitude frames at all leaves just the header
        let altitude = std::fs::read_to_string(dir.path().join("sample_altitude.csv")).unwrap();
        assert_eq!(altitude.lines().count(), 1);
    }

    #[test]
    fn test_narrow_table_skips_missing_groups() {
        let dir = tempfile::tempdir().unwrap();
        let wide = dir.path().join("narrow.csv");
        std::fs::write(
            &wide,
            "MessageNumber,TimeOffset,MessageID(hex),Length,Payload(hex),TimeMs,TimeString,PosLon,PosLat,Altitude\n\
             1,10,0x601,8,00,997.5,0:0:0:997,0.2,0.1,N/A\n\
             2,11,0x602,8,00,998.5,0:0:0:998,N/A,N/A,\n",
        )
        .unwrap();
        let written = split_table(&wide, dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        let position = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(position.lines().count(), 2);
        let altitude = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(altitude.lines().count(), 1);
    }

    #[test]
    fn test_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let wide = dir.path().join("empty.csv");
        std::fs::write(&wide, "").unwrap();
        assert!(matches!(
            split_table(&wide, dir.path()),
            Err(SplitError::MissingHeader(_))
        ));
    }
}
