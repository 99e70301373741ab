use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use super::carrier_log::CarrierLog;
use super::config::{Config, TraceJob};
use super::error::{ProcessorError, TraceError};
use super::frame::format_time_ms;
use super::session::DecodeSession;
use super::splitter::split_table;
use super::table_writer::TableWriter;
use super::trace_decoder::{DecodeSummary, TraceDecoder};
use super::worker_status::{BarColor, WorkerStatus};

/// What processing a single trace produced
#[derive(Debug, Clone)]
pub struct TraceReport {
    pub trace_path: PathBuf,
    pub table_path: PathBuf,
    pub summary: DecodeSummary,
    pub split_paths: Vec<PathBuf>,
    pub carrier_points: usize,
}

/// What a worker did with its share of the jobs
#[derive(Debug, Clone, Default)]
pub struct SubsetReport {
    pub completed: Vec<TraceReport>,
    pub failed: Vec<(PathBuf, String)>,
}

fn trace_name(job: &TraceJob) -> String {
    job.trace_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Decode one trace into its wide table, then run the optional post-passes.
///
/// Progress is reported through `tx` as the fraction of the trace file consumed.
pub fn process_trace(
    config: &Config,
    job: &TraceJob,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<TraceReport, ProcessorError> {
    let name = trace_name(job);
    if !job.trace_path.exists() {
        return Err(TraceError::BadFilePath(job.trace_path.clone()).into());
    }
    let total_size = job.trace_path.metadata()?.len();
    spdlog::info!(
        "Decoding {} with total size: {}",
        job.trace_path.display(),
        human_bytes::human_bytes(total_size as f64)
    );

    let table_path = config.get_output_file(&job.trace_path)?;
    let mut writer = TableWriter::create(&table_path)?;
    let mut decoder = TraceDecoder::new();

    let flush_frac: f32 = 0.01;
    let flush_val = (total_size as f64 * flush_frac as f64) as u64;
    let mut count: u64 = 0;
    let mut progress: f32 = 0.0;
    tx.send(WorkerStatus::new(0.0, &name, *worker_id, BarColor::CYAN))?;

    let reader = BufReader::new(File::open(&job.trace_path)?);
    let summary = decoder.decode_with_progress(
        reader,
        &mut writer,
        |n_bytes| -> Result<(), ProcessorError> {
            count += n_bytes;
            if count > flush_val {
                count = 0;
                progress += flush_frac;
                tx.send(WorkerStatus::new(
                    progress.min(1.0),
                    &name,
                    *worker_id,
                    BarColor::CYAN,
                ))?;
            }
            Ok(())
        },
    )?;
    writer.close()?;
    spdlog::info!(
        "Accepted {} frames from {} lines ({} malformed, {} anchors)",
        summary.frames_accepted,
        summary.lines_read,
        summary.lines_malformed,
        summary.anchors_seen
    );
    tx.send(WorkerStatus::new(1.0, &name, *worker_id, BarColor::CYAN))?;

    if config.correct_brake_light {
        decoder.apply_brake_light_timing();
    }

    let mut carrier_points = 0;
    if let Some(carrier_path) = &job.carrier_path {
        tx.send(WorkerStatus::new(0.0, &name, *worker_id, BarColor::MAGENTA))?;
        let carrier = CarrierLog::read_file(carrier_path)?;
        carrier_points = carrier.len();
        let session = DecodeSession::new(decoder.into_frames(), carrier);
        match session.overlap_ms() {
            Some((start, end)) => spdlog::info!(
                "Carrier log {} overlaps the trace from {} to {} ({} timeline entries)",
                carrier_path.display(),
                format_time_ms(start),
                format_time_ms(end),
                session.timeline().len()
            ),
            None => spdlog::warn!(
                "Carrier log {} does not overlap the trace in time!",
                carrier_path.display()
            ),
        }
        tx.send(WorkerStatus::new(1.0, &name, *worker_id, BarColor::MAGENTA))?;
    }

    let mut split_paths = Vec::new();
    if config.split_tables {
        tx.send(WorkerStatus::new(0.0, &name, *worker_id, BarColor::GREEN))?;
        let split_dir = config.get_split_directory(&job.trace_path)?;
        split_paths = split_table(&table_path, &split_dir)?;
        tx.send(WorkerStatus::new(1.0, &name, *worker_id, BarColor::GREEN))?;
    }

    Ok(TraceReport {
        trace_path: job.trace_path.clone(),
        table_path,
        summary,
        split_paths,
        carrier_points,
    })
}

/// Process a subset of jobs.
///
/// A failing trace is logged and skipped; only a broken status channel stops the worker.
pub fn process_subset(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
    subset: Vec<TraceJob>,
) -> Result<SubsetReport, ProcessorError> {
    let mut report = SubsetReport::default();
    for job in subset {
        spdlog::info!("Processing trace {}...", job.trace_path.display());
        match process_trace(&config, &job, &tx, &worker_id) {
            Ok(trace_report) => {
                spdlog::info!("Finished processing trace {}.", job.trace_path.display());
                report.completed.push(trace_report);
            }
            Err(ProcessorError::SendError(e)) => return Err(ProcessorError::SendError(e)),
            Err(e) => {
                spdlog::error!("Failed to process trace {}: {e}", job.trace_path.display());
                tx.send(WorkerStatus::new(
                    1.0,
                    &trace_name(&job),
                    worker_id,
                    BarColor::RED,
                ))?;
                report.failed.push((job.trace_path.clone(), e.to_string()));
            }
        }
    }
    Ok(report)
}

/// Divide the jobs into a set of subsets (per thread/worker)
pub fn create_subsets(config: &Config) -> Vec<Vec<TraceJob>> {
    let mut subsets: Vec<Vec<TraceJob>> = vec![Vec::new(); config.n_threads.max(1) as usize];
    let n_subsets = subsets.len();

    for (idx, job) in config.jobs.iter().enumerate() {
        subsets[idx % n_subsets].push(job.clone())
    }

    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::mpsc;

    fn write_sample(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, include_str!("data/sample_trace.trc")).unwrap();
        path
    }

    #[test]
    fn test_create_subsets() {
        let mut config = Config::default();
        config.n_threads = 2;
        config.jobs = ["a.trc", "b.trc", "c.trc"]
            .iter()
            .map(|p| TraceJob::new(Path::new(p)))
            .collect();
        let subsets = create_subsets(&config);
        assert_eq!(subsets.len(), 2);
        assert_eq!(subsets[0].len(), 2);
        assert_eq!(subsets[1][0].trace_path, PathBuf::from("b.trc"));
    }

    #[test]
    fn test_process_trace_with_extras() {
        let dir = tempfile::tempdir().unwrap();
        let trace = write_sample(dir.path(), "sample.trc");
        let carrier = dir.path().join("carrier.txt");
        std::fs::write(&carrier, "0.0.0, 0.0, 1.0\n0.0.1, 1.0, 1.0\n").unwrap();

        let mut config = Config::default();
        config.split_tables = true;
        config.correct_brake_light = true;
        let job = TraceJob {
            trace_path: trace,
            carrier_path: Some(carrier),
        };
        let (tx, rx) = mpsc::channel();
        let report = process_trace(&config, &job, &tx, &0).unwrap();

        assert_eq!(report.table_path, dir.path().join("sample.csv"));
        assert_eq!(report.summary.frames_accepted, 7);
        assert_eq!(report.carrier_points, 2);
        assert_eq!(report.split_paths.len(), 14);
        let table = std::fs::read_to_string(&report.table_path).unwrap();
        assert_eq!(table.lines().count(), 8);

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        assert!(statuses.iter().any(|s| s.color == BarColor::MAGENTA));
        assert!(statuses.iter().all(|s| s.trace_name == "sample.trc"));
        assert_eq!(statuses.last().map(|s| s.color.clone()), Some(BarColor::GREEN));
    }

    #[test]
    fn test_failures_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_sample(dir.path(), "good.trc");
        let config = Config::default();
        let subset = vec![
            TraceJob::new(&dir.path().join("missing.trc")),
            TraceJob::new(&good),
        ];
        let (tx, rx) = mpsc::channel();
        let report = process_subset(config, tx, 0, subset).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.completed.len(), 1);
        assert!(dir.path().join("good.csv").exists());
        assert!(rx.try_iter().any(|s| s.color == BarColor::RED));
    }

    #[test]
    fn test_unanchored_trace_keeps_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("no_anchor.trc");
        let text: String = include_str!("data/sample_trace.trc")
            .lines()
            .filter(|line| !line.contains(" 0600 "))
            .map(|line| format!("{line}\n"))
            .collect();
        std::fs::write(&trace, text).unwrap();

        let (tx, rx) = mpsc::channel();
        let report = process_trace(&Config::default(), &TraceJob::new(&trace), &tx, &3).unwrap();
        assert_eq!(report.summary.anchors_seen, 0);
        assert_eq!(report.summary.frames_accepted, 5);

        let table = std::fs::read_to_string(&report.table_path).unwrap();
        let first: Vec<&str> = table.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(first[1], "10.0");
        assert_eq!(first[5], "10.0");

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        assert!(statuses.len() > 2);
        assert!(statuses.iter().all(|s| s.worker_id == 3));
        assert!(statuses
            .windows(2)
            .all(|pair| pair[0].progress <= pair[1].progress));
        assert_eq!(statuses.last().map(|s| s.progress), Some(1.0));
    }
}
