//! # trc_decoder_cli
//!
//! Part of the trc_decoder crate family.
//!
//! Command line application to decode `.trc` bus traces into signal tables.
//!
//! ## Use
//!
//! Make a template configuration with
//!
//! ```bash
//! trc_decoder_cli -p config.yml new
//! ```
//!
//! fill it out, and then run
//!
//! ```bash
//! trc_decoder_cli -p config.yml
//! ```
//!
//! Progress for each worker is shown on the terminal. Detailed messages from the decoder,
//! including every skipped trace line, go to `trc_decoder.log`.
use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;

use libtrc_decoder::config::Config;
use libtrc_decoder::error::ProcessorError;
use libtrc_decoder::process::{create_subsets, process_subset, SubsetReport};
use libtrc_decoder::worker_status::{BarColor, WorkerStatus};

const LOG_FILE: &str = "./trc_decoder.log";

fn make_template_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

/// Send the library's spdlog output to a log file
fn init_file_logging() -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_FILE))
            .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
                ),
            )))
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    spdlog::info!("Starting trc_decoder");
    Ok(())
}

fn bar_message(status: &WorkerStatus) -> String {
    let phase = match status.color {
        BarColor::CYAN => "Decoding",
        BarColor::MAGENTA => "Pairing",
        BarColor::GREEN => "Splitting",
        BarColor::RED => "Failed",
    };
    format!("Worker {} : {} {}", status.worker_id, phase, status.trace_name)
}

/// Apply every status waiting in the channel to the bars, remembering each worker's phase
fn drain_statuses(
    rx: &Receiver<WorkerStatus>,
    bars: &[Option<ProgressBar>],
    phases: &mut [BarColor],
) {
    for status in rx.try_iter() {
        if let Some(Some(pb)) = bars.get(status.worker_id) {
            pb.set_position((status.progress * 100.0) as u64);
            pb.set_message(bar_message(&status));
        }
        if let Some(phase) = phases.get_mut(status.worker_id) {
            *phase = status.color;
        }
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("trc_decoder_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        return;
    }
    log::set_max_level(log::LevelFilter::Info);
    if let Err(e) = init_file_logging() {
        log::warn!("Could not open log file {LOG_FILE}, decoder messages go to stdout: {e}");
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A configuration path is required!");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match make_template_config(&config_path) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Could not write template config: {e}"),
        }
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    if !config.is_n_threads_valid() {
        log::error!("n_threads must be at least 1, found {}", config.n_threads);
        return;
    }
    if !config.has_jobs() {
        log::error!("The config does not list any traces to decode!");
        return;
    }
    log::info!("Config successfully loaded.");
    log::info!("Traces: {}", config.jobs.len());
    match &config.output_path {
        Some(p) => log::info!("Output Path: {}", p.to_string_lossy()),
        None => log::info!("Output Path: next to each trace"),
    }
    log::info!("Split Tables: {}", config.split_tables);
    log::info!("Correct Brake Light: {}", config.correct_brake_light);
    log::info!("Number of Workers: {}", config.n_threads);

    // Spawn the workers!
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let mut workers: Vec<(usize, JoinHandle<Result<SubsetReport, ProcessorError>>)> = vec![];
    let mut bars: Vec<Option<ProgressBar>> = vec![];
    for (idx, subset) in create_subsets(&config).into_iter().enumerate() {
        // Dont make empty workers
        if subset.is_empty() {
            bars.push(None);
            continue;
        }
        let pb = pb_manager.add(ProgressBar::new(100));
        pb.set_style(style.clone());
        bars.push(Some(pb));
        let conf = config.clone();
        let worker_tx = tx.clone();
        workers.push((
            idx,
            std::thread::spawn(move || process_subset(conf, worker_tx, idx, subset)),
        ));
    }
    drop(tx);

    let mut phases = vec![BarColor::default(); bars.len()];
    loop {
        // No UI to drive us, so poll the status channel every so often
        std::thread::sleep(std::time::Duration::from_millis(250));
        drain_statuses(&rx, &bars, &mut phases);
        if workers.iter().all(|(_, handle)| handle.is_finished()) {
            break;
        }
    }
    // Workers may have sent more between the last poll and finishing
    drain_statuses(&rx, &bars, &mut phases);

    let mut n_failed = 0;
    for (idx, handle) in workers {
        match handle.join() {
            Ok(Ok(report)) => {
                for trace in report.completed.iter() {
                    log::info!(
                        "Decoded {} -> {} ({} frames)",
                        trace.trace_path.display(),
                        trace.table_path.display(),
                        trace.summary.frames_accepted
                    );
                }
                for (path, reason) in report.failed.iter() {
                    log::error!("Failed to decode {}: {reason}", path.display());
                }
                n_failed += report.failed.len();
            }
            Ok(Err(e)) => log::error!("Worker {idx} stopped with error: {e}"),
            Err(_) => log::error!("Failed to join worker {idx}!"),
        }
        if let Some(Some(pb)) = bars.get(idx) {
            if phases[idx] == BarColor::RED {
                pb.abandon();
            } else {
                pb.finish();
            }
        }
    }

    if n_failed > 0 {
        log::warn!("{n_failed} traces failed; check {LOG_FILE} for details.");
    }
    log::info!("Done.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_last_status() {
        let (tx, rx) = mpsc::channel();
        let bars = vec![None, Some(ProgressBar::hidden())];
        let mut phases = vec![BarColor::default(); 2];

        tx.send(WorkerStatus::new(0.5, "a.trc", 1, BarColor::CYAN)).unwrap();
        tx.send(WorkerStatus::new(1.0, "b.trc", 1, BarColor::RED)).unwrap();
        // Unknown workers are ignored
        tx.send(WorkerStatus::new(1.0, "c.trc", 7, BarColor::GREEN)).unwrap();
        drop(tx);

        drain_statuses(&rx, &bars, &mut phases);
        assert_eq!(phases, vec![BarColor::CYAN, BarColor::RED]);
        let pb = bars[1].as_ref().unwrap();
        assert_eq!(pb.position(), 100);
        assert_eq!(pb.message(), "Worker 1 : Failed b.trc");
    }
}
