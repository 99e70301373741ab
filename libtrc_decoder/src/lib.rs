//! # trc_decoder
//!
//! trc_decoder turns PCAN-style `.trc` bus traces recorded on a vehicle data acquisition
//! channel into plain tables of physical signals. It rebuilds an absolute clock for every
//! frame from the periodic time frames broadcast on the bus, decodes the inertial/GNSS
//! messages into scaled values, and writes one wide CSV table per trace.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see the
//! [Rust docs](https://www.rust-lang.org/tools/install) to install the tool chain.
//!
//! To build and install the CLI use `cargo install --path ./trc_decoder_cli` from the
//! top level repository. The binary is installed to your cargo install location
//! (typically `~/.cargo/bin/`).
//!
//! ## Configuration
//!
//! The decoder is driven by a YAML configuration file. A template can be made with
//! `trc_decoder_cli -p config.yml new`. The format is:
//!
//! ```yml
//! jobs:
//!   - trace_path: /data/4A-30-15-A-1-H.trc
//!     carrier_path: /data/4A-30-15-A-1-H.txt
//! output_path: null
//! split_tables: false
//! correct_brake_light: false
//! n_threads: 1
//! ```
//!
//! - `jobs`: The traces to decode. Each may name a carrier (position/speed) log which is
//! paired with the decoded frames on absolute time.
//! - `output_path`: Directory for the output tables. If `null`, tables are written next
//! to each trace.
//! - `split_tables`: Also write one narrow table per signal group to
//! `<output>/split/<trace name>/`.
//! - `correct_brake_light`: Retime brake-light frames (`0x570`) from their own embedded
//! clock after decoding.
//! - `n_threads`: The number of parallel workers to divide the jobs amongst. Must be at
//! least 1.
//!
//! ## Time reconstruction
//!
//! Trace lines only carry an offset relative to the start of the capture. Frames with
//! identifier `0x600` carry the absolute time of day. The first such frame fixes the
//! time of every frame before it; each later frame is timed from the nearest preceding
//! `0x600` frame. Traces without any `0x600` frame keep their relative offsets.
//!
//! ## Output
//!
//! The wide table has the columns
//!
//! ```text
//! MessageNumber, TimeOffset, MessageID(hex), Length, Payload(hex), TimeMs, TimeString,
//! PosLon, PosLat, Altitude, Speed2D, AngAccelX, AngAccelY, AngAccelZ, VelForward, ...
//! ```
//!
//! Each row carries values only for the signal group of its own frame; every other
//! signal column reads `N/A`. Rows are written as they are decoded, so rows that precede
//! the first `0x600` frame show their relative time. Times and signal values are always
//! written with a decimal point (`10.0`, `-1.0`, `0.0`).
//!
//! A log file `trc_decoder.log` is written next to where the CLI is run. Malformed trace
//! lines are reported there with their line number and text.
pub mod carrier_log;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod payload;
pub mod process;
pub mod session;
pub mod signal_table;
pub mod splitter;
pub mod table_writer;
pub mod time_sync;
pub mod trace_decoder;
pub mod trace_line;
pub mod worker_status;
