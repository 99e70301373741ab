/// The phase a worker is in, shown as the color of its progress bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BarColor {
    #[default]
    CYAN, // Decoding
    MAGENTA, // Pairing with a carrier log
    GREEN,   // Splitting tables
    RED,     // Failed
}

#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub trace_name: String,
    pub worker_id: usize,
    pub color: BarColor,
}

impl WorkerStatus {
    pub fn new(progress: f32, trace_name: &str, worker_id: usize, color: BarColor) -> Self {
        Self {
            progress,
            trace_name: trace_name.to_string(),
            worker_id,
            color,
        }
    }
}
