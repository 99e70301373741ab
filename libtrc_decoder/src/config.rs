use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{SPLIT_DIRECTORY_NAME, TABLE_EXTENSION};
use super::error::ConfigError;

/// A single trace to decode, optionally paired with a carrier log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceJob {
    pub trace_path: PathBuf,
    #[serde(default)]
    pub carrier_path: Option<PathBuf>,
}

impl TraceJob {
    pub fn new(trace_path: &Path) -> Self {
        Self {
            trace_path: trace_path.to_path_buf(),
            carrier_path: None,
        }
    }
}

/// Structure representing the application configuration. Contains pathing and processing options
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub jobs: Vec<TraceJob>,
    pub output_path: Option<PathBuf>,
    pub split_tables: bool,
    pub correct_brake_light: bool,
    pub n_threads: i32,
}

impl Default for Config {
    /// Generate a new Config object. There are no jobs and output goes next to each trace
    fn default() -> Self {
        Self {
            jobs: vec![],
            output_path: None,
            split_tables: false,
            correct_brake_light: false,
            n_threads: 1,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Directory that receives the tables for a trace
    fn get_output_directory(&self, trace_path: &Path) -> Result<PathBuf, ConfigError> {
        let dir = match &self.output_path {
            Some(p) => p.clone(),
            None => trace_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        if dir.as_os_str().is_empty() || dir.exists() {
            Ok(dir)
        } else {
            Err(ConfigError::BadFilePath(dir))
        }
    }

    /// Get the path to the wide table for a trace: `<output>/<trace stem>.csv`
    pub fn get_output_file(&self, trace_path: &Path) -> Result<PathBuf, ConfigError> {
        let stem = trace_path
            .file_stem()
            .ok_or_else(|| ConfigError::BadTraceName(trace_path.to_path_buf()))?;
        let file_name = format!("{}.{TABLE_EXTENSION}", stem.to_string_lossy());
        Ok(self.get_output_directory(trace_path)?.join(file_name))
    }

    /// Get the directory for the split tables of a trace, creating it if needed
    pub fn get_split_directory(&self, trace_path: &Path) -> Result<PathBuf, ConfigError> {
        let stem = trace_path
            .file_stem()
            .ok_or_else(|| ConfigError::BadTraceName(trace_path.to_path_buf()))?;
        let split_dir = self
            .get_output_directory(trace_path)?
            .join(SPLIT_DIRECTORY_NAME)
            .join(stem);
        std::fs::create_dir_all(&split_dir)?;
        Ok(split_dir)
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let yaml = "\
jobs:
  - trace_path: /data/run1.trc
    carrier_path: /data/run1_carrier.txt
  - trace_path: /data/run2.trc
output_path: null
split_tables: true
correct_brake_light: false
n_threads: 2
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(
            config.jobs[0].carrier_path,
            Some(PathBuf::from("/data/run1_carrier.txt"))
        );
        assert_eq!(config.jobs[1].carrier_path, None);
        assert!(config.split_tables);
        assert!(config.is_n_threads_valid());

        let template = serde_yaml::to_string(&Config::default()).unwrap();
        let reread: Config = serde_yaml::from_str(&template).unwrap();
        assert!(!reread.has_jobs());
        assert_eq!(reread.n_threads, 1);
    }

    #[test]
    fn test_output_paths() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("4A-30-15-A-1-H.trc");

        let mut config = Config::default();
        assert_eq!(
            config.get_output_file(&trace).unwrap(),
            dir.path().join("4A-30-15-A-1-H.csv")
        );

        let out = dir.path().join("out");
        config.output_path = Some(out.clone());
        assert!(matches!(
            config.get_output_file(&trace),
            Err(ConfigError::BadFilePath(_))
        ));
        std::fs::create_dir(&out).unwrap();
        assert_eq!(
            config.get_output_file(&trace).unwrap(),
            out.join("4A-30-15-A-1-H.csv")
        );
        let split = config.get_split_directory(&trace).unwrap();
        assert_eq!(split, out.join("split").join("4A-30-15-A-1-H"));
        assert!(split.exists());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(
            Config::read_config_file(Path::new("/no/such/config.yml")),
            Err(ConfigError::BadFilePath(_))
        ));
    }
}
