use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::constants::*;
use super::error::CarrierError;
use super::frame::format_time_ms;

/// One sample of the carrier (position/speed) log
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierPoint {
    pub time_ms: i64,
    pub time_string: String,
    pub position: f64,
    pub speed: f64,
    pub position_integration: f64,
}

impl CarrierPoint {
    pub fn new(time_ms: i64, position: f64, speed: f64, position_integration: f64) -> Self {
        Self {
            time_ms,
            time_string: format_time_ms(time_ms as f64),
            position,
            speed,
            position_integration,
        }
    }
}

/// Parse `hour.minute.second` (or `hour:minute:second`) into milliseconds, including the
/// fixed carrier offset
fn parse_clock(text: &str) -> Option<Result<i64, std::num::ParseIntError>> {
    let parts: Vec<&str> = text.trim().split(['.', ':']).collect();
    if parts.len() < 3 {
        return None;
    }
    let parse = || -> Result<i64, std::num::ParseIntError> {
        let hour: i64 = parts[0].trim().parse()?;
        let minute: i64 = parts[1].trim().parse()?;
        let second: i64 = parts[2].trim().parse()?;
        Ok(hour * MS_PER_HOUR
            + minute * MS_PER_MINUTE
            + second * MS_PER_SECOND
            + CARRIER_TIME_OFFSET_MS)
    };
    Some(parse())
}

/// CarrierLog holds the samples of a position/speed log together with the position
/// integrated from speed.
///
/// The integration uses the trapezoid rule over consecutive samples, with speed in
/// position units per second and time in milliseconds. The first sample reports its raw
/// position; the running sum itself starts from zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarrierLog {
    points: Vec<CarrierPoint>,
}

impl CarrierLog {
    /// Read a carrier log from disk. The file is not modified.
    pub fn read_file(path: &Path) -> Result<Self, CarrierError> {
        if !path.exists() {
            return Err(CarrierError::BadFilePath(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, CarrierError> {
        let mut log = CarrierLog::default();
        let mut position_sum = 0.0;
        let mut previous: Option<(i64, f64)> = None; // (time_ms, speed)

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 3 {
                continue;
            }
            let time_ms = match parse_clock(fields[0]) {
                None => continue,
                Some(Ok(t)) => t,
                Some(Err(e)) => {
                    spdlog::warn!(
                        "Skipping carrier line {}: bad time {:?}: {e}",
                        idx + 1,
                        fields[0]
                    );
                    continue;
                }
            };
            let (position, speed) = match (
                fields[1].trim().parse::<f64>(),
                fields[2].trim().parse::<f64>(),
            ) {
                (Ok(p), Ok(s)) => (p, s),
                _ => {
                    spdlog::warn!(
                        "Skipping carrier line {}: bad number in {:?}",
                        idx + 1,
                        line
                    );
                    continue;
                }
            };

            let integration = match previous {
                None => position,
                Some((time_prev, speed_prev)) => {
                    let dt = (time_ms - time_prev) as f64;
                    position_sum += (speed + speed_prev) * dt / 2000.0;
                    position_sum
                }
            };
            log.points
                .push(CarrierPoint::new(time_ms, position, speed, integration));
            previous = Some((time_ms, speed));
        }
        Ok(log)
    }

    pub fn points(&self) -> &[CarrierPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CARRIER_LOG: &str = "\
13.02.14, 100.0, 2.0
13.02.15, 101.5, 4.0

bad line
13.02, 1.0, 1.0
13:02:17, 106.0, 0.0
";

    #[test]
    fn test_carrier_integration() {
        let log = CarrierLog::from_reader(CARRIER_LOG.as_bytes()).unwrap();
        assert_eq!(log.len(), 3);
        let points = log.points();

        let base = 13 * 3_600_000 + 2 * 60_000 + 14_000 + 17_000;
        assert_eq!(points[0].time_ms, base);
        assert_eq!(points[0].time_string, "13:2:31:0");
        assert_eq!(points[0].position_integration, 100.0);

        // (4 + 2) * 1000 / 2000
        assert_eq!(points[1].time_ms, base + 1000);
        assert_eq!(points[1].position_integration, 3.0);
        // (0 + 4) * 2000 / 2000
        assert_eq!(points[2].time_ms, base + 3000);
        assert_eq!(points[2].position_integration, 7.0);
        assert_eq!(points[2].position, 106.0);
    }

    #[test]
    fn test_bad_numbers_are_skipped() {
        let text = "1.2.3, x, 1.0\n1.2.x, 1.0, 1.0\n";
        let log = CarrierLog::from_reader(text.as_bytes()).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_read_file_leaves_input_alone() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0:0:1, 5.0, 1.0\n").unwrap();
        let log = CarrierLog::read_file(file.path()).unwrap();
        assert_eq!(log.points()[0].time_ms, 18_000);
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "0:0:1, 5.0, 1.0\n"
        );

        assert!(matches!(
            CarrierLog::read_file(Path::new("/definitely/not/here.txt")),
            Err(CarrierError::BadFilePath(_))
        ));
    }
}
