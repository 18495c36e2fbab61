//! Process-spawning engine adapter
//!
//! Runs an external simulator command once per (crop, year, scenario). The
//! scenario weather is staged through [`WeatherStage`]; the command is
//! expected to print its daily state series as CSV (`DAY,TWSO`) on stdout.

use std::ffi::OsString;
use std::process::Command;
use tracing::{debug, warn};

use super::{CropEndType, DailyState, EngineError, EngineResult, SimulationEngine, WeatherStage};
use crate::calendar::CropCalendarEntry;
use crate::WeatherScenario;

/// Longest stderr tail carried into an error message.
const STDERR_TAIL: usize = 1024;

/// An engine backed by an external simulator command.
pub struct ProcessEngine {
    program: OsString,
    extra_args: Vec<OsString>,
}

impl ProcessEngine {
    /// Create an adapter spawning `program` for each run.
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append a fixed argument passed before the per-run arguments.
    pub fn with_arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Last [`STDERR_TAIL`] bytes of engine stderr, lossily decoded. The cut
    /// happens on the raw bytes, so a split multi-byte character at the head
    /// decodes to a replacement character instead of breaking the slice.
    fn stderr_tail(stderr: &[u8]) -> String {
        let start = stderr.len().saturating_sub(STDERR_TAIL);
        String::from_utf8_lossy(&stderr[start..]).into_owned()
    }

    fn parse_output(stdout: &[u8]) -> EngineResult<Vec<DailyState>> {
        let mut reader = csv::Reader::from_reader(stdout);
        let mut states = Vec::new();
        for record in reader.deserialize::<RawState>() {
            let raw = record.map_err(|e| EngineError::Parse(e.to_string()))?;
            states.push(DailyState {
                day: raw.day,
                storage_organ_weight: raw.twso,
            });
        }
        Ok(states)
    }
}

#[derive(serde::Deserialize)]
struct RawState {
    #[serde(rename = "DAY")]
    day: chrono::NaiveDate,
    #[serde(rename = "TWSO")]
    twso: f64,
}

impl SimulationEngine for ProcessEngine {
    fn run(
        &self,
        scenario: &WeatherScenario,
        entry: &CropCalendarEntry,
        end_type: CropEndType,
    ) -> EngineResult<Vec<DailyState>> {
        // Staged file is released whether the run succeeds or not.
        let stage = WeatherStage::create(scenario)?;

        debug!(
            crop = %entry.crop_name,
            variety = %entry.variety_name,
            weather_uuid = %scenario.id,
            "Spawning simulation engine"
        );

        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .arg("--weather")
            .arg(stage.path())
            .arg("--crop")
            .arg(&entry.crop_name)
            .arg("--variety")
            .arg(&entry.variety_name)
            .arg("--sowing")
            .arg(entry.sowing_date.to_string())
            .arg("--harvest")
            .arg(entry.harvest_date.to_string())
            .arg("--end-type")
            .arg(end_type.to_string())
            .output()
            .map_err(|e| EngineError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = Self::stderr_tail(&output.stderr);
            warn!(
                crop = %entry.crop_name,
                weather_uuid = %scenario.id,
                status = %output.status,
                "Engine run failed"
            );
            return Err(EngineError::Engine {
                status: output.status.to_string(),
                stderr,
            });
        }

        Self::parse_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_output() {
        let stdout = b"DAY,TWSO\n2015-05-01,0.0\n2015-09-06,8123.4\n";
        let states = ProcessEngine::parse_output(stdout).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[1].day, NaiveDate::from_ymd_opt(2015, 9, 6).unwrap());
        assert_eq!(states[1].storage_organ_weight, 8123.4);
    }

    #[test]
    fn test_parse_output_empty_series() {
        let states = ProcessEngine::parse_output(b"DAY,TWSO\n").unwrap();
        assert!(states.is_empty());
    }

    #[test]
    fn test_parse_output_malformed() {
        assert!(ProcessEngine::parse_output(b"DAY,TWSO\nnot-a-date,xyz\n").is_err());
    }

    #[test]
    fn test_stderr_tail_short_output_untruncated() {
        assert_eq!(ProcessEngine::stderr_tail(b"boom"), "boom");
        assert_eq!(ProcessEngine::stderr_tail(b""), "");
    }

    #[test]
    fn test_stderr_tail_truncates_long_output() {
        let stderr = vec![b'x'; STDERR_TAIL + 500];
        let tail = ProcessEngine::stderr_tail(&stderr);
        assert_eq!(tail.len(), STDERR_TAIL);
    }

    #[test]
    fn test_stderr_tail_cut_inside_multibyte_character() {
        // 600 euro signs = 1800 bytes; the tail boundary lands mid-character
        let stderr = "\u{20ac}".repeat(600).into_bytes();
        let tail = ProcessEngine::stderr_tail(&stderr);
        assert_eq!(tail.chars().next(), Some(char::REPLACEMENT_CHARACTER));
        assert!(tail.chars().skip(1).all(|c| c == '\u{20ac}'));
    }

    #[test]
    fn test_stderr_tail_invalid_utf8_is_lossy() {
        let tail = ProcessEngine::stderr_tail(&[0xff, 0xfe, b'o', b'k']);
        assert!(tail.ends_with("ok"));
    }
}
