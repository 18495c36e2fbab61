//! Scoped weather staging for engine invocations
//!
//! The external simulator reads its weather from a file. Each scenario is
//! staged to a named temporary file that lives exactly as long as the engine
//! call: the file is removed on every exit path (success, engine failure, or
//! panic) because cleanup rides on `Drop`, not on an explicit call.

use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{EngineError, EngineResult};
use crate::WeatherScenario;

/// A staged scenario weather file, removed when dropped.
pub struct WeatherStage {
    file: NamedTempFile,
}

impl WeatherStage {
    /// Stage `scenario` as a CSV of daily records in the system temp
    /// directory. The filename carries the full weather uuid, so staged files
    /// never collide across shards with distinct outer indices.
    pub fn create(scenario: &WeatherScenario) -> EngineResult<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!("weather_{}_", scenario.id))
            .suffix(".csv")
            .tempfile()
            .map_err(|e| EngineError::Staging(format!("failed to create staging file: {e}")))?;

        let mut writer = csv::Writer::from_writer(&file);
        for day in &scenario.days {
            writer
                .serialize(day)
                .map_err(|e| EngineError::Staging(format!("failed to write staging row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| EngineError::Staging(format!("failed to flush staging file: {e}")))?;
        drop(writer);

        debug!(
            weather_uuid = %scenario.id,
            path = %file.path().display(),
            days = scenario.days.len(),
            "Scenario weather staged"
        );
        Ok(Self { file })
    }

    /// Path of the staged file, valid until this stage is dropped.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
