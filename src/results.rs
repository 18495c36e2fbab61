//! Result accumulation and checkpoint persistence
//!
//! The accumulator is the in-memory result table for one shard; the
//! checkpoint is its durable CSV snapshot, overwritten wholesale on each
//! periodic save. A progress cursor rides alongside the checkpoint so an
//! interrupted shard can restart after the last fully persisted tuple rather
//! than from scratch.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::SimulationResult;

/// Current cursor schema version
const CURSOR_SCHEMA_VERSION: &str = "1.0.0";

/// Checkpoint and cursor errors
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(String),

    /// Cursor (de)serialization error
    #[error("cursor serialization error: {0}")]
    Serialization(String),

    /// Cursor schema version mismatch
    #[error("cursor schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version
        expected: String,
        /// Found schema version
        found: String,
    },
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Ordered, append-only result table for one shard.
///
/// The unique key is `(crop, year, weather_uuid)`; duplicate appends are
/// skipped and counted rather than written twice.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    rows: Vec<SimulationResult>,
    seen: HashSet<(String, i32, String)>,
    duplicates_skipped: u64,
}

impl ResultAccumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows accumulated.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The accumulated rows, in append order.
    pub fn rows(&self) -> &[SimulationResult] {
        &self.rows
    }

    /// Duplicate appends skipped so far.
    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }

    /// Append one row, skipping it if its key was already written.
    pub fn push(&mut self, row: SimulationResult) {
        let key = row.key();
        if !self.seen.insert(key) {
            self.duplicates_skipped += 1;
            debug!(
                crop = %row.crop,
                year = row.year,
                weather_uuid = %row.weather_uuid,
                "Skipping duplicate result row"
            );
            return;
        }
        self.rows.push(row);
    }

    /// Append a batch of rows.
    pub fn extend(&mut self, rows: Vec<SimulationResult>) {
        for row in rows {
            self.push(row);
        }
    }

    /// Persist the accumulator as a checkpoint CSV at `path`.
    ///
    /// The write is atomic: rows land in a temp file in the target directory
    /// which is fsynced and renamed over the checkpoint, so a crash never
    /// leaves a torn checkpoint behind.
    pub fn save(&self, path: &Path) -> CheckpointResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CheckpointError::Io(e.to_string()))?;
        }
        let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| CheckpointError::Io(format!("failed to create temp file: {e}")))?;

        {
            let mut writer = csv::Writer::from_writer(&mut temp_file);
            for row in &self.rows {
                writer
                    .serialize(row)
                    .map_err(|e| CheckpointError::Csv(e.to_string()))?;
            }
            writer
                .flush()
                .map_err(|e| CheckpointError::Csv(e.to_string()))?;
        }

        temp_file
            .flush()
            .map_err(|e| CheckpointError::Io(format!("failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| CheckpointError::Io(format!("failed to sync temp file: {e}")))?;
        temp_file
            .persist(path)
            .map_err(|e| CheckpointError::Io(format!("failed to persist checkpoint: {e}")))?;

        // Make the rename durable as well
        if let Ok(dir) = std::fs::File::open(parent_dir) {
            let _ = dir.sync_all();
        }

        info!(
            path = %path.display(),
            rows = self.rows.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Load a previously saved checkpoint.
    pub fn load(path: &Path) -> CheckpointResult<Self> {
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| CheckpointError::Csv(e.to_string()))?;
        let mut acc = Self::new();
        for record in reader.deserialize::<SimulationResult>() {
            let row = record.map_err(|e| CheckpointError::Csv(e.to_string()))?;
            acc.push(row);
        }
        debug!(path = %path.display(), rows = acc.len(), "Checkpoint loaded");
        Ok(acc)
    }
}

/// Progress cursor persisted alongside a shard's checkpoint.
///
/// Records how many inner tuples have been fully appended to the persisted
/// checkpoint, so a restart can skip tuples strictly before that point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShardCursor {
    schema_version: String,
    /// Outer shard index selecting the irradiation column
    pub x1: usize,
    /// Outer shard index selecting the minimum-temperature column
    pub x2: usize,
    /// Inner sweep resolution the cursor was written under
    pub resolution: usize,
    /// Inner tuples fully contained in the persisted checkpoint
    pub completed_tuples: u64,
    /// Rows in the persisted checkpoint when the cursor was written
    pub checkpoint_rows: u64,
    updated_at: i64,
}

impl ShardCursor {
    /// Create a cursor for the `(x1, x2)` shard.
    pub fn new(
        x1: usize,
        x2: usize,
        resolution: usize,
        completed_tuples: u64,
        checkpoint_rows: u64,
    ) -> Self {
        Self {
            schema_version: CURSOR_SCHEMA_VERSION.to_string(),
            x1,
            x2,
            resolution,
            completed_tuples,
            checkpoint_rows,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The cursor path for a given checkpoint path.
    pub fn path_for(checkpoint_path: &Path) -> std::path::PathBuf {
        checkpoint_path.with_extension("progress.json")
    }

    /// Atomically persist the cursor next to its checkpoint.
    pub fn save(&self, path: &Path) -> CheckpointResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;

        let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent_dir).map_err(|e| CheckpointError::Io(e.to_string()))?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| CheckpointError::Io(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| CheckpointError::Io(format!("failed to write cursor: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| CheckpointError::Io(format!("failed to sync cursor: {e}")))?;
        temp_file
            .persist(path)
            .map_err(|e| CheckpointError::Io(format!("failed to persist cursor: {e}")))?;

        debug!(
            path = %path.display(),
            completed_tuples = self.completed_tuples,
            "Cursor saved"
        );
        Ok(())
    }

    /// Load a cursor, rejecting unknown schema versions.
    pub fn load(path: &Path) -> CheckpointResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| CheckpointError::Io(e.to_string()))?;
        let cursor: ShardCursor = serde_json::from_str(&contents)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        if cursor.schema_version != CURSOR_SCHEMA_VERSION {
            warn!(
                found = %cursor.schema_version,
                expected = CURSOR_SCHEMA_VERSION,
                "Cursor schema version mismatch"
            );
            return Err(CheckpointError::SchemaVersionMismatch {
                expected: CURSOR_SCHEMA_VERSION.to_string(),
                found: cursor.schema_version,
            });
        }
        Ok(cursor)
    }

    /// Whether this cursor belongs to the given shard parameters.
    pub fn matches(&self, x1: usize, x2: usize, resolution: usize) -> bool {
        self.x1 == x1 && self.x2 == x2 && self.resolution == resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(crop: &str, year: i32, uuid: &str) -> SimulationResult {
        SimulationResult {
            crop: crop.to_string(),
            year,
            yield_value: 4321.5,
            weather_uuid: uuid.to_string(),
        }
    }

    #[test]
    fn test_accumulator_dedup() {
        let mut acc = ResultAccumulator::new();
        acc.push(row("barley", 2015, "0_0_0_0_0_0"));
        acc.push(row("barley", 2015, "0_0_0_0_0_0"));
        acc.push(row("barley", 2016, "0_0_0_0_0_0"));

        assert_eq!(acc.len(), 2);
        assert_eq!(acc.duplicates_skipped(), 1);
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yields_0_0.csv");

        let mut acc = ResultAccumulator::new();
        acc.push(row("barley", 2015, "0_0_0_0_0_0"));
        acc.push(row("soybean", 2017, "0_0_1_2_3_4"));
        acc.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("crop,year,yield_value,weather_uuid"));

        let loaded = ResultAccumulator::load(&path).unwrap();
        assert_eq!(loaded.rows(), acc.rows());
    }

    #[test]
    fn test_checkpoint_overwrite_semantics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yields_1_1.csv");

        let mut acc = ResultAccumulator::new();
        acc.push(row("barley", 2015, "1_1_0_0_0_0"));
        acc.save(&path).unwrap();
        acc.push(row("barley", 2016, "1_1_0_0_0_0"));
        acc.save(&path).unwrap();

        let loaded = ResultAccumulator::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_cursor_round_trip() {
        let dir = TempDir::new().unwrap();
        let checkpoint = dir.path().join("yields_3_4.csv");
        let cursor_path = ShardCursor::path_for(&checkpoint);
        assert_eq!(
            cursor_path.file_name().unwrap().to_string_lossy(),
            "yields_3_4.progress.json"
        );

        let cursor = ShardCursor::new(3, 4, 8, 200, 3000);
        cursor.save(&cursor_path).unwrap();

        let loaded = ShardCursor::load(&cursor_path).unwrap();
        assert_eq!(loaded.completed_tuples, 200);
        assert_eq!(loaded.checkpoint_rows, 3000);
        assert!(loaded.matches(3, 4, 8));
        assert!(!loaded.matches(3, 4, 2));
        assert!(!loaded.matches(0, 4, 8));
    }

    #[test]
    fn test_cursor_unknown_schema_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cursor.progress.json");
        let mut cursor = ShardCursor::new(0, 0, 8, 1, 15);
        cursor.schema_version = "9.0.0".to_string();
        cursor.save(&path).unwrap();

        assert!(matches!(
            ShardCursor::load(&path).unwrap_err(),
            CheckpointError::SchemaVersionMismatch { .. }
        ));
    }
}
