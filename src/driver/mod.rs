//! Shard-level sweep driver
//!
//! Drives one `(x1, x2)` shard end to end: resume check, table loading and
//! sanitization, inner-tuple enumeration, orchestration, and periodic
//! checkpointing. Execution is strictly sequential; sharding by `(x1, x2)` is
//! the unit of external parallelism, so no locks are taken.

pub mod grid;

pub use grid::InnerGrid;

use tracing::{info, warn};

use crate::config::SweepConfig;
use crate::engine::SimulationEngine;
use crate::orchestrator::{CropRunner, OrchestratorError};
use crate::results::{CheckpointError, ResultAccumulator, ShardCursor};
use crate::scenario::{AssembleError, ScenarioAssembler};
use crate::tables::{IntervalTable, TableError, TableStore, WeatherVariable};
use crate::ScenarioId;

/// Driver errors
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Table loading failed
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Scenario assembly failed
    #[error("assembly error: {0}")]
    Assemble(#[from] AssembleError),

    /// Orchestration failed
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    /// Checkpoint persistence failed
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Progress snapshot reported after each completed inner tuple.
#[derive(Debug, Clone, Copy)]
pub struct SweepProgress {
    /// Inner tuples fully processed so far
    pub completed_tuples: u64,
    /// Total inner tuples in the shard
    pub total_tuples: u64,
    /// Rows accumulated so far
    pub rows: u64,
}

type ProgressFn = Box<dyn Fn(SweepProgress)>;

/// Drives the combinatorial sweep for one shard.
pub struct SweepDriver<E> {
    config: SweepConfig,
    engine: E,
    progress: Option<ProgressFn>,
}

impl<E: SimulationEngine> SweepDriver<E> {
    /// Create a driver over `config` and `engine`.
    pub fn new(config: SweepConfig, engine: E) -> Self {
        Self {
            config,
            engine,
            progress: None,
        }
    }

    /// Attach a progress callback invoked after each completed tuple.
    pub fn with_progress<F: Fn(SweepProgress) + 'static>(mut self, f: F) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// The driver's configuration.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    fn report(&self, completed: u64, total: u64, rows: u64) {
        if let Some(progress) = &self.progress {
            progress(SweepProgress {
                completed_tuples: completed,
                total_tuples: total,
                rows,
            });
        }
    }

    /// Check whether a prior run already completed this shard; if so, return
    /// its rows without loading tables or invoking the engine.
    fn completed_run(&self, x1: usize, x2: usize) -> Option<ResultAccumulator> {
        let path = self.config.checkpoint_path(x1, x2);
        if !path.exists() {
            return None;
        }
        match ResultAccumulator::load(&path) {
            Ok(acc) if acc.len() as u64 == self.config.expected_total() => Some(acc),
            Ok(acc) => {
                info!(
                    rows = acc.len(),
                    expected = self.config.expected_total(),
                    "Existing checkpoint is incomplete"
                );
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read existing checkpoint");
                None
            }
        }
    }

    /// Load a consistent (cursor, checkpoint) pair for mid-sweep resume.
    /// Torn or mismatched state is discarded and the shard starts fresh.
    fn resume_point(&self, x1: usize, x2: usize) -> (ResultAccumulator, u64) {
        let checkpoint_path = self.config.checkpoint_path(x1, x2);
        let cursor_path = ShardCursor::path_for(&checkpoint_path);
        if !cursor_path.exists() {
            return (ResultAccumulator::new(), 0);
        }

        let cursor = match ShardCursor::load(&cursor_path) {
            Ok(c) if c.matches(x1, x2, self.config.resolution) => c,
            Ok(c) => {
                warn!(
                    cursor_x1 = c.x1,
                    cursor_x2 = c.x2,
                    cursor_resolution = c.resolution,
                    "Cursor belongs to different shard parameters, starting fresh"
                );
                return (ResultAccumulator::new(), 0);
            }
            Err(e) => {
                warn!(error = %e, "Unreadable cursor, starting fresh");
                return (ResultAccumulator::new(), 0);
            }
        };

        match ResultAccumulator::load(&checkpoint_path) {
            Ok(acc) if acc.len() as u64 == cursor.checkpoint_rows => {
                info!(
                    completed_tuples = cursor.completed_tuples,
                    rows = acc.len(),
                    "Resuming after last persisted tuple"
                );
                (acc, cursor.completed_tuples)
            }
            Ok(acc) => {
                warn!(
                    rows = acc.len(),
                    cursor_rows = cursor.checkpoint_rows,
                    "Checkpoint and cursor disagree, starting fresh"
                );
                (ResultAccumulator::new(), 0)
            }
            Err(e) => {
                warn!(error = %e, "Unreadable checkpoint alongside cursor, starting fresh");
                (ResultAccumulator::new(), 0)
            }
        }
    }

    /// Load and sanitize all six interval tables plus the low-reference
    /// series, once per shard.
    fn build_assembler(&self) -> DriverResult<ScenarioAssembler> {
        let store = TableStore::new(&self.config.interval_dir, &self.config.low_series_path);
        let rules = &self.config.sanitize_rules;
        let mut tables = Vec::with_capacity(6);
        for variable in WeatherVariable::ALL {
            let table = store.load(variable)?;
            tables.push(rules.sanitize(&table));
        }
        let tables: [IntervalTable; 6] = tables
            .try_into()
            .unwrap_or_else(|_| unreachable!("six variables yield six tables"));
        let low = store.load_low()?;
        Ok(ScenarioAssembler::new(tables, low)?)
    }

    /// Run the `(x1, x2)` shard to completion and return its accumulator.
    ///
    /// Idempotent: if a checkpoint with the full expected row count already
    /// exists, the shard is finished and no work is done. The final partial
    /// batch is NOT forced to disk here; callers persist the returned
    /// accumulator themselves.
    pub fn run_shard(&self, x1: usize, x2: usize) -> DriverResult<ResultAccumulator> {
        info!(x1, x2, resolution = self.config.resolution, "Compute weather scenarios");

        if let Some(acc) = self.completed_run(x1, x2) {
            info!(x1, x2, rows = acc.len(), "Finished");
            let total = self.config.inner_tuple_count();
            self.report(total, total, acc.len() as u64);
            return Ok(acc);
        }

        let (mut acc, skip_tuples) = self.resume_point(x1, x2);

        info!("Read weather files");
        let assembler = self.build_assembler()?;

        let runner = CropRunner::new(&self.engine, &self.config.calendar, self.config.years.clone());
        let checkpoint_path = self.config.checkpoint_path(x1, x2);
        let cursor_path = ShardCursor::path_for(&checkpoint_path);
        let total_tuples = self.config.inner_tuple_count();
        let interval = self.config.checkpoint_interval;

        for (idx, inner) in InnerGrid::new(self.config.resolution).enumerate() {
            let completed = idx as u64 + 1;
            if (idx as u64) < skip_tuples {
                continue;
            }

            let id = ScenarioId::from_shard(x1, x2, inner);
            let scenario = assembler.assemble(id)?;
            let rows = runner.run(&scenario)?;
            acc.extend(rows);

            if interval > 0 && !acc.is_empty() && acc.len() % interval == 0 {
                acc.save(&checkpoint_path)?;
                ShardCursor::new(
                    x1,
                    x2,
                    self.config.resolution,
                    completed,
                    acc.len() as u64,
                )
                .save(&cursor_path)?;
            }

            self.report(completed, total_tuples, acc.len() as u64);
        }

        info!(x1, x2, rows = acc.len(), "Shard sweep complete");
        Ok(acc)
    }
}
