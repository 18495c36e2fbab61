//! Read-only loading of interval tables and the low-reference series

use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{TableError, TableResult, WeatherVariable};

/// A per-variable interval table: one daily series per discretization index.
///
/// Immutable after sanitization; shared read-only across all scenarios of a
/// shard. Column `i` holds the series for discretization index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTable {
    variable: WeatherVariable,
    columns: Vec<Vec<f64>>,
    day_count: usize,
}

impl IntervalTable {
    /// Build a table from pre-ordered columns. All columns must share a length.
    pub fn new(variable: WeatherVariable, columns: Vec<Vec<f64>>) -> Self {
        let day_count = columns.first().map(Vec::len).unwrap_or(0);
        debug_assert!(columns.iter().all(|c| c.len() == day_count));
        Self {
            variable,
            columns,
            day_count,
        }
    }

    /// The variable this table belongs to.
    pub fn variable(&self) -> WeatherVariable {
        self.variable
    }

    /// Number of discretization columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of calendar days per column.
    pub fn day_count(&self) -> usize {
        self.day_count
    }

    /// The daily series for discretization index `index`, if present.
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Apply `f` to every value of every column, returning a new table.
    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| col.iter().map(|v| f(*v)).collect())
            .collect();
        Self {
            variable: self.variable,
            columns,
            day_count: self.day_count,
        }
    }
}

/// The fixed low-reference series: day axis plus snow depth.
#[derive(Debug, Clone, PartialEq)]
pub struct LowSeries {
    /// Calendar day axis shared by all scenarios
    pub days: Vec<NaiveDate>,
    /// Snow depth per day
    pub snow_depth: Vec<f64>,
}

impl LowSeries {
    /// Number of calendar days.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

/// Loads interval tables and the low-reference series from a source directory.
pub struct TableStore {
    interval_dir: PathBuf,
    low_path: PathBuf,
}

impl TableStore {
    /// Create a store reading interval CSVs from `interval_dir` and the
    /// low-reference series from `low_path`.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(interval_dir: P, low_path: Q) -> Self {
        Self {
            interval_dir: interval_dir.into(),
            low_path: low_path.into(),
        }
    }

    fn table_path(&self, variable: WeatherVariable) -> PathBuf {
        self.interval_dir.join(format!("{}.csv", variable.file_stem()))
    }

    /// Load the interval table for one weather variable.
    ///
    /// Columns are keyed by the numeric suffix of their `<PREFIX>_<index>`
    /// header, so header order in the file does not matter.
    pub fn load(&self, variable: WeatherVariable) -> TableResult<IntervalTable> {
        let path = self.table_path(variable);
        if !path.exists() {
            return Err(TableError::MissingSource {
                variable,
                path: path.display().to_string(),
            });
        }
        info!(variable = %variable, path = %path.display(), "Loading interval table");

        let mut reader = open_reader(&path)?;
        let prefix = format!("{}_", variable.column_prefix());
        let headers = reader
            .headers()
            .map_err(|e| csv_err(&path, e))?
            .clone();

        // Map header position -> discretization index
        let mut slots: Vec<(usize, usize)> = Vec::new();
        for (pos, header) in headers.iter().enumerate() {
            let index: usize = header
                .strip_prefix(&prefix)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| TableError::Header {
                    path: path.display().to_string(),
                    header: header.to_string(),
                })?;
            slots.push((index, pos));
        }
        // The indices must cover 0..columns exactly; a gap would leave a
        // silently empty column and a duplicate would merge two series.
        let mut seen = vec![false; slots.len()];
        for (index, _) in &slots {
            match seen.get_mut(*index) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(TableError::Indices {
                        path: path.display().to_string(),
                        message: format!("duplicate index {index}"),
                    })
                }
                None => {
                    return Err(TableError::Indices {
                        path: path.display().to_string(),
                        message: format!(
                            "index {index} out of range for {} columns",
                            slots.len()
                        ),
                    })
                }
            }
        }
        let mut columns = vec![Vec::new(); slots.len()];

        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_err(&path, e))?;
            for (index, pos) in &slots {
                let cell = record.get(*pos).unwrap_or("");
                let value: f64 = cell.parse().map_err(|_| TableError::Parse {
                    path: path.display().to_string(),
                    row: row_idx + 1,
                    message: format!("'{cell}' is not a number"),
                })?;
                columns[*index].push(value);
            }
        }

        debug!(
            variable = %variable,
            columns = columns.len(),
            days = columns.first().map(Vec::len).unwrap_or(0),
            "Interval table loaded"
        );
        Ok(IntervalTable::new(variable, columns))
    }

    /// Load the low-reference series (day axis and snow depth).
    pub fn load_low(&self) -> TableResult<LowSeries> {
        let path = &self.low_path;
        if !path.exists() {
            return Err(TableError::Io(format!(
                "missing low-reference series: {}",
                path.display()
            )));
        }
        info!(path = %path.display(), "Loading low-reference series");

        let mut reader = open_reader(path)?;
        let headers = reader.headers().map_err(|e| csv_err(path, e))?.clone();
        let day_pos = header_position(&headers, "DAY", path)?;
        let snow_pos = header_position(&headers, "SNOWDEPTH", path)?;

        let mut days = Vec::new();
        let mut snow_depth = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_err(path, e))?;
            let day_cell = record.get(day_pos).unwrap_or("");
            let day = NaiveDate::parse_from_str(day_cell, "%Y-%m-%d").map_err(|_| {
                TableError::Parse {
                    path: path.display().to_string(),
                    row: row_idx + 1,
                    message: format!("'{day_cell}' is not a YYYY-MM-DD date"),
                }
            })?;
            let snow_cell = record.get(snow_pos).unwrap_or("");
            let snow: f64 = snow_cell.parse().map_err(|_| TableError::Parse {
                path: path.display().to_string(),
                row: row_idx + 1,
                message: format!("'{snow_cell}' is not a number"),
            })?;
            days.push(day);
            snow_depth.push(snow);
        }

        debug!(days = days.len(), "Low-reference series loaded");
        Ok(LowSeries { days, snow_depth })
    }
}

fn open_reader(path: &Path) -> TableResult<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_err(path, e))
}

fn csv_err(path: &Path, e: csv::Error) -> TableError {
    TableError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn header_position(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> TableResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| TableError::Header {
            path: path.display().to_string(),
            header: format!("expected column '{name}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_interval_table() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "irrad.csv",
            "IRRAD_0,IRRAD_1,IRRAD_2\n100.0,200.0,300.0\n110.0,210.0,310.0\n",
        );
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let table = store.load(WeatherVariable::Irradiation).unwrap();

        assert_eq!(table.column_count(), 3);
        assert_eq!(table.day_count(), 2);
        assert_eq!(table.column(1).unwrap(), &[200.0, 210.0]);
        assert!(table.column(3).is_none());
    }

    #[test]
    fn test_load_interval_table_unordered_headers() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "tmin.csv",
            "TMIN_2,TMIN_0,TMIN_1\n2.0,0.0,1.0\n",
        );
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let table = store.load(WeatherVariable::TempMin).unwrap();

        assert_eq!(table.column(0).unwrap(), &[0.0]);
        assert_eq!(table.column(1).unwrap(), &[1.0]);
        assert_eq!(table.column(2).unwrap(), &[2.0]);
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let err = store.load(WeatherVariable::Wind).unwrap_err();
        assert!(matches!(
            err,
            TableError::MissingSource {
                variable: WeatherVariable::Wind,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_header_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "rain.csv", "RAIN_0,HUMIDITY\n1.0,2.0\n");
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let err = store.load(WeatherVariable::Rain).unwrap_err();
        assert!(matches!(err, TableError::Header { .. }));
    }

    #[test]
    fn test_index_gap_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "irrad.csv", "IRRAD_0,IRRAD_2\n1.0,2.0\n");
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let err = store.load(WeatherVariable::Irradiation).unwrap_err();
        match err {
            TableError::Indices { message, .. } => {
                assert!(message.contains("index 2"), "{message}");
            }
            other => panic!("expected Indices error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "wind.csv", "WIND_0,WIND_1,WIND_1\n1.0,2.0,3.0\n");
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let err = store.load(WeatherVariable::Wind).unwrap_err();
        match err {
            TableError::Indices { message, .. } => {
                assert!(message.contains("duplicate index 1"), "{message}");
            }
            other => panic!("expected Indices error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_cell_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "vap.csv", "VAP_0\n1.0\nnot-a-number\n");
        let store = TableStore::new(dir.path(), dir.path().join("low.csv"));
        let err = store.load(WeatherVariable::VaporPressure).unwrap_err();
        match err {
            TableError::Parse { row, .. } => assert_eq!(row, 2),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_low_series() {
        let dir = TempDir::new().unwrap();
        let low = write_file(
            dir.path(),
            "low.csv",
            "DAY,TMIN,SNOWDEPTH\n2015-01-01,-3.0,12.5\n2015-01-02,-2.0,11.0\n",
        );
        let store = TableStore::new(dir.path(), &low);
        let series = store.load_low().unwrap();

        assert_eq!(series.day_count(), 2);
        assert_eq!(
            series.days[0],
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        assert_eq!(series.snow_depth, vec![12.5, 11.0]);
    }

    #[test]
    fn test_load_low_missing_column() {
        let dir = TempDir::new().unwrap();
        let low = write_file(dir.path(), "low.csv", "DAY\n2015-01-01\n");
        let store = TableStore::new(dir.path(), &low);
        assert!(matches!(
            store.load_low().unwrap_err(),
            TableError::Header { .. }
        ));
    }
}
