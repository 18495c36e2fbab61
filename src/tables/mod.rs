//! Interval table loading and value sanitization
//!
//! The six weather variables each have a backing CSV with one column per
//! discretization index and one row per calendar day. A separate low-reference
//! series provides the day axis and snow depth shared by every scenario.

pub mod sanitize;
pub mod store;

pub use sanitize::{ClampRule, SanitizeRules};
pub use store::{IntervalTable, LowSeries, TableStore};

/// Interval table errors
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A required source table is absent
    #[error("missing source table for {variable}: {path}")]
    MissingSource {
        /// Weather variable whose table is missing
        variable: WeatherVariable,
        /// Path that was probed
        path: String,
    },

    /// CSV read error
    #[error("CSV error in {path}: {message}")]
    Csv {
        /// Source file
        path: String,
        /// Underlying error
        message: String,
    },

    /// A cell could not be parsed as a number or date
    #[error("parse error in {path} row {row}: {message}")]
    Parse {
        /// Source file
        path: String,
        /// 1-based data row index
        row: usize,
        /// What failed to parse
        message: String,
    },

    /// A header column did not match the expected `<PREFIX>_<index>` shape
    #[error("unexpected header '{header}' in {path}")]
    Header {
        /// Source file
        path: String,
        /// Offending header
        header: String,
    },

    /// Discretization indices in the headers have a gap or a duplicate
    #[error("bad discretization indices in {path}: {message}")]
    Indices {
        /// Source file
        path: String,
        /// Which index is missing or duplicated
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// The six swept weather variables, in scenario-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum WeatherVariable {
    /// Daily global irradiation
    Irradiation = 0,
    /// Daily minimum temperature
    TempMin = 1,
    /// Daily maximum temperature
    TempMax = 2,
    /// Mean daily vapor pressure
    VaporPressure = 3,
    /// Mean daily wind speed
    Wind = 4,
    /// Daily precipitation
    Rain = 5,
}

impl WeatherVariable {
    /// All six variables in scenario-index order.
    pub const ALL: [WeatherVariable; 6] = [
        WeatherVariable::Irradiation,
        WeatherVariable::TempMin,
        WeatherVariable::TempMax,
        WeatherVariable::VaporPressure,
        WeatherVariable::Wind,
        WeatherVariable::Rain,
    ];

    /// File stem of the backing CSV (`<stem>.csv`).
    pub fn file_stem(&self) -> &'static str {
        match self {
            WeatherVariable::Irradiation => "irrad",
            WeatherVariable::TempMin => "tmin",
            WeatherVariable::TempMax => "tmax",
            WeatherVariable::VaporPressure => "vap",
            WeatherVariable::Wind => "wind",
            WeatherVariable::Rain => "rain",
        }
    }

    /// Header prefix of the table's columns (`<PREFIX>_<index>`).
    pub fn column_prefix(&self) -> &'static str {
        match self {
            WeatherVariable::Irradiation => "IRRAD",
            WeatherVariable::TempMin => "TMIN",
            WeatherVariable::TempMax => "TMAX",
            WeatherVariable::VaporPressure => "VAP",
            WeatherVariable::Wind => "WIND",
            WeatherVariable::Rain => "RAIN",
        }
    }
}

impl std::fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}
