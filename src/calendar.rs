//! Crop catalog and calendar templates
//!
//! Sowing and harvest dates are deterministic per crop: a fixed template
//! month/day with the target year substituted in. The catalog is explicit
//! immutable configuration so tests and alternate deployments can inject
//! their own crops without touching process-wide state.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Calendar errors
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The crop has no catalog entry
    #[error("unknown crop: {0}")]
    UnknownCrop(String),

    /// Year substitution produced an invalid date (e.g. Feb 29 off-leap-year)
    #[error("invalid calendar date {month:02}-{day:02} for year {year}")]
    InvalidDate {
        /// Target year
        year: i32,
        /// Template month
        month: u32,
        /// Template day
        day: u32,
    },
}

/// A month/day template awaiting year substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTemplate {
    /// Month (1-12)
    pub month: u32,
    /// Day of month
    pub day: u32,
}

impl DayTemplate {
    /// Substitute `year` into the template.
    pub fn for_year(&self, year: i32) -> Result<NaiveDate, CalendarError> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).ok_or(CalendarError::InvalidDate {
            year,
            month: self.month,
            day: self.day,
        })
    }
}

/// Per-crop catalog entry: variety plus sowing/harvest templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropSpec {
    /// Engine variety identifier (e.g. `Spring_barley_301`)
    pub variety_name: String,
    /// Sowing day template
    pub sowing: DayTemplate,
    /// Harvest day template
    pub harvest: DayTemplate,
}

/// Concrete calendar entry for one (crop, year) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCalendarEntry {
    /// Crop name
    pub crop_name: String,
    /// Engine variety identifier
    pub variety_name: String,
    /// Sowing date with the target year substituted
    pub sowing_date: NaiveDate,
    /// Harvest date with the target year substituted
    pub harvest_date: NaiveDate,
}

/// The crop catalog: an ordered, immutable mapping from crop name to spec.
///
/// Iteration order is the crop name's lexicographic order, which keeps the
/// sweep's row ordering deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCalendar {
    crops: BTreeMap<String, CropSpec>,
}

impl CropCalendar {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self {
            crops: BTreeMap::new(),
        }
    }

    /// Add or replace a crop, builder style.
    pub fn with_crop(mut self, name: &str, spec: CropSpec) -> Self {
        self.crops.insert(name.to_string(), spec);
        self
    }

    /// Number of crops in the catalog.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Crop names in iteration order.
    pub fn crop_names(&self) -> impl Iterator<Item = &str> {
        self.crops.keys().map(String::as_str)
    }

    /// Derive the concrete calendar entry for `(crop, year)`.
    pub fn entry_for(&self, crop: &str, year: i32) -> Result<CropCalendarEntry, CalendarError> {
        let spec = self
            .crops
            .get(crop)
            .ok_or_else(|| CalendarError::UnknownCrop(crop.to_string()))?;
        Ok(CropCalendarEntry {
            crop_name: crop.to_string(),
            variety_name: spec.variety_name.clone(),
            sowing_date: spec.sowing.for_year(year)?,
            harvest_date: spec.harvest.for_year(year)?,
        })
    }
}

impl Default for CropCalendar {
    /// The reference sweep's catalog.
    fn default() -> Self {
        Self::empty()
            .with_crop(
                "barley",
                CropSpec {
                    variety_name: "Spring_barley_301".to_string(),
                    sowing: DayTemplate { month: 4, day: 30 },
                    harvest: DayTemplate { month: 9, day: 6 },
                },
            )
            .with_crop(
                "soybean",
                CropSpec {
                    variety_name: "Soybean_901".to_string(),
                    sowing: DayTemplate { month: 4, day: 15 },
                    harvest: DayTemplate { month: 8, day: 16 },
                },
            )
            .with_crop(
                "sugarbeet",
                CropSpec {
                    variety_name: "Sugarbeet_603".to_string(),
                    sowing: DayTemplate { month: 4, day: 28 },
                    harvest: DayTemplate { month: 10, day: 5 },
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let calendar = CropCalendar::default();
        assert_eq!(calendar.len(), 3);
        let names: Vec<&str> = calendar.crop_names().collect();
        assert_eq!(names, vec!["barley", "soybean", "sugarbeet"]);
    }

    #[test]
    fn test_year_substitution() {
        let calendar = CropCalendar::default();
        let entry = calendar.entry_for("barley", 2017).unwrap();
        assert_eq!(entry.variety_name, "Spring_barley_301");
        assert_eq!(entry.sowing_date, NaiveDate::from_ymd_opt(2017, 4, 30).unwrap());
        assert_eq!(entry.harvest_date, NaiveDate::from_ymd_opt(2017, 9, 6).unwrap());
    }

    #[test]
    fn test_unknown_crop() {
        let calendar = CropCalendar::default();
        assert!(matches!(
            calendar.entry_for("durian", 2015).unwrap_err(),
            CalendarError::UnknownCrop(_)
        ));
    }

    #[test]
    fn test_invalid_date_template() {
        let calendar = CropCalendar::empty().with_crop(
            "leapcrop",
            CropSpec {
                variety_name: "Leap_1".to_string(),
                sowing: DayTemplate { month: 2, day: 29 },
                harvest: DayTemplate { month: 9, day: 1 },
            },
        );
        assert!(calendar.entry_for("leapcrop", 2016).is_ok());
        assert!(matches!(
            calendar.entry_for("leapcrop", 2015).unwrap_err(),
            CalendarError::InvalidDate { year: 2015, .. }
        ));
    }

    #[test]
    fn test_deterministic_iteration_order() {
        let calendar = CropCalendar::empty()
            .with_crop(
                "zucchini",
                CropSpec {
                    variety_name: "Z_1".to_string(),
                    sowing: DayTemplate { month: 5, day: 1 },
                    harvest: DayTemplate { month: 9, day: 1 },
                },
            )
            .with_crop(
                "alfalfa",
                CropSpec {
                    variety_name: "A_1".to_string(),
                    sowing: DayTemplate { month: 4, day: 1 },
                    harvest: DayTemplate { month: 8, day: 1 },
                },
            );
        let names: Vec<&str> = calendar.crop_names().collect();
        assert_eq!(names, vec!["alfalfa", "zucchini"]);
    }
}
