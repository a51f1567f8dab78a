pub mod render;

use crate::error::ExtractionError;
use crate::fetch::RawTable;
use chrono::{Datelike, Local, NaiveDate};

/// The dual-category policy only proceeds when exactly this many tables match
/// the current period (one electricity, one natural gas).
pub const DUAL_CATEGORY_COUNT: usize = 2;

/// Calendar month a rate applies to; the de-duplication unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodKey {
    pub year: i32,
    /// Full English month name, as the page prints it.
    pub month: String,
}

impl PeriodKey {
    /// Period for the local clock's current date.
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        PeriodKey {
            year: date.year(),
            month: date.format("%B").to_string(),
        }
    }
}

/// A raw table narrowed to one rate category: title row stripped off, data
/// rows tagged with their original 0-based position below the title. The
/// render order depends on those positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateTable {
    pub title: String,
    pub rows: Vec<(usize, Vec<Option<String>>)>,
}

impl RateTable {
    fn from_raw(raw: &RawTable) -> Result<Self, ExtractionError> {
        let title = raw
            .first_cell()
            .ok_or(ExtractionError::MissingTitle)?
            .to_string();
        let rows = raw.rows.iter().skip(1).cloned().enumerate().collect();
        Ok(RateTable { title, rows })
    }
}

/// Dual-category selection: keep tables whose title row carries the current
/// four-digit year AND whose last row starts with the current month name.
///
/// Exactly two survivors means both categories are published and we proceed;
/// any other count is "not yet published" and yields `None`, not an error.
pub fn select_rate_tables(
    tables: &[RawTable],
    period: &PeriodKey,
) -> Result<Option<Vec<RateTable>>, ExtractionError> {
    let year = period.year.to_string();
    let current: Vec<&RawTable> = tables
        .iter()
        .filter(|t| t.first_cell().is_some_and(|c| c.contains(&year)))
        .filter(|t| {
            t.last_row_first_cell()
                .is_some_and(|c| c.contains(&period.month))
        })
        .collect();

    if current.len() != DUAL_CATEGORY_COUNT {
        return Ok(None);
    }
    current
        .into_iter()
        .map(RateTable::from_raw)
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// One category's newest rate, read off the last row of its table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateSummary {
    pub title: String,
    pub month: String,
    pub value: String,
}

impl RateSummary {
    pub fn line(&self) -> String {
        format!("{} for {} is {}", self.title, self.month, self.value)
    }
}

/// Single-rate selection: first table whose title cell contains both the
/// current four-digit year and the category label (case-insensitive). The
/// year check is deliberate and required, not vestigial.
///
/// First match wins; no match is `None`, not an error. A matched table whose
/// last row is narrower than `(month, value)` is malformed.
pub fn extract_single(
    tables: &[RawTable],
    period: &PeriodKey,
    category: &str,
) -> Result<Option<RateSummary>, ExtractionError> {
    let year = period.year.to_string();
    let category = category.to_lowercase();

    for table in tables {
        let Some(title) = table.first_cell() else {
            continue;
        };
        let lowered = title.to_lowercase();
        if !(lowered.contains(&year) && lowered.contains(&category)) {
            continue;
        }
        let Some(last) = table.rows.last() else {
            continue;
        };
        if last.len() < 2 {
            return Err(ExtractionError::ShortRow {
                need: 2,
                got: last.len(),
            });
        }
        return Ok(Some(RateSummary {
            title: title.to_string(),
            month: last[0].clone().unwrap_or_default(),
            value: last[1].clone().unwrap_or_default(),
        }));
    }
    Ok(None)
}
