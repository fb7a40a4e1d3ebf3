//! Cycle-day calculator: the position of a calendar date within the repeating
//! N-day instructional rotation. Weekends and holidays do not advance the
//! rotation.

use crate::dates;
use crate::error::{GradebookError, Result};
use crate::model::ScheduleConfig;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

pub fn is_instructional(d: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> bool {
    !dates::is_weekend(d) && !holidays.contains(&d)
}

/// Count starts at 1 on `start` and advances once per instructional day
/// strictly before `target`. A weekend or holiday target therefore reports the
/// day the rotation would resume on.
pub fn cycle_day(
    target: NaiveDate,
    start: NaiveDate,
    cycle_length: u32,
    holidays: &BTreeSet<NaiveDate>,
) -> Result<u32> {
    if cycle_length == 0 {
        return Err(GradebookError::validation("cycleLength must be >= 1"));
    }
    if target < start {
        return Err(GradebookError::InvalidRange { start, target });
    }
    let advanced = start
        .iter_days()
        .take_while(|d| *d < target)
        .filter(|d| is_instructional(*d, holidays))
        .count() as u64;
    Ok((advanced % u64::from(cycle_length)) as u32 + 1)
}

pub fn cycle_day_for(cfg: &ScheduleConfig, target: NaiveDate) -> Result<u32> {
    let start = cfg.start().ok_or(GradebookError::NotConfigured)?;
    cycle_day(target, start, cfg.cycle_length, &cfg.holiday_dates())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleDayInfo {
    pub date: String,
    pub cycle_day: Option<u32>,
    pub instructional: bool,
    pub classes: Vec<String>,
}

pub fn describe_date(cfg: &ScheduleConfig, target: NaiveDate) -> Result<CycleDayInfo> {
    let holidays = cfg.holiday_dates();
    // No start date is a normal state for a fresh schedule, not a failure.
    let cycle_day = match cycle_day_for(cfg, target) {
        Ok(d) => Some(d),
        Err(GradebookError::NotConfigured) => None,
        Err(e) => return Err(e),
    };
    let classes = cycle_day
        .map(|d| cfg.classes_for_day(d))
        .unwrap_or_default();
    Ok(CycleDayInfo {
        date: dates::format_date(target),
        cycle_day,
        instructional: is_instructional(target, &holidays),
        classes,
    })
}

/// Precomputed rotation positions for a date window, used when labelling a
/// calendar grid. Only instructional days on or after the start get a number.
pub struct CycleIndex {
    start: Option<NaiveDate>,
    cycle_length: u32,
    holidays: BTreeSet<NaiveDate>,
}

impl CycleIndex {
    pub fn new(cfg: &ScheduleConfig) -> Self {
        Self {
            start: cfg.start(),
            cycle_length: cfg.cycle_length,
            holidays: cfg.holiday_dates(),
        }
    }

    pub fn is_holiday(&self, d: NaiveDate) -> bool {
        self.holidays.contains(&d)
    }

    pub fn label(&self, d: NaiveDate) -> Option<u32> {
        let start = self.start?;
        if d < start || !is_instructional(d, &self.holidays) {
            return None;
        }
        cycle_day(d, start, self.cycle_length, &self.holidays).ok()
    }
}
