use crate::dates;
use crate::error::{GradebookError, Result};
use crate::model::ScheduleConfig;
use serde::Serialize;

/// Applies the settings form. Class schedule and holidays are kept.
pub fn apply_settings(
    cfg: &mut ScheduleConfig,
    cycle_length: i64,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<()> {
    if cycle_length < 1 || cycle_length > i64::from(u32::MAX) {
        return Err(GradebookError::validation("cycleLength must be >= 1"));
    }
    let start = non_blank(start_date).map(dates::parse_date).transpose()?;
    let end = non_blank(end_date).map(dates::parse_date).transpose()?;
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(GradebookError::validation(
                "endDate must not be before startDate",
            ));
        }
    }
    cfg.cycle_length = cycle_length as u32;
    cfg.start_date = start.map(dates::format_date);
    cfg.end_date = end.map(dates::format_date);
    Ok(())
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

pub fn add_class(cfg: &mut ScheduleConfig, day: i64, class_name: &str) -> Result<()> {
    if day < 1 || day > i64::from(cfg.cycle_length) {
        return Err(GradebookError::validation(format!(
            "day must be in 1..={}",
            cfg.cycle_length
        )));
    }
    let name = class_name.trim();
    if name.is_empty() {
        return Err(GradebookError::validation("className must not be empty"));
    }
    cfg.class_schedule
        .entry(day as u32)
        .or_default()
        .push(name.to_string());
    Ok(())
}

pub fn remove_class(cfg: &mut ScheduleConfig, day: u32, index: usize) -> Result<String> {
    let classes = cfg
        .class_schedule
        .get_mut(&day)
        .filter(|c| index < c.len())
        .ok_or_else(|| GradebookError::not_found("class entry", format!("day {} #{}", day, index)))?;
    let removed = classes.remove(index);
    if classes.is_empty() {
        cfg.class_schedule.remove(&day);
    }
    Ok(removed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidayMergeMode {
    Replace,
    Merge,
}

impl HolidayMergeMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(Self::Replace),
            "merge" => Some(Self::Merge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayMergeSummary {
    pub added: usize,
    pub total: usize,
}

/// Incoming dates must already be canonical.
pub fn merge_holidays(
    cfg: &mut ScheduleConfig,
    incoming: Vec<String>,
    mode: HolidayMergeMode,
) -> HolidayMergeSummary {
    if mode == HolidayMergeMode::Replace {
        cfg.holidays.clear();
    }
    let mut added = 0;
    for d in incoming {
        if !cfg.holidays.contains(&d) {
            cfg.holidays.push(d);
            added += 1;
        }
    }
    HolidayMergeSummary {
        added,
        total: cfg.holidays.len(),
    }
}

pub fn add_holiday(cfg: &mut ScheduleConfig, raw: &str) -> Result<bool> {
    let d = dates::normalize_date(raw)?;
    if cfg.holidays.contains(&d) {
        return Ok(false);
    }
    cfg.holidays.push(d);
    cfg.holidays.sort();
    Ok(true)
}

pub fn remove_holiday(cfg: &mut ScheduleConfig, raw: &str) -> Result<bool> {
    let d = dates::normalize_date(raw)?;
    let before = cfg.holidays.len();
    cfg.holidays.retain(|h| *h != d);
    Ok(cfg.holidays.len() != before)
}
