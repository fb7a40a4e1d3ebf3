//! Month and week grids. Cells are descriptive only; the front end draws them.

use crate::cycle::CycleIndex;
use crate::dates;
use crate::error::Result;
use crate::model::{Assignment, Rubric, ScheduleConfig};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

pub const MONTH_GRID_CELLS: usize = 42;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentBadge {
    pub assignment_id: String,
    pub rubric_id: String,
    pub rubric_title: Option<String>,
    pub class_period: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: String,
    pub day: u32,
    pub outside_month: bool,
    pub weekend: bool,
    pub holiday: bool,
    pub today: bool,
    pub cycle_day: Option<u32>,
    pub assignments: Vec<AssignmentBadge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub cells: Vec<DayCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGrid {
    pub week_start: String,
    pub cells: Vec<DayCell>,
}

/// Everything a grid needs, borrowed from the stored collections.
pub struct CalendarSource<'a> {
    pub schedule: &'a ScheduleConfig,
    pub assignments: &'a [Assignment],
    pub rubrics: &'a [Rubric],
    pub today: NaiveDate,
}

struct CellBuilder<'a> {
    index: CycleIndex,
    by_due: HashMap<&'a str, Vec<&'a Assignment>>,
    titles: HashMap<&'a str, &'a str>,
    today: NaiveDate,
}

impl<'a> CellBuilder<'a> {
    fn new(src: &CalendarSource<'a>) -> Self {
        let mut by_due: HashMap<&str, Vec<&Assignment>> = HashMap::new();
        for a in src.assignments {
            by_due.entry(a.due_date.as_str()).or_default().push(a);
        }
        let titles = src
            .rubrics
            .iter()
            .map(|r| (r.id.as_str(), r.title.as_str()))
            .collect();
        Self {
            index: CycleIndex::new(src.schedule),
            by_due,
            titles,
            today: src.today,
        }
    }

    fn cell(&self, d: NaiveDate, month: Option<u32>) -> DayCell {
        let date = dates::format_date(d);
        let assignments = self
            .by_due
            .get(date.as_str())
            .map(|list| {
                list.iter()
                    .map(|a| AssignmentBadge {
                        assignment_id: a.id.clone(),
                        rubric_id: a.rubric_id.clone(),
                        rubric_title: self.titles.get(a.rubric_id.as_str()).map(|t| t.to_string()),
                        class_period: a.class_period.clone(),
                        weight: a.weight,
                    })
                    .collect()
            })
            .unwrap_or_default();
        DayCell {
            day: d.day(),
            outside_month: month.map(|m| d.month() != m).unwrap_or(false),
            weekend: dates::is_weekend(d),
            holiday: self.index.is_holiday(d),
            today: d == self.today,
            cycle_day: self.index.label(d),
            assignments,
            date,
        }
    }
}

/// Six Sunday-start weeks beginning on the Sunday on or before the 1st.
pub fn month_grid(src: &CalendarSource<'_>, year: i32, month: u32) -> Result<MonthGrid> {
    let first = dates::first_of_month(year, month)?;
    let start = dates::week_start(first);
    let builder = CellBuilder::new(src);
    let cells = (0..MONTH_GRID_CELLS as i64)
        .map(|i| builder.cell(start + Duration::days(i), Some(month)))
        .collect();
    Ok(MonthGrid {
        year,
        month,
        title: format!("{} {}", dates::month_name(month), year),
        cells,
    })
}

pub fn week_grid(src: &CalendarSource<'_>, anchor: NaiveDate) -> WeekGrid {
    let start = dates::week_start(anchor);
    let builder = CellBuilder::new(src);
    WeekGrid {
        week_start: dates::format_date(start),
        cells: (0..7)
            .map(|i| builder.cell(start + Duration::days(i), None))
            .collect(),
    }
}
