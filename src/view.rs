//! What the calendar is currently showing. Owned by the app state and only
//! changed through `ViewState::apply`.

use crate::dates;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    Month,
    Week,
}

impl ViewMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "month" => Some(Self::Month),
            "week" => Some(Self::Week),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    Prev,
    Next,
    Today(NaiveDate),
    SetMode(ViewMode),
    SelectAssignment(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    /// Day the week view is built around; its month is the displayed month.
    pub anchor: NaiveDate,
    pub selected_assignment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub year: i32,
    pub month: u32,
    pub mode: ViewMode,
    pub anchor: String,
    pub week_start: String,
    pub title: String,
    pub selected_assignment_id: Option<String>,
}

impl ViewState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Month,
            anchor: today,
            selected_assignment_id: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.anchor.year()
    }

    pub fn month(&self) -> u32 {
        self.anchor.month()
    }

    pub fn apply(&mut self, action: ViewAction) {
        match action {
            ViewAction::Prev => self.step(-1),
            ViewAction::Next => self.step(1),
            ViewAction::Today(d) => self.anchor = d,
            ViewAction::SetMode(mode) => self.mode = mode,
            ViewAction::SelectAssignment(id) => self.selected_assignment_id = id,
        }
    }

    fn step(&mut self, delta: i32) {
        match self.mode {
            ViewMode::Week => self.anchor += Duration::days(7 * i64::from(delta)),
            ViewMode::Month => {
                let (y, m) = dates::add_months(self.year(), self.month(), delta);
                if let Some(first) = NaiveDate::from_ymd_opt(y, m, 1) {
                    self.anchor = first;
                }
            }
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            year: self.year(),
            month: self.month(),
            mode: self.mode,
            anchor: dates::format_date(self.anchor),
            week_start: dates::format_date(dates::week_start(self.anchor)),
            title: format!("{} {}", dates::month_name(self.month()), self.year()),
            selected_assignment_id: self.selected_assignment_id.clone(),
        }
    }
}
