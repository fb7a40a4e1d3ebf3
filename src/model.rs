use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::dates;
use chrono::NaiveDate;

pub const DEFAULT_CYCLE_LENGTH: u32 = 9;
pub const DEFAULT_ASSIGNMENT_WEIGHT: f64 = 10.0;
/// Upper bound on rubric levels; the level picker never offers more.
pub const MAX_LEVELS: u32 = 10;

fn default_cycle_length() -> u32 {
    DEFAULT_CYCLE_LENGTH
}

fn default_weight() -> f64 {
    DEFAULT_ASSIGNMENT_WEIGHT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    #[serde(default = "default_cycle_length")]
    pub cycle_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Cycle day number -> ordered class-period names.
    #[serde(default)]
    pub class_schedule: BTreeMap<u32, Vec<String>>,
    /// Canonical `YYYY-MM-DD` strings.
    #[serde(default)]
    pub holidays: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            start_date: None,
            end_date: None,
            class_schedule: BTreeMap::new(),
            holidays: Vec::new(),
        }
    }
}

impl ScheduleConfig {
    pub fn start(&self) -> Option<NaiveDate> {
        self.start_date
            .as_deref()
            .and_then(|s| dates::parse_date(s).ok())
    }

    pub fn holiday_dates(&self) -> BTreeSet<NaiveDate> {
        self.holidays
            .iter()
            .filter_map(|s| dates::parse_date(s).ok())
            .collect()
    }

    pub fn classes_for_day(&self, cycle_day: u32) -> Vec<String> {
        self.class_schedule
            .get(&cycle_day)
            .cloned()
            .unwrap_or_default()
    }

    /// Distinct class-period names across the whole cycle, first-seen order.
    pub fn class_periods(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for classes in self.class_schedule.values() {
            for c in classes {
                if seen.insert(c.clone()) {
                    out.push(c.clone());
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub class_sections: Vec<String>,
    #[serde(default)]
    pub date_added: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumRef {
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default)]
    pub competencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    pub criteria: Vec<Criterion>,
    pub num_levels: u32,
    #[serde(default)]
    pub level_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<CurriculumRef>,
    #[serde(default)]
    pub date_created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub rubric_id: String,
    pub due_date: String,
    #[serde(default)]
    pub class_period: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub date_created: String,
}

/// assignmentId -> `"{studentId}_{criterionIndex}"` -> selected level index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeBook(pub BTreeMap<String, BTreeMap<String, u32>>);

pub fn grade_key(student_id: &str, criterion_index: usize) -> String {
    format!("{}_{}", student_id, criterion_index)
}

/// Splits on the last `_`, so student ids may themselves contain underscores.
pub fn parse_grade_key(key: &str) -> Option<(&str, usize)> {
    let (student, idx) = key.rsplit_once('_')?;
    let idx = idx.parse::<usize>().ok()?;
    Some((student, idx))
}

impl GradeBook {
    pub fn set(
        &mut self,
        assignment_id: &str,
        student_id: &str,
        criterion_index: usize,
        level: Option<u32>,
    ) {
        let key = grade_key(student_id, criterion_index);
        match level {
            Some(l) => {
                self.0
                    .entry(assignment_id.to_string())
                    .or_default()
                    .insert(key, l);
            }
            None => {
                if let Some(cells) = self.0.get_mut(assignment_id) {
                    cells.remove(&key);
                }
            }
        }
    }

    /// Level selections for one student, one slot per criterion.
    pub fn levels_for(
        &self,
        assignment_id: &str,
        student_id: &str,
        criteria_count: usize,
    ) -> Vec<Option<u32>> {
        let cells = self.0.get(assignment_id);
        (0..criteria_count)
            .map(|c| cells.and_then(|m| m.get(&grade_key(student_id, c)).copied()))
            .collect()
    }

    /// Drops every cell belonging to `student_id`, across all assignments.
    pub fn remove_student(&mut self, student_id: &str) -> usize {
        let mut removed = 0;
        for cells in self.0.values_mut() {
            let before = cells.len();
            cells.retain(|k, _| parse_grade_key(k).map(|(s, _)| s) != Some(student_id));
            removed += before - cells.len();
        }
        removed
    }

    pub fn remove_assignment(&mut self, assignment_id: &str) -> usize {
        self.0
            .remove(assignment_id)
            .map(|cells| cells.len())
            .unwrap_or(0)
    }

    pub fn cell_count(&self) -> usize {
        self.0.values().map(|m| m.len()).sum()
    }
}
