//! Import of a key-value dump taken from the old browser-only build.
//!
//! The dump is one JSON object keyed like the store (`scheduleConfig`,
//! `students`, ...). Values were written by hand-rolled form code, so they are
//! read leniently: a value may itself be a JSON string, numbers may be
//! strings, and blank strings mean "absent".

use crate::dates;
use crate::db::{KEY_ASSIGNMENTS, KEY_GRADES, KEY_RUBRICS, KEY_SCHEDULE, KEY_STUDENTS};
use crate::error::{GradebookError, Result};
use crate::model::{
    Assignment, Criterion, CurriculumRef, GradeBook, Rubric, ScheduleConfig, Student,
    DEFAULT_ASSIGNMENT_WEIGHT, DEFAULT_CYCLE_LENGTH, MAX_LEVELS,
};
use crate::roster;
use crate::rubric;
use crate::store::StateSnapshot;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct BrowserImport {
    pub snapshot: StateSnapshot,
    pub warnings: Vec<String>,
}

pub fn parse_browser_dump(text: &str) -> Result<BrowserImport> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| GradebookError::parse("browser storage dump", e.to_string()))?;
    let Value::Object(root) = root else {
        return Err(GradebookError::parse(
            "browser storage dump",
            "expected a JSON object keyed by storage key",
        ));
    };

    let mut out = BrowserImport::default();
    let warnings = &mut out.warnings;

    if let Some(v) = decode_entry(&root, KEY_SCHEDULE)? {
        out.snapshot.schedule_config = schedule_from(&v, warnings);
    }
    if let Some(v) = decode_entry(&root, KEY_STUDENTS)? {
        out.snapshot.students = array_of(&v, KEY_STUDENTS, warnings)
            .filter_map(|(i, o)| student_from(i, o, warnings))
            .collect();
    }
    if let Some(v) = decode_entry(&root, KEY_RUBRICS)? {
        out.snapshot.saved_rubrics = array_of(&v, KEY_RUBRICS, warnings)
            .filter_map(|(i, o)| rubric_from(i, o, warnings))
            .collect();
    }
    if let Some(v) = decode_entry(&root, KEY_ASSIGNMENTS)? {
        out.snapshot.assignments = array_of(&v, KEY_ASSIGNMENTS, warnings)
            .filter_map(|(i, o)| assignment_from(i, o, warnings))
            .collect();
    }
    if let Some(v) = decode_entry(&root, KEY_GRADES)? {
        let limits = level_limits(&out.snapshot.assignments, &out.snapshot.saved_rubrics);
        out.snapshot.grades = grades_from(&v, &limits, warnings);
    }
    Ok(out)
}

/// The stored value for `key`, unwrapped from its string form if needed.
/// Missing or null entries read as `None`.
fn decode_entry(root: &Map<String, Value>, key: &str) -> Result<Option<Value>> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| GradebookError::parse("browser storage value", format!("{}: {}", key, e))),
        Some(v) => Ok(Some(v.clone())),
    }
}

fn array_of<'v>(
    v: &'v Value,
    key: &str,
    warnings: &mut Vec<String>,
) -> impl Iterator<Item = (usize, &'v Map<String, Value>)> {
    let items: &[Value] = match v.as_array() {
        Some(items) => items,
        None => {
            warnings.push(format!("{} is not an array; ignored", key));
            &[]
        }
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.as_object().map(|o| (i, o)))
}

/// Strings are trimmed; numbers are rendered; blanks are `None`.
fn text(o: &Map<String, Value>, key: &str) -> Option<String> {
    let s = match o.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn number(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    x.filter(|x| x.is_finite())
}

fn level(v: &Value) -> Option<u32> {
    number(v)
        .filter(|x| *x >= 0.0 && x.fract() == 0.0 && *x <= f64::from(u32::MAX))
        .map(|x| x as u32)
}

fn strings(o: &Map<String, Value>, key: &str) -> Vec<String> {
    o.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn date_field(o: &Map<String, Value>, key: &str, what: &str, warnings: &mut Vec<String>) -> Option<String> {
    let raw = text(o, key)?;
    match dates::normalize_date(&raw) {
        Ok(d) => Some(d),
        Err(e) => {
            warnings.push(format!("{} {}: {}", what, key, e));
            None
        }
    }
}

fn schedule_from(v: &Value, warnings: &mut Vec<String>) -> ScheduleConfig {
    let Some(o) = v.as_object() else {
        warnings.push("scheduleConfig is not an object; defaults used".to_string());
        return ScheduleConfig::default();
    };
    let cycle_length = o
        .get("cycleLength")
        .and_then(level)
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_CYCLE_LENGTH);

    let mut cfg = ScheduleConfig {
        cycle_length,
        start_date: date_field(o, "startDate", "scheduleConfig", warnings),
        end_date: date_field(o, "endDate", "scheduleConfig", warnings),
        ..ScheduleConfig::default()
    };

    if let Some(days) = o.get("classSchedule").and_then(Value::as_object) {
        for (day, classes) in days {
            let Ok(n) = day.trim().parse::<u32>() else {
                warnings.push(format!("classSchedule day {:?} is not a number; ignored", day));
                continue;
            };
            let names: Vec<String> = classes
                .as_array()
                .map(|c| c.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            if !names.is_empty() {
                cfg.class_schedule.insert(n, names);
            }
        }
    }

    let mut seen = BTreeSet::new();
    for raw in o.get("holidays").and_then(Value::as_array).into_iter().flatten() {
        let Some(s) = raw.as_str() else { continue };
        match dates::normalize_date(s) {
            Ok(d) => {
                if seen.insert(d.clone()) {
                    cfg.holidays.push(d);
                }
            }
            Err(e) => warnings.push(format!("holiday skipped: {}", e)),
        }
    }
    cfg
}

fn student_from(i: usize, o: &Map<String, Value>, warnings: &mut Vec<String>) -> Option<Student> {
    let (Some(id), Some(name)) = (text(o, "id"), text(o, "name")) else {
        warnings.push(format!("students[{}] has no id or name; skipped", i));
        return None;
    };
    let date_added = text(o, "dateAdded").unwrap_or_default();
    let student_id = text(o, "studentId");
    match roster::build_student(
        id,
        &name,
        student_id.as_deref(),
        &strings(o, "classSections"),
        None,
        &date_added,
    ) {
        Ok(s) => Some(s),
        Err(e) => {
            warnings.push(format!("students[{}] skipped: {}", i, e));
            None
        }
    }
}

fn rubric_from(i: usize, o: &Map<String, Value>, warnings: &mut Vec<String>) -> Option<Rubric> {
    let Some(id) = text(o, "id") else {
        warnings.push(format!("savedRubrics[{}] has no id; skipped", i));
        return None;
    };
    let criteria: Vec<Criterion> = o
        .get("criteria")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|c| match c {
                    Value::String(s) => Some(Criterion {
                        name: s.trim().to_string(),
                        description: None,
                    }),
                    Value::Object(c) => text(c, "name").map(|name| Criterion {
                        name,
                        description: text(c, "description"),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let level_names = strings(o, "levelNames");
    let num_levels = o
        .get("numLevels")
        .and_then(level)
        .filter(|n| *n >= 1)
        .unwrap_or(level_names.len() as u32);
    if num_levels == 0 || criteria.is_empty() {
        warnings.push(format!("rubric {} has no criteria or levels; skipped", id));
        return None;
    }
    if num_levels > MAX_LEVELS {
        warnings.push(format!(
            "rubric {} has {} levels (max {}); skipped",
            id, num_levels, MAX_LEVELS
        ));
        return None;
    }
    let curriculum = o.get("curriculum").and_then(Value::as_object).and_then(|c| {
        text(c, "subject").map(|subject| CurriculumRef {
            subject,
            grade: text(c, "grade"),
            competencies: strings(c, "competencies"),
        })
    });
    Some(Rubric {
        title: text(o, "title").unwrap_or_else(|| format!("Rubric {}", id)),
        id,
        task_description: text(o, "taskDescription"),
        criteria,
        num_levels,
        level_names: if level_names.is_empty() {
            rubric::default_level_names(num_levels)
        } else {
            level_names
        },
        curriculum,
        date_created: text(o, "dateCreated").unwrap_or_default(),
    })
}

fn assignment_from(i: usize, o: &Map<String, Value>, warnings: &mut Vec<String>) -> Option<Assignment> {
    let (Some(id), Some(rubric_id)) = (text(o, "id"), text(o, "rubricId")) else {
        warnings.push(format!("assignments[{}] has no id or rubricId; skipped", i));
        return None;
    };
    let Some(due_date) = date_field(o, "dueDate", "assignment", warnings) else {
        warnings.push(format!("assignment {} has no usable due date; skipped", id));
        return None;
    };
    Some(Assignment {
        id,
        rubric_id,
        due_date,
        class_period: text(o, "classPeriod").unwrap_or_default(),
        weight: o
            .get("weight")
            .and_then(number)
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_ASSIGNMENT_WEIGHT),
        date_created: text(o, "dateCreated").unwrap_or_default(),
    })
}

/// numLevels of each assignment's rubric, for assignments whose rubric was imported.
fn level_limits(assignments: &[Assignment], rubrics: &[Rubric]) -> HashMap<String, u32> {
    let by_rubric: HashMap<&str, u32> = rubrics
        .iter()
        .map(|r| (r.id.as_str(), r.num_levels))
        .collect();
    assignments
        .iter()
        .filter_map(|a| {
            by_rubric
                .get(a.rubric_id.as_str())
                .map(|n| (a.id.clone(), *n))
        })
        .collect()
}

/// Cells of orphaned assignments are kept, bounded by `MAX_LEVELS`.
fn grades_from(v: &Value, limits: &HashMap<String, u32>, warnings: &mut Vec<String>) -> GradeBook {
    let mut book = GradeBook::default();
    let Some(by_assignment) = v.as_object() else {
        warnings.push("grades is not an object; ignored".to_string());
        return book;
    };
    for (assignment_id, cells) in by_assignment {
        let Some(cells) = cells.as_object() else { continue };
        let num_levels = limits.get(assignment_id).copied().unwrap_or(MAX_LEVELS);
        for (key, raw) in cells {
            match level(raw) {
                Some(l) if l >= num_levels => warnings.push(format!(
                    "grade {}/{} has level {} but the rubric has {} levels; skipped",
                    assignment_id, key, l, num_levels
                )),
                Some(l) => {
                    book.0
                        .entry(assignment_id.clone())
                        .or_default()
                        .insert(key.clone(), l);
                }
                None => warnings.push(format!("grade {}/{} is not a level; skipped", assignment_id, key)),
            }
        }
    }
    book
}
