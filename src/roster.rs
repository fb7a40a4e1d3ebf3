use crate::error::{GradebookError, Result};
use crate::exchange::RosterRow;
use crate::model::Student;
use std::collections::HashSet;

/// Builds the stored student from form fields. `date_added` is kept from
/// `existing` on edit.
pub fn build_student(
    id: String,
    name: &str,
    student_id: Option<&str>,
    class_sections: &[String],
    existing: Option<&Student>,
    now: &str,
) -> Result<Student> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GradebookError::validation("name must not be empty"));
    }
    let student_id = student_id.map(str::trim).filter(|s| !s.is_empty());
    let class_sections: Vec<String> = class_sections
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    // One student is one CSV line; sections share a field split on ';'.
    let multi_line = |s: &str| s.contains(['\r', '\n']);
    if multi_line(name) || student_id.is_some_and(multi_line) {
        return Err(GradebookError::validation("name and studentId must be a single line"));
    }
    if let Some(bad) = class_sections.iter().find(|s| multi_line(s.as_str()) || s.contains(';')) {
        return Err(GradebookError::validation(format!(
            "class section {:?} must not contain ';' or line breaks",
            bad
        )));
    }

    Ok(Student {
        id,
        name: name.to_string(),
        student_id: student_id.map(str::to_string),
        class_sections,
        date_added: existing
            .map(|s| s.date_added.clone())
            .unwrap_or_else(|| now.to_string()),
    })
}

pub fn from_import_row(row: RosterRow, id: String, now: &str) -> Student {
    Student {
        id,
        name: row.name,
        student_id: row.student_id,
        class_sections: row.class_sections,
        date_added: now.to_string(),
    }
}

/// Case-insensitive name search plus exact section match; blank filters match all.
pub fn filter_students<'a>(
    students: &'a [Student],
    search: Option<&str>,
    class_section: Option<&str>,
) -> Vec<&'a Student> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let section = class_section.map(str::trim).filter(|s| !s.is_empty());
    students
        .iter()
        .filter(|s| {
            needle
                .as_ref()
                .map(|n| s.name.to_lowercase().contains(n.as_str()))
                .unwrap_or(true)
        })
        .filter(|s| {
            section
                .map(|sec| s.class_sections.iter().any(|c| c == sec))
                .unwrap_or(true)
        })
        .collect()
}

/// Distinct section names in first-seen order.
pub fn class_sections(students: &[Student]) -> Vec<String> {
    let mut seen = HashSet::new();
    students
        .iter()
        .flat_map(|s| s.class_sections.iter())
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}
