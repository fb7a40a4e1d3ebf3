use crate::curriculum::{self, Competency};
use crate::error::{GradebookError, Result};
use crate::model::{Criterion, CurriculumRef, Rubric, MAX_LEVELS};

/// Fields as submitted by the rubric builder.
#[derive(Debug, Clone, Default)]
pub struct RubricDraft {
    pub id: Option<String>,
    pub title: String,
    pub task_description: Option<String>,
    pub criteria: Vec<Criterion>,
    pub num_levels: i64,
    pub level_names: Vec<String>,
    pub curriculum: Option<CurriculumRef>,
}

pub fn default_level_names(num_levels: u32) -> Vec<String> {
    (1..=num_levels).map(|i| format!("Level {}", i)).collect()
}

/// Validates a draft and produces the stored rubric. `date_created` is kept
/// from `existing` on edit.
pub fn build_rubric(
    draft: RubricDraft,
    id: String,
    existing: Option<&Rubric>,
    now: &str,
) -> Result<Rubric> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(GradebookError::validation("title must not be empty"));
    }
    let criteria: Vec<Criterion> = draft
        .criteria
        .into_iter()
        .map(|c| Criterion {
            name: c.name.trim().to_string(),
            description: c
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
        .collect();
    if criteria.is_empty() {
        return Err(GradebookError::validation("a rubric needs at least one criterion"));
    }
    if let Some(i) = criteria.iter().position(|c| c.name.is_empty()) {
        return Err(GradebookError::validation(format!(
            "criterion {} has an empty name",
            i + 1
        )));
    }
    if draft.num_levels < 1 || draft.num_levels > i64::from(MAX_LEVELS) {
        return Err(GradebookError::validation(format!(
            "numLevels must be in 1..={}",
            MAX_LEVELS
        )));
    }
    let num_levels = draft.num_levels as u32;
    let level_names: Vec<String> = draft
        .level_names
        .into_iter()
        .map(|n| n.trim().to_string())
        .collect();
    let level_names = if level_names.is_empty() {
        default_level_names(num_levels)
    } else if level_names.len() != num_levels as usize {
        return Err(GradebookError::validation(format!(
            "levelNames has {} entries but numLevels is {}",
            level_names.len(),
            num_levels
        )));
    } else {
        level_names
    };

    Ok(Rubric {
        id,
        title,
        task_description: draft
            .task_description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        criteria,
        num_levels,
        level_names,
        curriculum: draft.curriculum,
        date_created: existing
            .map(|r| r.date_created.clone())
            .unwrap_or_else(|| now.to_string()),
    })
}

/// A draft whose criteria are curriculum competencies.
pub fn draft_from_curriculum(
    subject: &str,
    grade: &str,
    title: &str,
    level_names: Vec<String>,
    competency_ids: Option<&[String]>,
) -> Result<RubricDraft> {
    let entry = curriculum::grade(subject, grade)?;
    let picked: Vec<Competency> = curriculum::select_competencies(entry, competency_ids)?;
    let num_levels = if level_names.is_empty() {
        4
    } else {
        level_names.len() as i64
    };
    Ok(RubricDraft {
        id: None,
        title: title.to_string(),
        task_description: None,
        criteria: picked
            .iter()
            .map(|c| Criterion {
                name: format!("{} - {}", c.id, c.name),
                description: None,
            })
            .collect(),
        num_levels,
        level_names,
        curriculum: Some(CurriculumRef {
            subject: subject.to_string(),
            grade: Some(grade.to_string()),
            competencies: picked.into_iter().map(|c| c.id).collect(),
        }),
    })
}
