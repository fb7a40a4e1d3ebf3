use crate::dates;
use crate::error::{GradebookError, Result};
use crate::model::{Assignment, Rubric, DEFAULT_ASSIGNMENT_WEIGHT};

pub fn build_assignment(
    id: String,
    rubric: &Rubric,
    due_date: &str,
    class_period: &str,
    weight: Option<f64>,
    now: &str,
) -> Result<Assignment> {
    let due_date = dates::normalize_date(due_date)
        .map_err(|_| GradebookError::validation(format!("dueDate is not a date: {:?}", due_date)))?;
    let weight = weight.unwrap_or(DEFAULT_ASSIGNMENT_WEIGHT);
    if !weight.is_finite() || weight < 0.0 {
        return Err(GradebookError::validation("weight must be a non-negative number"));
    }
    Ok(Assignment {
        id,
        rubric_id: rubric.id.clone(),
        due_date,
        class_period: class_period.trim().to_string(),
        weight,
        date_created: now.to_string(),
    })
}

/// Checks a (criterion, level) cell against the rubric's shape.
pub fn check_cell(rubric: &Rubric, criterion_index: i64, level: Option<i64>) -> Result<(usize, Option<u32>)> {
    if criterion_index < 0 || criterion_index as usize >= rubric.criteria.len() {
        return Err(GradebookError::validation(format!(
            "criterionIndex must be in 0..{}",
            rubric.criteria.len()
        )));
    }
    let level = match level {
        None => None,
        Some(l) if l >= 0 && l < i64::from(rubric.num_levels) => Some(l as u32),
        Some(_) => {
            return Err(GradebookError::validation(format!(
                "level must be in 0..{}",
                rubric.num_levels
            )))
        }
    };
    Ok((criterion_index as usize, level))
}
