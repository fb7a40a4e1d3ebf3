use crate::model::{Assignment, GradeBook, Rubric, Student};
use serde::Serialize;
use std::collections::HashMap;

/// Half-up 1-decimal rounding used for every displayed percentage:
/// `floor(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// Percentage for one selected level: `(L + 1) / numLevels * 100`.
/// A level outside `0..numLevels` (left behind when a rubric loses levels)
/// scores nothing.
pub fn criterion_score(level: u32, num_levels: u32) -> Option<f64> {
    if level >= num_levels {
        return None;
    }
    Some(100.0 * (f64::from(level) + 1.0) / f64::from(num_levels))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubricAverage {
    /// None when no criterion is graded.
    pub overall: Option<f64>,
    pub graded_count: usize,
    pub ungraded_count: usize,
}

/// Mean over graded criteria only. An ungraded criterion is left out of both
/// numerator and denominator; it never counts as zero.
pub fn rubric_average<I>(levels: I, num_levels: u32) -> RubricAverage
where
    I: IntoIterator<Item = Option<u32>>,
{
    let mut sum = 0.0_f64;
    let mut graded_count = 0usize;
    let mut ungraded_count = 0usize;

    for level in levels {
        match level.and_then(|l| criterion_score(l, num_levels)) {
            Some(score) => {
                sum += score;
                graded_count += 1;
            }
            None => ungraded_count += 1,
        }
    }

    RubricAverage {
        overall: if graded_count > 0 {
            Some(sum / graded_count as f64)
        } else {
            None
        },
        graded_count,
        ungraded_count,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub student_id: String,
    pub name: String,
    pub levels: Vec<Option<u32>>,
    pub scores: Vec<Option<f64>>,
    pub overall: Option<f64>,
    pub graded_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSheet {
    pub assignment_id: String,
    pub rubric_id: String,
    pub rubric_title: String,
    pub due_date: String,
    pub class_period: String,
    pub weight: f64,
    pub criteria: Vec<String>,
    pub level_names: Vec<String>,
    pub rows: Vec<SheetRow>,
    pub class_average: Option<f64>,
}

pub fn grade_sheet(
    assignment: &Assignment,
    rubric: &Rubric,
    students: &[Student],
    grades: &GradeBook,
) -> GradeSheet {
    let criteria_count = rubric.criteria.len();
    let mut rows = Vec::with_capacity(students.len());
    let mut overall_sum = 0.0_f64;
    let mut overall_count = 0usize;

    for s in students {
        let levels: Vec<Option<u32>> = grades
            .levels_for(&assignment.id, &s.id, criteria_count)
            .into_iter()
            .map(|l| l.filter(|l| *l < rubric.num_levels))
            .collect();
        let scores = levels
            .iter()
            .copied()
            .map(|l| {
                l.and_then(|l| criterion_score(l, rubric.num_levels))
                    .map(round_off_1_decimal)
            })
            .collect();
        let avg = rubric_average(levels.iter().copied(), rubric.num_levels);
        if let Some(o) = avg.overall {
            overall_sum += o;
            overall_count += 1;
        }
        rows.push(SheetRow {
            student_id: s.id.clone(),
            name: s.name.clone(),
            levels,
            scores,
            overall: avg.overall.map(round_off_1_decimal),
            graded_count: avg.graded_count,
        });
    }

    GradeSheet {
        assignment_id: assignment.id.clone(),
        rubric_id: rubric.id.clone(),
        rubric_title: rubric.title.clone(),
        due_date: assignment.due_date.clone(),
        class_period: assignment.class_period.clone(),
        weight: assignment.weight,
        criteria: rubric.criteria.iter().map(|c| c.name.clone()).collect(),
        level_names: rubric.level_names.clone(),
        rows,
        class_average: if overall_count > 0 {
            Some(round_off_1_decimal(overall_sum / overall_count as f64))
        } else {
            None
        },
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub name: String,
    pub final_mark: Option<f64>,
    pub graded_assignments: usize,
    pub ungraded_assignments: usize,
}

/// Weighted mean of per-assignment overall scores, using assignment weights.
/// Ungraded assignments and zero-weight assignments are left out. Assignments
/// whose rubric no longer exists are skipped.
pub fn student_summaries(
    students: &[Student],
    assignments: &[Assignment],
    rubrics: &[Rubric],
    grades: &GradeBook,
) -> Vec<StudentSummary> {
    let rubric_by_id: HashMap<&str, &Rubric> = rubrics.iter().map(|r| (r.id.as_str(), r)).collect();
    let scored: Vec<(&Assignment, &Rubric)> = assignments
        .iter()
        .filter_map(|a| rubric_by_id.get(a.rubric_id.as_str()).map(|r| (a, *r)))
        .collect();

    students
        .iter()
        .map(|s| {
            let mut weighted_sum = 0.0_f64;
            let mut weighted_denom = 0.0_f64;
            let mut graded = 0usize;
            let mut ungraded = 0usize;

            for (a, r) in &scored {
                let levels = grades.levels_for(&a.id, &s.id, r.criteria.len());
                let Some(overall) = rubric_average(levels, r.num_levels).overall else {
                    ungraded += 1;
                    continue;
                };
                graded += 1;
                if a.weight > 0.0 {
                    weighted_sum += overall * a.weight;
                    weighted_denom += a.weight;
                }
            }

            StudentSummary {
                student_id: s.id.clone(),
                name: s.name.clone(),
                final_mark: if weighted_denom > 0.0 {
                    Some(round_off_1_decimal(weighted_sum / weighted_denom))
                } else {
                    None
                },
                graded_assignments: graded,
                ungraded_assignments: ungraded,
            }
        })
        .collect()
}
