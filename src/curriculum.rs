//! Static curriculum reference table (subjects, grade levels, competencies),
//! shipped as embedded JSON.

use crate::error::{GradebookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const CURRICULUM_JSON: &str = include_str!("../data/curriculum.json");

#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumTable {
    pub subjects: BTreeMap<String, SubjectEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectEntry {
    pub grades: BTreeMap<String, GradeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competency {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub competencies: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub competencies: Vec<Competency>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub cross_curricular_competencies: Vec<String>,
    #[serde(default)]
    pub broad_areas_of_learning: Vec<String>,
    #[serde(default)]
    pub subject_themes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject: String,
    pub grades: Vec<String>,
}

static TABLE: OnceLock<std::result::Result<CurriculumTable, String>> = OnceLock::new();

pub fn table() -> Result<&'static CurriculumTable> {
    TABLE
        .get_or_init(|| serde_json::from_str(CURRICULUM_JSON).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| GradebookError::parse("curriculum table", e.clone()))
}

pub fn subjects() -> Result<Vec<SubjectSummary>> {
    Ok(table()?
        .subjects
        .iter()
        .map(|(name, entry)| SubjectSummary {
            subject: name.clone(),
            grades: entry.grades.keys().cloned().collect(),
        })
        .collect())
}

pub fn grade(subject: &str, grade: &str) -> Result<&'static GradeEntry> {
    let entry = table()?
        .subjects
        .get(subject)
        .ok_or_else(|| GradebookError::not_found("subject", subject))?;
    entry
        .grades
        .get(grade)
        .ok_or_else(|| GradebookError::not_found("grade", format!("{} / {}", subject, grade)))
}

/// Competencies of one grade, restricted to `ids` when given, in table order.
pub fn select_competencies(entry: &GradeEntry, ids: Option<&[String]>) -> Result<Vec<Competency>> {
    let Some(ids) = ids else {
        return Ok(entry.competencies.clone());
    };
    if let Some(missing) = ids
        .iter()
        .find(|id| !entry.competencies.iter().any(|c| &c.id == *id))
    {
        return Err(GradebookError::not_found("competency", missing.clone()));
    }
    Ok(entry
        .competencies
        .iter()
        .filter(|c| ids.contains(&c.id))
        .cloned()
        .collect())
}
