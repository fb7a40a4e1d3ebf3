//! Repository layer over the key-value table. Every write replaces the whole
//! collection under its key; multi-collection changes run in one transaction.

use crate::db::{self, KEY_ASSIGNMENTS, KEY_GRADES, KEY_RUBRICS, KEY_SCHEDULE, KEY_STUDENTS};
use crate::error::{GradebookError, Result};
use crate::model::{Assignment, GradeBook, Rubric, ScheduleConfig, Student};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait Entity: Serialize + DeserializeOwned + Clone {
    const KEY: &'static str;
    const KIND: &'static str;

    fn id(&self) -> &str;
}

impl Entity for Student {
    const KEY: &'static str = KEY_STUDENTS;
    const KIND: &'static str = "student";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Rubric {
    const KEY: &'static str = KEY_RUBRICS;
    const KIND: &'static str = "rubric";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Assignment {
    const KEY: &'static str = KEY_ASSIGNMENTS;
    const KIND: &'static str = "assignment";

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct Repo<'c, E> {
    conn: &'c Connection,
    _entity: PhantomData<E>,
}

impl<'c, E: Entity> Repo<'c, E> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    pub fn list(&self) -> Result<Vec<E>> {
        db::kv_get_json(self.conn, E::KEY)
    }

    pub fn get(&self, id: &str) -> Result<Option<E>> {
        Ok(self.list()?.into_iter().find(|e| e.id() == id))
    }

    pub fn require(&self, id: &str) -> Result<E> {
        self.get(id)?
            .ok_or_else(|| GradebookError::not_found(E::KIND, id))
    }

    /// Replaces the entity with the same id in place, or appends it.
    /// Returns true when the entity is new.
    pub fn upsert(&self, entity: E) -> Result<bool> {
        let mut items = self.list()?;
        let created = match items.iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => {
                *slot = entity;
                false
            }
            None => {
                items.push(entity);
                true
            }
        };
        self.save_all(&items)?;
        Ok(created)
    }

    pub fn append_all(&self, entities: Vec<E>) -> Result<usize> {
        let mut items = self.list()?;
        let n = entities.len();
        items.extend(entities);
        self.save_all(&items)?;
        Ok(n)
    }

    /// Returns false when nothing had that id; the collection is not rewritten then.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut items = self.list()?;
        let before = items.len();
        items.retain(|e| e.id() != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save_all(&items)?;
        Ok(true)
    }

    pub fn save_all(&self, items: &[E]) -> Result<()> {
        db::kv_set_json(self.conn, E::KEY, &items)
    }
}

pub fn load_schedule(conn: &Connection) -> Result<ScheduleConfig> {
    db::kv_get_json(conn, KEY_SCHEDULE)
}

pub fn save_schedule(conn: &Connection, cfg: &ScheduleConfig) -> Result<()> {
    db::kv_set_json(conn, KEY_SCHEDULE, cfg)
}

pub fn load_grades(conn: &Connection) -> Result<GradeBook> {
    db::kv_get_json(conn, KEY_GRADES)
}

pub fn save_grades(conn: &Connection, grades: &GradeBook) -> Result<()> {
    db::kv_set_json(conn, KEY_GRADES, grades)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDeleteSummary {
    pub deleted: bool,
    pub grades_removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricDeleteSummary {
    pub deleted: bool,
    pub assignments_removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDeleteSummary {
    pub deleted: bool,
    pub grades_removed: usize,
}

/// Removes a student and every grade cell keyed by that student.
pub fn delete_student_cascade(conn: &Connection, student_id: &str) -> Result<StudentDeleteSummary> {
    let tx = conn.unchecked_transaction()?;
    if !Repo::<Student>::new(&tx).delete(student_id)? {
        return Err(GradebookError::not_found("student", student_id));
    }
    let mut grades = load_grades(&tx)?;
    let grades_removed = grades.remove_student(student_id);
    if grades_removed > 0 {
        save_grades(&tx, &grades)?;
    }
    tx.commit()?;
    tracing::info!(student_id, grades_removed, "student deleted");
    Ok(StudentDeleteSummary {
        deleted: true,
        grades_removed,
    })
}

/// Removes a rubric and the assignments that reference it. Grade cells of the
/// removed assignments stay in `grades` as orphans.
pub fn delete_rubric_cascade(conn: &Connection, rubric_id: &str) -> Result<RubricDeleteSummary> {
    let tx = conn.unchecked_transaction()?;
    if !Repo::<Rubric>::new(&tx).delete(rubric_id)? {
        return Err(GradebookError::not_found("rubric", rubric_id));
    }
    let assignments = Repo::<Assignment>::new(&tx);
    let mut items = assignments.list()?;
    let before = items.len();
    items.retain(|a| a.rubric_id != rubric_id);
    let assignments_removed = before - items.len();
    if assignments_removed > 0 {
        assignments.save_all(&items)?;
    }
    tx.commit()?;
    tracing::info!(rubric_id, assignments_removed, "rubric deleted");
    Ok(RubricDeleteSummary {
        deleted: true,
        assignments_removed,
    })
}

pub fn delete_assignment_cascade(
    conn: &Connection,
    assignment_id: &str,
) -> Result<AssignmentDeleteSummary> {
    let tx = conn.unchecked_transaction()?;
    if !Repo::<Assignment>::new(&tx).delete(assignment_id)? {
        return Err(GradebookError::not_found("assignment", assignment_id));
    }
    let mut grades = load_grades(&tx)?;
    let grades_removed = grades.remove_assignment(assignment_id);
    save_grades(&tx, &grades)?;
    tx.commit()?;
    tracing::info!(assignment_id, grades_removed, "assignment deleted");
    Ok(AssignmentDeleteSummary {
        deleted: true,
        grades_removed,
    })
}

/// Every persisted collection, keyed exactly as in storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(rename = "scheduleConfig", default)]
    pub schedule_config: ScheduleConfig,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(rename = "savedRubrics", default)]
    pub saved_rubrics: Vec<Rubric>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub grades: GradeBook,
}

pub fn read_snapshot(conn: &Connection) -> Result<StateSnapshot> {
    Ok(StateSnapshot {
        schedule_config: load_schedule(conn)?,
        students: Repo::<Student>::new(conn).list()?,
        saved_rubrics: Repo::<Rubric>::new(conn).list()?,
        assignments: Repo::<Assignment>::new(conn).list()?,
        grades: load_grades(conn)?,
    })
}

/// Replaces all five collections atomically.
pub fn replace_snapshot(conn: &Connection, snapshot: &StateSnapshot) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    save_schedule(&tx, &snapshot.schedule_config)?;
    Repo::<Student>::new(&tx).save_all(&snapshot.students)?;
    Repo::<Rubric>::new(&tx).save_all(&snapshot.saved_rubrics)?;
    Repo::<Assignment>::new(&tx).save_all(&snapshot.assignments)?;
    save_grades(&tx, &snapshot.grades)?;
    tx.commit()?;
    Ok(())
}
