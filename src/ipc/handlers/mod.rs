pub mod assignments;
pub mod backup_exchange;
pub mod calendar;
pub mod core;
pub mod grades;
pub mod rubrics;
pub mod schedule;
pub mod students;
pub mod view;
