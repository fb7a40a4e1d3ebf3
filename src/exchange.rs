//! Holiday calendar files and roster CSV.

use crate::dates;
use crate::error::{GradebookError, Result};
use crate::model::Student;
use serde::Serialize;

pub const ROSTER_HEADER: &str = "Name,ID,Class Sections";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarFormat {
    Csv,
    Json,
}

impl CalendarFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWarning {
    pub line: usize,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHolidays {
    pub dates: Vec<String>,
    pub total: usize,
    pub warnings: Vec<RowWarning>,
}

/// Always quotes; embedded quotes are doubled.
pub fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Non-blank data lines after the header, with 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .skip(1)
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

pub fn parse_holidays(text: &str, format: CalendarFormat) -> Result<ParsedHolidays> {
    match format {
        CalendarFormat::Csv => Ok(parse_holidays_csv(text)),
        CalendarFormat::Json => parse_holidays_json(text),
    }
}

fn parse_holidays_csv(text: &str) -> ParsedHolidays {
    let mut dates_out = Vec::new();
    let mut warnings = Vec::new();
    let mut total = 0usize;
    for (line_no, line) in data_lines(text) {
        total += 1;
        let fields = parse_csv_record(line);
        let first = fields.first().map(|f| f.trim()).unwrap_or("");
        if first.is_empty() {
            warnings.push(RowWarning {
                line: line_no,
                code: "empty_date",
                message: "first column is empty".to_string(),
            });
            continue;
        }
        match dates::normalize_date(first) {
            Ok(d) => dates_out.push(d),
            Err(e) => warnings.push(RowWarning {
                line: line_no,
                code: "bad_date",
                message: e.to_string(),
            }),
        }
    }
    ParsedHolidays {
        dates: dates_out,
        total,
        warnings,
    }
}

fn parse_holidays_json(text: &str) -> Result<ParsedHolidays> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| GradebookError::parse("calendar JSON", e.to_string()))?;
    let Some(items) = value.as_array() else {
        return Err(GradebookError::parse(
            "calendar JSON",
            "expected an array of date strings",
        ));
    };
    let mut dates_out = Vec::new();
    let mut warnings = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let parsed = item
            .as_str()
            .ok_or_else(|| GradebookError::parse("date", "entry is not a string"))
            .and_then(dates::normalize_date);
        match parsed {
            Ok(d) => dates_out.push(d),
            Err(e) => warnings.push(RowWarning {
                line: i + 1,
                code: "bad_date",
                message: e.to_string(),
            }),
        }
    }
    Ok(ParsedHolidays {
        dates: dates_out,
        total: items.len(),
        warnings,
    })
}

/// One roster line, before ids and timestamps are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub student_id: Option<String>,
    pub class_sections: Vec<String>,
}

pub fn split_sections(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_roster_csv(text: &str) -> (Vec<RosterRow>, Vec<RowWarning>) {
    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for (line_no, line) in data_lines(text) {
        let fields = parse_csv_record(line);
        let name = fields.first().map(|s| s.trim()).unwrap_or("");
        if name.is_empty() {
            warnings.push(RowWarning {
                line: line_no,
                code: "missing_name",
                message: "Name column is empty".to_string(),
            });
            continue;
        }
        let student_id = fields
            .get(1)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let class_sections = fields.get(2).map(|s| split_sections(s)).unwrap_or_default();
        rows.push(RosterRow {
            name: name.to_string(),
            student_id,
            class_sections,
        });
    }
    (rows, warnings)
}

pub fn export_roster_csv(students: &[Student]) -> String {
    let mut csv = String::from(ROSTER_HEADER);
    csv.push('\n');
    for s in students {
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_quote(&s.name),
            csv_quote(s.student_id.as_deref().unwrap_or("")),
            csv_quote(&s.class_sections.join(";"))
        ));
    }
    csv
}
