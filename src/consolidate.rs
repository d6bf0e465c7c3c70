use crate::marks::{Evaluation, MarkField, Marksheet, EMPTY_CELL};
use crate::store::roster::Student;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_SUBJECTS: [&str; 7] = ["BNGA", "ENGL", "MATH", "PSC", "LSC", "HIST", "GEGR"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPair {
    pub written: String,
    pub practical: String,
}

impl CellPair {
    fn empty() -> Self {
        CellPair {
            written: EMPTY_CELL.to_string(),
            practical: EMPTY_CELL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub roll: u32,
    pub name: String,
    /// Flattened in column order: subject, then evaluation.
    pub cells: Vec<CellPair>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub subject: String,
    pub evaluation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consolidated {
    pub year: i64,
    pub section: String,
    pub subjects: Vec<String>,
    pub evaluations: Vec<&'static str>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Rolls that carry stored marks but are not on the current roster.
    pub orphaned_rolls: Vec<u32>,
}

impl Consolidated {
    #[cfg(test)]
    pub fn cell(&self, roll: u32, subject: &str, evaluation: Evaluation) -> Option<&CellPair> {
        let col = self
            .columns
            .iter()
            .position(|c| c.subject == subject && c.evaluation == evaluation.as_str())?;
        self.rows.iter().find(|r| r.roll == roll)?.cells.get(col)
    }
}

/// Merge every sheet of a section into one roll × subject × evaluation
/// matrix.
///
/// Only `subjects` are kept, so the single-subject grid is the same merge
/// with a one-element list. Sheets for other years, sections or unknown
/// subjects are ignored. Marks held for rolls that are not on the roster are
/// left out of the rows and reported in `orphaned_rolls`.
pub fn consolidate(
    year: i64,
    section: &str,
    subjects: &[String],
    roster: &[Student],
    sheets: &[Marksheet],
) -> Consolidated {
    let evaluations = Evaluation::ALL;
    let per_subject = evaluations.len();

    let mut columns = Vec::with_capacity(subjects.len() * per_subject);
    let mut column_index: HashMap<(&str, Evaluation), usize> = HashMap::new();
    for subject in subjects {
        for evaluation in evaluations {
            column_index.insert((subject.as_str(), evaluation), columns.len());
            columns.push(Column {
                subject: subject.clone(),
                evaluation: evaluation.as_str(),
            });
        }
    }

    let mut matrix: BTreeMap<u32, (String, Vec<CellPair>)> = roster
        .iter()
        .map(|s| (s.roll, (s.name.clone(), vec![CellPair::empty(); columns.len()])))
        .collect();

    let mut orphaned: Vec<u32> = Vec::new();
    for sheet in sheets {
        if sheet.key.year != year || sheet.key.section != section {
            continue;
        }
        let Some(&col) = column_index.get(&(sheet.key.subject.as_str(), sheet.key.evaluation))
        else {
            continue;
        };
        for (roll, entry) in &sheet.entries {
            let Some((_, cells)) = matrix.get_mut(roll) else {
                orphaned.push(*roll);
                continue;
            };
            cells[col] = CellPair {
                written: entry.display(MarkField::Written),
                practical: entry.display(MarkField::Practical),
            };
        }
    }
    orphaned.sort_unstable();
    orphaned.dedup();

    Consolidated {
        year,
        section: section.to_string(),
        subjects: subjects.to_vec(),
        evaluations: evaluations.iter().map(|e| e.as_str()).collect(),
        columns,
        rows: matrix
            .into_iter()
            .map(|(roll, (name, cells))| Row { roll, name, cells })
            .collect(),
        orphaned_rolls: orphaned,
    }
}

/// Single-subject projection of [`consolidate`].
pub fn subject_view(
    year: i64,
    section: &str,
    subject: &str,
    roster: &[Student],
    sheets: &[Marksheet],
) -> Consolidated {
    consolidate(year, section, &[subject.to_string()], roster, sheets)
}
