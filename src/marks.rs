use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

pub const EMPTY_CELL: &str = "-";
pub const PRACTICAL_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Evaluation {
    First,
    Second,
    Third,
}

impl Evaluation {
    pub const ALL: [Evaluation; 3] = [Evaluation::First, Evaluation::Second, Evaluation::Third];

    pub fn as_str(self) -> &'static str {
        match self {
            Evaluation::First => "1",
            Evaluation::Second => "2",
            Evaluation::Third => "3",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(Evaluation::First),
            "2" => Some(Evaluation::Second),
            "3" => Some(Evaluation::Third),
            _ => None,
        }
    }

    /// The final evaluation carries the long written paper.
    pub fn written_max(self) -> f64 {
        match self {
            Evaluation::Third => 90.0,
            _ => 40.0,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    New,
    Draft,
    Submitted,
    PendingUnlock,
}

impl SheetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetStatus::New => "new",
            SheetStatus::Draft => "draft",
            SheetStatus::Submitted => "submitted",
            SheetStatus::PendingUnlock => "pending_unlock",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "new" => Some(SheetStatus::New),
            "draft" => Some(SheetStatus::Draft),
            "submitted" => Some(SheetStatus::Submitted),
            "pending_unlock" => Some(SheetStatus::PendingUnlock),
            _ => None,
        }
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkField {
    Written,
    Practical,
}

impl MarkField {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkField::Written => "written",
            MarkField::Practical => "practical",
        }
    }

    /// Accepts the long names and the W/P column letters used by the grids.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "written" | "W" | "w" => Some(MarkField::Written),
            "practical" | "P" | "p" => Some(MarkField::Practical),
            _ => None,
        }
    }

    pub fn max_for(self, evaluation: Evaluation) -> f64 {
        match self {
            MarkField::Written => evaluation.written_max(),
            MarkField::Practical => PRACTICAL_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub year: i64,
    pub section: String,
    pub subject: String,
    pub evaluation: Evaluation,
}

impl SheetKey {
    pub fn new(
        year: i64,
        section: impl Into<String>,
        subject: impl Into<String>,
        evaluation: Evaluation,
    ) -> AppResult<Self> {
        let section = section.into().trim().to_string();
        let subject = subject.into().trim().to_string();
        if year <= 0 {
            return Err(AppError::validation_with(
                "year must be a positive integer",
                json!({ "year": year }),
            ));
        }
        if section.is_empty() {
            return Err(AppError::validation("section must not be empty"));
        }
        if subject.is_empty() {
            return Err(AppError::validation("subject must not be empty"));
        }
        Ok(SheetKey {
            year,
            section,
            subject,
            evaluation,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "year": self.year,
            "section": self.section,
            "subject": self.subject,
            "evaluation": self.evaluation.as_str(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkEntry {
    pub written: Option<String>,
    pub practical: Option<String>,
}

impl MarkEntry {
    pub fn get(&self, field: MarkField) -> Option<&str> {
        match field {
            MarkField::Written => self.written.as_deref(),
            MarkField::Practical => self.practical.as_deref(),
        }
    }

    pub fn set(&mut self, field: MarkField, value: Option<String>) {
        match field {
            MarkField::Written => self.written = value,
            MarkField::Practical => self.practical = value,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.written.is_some() && self.practical.is_some()
    }

    /// Display form used by the grids: missing values become `-`.
    pub fn display(&self, field: MarkField) -> String {
        self.get(field)
            .filter(|v| !v.is_empty())
            .unwrap_or(EMPTY_CELL)
            .to_string()
    }
}

pub type Entries = BTreeMap<u32, MarkEntry>;

#[derive(Debug, Clone, PartialEq)]
pub struct Marksheet {
    pub key: SheetKey,
    pub status: SheetStatus,
    pub entries: Entries,
}

impl Marksheet {
    /// What a key with no stored document reads as.
    pub fn unsaved(key: SheetKey) -> Self {
        Marksheet {
            key,
            status: SheetStatus::New,
            entries: Entries::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "year": self.key.year,
            "section": self.key.section,
            "subject": self.key.subject,
            "evaluation": self.key.evaluation.as_str(),
            "status": self.status.as_str(),
            "entries": entries_to_json(&self.entries),
        })
    }
}

pub fn entries_to_json(entries: &Entries) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(roll, e)| {
            (
                roll.to_string(),
                json!({ "written": e.written, "practical": e.practical }),
            )
        })
        .collect();
    serde_json::Value::Object(map)
}

/// Canonical persisted form of a typed mark.
///
/// Blank input is stored as no value. Anything that parses as a finite
/// number loses leading zeros and trailing fraction zeros (`"007"` -> `"7"`,
/// `"7.50"` -> `"7.5"`). Other text is kept as typed, minus surrounding
/// whitespace.
pub fn canonical_mark(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_finite(trimmed) {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", v as i64)),
        Some(v) => Some(format!("{v}")),
        None => Some(trimmed.to_string()),
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    // Rust's float parser also accepts "inf"/"nan" spellings; those stay text.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode one entries object from the wire: `{"<roll>": {"written", "practical"}}`.
///
/// Roll keys must be positive integers. Values may be strings, numbers or
/// null and are canonicalised.
pub fn parse_entries(raw: &serde_json::Value) -> AppResult<Entries> {
    let Some(obj) = raw.as_object() else {
        return Err(AppError::validation("entries must be an object keyed by roll"));
    };
    let mut out = Entries::new();
    for (roll_key, cell) in obj {
        let roll = match roll_key.trim().parse::<u32>() {
            Ok(r) if r > 0 => r,
            _ => {
                return Err(AppError::validation_with(
                    "entry keys must be positive roll numbers",
                    json!({ "roll": roll_key }),
                ))
            }
        };
        let Some(cell) = cell.as_object() else {
            return Err(AppError::validation_with(
                "entry must be an object with written/practical",
                json!({ "roll": roll }),
            ));
        };
        let mut entry = MarkEntry::default();
        for field in [MarkField::Written, MarkField::Practical] {
            let value = match cell.get(field.as_str()) {
                None | Some(serde_json::Value::Null) => None,
                Some(v) => Some(mark_value_text(v).ok_or_else(|| {
                    AppError::validation_with(
                        "mark values must be strings, numbers or null",
                        json!({ "roll": roll, "field": field.as_str() }),
                    )
                })?),
            };
            entry.set(field, value.as_deref().and_then(canonical_mark));
        }
        out.insert(roll, entry);
    }
    Ok(out)
}

pub fn mark_value_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Null => Some(String::new()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsWarning {
    pub roll: u32,
    pub field: &'static str,
    pub value: String,
    pub max: f64,
}

/// Numeric values outside `[0, max]` for their column. Non-numeric text is
/// not a bounds problem.
pub fn bounds_warnings(evaluation: Evaluation, entries: &Entries) -> Vec<BoundsWarning> {
    let mut out = Vec::new();
    for (&roll, entry) in entries {
        for field in [MarkField::Written, MarkField::Practical] {
            if let Some(w) = check_bound(evaluation, roll, field, entry.get(field)) {
                out.push(w);
            }
        }
    }
    out
}

pub fn check_bound(
    evaluation: Evaluation,
    roll: u32,
    field: MarkField,
    value: Option<&str>,
) -> Option<BoundsWarning> {
    let raw = value?;
    let v = parse_finite(raw)?;
    let max = field.max_for(evaluation);
    if (0.0..=max).contains(&v) {
        return None;
    }
    Some(BoundsWarning {
        roll,
        field: field.as_str(),
        value: raw.to_string(),
        max,
    })
}
