use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// One row of tracking data: column header -> cell text.
///
/// Headers keep the casing and order they arrived in. Rows coming from
/// different providers (or different tabs) may carry different headers, so
/// nothing here assumes a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. A repeated header overwrites the earlier value
    /// but keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Exact (case-sensitive) lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

// The backend hands back loosely-typed JSON cells (numbers, booleans, null).
// Everything is flattened to text so both providers produce the same shape.
impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(k, v)| (k, cell_text(v)))
            .collect()
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record
            .fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Department tabs known to the dashboard. Each one selects the sheet tab
/// to read, the person column and the area column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    Shell,
    Modulation,
    #[serde(rename = "MD")]
    Md,
    Area,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Shell,
        Department::Modulation,
        Department::Md,
        Department::Area,
    ];

    /// Name used for the sheet tab and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Shell => "Shell",
            Department::Modulation => "Modulation",
            Department::Md => "MD",
            Department::Area => "Area",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDepartment(pub String);

impl fmt::Display for UnknownDepartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown department '{}'", self.0)
    }
}

impl std::error::Error for UnknownDepartment {}

impl FromStr for Department {
    type Err = UnknownDepartment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Department::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownDepartment(wanted.to_string()))
    }
}

/// Headline numbers shown as cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    /// Whole percent of completed rows.
    pub completion_rate: i64,
    /// Rounded to the nearest square meter.
    pub total_area: i64,
}

/// One bar/slice of a count chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct LabelCount {
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct AreaPoint {
    #[serde(rename = "Project")]
    #[tabled(rename = "Project")]
    pub project: String,
    #[serde(rename = "Area")]
    #[tabled(rename = "Area (sq m)")]
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct TableRow {
    #[serde(rename = "Project Code")]
    #[tabled(rename = "Project Code")]
    pub project_code: String,
    #[serde(rename = "status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "expected date of finish")]
    #[tabled(rename = "Expected Finish")]
    pub expected_finish: String,
    #[serde(rename = "status_class")]
    #[tabled(skip)]
    pub status_class: String,
}

/// Everything the dashboard draws for one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kpis: KpiSummary,
    pub status: Vec<LabelCount>,
    pub work_types: Vec<LabelCount>,
    pub monthly: Vec<LabelCount>,
    pub area_ranking: Vec<AreaPoint>,
    pub table: Vec<TableRow>,
}
