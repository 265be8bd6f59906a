// Header lookup for loosely-shaped records.
//
// Sheets are edited by hand, so the same column shows up as "Status",
// "status" or "current status" depending on the tab. Each semantic field is
// declared as an ordered list of candidate headers; the first candidate that
// holds a non-blank value wins.
use crate::types::{Department, Record};
use std::collections::HashMap;

/// A semantic column and the headers it may appear under, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub candidates: &'static [&'static str],
}

pub const STATUS: Field = Field {
    candidates: &["status", "current status"],
};

pub const WORK_TYPE: Field = Field {
    candidates: &["kind of work (select from drop down)", "kind of work", "work type"],
};

pub const CREATED_AT: Field = Field {
    candidates: &["created_at", "created at", "created"],
};

pub const PROJECT_LABEL: Field = Field {
    candidates: &["Project Code", "Project no", "Project name"],
};

/// The table shows the plain status column only, never "current status".
pub const TABLE_STATUS: Field = Field {
    candidates: &["status"],
};

pub const PROJECT_CODE: Field = Field {
    candidates: &["Project Code"],
};

pub const EXPECTED_FINISH: Field = Field {
    candidates: &["expected date of finish"],
};

const TOTAL_AREA: Field = Field {
    candidates: &["total area in sq meter"],
};

const AREA_STATEMENT: Field = Field {
    candidates: &["area statement in sq meter"],
};

/// The Area tab reports a total; every other tab reports an area statement.
pub fn area_field(department: Department) -> Field {
    match department {
        Department::Area => TOTAL_AREA,
        _ => AREA_STATEMENT,
    }
}

impl Field {
    /// First non-blank value among the candidates, trimmed.
    pub fn lookup<'r>(&self, index: &KeyIndex, record: &'r Record) -> Option<&'r str> {
        self.candidates
            .iter()
            .filter_map(|c| index.get(record, c))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// Like [`Field::lookup`] but substitutes `default` for a missing value.
    pub fn lookup_or<'r>(&self, index: &KeyIndex, record: &'r Record, default: &'r str) -> &'r str {
        self.lookup(index, record).unwrap_or(default)
    }
}

/// Case-insensitive view over the headers of a batch of records.
///
/// Built once per batch: maps each lower-cased header to the spellings seen
/// for it, in first-seen order. Rows are then probed with exact lookups.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    by_lower: HashMap<String, Vec<String>>,
}

impl KeyIndex {
    pub fn build(records: &[Record]) -> Self {
        let mut by_lower: HashMap<String, Vec<String>> = HashMap::new();
        for record in records {
            for key in record.keys() {
                let spellings = by_lower.entry(key.to_lowercase()).or_default();
                if !spellings.iter().any(|s| s == key) {
                    spellings.push(key.to_string());
                }
            }
        }
        Self { by_lower }
    }

    /// Value under the header matching `wanted` ignoring case. When a row
    /// carries several spellings, the first non-blank one (in batch order)
    /// wins; if all are blank the first present one is returned.
    pub fn get<'r>(&self, record: &'r Record, wanted: &str) -> Option<&'r str> {
        let mut present = self
            .by_lower
            .get(&wanted.to_lowercase())?
            .iter()
            .filter_map(|spelling| record.get(spelling));
        let first = present.next()?;
        if !first.trim().is_empty() {
            return Some(first);
        }
        Some(present.find(|v| !v.trim().is_empty()).unwrap_or(first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn lookup_ignores_header_case() {
        let rows = vec![rec(&[("Status", "Completed")]), rec(&[("STATUS", "Blocked")])];
        let index = KeyIndex::build(&rows);
        assert_eq!(STATUS.lookup(&index, &rows[0]), Some("Completed"));
        assert_eq!(STATUS.lookup(&index, &rows[1]), Some("Blocked"));
    }

    #[test]
    fn candidates_are_tried_in_order_and_blank_falls_through() {
        let rows = vec![
            rec(&[("kind of work", "Survey"), ("work type", "Other")]),
            rec(&[("kind of work (select from drop down)", "  "), ("work type", "Design")]),
            rec(&[("unrelated", "x")]),
        ];
        let index = KeyIndex::build(&rows);
        assert_eq!(WORK_TYPE.lookup(&index, &rows[0]), Some("Survey"));
        assert_eq!(WORK_TYPE.lookup(&index, &rows[1]), Some("Design"));
        assert_eq!(WORK_TYPE.lookup_or(&index, &rows[2], "Unknown"), "Unknown");
    }

    #[test]
    fn blank_spelling_defers_to_another_spelling_in_the_row() {
        let rows = vec![rec(&[("Status", ""), ("status", "Done")])];
        let index = KeyIndex::build(&rows);
        assert_eq!(STATUS.lookup(&index, &rows[0]), Some("Done"));

        let blank = vec![rec(&[("Status", " "), ("status", "")])];
        let index = KeyIndex::build(&blank);
        assert_eq!(index.get(&blank[0], "status"), Some(" "));
        assert_eq!(STATUS.lookup(&index, &blank[0]), None);
    }

    #[test]
    fn table_status_ignores_current_status() {
        let rows = vec![rec(&[("current status", "On Hold")]), rec(&[("Status", "Done")])];
        let index = KeyIndex::build(&rows);
        assert_eq!(TABLE_STATUS.lookup(&index, &rows[0]), None);
        assert_eq!(TABLE_STATUS.lookup(&index, &rows[1]), Some("Done"));
    }

    #[test]
    fn headers_unknown_to_the_batch_resolve_to_nothing() {
        let rows = vec![rec(&[("A", "1")])];
        let index = KeyIndex::build(&rows);
        let stranger = rec(&[("status", "Completed")]);
        assert_eq!(index.get(&stranger, "status"), None);
        assert_eq!(index.get(&rows[0], "a"), Some("1"));
    }

    #[test]
    fn area_column_depends_on_department() {
        assert_eq!(area_field(Department::Area).candidates, ["total area in sq meter"]);
        assert_eq!(area_field(Department::Shell).candidates, ["area statement in sq meter"]);
        assert_eq!(area_field(Department::Md), area_field(Department::Modulation));
    }
}
