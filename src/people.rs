// Responsible-person listing and filtering.
//
// Every department records who worked a row in its own column. Only that
// column is consulted: a "Shell Plan By" value in an MD row is ignored.
use crate::fields::KeyIndex;
use crate::types::{Department, Record};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static PERSON_KEY_MAP: Lazy<HashMap<Department, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (Department::Shell, "Shell Plan By"),
        (Department::Modulation, "Modulation Done By"),
        (Department::Md, "MD Done By"),
        (Department::Area, "Area Done By"),
    ])
});

/// Header holding the responsible person for `department`, if one is mapped.
pub fn person_column(department: Department) -> Option<&'static str> {
    PERSON_KEY_MAP.get(&department).copied()
}

/// Distinct person names for the department, sorted for a dropdown.
pub fn compute_people(records: &[Record], department: Department) -> Vec<String> {
    distinct_names(records, person_column(department))
}

/// Distinct non-blank values of `column` across `records`.
///
/// Names differing only by case collapse into one entry that keeps the
/// first-seen spelling ("Alice" and "ALICE" -> "Alice"). Ordering is
/// case-insensitive with the exact spelling as tie-break, so the list is
/// stable for identical input. No column means no names.
pub fn distinct_names(records: &[Record], column: Option<&str>) -> Vec<String> {
    let Some(column) = column else {
        return Vec::new();
    };
    let index = KeyIndex::build(records);
    let mut seen: HashSet<String> = HashSet::new();
    let mut names: Vec<String> = Vec::new();
    for record in records {
        let name = index.get(record, column).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            names.push(name.to_string());
        }
    }
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    names
}

/// Keep the rows whose person column matches `chosen` ignoring case and
/// surrounding whitespace. A blank choice keeps every row.
pub fn filter_by_person(records: &[Record], department: Department, chosen: &str) -> Vec<Record> {
    filter_by_column(records, person_column(department), chosen)
}

pub fn filter_by_column(records: &[Record], column: Option<&str>, chosen: &str) -> Vec<Record> {
    let wanted = chosen.trim().to_lowercase();
    if wanted.is_empty() {
        return records.to_vec();
    }
    let index = KeyIndex::build(records);
    records
        .iter()
        .filter(|record| {
            let value = column
                .and_then(|c| index.get(record, c))
                .unwrap_or("")
                .trim()
                .to_lowercase();
            value == wanted
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_rows(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                [("Project Code", format!("P-{}", i)), ("Shell Plan By", n.to_string())]
                    .into_iter()
                    .collect()
            })
            .collect()
    }

    #[test]
    fn names_collapse_case_and_sort() {
        let rows = shell_rows(&["Alice", "bob", "ALICE"]);
        assert_eq!(compute_people(&rows, Department::Shell), vec!["Alice", "bob"]);
    }

    #[test]
    fn sort_is_case_insensitive_and_stable() {
        let rows = shell_rows(&["carol", "Bob", " alice ", "", "Dave"]);
        let first = compute_people(&rows, Department::Shell);
        assert_eq!(first, vec!["alice", "Bob", "carol", "Dave"]);
        assert_eq!(compute_people(&rows, Department::Shell), first);
    }

    #[test]
    fn only_the_department_column_counts() {
        let rows = shell_rows(&["Alice"]);
        assert!(compute_people(&rows, Department::Md).is_empty());
    }

    #[test]
    fn person_header_matches_ignoring_case() {
        let rows: Vec<Record> = vec![[("md done by", "Priya")].into_iter().collect()];
        assert_eq!(compute_people(&rows, Department::Md), vec!["Priya"]);
    }

    #[test]
    fn unmapped_column_gives_no_names() {
        let rows = shell_rows(&["Alice"]);
        assert!(distinct_names(&rows, None).is_empty());
        assert!(filter_by_column(&rows, None, "Alice").is_empty());
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let rows = shell_rows(&["Alice", "bob", "ALICE"]);
        let picked = filter_by_person(&rows, Department::Shell, "  alice ");
        let codes: Vec<_> = picked.iter().filter_map(|r| r.get("Project Code")).collect();
        assert_eq!(codes, vec!["P-0", "P-2"]);
    }

    #[test]
    fn blank_choice_keeps_everything() {
        let rows = shell_rows(&["Alice", "bob"]);
        assert_eq!(filter_by_person(&rows, Department::Shell, "   "), rows);
    }

    #[test]
    fn every_department_is_mapped() {
        for d in Department::ALL {
            assert!(person_column(d).is_some(), "{} has no person column", d);
        }
    }
}
