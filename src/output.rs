use crate::reports::DashboardView;
use crate::types::DashboardSummary;
use crate::util::format_int;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write the table projection, the area chart data and the full summary
/// into `dir`. Returns the files written.
pub fn export_summary(dir: &Path, summary: &DashboardSummary) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let table = dir.join("table.csv");
    let area = dir.join("area_ranking.csv");
    let json = dir.join("summary.json");
    write_csv(&table, &summary.table)?;
    write_csv(&area, &summary.area_ranking)?;
    write_json(&json, summary)?;
    Ok(vec![table, area, json])
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Print one dashboard load the way the page lays it out: cards, the four
/// charts as tables, then the recent records.
pub fn print_view(view: &DashboardView) {
    let person = if view.person.is_empty() { "All" } else { view.person.as_str() };
    println!("Department: {}  Person: {}", view.department, person);
    if !view.people.is_empty() {
        println!("People: {}", view.people.join(", "));
    }
    println!("");

    let Some(summary) = &view.summary else {
        println!(
            "Error: {}\n",
            view.error.as_deref().unwrap_or("No data found.")
        );
        return;
    };

    let k = &summary.kpis;
    println!(
        "Total Projects: {} | Completed: {} | In Progress: {} | Completion Rate: {}% | Total Area: {} sq m\n",
        format_int(k.total),
        format_int(k.completed),
        format_int(k.in_progress),
        k.completion_rate,
        format_int(k.total_area)
    );
    preview_table("Status Distribution", &summary.status, usize::MAX);
    preview_table("Work Type Analysis", &summary.work_types, usize::MAX);
    preview_table("Monthly Progress", &summary.monthly, usize::MAX);
    preview_table("Area by Project", &summary.area_ranking, usize::MAX);
    preview_table("Recent Records", &summary.table, usize::MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::build_summary;
    use crate::types::{Department, Record};

    #[test]
    fn export_writes_three_files() {
        let rows: Vec<Record> = vec![
            [("Project Code", "P-1"), ("status", "Completed"), ("area statement in sq meter", "1,200")]
                .into_iter()
                .collect(),
            [("Project Code", "P-2"), ("status", "On Hold")].into_iter().collect(),
        ];
        let summary = build_summary(&rows, Department::Shell);
        let dir = tempfile::tempdir().unwrap();
        let written = export_summary(dir.path(), &summary).unwrap();
        assert_eq!(written.len(), 3);

        let table = std::fs::read_to_string(dir.path().join("table.csv")).unwrap();
        let mut lines = table.lines();
        assert_eq!(
            lines.next(),
            Some("Project Code,status,expected date of finish,status_class")
        );
        assert_eq!(lines.next(), Some("P-1,Completed,,status-completed"));
        assert_eq!(lines.next(), Some("P-2,On Hold,,status-on-hold"));

        let area = std::fs::read_to_string(dir.path().join("area_ranking.csv")).unwrap();
        assert_eq!(area.lines().collect::<Vec<_>>(), vec!["Project,Area", "P-1,1200.0"]);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(json["kpis"]["total_area"], 1200);
        assert_eq!(json["kpis"]["completed"], 1);
    }
}
