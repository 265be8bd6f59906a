// Aggregation of a department's records into the numbers and series the
// dashboard draws.
//
// Everything here is a pure function of the input rows: no field is ever
// required, missing or unreadable cells fall back to "Unknown", 0 or "".
use crate::fields::{self, KeyIndex};
use crate::people;
use crate::source::Fetched;
use crate::types::{
    AreaPoint, DashboardSummary, Department, KpiSummary, LabelCount, Record, TableRow,
};
use crate::util::{capitalize_first, parse_date_flexible, parse_number, status_class};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const AREA_CHART_LIMIT: usize = 12;
pub const TABLE_LIMIT: usize = 15;
pub const UNKNOWN: &str = "Unknown";
pub const NO_DATA_MESSAGE: &str = "No data found. Check your Sheet ID and department tabs.";

/// Aggregates one batch of records for one department.
///
/// The header index is built once and shared by every chart.
pub struct Aggregator<'a> {
    records: &'a [Record],
    department: Department,
    index: KeyIndex,
}

impl<'a> Aggregator<'a> {
    pub fn new(records: &'a [Record], department: Department) -> Self {
        Self {
            records,
            department,
            index: KeyIndex::build(records),
        }
    }

    fn status_of(&self, record: &'a Record) -> &'a str {
        fields::STATUS.lookup_or(&self.index, record, UNKNOWN)
    }

    fn area_of(&self, record: &'a Record) -> Option<f64> {
        let field = fields::area_field(self.department);
        parse_number(field.lookup(&self.index, record))
    }

    pub fn kpis(&self) -> KpiSummary {
        let total = self.records.len();
        let mut completed = 0usize;
        let mut in_progress = 0usize;
        let mut area_sum = 0.0f64;
        for record in self.records {
            let status = self.status_of(record);
            if status.eq_ignore_ascii_case("completed") {
                completed += 1;
            } else if status.eq_ignore_ascii_case("in progress") {
                in_progress += 1;
            }
            area_sum += self.area_of(record).unwrap_or(0.0);
        }
        let completion_rate = if total > 0 {
            (100.0 * completed as f64 / total as f64).round() as i64
        } else {
            0
        };
        KpiSummary {
            total,
            completed,
            in_progress,
            completion_rate,
            total_area: area_sum.round() as i64,
        }
    }

    /// Count per status. Buckets are keyed case-insensitively so "completed"
    /// and "Completed" land together; the label is the first spelling seen
    /// with its first letter upper-cased. Order is first appearance.
    pub fn status_distribution(&self) -> Vec<LabelCount> {
        let mut order: Vec<LabelCount> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for record in self.records {
            let status = self.status_of(record);
            let key = status.to_lowercase();
            match slots.get(&key) {
                Some(&i) => order[i].count += 1,
                None => {
                    slots.insert(key, order.len());
                    order.push(LabelCount {
                        label: capitalize_first(status),
                        count: 1,
                    });
                }
            }
        }
        order
    }

    /// Count per kind of work, in order of first appearance.
    pub fn work_type_distribution(&self) -> Vec<LabelCount> {
        let mut order: Vec<LabelCount> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for record in self.records {
            let work = fields::WORK_TYPE.lookup_or(&self.index, record, UNKNOWN);
            match slots.get(work) {
                Some(&i) => order[i].count += 1,
                None => {
                    slots.insert(work, order.len());
                    order.push(LabelCount {
                        label: work.to_string(),
                        count: 1,
                    });
                }
            }
        }
        order
    }

    /// Records created per `YYYY-MM`, ascending. Rows without a readable
    /// creation date are left out entirely.
    pub fn monthly_trend(&self) -> Vec<LabelCount> {
        let mut months: BTreeMap<String, usize> = BTreeMap::new();
        for record in self.records {
            let created = fields::CREATED_AT.lookup(&self.index, record);
            if let Some(date) = parse_date_flexible(created) {
                *months.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
            }
        }
        months
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect()
    }

    /// The first records (source order, not ranked by size) with a positive
    /// area, capped at [`AREA_CHART_LIMIT`].
    pub fn area_ranking(&self) -> Vec<AreaPoint> {
        self.records
            .iter()
            .filter_map(|record| {
                let area = self.area_of(record).filter(|a| *a > 0.0)?;
                Some(AreaPoint {
                    project: fields::PROJECT_LABEL
                        .lookup_or(&self.index, record, UNKNOWN)
                        .to_string(),
                    area,
                })
            })
            .take(AREA_CHART_LIMIT)
            .collect()
    }

    /// The first [`TABLE_LIMIT`] records projected onto the table columns.
    pub fn recent_table(&self) -> Vec<TableRow> {
        self.records
            .iter()
            .take(TABLE_LIMIT)
            .map(|record| {
                let status = fields::TABLE_STATUS
                    .lookup(&self.index, record)
                    .unwrap_or_default()
                    .to_string();
                let class = if status.is_empty() {
                    String::new()
                } else {
                    status_class(&status)
                };
                TableRow {
                    project_code: fields::PROJECT_CODE
                        .lookup_or(&self.index, record, "")
                        .to_string(),
                    expected_finish: fields::EXPECTED_FINISH
                        .lookup_or(&self.index, record, "")
                        .to_string(),
                    status,
                    status_class: class,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            kpis: self.kpis(),
            status: self.status_distribution(),
            work_types: self.work_type_distribution(),
            monthly: self.monthly_trend(),
            area_ranking: self.area_ranking(),
            table: self.recent_table(),
        }
    }
}

pub fn build_summary(records: &[Record], department: Department) -> DashboardSummary {
    Aggregator::new(records, department).summary()
}

/// What one dashboard load shows: the person list, the applied person and
/// either a summary or an error message, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub department: Department,
    pub people: Vec<String>,
    pub person: String,
    pub record_count: usize,
    pub summary: Option<DashboardSummary>,
    pub error: Option<String>,
}

/// Run the person filter and the aggregation over a fetch result.
///
/// The person list is taken before filtering so it always offers every
/// name. A requested person missing from that list falls back to "all".
pub fn dashboard_view(fetched: Fetched, department: Department, person: &str) -> DashboardView {
    let people = people::compute_people(&fetched.records, department);
    let wanted = person.trim();
    let person = people
        .iter()
        .find(|p| p.eq_ignore_ascii_case(wanted))
        .cloned()
        .unwrap_or_default();

    if let Some(error) = fetched.error {
        return DashboardView {
            department,
            people,
            person,
            record_count: 0,
            summary: None,
            error: Some(error),
        };
    }

    let records = people::filter_by_person(&fetched.records, department, &person);
    if records.is_empty() {
        return DashboardView {
            department,
            people,
            person,
            record_count: 0,
            summary: None,
            error: Some(NO_DATA_MESSAGE.to_string()),
        };
    }

    DashboardView {
        department,
        people,
        person,
        record_count: records.len(),
        summary: Some(build_summary(&records, department)),
        error: None,
    }
}
