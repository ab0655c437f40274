use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::parser::assemble::AssembledRecord;
use crate::parser::record::Field;

/// Aggregate counts for one batch run. A run always completes; bad rows
/// only move these numbers.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    run_id: String,
    pub rows_in: usize,
    pub header_rows: usize,
    pub records_out: usize,
    pub unparseable: usize,
    pub duplicates: usize,
    pub policy_drops: usize,
    pub passed: usize,
    pub failed: usize,
    pub corrections: usize,
    /// Exported values that still contain `|`. Anything but 0 is a bug.
    pub pipe_cells: usize,
    pub missing: BTreeMap<&'static str, usize>,
}

impl RunReport {
    pub fn new(run_id: String) -> Self {
        RunReport {
            run_id,
            ..Self::default()
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Count an accepted record.
    pub fn observe(&mut self, rec: &AssembledRecord) {
        self.records_out += 1;
        if rec.qa.pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.corrections += rec.corrections.len();
        for (field, value) in rec.record.iter() {
            if value.is_empty() {
                *self.missing.entry(field.name()).or_default() += 1;
            }
            if value.contains('|') {
                self.pipe_cells += 1;
            }
        }
    }

    pub fn missing_rate(&self, field: Field) -> f64 {
        if self.records_out == 0 {
            return 0.0;
        }
        self.missing.get(field.name()).copied().unwrap_or_default() as f64 / self.records_out as f64
    }

    /// Flat metric list as stored in `run_metrics`.
    pub fn metrics(&self) -> Vec<(String, f64)> {
        let mut out = vec![
            ("rows_in".to_string(), self.rows_in as f64),
            ("header_rows".to_string(), self.header_rows as f64),
            ("records_out".to_string(), self.records_out as f64),
            ("unparseable".to_string(), self.unparseable as f64),
            ("duplicates".to_string(), self.duplicates as f64),
            ("policy_drops".to_string(), self.policy_drops as f64),
            ("qa_pass".to_string(), self.passed as f64),
            ("qa_fail".to_string(), self.failed as f64),
            ("corrections".to_string(), self.corrections as f64),
            ("pipe_cells".to_string(), self.pipe_cells as f64),
        ];
        out.extend(
            Field::ALL
                .iter()
                .map(|f| (format!("missing_rate.{}", f.name()), self.missing_rate(*f))),
        );
        out
    }

    pub fn persist(&self, conn: &Connection) -> Result<()> {
        db::save_metrics(conn, &self.run_id, &self.metrics())
    }

    pub fn print(&self) {
        println!("Run {}", self.run_id);
        println!("  rows in:      {}", self.rows_in);
        println!("  header rows:  {}", self.header_rows);
        println!("  unparseable:  {}", self.unparseable);
        println!("  duplicates:   {}", self.duplicates);
        println!("  policy drops: {}", self.policy_drops);
        println!("  records out:  {}", self.records_out);
        println!("  qa pass/fail: {} / {}", self.passed, self.failed);
        println!("  corrections:  {}", self.corrections);
        println!("  pipe cells:   {}", self.pipe_cells);
        let worst: Vec<_> = Field::ALL
            .iter()
            .map(|f| (f.name(), self.missing_rate(*f)))
            .filter(|(_, rate)| *rate > 0.0)
            .collect();
        if !worst.is_empty() {
            println!("  missingness:");
            for (name, rate) in worst {
                println!("    {:<28} {:>5.1}%", name, rate * 100.0);
            }
        }
    }
}

static RUN_SEQ: AtomicU32 = AtomicU32::new(0);

/// `run-<UTC timestamp to the microsecond>-<sequence>`; unique within a
/// process even when two runs start in the same microsecond.
pub fn new_run_id() -> String {
    let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("run-{}-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.6f"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::assemble::SourceRef;
    use crate::parser::quality::{QaAnnotation, QaFlag};
    use crate::parser::record::ExtractedRecord;

    fn assembled(company: &str, flags: Vec<QaFlag>) -> AssembledRecord {
        let mut record = ExtractedRecord::default();
        record.set(Field::Company, company);
        AssembledRecord {
            row_id: 1,
            source: SourceRef::default(),
            record,
            qa: QaAnnotation { flags },
            corrections: Vec::new(),
        }
    }

    #[test]
    fn observe_counts_verdicts_and_missingness() {
        let mut report = RunReport::new("run-test".into());
        report.observe(&assembled("Acme", Vec::new()));
        report.observe(&assembled("Beta", vec![QaFlag::MissingWebsite]));
        assert_eq!(report.records_out, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.missing_rate(Field::Company), 0.0);
        assert_eq!(report.missing_rate(Field::Website), 1.0);
        assert_eq!(report.pipe_cells, 0);
    }

    #[test]
    fn metrics_include_every_field_rate() {
        let report = RunReport::new("run-test".into());
        let metrics = report.metrics();
        assert_eq!(metrics.len(), 10 + Field::ALL.len());
        assert!(metrics.iter().any(|(k, _)| k == "missing_rate.growth_extra_2"));
    }

    #[test]
    fn run_ids_are_prefixed() {
        assert!(new_run_id().starts_with("run-"));
    }

    #[test]
    fn back_to_back_run_ids_differ() {
        let ids: Vec<String> = (0..50).map(|_| new_run_id()).collect();
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
