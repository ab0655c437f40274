use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::metrics::RunReport;
use crate::parser::assemble::{dedup_key, AssembledRecord, Assembler, SourceRef};
use crate::parser::record::Field;
use crate::parser::row::{Fallbacks, Row};
use crate::parser::{Engine, Outcome};

/// A stored OCR row plus whatever the coarse upstream pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    pub page: i64,
    pub row_index: i64,
    pub row_text: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub added_date: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl InputRow {
    /// Column titles of the source table, captured as a row of their own.
    pub fn is_header(&self) -> bool {
        let lower = self.row_text.to_lowercase();
        lower.contains("status") && lower.contains("added date")
    }

    pub fn source(&self) -> SourceRef {
        SourceRef {
            page: self.page,
            row: self.row_index,
        }
    }

    pub fn to_row(&self) -> Row {
        let non_blank = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Row::from_text(
            &self.row_text,
            Fallbacks {
                company: non_blank(&self.company),
                added_date: non_blank(&self.added_date),
                website: non_blank(&self.website),
            },
        )
    }
}

/// `page,row_index,row_text` plus optional `company,added_date,website`.
pub fn read_rows_csv(path: &Path) -> Result<Vec<InputRow>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("opening {:?}", path))?;
    let mut rows = Vec::new();
    for (i, rec) in reader.deserialize::<InputRow>().enumerate() {
        rows.push(rec.with_context(|| format!("{:?}: bad record {}", path, i + 1))?);
    }
    Ok(rows)
}

/// Something worth a reviewer's look: a drop, a flag or a correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub company: String,
    pub page: i64,
    pub row: i64,
    pub field: String,
    pub issue: String,
    pub detail: String,
}

impl Issue {
    fn new(source: SourceRef, company: &str, field: &str, issue: &str, detail: &str) -> Self {
        Issue {
            company: company.to_string(),
            page: source.page,
            row: source.row,
            field: field.to_string(),
            issue: issue.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChunkOutput {
    pub records: Vec<AssembledRecord>,
    pub issues: Vec<Issue>,
}

fn reconstruct_one(engine: &Engine, input: &InputRow) -> Option<Outcome> {
    if input.is_header() {
        return None;
    }
    Some(engine.reconstruct(&input.to_row()))
}

#[cfg(feature = "rayon")]
fn reconstruct_all(engine: &Engine, rows: &[InputRow]) -> Vec<Option<Outcome>> {
    rows.par_iter().map(|r| reconstruct_one(engine, r)).collect()
}

#[cfg(not(feature = "rayon"))]
fn reconstruct_all(engine: &Engine, rows: &[InputRow]) -> Vec<Option<Outcome>> {
    rows.iter().map(|r| reconstruct_one(engine, r)).collect()
}

/// Batch driver. Rows are reconstructed independently (in parallel with the
/// `rayon` feature); ids, dedup and counting then run in source order so the
/// first occurrence of a duplicate always wins.
pub struct Pipeline<'e> {
    engine: &'e Engine,
    assembler: Assembler,
    seen: HashSet<(String, String, String)>,
    report: RunReport,
}

impl<'e> Pipeline<'e> {
    pub fn new(engine: &'e Engine, run_id: String) -> Self {
        Pipeline {
            engine,
            assembler: Assembler::new(),
            seen: HashSet::new(),
            report: RunReport::new(run_id),
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn process_chunk(&mut self, rows: &[InputRow]) -> ChunkOutput {
        let outcomes = reconstruct_all(self.engine, rows);
        let mut out = ChunkOutput::default();

        for (input, outcome) in rows.iter().zip(outcomes) {
            self.report.rows_in += 1;
            let source = input.source();
            let reconstruction = match outcome {
                None => {
                    self.report.header_rows += 1;
                    continue;
                }
                Some(Outcome::Unparseable(failure)) => {
                    self.report.unparseable += 1;
                    let company = input.company.as_deref().unwrap_or_default();
                    out.issues.push(Issue::new(
                        source,
                        company,
                        Field::AddedDate.name(),
                        failure.as_str(),
                        &failure.to_string(),
                    ));
                    continue;
                }
                Some(Outcome::Record(r)) => *r,
            };

            let company = reconstruction.record.get(Field::Company).to_string();
            let missing = [Field::Company, Field::AddedDate]
                .into_iter()
                .find(|f| reconstruction.record.is_empty(*f));
            if let Some(field) = missing {
                warn!(page = source.page, row = source.row, field = field.name(), "policy drop");
                self.report.policy_drops += 1;
                out.issues
                    .push(Issue::new(source, &company, field.name(), "policy_drop", "required field empty"));
                continue;
            }

            if !self.seen.insert(dedup_key(&reconstruction.record)) {
                self.report.duplicates += 1;
                let website = reconstruction.record.get(Field::Website);
                out.issues
                    .push(Issue::new(source, &company, Field::Company.name(), "duplicate", website));
                continue;
            }
            let record = self.assembler.assemble(reconstruction, source);

            for flag in &record.qa.flags {
                out.issues.push(Issue::new(
                    source,
                    &company,
                    flag.field().name(),
                    flag.as_str(),
                    record.record.get(flag.field()),
                ));
            }
            for fix in &record.corrections {
                out.issues
                    .push(Issue::new(source, &company, fix.field.name(), fix.reason, &fix.previous));
            }
            self.report.observe(&record);
            out.records.push(record);
        }
        out
    }

    pub fn finish(self) -> RunReport {
        let r = &self.report;
        info!(
            run_id = r.run_id(),
            rows_in = r.rows_in,
            records_out = r.records_out,
            unparseable = r.unparseable,
            duplicates = r.duplicates,
            "run complete"
        );
        self.report
    }
}
