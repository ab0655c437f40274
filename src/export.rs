use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::parser::assemble::{AssembledRecord, SourceRef};
use crate::parser::record::{ExtractedRecord, Field};

/// One exported line: identity, all fields, QA verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub row_id: i64,
    pub source: SourceRef,
    pub record: ExtractedRecord,
    pub qa_pass: bool,
    pub qa_flags: String,
}

impl From<&AssembledRecord> for ExportRow {
    fn from(rec: &AssembledRecord) -> Self {
        ExportRow {
            row_id: rec.row_id,
            source: rec.source,
            record: rec.record.clone(),
            qa_pass: rec.qa.pass(),
            qa_flags: rec.qa.joined(),
        }
    }
}

impl ExportRow {
    pub fn cells(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(Field::ALL.len() + 5);
        out.push(self.row_id.to_string());
        out.push(self.source.page.to_string());
        out.push(self.source.row.to_string());
        out.extend(self.record.iter().map(|(_, v)| v.to_string()));
        out.push(if self.qa_pass { "yes" } else { "no" }.to_string());
        out.push(self.qa_flags.clone());
        out
    }
}

pub fn header() -> Vec<&'static str> {
    let mut h = vec!["row_id", "source_page", "source_row"];
    h.extend(Field::ALL.iter().map(|f| f.name()));
    h.extend(["qa_pass", "qa_flags"]);
    h
}

pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow]) -> Result<usize> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(header())?;
    for row in rows {
        w.write_record(row.cells())?;
    }
    w.flush()?;
    Ok(rows.len())
}

pub fn write_csv_file(path: &Path, rows: &[ExportRow]) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    write_csv(file, rows).with_context(|| format!("writing {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::quality::{QaAnnotation, QaFlag};

    fn sample() -> ExportRow {
        let mut record = ExtractedRecord::default();
        record.set(Field::Company, "Acme, Inc");
        record.set(Field::Growth3moHeadcount, "25%");
        let assembled = AssembledRecord {
            row_id: 4,
            source: SourceRef { page: 2, row: 9 },
            record,
            qa: QaAnnotation {
                flags: vec![QaFlag::MissingWebsite, QaFlag::MissingDescription],
            },
            corrections: Vec::new(),
        };
        ExportRow::from(&assembled)
    }

    #[test]
    fn header_has_fixed_order() {
        let h = header();
        assert_eq!(h.len(), 36);
        assert_eq!(&h[..4], &["row_id", "source_page", "source_row", "company"]);
        assert_eq!(h[h.len() - 2..], ["qa_pass", "qa_flags"]);
    }

    #[test]
    fn cells_align_with_header() {
        let row = sample();
        let cells = row.cells();
        assert_eq!(cells.len(), header().len());
        assert_eq!(cells[3], "Acme, Inc");
        assert_eq!(cells[cells.len() - 2], "no");
        assert_eq!(cells[cells.len() - 1], "missing_website ; missing_description");
    }

    #[test]
    fn csv_quotes_commas() {
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &[sample()]).unwrap();
        assert_eq!(n, 1);
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("row_id,source_page,source_row,company,added_date"));
        assert!(lines.next().unwrap().starts_with("4,2,9,\"Acme, Inc\","));
    }
}
