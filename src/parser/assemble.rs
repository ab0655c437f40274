use serde::{Deserialize, Serialize};

use super::classify::Classifiers;
use super::normalize::{clean_company, normalize_timestamp, scrub_placeholders, strip_separators};
use super::quality::{Correction, QaAnnotation};
use super::record::{ExtractedRecord, Field};
use super::row::Fallbacks;
use super::Reconstruction;

/// Page and row a record was read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub page: i64,
    pub row: i64,
}

#[derive(Debug, Clone)]
pub struct AssembledRecord {
    pub row_id: i64,
    pub source: SourceRef,
    pub record: ExtractedRecord,
    pub qa: QaAnnotation,
    pub corrections: Vec<Correction>,
}

/// Identity used to drop repeated captures of the same company.
pub fn dedup_key(record: &ExtractedRecord) -> (String, String, String) {
    (
        record.get(Field::Company).to_lowercase(),
        record.get(Field::Website).to_lowercase(),
        record.get(Field::AddedDate).to_string(),
    )
}

/// Fill company, date and website from the upstream pass where the row
/// itself produced nothing.
pub fn merge_fallbacks(c: &Classifiers, record: &mut ExtractedRecord, fallbacks: &Fallbacks) {
    if record.is_empty(Field::Company) {
        if let Some(company) = &fallbacks.company {
            record.set(Field::Company, clean_company(company));
        }
    }
    if record.is_empty(Field::AddedDate) {
        if let Some(date) = &fallbacks.added_date {
            record.set(Field::AddedDate, normalize_timestamp(date));
        }
    }
    if record.is_empty(Field::Website) {
        if let Some(domain) = fallbacks.website.as_deref().and_then(|w| c.website(w)) {
            record.set(Field::Website, domain.value);
        }
    }
}

/// No value may keep a separator or an OCR "n/a" rendering.
pub fn sanitize(c: &Classifiers, record: &mut ExtractedRecord) {
    let placeholders = &c.vocab().placeholders;
    record.map_values(|field, value| {
        let value = strip_separators(value);
        match field {
            Field::Description | Field::CompanyAddress => scrub_placeholders(&value, placeholders),
            _ => value,
        }
    });
}

/// Hands out row ids in the order records are accepted.
#[derive(Debug)]
pub struct Assembler {
    next_id: i64,
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler { next_id: 1 }
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next_id: i64) -> Self {
        Assembler { next_id }
    }

    pub fn assemble(&mut self, reconstruction: Reconstruction, source: SourceRef) -> AssembledRecord {
        let row_id = self.next_id;
        self.next_id += 1;
        AssembledRecord {
            row_id,
            source,
            record: reconstruction.record,
            qa: reconstruction.qa,
            corrections: reconstruction.corrections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::vocab::Vocabulary;

    #[test]
    fn fallbacks_only_fill_gaps() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut r = ExtractedRecord::default();
        r.set(Field::Website, "acme.io");
        let fb = Fallbacks {
            company: Some("## Acme Robotics".into()),
            added_date: Some("Jan 05 ,2023 10.15 am".into()),
            website: Some("other.com".into()),
        };
        merge_fallbacks(&c, &mut r, &fb);
        assert_eq!(r.get(Field::Company), "Acme Robotics");
        assert_eq!(r.get(Field::AddedDate), "Jan 5, 2023 10.15 AM");
        assert_eq!(r.get(Field::Website), "acme.io");
    }

    #[test]
    fn website_fallback_is_lowercased() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut r = ExtractedRecord::default();
        let fb = Fallbacks {
            website: Some(" Acme.IO ".into()),
            ..Fallbacks::default()
        };
        merge_fallbacks(&c, &mut r, &fb);
        assert_eq!(r.get(Field::Website), "acme.io");
    }

    #[test]
    fn website_fallback_must_be_a_domain() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        for raw in ["software.com", "not a website"] {
            let mut r = ExtractedRecord::default();
            let fb = Fallbacks {
                website: Some(raw.into()),
                ..Fallbacks::default()
            };
            merge_fallbacks(&c, &mut r, &fb);
            assert!(r.is_empty(Field::Website), "{raw} accepted");
        }
    }

    #[test]
    fn sanitize_strips_pipes_and_placeholders() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut r = ExtractedRecord::default();
        r.set(Field::Investors, "A | B");
        r.set(Field::Description, "nla robots");
        r.set(Field::CompanyAddress, "\"Main St 1, Oslo\"");
        sanitize(&c, &mut r);
        assert_eq!(r.get(Field::Investors), "A B");
        assert_eq!(r.get(Field::Description), "robots");
        assert_eq!(r.get(Field::CompanyAddress), "Main St 1, Oslo");
        assert!(r.iter().all(|(_, v)| !v.contains('|')));
    }

    #[test]
    fn dedup_key_ignores_case_except_date() {
        let mut a = ExtractedRecord::default();
        a.set(Field::Company, "Acme");
        a.set(Field::Website, "Acme.io");
        a.set(Field::AddedDate, "Jan 5, 2023 10.15 AM");
        let mut b = a.clone();
        b.set(Field::Company, "ACME");
        b.set(Field::Website, "acme.io");
        assert_eq!(dedup_key(&a), dedup_key(&b));
        b.set(Field::AddedDate, "Jan 6, 2023 10.15 AM");
        assert_ne!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn ids_increase() {
        let mut a = Assembler::starting_at(7);
        let first = a.assemble(Reconstruction::default(), SourceRef { page: 1, row: 2 });
        let second = a.assemble(Reconstruction::default(), SourceRef::default());
        assert_eq!(first.row_id, 7);
        assert_eq!(second.row_id, 8);
        assert_eq!(first.source.row, 2);
    }
}
