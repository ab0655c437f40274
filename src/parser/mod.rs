pub mod assemble;
pub mod classify;
pub mod extract;
pub mod normalize;
pub mod quality;
pub mod record;
pub mod row;
pub mod rules;
pub mod segment;
pub mod vocab;

use chrono::Datelike;
use tracing::{debug, warn};

use crate::error::{EngineError, RowFailure};
use classify::Classifiers;
use quality::{Correction, QaAnnotation};
use record::{ExtractedRecord, Field};
use row::Row;
use segment::SegmentMode;
use vocab::Vocabulary;

/// Everything the engine learned about one row.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    pub record: ExtractedRecord,
    pub qa: QaAnnotation,
    pub corrections: Vec<Correction>,
    pub mode: SegmentMode,
    /// Rule that produced each in-row field, in export order.
    pub provenance: Vec<(Field, &'static str)>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Record(Box<Reconstruction>),
    Unparseable(RowFailure),
}

impl Outcome {
    pub fn record(&self) -> Option<&Reconstruction> {
        match self {
            Outcome::Record(r) => Some(r),
            Outcome::Unparseable(_) => None,
        }
    }
}

/// One reconstruction session: classifiers built from a vocabulary, plus
/// the calendar year used by the founded-year check.
#[derive(Debug, Clone)]
pub struct Engine {
    classifiers: Classifiers,
    current_year: i32,
}

impl Engine {
    pub fn new(vocab: Vocabulary) -> Result<Self, EngineError> {
        Ok(Engine {
            classifiers: Classifiers::new(vocab)?,
            current_year: chrono::Local::now().year(),
        })
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn classifiers(&self) -> &Classifiers {
        &self.classifiers
    }

    /// segment -> extract -> fallbacks -> sanitize -> correct -> assess.
    /// Total over any row; the only fatal case comes back as data.
    pub fn reconstruct(&self, row: &Row) -> Outcome {
        let c = &self.classifiers;
        let seg = match segment::segment(c, row.tokens()) {
            Ok(seg) => seg,
            Err(failure) => {
                warn!(tokens = row.tokens().len(), reason = failure.as_str(), "row has no date anchor");
                return Outcome::Unparseable(failure);
            }
        };

        let builder = extract::extract(c, &seg);
        let provenance = builder.provenance();
        let mut record = builder.build();
        assemble::merge_fallbacks(c, &mut record, &row.fallbacks);
        assemble::sanitize(c, &mut record);
        let corrections = quality::correct(&mut record);
        let qa = quality::assess(c, &record, self.current_year);
        debug!(
            mode = ?seg.mode,
            fields = provenance.len(),
            flags = qa.flags.len(),
            corrections = corrections.len(),
            "row reconstructed"
        );

        Outcome::Record(Box::new(Reconstruction {
            record,
            qa,
            corrections,
            mode: seg.mode,
            provenance,
        }))
    }
}
