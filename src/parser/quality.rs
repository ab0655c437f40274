use std::fmt;

use super::classify::{company_is_reasonable, Classifiers};
use super::record::{ExtractedRecord, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QaFlag {
    MissingCompany,
    MissingAddedDate,
    MissingWebsite,
    MissingDescription,
    MissingLastFundingType,
    BadAddedDate,
    BadWebsite,
    BadHeadcount,
    BadFounded,
    FutureFounded,
    GarbledCompany,
    UnrecognizedCountry,
}

impl QaFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            QaFlag::MissingCompany => "missing_company",
            QaFlag::MissingAddedDate => "missing_added_date",
            QaFlag::MissingWebsite => "missing_website",
            QaFlag::MissingDescription => "missing_description",
            QaFlag::MissingLastFundingType => "missing_last_funding_type",
            QaFlag::BadAddedDate => "bad_added_date",
            QaFlag::BadWebsite => "bad_website",
            QaFlag::BadHeadcount => "bad_headcount",
            QaFlag::BadFounded => "bad_founded",
            QaFlag::FutureFounded => "future_founded",
            QaFlag::GarbledCompany => "garbled_company",
            QaFlag::UnrecognizedCountry => "unrecognized_country",
        }
    }

    /// The field a flag complains about.
    pub fn field(self) -> Field {
        match self {
            QaFlag::MissingCompany | QaFlag::GarbledCompany => Field::Company,
            QaFlag::MissingAddedDate | QaFlag::BadAddedDate => Field::AddedDate,
            QaFlag::MissingWebsite | QaFlag::BadWebsite => Field::Website,
            QaFlag::MissingDescription => Field::Description,
            QaFlag::MissingLastFundingType => Field::LastFundingType,
            QaFlag::BadHeadcount => Field::Headcount,
            QaFlag::BadFounded | QaFlag::FutureFounded => Field::Founded,
            QaFlag::UnrecognizedCountry => Field::Country,
        }
    }
}

impl fmt::Display for QaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QaAnnotation {
    pub flags: Vec<QaFlag>,
}

impl QaAnnotation {
    pub fn pass(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flag names joined for tabular output.
    pub fn joined(&self) -> String {
        self.flags.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(" ; ")
    }
}

/// A field value blanked before assessment because it contradicted
/// another field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub field: Field,
    pub previous: String,
    pub reason: &'static str,
}

/// Blank numeric fields that cannot both be right. Runs before [`assess`].
pub fn correct(record: &mut ExtractedRecord) -> Vec<Correction> {
    let mut out = Vec::new();

    let total = record.get(Field::TotalFundingM).parse::<f64>();
    let last = record.get(Field::LastFundingAmountM).parse::<f64>();
    if let (Ok(total), Ok(last)) = (total, last) {
        if last > total {
            out.push(Correction {
                field: Field::TotalFundingM,
                previous: record.get(Field::TotalFundingM).to_string(),
                reason: "last_funding_exceeds_total",
            });
            record.clear(Field::TotalFundingM);
        }
    }
    out
}

/// Checklist over a finished record. Never touches field values.
pub fn assess(c: &Classifiers, record: &ExtractedRecord, current_year: i32) -> QaAnnotation {
    let mut flags = Vec::new();
    let mut check = |bad: bool, flag: QaFlag| {
        if bad {
            flags.push(flag);
        }
    };

    let company = record.get(Field::Company);
    let added = record.get(Field::AddedDate);
    let headcount = record.get(Field::Headcount);
    let founded = record.get(Field::Founded);
    let website = record.get(Field::Website);
    let country = record.get(Field::Country);

    check(company.is_empty(), QaFlag::MissingCompany);
    check(added.is_empty(), QaFlag::MissingAddedDate);
    check(record.is_empty(Field::Website), QaFlag::MissingWebsite);
    check(record.is_empty(Field::Description), QaFlag::MissingDescription);
    check(record.is_empty(Field::LastFundingType), QaFlag::MissingLastFundingType);

    check(!added.is_empty() && !c.is_strict_timestamp(added), QaFlag::BadAddedDate);
    check(
        !website.is_empty() && !c.website(website).is_some_and(|d| d.value == website),
        QaFlag::BadWebsite,
    );
    check(!headcount.is_empty() && !c.is_headcount(headcount), QaFlag::BadHeadcount);
    check(!founded.is_empty() && !c.is_year(founded), QaFlag::BadFounded);
    check(
        c.is_year(founded) && founded.parse::<i32>().is_ok_and(|y| y > current_year),
        QaFlag::FutureFounded,
    );
    check(!company.is_empty() && !company_is_reasonable(company), QaFlag::GarbledCompany);
    check(!country.is_empty() && !c.is_known_country(country), QaFlag::UnrecognizedCountry);

    QaAnnotation { flags }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::vocab::Vocabulary;

    fn complete() -> ExtractedRecord {
        let mut r = ExtractedRecord::default();
        r.set(Field::Company, "Acme Robotics");
        r.set(Field::AddedDate, "Jan 5, 2023 10.15 AM");
        r.set(Field::Website, "acme.io");
        r.set(Field::Description, "robots");
        r.set(Field::LastFundingType, "Seed");
        r.set(Field::Headcount, "50-200");
        r.set(Field::Founded, "2019");
        r.set(Field::Country, "USA");
        r
    }

    #[test]
    fn complete_record_passes() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let qa = assess(&c, &complete(), 2026);
        assert!(qa.pass(), "{:?}", qa.flags);
        assert_eq!(qa.joined(), "");
    }

    #[test]
    fn empty_record_gets_required_flags() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let qa = assess(&c, &ExtractedRecord::default(), 2026);
        assert_eq!(
            qa.flags,
            vec![
                QaFlag::MissingCompany,
                QaFlag::MissingAddedDate,
                QaFlag::MissingWebsite,
                QaFlag::MissingDescription,
                QaFlag::MissingLastFundingType,
            ]
        );
        assert!(!qa.pass());
    }

    #[test]
    fn malformed_values_are_flagged() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut r = complete();
        r.set(Field::AddedDate, "Jan 2023");
        r.set(Field::Headcount, "lots");
        r.set(Field::Country, "Atlantis");
        r.set(Field::Company, "~~x");
        let qa = assess(&c, &r, 2026);
        assert_eq!(
            qa.joined(),
            "bad_added_date ; bad_headcount ; garbled_company ; unrecognized_country"
        );
    }

    #[test]
    fn founded_checks() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut r = complete();
        r.set(Field::Founded, "2031");
        assert_eq!(assess(&c, &r, 2026).flags, vec![QaFlag::FutureFounded]);
        r.set(Field::Founded, "19x9");
        assert_eq!(assess(&c, &r, 2026).flags, vec![QaFlag::BadFounded]);
    }

    #[test]
    fn last_amount_above_total_blanks_total() {
        let mut r = ExtractedRecord::default();
        r.set(Field::TotalFundingM, "5");
        r.set(Field::LastFundingAmountM, "10");
        let fixes = correct(&mut r);
        assert_eq!(r.get(Field::TotalFundingM), "");
        assert_eq!(r.get(Field::LastFundingAmountM), "10");
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].previous, "5");
        assert_eq!(fixes[0].reason, "last_funding_exceeds_total");
    }

    #[test]
    fn website_must_be_a_whole_allowed_domain() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut r = complete();
        for bad in ["not a website", "software.com", "see acme.io"] {
            r.set(Field::Website, bad);
            assert_eq!(assess(&c, &r, 2026).flags, vec![QaFlag::BadWebsite], "{bad}");
        }
        r.set(Field::Website, "acme.co");
        assert!(assess(&c, &r, 2026).pass());
    }

    #[test]
    fn consistent_funding_untouched() {
        let mut r = ExtractedRecord::default();
        r.set(Field::TotalFundingM, "12");
        r.set(Field::LastFundingAmountM, "5");
        assert!(correct(&mut r).is_empty());
        assert_eq!(r.get(Field::TotalFundingM), "12");
    }
}
