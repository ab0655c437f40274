mod left;
mod right;

use super::classify::Classifiers;
use super::normalize::{clean_company, normalize_timestamp};
use super::record::{Field, RecordBuilder};
use super::segment::Segments;

/// Run every zone's rules over a segmented row. Each rule is best-effort; a
/// missing sub-anchor only leaves its own fields empty.
pub fn extract(c: &Classifiers, seg: &Segments) -> RecordBuilder {
    let mut b = RecordBuilder::new();

    let company = seg
        .company_token()
        .map(|t| clean_company(&t.text))
        .unwrap_or_default();
    if let Some(t) = seg.company_token() {
        b.claim(t.position);
    }
    b.set(Field::Company, company.clone(), "company_before_date");

    let stamp = c
        .timestamp(&seg.date.text)
        .map(|span| &seg.date.text[span])
        .unwrap_or(&seg.date.text);
    b.set(Field::AddedDate, normalize_timestamp(stamp), "capture_timestamp");
    b.claim(seg.date.position);
    if let Some(contacts) = &seg.contacts {
        b.claim(contacts.position);
    }

    left::extract(c, &seg.left_view(c), &company, &mut b);
    right::extract(c, &seg.right_view(c), &mut b);
    b
}
