use tracing::debug;

use crate::parser::classify::{Classifiers, Domain};
use crate::parser::normalize::{alnum_lower, normalize};
use crate::parser::record::{Field, RecordBuilder};
use crate::parser::row::Token;
use crate::parser::rules::{first_of, take_run, TokenClass, EMPLOYEES};

const LOCATION_SLOTS: [Field; 4] = [Field::Country, Field::Region, Field::City, Field::UrlSlug];
const DESCRIPTION_FALLBACK_TOKENS: usize = 8;
const STEM_LEN: usize = 8;

#[derive(Debug, Clone)]
struct WebsiteCandidate {
    index: usize,
    /// Tokens the candidate was read from (two for an OCR-split pair).
    width: usize,
    domain: Domain,
    score: i64,
}

/// Firmographic facts between the date anchor and the contacts marker:
/// description, website, headcount, employees, location.
pub fn extract(c: &Classifiers, left: &[Token], company: &str, b: &mut RecordBuilder) {
    let hc_index = first_of(c, left, TokenClass::Headcount, |_| false);
    if let Some(hc) = hc_index {
        b.set(Field::Headcount, left[hc].text.clone(), "headcount_range");
    }

    if let Some(hc) = hc_index {
        let mut start = hc + 1;
        // a count further out ends the location run instead of starting it
        let mut end = left.len();
        if let Some(emp) = EMPLOYEES.find(c, left, hc) {
            b.set(Field::Employees, left[emp].text.clone(), EMPLOYEES.name);
            if emp == start {
                start = emp + 1;
            } else {
                end = emp;
            }
        }
        if left.get(start).is_some_and(|t| is_bare_digits(&t.text)) {
            start += 1;
        }
        let run = take_run(&left[..end], start, LOCATION_SLOTS.len());
        for (field, token) in LOCATION_SLOTS.iter().zip(run) {
            b.set(*field, token.text.clone(), "location_after_headcount");
        }
    }

    let website = best_website(c, left, hc_index, company);
    if let Some(w) = &website {
        debug!(website = %w.domain.value, index = w.index, score = w.score, "website candidate chosen");
        b.set(Field::Website, w.domain.value.clone(), "website_scored");
    }

    let stop = [website.as_ref().map(|w| w.index), hc_index]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(left.len());
    let description = normalize(
        &left[..stop]
            .iter()
            .filter(|t| !c.is_ui_noise(&t.text) && t.text != company)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    if !description.is_empty() {
        b.set(Field::Description, description, "description_before_structure");
        return;
    }

    let website_span = website.as_ref().map(|w| w.index..w.index + w.width);
    let fallback = left
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            t.text != company
                && !c.is_headcount(&t.text)
                && !c.is_ui_noise(&t.text)
                && !website_span.as_ref().is_some_and(|span| span.contains(i))
        })
        .take(DESCRIPTION_FALLBACK_TOKENS)
        .map(|(_, t)| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    b.set(Field::Description, normalize(&fallback), "description_fallback");
}

fn is_bare_digits(text: &str) -> bool {
    let digits = text.replace(',', "");
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Lowest score wins, earliest index breaks ties. Distance from the
/// headcount and OCR splits add to the score; sharing the company stem
/// subtracts from it.
fn best_website(
    c: &Classifiers,
    left: &[Token],
    hc_index: Option<usize>,
    company: &str,
) -> Option<WebsiteCandidate> {
    let stem: String = alnum_lower(company).chars().take(STEM_LEN).collect();
    let mut candidates = Vec::new();
    for (i, token) in left.iter().enumerate() {
        let (domain, width) = match c.website(&token.text) {
            Some(d) => (d, 1),
            None => match left.get(i + 1).and_then(|next| c.website_pair(&token.text, &next.text)) {
                Some(d) => (d, 2),
                None => continue,
            },
        };
        let mut score = 0i64;
        if let Some(hc) = hc_index {
            score += (i as i64 - hc as i64).abs();
        }
        if domain.split || token.text.contains(' ') {
            score += 2;
        }
        if !stem.is_empty() && alnum_lower(&domain.value).contains(&stem) {
            score -= 2;
        }
        candidates.push(WebsiteCandidate {
            index: i,
            width,
            domain,
            score,
        });
    }
    candidates.into_iter().min_by_key(|w| (w.score, w.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::vocab::Vocabulary;

    fn toks(items: &[&str]) -> Vec<Token> {
        items
            .iter()
            .enumerate()
            .map(|(position, t)| Token {
                text: t.to_string(),
                position,
            })
            .collect()
    }

    fn run(items: &[&str], company: &str) -> RecordBuilder {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let mut b = RecordBuilder::new();
        extract(&c, &toks(items), company, &mut b);
        b
    }

    #[test]
    fn headcount_anchors_employees_and_location() {
        let b = run(&["Acme", "does widgets", "50-200", "120", "USA", "CA", "SF"], "Acme");
        assert_eq!(b.get(Field::Headcount), Some("50-200"));
        assert_eq!(b.get(Field::Employees), Some("120"));
        assert_eq!(b.get(Field::Country), Some("USA"));
        assert_eq!(b.get(Field::Region), Some("CA"));
        assert_eq!(b.get(Field::City), Some("SF"));
        assert_eq!(b.get(Field::UrlSlug), None);
        assert_eq!(b.get(Field::Description), Some("does widgets"));
    }

    #[test]
    fn short_location_run_is_not_an_error() {
        let b = run(&["robots", "11-50", "30", "Norway"], "");
        assert_eq!(b.get(Field::Country), Some("Norway"));
        assert_eq!(b.get(Field::Region), None);
    }

    #[test]
    fn leading_digit_after_employees_is_skipped() {
        let b = run(&["robots", "11-50", "30", "4", "Norway", "Oslo"], "");
        assert_eq!(b.get(Field::Employees), Some("30"));
        assert_eq!(b.get(Field::Country), Some("Norway"));
        assert_eq!(b.get(Field::Region), Some("Oslo"));
    }

    #[test]
    fn distant_count_does_not_swallow_location() {
        let b = run(&["robots", "50-200", "USA", "CA", "94105"], "");
        assert_eq!(b.get(Field::Employees), Some("94105"));
        assert_eq!(b.get(Field::Country), Some("USA"));
        assert_eq!(b.get(Field::Region), Some("CA"));
        assert_eq!(b.get(Field::City), None);
    }

    #[test]
    fn no_headcount_leaves_firmographics_empty() {
        let b = run(&["robots for farms", "acme.io"], "Acme");
        assert_eq!(b.get(Field::Headcount), None);
        assert_eq!(b.get(Field::Country), None);
        assert_eq!(b.get(Field::Website), Some("acme.io"));
        assert_eq!(b.get(Field::Description), Some("robots for farms"));
    }

    #[test]
    fn denied_domain_never_becomes_website() {
        let b = run(&["software.com", "acme.io", "11-50"], "Acme");
        assert_eq!(b.get(Field::Website), Some("acme.io"));
        let b = run(&["software.com", "11-50"], "Acme");
        assert_eq!(b.get(Field::Website), None);
    }

    #[test]
    fn company_stem_beats_distance() {
        // partner.io sits next to the headcount; acmerobotics.com shares the stem
        let b = run(&["robots", "acmerobotics.com", "partner.io", "11-50"], "Acme Robotics");
        assert_eq!(b.get(Field::Website), Some("acmerobotics.com"));
    }

    #[test]
    fn split_candidate_loses_to_compact_one() {
        let b = run(&["widgets", "acme com", "11-50", "other.io"], "");
        assert_eq!(b.get(Field::Website), Some("other.io"));
    }

    #[test]
    fn token_pair_domain() {
        let b = run(&["widgets", "example", "com", "11-50"], "");
        assert_eq!(b.get(Field::Website), Some("example.com"));
        assert_eq!(b.get(Field::Description), Some("widgets"));
    }

    #[test]
    fn description_fallback_when_structure_leads() {
        let b = run(&["50-200", "120", "USA", "makes things"], "Acme");
        assert_eq!(b.rule_for(Field::Description), Some("description_fallback"));
        assert_eq!(b.get(Field::Description), Some("120 USA makes things"));
    }

    #[test]
    fn empty_left_is_fine() {
        let b = run(&[], "Acme");
        assert!(b.provenance().is_empty());
    }
}
