use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::normalize::{normalize, title_case};
use super::vocab::Vocabulary;
use crate::error::EngineError;

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{MONTHS})[a-z]*\s+\d{{1,2}}\s*,?\s*\d{{4}}\s+\d{{1,2}}\s*\.\s*\d{{2}}\s*[ap]m\b"
    ))
    .unwrap()
});
static STRICT_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]{2}\s+\d{1,2},\s*\d{4}\s+\d{1,2}\.\d{2}\s*[AP]M$").unwrap()
});
static FULL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{MONTHS})[a-z]*\s+\d{{1,2}}\s*,?\s*\d{{4}}\b")).unwrap()
});
static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^(?:{MONTHS})\b")).unwrap());
static HEADCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:,\d{3})?\s*[-\u{2013}]\s*\d+(?:,\d{3})?$").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").unwrap());
static PCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-~]?\d+\s*%").unwrap());

/// A website recognized in a token. `split` marks a domain rebuilt from an
/// OCR-separated `label tld` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub value: String,
    pub split: bool,
}

/// Pattern recognizers over single normalized tokens. Built once per
/// session from a [`Vocabulary`]; every method is pure.
#[derive(Debug, Clone)]
pub struct Classifiers {
    vocab: Vocabulary,
    web_re: Regex,
    spaced_web_re: Regex,
    tld_re: Regex,
}

impl Classifiers {
    pub fn new(vocab: Vocabulary) -> Result<Self, EngineError> {
        let vocab = vocab.normalized();
        if vocab.tlds.is_empty() {
            return Err(EngineError::EmptyVocabulary("tlds"));
        }
        let tlds = vocab
            .tlds
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let web_re = Regex::new(&format!(r"\b[a-z0-9][a-z0-9\-]{{1,}}\.(?:{tlds})\b"))?;
        let spaced_web_re = Regex::new(&format!(r"\b([a-z0-9][a-z0-9\-]{{2,}})\s+({tlds})\b"))?;
        let tld_re = Regex::new(&format!(r"^\.?(?:{tlds})$"))?;
        Ok(Classifiers {
            vocab,
            web_re,
            spaced_web_re,
            tld_re,
        })
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Span of the first capture timestamp (`Jan 5, 2023 10.15 AM`) in `token`.
    pub fn timestamp(&self, token: &str) -> Option<Range<usize>> {
        TIMESTAMP_RE.find(token).map(|m| m.range())
    }

    pub fn is_strict_timestamp(&self, value: &str) -> bool {
        STRICT_TIMESTAMP_RE.is_match(value)
    }

    /// Looser month/day/year date, used for the funding date.
    pub fn full_date(&self, token: &str) -> bool {
        FULL_DATE_RE.is_match(token)
    }

    pub fn starts_with_month(&self, token: &str) -> bool {
        MONTH_RE.is_match(token)
    }

    pub fn website(&self, token: &str) -> Option<Domain> {
        let lower = normalize(token).to_lowercase();
        let exact = self
            .web_re
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .find(|d| !self.denied_label(d.split('.').next().unwrap_or_default()));
        if let Some(value) = exact {
            return Some(Domain {
                value,
                split: false,
            });
        }
        self.spaced_web_re
            .captures_iter(&lower)
            .find(|caps| !self.denied_label(&caps[1]))
            .map(|caps| Domain {
                value: format!("{}.{}", &caps[1], &caps[2]),
                split: true,
            })
    }

    /// A domain OCR split across two adjacent tokens: `"example" "com"`.
    /// Uppercase suffixes (`"US"`, `"DE"`) read as location codes, not TLDs.
    pub fn website_pair(&self, label: &str, tld: &str) -> Option<Domain> {
        if tld.chars().any(|c| c.is_uppercase()) {
            return None;
        }
        let label = normalize(label).to_lowercase();
        let tld = normalize(tld).to_lowercase();
        if !self.tld_re.is_match(&tld) || self.denied_label(&label) {
            return None;
        }
        let ok_label = label.len() >= 3
            && label.starts_with(|c: char| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !ok_label {
            return None;
        }
        Some(Domain {
            value: format!("{}.{}", label, tld.trim_start_matches('.')),
            split: true,
        })
    }

    fn denied_label(&self, label: &str) -> bool {
        self.vocab.denied_domain_labels.iter().any(|d| d == label)
    }

    pub fn is_headcount(&self, token: &str) -> bool {
        HEADCOUNT_RE.is_match(token)
    }

    pub fn is_number(&self, token: &str) -> bool {
        NUMBER_RE.is_match(token)
    }

    pub fn is_year(&self, token: &str) -> bool {
        YEAR_RE.is_match(token)
    }

    /// Bare numbers that are not years. A valid year never counts as money.
    pub fn is_funding_amount(&self, token: &str) -> bool {
        self.is_number(token) && !self.is_year(token)
    }

    /// Whole-token integer of 1..=`max_digits` digits, thousands commas allowed.
    pub fn is_small_int(&self, token: &str, max_digits: usize) -> bool {
        let digits = token.replace(',', "");
        !digits.is_empty()
            && digits.len() <= max_digits
            && digits.chars().all(|c| c.is_ascii_digit())
    }

    /// Every percentage embedded in `token`, whitespace removed.
    pub fn percentages(&self, token: &str) -> Vec<String> {
        PCT_RE
            .find_iter(token)
            .map(|m| m.as_str().split_whitespace().collect::<String>())
            .collect()
    }

    pub fn funding_round(&self, token: &str) -> Option<String> {
        let lower = token.trim().to_lowercase();
        if !self.vocab.funding_rounds.contains(&lower) {
            return None;
        }
        Some(title_case(&lower))
    }

    pub fn ownership_type(&self, token: &str) -> Option<String> {
        let lower = token.trim().to_lowercase();
        if !self.vocab.ownership_types.contains(&lower) {
            return None;
        }
        Some(title_case(&lower))
    }

    pub fn is_ui_noise(&self, token: &str) -> bool {
        let lower = token.trim().to_lowercase();
        self.vocab.ui_noise.contains(&lower)
    }

    pub fn has_contacts_marker(&self, token: &str) -> bool {
        let marker = &self.vocab.contacts_marker;
        !marker.is_empty() && token.to_lowercase().contains(marker.as_str())
    }

    pub fn is_contacts_fragment(&self, token: &str) -> bool {
        let lower = token.trim().to_lowercase();
        self.vocab.contacts_fragments.contains(&lower)
    }

    pub fn is_known_country(&self, token: &str) -> bool {
        let lower = token.trim().to_lowercase();
        self.vocab.countries.contains(&lower)
    }
}

fn plausible_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "&+.,()'\" -".contains(c)
}

/// Rejects names that are mostly OCR garbage.
pub fn company_is_reasonable(name: &str) -> bool {
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return false;
    }
    let plausible: Vec<char> = name.chars().filter(|c| plausible_char(*c)).collect();
    if plausible.len() < 3 {
        return false;
    }
    let bad = name.chars().count() - plausible.len();
    let limit = std::cmp::max(1, name.chars().count() * 15 / 100);
    if bad > limit {
        return false;
    }
    plausible.iter().filter(|c| c.is_alphabetic()).count() >= 2
}
