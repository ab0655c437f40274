use std::sync::LazyLock;

use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static LEAD_JUNK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^A-Za-z0-9]+").unwrap());
static TRAIL_JUNK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^A-Za-z0-9&+.,()'"/ -]+$"#).unwrap());
static COMMA_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\d{4})").unwrap());
static TIMESTAMP_PARTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{1,2})\s*,?\s*(\d{4})\s+(\d{1,2})\s*\.\s*(\d{2})\s*([ap])m\b",
    )
    .unwrap()
});

/// Canonical token form: typographic apostrophes and dashes become ASCII,
/// whitespace runs collapse to one space, ends are trimmed.
pub fn normalize(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect();
    WS_RE.replace_all(replaced.trim(), " ").trim().to_string()
}

/// Split a `|`-joined row text into normalized, non-empty tokens.
pub fn tokenize(row_text: &str) -> Vec<String> {
    row_text
        .split('|')
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn clean_company(raw: &str) -> String {
    let s = normalize(raw);
    let s = LEAD_JUNK_RE.replace(&s, "");
    let s = TRAIL_JUNK_RE.replace(&s, "");
    s.trim_matches(|c| c == ' ' || c == '|' || c == '-').to_string()
}

/// Repair OCR spacing around a capture timestamp and render it as
/// `Mon D, YYYY H.MM AM` when it parses. Anything else is returned repaired
/// but otherwise untouched.
pub fn normalize_timestamp(raw: &str) -> String {
    let s = normalize(raw).replace(" ,", ",").replace(" .", ".");
    let s = COMMA_YEAR_RE.replace_all(&s, ", $1").to_string();
    let Some(caps) = TIMESTAMP_PARTS_RE.captures(&s) else {
        return s;
    };
    let month = title_case(&caps[1]);
    let day: u32 = caps[2].parse().unwrap_or_default();
    let hour: u32 = caps[4].parse().unwrap_or_default();
    let meridiem = caps[6].to_uppercase();
    format!("{} {}, {} {}.{} {}M", month, day, &caps[3], hour, &caps[5], meridiem)
}

/// Drop OCR renderings of "n/a" from free text.
pub fn scrub_placeholders(text: &str, placeholders: &[String]) -> String {
    let kept: Vec<&str> = text
        .split(' ')
        .filter(|word| {
            let w = word.trim_matches(|c: char| c == ',' || c == ';').to_lowercase();
            !placeholders.iter().any(|p| *p == w)
        })
        .collect();
    normalize(&kept.join(" "))
        .trim_matches(|c| c == ' ' || c == '|' || c == ',' || c == ';')
        .to_string()
}

/// No exported value may carry the zone separator or stray edge quotes.
pub fn strip_separators(value: &str) -> String {
    let s = normalize(&value.replace('|', " "));
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == ' ')
        .to_string()
}

pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for c in s.chars() {
        if boundary {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        boundary = !c.is_alphanumeric();
    }
    out
}

/// Lowercase alphanumerics only; used for stem comparisons.
pub fn alnum_lower(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_dashes() {
        assert_eq!(normalize("  50 \u{2013}\t200  "), "50 - 200");
        assert_eq!(normalize("Acme\u{2019}s"), "Acme's");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent_on_samples() {
        for s in ["  a  b ", "x\u{2014}y", "\u{201C}q\u{201D}", "\n\t"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn tokenize_drops_empty_fragments() {
        assert_eq!(tokenize("Save | | Acme |  "), vec!["Save", "Acme"]);
    }

    #[test]
    fn company_cleanup() {
        assert_eq!(clean_company("@@ Acme Robotics ~~"), "Acme Robotics");
        assert_eq!(clean_company("- Foo & Bar -"), "Foo & Bar");
        assert_eq!(clean_company("***"), "");
    }

    #[test]
    fn timestamp_canonical_form() {
        assert_eq!(normalize_timestamp("Jan 05 ,2023 09.15 am"), "Jan 5, 2023 9.15 AM");
        assert_eq!(normalize_timestamp("January 5, 2023 10.15 PM"), "Jan 5, 2023 10.15 PM");
        assert_eq!(normalize_timestamp("not a date"), "not a date");
    }

    #[test]
    fn timestamp_spacing_around_minute_dot() {
        assert_eq!(normalize_timestamp("Jan 5, 2023 10. 15 AM"), "Jan 5, 2023 10.15 AM");
        assert_eq!(normalize_timestamp("Mar 2 ,2023 11 . 40 pm"), "Mar 2, 2023 11.40 PM");
    }

    #[test]
    fn placeholders_removed() {
        let ph = vec!["nla".to_string(), "n/a".to_string()];
        assert_eq!(scrub_placeholders("nla | Oslo; n/a", &ph), "Oslo");
        assert_eq!(scrub_placeholders("Main St 5, Oslo", &ph), "Main St 5, Oslo");
    }

    #[test]
    fn separators_stripped() {
        assert_eq!(strip_separators("\"acme | robotics\""), "acme robotics");
        assert_eq!(strip_separators("|"), "");
    }
}
