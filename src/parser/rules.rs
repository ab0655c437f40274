use super::classify::Classifiers;
use super::row::Token;

/// Shapes a positional rule can look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Any,
    /// Whole-token integer with at most this many digits.
    SmallInt(usize),
    Year,
    FundingAmount,
    Headcount,
}

impl TokenClass {
    pub fn matches(self, c: &Classifiers, text: &str) -> bool {
        match self {
            TokenClass::Any => true,
            TokenClass::SmallInt(max) => c.is_small_int(text, max),
            TokenClass::Year => c.is_year(text),
            TokenClass::FundingAmount => c.is_funding_amount(text),
            TokenClass::Headcount => c.is_headcount(text),
        }
    }
}

/// Look `start_offset` tokens past an anchor, then at most `max_lookahead`
/// tokens further, for the first token of `class`.
#[derive(Debug, Clone, Copy)]
pub struct ForwardRule {
    pub name: &'static str,
    pub start_offset: usize,
    pub max_lookahead: usize,
    pub class: TokenClass,
}

impl ForwardRule {
    pub fn find(&self, c: &Classifiers, tokens: &[Token], anchor: usize) -> Option<usize> {
        let start = anchor.saturating_add(self.start_offset);
        let end = start.saturating_add(self.max_lookahead).min(tokens.len());
        (start..end).find(|&i| self.class.matches(c, &tokens[i].text))
    }
}

pub const EMPLOYEES: ForwardRule = ForwardRule {
    name: "employees_after_headcount",
    start_offset: 1,
    max_lookahead: 3,
    class: TokenClass::SmallInt(5),
};

pub const LEAD_INVESTOR: ForwardRule = ForwardRule {
    name: "lead_investor_after_round",
    start_offset: 1,
    max_lookahead: 1,
    class: TokenClass::Any,
};

pub const INVESTOR_TYPE: ForwardRule = ForwardRule {
    name: "investor_type_after_round",
    start_offset: 2,
    max_lookahead: 1,
    class: TokenClass::Any,
};

pub const INVESTORS: ForwardRule = ForwardRule {
    name: "investors_after_round",
    start_offset: 3,
    max_lookahead: 1,
    class: TokenClass::Any,
};

/// Up to `n` consecutive tokens from `start`; short runs are fine.
pub fn take_run(tokens: &[Token], start: usize, n: usize) -> &[Token] {
    if start >= tokens.len() {
        return &[];
    }
    let end = start.saturating_add(n).min(tokens.len());
    &tokens[start..end]
}

/// Index of the first token of `class` not rejected by `skip`.
pub fn first_of<F>(c: &Classifiers, tokens: &[Token], class: TokenClass, skip: F) -> Option<usize>
where
    F: Fn(usize) -> bool,
{
    tokens
        .iter()
        .enumerate()
        .find(|(i, t)| !skip(*i) && class.matches(c, &t.text))
        .map(|(i, _)| i)
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

    #[test]
    fn employees_window_is_three_tokens() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let left = toks(&["50-200", "people", "x", "120"]);
        assert_eq!(EMPLOYEES.find(&c, &left, 0), Some(3));
        let far = toks(&["50-200", "a", "b", "c", "120"]);
        assert_eq!(EMPLOYEES.find(&c, &far, 0), None);
    }

    #[test]
    fn window_clamps_at_end() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let right = toks(&["Seed", "Acme Ventures"]);
        assert_eq!(LEAD_INVESTOR.find(&c, &right, 0), Some(1));
        assert_eq!(INVESTOR_TYPE.find(&c, &right, 0), None);
        assert_eq!(INVESTORS.find(&c, &right, usize::MAX), None);
    }

    #[test]
    fn runs_and_first_of() {
        let c = Classifiers::new(Vocabulary::default()).unwrap();
        let t = toks(&["USA", "CA"]);
        assert_eq!(take_run(&t, 0, 4).len(), 2);
        assert!(take_run(&t, 5, 4).is_empty());
        let nums = toks(&["12", "5", "3"]);
        assert_eq!(first_of(&c, &nums, TokenClass::SmallInt(3), |i| i < 2), Some(2));
    }
}
