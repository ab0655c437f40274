use super::normalize::tokenize;

/// One normalized fragment of a row and its index in the source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: usize,
}

/// Values from a coarser upstream pass, used only when in-row extraction
/// yields nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fallbacks {
    pub company: Option<String>,
    pub added_date: Option<String>,
    pub website: Option<String>,
}

/// An OCR-derived row ready for reconstruction.
#[derive(Debug, Clone, Default)]
pub struct Row {
    tokens: Vec<Token>,
    pub fallbacks: Fallbacks,
}

impl Row {
    pub fn from_text(row_text: &str, fallbacks: Fallbacks) -> Self {
        let tokens = tokenize(row_text)
            .into_iter()
            .enumerate()
            .map(|(position, text)| Token { text, position })
            .collect();
        Row { tokens, fallbacks }
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tokens
            .into_iter()
            .map(|t| t.as_ref().replace('|', " "))
            .collect::<Vec<_>>()
            .join(" | ");
        Row::from_text(&joined, Fallbacks::default())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_non_empty_tokens() {
        let row = Row::from_text("Save || Acme | Jan 5, 2023 10.15 AM", Fallbacks::default());
        let texts: Vec<(&str, usize)> = row
            .tokens()
            .iter()
            .map(|t| (t.text.as_str(), t.position))
            .collect();
        assert_eq!(texts, vec![("Save", 0), ("Acme", 1), ("Jan 5, 2023 10.15 AM", 2)]);
    }

    #[test]
    fn from_tokens_keeps_order() {
        let row = Row::from_tokens(["a", " b ", ""]);
        assert_eq!(row.tokens().len(), 2);
        assert_eq!(row.tokens()[1].text, "b");
    }
}
