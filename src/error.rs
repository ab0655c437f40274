use thiserror::Error;

/// Failures building a reconstruction session. Row processing itself never
/// fails; see [`RowFailure`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vocabulary list `{0}` must not be empty")]
    EmptyVocabulary(&'static str),

    #[error("invalid vocabulary pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Why a row produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowFailure {
    #[error("no capture date anchor in row")]
    NoDateAnchor,
}

impl RowFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowFailure::NoDateAnchor => "no_added_date",
        }
    }
}
