use tracing::debug;

use super::classify::Classifiers;
use super::row::Token;
use crate::error::RowFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Prefix,
    Left,
    Right,
}

/// Contiguous slice of a row's tokens with one semantic role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub kind: ZoneKind,
    pub tokens: Vec<Token>,
}

impl Zone {
    fn new(kind: ZoneKind, tokens: &[Token]) -> Self {
        Zone {
            kind,
            tokens: tokens.to_vec(),
        }
    }
}

/// `Degraded` means the contacts marker was missing: everything after the
/// date anchor lands in `left` and `right` is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmentMode {
    #[default]
    Anchored,
    Degraded,
}

#[derive(Debug, Clone)]
pub struct Segments {
    pub date: Token,
    pub contacts: Option<Token>,
    /// Row index of the company name candidate, if any substantive token
    /// precedes the date.
    pub company_index: Option<usize>,
    pub prefix: Zone,
    pub left: Zone,
    pub right: Zone,
    pub mode: SegmentMode,
}

impl Segments {
    pub fn company_token(&self) -> Option<&Token> {
        let idx = self.company_index?;
        self.prefix.tokens.iter().find(|t| t.position == idx)
    }

    /// `left` without UI-noise tokens.
    pub fn left_view(&self, c: &Classifiers) -> Vec<Token> {
        self.left
            .tokens
            .iter()
            .filter(|t| !c.is_ui_noise(&t.text))
            .cloned()
            .collect()
    }

    /// `right` without the split-off tail of the contacts marker.
    pub fn right_view(&self, c: &Classifiers) -> Vec<Token> {
        self.right
            .tokens
            .iter()
            .filter(|t| !c.is_contacts_fragment(&t.text))
            .cloned()
            .collect()
    }

    /// Zones and anchors back in row order.
    pub fn reassemble(&self) -> Vec<Token> {
        let mut out = self.prefix.tokens.clone();
        out.push(self.date.clone());
        out.extend(self.left.tokens.iter().cloned());
        if let Some(contacts) = &self.contacts {
            out.push(contacts.clone());
        }
        out.extend(self.right.tokens.iter().cloned());
        out
    }
}

#[derive(Clone, Copy)]
enum State {
    SeekDate,
    SeekContacts { date: usize },
    Done { date: usize, contacts: Option<usize> },
}

/// Split a row into prefix / left / right around the capture timestamp and
/// the contacts marker. The first timestamp is always the primary anchor.
pub fn segment(c: &Classifiers, tokens: &[Token]) -> Result<Segments, RowFailure> {
    let mut state = State::SeekDate;
    let mut i = 0;
    while i < tokens.len() {
        state = match state {
            State::SeekDate if c.timestamp(&tokens[i].text).is_some() => {
                State::SeekContacts { date: i }
            }
            State::SeekContacts { date } if c.has_contacts_marker(&tokens[i].text) => State::Done {
                date,
                contacts: Some(i),
            },
            State::Done { .. } => break,
            other => other,
        };
        i += 1;
    }

    let (date, contacts) = match state {
        State::SeekDate => return Err(RowFailure::NoDateAnchor),
        State::SeekContacts { date } => (date, None),
        State::Done { date, contacts } => (date, contacts),
    };

    let company_index = (0..date).rev().find(|&j| !c.is_ui_noise(&tokens[j].text));

    let (left, right, mode) = match contacts {
        Some(lc) if lc > date => (&tokens[date + 1..lc], &tokens[lc + 1..], SegmentMode::Anchored),
        _ => (&tokens[date + 1..], &tokens[tokens.len()..], SegmentMode::Degraded),
    };
    let contacts = match mode {
        SegmentMode::Anchored => contacts.map(|lc| tokens[lc].clone()),
        SegmentMode::Degraded => None,
    };

    debug!(
        date_index = date,
        contacts_index = ?contacts.as_ref().map(|t| t.position),
        company_index = ?company_index,
        mode = ?mode,
        "segmented row"
    );

    Ok(Segments {
        date: tokens[date].clone(),
        contacts,
        company_index,
        prefix: Zone::new(ZoneKind::Prefix, &tokens[..date]),
        left: Zone::new(ZoneKind::Left, left),
        right: Zone::new(ZoneKind::Right, right),
        mode,
    })
}
