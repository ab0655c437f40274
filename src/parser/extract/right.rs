use itertools::Itertools;

use crate::parser::classify::Classifiers;
use crate::parser::record::{Field, RecordBuilder};
use crate::parser::row::Token;
use crate::parser::rules::{first_of, TokenClass, INVESTORS, INVESTOR_TYPE, LEAD_INVESTOR};

const INVESTMENT_COUNT: TokenClass = TokenClass::SmallInt(3);

/// Ownership, funding, investors and growth after the contacts marker.
/// Rules run in a fixed order; the permissive ones at the end skip tokens
/// earlier rules claimed.
pub fn extract(c: &Classifiers, right: &[Token], b: &mut RecordBuilder) {
    if let Some((i, label)) = right
        .iter()
        .enumerate()
        .find_map(|(i, t)| c.ownership_type(&t.text).map(|l| (i, l)))
    {
        b.set(Field::OwnershipType, label, "ownership_label");
        b.claim(right[i].position);
    }

    if let Some(i) = first_of(c, right, TokenClass::Year, |_| false) {
        b.set(Field::Founded, right[i].text.clone(), "founded_year");
        b.claim(right[i].position);
    }

    let amounts = right
        .iter()
        .filter(|t| TokenClass::FundingAmount.matches(c, &t.text))
        .take(2)
        .collect_vec();
    for (field, token) in [Field::TotalFundingM, Field::LastFundingAmountM].iter().zip(&amounts) {
        b.set(*field, token.text.clone(), "funding_amount_order");
        b.claim(token.position);
    }

    funding_date(c, right, b);
    funding_round(c, right, b);

    if let Some(i) = first_of(c, right, INVESTMENT_COUNT, |i| b.is_claimed(right[i].position)) {
        b.set(Field::InvestmentCount, right[i].text.clone(), "investment_count_permissive");
    }

    let growth = right
        .iter()
        .flat_map(|t| c.percentages(&t.text))
        .unique()
        .take(Field::GROWTH.len());
    for (field, pct) in Field::GROWTH.iter().zip(growth) {
        b.set(*field, pct, "growth_percentages");
    }

    if let Some(t) = right
        .iter()
        .rev()
        .filter(|t| !b.is_claimed(t.position))
        .find(|t| t.text.contains(';') || t.text.contains(", "))
    {
        b.set(Field::CompanyAddress, t.text.clone(), "address_last_separated");
    }
}

/// A full date token, otherwise a month name followed by a year token.
fn funding_date(c: &Classifiers, right: &[Token], b: &mut RecordBuilder) {
    if let Some(t) = right.iter().find(|t| c.full_date(&t.text)) {
        b.set(Field::LastFundingDate, t.text.clone(), "funding_full_date");
        b.claim(t.position);
        return;
    }
    if let Some((month, year)) = right
        .iter()
        .tuple_windows()
        .find(|(m, y)| c.starts_with_month(&m.text) && c.is_year(&y.text))
    {
        b.set(
            Field::LastFundingDate,
            format!("{} {}", month.text, year.text),
            "funding_month_year",
        );
        b.claim(month.position);
        b.claim(year.position);
    }
}

fn funding_round(c: &Classifiers, right: &[Token], b: &mut RecordBuilder) {
    let Some((round, label)) = right
        .iter()
        .enumerate()
        .find_map(|(i, t)| c.funding_round(&t.text).map(|l| (i, l)))
    else {
        return;
    };
    b.set(Field::LastFundingType, label, "funding_round_label");
    b.claim(right[round].position);
    for (field, rule) in [
        (Field::LastFundingLeadInvestor, LEAD_INVESTOR),
        (Field::InvestorType, INVESTOR_TYPE),
        (Field::Investors, INVESTORS),
    ] {
        if let Some(i) = rule.find(c, right, round) {
            b.set(field, right[i].text.clone(), rule.name);
            b.claim(right[i].position);
        }
    }
}
