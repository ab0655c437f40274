use std::collections::{BTreeMap, BTreeSet};

/// Every output field of a reconstructed company row, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Company,
    AddedDate,
    Description,
    Website,
    Headcount,
    Employees,
    Country,
    Region,
    City,
    UrlSlug,
    OwnershipType,
    Founded,
    TotalFundingM,
    LastFundingAmountM,
    LastFundingDate,
    LastFundingType,
    LastFundingLeadInvestor,
    InvestorType,
    Investors,
    InvestmentCount,
    CompanyAddress,
    Growth3moHeadcount,
    Growth6moHeadcount,
    Growth1yrHeadcount,
    Growth2yrHeadcount,
    Growth3yrHeadcount,
    Growth4yrHeadcount,
    Growth5yrHeadcount,
    Growth3moWebTraffic,
    GrowthExtra1,
    GrowthExtra2,
}

pub const FIELD_COUNT: usize = 31;

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Company,
        Field::AddedDate,
        Field::Description,
        Field::Website,
        Field::Headcount,
        Field::Employees,
        Field::Country,
        Field::Region,
        Field::City,
        Field::UrlSlug,
        Field::OwnershipType,
        Field::Founded,
        Field::TotalFundingM,
        Field::LastFundingAmountM,
        Field::LastFundingDate,
        Field::LastFundingType,
        Field::LastFundingLeadInvestor,
        Field::InvestorType,
        Field::Investors,
        Field::InvestmentCount,
        Field::CompanyAddress,
        Field::Growth3moHeadcount,
        Field::Growth6moHeadcount,
        Field::Growth1yrHeadcount,
        Field::Growth2yrHeadcount,
        Field::Growth3yrHeadcount,
        Field::Growth4yrHeadcount,
        Field::Growth5yrHeadcount,
        Field::Growth3moWebTraffic,
        Field::GrowthExtra1,
        Field::GrowthExtra2,
    ];

    /// Growth slots in assignment order.
    pub const GROWTH: [Field; 10] = [
        Field::Growth3moHeadcount,
        Field::Growth6moHeadcount,
        Field::Growth1yrHeadcount,
        Field::Growth2yrHeadcount,
        Field::Growth3yrHeadcount,
        Field::Growth4yrHeadcount,
        Field::Growth5yrHeadcount,
        Field::Growth3moWebTraffic,
        Field::GrowthExtra1,
        Field::GrowthExtra2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Company => "company",
            Field::AddedDate => "added_date",
            Field::Description => "description",
            Field::Website => "website",
            Field::Headcount => "headcount",
            Field::Employees => "employees",
            Field::Country => "country",
            Field::Region => "region",
            Field::City => "city",
            Field::UrlSlug => "url_slug",
            Field::OwnershipType => "ownership_type",
            Field::Founded => "founded",
            Field::TotalFundingM => "total_funding_m",
            Field::LastFundingAmountM => "last_funding_amount_m",
            Field::LastFundingDate => "last_funding_date",
            Field::LastFundingType => "last_funding_type",
            Field::LastFundingLeadInvestor => "last_funding_lead_investor",
            Field::InvestorType => "investor_type",
            Field::Investors => "investors",
            Field::InvestmentCount => "investment_count",
            Field::CompanyAddress => "company_address",
            Field::Growth3moHeadcount => "growth_3mo_headcount",
            Field::Growth6moHeadcount => "growth_6mo_headcount",
            Field::Growth1yrHeadcount => "growth_1yr_headcount",
            Field::Growth2yrHeadcount => "growth_2yr_headcount",
            Field::Growth3yrHeadcount => "growth_3yr_headcount",
            Field::Growth4yrHeadcount => "growth_4yr_headcount",
            Field::Growth5yrHeadcount => "growth_5yr_headcount",
            Field::Growth3moWebTraffic => "growth_3mo_web_traffic",
            Field::GrowthExtra1 => "growth_extra_1",
            Field::GrowthExtra2 => "growth_extra_2",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Flat field -> value mapping; the empty string means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    values: [String; FIELD_COUNT],
}

impl ExtractedRecord {
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn clear(&mut self, field: Field) {
        self.values[field.index()].clear();
    }

    pub fn is_empty(&self, field: Field) -> bool {
        self.values[field.index()].is_empty()
    }

    /// Values in export order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    pub fn growth(&self) -> Vec<&str> {
        Field::GROWTH.iter().map(|f| self.get(*f)).collect()
    }

    pub fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(Field, &str) -> String,
    {
        for field in Field::ALL {
            let next = f(field, self.get(field));
            self.set(field, next);
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    rule: &'static str,
}

/// In-progress record. Each field is set at most once, by a named rule;
/// rules may claim the token positions they consumed.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    slots: BTreeMap<Field, Slot>,
    claimed: BTreeSet<usize>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First write wins; empty values are ignored. Returns whether the value
    /// was taken.
    pub fn set(&mut self, field: Field, value: impl Into<String>, rule: &'static str) -> bool {
        let value = value.into();
        if value.is_empty() || self.slots.contains_key(&field) {
            return false;
        }
        self.slots.insert(field, Slot { value, rule });
        true
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slots.get(&field).map(|s| s.value.as_str())
    }

    /// Name of the rule that produced `field`, if any did.
    pub fn rule_for(&self, field: Field) -> Option<&'static str> {
        self.slots.get(&field).map(|s| s.rule)
    }

    pub fn claim(&mut self, position: usize) {
        self.claimed.insert(position);
    }

    pub fn is_claimed(&self, position: usize) -> bool {
        self.claimed.contains(&position)
    }

    /// Which rule set each populated field, in export order.
    pub fn provenance(&self) -> Vec<(Field, &'static str)> {
        self.slots.iter().map(|(f, s)| (*f, s.rule)).collect()
    }

    pub fn build(self) -> ExtractedRecord {
        let mut record = ExtractedRecord::default();
        for (field, slot) in self.slots {
            record.set(field, slot.value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_matches_indices() {
        for (i, f) in Field::ALL.iter().enumerate() {
            assert_eq!(f.index(), i, "{}", f.name());
        }
        assert_eq!(Field::ALL[0].name(), "company");
        assert_eq!(Field::ALL[FIELD_COUNT - 1].name(), "growth_extra_2");
    }

    #[test]
    fn builder_first_write_wins() {
        let mut b = RecordBuilder::new();
        assert!(b.set(Field::Founded, "2019", "founded_year"));
        assert!(!b.set(Field::Founded, "2020", "founded_year"));
        assert!(!b.set(Field::Website, "", "website_scored"));
        assert_eq!(b.rule_for(Field::Founded), Some("founded_year"));
        assert_eq!(b.rule_for(Field::Website), None);
        let record = b.build();
        assert_eq!(record.get(Field::Founded), "2019");
        assert!(record.is_empty(Field::Website));
    }

    #[test]
    fn claims_are_tracked() {
        let mut b = RecordBuilder::new();
        b.claim(3);
        assert!(b.is_claimed(3));
        assert!(!b.is_claimed(4));
    }
}
