use serde::Deserialize;

const UI_NOISE: &[&str] = &["save", "hide", "gave", "show", "khide", "(hide", "chide", "gve"];
const CONTACTS_FRAGMENTS: &[&str] = &["ntacts", "contacts"];
const OWNERSHIP_TYPES: &[&str] = &[
    "venture capital",
    "private equity",
    "corporate",
    "public",
    "other financial",
];
const FUNDING_ROUNDS: &[&str] = &["series", "seed", "pre-seed", "debt", "grant", "angel"];
const DENIED_DOMAIN_LABELS: &[&str] = &[
    "food",
    "retail",
    "software",
    "technology",
    "corporate",
    "company",
    "profile",
    "marketplace",
    "sustainability",
];
const TLDS: &[&str] = &[
    "com", "io", "co", "ai", "de", "no", "id", "net", "org", "eu", "tech", "cloud", "app", "jp",
    "fr", "uk", "us", "be", "nl", "br", "cn", "ch", "at", "se", "dk", "fi", "it", "es", "pl", "mx",
    "sg", "me", "nz", "gg",
];
const COUNTRIES: &[&str] = &[
    "norway",
    "netherlands",
    "united states",
    "usa",
    "us",
    "france",
    "israel",
    "belgium",
    "germany",
    "china",
    "united kingdom",
    "uk",
    "brazil",
    "indonesia",
    "poland",
    "mexico",
    "austria",
    "switzerland",
    "sweden",
    "denmark",
    "finland",
    "italy",
    "spain",
    "canada",
    "australia",
    "singapore",
    "india",
    "japan",
    "south korea",
    "ireland",
    "portugal",
    "czechia",
    "czech republic",
];
const PLACEHOLDERS: &[&str] = &["nla", "nja", "nfa", "n/a", "nia"];

/// Lookup tables consulted by the classifiers and segmenter.
///
/// All entries are compared lowercase. Every list can be overridden from
/// settings; missing lists keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub ui_noise: Vec<String>,
    pub contacts_marker: String,
    pub contacts_fragments: Vec<String>,
    pub ownership_types: Vec<String>,
    pub funding_rounds: Vec<String>,
    pub denied_domain_labels: Vec<String>,
    pub tlds: Vec<String>,
    pub countries: Vec<String>,
    pub placeholders: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            ui_noise: owned(UI_NOISE),
            contacts_marker: "load contacts".to_string(),
            contacts_fragments: owned(CONTACTS_FRAGMENTS),
            ownership_types: owned(OWNERSHIP_TYPES),
            funding_rounds: owned(FUNDING_ROUNDS),
            denied_domain_labels: owned(DENIED_DOMAIN_LABELS),
            tlds: owned(TLDS),
            countries: owned(COUNTRIES),
            placeholders: owned(PLACEHOLDERS),
        }
    }
}

impl Vocabulary {
    /// Lowercase and trim every entry so lookups can compare directly.
    pub fn normalized(mut self) -> Self {
        let fix = |list: &mut Vec<String>| {
            for item in list.iter_mut() {
                *item = item.trim().to_lowercase();
            }
            list.retain(|s| !s.is_empty());
        };
        fix(&mut self.ui_noise);
        fix(&mut self.contacts_fragments);
        fix(&mut self.ownership_types);
        fix(&mut self.funding_rounds);
        fix(&mut self.denied_domain_labels);
        fix(&mut self.tlds);
        fix(&mut self.countries);
        fix(&mut self.placeholders);
        self.contacts_marker = self.contacts_marker.trim().to_lowercase();
        self
    }
}
