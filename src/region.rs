use once_cell::sync::Lazy;
use std::collections::BTreeMap;

pub const REST_OF_WORLD: &str = "Rest of World";

static DEFAULT_REGIONS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    let table: &[(&str, &str)] = &[
        ("US", "North America"),
        ("CA", "North America"),
        ("GB", "United Kingdom"),
        ("UK", "United Kingdom"),
        ("IE", "Europe"),
        ("DE", "Europe"),
        ("FR", "Europe"),
        ("NL", "Europe"),
        ("BE", "Europe"),
        ("CH", "Europe"),
        ("ES", "Europe"),
        ("IT", "Europe"),
        ("SE", "Europe"),
        ("DK", "Europe"),
        ("NO", "Europe"),
        ("FI", "Europe"),
        ("JP", "Asia Pacific"),
        ("CN", "Asia Pacific"),
        ("HK", "Asia Pacific"),
        ("TW", "Asia Pacific"),
        ("KR", "Asia Pacific"),
        ("SG", "Asia Pacific"),
        ("IN", "Asia Pacific"),
        ("AU", "Asia Pacific"),
    ];
    table
        .iter()
        .map(|(code, region)| (code.to_string(), region.to_string()))
        .collect()
});

/// Explicit country code to region lookup. Codes not in the table fall into
/// [`REST_OF_WORLD`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    regions: BTreeMap<String, String>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.clone(),
        }
    }
}

impl RegionTable {
    /// Builds a table from configured pairs, or the built-in table when none are given.
    pub fn from_config(regions: &BTreeMap<String, String>) -> Self {
        if regions.is_empty() {
            return Self::default();
        }
        Self {
            regions: regions
                .iter()
                .map(|(code, region)| (normalize(code), region.clone()))
                .collect(),
        }
    }

    pub fn region_of(&self, country: &str) -> &str {
        self.regions
            .get(&normalize(country))
            .map(String::as_str)
            .unwrap_or(REST_OF_WORLD)
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
