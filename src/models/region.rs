//! Administrative hierarchy types for address resolution.

use serde::{Deserialize, Serialize};

/// The three tiers of the administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionTier {
    /// Province / municipality (top level)
    Province,
    /// Prefecture-level city
    City,
    /// District / county, or a county-level city inside the special province
    Area,
}

impl RegionTier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "province" => Some(RegionTier::Province),
            "city" => Some(RegionTier::City),
            "area" => Some(RegionTier::Area),
            _ => None,
        }
    }
}

/// One record of the reference hierarchy: a province, city or area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Stable identifier within the tier
    pub code: String,
    /// Display name, conventionally carrying a 省/市/区/县 suffix
    pub name: String,
}

impl RegionRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// An area record joined with its owning city, as returned by the
/// province-wide area listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRecord {
    pub code: String,
    pub name: String,
    /// Code of the City-tier parent
    pub city_code: String,
}

/// How a matched province is handled during city/area resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvinceClass {
    /// Province-level city with no intermediate city tier; its direct
    /// area children serve as the "city" result.
    Municipality,
    /// The one province whose city tier mixes prefecture-level and
    /// county-level cities.
    Special,
    Ordinary,
}

/// Resolution output. Each field is independently possibly empty; a
/// non-empty `area` implies a non-empty `city`, and a non-empty `city`
/// implies a non-empty `province`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub province: String,
    pub city: String,
    pub area: String,
}
