//! Startup indices for province-level matching.

use anyhow::{Context, Result};
use tracing::info;

use super::store::RegionStore;
use super::{leading_pair, CITY_SUFFIX, MUNICIPALITIES, SPECIAL_PROVINCE};
use crate::models::{ProvinceClass, RegionRecord};

/// A province-level hit, tagged with how its city/area tiers are resolved.
#[derive(Debug, Clone)]
pub struct ProvinceMatch {
    pub record: RegionRecord,
    pub class: ProvinceClass,
}

/// Immutable indices built once from the reference store: all provinces,
/// the municipality subset, and the special province's two city lists.
///
/// When the special province is missing from the reference data the
/// dependent lists stay empty and resolution degrades to no-match.
pub struct RegionCache {
    provinces: Vec<RegionRecord>,
    municipalities: Vec<RegionRecord>,
    special: Option<RegionRecord>,
    special_cities: Vec<RegionRecord>,
    special_county_cities: Vec<RegionRecord>,
}

impl RegionCache {
    pub async fn load<S: RegionStore>(store: &S) -> Result<Self> {
        let provinces = store
            .provinces()
            .await
            .context("Failed to load provinces from reference store")?;

        let municipalities: Vec<RegionRecord> = provinces
            .iter()
            .filter(|p| MUNICIPALITIES.contains(&p.name.as_str()))
            .cloned()
            .collect();

        let special = provinces.iter().find(|p| p.name == SPECIAL_PROVINCE).cloned();

        let (special_cities, special_county_cities) = match &special {
            Some(province) => {
                let cities = store
                    .cities_of_province(&province.code)
                    .await
                    .context("Failed to load special-province cities")?;
                // County-level cities live in the area tier but carry the
                // city suffix.
                let county_cities = store
                    .areas_of_province(&province.code)
                    .await
                    .context("Failed to load special-province county cities")?
                    .into_iter()
                    .filter(|a| a.name.ends_with(CITY_SUFFIX))
                    .map(|a| RegionRecord::new(a.code, a.name))
                    .collect();
                (cities, county_cities)
            }
            None => (Vec::new(), Vec::new()),
        };

        info!(
            "Region cache loaded: {} provinces, {} municipalities, {} special cities, {} county cities",
            provinces.len(),
            municipalities.len(),
            special_cities.len(),
            special_county_cities.len()
        );

        Ok(Self {
            provinces,
            municipalities,
            special,
            special_cities,
            special_county_cities,
        })
    }

    /// Find the province a raw address belongs to, first match wins:
    /// two-character prefix against province names, then full municipality
    /// names at the start of the address, then the special province's
    /// prefecture and county city names (either of which selects the
    /// special province itself, not the city).
    pub fn find_province(&self, address: &str) -> Option<ProvinceMatch> {
        if let Some(prefix) = leading_pair(address) {
            for province in &self.provinces {
                if province.name.starts_with(prefix) {
                    return Some(self.tag(province.clone()));
                }
            }
        }

        for municipality in &self.municipalities {
            if address.starts_with(&municipality.name) {
                return Some(self.tag(municipality.clone()));
            }
        }

        if let (Some(prefix), Some(special)) = (leading_pair(address), &self.special) {
            if self
                .special_cities
                .iter()
                .any(|c| c.name.starts_with(prefix))
            {
                return Some(self.tag(special.clone()));
            }
            if self
                .special_county_cities
                .iter()
                .any(|c| c.name.starts_with(prefix))
            {
                return Some(self.tag(special.clone()));
            }
        }

        None
    }

    /// Classify by name membership, independent of which matching step hit.
    pub fn classify(&self, province_name: &str) -> ProvinceClass {
        if MUNICIPALITIES.contains(&province_name) {
            ProvinceClass::Municipality
        } else if province_name == SPECIAL_PROVINCE {
            ProvinceClass::Special
        } else {
            ProvinceClass::Ordinary
        }
    }

    pub fn special_cities(&self) -> &[RegionRecord] {
        &self.special_cities
    }

    pub fn special_county_cities(&self) -> &[RegionRecord] {
        &self.special_county_cities
    }

    fn tag(&self, record: RegionRecord) -> ProvinceMatch {
        let class = self.classify(&record.name);
        ProvinceMatch { record, class }
    }
}
