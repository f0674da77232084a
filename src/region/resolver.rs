//! Top-down address resolution: province, then city, then area.

use anyhow::Result;
use tracing::debug;

use super::cache::RegionCache;
use super::store::RegionStore;
use super::{leading_pair, CITY_SUFFIX, DISTRICT_SUFFIXES};
use crate::models::{ProvinceClass, RegionRecord, ResolvedAddress};

/// Resolves raw shipping addresses into structured province/city/area
/// fields. Holds the startup cache and the reference-store handle for the
/// on-demand child lookups.
///
/// Resolution itself never fails: an address with no recognizable
/// administrative fragment yields empty fields. The only error path is
/// loss of connectivity to the reference store.
pub struct AddressResolver<S> {
    store: S,
    cache: RegionCache,
}

impl<S: RegionStore> AddressResolver<S> {
    pub async fn new(store: S) -> Result<Self> {
        let cache = RegionCache::load(&store).await?;
        Ok(Self { store, cache })
    }

    /// Resolve an address. Each output field is independently possibly
    /// empty, but never with a gap: a non-empty area implies a non-empty
    /// city, which implies a non-empty province.
    pub async fn resolve(&self, address: &str) -> Result<ResolvedAddress> {
        let mut result = ResolvedAddress::default();

        let Some(found) = self.cache.find_province(address) else {
            debug!("No province match for address: {}", address);
            return Ok(result);
        };
        result.province = found.record.name.clone();

        match found.class {
            ProvinceClass::Municipality => {
                self.resolve_municipality(address, &found.record, &mut result)
                    .await?
            }
            ProvinceClass::Special => self.resolve_special(address, &mut result).await?,
            ProvinceClass::Ordinary => {
                self.resolve_ordinary(address, &found.record, &mut result)
                    .await?
            }
        }

        Ok(result)
    }

    /// Municipalities have no city tier; the first area child contained in
    /// the address (with or without its 区/县 suffix) becomes the city
    /// result and the area field stays empty.
    async fn resolve_municipality(
        &self,
        address: &str,
        province: &RegionRecord,
        out: &mut ResolvedAddress,
    ) -> Result<()> {
        let areas = self.store.areas_of_province(&province.code).await?;
        for area in &areas {
            let base = area.name.trim_end_matches(DISTRICT_SUFFIXES);
            if address.contains(&area.name) || address.contains(base) {
                out.city = area.name.clone();
                break;
            }
        }
        Ok(())
    }

    /// Two-pass city match inside the special province: prefecture-level
    /// cities first, county-level cities only when the first pass found
    /// nothing. Both passes compare the leading address pair against the
    /// full name and the name without its 市 suffix.
    async fn resolve_special(&self, address: &str, out: &mut ResolvedAddress) -> Result<()> {
        let Some(prefix) = leading_pair(address) else {
            return Ok(());
        };

        let matched = self
            .cache
            .special_cities()
            .iter()
            .find(|c| city_prefix_match(&c.name, prefix))
            .or_else(|| {
                self.cache
                    .special_county_cities()
                    .iter()
                    .find(|c| city_prefix_match(&c.name, prefix))
            });

        if let Some(city) = matched {
            out.city = city.name.clone();
            if let Some(area) = self.find_area(address, &city.code).await? {
                out.area = area.name;
            }
        }
        Ok(())
    }

    /// Ordinary provinces: try prefecture-level cities by containment,
    /// then fall back to county-level cities found in the area tier.
    async fn resolve_ordinary(
        &self,
        address: &str,
        province: &RegionRecord,
        out: &mut ResolvedAddress,
    ) -> Result<()> {
        let cities = self.store.cities_of_province(&province.code).await?;
        for city in &cities {
            let base = city.name.trim_end_matches(CITY_SUFFIX);
            if address.contains(&city.name) || address.contains(base) {
                out.city = city.name.clone();
                if let Some(area) = self.find_area(address, &city.code).await? {
                    out.area = area.name;
                }
                return Ok(());
            }
        }

        // County-level cities sit in the area tier but read like cities;
        // the owning prefecture city becomes the city result.
        let areas = self.store.areas_of_province(&province.code).await?;
        for area in &areas {
            let base = area.name.trim_end_matches(CITY_SUFFIX);
            if area.name.ends_with(CITY_SUFFIX)
                && (address.contains(&area.name) || address.contains(base))
            {
                if let Some(owner) = cities.iter().find(|c| c.code == area.city_code) {
                    out.city = owner.name.clone();
                    out.area = area.name.clone();
                }
                break;
            }
        }
        Ok(())
    }

    /// First area child of the given city whose full name appears anywhere
    /// in the address. No suffix stripping at this level.
    async fn find_area(&self, address: &str, city_code: &str) -> Result<Option<RegionRecord>> {
        let areas = self.store.areas_of_city(city_code).await?;
        Ok(areas.into_iter().find(|a| address.contains(&a.name)))
    }
}

fn city_prefix_match(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix) || name.trim_end_matches(CITY_SUFFIX).starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AreaRecord;

    /// In-memory reference store mirroring the Scylla table layout.
    struct MemStore {
        provinces: Vec<RegionRecord>,
        cities: Vec<(String, RegionRecord)>,
        areas: Vec<(String, AreaRecord)>,
    }

    impl RegionStore for MemStore {
        async fn provinces(&self) -> Result<Vec<RegionRecord>> {
            Ok(self.provinces.clone())
        }

        async fn cities_of_province(&self, province_code: &str) -> Result<Vec<RegionRecord>> {
            Ok(self
                .cities
                .iter()
                .filter(|(p, _)| p == province_code)
                .map(|(_, c)| c.clone())
                .collect())
        }

        async fn areas_of_city(&self, city_code: &str) -> Result<Vec<RegionRecord>> {
            Ok(self
                .areas
                .iter()
                .filter(|(_, a)| a.city_code == city_code)
                .map(|(_, a)| RegionRecord::new(a.code.clone(), a.name.clone()))
                .collect())
        }

        async fn areas_of_province(&self, province_code: &str) -> Result<Vec<AreaRecord>> {
            Ok(self
                .areas
                .iter()
                .filter(|(p, _)| p == province_code)
                .map(|(_, a)| a.clone())
                .collect())
        }
    }

    fn area(code: &str, name: &str, city_code: &str) -> AreaRecord {
        AreaRecord {
            code: code.to_string(),
            name: name.to_string(),
            city_code: city_code.to_string(),
        }
    }

    fn store() -> MemStore {
        MemStore {
            provinces: vec![
                RegionRecord::new("110000", "北京市"),
                RegionRecord::new("320000", "江苏省"),
                RegionRecord::new("330000", "浙江省"),
            ],
            cities: vec![
                ("320000".to_string(), RegionRecord::new("320100", "南京市")),
                ("320000".to_string(), RegionRecord::new("320500", "苏州市")),
                ("330000".to_string(), RegionRecord::new("330100", "杭州市")),
                ("330000".to_string(), RegionRecord::new("330700", "金华市")),
            ],
            areas: vec![
                ("110000".to_string(), area("110105", "朝阳区", "110100")),
                ("110000".to_string(), area("110108", "海淀区", "110100")),
                ("320000".to_string(), area("320106", "鼓楼区", "320100")),
                ("320000".to_string(), area("320508", "姑苏区", "320500")),
                ("320000".to_string(), area("320583", "昆山市", "320500")),
                ("320000".to_string(), area("320586", "苏州湾市", "320500")),
                ("330000".to_string(), area("330106", "西湖区", "330100")),
                ("330000".to_string(), area("330782", "义乌市", "330700")),
            ],
        }
    }

    async fn resolver() -> AddressResolver<MemStore> {
        AddressResolver::new(store()).await.unwrap()
    }

    #[tokio::test]
    async fn test_municipality_district_as_city() {
        let r = resolver().await;
        let got = r.resolve("北京市朝阳区建国路93号院").await.unwrap();
        assert_eq!(got.province, "北京市");
        assert_eq!(got.city, "朝阳区");
        assert_eq!(got.area, "");
    }

    #[tokio::test]
    async fn test_municipality_suffix_stripped_district() {
        let r = resolver().await;
        let got = r.resolve("北京海淀中关村大街1号").await.unwrap();
        assert_eq!(got.city, "海淀区");
        assert_eq!(got.area, "");
    }

    #[tokio::test]
    async fn test_ordinary_province_full_chain() {
        let r = resolver().await;
        let got = r.resolve("浙江省杭州市西湖区文三路100号").await.unwrap();
        assert_eq!(
            got,
            ResolvedAddress {
                province: "浙江省".to_string(),
                city: "杭州市".to_string(),
                area: "西湖区".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_ordinary_county_city_fallback() {
        // 义乌市 lives in the area tier; its owning prefecture city
        // becomes the city result.
        let r = resolver().await;
        let got = r.resolve("浙江义乌市江东街道青口村").await.unwrap();
        assert_eq!(got.province, "浙江省");
        assert_eq!(got.city, "金华市");
        assert_eq!(got.area, "义乌市");
    }

    #[tokio::test]
    async fn test_special_province_prefecture_city() {
        let r = resolver().await;
        let got = r.resolve("南京市鼓楼区中山路10号").await.unwrap();
        assert_eq!(got.province, "江苏省");
        assert_eq!(got.city, "南京市");
        assert_eq!(got.area, "鼓楼区");
    }

    #[tokio::test]
    async fn test_prefecture_city_wins_shared_prefix() {
        // 苏州湾市 sits in the county-city list with the same leading
        // pair as 苏州市; the prefecture pass runs first and takes it.
        let r = resolver().await;
        let got = r.resolve("苏州市姑苏区平江路88号").await.unwrap();
        assert_eq!(got.province, "江苏省");
        assert_eq!(got.city, "苏州市");
        assert_eq!(got.area, "姑苏区");
    }

    #[tokio::test]
    async fn test_special_province_county_city() {
        let r = resolver().await;
        let got = r.resolve("昆山市玉山镇前进东路").await.unwrap();
        assert_eq!(got.province, "江苏省");
        assert_eq!(got.city, "昆山市");
        assert_eq!(got.area, "");
    }

    #[tokio::test]
    async fn test_special_province_partial_result() {
        // Province recognized, no city fragment: city and area stay empty.
        let r = resolver().await;
        let got = r.resolve("江苏省某处仓库").await.unwrap();
        assert_eq!(got.province, "江苏省");
        assert_eq!(got.city, "");
        assert_eq!(got.area, "");
    }

    #[tokio::test]
    async fn test_empty_and_unmatched_addresses() {
        let r = resolver().await;
        assert_eq!(r.resolve("").await.unwrap(), ResolvedAddress::default());
        assert_eq!(
            r.resolve("somewhere with no admin names").await.unwrap(),
            ResolvedAddress::default()
        );
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let r = resolver().await;
        let first = r.resolve("浙江省杭州市西湖区文三路").await.unwrap();
        let second = r.resolve("浙江省杭州市西湖区文三路").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_gap_in_hierarchy() {
        let r = resolver().await;
        for address in ["北京市朝阳区", "昆山市", "浙江义乌市", "杭州西湖"] {
            let got = r.resolve(address).await.unwrap();
            if !got.area.is_empty() {
                assert!(!got.city.is_empty());
            }
            if !got.city.is_empty() {
                assert!(!got.province.is_empty());
            }
        }
    }
}
