//! Query capability required from the administrative reference store.

use std::future::Future;

use anyhow::Result;

use crate::models::{AreaRecord, RegionRecord};

/// Read-only access to the Province -> City -> Area reference hierarchy.
///
/// Every lookup is an exact-equality join on a parent code; the engine
/// never writes through this trait. Implementations must return records
/// in a stable order so that first-match resolution is deterministic.
pub trait RegionStore {
    /// List all Province-tier records (startup only).
    fn provinces(&self) -> impl Future<Output = Result<Vec<RegionRecord>>> + Send;

    /// List City-tier records whose parent is the given province.
    fn cities_of_province(
        &self,
        province_code: &str,
    ) -> impl Future<Output = Result<Vec<RegionRecord>>> + Send;

    /// List Area-tier records whose parent is the given city.
    fn areas_of_city(
        &self,
        city_code: &str,
    ) -> impl Future<Output = Result<Vec<RegionRecord>>> + Send;

    /// List Area-tier records under the given province, each carrying its
    /// owning city code. Municipalities hang their areas directly off the
    /// province, so this also serves the municipality branch.
    fn areas_of_province(
        &self,
        province_code: &str,
    ) -> impl Future<Output = Result<Vec<AreaRecord>>> + Send;
}
