//! Price search over indexed shipments.
//!
//! Matches the caller's location text against the *stored*
//! province/city/area strings with containment rules; it never re-runs
//! address resolution.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use waybill::elasticsearch::EsClient;
use waybill::goods::GoodsClassifier;
use waybill::models::Shipment;

/// Search parameters
pub struct PriceParams {
    pub location: String,
    pub goods_type: Option<String>,
}

/// Unit-price statistics over the matched shipments
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PriceStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// One matched shipment, summarized for the caller
#[derive(Debug, Serialize, Deserialize)]
pub struct PriceItem {
    pub goods: String,
    pub quantity: String,
    pub price: f64,
    pub destination: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceReport {
    pub stats: PriceStats,
    pub items: Vec<PriceItem>,
}

/// Administrative suffixes removed from the caller's location text.
/// Order matters: 区 is stripped before 地区 is consulted, mirroring the
/// historical normalization.
const LOCATION_SUFFIXES: [&str; 6] = ["省", "市", "区", "县", "自治州", "地区"];

/// Strip administrative suffixes anywhere in the location text.
pub fn normalize_location(location: &str) -> String {
    let mut normalized = location.trim().to_string();
    for suffix in LOCATION_SUFFIXES {
        normalized = normalized.replace(suffix, "");
    }
    normalized
}

/// Execute a price search: newest ten shipments whose stored region
/// fields contain the location fragment, optionally filtered by goods.
pub async fn execute_price_search(
    client: &EsClient,
    classifier: &GoodsClassifier,
    params: PriceParams,
) -> Result<PriceReport> {
    let location = normalize_location(&params.location);
    let goods_type = params
        .goods_type
        .as_deref()
        .map(|g| classifier.classify(g))
        .filter(|g| !g.is_empty());

    let location_pattern = format!("*{}*", location);
    let mut must = vec![json!({
        "bool": {
            "should": [
                { "wildcard": { "province": { "value": &location_pattern } } },
                { "wildcard": { "city": { "value": &location_pattern } } },
                { "wildcard": { "area": { "value": &location_pattern } } }
            ],
            "minimum_should_match": 1
        }
    })];

    if let Some(goods) = &goods_type {
        let goods_pattern = format!("*{}*", goods);
        must.push(json!({
            "bool": {
                "should": [
                    { "wildcard": { "items.goods_type": { "value": &goods_pattern } } },
                    { "wildcard": { "raw_goods": { "value": &goods_pattern } } }
                ],
                "minimum_should_match": 1
            }
        }));
    }

    let body = json!({
        "query": { "bool": { "must": must } },
        "sort": [ { "shipping_date": { "order": "desc" } } ],
        "size": 10
    });

    debug!(
        "Price search: location={:?} goods_type={:?}",
        location, goods_type
    );

    let sources = client.search_sources(body).await?;

    let mut items = Vec::with_capacity(sources.len());
    let mut unit_prices = Vec::with_capacity(sources.len());
    for source in sources {
        let shipment: Shipment = serde_json::from_value(source)?;
        let unit_price = shipment.unit_price();
        unit_prices.push(unit_price);
        items.push(PriceItem {
            goods: shipment.raw_goods,
            quantity: format!("{}{}", shipment.quantity, shipment.unit),
            price: unit_price,
            destination: shipment.raw_address,
        });
    }

    Ok(PriceReport {
        stats: compute_stats(&unit_prices),
        items,
    })
}

/// Mean/min/max over unit prices; zeroed when nothing matched.
pub fn compute_stats(unit_prices: &[f64]) -> PriceStats {
    if unit_prices.is_empty() {
        return PriceStats {
            average: 0.0,
            min: 0.0,
            max: 0.0,
            count: 0,
        };
    }

    let count = unit_prices.len();
    let sum: f64 = unit_prices.iter().sum();
    let min = unit_prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = unit_prices.iter().cloned().fold(0.0, f64::max);

    PriceStats {
        average: sum / count as f64,
        min,
        max,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_location_strips_suffixes() {
        assert_eq!(normalize_location("江苏省"), "江苏");
        assert_eq!(normalize_location(" 南京市 "), "南京");
        assert_eq!(normalize_location("鼓楼区"), "鼓楼");
        assert_eq!(normalize_location("延边自治州"), "延边");
    }

    #[test]
    fn test_normalize_location_strip_order() {
        // 区 is removed first, so 地区 never matches as a whole.
        assert_eq!(normalize_location("大兴安岭地区"), "大兴安岭地");
    }

    #[test]
    fn test_compute_stats() {
        let stats = compute_stats(&[400.0, 100.0, 250.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 400.0);
        assert_eq!(stats.average, 250.0);
    }

    #[test]
    fn test_compute_stats_empty() {
        let stats = compute_stats(&[]);
        assert_eq!(
            stats,
            PriceStats {
                average: 0.0,
                min: 0.0,
                max: 0.0,
                count: 0,
            }
        );
    }
}
