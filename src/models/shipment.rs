//! Shipment document structure for storage and Elasticsearch indexing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// One goods line split out of a compound goods cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    /// Classified goods type, or the raw fragment when no rule matched
    pub goods_type: String,
    /// Share of the row quantity (evenly divided, remainder discarded)
    pub quantity: u32,
}

/// Main shipment document, stored in ScyllaDB and indexed into Elasticsearch.
///
/// The resolved `province`/`city`/`area` fields are each independently
/// possibly empty; downstream search must not assume all three are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Content hash of the identifying row fields, so re-ingesting the
    /// same file overwrites instead of duplicating
    pub id: String,

    pub shipping_date: NaiveDate,

    /// Original address cell, kept verbatim
    pub raw_address: String,

    pub province: String,
    pub city: String,
    pub area: String,

    pub total_price: f64,
    pub quantity: u32,
    pub unit: String,

    /// Original goods cell, kept verbatim
    pub raw_goods: String,

    pub items: Vec<ShipmentItem>,

    /// Ingest run identifier
    pub import_id: String,
}

impl Shipment {
    /// Derive the document id from the fields that identify a source row.
    pub fn row_id(
        shipping_date: NaiveDate,
        raw_address: &str,
        raw_goods: &str,
        quantity: u32,
        total_price: f64,
    ) -> String {
        let key = format!(
            "{}|{}|{}|{}|{}",
            shipping_date, raw_address, raw_goods, quantity, total_price
        );
        format!("{:016x}", xxh64(key.as_bytes(), 0))
    }

    /// Price of a single unit within this shipment.
    pub fn unit_price(&self) -> f64 {
        self.total_price / self.quantity.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_stable() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let a = Shipment::row_id(date, "江苏省南京市鼓楼区", "全电动", 2, 800.0);
        let b = Shipment::row_id(date, "江苏省南京市鼓楼区", "全电动", 2, 800.0);
        assert_eq!(a, b);

        let c = Shipment::row_id(date, "江苏省南京市鼓楼区", "全电动", 3, 800.0);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unit_price_guards_zero_quantity() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let shipment = Shipment {
            id: "x".to_string(),
            shipping_date: date,
            raw_address: String::new(),
            province: String::new(),
            city: String::new(),
            area: String::new(),
            total_price: 500.0,
            quantity: 0,
            unit: "件".to_string(),
            raw_goods: String::new(),
            items: vec![],
            import_id: String::new(),
        };
        assert_eq!(shipment.unit_price(), 500.0);
    }
}
