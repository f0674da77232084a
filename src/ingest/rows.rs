//! Row-level coercion for exported shipment spreadsheets.
//!
//! Rows are tolerated aggressively: dates fall back to today, quantities
//! to 1. Only rows with no address, no goods or no usable price are
//! dropped.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use regex::Regex;
use tracing::warn;

use waybill::goods::GoodsClassifier;
use waybill::models::ShipmentItem;

/// Required spreadsheet columns, by header name.
pub const REQUIRED_COLUMNS: [&str; 5] = ["日期", "品名", "件数", "地址", "价格"];

/// Positions of the required columns within a header row.
#[derive(Debug)]
pub struct ColumnMap {
    date: usize,
    goods: usize,
    quantity: usize,
    address: usize,
    price: usize,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        match (
            find("日期"),
            find("品名"),
            find("件数"),
            find("地址"),
            find("价格"),
        ) {
            (Some(date), Some(goods), Some(quantity), Some(address), Some(price)) => Ok(Self {
                date,
                goods,
                quantity,
                address,
                price,
            }),
            _ => {
                let missing: Vec<&str> = REQUIRED_COLUMNS
                    .iter()
                    .copied()
                    .filter(|name| find(name).is_none())
                    .collect();
                bail!(
                    "Spreadsheet is missing required columns: {}",
                    missing.join(", ")
                );
            }
        }
    }
}

/// A shipment row after field coercion, before address resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRow {
    pub shipping_date: NaiveDate,
    pub raw_address: String,
    pub raw_goods: String,
    pub quantity: u32,
    pub total_price: f64,
}

/// Coerce one CSV record. Returns None for rows that cannot be used;
/// the reason is logged, ingestion continues.
pub fn coerce_row(
    record: &StringRecord,
    columns: &ColumnMap,
    digits: &Regex,
    today: NaiveDate,
) -> Option<ShipmentRow> {
    if record.iter().all(|field| field.trim().is_empty()) {
        return None;
    }

    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let raw_address = field(columns.address);
    if raw_address.is_empty() {
        warn!("Skipping row without address: {:?}", record);
        return None;
    }

    let raw_goods = field(columns.goods);
    if raw_goods.is_empty() {
        warn!("Skipping row without goods: {:?}", record);
        return None;
    }

    let price_cell = field(columns.price);
    let total_price = match price_cell.parse::<f64>() {
        Ok(p) => p,
        Err(_) => {
            warn!("Skipping row with unusable price {:?}: {:?}", price_cell, record);
            return None;
        }
    };

    Some(ShipmentRow {
        shipping_date: parse_date(field(columns.date), today),
        raw_address: raw_address.to_string(),
        raw_goods: raw_goods.to_string(),
        quantity: parse_quantity(field(columns.quantity), digits),
        total_price,
    })
}

/// Parse a `%Y-%m-%d` date cell, falling back to today.
fn parse_date(cell: &str, today: NaiveDate) -> NaiveDate {
    NaiveDate::parse_from_str(cell, "%Y-%m-%d").unwrap_or(today)
}

/// Quantity cells arrive as plain numbers or forms like "3台"; strip
/// everything but digits when the numeric parse fails. Defaults to 1.
fn parse_quantity(cell: &str, digits: &Regex) -> u32 {
    if let Ok(n) = cell.parse::<f64>() {
        return n as u32;
    }
    let concatenated: String = digits
        .find_iter(cell)
        .map(|m| m.as_str())
        .collect();
    concatenated.parse::<u32>().unwrap_or(1)
}

/// Split the goods cell into classified items, dividing the row quantity
/// evenly across them. The division is integer; the remainder is
/// discarded. A cell no rule can split falls back to one item carrying
/// the raw text and the full quantity.
pub fn build_items(
    classifier: &GoodsClassifier,
    raw_goods: &str,
    quantity: u32,
) -> Vec<ShipmentItem> {
    let mut goods_types = classifier.split_and_classify(raw_goods);
    if goods_types.is_empty() {
        goods_types = vec![raw_goods.to_string()];
    }
    let share = quantity / goods_types.len() as u32;
    goods_types
        .into_iter()
        .map(|goods_type| ShipmentItem {
            goods_type,
            quantity: share,
        })
        .collect()
}

/// Regex matching digit runs in quantity cells.
pub fn digit_pattern() -> Regex {
    Regex::new(r"\d+").expect("static regex")
}

/// Drop `n` leading lines from a spreadsheet export (merged-cell banners
/// above the real header row).
pub fn skip_leading_rows(content: &str, n: usize) -> &str {
    let mut rest = content;
    for _ in 0..n {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return "",
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> StringRecord {
        StringRecord::from(vec!["日期", "品名", "件数", "地址", "价格"])
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_column_map_reports_missing() {
        let partial = StringRecord::from(vec!["日期", "地址"]);
        let err = ColumnMap::from_headers(&partial).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("品名"));
        assert!(message.contains("件数"));
        assert!(message.contains("价格"));
    }

    #[test]
    fn test_coerce_full_row() {
        let columns = ColumnMap::from_headers(&headers()).unwrap();
        let record =
            StringRecord::from(vec!["2024-03-05", "全电动+配重", "2", "江苏省南京市鼓楼区", "960"]);
        let row = coerce_row(&record, &columns, &digit_pattern(), today()).unwrap();
        assert_eq!(
            row,
            ShipmentRow {
                shipping_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                raw_address: "江苏省南京市鼓楼区".to_string(),
                raw_goods: "全电动+配重".to_string(),
                quantity: 2,
                total_price: 960.0,
            }
        );
    }

    #[test]
    fn test_bad_date_falls_back_to_today() {
        let columns = ColumnMap::from_headers(&headers()).unwrap();
        let record = StringRecord::from(vec!["3月5日", "配重", "1", "北京市朝阳区", "400"]);
        let row = coerce_row(&record, &columns, &digit_pattern(), today()).unwrap();
        assert_eq!(row.shipping_date, today());
    }

    #[test]
    fn test_quantity_with_unit_suffix() {
        let digits = digit_pattern();
        assert_eq!(parse_quantity("3台", &digits), 3);
        assert_eq!(parse_quantity("12", &digits), 12);
        assert_eq!(parse_quantity("2.0", &digits), 2);
        assert_eq!(parse_quantity("", &digits), 1);
        assert_eq!(parse_quantity("若干", &digits), 1);
    }

    #[test]
    fn test_rows_without_price_or_address_are_dropped() {
        let columns = ColumnMap::from_headers(&headers()).unwrap();
        let digits = digit_pattern();

        let no_price = StringRecord::from(vec!["2024-03-05", "配重", "1", "北京市朝阳区", ""]);
        assert!(coerce_row(&no_price, &columns, &digits, today()).is_none());

        let bad_price = StringRecord::from(vec!["2024-03-05", "配重", "1", "北京市朝阳区", "面议"]);
        assert!(coerce_row(&bad_price, &columns, &digits, today()).is_none());

        let no_address = StringRecord::from(vec!["2024-03-05", "配重", "1", "", "400"]);
        assert!(coerce_row(&no_address, &columns, &digits, today()).is_none());

        let empty = StringRecord::from(vec!["", "", "", "", ""]);
        assert!(coerce_row(&empty, &columns, &digits, today()).is_none());
    }

    #[test]
    fn test_build_items_discards_division_remainder() {
        let classifier = GoodsClassifier::default();
        let items = build_items(&classifier, "全电动+配重", 5);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.quantity == 2));
    }

    #[test]
    fn test_build_items_single_goods_keeps_quantity() {
        let classifier = GoodsClassifier::default();
        let items = build_items(&classifier, "配重", 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].goods_type, "配重");
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn test_build_items_unsplittable_falls_back_to_raw() {
        let classifier = GoodsClassifier::default();
        let items = build_items(&classifier, "+", 4);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].goods_type, "+");
        assert_eq!(items[0].quantity, 4);
    }

    #[test]
    fn test_skip_leading_rows() {
        let content = "banner,,\nsecond,,\n日期,品名,件数\n";
        assert_eq!(skip_leading_rows(content, 2), "日期,品名,件数\n");
        assert_eq!(skip_leading_rows(content, 0), content);
        assert_eq!(skip_leading_rows("one\n", 5), "");
    }
}
