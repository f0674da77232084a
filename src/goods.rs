//! Goods-name classification shared by ingest and price search.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One classification rule: the first rule with a keyword contained in
/// the goods fragment wins.
#[derive(Debug, Deserialize, Clone)]
pub struct GoodsRule {
    pub class: String,
    pub keywords: Vec<String>,
}

/// Ordered keyword rules for goods types. Rule order is significant and
/// mirrors the historical behavior: 电动 is listed under 全电动 ahead of
/// the 半电动 rule, so 半电动 fragments classify as 全电动.
#[derive(Debug, Deserialize, Clone)]
pub struct GoodsClassifier {
    pub rules: Vec<GoodsRule>,
}

impl Default for GoodsClassifier {
    fn default() -> Self {
        let rule = |class: &str, keywords: &[&str]| GoodsRule {
            class: class.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        Self {
            rules: vec![
                rule("全电动", &["全电动", "电动"]),
                rule("配重", &["配重"]),
                rule("前移", &["前移"]),
                rule("大金刚", &["大金刚"]),
                rule("小金刚", &["小金刚"]),
                rule("半电动", &["半电动"]),
            ],
        }
    }
}

impl GoodsClassifier {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read goods rules file")?;
        let classifier: GoodsClassifier =
            toml::from_str(&content).context("Failed to parse goods rules file")?;
        Ok(classifier)
    }

    /// Classify one goods fragment; unmatched fragments keep their raw text.
    pub fn classify(&self, goods: &str) -> String {
        let goods = goods.trim();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| goods.contains(k.as_str())) {
                return rule.class.clone();
            }
        }
        goods.to_string()
    }

    /// Split a compound goods cell on `+` and classify each part.
    pub fn split_and_classify(&self, raw_goods: &str) -> Vec<String> {
        raw_goods
            .split('+')
            .map(|part| self.classify(part))
            .filter(|part| !part.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classification() {
        let c = GoodsClassifier::default();
        assert_eq!(c.classify("全电动堆高车"), "全电动");
        assert_eq!(c.classify("配重式叉车"), "配重");
        assert_eq!(c.classify("大金刚"), "大金刚");
    }

    #[test]
    fn test_unmatched_keeps_raw_text() {
        let c = GoodsClassifier::default();
        assert_eq!(c.classify(" 搬运车 "), "搬运车");
    }

    #[test]
    fn test_rule_order_is_significant() {
        // 半电动 contains 电动, and the 全电动 rule is consulted first.
        let c = GoodsClassifier::default();
        assert_eq!(c.classify("半电动堆高车"), "全电动");
    }

    #[test]
    fn test_compound_split() {
        let c = GoodsClassifier::default();
        assert_eq!(
            c.split_and_classify("全电动+配重+搬运车"),
            vec!["全电动", "配重", "搬运车"]
        );
    }
}
