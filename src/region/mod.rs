//! Rule-based address resolution against the administrative hierarchy.
//!
//! Walks a raw shipping address top-down (province, then city, then area)
//! using in-memory indices built once at startup plus on-demand reads from
//! the reference store.

mod cache;
mod resolver;
mod store;

pub use cache::{ProvinceMatch, RegionCache};
pub use resolver::AddressResolver;
pub use store::RegionStore;

/// Names of the four province-level municipalities. Their direct area
/// children serve as the "city" result; there is no third tier.
pub const MUNICIPALITIES: &[&str] = &["北京市", "上海市", "天津市", "重庆市"];

/// The one province whose city tier mixes prefecture-level and
/// county-level cities.
pub const SPECIAL_PROVINCE: &str = "江苏省";

/// Suffix carried by city names (and by county-level cities in the area tier).
pub(crate) const CITY_SUFFIX: char = '市';

/// Suffixes carried by district/county names.
pub(crate) const DISTRICT_SUFFIXES: [char; 2] = ['区', '县'];

/// The first two characters of an address, used as the province-level
/// discriminator. None when the address is shorter than two characters.
pub(crate) fn leading_pair(address: &str) -> Option<&str> {
    let mut indices = address.char_indices();
    indices.next()?;
    indices.next()?;
    match indices.next() {
        Some((idx, _)) => Some(&address[..idx]),
        None => Some(address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_pair_multibyte() {
        assert_eq!(leading_pair("江苏省南京市"), Some("江苏"));
        assert_eq!(leading_pair("江苏"), Some("江苏"));
        assert_eq!(leading_pair("江"), None);
        assert_eq!(leading_pair(""), None);
    }
}
