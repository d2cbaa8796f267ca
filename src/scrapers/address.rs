//! Japanese postal address decomposition.

use crate::models::AddressComponents;
use regex::Regex;
use std::sync::LazyLock;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(東京都|北海道|(?:大阪|京都)府|.{2,3}県)(.+?市.+?区|.+?[市区町村郡])([\p{Han}\p{Hiragana}\p{Katakana}]+)",
    )
    .expect("Invalid address regex")
});
static DESIGNATED_CITY_WARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+?市(.+?区)$").expect("Invalid city ward regex"));

/// Split "神奈川県川崎市宮前区馬絹６丁目" into prefecture, city/ward and town.
///
/// `None` when the string does not start with a prefecture followed by a
/// municipality; callers treat that as "no decomposition".
pub fn parse_address(address: &str) -> Option<AddressComponents> {
    let caps = ADDRESS.captures(address.trim())?;
    Some(AddressComponents {
        prefecture: caps[1].to_string(),
        city_ward: caps[2].to_string(),
        town: caps[3].to_string(),
    })
}

/// Ward part of a designated-city name ("川崎市宮前区" gives "宮前区")
pub fn ward_suffix(city_ward: &str) -> Option<&str> {
    DESIGNATED_CITY_WARD
        .captures(city_ward)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(prefecture: &str, city_ward: &str, town: &str) -> AddressComponents {
        AddressComponents {
            prefecture: prefecture.to_string(),
            city_ward: city_ward.to_string(),
            town: town.to_string(),
        }
    }

    #[test]
    fn designated_city_with_ward() {
        assert_eq!(
            parse_address("神奈川県川崎市宮前区馬絹６丁目"),
            Some(components("神奈川県", "川崎市宮前区", "馬絹"))
        );
    }

    #[test]
    fn metropolis_and_special_prefectures() {
        assert_eq!(
            parse_address("東京都港区六本木6-10-1"),
            Some(components("東京都", "港区", "六本木"))
        );
        assert_eq!(
            parse_address("大阪府大阪市北区梅田3丁目"),
            Some(components("大阪府", "大阪市北区", "梅田"))
        );
        assert_eq!(
            parse_address("北海道札幌市中央区北一条西"),
            Some(components("北海道", "札幌市中央区", "北一条西"))
        );
    }

    #[test]
    fn plain_city_and_town() {
        assert_eq!(
            parse_address("埼玉県川口市栄町3-1"),
            Some(components("埼玉県", "川口市", "栄町"))
        );
    }

    #[test]
    fn unanchored_input_is_rejected() {
        assert_eq!(parse_address("川崎市宮前区馬絹"), None);
        assert_eq!(parse_address("〒216-0033 神奈川県川崎市宮前区馬絹"), None);
        assert_eq!(parse_address(""), None);
    }

    #[test]
    fn ward_suffix_of_designated_city() {
        assert_eq!(ward_suffix("川崎市宮前区"), Some("宮前区"));
        assert_eq!(ward_suffix("港区"), None);
        assert_eq!(ward_suffix("町田市"), None);
    }
}
