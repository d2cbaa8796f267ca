//! Monthly-parking search on the parking site.
//!
//! The site has no API, so the crawl follows its index hierarchy
//! prefecture → ward → town and then reads the lot records the town page
//! embeds for its map widget.

use crate::error::{ScoutError, ScoutResult};
use crate::geo::distance_meters;
use crate::models::{AddressComponents, Coordinates, ParkingLot};
use crate::scrapers::address::{parse_address, ward_suffix};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ParkingQuery;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

static PREFECTURE_SLUGS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("北海道", "hokkaido"),
        ("青森県", "aomori"),
        ("岩手県", "iwate"),
        ("宮城県", "miyagi"),
        ("秋田県", "akita"),
        ("山形県", "yamagata"),
        ("福島県", "fukushima"),
        ("茨城県", "ibaraki"),
        ("栃木県", "tochigi"),
        ("群馬県", "gunma"),
        ("埼玉県", "saitama"),
        ("千葉県", "chiba"),
        ("東京都", "tokyo"),
        ("神奈川県", "kanagawa"),
        ("新潟県", "niigata"),
        ("富山県", "toyama"),
        ("石川県", "ishikawa"),
        ("福井県", "fukui"),
        ("山梨県", "yamanashi"),
        ("長野県", "nagano"),
        ("岐阜県", "gifu"),
        ("静岡県", "shizuoka"),
        ("愛知県", "aichi"),
        ("三重県", "mie"),
        ("滋賀県", "shiga"),
        ("京都府", "kyoto"),
        ("大阪府", "osaka"),
        ("兵庫県", "hyogo"),
        ("奈良県", "nara"),
        ("和歌山県", "wakayama"),
        ("鳥取県", "tottori"),
        ("島根県", "shimane"),
        ("岡山県", "okayama"),
        ("広島県", "hiroshima"),
        ("山口県", "yamaguchi"),
        ("徳島県", "tokushima"),
        ("香川県", "kagawa"),
        ("愛媛県", "ehime"),
        ("高知県", "kochi"),
        ("福岡県", "fukuoka"),
        ("佐賀県", "saga"),
        ("長崎県", "nagasaki"),
        ("熊本県", "kumamoto"),
        ("大分県", "oita"),
        ("宮崎県", "miyazaki"),
        ("鹿児島県", "kagoshima"),
        ("沖縄県", "okinawa"),
    ])
});

static SELECTOR_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid link selector"));
static LOT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"latlngList\[[0-9]+\]\s*=\s*\{([^}]+)\}").expect("Invalid lot block regex")
});
static LOT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*:\s*'([^']*)'").expect("Invalid lot field regex"));

pub fn prefecture_slug(prefecture: &str) -> Option<&'static str> {
    PREFECTURE_SLUGS.get(prefecture).copied()
}

/// Crawler for nearby monthly parking
#[derive(Clone)]
pub struct ParkingCrawler {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl ParkingCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Lots within the query radius, nearest first.
    ///
    /// Any failure along the way (unparseable address, unknown prefecture,
    /// missing link, failed fetch) yields an empty list.
    pub async fn search_parking_near(&self, query: &ParkingQuery) -> Vec<ParkingLot> {
        match self.crawl(query).await {
            Ok(lots) => lots,
            Err(e) => {
                warn!(address = %query.address, error = %e, "Parking search degraded to empty");
                Vec::new()
            }
        }
    }

    async fn crawl(&self, query: &ParkingQuery) -> ScoutResult<Vec<ParkingLot>> {
        let parsed = parse_address(&query.address)
            .ok_or_else(|| ScoutError::Unparseable(format!("address {}", query.address)))?;
        let slug = prefecture_slug(&parsed.prefecture)
            .ok_or_else(|| ScoutError::NotFound(format!("prefecture {}", parsed.prefecture)))?;

        info!(
            prefecture = %parsed.prefecture,
            city_ward = %parsed.city_ward,
            town = %parsed.town,
            "Searching parking"
        );

        let ward_path = self.locate_ward(slug, &parsed).await?;
        debug!(%ward_path, "Ward page located");

        let town_path = self.locate_town(&ward_path, &parsed).await?;
        debug!(%town_path, "Town page located");

        let town_html = self.fetcher.fetch(&self.absolute(&town_path)).await?;
        let lots = parse_lot_records(&town_html, &self.base_url);
        info!(lots = lots.len(), town = %parsed.town, "Parking lots found on town page");

        let origin = Coordinates {
            lat: query.lat,
            lng: query.lng,
        };
        Ok(filter_by_distance(lots, origin, query.radius_km))
    }

    async fn locate_ward(&self, slug: &str, parsed: &AddressComponents) -> ScoutResult<String> {
        let prefecture_path = format!("/search/{slug}/");
        let html = self.fetcher.fetch(&self.absolute(&prefecture_path)).await?;

        find_child_link(&html, &prefecture_path, &parsed.city_ward)
            .or_else(|| {
                let ward = ward_suffix(&parsed.city_ward)?;
                debug!(ward, "Retrying ward lookup with ward component only");
                find_child_link(&html, &prefecture_path, ward)
            })
            .ok_or_else(|| ScoutError::NotFound(format!("ward {}", parsed.city_ward)))
    }

    async fn locate_town(&self, ward_path: &str, parsed: &AddressComponents) -> ScoutResult<String> {
        let html = self.fetcher.fetch(&self.absolute(ward_path)).await?;
        find_child_link(&html, ward_path, &parsed.town)
            .ok_or_else(|| ScoutError::NotFound(format!("town {}", parsed.town)))
    }

    fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// First link one level below `parent_path` whose text contains `needle`
pub fn find_child_link(html: &str, parent_path: &str, needle: &str) -> Option<String> {
    let parent = if parent_path.ends_with('/') {
        parent_path.to_string()
    } else {
        format!("{parent_path}/")
    };
    let doc = Html::parse_document(html);

    doc.select(&SELECTOR_LINK).find_map(|a| {
        let href = a.value().attr("href")?;
        let rest = href.strip_prefix(parent.as_str())?.trim_end_matches('/');
        if rest.is_empty() || rest.contains('/') {
            return None;
        }
        let text = a.text().collect::<String>();
        text.trim().contains(needle).then(|| href.to_string())
    })
}

/// Read every `latlngList[N] = { key:'value', ... }` record on a town page.
/// Records without usable coordinates are dropped.
pub fn parse_lot_records(html: &str, base_url: &str) -> Vec<ParkingLot> {
    LOT_BLOCK
        .captures_iter(html)
        .filter_map(|block| {
            let fields: HashMap<&str, &str> = LOT_FIELD
                .captures_iter(block.get(1)?.as_str())
                .filter_map(|kv| Some((kv.get(1)?.as_str(), kv.get(2)?.as_str())))
                .collect();
            let get = |key: &str| fields.get(key).copied().unwrap_or("");

            let lat: f64 = get("lat").trim().parse().ok()?;
            let lng: f64 = get("lng").trim().parse().ok()?;
            if lat == 0.0 || lng == 0.0 {
                return None;
            }

            let path = get("url");
            let detail_url = if path.starts_with("http") {
                path.to_string()
            } else {
                format!("{base_url}{path}")
            };

            Some(ParkingLot {
                id: get("no").to_string(),
                name: get("name").to_string(),
                address: get("address").to_string(),
                price: get("list_price_display").to_string(),
                lat,
                lng,
                detail_url,
                distance_meters: 0,
                is_24h: get("icon_24h_display") == "1",
                is_indoor: get("icon_indoor_display") == "1",
                is_outdoor: get("icon_outdoor_display") == "1",
            })
        })
        .collect()
}

/// Attach distances from `origin`, keep lots inside the radius, nearest first
pub fn filter_by_distance(lots: Vec<ParkingLot>, origin: Coordinates, radius_km: f64) -> Vec<ParkingLot> {
    let limit_m = radius_km * 1000.0;
    let mut nearby: Vec<ParkingLot> = lots
        .into_iter()
        .map(|mut lot| {
            lot.distance_meters = distance_meters(origin, Coordinates { lat: lot.lat, lng: lot.lng });
            lot
        })
        .filter(|lot| f64::from(lot.distance_meters) <= limit_m)
        .collect();
    nearby.sort_by_key(|lot| lot.distance_meters);
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    const BASE: &str = "https://parking.test";
    const METERS_PER_DEGREE_LAT: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    /// Serves canned pages; anything else is a transport failure
    struct CannedFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> ScoutResult<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScoutError::Transport(format!("no page for {url}")))
        }
    }

    fn crawler(pages: &[(&str, String)]) -> ParkingCrawler {
        let pages = pages
            .iter()
            .map(|(path, body)| (format!("{BASE}{path}"), body.clone()))
            .collect();
        ParkingCrawler::new(Arc::new(CannedFetcher { pages }), BASE)
    }

    fn lot_block(index: usize, no: &str, lat: f64, lng: f64) -> String {
        format!(
            "latlngList[{index}] = {{ no:'{no}', name:'パーク{no}', address:'馬絹{no}', \
             list_price_display:'12,000円', lat:'{lat}', lng:'{lng}', url:'/detail/{no}/', \
             icon_24h_display:'1', icon_indoor_display:'0', icon_outdoor_display:'1' }};"
        )
    }

    fn prefecture_page() -> String {
        r#"<ul>
            <li><a href="/search/kanagawa/">神奈川県トップ</a></li>
            <li><a href="/search/kanagawa/yokohama-aoba/">横浜市青葉区</a></li>
            <li><a href="/search/kanagawa/kawasaki-miyamae/">宮前区</a></li>
        </ul>"#
            .to_string()
    }

    fn ward_page() -> String {
        r#"<ul>
            <li><a href="/search/kanagawa/kawasaki-miyamae/mabinu/area/">馬絹（地図）</a></li>
            <li><a href="/search/kanagawa/kawasaki-miyamae/mabinu/">馬絹</a></li>
        </ul>"#
            .to_string()
    }

    fn town_page(origin_lat: f64) -> String {
        let at = |m: f64| origin_lat + m / METERS_PER_DEGREE_LAT;
        format!(
            "<script>{}{}{}{}</script>",
            lot_block(0, "far", at(1200.0), 139.0),
            lot_block(1, "mid", at(950.0), 139.0),
            lot_block(2, "near", at(50.0), 139.0),
            "latlngList[3] = { no:'nocoords', name:'x', lat:'', lng:'139.0' };",
        )
    }

    #[test]
    fn prefecture_table_is_complete() {
        assert_eq!(PREFECTURE_SLUGS.len(), 47);
        assert_eq!(prefecture_slug("神奈川県"), Some("kanagawa"));
        assert_eq!(prefecture_slug("ネバーランド県"), None);
    }

    #[test]
    fn child_links_must_be_one_level_down() {
        let html = ward_page();
        assert_eq!(
            find_child_link(&html, "/search/kanagawa/kawasaki-miyamae/", "馬絹").as_deref(),
            Some("/search/kanagawa/kawasaki-miyamae/mabinu/")
        );
        assert_eq!(find_child_link(&prefecture_page(), "/search/kanagawa/", "神奈川"), None);
    }

    #[test]
    fn lot_records_require_coordinates() {
        let lots = parse_lot_records(&town_page(35.0), BASE);
        assert_eq!(lots.len(), 3);
        let far = &lots[0];
        assert_eq!(far.id, "far");
        assert_eq!(far.price, "12,000円");
        assert_eq!(far.detail_url, "https://parking.test/detail/far/");
        assert!(far.is_24h && !far.is_indoor && far.is_outdoor);
    }

    #[tokio::test]
    async fn crawl_filters_by_radius_and_sorts() {
        let crawler = crawler(&[
            ("/search/kanagawa/", prefecture_page()),
            ("/search/kanagawa/kawasaki-miyamae/", ward_page()),
            ("/search/kanagawa/kawasaki-miyamae/mabinu/", town_page(35.0)),
        ]);
        let query = ParkingQuery::new("神奈川県川崎市宮前区馬絹６丁目", 35.0, 139.0);
        let lots = crawler.search_parking_near(&query).await;

        let found: Vec<(&str, u32)> = lots
            .iter()
            .map(|l| (l.id.as_str(), l.distance_meters))
            .collect();
        assert_eq!(found, vec![("near", 50), ("mid", 950)]);

        let wide = crawler
            .search_parking_near(&query.clone().with_radius_km(2.0))
            .await;
        assert_eq!(wide.len(), 3);
    }

    #[tokio::test]
    async fn fetch_failure_at_ward_stage_is_empty() {
        let crawler = crawler(&[]);
        let query = ParkingQuery::new("神奈川県川崎市宮前区馬絹６丁目", 35.0, 139.0);
        assert!(crawler.search_parking_near(&query).await.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_at_later_stages_is_empty() {
        let query = ParkingQuery::new("神奈川県川崎市宮前区馬絹６丁目", 35.0, 139.0);

        let no_ward_page = crawler(&[("/search/kanagawa/", prefecture_page())]);
        assert!(no_ward_page.search_parking_near(&query).await.is_empty());

        let no_town_page = crawler(&[
            ("/search/kanagawa/", prefecture_page()),
            ("/search/kanagawa/kawasaki-miyamae/", ward_page()),
        ]);
        assert!(no_town_page.search_parking_near(&query).await.is_empty());
    }

    #[tokio::test]
    async fn missing_town_link_is_empty() {
        let crawler = crawler(&[
            ("/search/kanagawa/", prefecture_page()),
            ("/search/kanagawa/kawasaki-miyamae/", ward_page()),
        ]);
        let query = ParkingQuery::new("神奈川県川崎市宮前区土橋３丁目", 35.0, 139.0);
        assert!(crawler.search_parking_near(&query).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_prefecture_and_bad_address_are_empty() {
        let crawler = crawler(&[]);
        for address in ["ネバー県どこか市なにか町", "住所不明"] {
            let query = ParkingQuery::new(address, 35.0, 139.0);
            assert!(crawler.search_parking_near(&query).await.is_empty());
        }
    }
}
