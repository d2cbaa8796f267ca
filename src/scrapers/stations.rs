//! Nearest-station access recovered from free text such as
//! "東急田園都市線/宮崎台駅 歩9分".

use crate::models::StationAccess;
use crate::scrapers::table::TableIndex;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Stations beyond the first few belong to other listings further down the page
pub const MAX_STATIONS: usize = 3;

const BUS_MARKER: &str = "バス";
const SCHOOL_DISTRICT_MARKER: &str = "学区";
const MAX_FALLBACK_NAME_CHARS: usize = 10;

/// Most specific first; the first template that matches wins.
static TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(.+?線)\s*[/／]\s*(.+?)駅\s*歩([0-9]+)分",
        r"(.+?線)\s*[/／]\s*(.+?)駅\s*徒歩([0-9]+)分",
        r"(.+?線)\s+(.+?)駅\s*歩([0-9]+)分",
        r"(.+?線)\s+(.+?)駅\s+徒歩([0-9]+)分",
        r"(.+?)\s*[/／]\s*(.+?)駅\s*歩([0-9]+)分",
        r"(.+?)\s*[/／]\s*(.+?)駅\s+徒歩([0-9]+)分",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid station template"))
    .collect()
});

static LOOSE_STATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^\s、,（）()／/]+?)駅.*?([0-9]+)分").expect("Invalid loose station regex")
});
static LINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*線\s*[/／]?\s*").expect("Invalid line prefix regex"));

static SELECTOR_STATION_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".property_view_detail-station li, .property_view_traffic li")
        .expect("Invalid station list selector")
});
static SELECTOR_ANY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("Invalid universal selector"));

/// Parse a single snippet. Bus routes are never station access.
pub fn parse_station_text(text: &str) -> Option<StationAccess> {
    if text.contains(BUS_MARKER) {
        return None;
    }

    for template in TEMPLATES.iter() {
        if let Some(caps) = template.captures(text) {
            let Ok(walk_minutes) = caps[3].parse::<u32>() else {
                continue;
            };
            return Some(StationAccess {
                line: caps[1].trim().to_string(),
                station: caps[2].trim().to_string(),
                walk_minutes,
            });
        }
    }

    parse_loose(text)
}

/// Station glyph plus any later "N分". Only the run right before 駅 is kept.
fn parse_loose(text: &str) -> Option<StationAccess> {
    let caps = LOOSE_STATION.captures(text)?;
    let station = LINE_PREFIX.replace(&caps[1], "").trim().to_string();

    if station.is_empty()
        || station.contains(SCHOOL_DISTRICT_MARKER)
        || station.chars().count() > MAX_FALLBACK_NAME_CHARS
    {
        return None;
    }

    Some(StationAccess {
        line: String::new(),
        station,
        walk_minutes: caps[2].parse::<u32>().ok()?,
    })
}

/// Keeps the first distinct (station, minutes) pairs in document order
#[derive(Debug, Default)]
struct StationCollector {
    stations: Vec<StationAccess>,
}

impl StationCollector {
    fn offer(&mut self, text: &str) {
        let Some(found) = parse_station_text(text) else {
            return;
        };
        let seen = self
            .stations
            .iter()
            .any(|s| s.station == found.station && s.walk_minutes == found.walk_minutes);
        if !seen {
            self.stations.push(found);
        }
    }

    fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    fn finish(mut self) -> Vec<StationAccess> {
        self.stations.truncate(MAX_STATIONS);
        self.stations
    }
}

/// Walk the snippet sources in priority order, escalating only while
/// nothing has been found: station list items, the table "交通" field,
/// then every element's own text.
pub fn extract_stations(doc: &Html, table: &TableIndex) -> Vec<StationAccess> {
    let mut collector = StationCollector::default();

    for item in doc.select(&SELECTOR_STATION_ITEMS) {
        let text = item.text().collect::<String>();
        collector.offer(text.trim());
    }

    if collector.is_empty() {
        let traffic = table.find_value(&["交通", "アクセス"]);
        for line in traffic.split('\n').filter(|l| !l.is_empty()) {
            collector.offer(line.trim());
        }
    }

    if collector.is_empty() {
        for el in doc.select(&SELECTOR_ANY) {
            let text = own_text(el);
            let len = text.chars().count();
            if text.contains('駅') && text.contains('分') && len > 5 && len < 100 {
                collector.offer(&text);
            }
        }
    }

    collector.finish()
}

/// Text of the element's direct text children only
pub(crate) fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect::<String>()
        .trim()
        .to_string()
}
