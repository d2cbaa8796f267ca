//! Listing page → `PropertyRecord`, plus a structural dump for when the
//! page layout drifts.

use crate::models::PropertyRecord;
use crate::scrapers::fields::{self, first_success, ListingContext};
use crate::scrapers::images::extract_images;
use crate::scrapers::stations::{extract_stations, own_text};
use crate::scrapers::table::{cell_text, TableEntry, TableIndex};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Invalid title selector"));
static SELECTOR_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("Invalid h1 selector"));
static SELECTOR_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("Invalid img selector"));
static SELECTOR_DL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl").expect("Invalid dl selector"));
static SELECTOR_DT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt").expect("Invalid dt selector"));
static SELECTOR_DD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dd").expect("Invalid dd selector"));
static SELECTOR_ANY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("Invalid universal selector"));

const TRAFFIC_CLASS_MARKERS: [&str; 4] = ["traffic", "access", "station", "ekiten"];

/// Parse a listing detail page into a property record.
///
/// Never fails: fields that cannot be recovered keep their zero value,
/// and callers judge success with [`PropertyRecord::is_empty`].
pub fn parse_listing_html(markup: &str, source_url: &str) -> PropertyRecord {
    let doc = Html::parse_document(markup);
    let table = TableIndex::from_document(&doc);
    debug!(entries = table.len(), "Indexed listing tables");

    let ctx = ListingContext::new(&doc, markup, &table);
    let rent = first_success(&ctx, fields::RENT).unwrap_or_default();
    let ctx = ctx.with_rent(rent);

    let record = PropertyRecord {
        name: first_success(&ctx, fields::NAME).unwrap_or_default(),
        rent,
        management_fee: first_success(&ctx, fields::MANAGEMENT_FEE).unwrap_or_default(),
        deposit: first_success(&ctx, fields::DEPOSIT).unwrap_or_default(),
        key_money: first_success(&ctx, fields::KEY_MONEY).unwrap_or_default(),
        layout: first_success(&ctx, fields::LAYOUT).unwrap_or_default(),
        area: first_success(&ctx, fields::AREA).unwrap_or_default(),
        floor: first_success(&ctx, fields::FLOOR).unwrap_or_default(),
        building_type: first_success(&ctx, fields::BUILDING_TYPE).unwrap_or_default(),
        age: first_success(&ctx, fields::AGE).unwrap_or_default(),
        address: first_success(&ctx, fields::ADDRESS).unwrap_or_default(),
        stations: extract_stations(&doc, &table),
        features: fields::extract_features(&ctx),
        direction: first_success(&ctx, fields::DIRECTION).unwrap_or_default(),
        contract_type: first_success(&ctx, fields::CONTRACT_TYPE).unwrap_or_default(),
        images: extract_images(&doc),
        source_url: source_url.to_string(),
    };

    if record.is_empty() {
        warn!(url = source_url, "Listing yielded neither rent nor name");
    } else {
        debug!(
            url = source_url,
            rent = record.rent,
            stations = record.stations.len(),
            images = record.images.len(),
            "Parsed listing"
        );
    }

    record
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugElement {
    pub tag: String,
    pub classes: String,
    pub text: String,
}

/// Raw structure dump for working out why a field came back empty
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDebug {
    pub title: String,
    pub h1: String,
    pub img_count: usize,
    pub table_row_count: usize,
    pub all_table_rows: Vec<TableEntry>,
    pub dl_item_count: usize,
    pub all_dl_items: Vec<TableEntry>,
    pub station_texts: Vec<String>,
    pub traffic_elements: Vec<DebugElement>,
}

pub fn debug_listing_html(markup: &str) -> ListingDebug {
    let doc = Html::parse_document(markup);
    let table = TableIndex::from_document(&doc);

    let dl_items: Vec<TableEntry> = doc
        .select(&SELECTOR_DL)
        .map(|dl| TableEntry {
            header: truncate(&joined_text(dl.select(&SELECTOR_DT).map(cell_text)), 80),
            value: truncate(&joined_text(dl.select(&SELECTOR_DD).map(cell_text)), 120),
        })
        .filter(|item| !item.header.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut station_texts = Vec::new();
    let mut traffic_elements = Vec::new();

    for el in doc.select(&SELECTOR_ANY) {
        let own = own_text(el);
        let own_len = own.chars().count();
        if own.contains('駅') && own_len > 3 && own_len < 200 {
            let snippet = truncate(&own, 150);
            if seen.insert(snippet.clone()) {
                station_texts.push(snippet);
            }
        }

        let classes = el.value().attr("class").unwrap_or("");
        if TRAFFIC_CLASS_MARKERS.iter().any(|m| classes.contains(m)) {
            let text = cell_text(el);
            let len = text.chars().count();
            if len > 3 && len < 300 {
                traffic_elements.push(DebugElement {
                    tag: el.value().name().to_string(),
                    classes: truncate(classes, 100),
                    text: truncate(&text, 200),
                });
            }
        }
    }

    station_texts.truncate(20);
    traffic_elements.truncate(10);

    ListingDebug {
        title: doc
            .select(&SELECTOR_TITLE)
            .map(cell_text)
            .collect::<String>(),
        h1: doc
            .select(&SELECTOR_H1)
            .next()
            .map(|h1| truncate(&cell_text(h1), 100))
            .unwrap_or_default(),
        img_count: doc.select(&SELECTOR_IMG).count(),
        table_row_count: table.len(),
        all_table_rows: table
            .entries()
            .iter()
            .take(40)
            .map(|e| TableEntry {
                header: truncate(&e.header, 80),
                value: truncate(&e.value, 120),
            })
            .collect(),
        dl_item_count: dl_items.len(),
        all_dl_items: dl_items.into_iter().take(30).collect(),
        station_texts,
        traffic_elements,
    }
}

fn joined_text(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<String>().trim().to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
