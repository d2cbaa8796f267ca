//! Per-field extraction waterfalls.
//!
//! Each field is an ordered list of independent strategies over the
//! parsed listing; the first one to produce a non-empty, non-zero value
//! wins and an exhausted list leaves the field at its zero value.

use crate::scrapers::numbers::{parse_area, parse_japanese_currency, parse_months};
use crate::scrapers::table::{cell_text, TableIndex};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

static SELECTOR_HEADER_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".section_h1-header-title").expect("Invalid header title selector")
});
static SELECTOR_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("Invalid h1 selector"));
static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Invalid title selector"));
static SELECTOR_PRICE_NODES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, p").expect("Invalid price node selector"));
static SELECTOR_FEE_NODES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div").expect("Invalid fee node selector"));
static SELECTOR_MOVE_IN_NODES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, td").expect("Invalid move-in node selector"));
static SELECTOR_FEATURE_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".property_view_detail-features li, .property_data-features li")
        .expect("Invalid feature list selector")
});

static PROVIDER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*.+提供.*$").expect("Invalid provider regex"));
static STANDALONE_RENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9.]+)\s*万円$").expect("Invalid rent regex"));
static PAGE_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)gapSuumoPcForFr\s*=\s*(\{.*?\});").expect("Invalid page data regex")
});
static LABELED_RENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"賃料[：:]\s*([0-9.]+)\s*万").expect("Invalid labeled rent regex"));
static LABELED_FEE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"管理費[・共益費]*\s*([0-9,]+)\s*円").expect("Invalid labeled fee regex")
});
static LABELED_DEPOSIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"敷金?\s*([0-9.]+万|なし|-)").expect("Invalid labeled deposit regex")
});
static LABELED_KEY_MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"礼金?\s*([0-9.]+万|なし|-)").expect("Invalid labeled key money regex")
});
static ROOM_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]*[LDK]+[0-9]*[0-9.]*)").expect("Invalid room code regex"));
static ROOM_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[和洋][0-9]").expect("Invalid room tag regex"));
static FLOOR_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+階\s*[/／]\s*[0-9]+階建|[0-9]+階/地下?[0-9]+階建|[0-9]+階建)")
        .expect("Invalid floor regex")
});
static STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(鉄筋コン|鉄骨|木造|RC|SRC|S造|軽量鉄骨)").expect("Invalid structure regex")
});
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4}年[0-9]{1,2}月)").expect("Invalid year-month regex"));
static TITLE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"／((?:東京都|北海道|(?:大阪|京都)府|.{2,3}県).+?)／")
        .expect("Invalid title address regex")
});
static FEATURE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[、,／\n]").expect("Invalid feature split regex"));
static CONDITION_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/／\n]").expect("Invalid condition split regex"));
static PROPERTY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{5,}").expect("Invalid property code regex"));

const FLOOR_FALLBACK_CHARS: usize = 20;
const MAX_CONDITION_CHARS: usize = 30;

/// Everything a strategy may look at
pub struct ListingContext<'a> {
    pub doc: &'a Html,
    pub raw: &'a str,
    pub table: &'a TableIndex,
    /// Resolved rent, needed to turn "N months" into yen
    pub rent: i64,
}

impl<'a> ListingContext<'a> {
    pub fn new(doc: &'a Html, raw: &'a str, table: &'a TableIndex) -> Self {
        Self {
            doc,
            raw,
            table,
            rent: 0,
        }
    }

    pub fn with_rent(self, rent: i64) -> Self {
        Self { rent, ..self }
    }

    fn title(&self) -> String {
        self.doc
            .select(&SELECTOR_TITLE)
            .map(|el| el.text().collect::<String>())
            .collect()
    }
}

pub type Strategy<T> = fn(&ListingContext<'_>) -> Option<T>;

/// Run strategies left to right; first success wins
pub fn first_success<T>(ctx: &ListingContext<'_>, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(ctx))
}

fn non_empty(s: impl Into<String>) -> Option<String> {
    let s = s.into();
    (!s.is_empty()).then_some(s)
}

fn non_zero(n: i64) -> Option<i64> {
    (n != 0).then_some(n)
}

fn table_value(ctx: &ListingContext<'_>, keywords: &[&str]) -> Option<String> {
    non_empty(ctx.table.find_value(keywords))
}

// name

pub const NAME: &[Strategy<String>] = &[name_from_header_title, name_from_h1];

fn name_from_header_title(ctx: &ListingContext<'_>) -> Option<String> {
    let text: String = ctx
        .doc
        .select(&SELECTOR_HEADER_TITLE)
        .map(|el| el.text().collect::<String>())
        .collect();
    non_empty(text.trim())
}

fn name_from_h1(ctx: &ListingContext<'_>) -> Option<String> {
    let h1 = ctx.doc.select(&SELECTOR_H1).next().map(cell_text)?;
    non_empty(PROVIDER_SUFFIX.replace(&h1, "").trim())
}

// rent

pub const RENT: &[Strategy<i64>] = &[rent_from_price_node, rent_from_page_data, rent_from_labeled_markup];

/// A node whose whole text is a single "8.5万円" token
fn rent_from_price_node(ctx: &ListingContext<'_>) -> Option<i64> {
    ctx.doc.select(&SELECTOR_PRICE_NODES).find_map(|el| {
        let text = cell_text(el);
        let caps = STANDALONE_RENT.captures(&text)?;
        let man: f64 = caps[1].parse().ok()?;
        non_zero((man * 10_000.0).round() as i64)
    })
}

/// The analytics blob the listing page embeds as a script assignment
fn rent_from_page_data(ctx: &ListingContext<'_>) -> Option<i64> {
    let data = page_data(ctx.raw)?;
    let rent = match data.get("rent")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    non_zero(parse_japanese_currency(&rent))
}

fn rent_from_labeled_markup(ctx: &ListingContext<'_>) -> Option<i64> {
    let caps = LABELED_RENT.captures(ctx.raw)?;
    let man: f64 = caps[1].parse().ok()?;
    non_zero((man * 10_000.0).round() as i64)
}

pub(crate) fn page_data(raw: &str) -> Option<Value> {
    let caps = PAGE_DATA.captures(raw)?;
    serde_json::from_str(&caps[1]).ok()
}

// management fee

pub const MANAGEMENT_FEE: &[Strategy<i64>] = &[fee_from_table, fee_from_text];

fn fee_from_table(ctx: &ListingContext<'_>) -> Option<i64> {
    let text = table_value(ctx, &["管理費", "共益費"])?;
    non_zero(parse_japanese_currency(&text))
}

fn fee_from_text(ctx: &ListingContext<'_>) -> Option<i64> {
    ctx.doc.select(&SELECTOR_FEE_NODES).find_map(|el| {
        let text = cell_text(el);
        let caps = LABELED_FEE.captures(&text)?;
        non_zero(parse_japanese_currency(&caps[1]))
    })
}

// deposit / key money

pub const DEPOSIT: &[Strategy<i64>] = &[deposit_from_table, deposit_from_text];
pub const KEY_MONEY: &[Strategy<i64>] = &[key_money_from_table, key_money_from_text];

fn deposit_from_table(ctx: &ListingContext<'_>) -> Option<i64> {
    let text = table_value(ctx, &["敷金"])?;
    non_zero(parse_months(&text, ctx.rent))
}

fn key_money_from_table(ctx: &ListingContext<'_>) -> Option<i64> {
    let text = table_value(ctx, &["礼金"])?;
    non_zero(parse_months(&text, ctx.rent))
}

fn deposit_from_text(ctx: &ListingContext<'_>) -> Option<i64> {
    labeled_move_in_cost(ctx, &LABELED_DEPOSIT)
}

fn key_money_from_text(ctx: &ListingContext<'_>) -> Option<i64> {
    labeled_move_in_cost(ctx, &LABELED_KEY_MONEY)
}

/// First non-zero "敷金N万" / "礼金N万" hit; "なし" hits are skipped
fn labeled_move_in_cost(ctx: &ListingContext<'_>, pattern: &Regex) -> Option<i64> {
    ctx.doc.select(&SELECTOR_MOVE_IN_NODES).find_map(|el| {
        let text = cell_text(el);
        let caps = pattern.captures(&text)?;
        non_zero(parse_japanese_currency(&caps[1]))
    })
}

// layout

pub const LAYOUT: &[Strategy<String>] = &[layout_from_table];

/// "和6 洋6 洋5 LDK12.8 鉄筋コン" becomes "3LDK"; "1LDK" stays as is
fn layout_from_table(ctx: &ListingContext<'_>) -> Option<String> {
    let raw = table_value(ctx, &["間取り"])?;
    Some(normalize_layout(&raw))
}

pub fn normalize_layout(raw: &str) -> String {
    let Some(caps) = ROOM_CODE.captures(raw) else {
        return raw.to_string();
    };
    let code = &caps[1];
    let rooms = ROOM_TAG.find_iter(raw).count();
    if rooms == 0 {
        return code.to_string();
    }
    let letters = code
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    format!("{rooms}{letters}")
}

// area

pub const AREA: &[Strategy<f64>] = &[area_from_table];

fn area_from_table(ctx: &ListingContext<'_>) -> Option<f64> {
    let area = parse_area(&table_value(ctx, &["専有面積", "面積"])?);
    (area > 0.0).then_some(area)
}

// floor

pub const FLOOR: &[Strategy<String>] = &[floor_from_shape, floor_from_raw_prefix];

fn floor_from_shape(ctx: &ListingContext<'_>) -> Option<String> {
    let text = table_value(ctx, &["階建", "階"])?;
    FLOOR_SHAPE.captures(&text).map(|caps| caps[1].to_string())
}

fn floor_from_raw_prefix(ctx: &ListingContext<'_>) -> Option<String> {
    let text = table_value(ctx, &["階建", "階"])?;
    non_empty(text.chars().take(FLOOR_FALLBACK_CHARS).collect::<String>())
}

// building type

pub const BUILDING_TYPE: &[Strategy<String>] = &[building_type_from_table, building_type_from_structure];

fn building_type_from_table(ctx: &ListingContext<'_>) -> Option<String> {
    table_value(ctx, &["建物種別", "種別", "構造"])
}

fn building_type_from_structure(ctx: &ListingContext<'_>) -> Option<String> {
    let text = table_value(ctx, &["間取り詳細構造", "間取り"])?;
    STRUCTURE.captures(&text).map(|caps| caps[1].to_string())
}

// age

pub const AGE: &[Strategy<String>] = &[age_from_table, age_from_floor_field];

fn age_from_table(ctx: &ListingContext<'_>) -> Option<String> {
    table_value(ctx, &["築年月", "築年数"])
}

/// "1階/5階建1997年9月" style merged cell
fn age_from_floor_field(ctx: &ListingContext<'_>) -> Option<String> {
    let text = table_value(ctx, &["階建築年月", "階建"])?;
    YEAR_MONTH.captures(&text).map(|caps| caps[1].to_string())
}

// address

pub const ADDRESS: &[Strategy<String>] = &[address_from_table, address_from_title];

fn address_from_table(ctx: &ListingContext<'_>) -> Option<String> {
    table_value(ctx, &["所在地", "住所"])
}

/// Titles read "…／神奈川県川崎市宮前区馬絹６／…"
fn address_from_title(ctx: &ListingContext<'_>) -> Option<String> {
    let title = ctx.title();
    TITLE_ADDRESS
        .captures(&title)
        .map(|caps| caps[1].to_string())
}

// misc single-source fields

pub const DIRECTION: &[Strategy<String>] = &[direction_from_table];
pub const CONTRACT_TYPE: &[Strategy<String>] = &[contract_type_from_table];

fn direction_from_table(ctx: &ListingContext<'_>) -> Option<String> {
    table_value(ctx, &["向き", "方角"])
}

fn contract_type_from_table(ctx: &ListingContext<'_>) -> Option<String> {
    table_value(ctx, &["契約期間"])
}

/// Feature list items, the table's equipment field, then the merged
/// "条件取り扱い店舗物件コード" cell up to the property code.
pub fn extract_features(ctx: &ListingContext<'_>) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();

    for item in ctx.doc.select(&SELECTOR_FEATURE_ITEMS) {
        let text = cell_text(item);
        if !text.is_empty() {
            features.push(text);
        }
    }

    let equipment = ctx.table.find_value(&["設備", "条件・設備", "条件"]);
    for part in FEATURE_SPLIT.split(equipment) {
        let part = part.trim();
        if !part.is_empty() && !features.iter().any(|f| f == part) {
            features.push(part.to_string());
        }
    }

    let conditions = ctx.table.find_value(&["条件取り扱い"]);
    let before_code = PROPERTY_CODE.split(conditions).next().unwrap_or("");
    for part in CONDITION_SPLIT.split(before_code) {
        let part = part.trim();
        if !part.is_empty()
            && part.chars().count() < MAX_CONDITION_CHARS
            && !features.iter().any(|f| f == part)
        {
            features.push(part.to_string());
        }
    }

    features
}
