//! Header/value index over every table row of a listing document.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;

static SELECTOR_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tr").expect("Invalid row selector"));
static SELECTOR_TH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("Invalid th selector"));
static SELECTOR_TD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("Invalid td selector"));

/// One recovered (header, value) cell pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub header: String,
    pub value: String,
}

/// Table rows flattened in document order.
///
/// The listing site merges several logical fields into a single header
/// cell ("間取り詳細構造"), so lookups match header substrings rather than
/// exact names.
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    entries: Vec<TableEntry>,
}

impl TableIndex {
    pub fn from_document(doc: &Html) -> Self {
        let mut entries: Vec<TableEntry> = Vec::new();

        for row in doc.select(&SELECTOR_ROW) {
            let headers: Vec<String> = row.select(&SELECTOR_TH).map(cell_text).collect();
            let values: Vec<String> = row.select(&SELECTOR_TD).map(cell_text).collect();

            if headers.len() == 1 && values.len() == 1 {
                // merged single-pair rows show up again in nested layouts
                let entry = TableEntry {
                    header: headers[0].clone(),
                    value: values[0].clone(),
                };
                if !entry.header.is_empty() && !entry.value.is_empty() && !entries.contains(&entry)
                {
                    entries.push(entry);
                }
                continue;
            }

            for (header, value) in headers.into_iter().zip(values) {
                if !header.is_empty() && !value.is_empty() {
                    entries.push(TableEntry { header, value });
                }
            }
        }

        Self { entries }
    }

    /// Value of the first entry whose header contains a keyword, trying
    /// keywords in priority order. Empty when nothing matches.
    pub fn find_value(&self, keywords: &[&str]) -> &str {
        keywords
            .iter()
            .find_map(|kw| self.entries.iter().find(|e| e.header.contains(kw)))
            .map(|e| e.value.as_str())
            .unwrap_or("")
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
