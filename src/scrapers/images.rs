//! Listing photo URLs: filtered, upgraded to the large rendition, deduped.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

const SOURCE_ATTRS: [&str; 3] = ["src", "data-src", "data-lazy"];
const BLOCKED: [&str; 6] = ["spacer", "icon", "logo", "common", "btn_", "arrow"];
const HOSTS: [&str; 2] = ["suumo", "img0"];
const CONTENT_PATHS: [&str; 4] = ["/bukken/", "/chintai/", "/jnc/", "resize"];
const LARGE_RESIZE: &str = "/resize/640x480";

static SELECTOR_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("Invalid img selector"));
static SELECTOR_OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"]"#).expect("Invalid og:image selector")
});
static RESIZE_DIMENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/resize/[0-9]+x[0-9]+").expect("Invalid resize regex"));

/// True for property photos, false for chrome (icons, buttons, shared assets)
pub fn is_listing_photo(src: &str) -> bool {
    !BLOCKED.iter().any(|m| src.contains(m))
        && HOSTS.iter().any(|m| src.contains(m))
        && CONTENT_PATHS.iter().any(|m| src.contains(m))
}

/// Rewrite thumbnail URLs to the large rendition
pub fn upgrade_size(src: &str) -> String {
    let upgraded = src.replace("/s/", "/l/").replacen("_s.", "_l.", 1);
    RESIZE_DIMENSIONS
        .replace(&upgraded, LARGE_RESIZE)
        .into_owned()
}

/// Collect photos in document order. The page preview image, when
/// present, always comes first.
pub fn extract_images(doc: &Html) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for img in doc.select(&SELECTOR_IMG) {
        let src = SOURCE_ATTRS
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .find(|v| !v.is_empty())
            .unwrap_or("");

        if src.is_empty() || !is_listing_photo(src) {
            continue;
        }

        let large = upgrade_size(src);
        if seen.insert(large.clone()) {
            images.push(large);
        }
    }

    let preview = doc
        .select(&SELECTOR_OG_IMAGE)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty());

    if let Some(preview) = preview {
        images.retain(|url| url != preview);
        images.insert(0, preview.to_string());
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_thumbnail_tokens() {
        assert_eq!(
            upgrade_size("https://img01.suumo.com/front/gazo/fr/bukken/s/100_s.jpg"),
            "https://img01.suumo.com/front/gazo/fr/bukken/l/100_l.jpg"
        );
        assert_eq!(
            upgrade_size("https://img01.suumo.com/jj/resizeImage?src=gazo/bukken/resize/120x90/a.jpg"),
            "https://img01.suumo.com/jj/resizeImage?src=gazo/bukken/resize/640x480/a.jpg"
        );
    }

    #[test]
    fn filters_chrome_and_foreign_hosts() {
        assert!(is_listing_photo("https://img01.suumo.com/front/gazo/fr/bukken/1.jpg"));
        assert!(!is_listing_photo("https://img01.suumo.com/front/common/bukken/logo.png"));
        assert!(!is_listing_photo("https://suumo.jp/chintai/btn_next.gif"));
        assert!(!is_listing_photo("https://cdn.example.com/bukken/1.jpg"));
        assert!(!is_listing_photo("https://img01.suumo.com/front/top/banner.jpg"));
    }

    #[test]
    fn dedupes_after_upgrade_and_puts_preview_first() {
        let doc = Html::parse_document(
            r#"<html><head>
                <meta property="og:image" content="https://img01.suumo.com/bukken/og.jpg">
            </head><body>
                <img src="https://img01.suumo.com/bukken/s/1_s.jpg">
                <img data-src="https://img01.suumo.com/bukken/l/1_l.jpg">
                <img src="" data-lazy="https://img01.suumo.com/bukken/2.jpg">
                <img src="https://img01.suumo.com/bukken/icon_new.png">
                <img src="https://img01.suumo.com/bukken/og.jpg">
            </body></html>"#,
        );
        let images = extract_images(&doc);
        assert_eq!(
            images,
            vec![
                "https://img01.suumo.com/bukken/og.jpg",
                "https://img01.suumo.com/bukken/l/1_l.jpg",
                "https://img01.suumo.com/bukken/2.jpg",
            ]
        );
    }
}
