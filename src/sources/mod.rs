//! Per-storefront markup knowledge: listing URLs, link selectors and item
//! extraction. Everything here is site detail; the harvest loop only sees
//! the [`Site`] trait.

pub mod gmg;
pub mod gog;
pub mod steam;

use std::time::Duration;

use rand::Rng;
use scraper::{Html, Selector};
use url::Url;

use crate::record::ExtractedItem;
use crate::synth::{price_pair, round1};

/// Markup-level contract for one storefront.
pub trait Site: Send + Sync {
    /// Stable source identifier, also the `site` field of emitted records.
    fn key(&self) -> &'static str;

    /// Listing URL for one page of the catalogue walk.
    fn listing_url(&self, page: u32) -> String;

    /// Exclusive upper bound of the walk; pages run `1..max_page`.
    fn max_page(&self) -> u32;

    /// Pause between listing-page fetches.
    fn listing_pause(&self) -> Duration;

    /// Candidate item URLs on one listing page, in document order.
    fn seed_links(&self, html: &str) -> Vec<String>;

    /// Parse an item page. `None` when the page holds no usable item.
    fn extract(&self, html: &str) -> Option<ExtractedItem>;
}

/// Look up a site implementation by source key.
pub fn site_for(key: &str) -> Option<&'static dyn Site> {
    match key {
        "steam" => Some(&steam::Steam),
        "gog" => Some(&gog::Gog),
        "gmg" => Some(&gmg::Gmg),
        _ => None,
    }
}

/// Text of the first selector that matches a non-empty element. Fragments
/// are trimmed and joined, so nested markup reads as one string.
pub(crate) fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(sel) = Selector::parse(raw) else { continue };
        if let Some(el) = doc.select(&sel).next() {
            let text: String = el.text().map(str::trim).collect();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First non-empty attribute value among the given selectors.
pub(crate) fn first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for raw in selectors {
        let Ok(sel) = Selector::parse(raw) else { continue };
        if let Some(val) = doc.select(&sel).next().and_then(|el| el.value().attr(attr)) {
            if !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

/// Content attribute of a `<meta property="...">` tag.
pub(crate) fn meta_content(doc: &Html, property: &str) -> Option<String> {
    let raw = format!(r#"meta[property="{property}"]"#);
    let sel = Selector::parse(&raw).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// All href values under a selector, in document order.
pub(crate) fn collect_links(doc: &Html, selector: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .map(|h| h.to_string())
        .collect()
}

/// Resolve `href` against `base` the way a browser would.
pub(crate) fn absolutize(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let full = base.join(href).ok()?;
    Some(full.to_string())
}

/// Missing-markup price fallback so no record ships without prices.
pub(crate) fn backstop_prices(pcts: &[u32]) -> (f64, f64) {
    price_pair(&mut rand::thread_rng(), pcts)
}

pub(crate) fn random_rating() -> u8 {
    crate::synth::random_rating(&mut rand::thread_rng())
}

/// Keyword-based play-length guess in hours, one decimal. Storefront pages
/// carry no real completion data, so the estimate leans on genre words in
/// the title.
pub(crate) fn estimate_howlongtobeat(name: &str) -> f64 {
    let lower = name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let (lo, hi) = if has(&["mini", "puzzle", "arcade", "casual", "pixel"]) {
        (5.0, 15.0)
    } else if has(&["adventure", "action", "horror", "shooter"]) {
        (15.0, 35.0)
    } else if has(&["rpg", "strategy", "total", "civilization", "elder", "witcher"]) {
        (40.0, 100.0)
    } else if has(&["online", "multiplayer", "battle", "royale"]) {
        (8.0, 25.0)
    } else {
        (18.0, 45.0)
    };
    round1(rand::thread_rng().gen_range(lo..hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_text_honors_selector_order_and_skips_empties() {
        let doc = Html::parse_document(
            r#"<div class="a"></div><div class="b">  Hello  </div><div class="c">other</div>"#,
        );
        assert_eq!(first_text(&doc, &["div.a", "div.b", "div.c"]), Some("Hello".into()));
        assert_eq!(first_text(&doc, &["div.missing"]), None);
    }

    #[test]
    fn first_text_joins_nested_fragments() {
        let doc = Html::parse_document(r#"<h1> The <em>Longest</em> Road </h1>"#);
        assert_eq!(first_text(&doc, &["h1"]), Some("TheLongestRoad".into()));
    }

    #[test]
    fn meta_content_reads_og_tags() {
        let doc = Html::parse_document(
            r#"<head><meta property="og:image" content="https://cdn.test/x.jpg"></head>"#,
        );
        assert_eq!(meta_content(&doc, "og:image"), Some("https://cdn.test/x.jpg".into()));
        assert_eq!(meta_content(&doc, "og:title"), None);
    }

    #[test]
    fn absolutize_resolves_relative_and_keeps_absolute() {
        assert_eq!(
            absolutize("https://www.gog.com", "/game/cyberpunk").as_deref(),
            Some("https://www.gog.com/game/cyberpunk")
        );
        assert_eq!(
            absolutize("https://www.gog.com", "https://elsewhere.test/game/x").as_deref(),
            Some("https://elsewhere.test/game/x")
        );
    }

    #[test]
    fn playtime_estimates_track_title_keywords() {
        for _ in 0..10 {
            assert!((5.0..=15.0).contains(&estimate_howlongtobeat("Pixel Puzzle Party")));
            assert!((15.0..=35.0).contains(&estimate_howlongtobeat("Haunted Horror Show")));
            assert!((40.0..=100.0).contains(&estimate_howlongtobeat("Grand Strategy Empire")));
            assert!((8.0..=25.0).contains(&estimate_howlongtobeat("Battle Royale Arena")));
            assert!((18.0..=45.0).contains(&estimate_howlongtobeat("Untitled Goose Story")));
        }
    }

    #[test]
    fn keyword_classes_apply_in_declaration_order() {
        // "puzzle" wins over "adventure" because the first class matches first
        for _ in 0..10 {
            assert!((5.0..=15.0).contains(&estimate_howlongtobeat("Puzzle Adventure")));
        }
    }

    #[test]
    fn site_lookup_covers_the_source_table() {
        for key in ["steam", "gog", "gmg"] {
            let site = site_for(key).unwrap();
            assert_eq!(site.key(), key);
        }
        assert!(site_for("itch").is_none());
    }
}
