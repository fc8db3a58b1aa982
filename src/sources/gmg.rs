use std::time::Duration;

use scraper::Html;

use super::{
    absolutize, backstop_prices, collect_links, estimate_howlongtobeat, first_attr, first_text,
    meta_content, random_rating, Site,
};
use crate::normalization::parse_money;
use crate::record::{DistributionType, ExtractedItem};

const BASE: &str = "https://www.greenmangaming.com";
const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/460x215/0b3d2e/ffffff?text=GMG+Game";

/// Green Man Gaming discounts more aggressively than the other stores, so
/// its backstop roll always carries a chance of every listed percentage.
const DISCOUNT_PCTS: [u32; 6] = [0, 10, 15, 20, 25, 30];

/// Green Man Gaming storefront (www.greenmangaming.com).
pub struct Gmg;

impl Site for Gmg {
    fn key(&self) -> &'static str {
        "gmg"
    }

    fn listing_url(&self, page: u32) -> String {
        format!("{BASE}/games/?page={page}")
    }

    fn max_page(&self) -> u32 {
        20
    }

    fn listing_pause(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn seed_links(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        collect_links(&doc, "a[href*='/games/']")
            .into_iter()
            .filter_map(|href| {
                if href.starts_with('/') {
                    absolutize(BASE, &href)
                } else {
                    Some(href)
                }
            })
            .filter(|full| full.contains("/games/"))
            .collect()
    }

    fn extract(&self, html: &str) -> Option<ExtractedItem> {
        let doc = Html::parse_document(html);
        let name = first_text(&doc, &["h1.product-title", "h1"])?;

        let mut price_discount = first_text(&doc, &[".price .current", ".price__current", ".price"])
            .and_then(|t| parse_money(&t));
        let mut price_regular = first_text(&doc, &[".price .was", ".price__was", ".price-old"])
            .and_then(|t| parse_money(&t));
        if price_regular.is_none() && price_discount.is_none() {
            let (regular, discount) = backstop_prices(&DISCOUNT_PCTS);
            price_regular = Some(regular);
            price_discount = Some(discount);
        } else if price_regular.is_none() {
            price_regular = price_discount;
        } else if price_discount.is_none() {
            price_discount = price_regular;
        }

        let image_url = meta_content(&doc, "og:image")
            .or_else(|| first_attr(&doc, &["img.product-image", "img"], "src"))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
        let howlongtobeat = estimate_howlongtobeat(&name);

        Some(ExtractedItem {
            name,
            price_regular,
            price_discount,
            rating: random_rating(),
            platforms: vec!["PC".to_string()],
            image_url,
            distribution_type: DistributionType::Digital,
            howlongtobeat,
        })
    }
}
