use std::time::Duration;

use scraper::Html;

use super::{
    backstop_prices, collect_links, estimate_howlongtobeat, first_text, meta_content,
    random_rating, Site,
};
use crate::normalization::parse_money;
use crate::record::{DistributionType, ExtractedItem};
use crate::synth::DISCOUNT_PCTS;

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/460x215/1b2838/ffffff?text=Game+Cover";

/// Steam storefront (store.steampowered.com).
pub struct Steam;

impl Site for Steam {
    fn key(&self) -> &'static str {
        "steam"
    }

    fn listing_url(&self, page: u32) -> String {
        format!("https://store.steampowered.com/search/?filter=topsellers&page={page}")
    }

    fn max_page(&self) -> u32 {
        30
    }

    fn listing_pause(&self) -> Duration {
        Duration::from_millis(300)
    }

    fn seed_links(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        collect_links(&doc, "a.search_result_row")
            .into_iter()
            .filter(|href| href.contains("/app/"))
            .map(|href| match href.split_once('?') {
                Some((base, _)) => base.to_string(),
                None => href,
            })
            .collect()
    }

    fn extract(&self, html: &str) -> Option<ExtractedItem> {
        let doc = Html::parse_document(html);
        let name = first_text(&doc, &["div#appHubAppName", "div.apphub_AppName"])?;

        let mut price_regular = None;
        let mut price_discount = None;
        if let Some(discounted) = first_text(&doc, &["div.discount_final_price"]) {
            price_discount = parse_money(&discounted);
            price_regular =
                first_text(&doc, &["div.discount_original_price"]).and_then(|t| parse_money(&t));
        } else if let Some(single) = first_text(&doc, &["div.game_purchase_price"]) {
            let price = parse_money(&single);
            price_regular = price;
            price_discount = price;
        }
        if price_regular.is_none() {
            let (regular, discount) = backstop_prices(&DISCOUNT_PCTS);
            price_regular = Some(regular);
            price_discount = Some(discount);
        }
        if price_discount.is_none() {
            price_discount = price_regular;
        }

        let image_url =
            meta_content(&doc, "og:image").unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
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
