use std::time::Duration;

use scraper::Html;

use super::{
    absolutize, backstop_prices, collect_links, estimate_howlongtobeat, first_text, meta_content,
    random_rating, Site,
};
use crate::normalization::parse_money;
use crate::record::{DistributionType, ExtractedItem};
use crate::synth::DISCOUNT_PCTS;

const BASE: &str = "https://www.gog.com";
const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/460x215/5e3268/ffffff?text=GOG+Game";

/// GOG storefront (www.gog.com).
pub struct Gog;

impl Site for Gog {
    fn key(&self) -> &'static str {
        "gog"
    }

    fn listing_url(&self, page: u32) -> String {
        format!("{BASE}/en/games?page={page}&order=desc:trending")
    }

    fn max_page(&self) -> u32 {
        30
    }

    fn listing_pause(&self) -> Duration {
        Duration::from_millis(300)
    }

    fn seed_links(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let mut links = collect_links(&doc, "a.product-tile");
        if links.is_empty() {
            // Tile markup shifts between frontend releases; fall back to any
            // game link on the page.
            links = collect_links(&doc, "a[href*='/game/']");
        }
        links
            .into_iter()
            .filter_map(|href| absolutize(BASE, &href))
            .filter(|full| full.contains("/game/"))
            .collect()
    }

    fn extract(&self, html: &str) -> Option<ExtractedItem> {
        let doc = Html::parse_document(html);
        let name = first_text(&doc, &["h1.productcard-basics__title", "h1"])?;

        let mut price_regular = None;
        let mut price_discount = None;
        if let Some(final_amount) =
            first_text(&doc, &["span.product-actions-price__final-amount", "span.price-value"])
        {
            price_discount = parse_money(&final_amount);
            price_regular =
                match first_text(&doc, &["span.product-actions-price__base-amount"]) {
                    Some(base_amount) => parse_money(&base_amount),
                    None => price_discount,
                };
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_links_absolutize_tiles() {
        let html = r#"
            <a class="product-tile" href="/en/game/cyberpunk_2077"></a>
            <a class="product-tile" href="https://www.gog.com/game/the_witcher"></a>
            <a class="product-tile" href="/en/news/sale"></a>
        "#;
        let links = Gog.seed_links(html);
        assert_eq!(
            links,
            vec![
                "https://www.gog.com/en/game/cyberpunk_2077".to_string(),
                "https://www.gog.com/game/the_witcher".to_string(),
            ]
        );
    }

    #[test]
    fn seed_links_fall_back_to_bare_game_anchors() {
        let html = r#"<div><a href="/game/stardew_valley">Stardew</a></div>"#;
        let links = Gog.seed_links(html);
        assert_eq!(links, vec!["https://www.gog.com/game/stardew_valley".to_string()]);
    }

    #[test]
    fn extract_reads_base_and_final_amounts() {
        let html = r#"
            <h1 class="productcard-basics__title">Cyberpunk 2077</h1>
            <span class="product-actions-price__final-amount">29,99</span>
            <span class="product-actions-price__base-amount">59,99</span>
        "#;
        let item = Gog.extract(html).unwrap();
        assert_eq!(item.name, "Cyberpunk 2077");
        assert_eq!(item.price_regular, Some(59.99));
        assert_eq!(item.price_discount, Some(29.99));
        assert_eq!(item.image_url, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn extract_without_base_amount_mirrors_final() {
        let html = r#"
            <h1>Stardew Valley</h1>
            <span class="price-value">13,99</span>
        "#;
        let item = Gog.extract(html).unwrap();
        assert_eq!(item.price_regular, Some(13.99));
        assert_eq!(item.price_discount, Some(13.99));
    }

    #[test]
    fn extract_requires_a_heading() {
        let html = r#"<span class="price-value">13,99</span>"#;
        assert!(Gog.extract(html).is_none());
    }

    #[test]
    fn listing_urls_walk_trending() {
        assert_eq!(
            Gog.listing_url(7),
            "https://www.gog.com/en/games?page=7&order=desc:trending"
        );
    }
}
