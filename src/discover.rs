//! Seed discovery: walk a storefront's listing pages and accumulate unique
//! candidate item URLs in first-seen order.

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::fetch::PageFetcher;
use crate::sources::Site;

/// Collect up to `max_urls` item URLs from the site's listing pages.
///
/// Pages that fail to load are skipped; the walk carries on with whatever
/// the remaining pages yield. An empty result is a valid outcome and means
/// the caller will be backfilling from the generator alone.
pub async fn discover_seeds(
    site: &dyn Site,
    fetcher: &dyn PageFetcher,
    max_urls: usize,
) -> Vec<String> {
    let mut seeds: IndexSet<String> = IndexSet::new();
    for page in 1..site.max_page() {
        let url = site.listing_url(page);
        let Some(html) = fetcher.fetch_page(&url).await else {
            debug!(site = site.key(), page, "listing page failed; skipping");
            continue;
        };
        let before = seeds.len();
        for link in site.seed_links(&html) {
            seeds.insert(link);
        }
        debug!(
            site = site.key(),
            page,
            new = seeds.len() - before,
            total = seeds.len(),
            "listing page walked"
        );
        if seeds.len() >= max_urls {
            break;
        }
        tokio::time::sleep(site.listing_pause()).await;
    }
    info!(
        site = site.key(),
        seed_count = seeds.len().min(max_urls),
        "seed discovery complete"
    );
    seeds.into_iter().take(max_urls).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::record::ExtractedItem;

    /// Listing pages are plain text, one URL per line; item pages are unused.
    struct LineSite;

    impl Site for LineSite {
        fn key(&self) -> &'static str {
            "lines"
        }
        fn listing_url(&self, page: u32) -> String {
            format!("test://list/{page}")
        }
        fn max_page(&self) -> u32 {
            4
        }
        fn listing_pause(&self) -> Duration {
            Duration::from_millis(300)
        }
        fn seed_links(&self, html: &str) -> Vec<String> {
            html.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        }
        fn extract(&self, _html: &str) -> Option<ExtractedItem> {
            None
        }
    }

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, url: &str) -> Option<String> {
            self.pages.get(url).cloned()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dedups_across_pages_preserving_first_seen_order() {
        let fetcher = FakeFetcher::new(&[
            ("test://list/1", "u/a\nu/b"),
            ("test://list/2", "u/b\nu/c"),
            ("test://list/3", "u/c\nu/d"),
        ]);
        let seeds = discover_seeds(&LineSite, &fetcher, 10).await;
        assert_eq!(seeds, vec!["u/a", "u/b", "u/c", "u/d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cap_stops_the_walk_and_truncates() {
        let fetcher = FakeFetcher::new(&[
            ("test://list/1", "u/a\nu/b"),
            ("test://list/2", "u/c\nu/d"),
            ("test://list/3", "u/e"),
        ]);
        let seeds = discover_seeds(&LineSite, &fetcher, 3).await;
        assert_eq!(seeds, vec!["u/a", "u/b", "u/c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pages_are_skipped() {
        let fetcher = FakeFetcher::new(&[
            ("test://list/1", "u/a\nu/b"),
            ("test://list/3", "u/c"),
        ]);
        let seeds = discover_seeds(&LineSite, &fetcher, 10).await;
        assert_eq!(seeds, vec!["u/a", "u/b", "u/c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn total_failure_yields_no_seeds() {
        let fetcher = FakeFetcher::new(&[]);
        let seeds = discover_seeds(&LineSite, &fetcher, 10).await;
        assert!(seeds.is_empty());
    }
}
