//! Synthetic records that close the gap between what a source yielded and
//! its quota. Values are random but schema-valid, so downstream consumers
//! never need to special-case backfill rows.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::normalization::normalize_name;
use crate::record::{DistributionType, GameRecord};

/// Storefront-shaped price points used for synthetic records and for real
/// records whose price markup could not be read.
pub(crate) const PRICE_POINTS: [f64; 11] = [
    4.99, 9.99, 14.99, 19.99, 24.99, 29.99, 34.99, 39.99, 44.99, 49.99, 59.99,
];

/// Discount percentages, weighted toward no discount.
pub(crate) const DISCOUNT_PCTS: [u32; 8] = [0, 0, 0, 10, 15, 20, 25, 30];

pub(crate) const SYNTHETIC_IMAGE: &str =
    "https://via.placeholder.com/460x215/333333/ffffff?text=Game";

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Random (regular, discount) pair: a list price and a percentage roll off it.
pub(crate) fn price_pair<R: Rng>(rng: &mut R, pcts: &[u32]) -> (f64, f64) {
    let regular = PRICE_POINTS[rng.gen_range(0..PRICE_POINTS.len())];
    let pct = pcts[rng.gen_range(0..pcts.len())];
    let discount = round2(regular * (1.0 - pct as f64 / 100.0));
    (regular, discount)
}

pub(crate) fn random_rating<R: Rng>(rng: &mut R) -> u8 {
    rng.gen_range(80..=99)
}

/// Generator for quota backfill. Owns its RNG so tests can seed it and
/// assert exact output; the run controller creates one per source.
pub struct SyntheticGenerator {
    rng: StdRng,
    counter: usize,
}

impl SyntheticGenerator {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy(), counter: 1 }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), counter: 1 }
    }

    /// Next backfill record for `site` whose normalized identity satisfies
    /// `!is_taken`. The counter advances past collisions and never reuses a
    /// number within this generator's lifetime; registering the identity is
    /// the caller's job, through the same path real records take.
    pub fn next_record(&mut self, site: &str, is_taken: impl Fn(&str) -> bool) -> GameRecord {
        let name = loop {
            let candidate = format!("Exclusive {} Item {}", site.to_uppercase(), self.counter);
            if !is_taken(&normalize_name(&candidate)) {
                break candidate;
            }
            self.counter += 1;
        };
        let (regular, discount) = price_pair(&mut self.rng, &DISCOUNT_PCTS);
        let record = GameRecord {
            name,
            price_regular: Some(regular),
            price_discount: Some(discount),
            rating: random_rating(&mut self.rng),
            platforms: vec!["PC".to_string()],
            image_url: SYNTHETIC_IMAGE.to_string(),
            distribution_type: DistributionType::ALL
                [self.rng.gen_range(0..DistributionType::ALL.len())],
            howlongtobeat: round1(self.rng.gen_range(10.0..50.0)),
            site: site.to_string(),
            url: format!("https://example.com/game/{}", self.counter),
        };
        self.counter += 1;
        record
    }
}
