use serde::{Deserialize, Serialize};

/// How a store delivers the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionType {
    Digital,
    Physical,
    #[serde(rename = "Digital+Physical")]
    DigitalPlusPhysical,
}

impl DistributionType {
    pub const ALL: [DistributionType; 3] = [
        DistributionType::Digital,
        DistributionType::Physical,
        DistributionType::DigitalPlusPhysical,
    ];

    /// Wire/CSV label, identical to the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionType::Digital => "Digital",
            DistributionType::Physical => "Physical",
            DistributionType::DigitalPlusPhysical => "Digital+Physical",
        }
    }
}

/// One harvested listing as extracted from an item page, before the harvest
/// loop attaches provenance. Every field is populated; extraction returns
/// `None` instead of a partial item.
#[derive(Debug, Clone)]
pub struct ExtractedItem {
    pub name: String,
    pub price_regular: Option<f64>,
    pub price_discount: Option<f64>,
    pub rating: u8,
    pub platforms: Vec<String>,
    pub image_url: String,
    pub distribution_type: DistributionType,
    pub howlongtobeat: f64,
}

/// The unit of output: one listing with provenance. Serializes in this field
/// order into the JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub name: String,
    pub price_regular: Option<f64>,
    pub price_discount: Option<f64>,
    pub rating: u8,
    pub platforms: Vec<String>,
    pub image_url: String,
    pub distribution_type: DistributionType,
    pub howlongtobeat: f64,
    pub site: String,
    pub url: String,
}

impl GameRecord {
    /// Attach the source identifier and the fetched URL to an extracted item.
    pub fn from_extracted(item: ExtractedItem, site: &str, url: String) -> Self {
        Self {
            name: item.name,
            price_regular: item.price_regular,
            price_discount: item.price_discount,
            rating: item.rating,
            platforms: item.platforms,
            image_url: item.image_url,
            distribution_type: item.distribution_type,
            howlongtobeat: item.howlongtobeat,
            site: site.to_string(),
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractedItem {
        ExtractedItem {
            name: "Portal 2".into(),
            price_regular: Some(9.99),
            price_discount: Some(4.99),
            rating: 95,
            platforms: vec!["PC".into()],
            image_url: "https://cdn.example/portal2.jpg".into(),
            distribution_type: DistributionType::Digital,
            howlongtobeat: 21.5,
        }
    }

    #[test]
    fn from_extracted_attaches_provenance() {
        let record = GameRecord::from_extracted(
            sample(),
            "steam",
            "https://store.steampowered.com/app/620".into(),
        );
        assert_eq!(record.site, "steam");
        assert_eq!(record.url, "https://store.steampowered.com/app/620");
        assert_eq!(record.name, "Portal 2");
    }

    #[test]
    fn distribution_uses_plus_spelling_on_the_wire() {
        let record = GameRecord {
            distribution_type: DistributionType::DigitalPlusPhysical,
            ..GameRecord::from_extracted(sample(), "gog", "https://www.gog.com/game/x".into())
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""distribution_type":"Digital+Physical""#));
        let back: GameRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.distribution_type, DistributionType::DigitalPlusPhysical);
    }
}
