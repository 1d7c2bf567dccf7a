use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// One marketplace search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// May still contain markup.
    pub title: String,
    pub price: Decimal,
    pub seller: String,
}

impl Listing {
    pub fn new(title: &str, price: Decimal, seller: &str) -> Self {
        Listing {
            title: title.to_string(),
            price,
            seller: seller.to_string(),
        }
    }
}

/// All listings of one fetch. Every channel of a card is evaluated against the
/// same batch, so a card costs one request no matter how many channels it has.
#[derive(Debug, Clone, Default)]
pub struct ListingBatch {
    pub search_query: String,
    pub listings: Vec<Listing>,
}

impl ListingBatch {
    pub fn new(search_query: &str, listings: Vec<Listing>) -> Self {
        ListingBatch {
            search_query: search_query.to_string(),
            listings,
        }
    }

    pub fn empty(search_query: &str) -> Self {
        ListingBatch::new(search_query, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Outcome of one channel over one batch. A missing price means nothing
/// qualified, which is not the same as a zero price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSelection {
    pub price: Option<Decimal>,
    pub seller: Option<String>,
    pub valid_count: usize,
    pub search_query: String,
}

impl PriceSelection {
    pub fn none(search_query: &str) -> Self {
        PriceSelection {
            price: None,
            seller: None,
            valid_count: 0,
            search_query: search_query.to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.price.is_some()
    }
}

/// Item of the Naver shopping search response.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NaverItem {
    pub title: String,
    pub lprice: String,
    #[serde(default)]
    pub mall_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NaverSearchResponse {
    #[serde(default)]
    pub items: Vec<NaverItem>,
}

impl NaverItem {
    /// Items without a readable price are dropped.
    pub fn into_listing(self, unknown_seller: &str) -> Option<Listing> {
        let price = match Decimal::from_str(self.lprice.trim()) {
            Ok(price) => price,
            Err(_) => {
                log::debug!("Dropping item with unreadable price {:?}: {}", self.lprice, self.title);
                return None;
            }
        };
        Some(Listing {
            title: self.title,
            price,
            seller: self.mall_name.unwrap_or_else(|| unknown_seller.to_string()),
        })
    }
}
