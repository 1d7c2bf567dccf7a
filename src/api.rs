//! Naver shopping search, the listing source for Korean cards.

use crate::auth;
use crate::error::{PriceHubError, Result};
use crate::listing::{Listing, ListingBatch, NaverSearchResponse};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use std::time::Duration;

pub const NAVER_API_BASE: &str = "https://openapi.naver.com";

#[async_trait]
pub trait ListingSource {
    async fn search(&self, query: &str) -> Result<Vec<Listing>>;
}

pub struct NaverShopping {
    client: Client,
    headers: HeaderMap,
    pub base_url: String,
    display: u32,
    unknown_seller: String,
}

impl NaverShopping {
    pub fn new(client_id: &str, client_secret: &str, timeout: Duration, display: u32) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(NaverShopping {
            client,
            headers: auth::naver_headers(client_id, client_secret)?,
            base_url: NAVER_API_BASE.to_string(),
            display,
            unknown_seller: "알 수 없음".to_string(),
        })
    }

    pub fn with_unknown_seller(mut self, label: &str) -> Self {
        self.unknown_seller = label.to_string();
        self
    }
}

#[async_trait]
impl ListingSource for NaverShopping {
    async fn search(&self, query: &str) -> Result<Vec<Listing>> {
        let url = format!(
            "{}/v1/search/shop?query={}&sort=sim&exclude=used:rental:cbshop&display={}",
            self.base_url,
            urlencoding::encode(query),
            self.display
        );

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceHubError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let parsed: NaverSearchResponse = serde_json::from_str(&body)?;
        Ok(parsed
            .items
            .into_iter()
            .filter_map(|item| item.into_listing(&self.unknown_seller))
            .collect())
    }
}

/// Runs one search. Fetch failures are logged and read as "no listings".
pub async fn fetch_batch<S>(source: &S, query: &str) -> ListingBatch
where
    S: ListingSource + ?Sized,
{
    match source.search(query).await {
        Ok(listings) => {
            let batch = ListingBatch::new(query, listings);
            log::info!("Search {:?}: {} listings", query, batch.len());
            batch
        }
        Err(e) => {
            log::warn!("Search {:?} failed: {}", query, e);
            ListingBatch::empty(query)
        }
    }
}
