//! yuyu-tei storefront pages, the price source for Japanese cards. One page
//! lists every card of an expansion as a repeated `.card-product` tile.

use crate::auth;
use crate::error::{PriceHubError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const YUYUTEI_BASE: &str = "https://yuyu-tei.jp";

lazy_static! {
    static ref TILE: Selector = Selector::parse(".card-product").unwrap();
    static ref NUMBER: Selector = Selector::parse("span.d-block.border").unwrap();
    static ref NAME: Selector = Selector::parse("h4.text-primary").unwrap();
    static ref PRICE: Selector = Selector::parse("strong.d-block.text-end").unwrap();
    static ref STOCK: Selector = Selector::parse(".cart_sell_zaiko").unwrap();
    static ref MIRROR_TYPE: Regex = Regex::new(r"\((.+?)(?:/ミラー仕様|/ミ)\)").unwrap();
}

const MIRROR_MARK: &str = "ミラー";
const MIRROR_KEYWORDS: &[&str] = &[MIRROR_MARK, "mirror", "MIRROR", "/ミラー仕様", "/ミ"];
pub const BASIC_MIRROR: &str = "基本ミラー";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    SoldOut,
    Other(String),
    Unknown,
}

impl StockStatus {
    fn from_text(text: &str) -> Self {
        if text.contains('×') {
            StockStatus::SoldOut
        } else if text.contains('○') {
            StockStatus::InStock
        } else {
            StockStatus::Other(text.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StockStatus::InStock => "재고있음",
            StockStatus::SoldOut => "품절",
            StockStatus::Other(text) => text,
            StockStatus::Unknown => "알 수 없음",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontTile {
    pub card_number: String,
    pub name: String,
    pub price: Decimal,
    pub stock: StockStatus,
}

impl StorefrontTile {
    pub fn mirror_type(&self) -> Option<String> {
        mirror_type_of(&self.name)
    }

    pub fn key(&self) -> String {
        card_key(&self.card_number, self.mirror_type().as_deref())
    }
}

/// `250` or `250_ボール柄`.
pub fn card_key(card_number: &str, mirror_type: Option<&str>) -> String {
    match mirror_type {
        Some(mirror) if !mirror.is_empty() => format!("{}_{}", card_number, mirror),
        _ => card_number.to_string(),
    }
}

pub fn is_mirror_name(name: &str) -> bool {
    MIRROR_KEYWORDS.iter().any(|k| name.contains(k))
}

/// `ホップのウールー(ボール柄/ミラー仕様)` -> `ボール柄`. A name spelling out
/// `ミラー` without a pattern annotation is the basic mirror; any other name
/// belongs to the plain printing.
pub fn mirror_type_of(name: &str) -> Option<String> {
    if !is_mirror_name(name) {
        return None;
    }
    match MIRROR_TYPE.captures(name) {
        Some(caps) => Some(caps[1].trim().to_string()),
        None if name.contains(MIRROR_MARK) => Some(BASIC_MIRROR.to_string()),
        None => None,
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

/// `"39,800 円"` -> 39800.
fn parse_yen(text: &str) -> Option<Decimal> {
    let cleaned = text.replace('円', "").replace(',', "");
    Decimal::from_str(cleaned.trim()).ok()
}

fn parse_tile(tile: ElementRef<'_>) -> Option<StorefrontTile> {
    let number_text = text_of(tile.select(&NUMBER).next()?);
    let card_number = number_text
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    let name = text_of(tile.select(&NAME).next()?);
    let price = parse_yen(&text_of(tile.select(&PRICE).next()?))?;

    let stock = match tile.select(&STOCK).next() {
        Some(element) => StockStatus::from_text(&text_of(element)),
        None => StockStatus::Unknown,
    };

    Some(StorefrontTile {
        card_number,
        name,
        price,
        stock,
    })
}

/// Tiles missing a number, name or readable price are skipped.
pub fn parse_storefront(html: &str) -> Vec<StorefrontTile> {
    let document = Html::parse_document(html);
    document.select(&TILE).filter_map(parse_tile).collect()
}

/// Tiles by card key; a later tile replaces an earlier one with the same key.
pub fn tiles_by_key(tiles: Vec<StorefrontTile>) -> HashMap<String, StorefrontTile> {
    tiles.into_iter().map(|tile| (tile.key(), tile)).collect()
}

#[async_trait]
pub trait StorefrontSource {
    async fn expansion_tiles(&self, url_code: &str) -> Result<Vec<StorefrontTile>>;
}

pub struct YuyuTei {
    client: Client,
    pub base_url: String,
}

impl YuyuTei {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(auth::storefront_headers())
            .build()?;
        Ok(YuyuTei {
            client,
            base_url: YUYUTEI_BASE.to_string(),
        })
    }
}

#[async_trait]
impl StorefrontSource for YuyuTei {
    async fn expansion_tiles(&self, url_code: &str) -> Result<Vec<StorefrontTile>> {
        let url = format!("{}/sell/poc/s/{}", self.base_url, url_code);
        log::info!("Fetching storefront page {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PriceHubError::HttpStatus(response.status()));
        }

        let html = response.text().await?;
        let tiles = parse_storefront(&html);
        log::info!("Found {} card tiles on {}", tiles.len(), url);
        Ok(tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tile_html(number: &str, name: &str, price: &str, stock: Option<&str>) -> String {
        let stock = stock
            .map(|s| format!(r#"<label class="cart_sell_zaiko">{}</label>"#, s))
            .unwrap_or_default();
        format!(
            r#"<div class="card-product">
                 <span class="d-block border">{number}</span>
                 <h4 class="text-primary">{name}</h4>
                 <strong class="d-block text-end">{price}</strong>
                 {stock}
               </div>"#
        )
    }

    #[test]
    fn parses_tiles() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            tile_html("250/193", "メガリザードンXex", "39,800 円", Some("在庫 : ○")),
            tile_html("001/193", "フシギダネ", "30 円", Some("在庫 : ×")),
        );
        let tiles = parse_storefront(&html);
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].card_number, "250");
        assert_eq!(tiles[0].price, dec!(39800));
        assert_eq!(tiles[0].stock, StockStatus::InStock);
        assert_eq!(tiles[1].stock, StockStatus::SoldOut);
        assert_eq!(tiles[1].stock.label(), "품절");
    }

    #[test]
    fn unreadable_price_skips_tile() {
        let html = tile_html("010", "ピカチュウ", "売り切れ", None);
        assert!(parse_storefront(&html).is_empty());
    }

    #[test]
    fn missing_stock_is_unknown() {
        let tiles = parse_storefront(&tile_html("010", "ピカチュウ", "100 円", None));
        assert_eq!(tiles[0].stock, StockStatus::Unknown);
    }

    #[test]
    fn mirror_types() {
        assert_eq!(
            mirror_type_of("ホップのウールー(エネルギーマーク柄/ミラー仕様)").as_deref(),
            Some("エネルギーマーク柄")
        );
        assert_eq!(mirror_type_of("ホップのウールー(ボール柄/ミ)").as_deref(), Some("ボール柄"));
        assert_eq!(mirror_type_of("ホップのウールー(ミラー仕様)").as_deref(), Some(BASIC_MIRROR));
        assert_eq!(mirror_type_of("ホップのウールー"), None);
    }

    #[test]
    fn loose_mirror_keywords_stay_plain() {
        assert_eq!(mirror_type_of("ピカチュウ mirror"), None);
        assert_eq!(mirror_type_of("ピカチュウ/ミュウ"), None);
        assert_eq!(card_key("025", mirror_type_of("ピカチュウ/ミュウ").as_deref()), "025");
        assert_eq!(mirror_type_of("ピカチュウ ミラー").as_deref(), Some(BASIC_MIRROR));
    }

    #[test]
    fn keys_separate_mirror_printings() {
        let tiles = vec![
            StorefrontTile {
                card_number: "045".to_string(),
                name: "ウールー".to_string(),
                price: dec!(10),
                stock: StockStatus::InStock,
            },
            StorefrontTile {
                card_number: "045".to_string(),
                name: "ウールー(ボール柄/ミラー仕様)".to_string(),
                price: dec!(80),
                stock: StockStatus::InStock,
            },
        ];
        let map = tiles_by_key(tiles);
        assert_eq!(map["045"].price, dec!(10));
        assert_eq!(map["045_ボール柄"].price, dec!(80));
    }
}
