//! Collection runs: walk the catalog, price every card, append the results.

use crate::api::{fetch_batch, ListingSource};
use crate::card::{CardQuery, Game};
use crate::error::{PriceHubError, Result};
use crate::filter::{Channel, ChannelSelection, ListingFilter};
use crate::query::QueryBuilder;
use crate::rules::MatchRules;
use crate::store::{Card, CatalogStore, Expansion, PriceKind};
use crate::yuyutei::{card_key, tiles_by_key, StorefrontSource, StorefrontTile};
use indicatif::ProgressBar;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

/// Cards between two intermediate saves of a long run.
const SAVE_EVERY: usize = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub processed: usize,
    pub general_found: usize,
    pub target_found: usize,
    pub both_found: usize,
    pub neither_found: usize,
    pub fetches: usize,
    pub records_saved: usize,
    /// Japanese expansions without a storefront page, or whose page failed.
    pub skipped_pages: usize,
}

/// One price a probe would save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePrice {
    pub channel: PriceKind,
    pub price: Decimal,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub card: Card,
    pub search: String,
    pub valid_listings: usize,
    pub prices: Vec<ProbePrice>,
}

/// Search identity of a stored card.
pub fn card_query(card: &Card, expansion: Option<&Expansion>, rules: &MatchRules) -> CardQuery {
    let expansion_name = expansion
        .map(|e| e.name.clone())
        .or_else(|| rules.pokemon_expansion_name(&card.expansion_code).map(str::to_string))
        .unwrap_or_default();

    CardQuery {
        game: card.game,
        name: card.name.clone(),
        rarity: card.rarity.clone(),
        expansion_name,
        card_number: card.card_number.clone(),
    }
}

fn channels_for(game: Game, rules: &MatchRules) -> Vec<Channel> {
    let mut channels = vec![Channel::General];
    if let Some(store) = rules.target_store(game) {
        channels.push(Channel::Target(store.clone()));
    }
    channels
}

fn probe_prices(selections: &[ChannelSelection]) -> Vec<ProbePrice> {
    selections
        .iter()
        .filter_map(|s| {
            let price = s.selection.price?;
            let channel = match s.channel {
                Channel::General => PriceKind::General,
                Channel::Target(_) => PriceKind::TargetStore,
            };
            Some(ProbePrice {
                channel,
                price,
                source: s.selection.seller.clone().unwrap_or_default(),
            })
        })
        .collect()
}

async fn price_card<S>(store: &CatalogStore, source: &S, rules: &MatchRules, card: &Card) -> ProbeOutcome
where
    S: ListingSource + ?Sized,
{
    let query = card_query(card, store.expansion(card.game, &card.expansion_code), rules);
    let search = QueryBuilder::new(rules).build(&query);
    let batch = fetch_batch(source, &search).await;

    let filter = ListingFilter::new(rules);
    let selections = filter.select_channels(&batch, &query, &channels_for(card.game, rules));
    let valid_listings = selections
        .iter()
        .map(|s| s.selection.valid_count)
        .max()
        .unwrap_or(0);

    ProbeOutcome {
        card: card.clone(),
        search,
        valid_listings,
        prices: probe_prices(&selections),
    }
}

/// Prices every Korean card of `game` (optionally one expansion) from marketplace search.
pub async fn collect_naver<S>(
    store: &mut CatalogStore,
    source: &S,
    rules: &MatchRules,
    game: Game,
    expansion_code: Option<&str>,
    pacing: Duration,
) -> Result<CollectionSummary>
where
    S: ListingSource + ?Sized,
{
    if game == Game::Japan {
        return Err(PriceHubError::InvalidInput(
            "Japanese cards are collected from the storefront".to_string(),
        ));
    }

    let cards: Vec<Card> = store.cards_for(game, expansion_code).into_iter().cloned().collect();
    log::info!("Collecting {} prices for {} cards", game, cards.len());

    let mut summary = CollectionSummary::default();
    let bar = ProgressBar::new(cards.len() as u64);

    for (idx, card) in cards.iter().enumerate() {
        let outcome = price_card(store, source, rules, card).await;
        summary.processed += 1;
        summary.fetches += 1;

        let general = outcome.prices.iter().any(|p| p.channel == PriceKind::General);
        let target = outcome.prices.iter().any(|p| p.channel == PriceKind::TargetStore);
        match (general, target) {
            (true, true) => summary.both_found += 1,
            (false, false) => summary.neither_found += 1,
            _ => {}
        }
        if general {
            summary.general_found += 1;
        }
        if target {
            summary.target_found += 1;
        }

        if outcome.prices.is_empty() {
            log::warn!("[{}] {}: no valid listing for {:?}", card.product_code, card.name, outcome.search);
        } else {
            for price in &outcome.prices {
                log::info!(
                    "[{}] {} {}: {} ({})",
                    card.product_code,
                    card.name,
                    price.channel,
                    price.price,
                    price.source
                );
            }
        }
        summary.records_saved += save_probe(store, &outcome);

        if (idx + 1) % SAVE_EVERY == 0 {
            store.save()?;
        }

        bar.inc(1);
        if idx + 1 < cards.len() {
            sleep(pacing).await;
        }
    }

    bar.finish_with_message("Collection finished");
    store.save()?;
    Ok(summary)
}

/// Prices Japanese cards from one storefront page per expansion.
pub async fn collect_japan<S>(
    store: &mut CatalogStore,
    source: &S,
    rules: &MatchRules,
    expansion_code: Option<&str>,
    expansion_pacing: Duration,
) -> Result<CollectionSummary>
where
    S: StorefrontSource + ?Sized,
{
    let expansions: Vec<Expansion> = store
        .expansions_for(Game::Japan)
        .into_iter()
        .filter(|e| expansion_code.map_or(true, |code| e.code.eq_ignore_ascii_case(code)))
        .cloned()
        .collect();
    if let Some(code) = expansion_code {
        if expansions.is_empty() {
            return Err(PriceHubError::NotFound(format!("Japanese expansion {}", code)));
        }
    }

    let builder = QueryBuilder::new(rules);
    let mut summary = CollectionSummary::default();
    let bar = ProgressBar::new(expansions.len() as u64);

    for (idx, expansion) in expansions.iter().enumerate() {
        bar.inc(1);
        let page = match builder.storefront_page(&expansion.code, expansion.url_code.as_deref()) {
            Some(page) => page,
            None => {
                log::warn!("No storefront page for expansion {}, skipping", expansion.code);
                summary.skipped_pages += 1;
                continue;
            }
        };

        summary.fetches += 1;
        let tiles = match source.expansion_tiles(&page).await {
            Ok(tiles) => tiles_by_key(tiles),
            Err(e) => {
                log::warn!("Storefront page {} failed: {}", page, e);
                summary.skipped_pages += 1;
                HashMap::new()
            }
        };

        let cards: Vec<Card> = store
            .cards_for(Game::Japan, Some(&expansion.code))
            .into_iter()
            .cloned()
            .collect();
        for card in &cards {
            summary.processed += 1;
            match match_tile(&tiles, card) {
                Some(tile) => {
                    store.record_price(&card.product_code, PriceKind::General, tile.price, &rules.japan_source);
                    summary.general_found += 1;
                    summary.records_saved += 1;
                    log::info!("[{}] {}: ¥{} ({})", card.product_code, card.name, tile.price, tile.stock.label());
                }
                None => {
                    summary.neither_found += 1;
                    log::warn!("[{}] {}: no tile for key {}", card.product_code, card.name, japan_key(card));
                }
            }
        }
        store.save()?;

        if idx + 1 < expansions.len() {
            sleep(expansion_pacing).await;
        }
    }

    bar.finish_with_message("Collection finished");
    Ok(summary)
}

fn japan_key(card: &Card) -> String {
    card_key(&card.card_number, card.mirror_type.as_deref())
}

fn match_tile<'t>(tiles: &'t HashMap<String, StorefrontTile>, card: &Card) -> Option<&'t StorefrontTile> {
    tiles.get(&japan_key(card))
}

/// Prices one Korean card without saving anything.
pub async fn probe_naver<S>(store: &CatalogStore, source: &S, rules: &MatchRules, product_code: &str) -> Result<ProbeOutcome>
where
    S: ListingSource + ?Sized,
{
    let card = store
        .find_card(product_code)
        .cloned()
        .ok_or_else(|| PriceHubError::NotFound(format!("card {}", product_code)))?;
    if card.game == Game::Japan {
        return Err(PriceHubError::InvalidInput(format!(
            "{} is a Japanese card, probe it from the storefront",
            card.product_code
        )));
    }
    Ok(price_card(store, source, rules, &card).await)
}

/// Prices one Japanese card from its expansion's storefront page without saving.
pub async fn probe_japan<S>(store: &CatalogStore, source: &S, rules: &MatchRules, product_code: &str) -> Result<ProbeOutcome>
where
    S: StorefrontSource + ?Sized,
{
    let card = store
        .find_card(product_code)
        .cloned()
        .ok_or_else(|| PriceHubError::NotFound(format!("card {}", product_code)))?;
    let expansion = store.expansion(Game::Japan, &card.expansion_code);
    let page = QueryBuilder::new(rules)
        .storefront_page(&card.expansion_code, expansion.and_then(|e| e.url_code.as_deref()))
        .ok_or_else(|| PriceHubError::NotFound(format!("storefront page for {}", card.expansion_code)))?;

    let tiles = tiles_by_key(source.expansion_tiles(&page).await?);
    let prices = match match_tile(&tiles, &card) {
        Some(tile) => vec![ProbePrice {
            channel: PriceKind::General,
            price: tile.price,
            source: rules.japan_source.clone(),
        }],
        None => Vec::new(),
    };

    Ok(ProbeOutcome {
        search: japan_key(&card),
        valid_listings: prices.len(),
        card,
        prices,
    })
}

/// Appends the prices of a probe; returns how many records were written.
pub fn save_probe(store: &mut CatalogStore, outcome: &ProbeOutcome) -> usize {
    for price in &outcome.prices {
        store.record_price(&outcome.card.product_code, price.channel, price.price, &price.source);
    }
    outcome.prices.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Listing;
    use crate::store::NewCard;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct Canned {
        listings: Vec<Listing>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ListingSource for Canned {
        async fn search(&self, query: &str) -> Result<Vec<Listing>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.listings.clone())
        }
    }

    fn pokemon_store(dir: &std::path::Path) -> CatalogStore {
        let mut store = CatalogStore::open(dir.join("store.json")).unwrap();
        store.upsert_expansion(Expansion {
            game: Game::Pokemon,
            code: "M2".to_string(),
            name: "인페르노X".to_string(),
            url_code: None,
            image_url: String::new(),
            release_date: None,
        });
        store
            .upsert_card(NewCard {
                game: Game::Pokemon,
                expansion_code: "M2".to_string(),
                card_number: "080".to_string(),
                name: "팽도리".to_string(),
                rarity: "AR".to_string(),
                product_code: "PKM-M2-080-K".to_string(),
                image_url: String::new(),
                mirror_type: None,
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn one_fetch_feeds_both_channels() {
        let dir = tempdir().unwrap();
        let mut store = pokemon_store(dir.path());
        let source = Canned {
            listings: vec![
                Listing::new("팽도리 AR 인페르노X", dec!(9000), "TCG999"),
                Listing::new("팽도리 AR", dec!(8500), "B"),
            ],
            queries: Mutex::new(Vec::new()),
        };

        let rules = MatchRules::default();
        let summary = collect_naver(&mut store, &source, &rules, Game::Pokemon, None, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(summary.fetches, 1);
        assert_eq!(summary.both_found, 1);
        assert_eq!(summary.records_saved, 2);
        assert_eq!(*source.queries.lock().unwrap(), vec!["포켓몬카드 팽도리 AR 인페르노X".to_string()]);

        let general = store.latest_price("PKM-M2-080-K", PriceKind::General).unwrap();
        assert_eq!(general.price, dec!(8500));
        assert_eq!(general.source, "B");
        let target = store.latest_price("PKM-M2-080-K", PriceKind::TargetStore).unwrap();
        assert_eq!(target.price, dec!(9000));
    }

    #[tokio::test]
    async fn probe_does_not_save() {
        let dir = tempdir().unwrap();
        let store = pokemon_store(dir.path());
        let source = Canned {
            listings: vec![Listing::new("팽도리 AR", dec!(8500), "B")],
            queries: Mutex::new(Vec::new()),
        };

        let rules = MatchRules::default();
        let outcome = probe_naver(&store, &source, &rules, "pkm-m2-080-k").await.unwrap();
        assert_eq!(outcome.prices.len(), 1);
        assert!(store.prices().is_empty());
    }

    #[tokio::test]
    async fn japan_is_rejected_for_marketplace_runs() {
        let dir = tempdir().unwrap();
        let mut store = pokemon_store(dir.path());
        let source = Canned {
            listings: Vec::new(),
            queries: Mutex::new(Vec::new()),
        };
        let rules = MatchRules::default();
        let result = collect_naver(&mut store, &source, &rules, Game::Japan, None, Duration::ZERO).await;
        assert!(matches!(result, Err(PriceHubError::InvalidInput(_))));
    }
}
