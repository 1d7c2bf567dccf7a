//! JSON catalog store: expansions, cards and the append-only price history.

use crate::card::Game;
use crate::error::{PriceHubError, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub game: Game,
    pub code: String,
    pub name: String,
    /// Storefront page code, Japanese expansions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_code: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    pub game: Game,
    pub expansion_code: String,
    pub card_number: String,
    pub name: String,
    pub rarity: String,
    pub product_code: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_type: Option<String>,
}

/// Card fields as supplied by an import or a prompt, before it has an id.
/// A dumped `Card` row reads as a `NewCard`; its `id` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCard {
    pub game: Game,
    pub expansion_code: String,
    pub card_number: String,
    pub name: String,
    pub rarity: String,
    pub product_code: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub mirror_type: Option<String>,
}

impl Card {
    /// True when storing `incoming` would leave this card as it is.
    pub fn matches(&self, incoming: &NewCard) -> bool {
        self.game == incoming.game
            && self.expansion_code.eq_ignore_ascii_case(&incoming.expansion_code)
            && self.card_number == incoming.card_number
            && self.name == incoming.name
            && self.rarity == incoming.rarity
            && self.image_url == incoming.image_url
            && self.mirror_type.as_deref().unwrap_or("") == incoming.mirror_type.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    General,
    TargetStore,
}

impl fmt::Display for PriceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceKind::General => write!(f, "general"),
            PriceKind::TargetStore => write!(f, "target_store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_code: String,
    pub channel: PriceKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub source: String,
    pub collected_at: DateTime<FixedOffset>,
}

impl PriceRecord {
    pub fn new(product_code: &str, channel: PriceKind, price: Decimal, source: &str) -> Self {
        PriceRecord {
            product_code: product_code.to_uppercase(),
            channel,
            price,
            source: source.to_string(),
            collected_at: now(),
        }
    }

    /// Same product, channel and instant.
    pub fn same_slot(&self, other: &PriceRecord) -> bool {
        self.channel == other.channel
            && self.collected_at == other.collected_at
            && self.product_code.eq_ignore_ascii_case(&other.product_code)
    }
}

/// Current local time with its UTC offset.
pub fn now() -> DateTime<FixedOffset> {
    let local = Local::now();
    local.with_timezone(local.offset())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteScope {
    PricesOnly,
    CardsAndPrices,
    Everything,
    /// One expansion with its cards and their prices.
    Expansion(String),
}

/// Proof that the user answered `yes` and then typed `DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfirmation {
    _confirmed: (),
}

impl DeleteConfirmation {
    pub const TOKEN: &'static str = "DELETE";

    pub fn from_answers(answer: &str, typed_token: &str) -> Option<Self> {
        let agreed = answer.trim().eq_ignore_ascii_case("yes");
        if agreed && typed_token.trim() == Self::TOKEN {
            Some(DeleteConfirmation { _confirmed: () })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub expansions: usize,
    pub cards: usize,
    pub prices: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameCounts {
    pub expansions: usize,
    pub cards: usize,
    pub prices: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalog {
    #[serde(default)]
    expansions: Vec<Expansion>,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default)]
    prices: Vec<PriceRecord>,
}

pub struct CatalogStore {
    path: PathBuf,
    catalog: Catalog,
}

impl CatalogStore {
    /// Opens the store at `path`; a missing file is an empty catalog.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let catalog = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No store at {}, starting empty", path.display());
                Catalog::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(CatalogStore { path, catalog })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a sibling temp file and renames it over the store.
    pub fn save(&self) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &self.catalog)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        log::debug!("Saved store to {}", self.path.display());
        Ok(())
    }

    pub fn expansions(&self) -> &[Expansion] {
        &self.catalog.expansions
    }

    pub fn cards(&self) -> &[Card] {
        &self.catalog.cards
    }

    pub fn prices(&self) -> &[PriceRecord] {
        &self.catalog.prices
    }

    pub fn expansions_for(&self, game: Game) -> Vec<&Expansion> {
        self.catalog
            .expansions
            .iter()
            .filter(|e| e.game == game)
            .collect()
    }

    pub fn expansion(&self, game: Game, code: &str) -> Option<&Expansion> {
        self.catalog
            .expansions
            .iter()
            .find(|e| e.game == game && e.code.eq_ignore_ascii_case(code))
    }

    pub fn upsert_expansion(&mut self, expansion: Expansion) -> UpsertOutcome {
        let existing = self
            .catalog
            .expansions
            .iter_mut()
            .find(|e| e.game == expansion.game && e.code.eq_ignore_ascii_case(&expansion.code));

        match existing {
            Some(current) if *current == expansion => UpsertOutcome::Unchanged,
            Some(current) => {
                *current = expansion;
                UpsertOutcome::Updated
            }
            None => {
                self.catalog.expansions.push(expansion);
                UpsertOutcome::Created
            }
        }
    }

    pub fn find_card(&self, product_code: &str) -> Option<&Card> {
        let code = product_code.trim();
        self.catalog
            .cards
            .iter()
            .find(|c| c.product_code.eq_ignore_ascii_case(code))
    }

    /// Cards of a game, optionally narrowed to one expansion, in catalog order.
    pub fn cards_for(&self, game: Game, expansion_code: Option<&str>) -> Vec<&Card> {
        self.catalog
            .cards
            .iter()
            .filter(|c| c.game == game)
            .filter(|c| match expansion_code {
                Some(code) => c.expansion_code.eq_ignore_ascii_case(code),
                None => true,
            })
            .collect()
    }

    /// Inserts or updates by product code. The expansion must already exist.
    pub fn upsert_card(&mut self, card: NewCard) -> Result<UpsertOutcome> {
        let expansion_code = match self.expansion(card.game, &card.expansion_code) {
            Some(expansion) => expansion.code.clone(),
            None => {
                return Err(PriceHubError::NotFound(format!(
                    "expansion {} ({})",
                    card.expansion_code, card.game
                )))
            }
        };

        let product_code = card.product_code.trim().to_uppercase();
        if product_code.is_empty() {
            return Err(PriceHubError::InvalidInput("empty product code".to_string()));
        }

        let next_id = self.catalog.cards.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let existing = self
            .catalog
            .cards
            .iter_mut()
            .find(|c| c.product_code.eq_ignore_ascii_case(&product_code));

        let id = existing.as_ref().map(|c| c.id).unwrap_or(next_id);
        let incoming = Card {
            id,
            game: card.game,
            expansion_code,
            card_number: card.card_number,
            name: card.name,
            rarity: card.rarity,
            product_code,
            image_url: card.image_url,
            mirror_type: card.mirror_type.filter(|m| !m.is_empty()),
        };

        Ok(match existing {
            Some(current) if *current == incoming => UpsertOutcome::Unchanged,
            Some(current) => {
                *current = incoming;
                UpsertOutcome::Updated
            }
            None => {
                self.catalog.cards.push(incoming);
                UpsertOutcome::Created
            }
        })
    }

    pub fn append_price(&mut self, record: PriceRecord) {
        self.catalog.prices.push(record);
    }

    pub fn record_price(&mut self, product_code: &str, channel: PriceKind, price: Decimal, source: &str) {
        self.append_price(PriceRecord::new(product_code, channel, price, source));
    }

    /// Most recent record; on equal timestamps the later append wins.
    pub fn latest_price(&self, product_code: &str, channel: PriceKind) -> Option<&PriceRecord> {
        self.catalog
            .prices
            .iter()
            .filter(|p| p.channel == channel && p.product_code.eq_ignore_ascii_case(product_code))
            .fold(None, |latest: Option<&PriceRecord>, p| match latest {
                Some(current) if current.collected_at > p.collected_at => Some(current),
                _ => Some(p),
            })
    }

    pub fn find_price_slot(&self, record: &PriceRecord) -> Option<usize> {
        self.catalog.prices.iter().position(|p| p.same_slot(record))
    }

    pub fn replace_price(&mut self, index: usize, record: PriceRecord) -> Result<()> {
        match self.catalog.prices.get_mut(index) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(PriceHubError::NotFound(format!("price record #{}", index))),
        }
    }

    /// Prices whose card belongs to `game`.
    pub fn prices_for(&self, game: Game) -> Vec<&PriceRecord> {
        self.catalog
            .prices
            .iter()
            .filter(|p| self.find_card(&p.product_code).map(|c| c.game) == Some(game))
            .collect()
    }

    pub fn counts(&self, game: Game) -> GameCounts {
        GameCounts {
            expansions: self.expansions_for(game).len(),
            cards: self.cards_for(game, None).len(),
            prices: self.prices_for(game).len(),
        }
    }

    pub fn delete(&mut self, game: Game, scope: &DeleteScope, _confirmation: DeleteConfirmation) -> Result<DeleteSummary> {
        let expansion_filter = match scope {
            DeleteScope::Expansion(code) => match self.expansion(game, code) {
                Some(expansion) => Some(expansion.code.clone()),
                None => return Err(PriceHubError::NotFound(format!("expansion {} ({})", code, game))),
            },
            _ => None,
        };

        let doomed_codes: Vec<String> = self
            .cards_for(game, expansion_filter.as_deref())
            .into_iter()
            .map(|c| c.product_code.clone())
            .collect();
        let doomed = |code: &str| doomed_codes.iter().any(|d| d.eq_ignore_ascii_case(code));

        let mut summary = DeleteSummary::default();

        let before = self.catalog.prices.len();
        self.catalog.prices.retain(|p| !doomed(&p.product_code));
        summary.prices = before - self.catalog.prices.len();

        if *scope != DeleteScope::PricesOnly {
            let before = self.catalog.cards.len();
            self.catalog.cards.retain(|c| !doomed(&c.product_code));
            summary.cards = before - self.catalog.cards.len();
        }

        let drop_expansions = match scope {
            DeleteScope::Everything => true,
            DeleteScope::Expansion(_) => true,
            DeleteScope::PricesOnly | DeleteScope::CardsAndPrices => false,
        };
        if drop_expansions {
            let before = self.catalog.expansions.len();
            self.catalog.expansions.retain(|e| {
                let in_scope = e.game == game
                    && match &expansion_filter {
                        Some(code) => e.code.eq_ignore_ascii_case(code),
                        None => true,
                    };
                !in_scope
            });
            summary.expansions = before - self.catalog.expansions.len();
        }

        log::info!(
            "Deleted {} expansions, {} cards, {} prices for {}",
            summary.expansions,
            summary.cards,
            summary.prices,
            game
        );
        Ok(summary)
    }
}
