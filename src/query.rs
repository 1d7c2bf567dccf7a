//! Marketplace search strings built from card identity.

use crate::card::{CardQuery, Game};
use crate::rarity::{base_card_number, OnePieceRarity, PokemonRarity, RarityCategory};
use crate::rules::MatchRules;

pub struct QueryBuilder<'a> {
    rules: &'a MatchRules,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(rules: &'a MatchRules) -> Self {
        QueryBuilder { rules }
    }

    pub fn build(&self, card: &CardQuery) -> String {
        match card.game {
            Game::Pokemon => self.pokemon(&card.name, &card.rarity, &card.expansion_name),
            Game::OnePiece => self.one_piece(&card.rarity, &card.card_number),
            // Japanese cards are priced from storefront pages, not keyword search.
            Game::Japan => format!(
                "{} {}",
                card.base_card_number(),
                card.name.trim()
            )
            .trim()
            .to_string(),
        }
    }

    /// `포켓몬카드 {name} [{rarity}] [{expansion}]`; common rarities are left out.
    pub fn pokemon(&self, card_name: &str, rarity: &str, expansion_name: &str) -> String {
        let mut query = format!("{} {}", self.rules.pokemon_query_prefix, card_name.trim());

        if let Some(rarity) = PokemonRarity::parse(rarity).filter(|r| !r.is_generic()) {
            query.push(' ');
            query.push_str(rarity.code());
        }

        let expansion_name = expansion_name.trim();
        if !expansion_name.is_empty() {
            query.push(' ');
            query.push_str(expansion_name);
        }

        query.trim().to_string()
    }

    pub fn one_piece(&self, rarity: &str, card_number: &str) -> String {
        let base = base_card_number(card_number);

        let query = match OnePieceRarity::parse(rarity).category() {
            RarityCategory::SuperParallel => {
                format!("{} {}", self.rules.super_parallel_marker, base)
            }
            RarityCategory::Special => format!("{} {}", self.rules.special_marker, base),
            RarityCategory::Parallel => format!("{} {}", self.rules.parallel_marker, base),
            RarityCategory::Plain if base.starts_with("ST") || base.starts_with("P-") => {
                format!("{} {}", self.rules.one_piece_query_prefix, base)
            }
            RarityCategory::Plain => base,
        };

        log::debug!("One Piece query for {} ({}): {}", card_number, rarity.trim(), query);
        query.trim().to_string()
    }

    /// Storefront page of a Japanese expansion. An explicit code stored on the
    /// expansion wins over the built-in table.
    pub fn storefront_page(&self, expansion_code: &str, stored_url_code: Option<&str>) -> Option<String> {
        match stored_url_code.map(str::trim) {
            Some(code) if !code.is_empty() => Some(code.to_string()),
            _ => self.rules.japan_url_code(expansion_code).map(str::to_string),
        }
    }
}
