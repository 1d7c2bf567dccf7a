use crate::rarity::{base_card_number, OnePieceRarity, PokemonRarity, RarityCategory};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    /// Korean Pokémon cards.
    Pokemon,
    /// Korean One Piece cards.
    OnePiece,
    /// Japanese Pokémon cards.
    Japan,
}

impl Game {
    pub fn label(&self) -> &'static str {
        match self {
            Game::Pokemon => "포켓몬카드",
            Game::OnePiece => "원피스",
            Game::Japan => "일본판",
        }
    }

    pub fn all() -> [Game; 3] {
        [Game::Pokemon, Game::OnePiece, Game::Japan]
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Game::Pokemon => "pokemon",
            Game::OnePiece => "one-piece",
            Game::Japan => "japan",
        };
        write!(f, "{}", name)
    }
}

/// Identity of the card one collection attempt is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardQuery {
    pub game: Game,
    pub name: String,
    pub rarity: String,
    pub expansion_name: String,
    pub card_number: String,
}

impl CardQuery {
    pub fn pokemon(name: &str, rarity: &str, expansion_name: &str) -> Self {
        CardQuery {
            game: Game::Pokemon,
            name: name.to_string(),
            rarity: rarity.to_string(),
            expansion_name: expansion_name.to_string(),
            card_number: String::new(),
        }
    }

    pub fn one_piece(name: &str, rarity: &str, expansion_name: &str, card_number: &str) -> Self {
        CardQuery {
            game: Game::OnePiece,
            name: name.to_string(),
            rarity: rarity.to_string(),
            expansion_name: expansion_name.to_string(),
            card_number: card_number.to_string(),
        }
    }

    pub fn base_card_number(&self) -> String {
        base_card_number(&self.card_number)
    }

    pub fn pokemon_rarity(&self) -> Option<PokemonRarity> {
        PokemonRarity::parse(&self.rarity)
    }

    /// Rarity a listing title must carry. Blank and common rarities gate nothing.
    pub fn required_rarity(&self) -> Option<PokemonRarity> {
        self.pokemon_rarity().filter(|rarity| !rarity.is_generic())
    }

    /// Only One Piece cards carry printing categories.
    pub fn category(&self) -> RarityCategory {
        match self.game {
            Game::OnePiece => OnePieceRarity::parse(&self.rarity).category(),
            Game::Pokemon | Game::Japan => RarityCategory::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pokemon_cards_are_always_plain() {
        let query = CardQuery::pokemon("팽도리", "SP-SR", "인페르노X");
        assert_eq!(query.category(), RarityCategory::Plain);
    }

    #[test]
    fn one_piece_variant_categories() {
        let manga = CardQuery::one_piece("샹크스", "SP-SR", "", "OP10-046_P2");
        assert_eq!(manga.category(), RarityCategory::SuperParallel);
        assert_eq!(manga.base_card_number(), "OP10-046");

        let special = CardQuery::one_piece("샹크스", "SP-SP", "", "OP10-046");
        assert_eq!(special.category(), RarityCategory::Special);

        let parallel = CardQuery::one_piece("샹크스", " P-SR ", "", "OP10-046_P1");
        assert_eq!(parallel.category(), RarityCategory::Parallel);
    }

    #[test]
    fn required_rarity_skips_blank_and_common() {
        assert_eq!(CardQuery::pokemon("팽도리", "AR", "").required_rarity(), Some(PokemonRarity::Ar));
        assert_eq!(CardQuery::pokemon("팽도리", " RR ", "").required_rarity(), None);
        assert_eq!(CardQuery::pokemon("팽도리", "", "").required_rarity(), None);
        assert_eq!(
            CardQuery::pokemon("피카츄", "ACE", "").required_rarity(),
            Some(PokemonRarity::Unrecognized("ACE".to_string()))
        );
    }

    #[test]
    fn game_display_names() {
        assert_eq!(Game::OnePiece.to_string(), "one-piece");
        assert_eq!(Game::Japan.label(), "일본판");
    }
}
