//! Interactive catalog editing: expansions and hand-added cards.

use crate::card::Game;
use crate::error::{PriceHubError, Result};
use crate::product_code;
use crate::rarity::{OnePieceRarity, PokemonRarity, POKEMON_RARITY_CODES};
use crate::rules::MatchRules;
use crate::store::{CatalogStore, Expansion, NewCard, UpsertOutcome};
use crate::yuyutei::mirror_type_of;
use chrono::NaiveDate;
use inquire::{Select, Text};

const ALL_EXPANSIONS: &str = "(all expansions)";

pub fn select_game() -> Result<Game> {
    let options: Vec<String> = Game::all()
        .iter()
        .map(|g| format!("{} ({})", g.label(), g))
        .collect();
    let choice = Select::new("Which catalog?", options.clone()).prompt()?;
    let idx = options.iter().position(|o| *o == choice).unwrap_or(0);
    Ok(Game::all()[idx])
}

/// `None` means every expansion of the game.
pub fn select_expansion(store: &CatalogStore, game: Game, allow_all: bool) -> Result<Option<String>> {
    let mut options: Vec<String> = store
        .expansions_for(game)
        .iter()
        .map(|e| format!("{} - {}", e.code, e.name))
        .collect();
    if options.is_empty() {
        return Err(PriceHubError::NotFound(format!("no {} expansions in the store", game)));
    }
    if allow_all {
        options.insert(0, ALL_EXPANSIONS.to_string());
    }

    let choice = Select::new("Select an expansion:", options).prompt()?;
    if choice == ALL_EXPANSIONS {
        return Ok(None);
    }
    Ok(choice.split(" - ").next().map(str::to_string))
}

pub fn parse_release_date(text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PriceHubError::InvalidInput(format!("release date {:?}: {}", text, e)))
}

pub fn add_expansion(store: &mut CatalogStore, rules: &MatchRules) -> Result<UpsertOutcome> {
    let game = select_game()?;
    let code = Text::new("Expansion code:").prompt()?.trim().to_string();
    if code.is_empty() {
        return Err(PriceHubError::InvalidInput("empty expansion code".to_string()));
    }

    let known_name = match game {
        Game::Pokemon => rules.pokemon_expansion_name(&code).unwrap_or_default(),
        Game::OnePiece | Game::Japan => "",
    };
    let name = Text::new("Expansion name:").with_default(known_name).prompt()?;

    let url_code = match game {
        Game::Japan => {
            let known = rules.japan_url_code(&code).unwrap_or_default();
            let entered = Text::new("Storefront page code:").with_default(known).prompt()?;
            Some(entered.trim().to_string()).filter(|c| !c.is_empty())
        }
        Game::Pokemon | Game::OnePiece => None,
    };

    let image_url = Text::new("Image URL:").with_default("").prompt()?;
    let release_date = parse_release_date(&Text::new("Release date (YYYY-MM-DD):").with_default("").prompt()?)?;

    let outcome = store.upsert_expansion(Expansion {
        game,
        code: code.clone(),
        name: name.trim().to_string(),
        url_code,
        image_url: image_url.trim().to_string(),
        release_date,
    });
    log::info!("Expansion {} ({}): {:?}", code, game, outcome);
    Ok(outcome)
}

/// Product code and normalized rarity of a hand-entered card.
pub fn build_card(
    game: Game,
    expansion_code: &str,
    card_number: &str,
    name: &str,
    rarity: &str,
    mirror_name: Option<&str>,
    image_url: &str,
) -> NewCard {
    let card_number = card_number.trim();
    let (rarity, product_code, mirror_type) = match game {
        Game::Pokemon => {
            if let Some(PokemonRarity::Unrecognized(code)) = PokemonRarity::parse(rarity) {
                log::warn!("Keeping unrecognized rarity {:?} for {}", code, name);
            }
            let code = product_code::pokemon(expansion_code, card_number, rarity);
            (rarity.trim().to_string(), code, None)
        }
        Game::OnePiece => {
            let rarity = OnePieceRarity::from_printing(card_number, rarity.trim());
            (rarity.code(), product_code::one_piece(card_number), None)
        }
        Game::Japan => {
            let mirror_type = mirror_name.and_then(mirror_type_of);
            let code = product_code::japan(expansion_code, card_number, mirror_type.as_deref());
            (rarity.trim().to_string(), code, mirror_type)
        }
    };

    NewCard {
        game,
        expansion_code: expansion_code.to_string(),
        card_number: card_number.to_string(),
        name: name.trim().to_string(),
        rarity,
        product_code,
        image_url: image_url.trim().to_string(),
        mirror_type,
    }
}

/// Registers a card missing from the catalog.
pub fn add_card(store: &mut CatalogStore) -> Result<UpsertOutcome> {
    let game = select_game()?;
    let expansion_code = select_expansion(store, game, false)?
        .ok_or_else(|| PriceHubError::InvalidInput("no expansion selected".to_string()))?;

    let card_number = Text::new("Card number:").prompt()?;
    let name = Text::new("Card name:").prompt()?;
    let rarity = match game {
        Game::Pokemon => {
            let mut options: Vec<String> = POKEMON_RARITY_CODES.iter().map(|c| c.to_string()).collect();
            options.push("(other)".to_string());
            match Select::new("Rarity:", options).prompt()?.as_str() {
                "(other)" => Text::new("Rarity code:").prompt()?,
                code => code.to_string(),
            }
        }
        Game::OnePiece => Text::new("Base rarity (L, C, UC, R, SR, SEC, SP, P, TR):").prompt()?,
        Game::Japan => Text::new("Rarity:").with_default("").prompt()?,
    };
    let mirror_name = match game {
        Game::Japan => Some(Text::new("Storefront name (for mirror printings):").with_default("").prompt()?),
        Game::Pokemon | Game::OnePiece => None,
    };
    let image_url = Text::new("Image URL:").with_default("").prompt()?;

    let card = build_card(
        game,
        &expansion_code,
        &card_number,
        &name,
        &rarity,
        mirror_name.as_deref(),
        &image_url,
    );
    println!("Product code: {}", card.product_code);
    let outcome = store.upsert_card(card)?;
    log::info!("Card {} {}: {:?}", card_number.trim(), name.trim(), outcome);
    Ok(outcome)
}
