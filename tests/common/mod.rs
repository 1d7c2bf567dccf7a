//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use pricehub::store::{CatalogStore, Expansion, NewCard};
use pricehub::Game;
use tempfile::TempDir;

pub fn expansion(game: Game, code: &str, name: &str) -> Expansion {
    Expansion {
        game,
        code: code.to_string(),
        name: name.to_string(),
        url_code: None,
        image_url: String::new(),
        release_date: None,
    }
}

pub fn card(game: Game, expansion_code: &str, number: &str, name: &str, rarity: &str, code: &str) -> NewCard {
    NewCard {
        game,
        expansion_code: expansion_code.to_string(),
        card_number: number.to_string(),
        name: name.to_string(),
        rarity: rarity.to_string(),
        product_code: code.to_string(),
        image_url: String::new(),
        mirror_type: None,
    }
}

/// Empty store in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn empty_store() -> (CatalogStore, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = CatalogStore::open(tmp.path().join("pricehub.json")).unwrap();
    (store, tmp)
}

/// One expansion per game with a couple of cards each.
pub fn sample_store() -> (CatalogStore, TempDir) {
    let (mut store, tmp) = empty_store();
    store.upsert_expansion(expansion(Game::Pokemon, "M2", "인페르노X"));
    store.upsert_expansion(expansion(Game::OnePiece, "OP10", "왕족의 혈통"));
    store.upsert_expansion(expansion(Game::Japan, "M2a", "MEGAドリームex"));

    store
        .upsert_card(card(Game::Pokemon, "M2", "080", "팽도리", "AR", "PKM-M2-080-K"))
        .unwrap();
    store
        .upsert_card(card(Game::Pokemon, "M2", "010", "팽도리", "C", "PKM-M2-010-K"))
        .unwrap();
    store
        .upsert_card(card(Game::OnePiece, "OP10", "OP10-046_P2", "샹크스", "SP-SR", "OPC-OP10-046-K-V2"))
        .unwrap();

    store
        .upsert_card(card(Game::Japan, "M2a", "045", "ウールー", "C", "PKM-M2A-045-J"))
        .unwrap();
    let mut mirror = card(Game::Japan, "M2a", "045", "ウールー", "C", "PKM-M2A-045-J-M-BALL");
    mirror.mirror_type = Some("ボール柄".to_string());
    store.upsert_card(mirror).unwrap();

    (store, tmp)
}
