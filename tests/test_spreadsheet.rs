//! Spreadsheet row import, without a workbook on disk.

mod common;

use pricehub::spreadsheet::{import_rows, ImportMode, SheetRow};
use pricehub::{Game, MatchRules};

fn row(n: usize, code: &str, name: &str) -> SheetRow {
    SheetRow {
        row: n,
        product_code: code.to_string(),
        product_name: name.to_string(),
        image_url: format!("https://img.example.com/{}.jpg", n),
    }
}

fn sheet() -> Vec<SheetRow> {
    vec![
        row(6, "PKM-M2-116-K", "포켓몬카드 메가리자몽 ex SAR 인페르노X"),
        row(7, "PKM-M2-116-K-V2", "포켓몬카드 메가리자몽 ex 마스터볼 미러 인페르노X"),
        row(8, "PKM-M2-001-K", "포켓몬카드 뚜벅쵸 인페르노X"),
        row(9, "PKM-M2-001-J", "포켓몬카드 뚜벅쵸 인페르노X 일본판"),
        row(10, "", "포켓몬카드 빈칸"),
        row(11, "PKM-SV8A-075-K", "포켓몬카드 이야후 테라스탈페스타ex 덱소스"),
        row(12, "PKM-M2", "포켓몬카드 잘린코드 인페르노X"),
        row(13, "PKM-M2-002-K", "원피스 샹크스"),
    ]
}

fn store_with_expansion() -> (pricehub::CatalogStore, tempfile::TempDir) {
    let (mut store, tmp) = common::empty_store();
    store.upsert_expansion(common::expansion(Game::Pokemon, "M2", "인페르노X"));
    (store, tmp)
}

#[test]
fn dry_run_counts_without_writing() {
    let (mut store, _tmp) = store_with_expansion();
    let rules = MatchRules::default();
    let summary = import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: true, update: false });

    assert_eq!(summary.rows, 8);
    assert_eq!(summary.created, 3);
    assert_eq!(summary.skipped_japanese, 1);
    assert_eq!(summary.skipped_empty, 1);
    assert_eq!(summary.missing_expansion, 1);
    assert_eq!(summary.errors, 2);
    assert!(store.cards().is_empty());
}

#[test]
fn apply_parses_names_and_rarities() {
    let (mut store, _tmp) = store_with_expansion();
    let rules = MatchRules::default();
    let summary = import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: false, update: false });
    assert_eq!(summary.created, 3);
    assert_eq!(summary.defaulted_rarity, 1);

    let sar = store.find_card("PKM-M2-116-K").unwrap();
    assert_eq!(sar.name, "메가리자몽 ex");
    assert_eq!(sar.rarity, "SAR");
    assert_eq!(sar.card_number, "116");

    let ball = store.find_card("pkm-m2-116-k-v2").unwrap();
    assert_eq!(ball.rarity, "마스터볼");

    let common = store.find_card("PKM-M2-001-K").unwrap();
    assert_eq!(common.name, "뚜벅쵸");
    assert_eq!(common.rarity, "C");
    assert_eq!(common.image_url, "https://img.example.com/8.jpg");
}

#[test]
fn existing_cards_are_skipped_without_update() {
    let (mut store, _tmp) = store_with_expansion();
    let rules = MatchRules::default();
    import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: false, update: false });

    let again = import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: false, update: false });
    assert_eq!(again.created, 0);
    assert_eq!(again.skipped_existing, 3);
}

#[test]
fn reimport_in_update_mode_is_idempotent() {
    let (mut store, _tmp) = store_with_expansion();
    let rules = MatchRules::default();
    import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: false, update: true });
    let before = store.cards().to_vec();

    let again = import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: false, update: true });
    assert_eq!(again.created, 0);
    assert_eq!(again.updated, 0);
    assert_eq!(again.unchanged, 3);
    assert_eq!(store.cards(), before.as_slice());

    let dry = import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: true, update: true });
    assert_eq!(dry.unchanged, 3);
}

#[test]
fn changed_row_is_updated() {
    let (mut store, _tmp) = store_with_expansion();
    let rules = MatchRules::default();
    import_rows(&mut store, &rules, &sheet(), ImportMode { dry_run: false, update: true });

    let renamed = vec![row(6, "PKM-M2-116-K", "포켓몬카드 메가리자몽 ex 특별판 SAR 인페르노X")];
    let summary = import_rows(&mut store, &rules, &renamed, ImportMode { dry_run: false, update: true });
    assert_eq!(summary.updated, 1);
    assert_eq!(store.find_card("PKM-M2-116-K").unwrap().name, "메가리자몽 ex 특별판");
}
