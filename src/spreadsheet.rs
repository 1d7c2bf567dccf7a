//! Catalog import from the shop's product spreadsheet.
//!
//! Data starts on row 6 of the first worksheet. Column B holds the product
//! code, D the product name and U the image URL.

use crate::card::Game;
use crate::error::{PriceHubError, Result};
use crate::product_code;
use crate::rarity::PokemonRarity;
use crate::rules::MatchRules;
use crate::store::{CatalogStore, NewCard, UpsertOutcome};
use calamine::{open_workbook_auto, Data, Reader};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

pub const FIRST_DATA_ROW: usize = 6;
const CODE_COLUMN: usize = 1;
const NAME_COLUMN: usize = 3;
const IMAGE_COLUMN: usize = 20;

/// Rarity stored for products whose name carries no rarity token.
pub const DEFAULT_RARITY: &str = "C";

const SPECIAL_RARITIES: &[(&str, &str)] = &[
    ("마스터볼 미러", "마스터볼"),
    ("몬스터볼 미러", "몬스터볼"),
    ("마스터볼", "마스터볼"),
    ("몬스터볼", "몬스터볼"),
    ("이로치", "이로치"),
];

lazy_static! {
    static ref WORD_RARITIES: Vec<(&'static str, Regex)> =
        ["UR", "SSR", "SR", "CHR", "CSR", "BWR", "AR", "SAR", "HR", "미러"]
            .iter()
            .map(|code| (*code, Regex::new(&format!(r"\b{}\b", code)).unwrap()))
            .collect();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based, as shown in the spreadsheet.
    pub row: usize,
    pub product_code: String,
    pub product_name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub name: String,
    pub rarity: Option<String>,
    pub expansion_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportMode {
    /// Count what would happen without touching the store.
    pub dry_run: bool,
    /// Rewrite cards that already exist instead of skipping them.
    pub update: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpreadsheetSummary {
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped_empty: usize,
    pub skipped_japanese: usize,
    pub skipped_existing: usize,
    pub missing_expansion: usize,
    pub defaulted_rarity: usize,
    pub errors: usize,
}

pub fn read_workbook(path: &Path) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PriceHubError::Spreadsheet(format!("{}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PriceHubError::Spreadsheet(format!("{} has no worksheet", path.display())))?
        .map_err(|e| PriceHubError::Spreadsheet(e.to_string()))?;

    let (first_row, first_col) = match range.start() {
        Some((row, col)) => (row as usize, col as usize),
        None => return Ok(Vec::new()),
    };

    let cell = |cells: &[Data], column: usize| -> String {
        column
            .checked_sub(first_col)
            .and_then(|idx| cells.get(idx))
            .map(|value| value.to_string().trim().to_string())
            .unwrap_or_default()
    };

    let rows = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| (first_row + idx + 1, cells))
        .filter(|(row, _)| *row >= FIRST_DATA_ROW)
        .map(|(row, cells)| SheetRow {
            row,
            product_code: cell(cells, CODE_COLUMN),
            product_name: cell(cells, NAME_COLUMN),
            image_url: cell(cells, IMAGE_COLUMN),
        })
        .collect();
    Ok(rows)
}

/// Splits `포켓몬카드 {name} [{rarity}] {expansion} ...` into its parts.
pub fn parse_product_name(product_name: &str, rules: &MatchRules) -> Result<ParsedName> {
    let prefix = rules.pokemon_query_prefix.as_str();
    if !product_name.starts_with(prefix) {
        return Err(PriceHubError::InvalidInput(format!(
            "product name {:?} does not start with {}",
            product_name, prefix
        )));
    }
    let mut text = product_name.replacen(prefix, "", 1).trim().to_string();

    let mut names: Vec<&str> = rules.pokemon_expansions.iter().map(|(_, n)| n.as_str()).collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));

    let mut expansion_name = None;
    for name in names {
        if let Some(at) = text.rfind(name) {
            expansion_name = Some(name.to_string());
            text = text[..at].trim().to_string();
            break;
        }
    }

    for (token, rarity) in SPECIAL_RARITIES {
        if let Some(at) = text.rfind(token) {
            return Ok(ParsedName {
                name: text[..at].trim().to_string(),
                rarity: Some(rarity.to_string()),
                expansion_name,
            });
        }
    }

    for (code, pattern) in WORD_RARITIES.iter() {
        if let Some(found) = pattern.find(&text) {
            return Ok(ParsedName {
                name: text[..found.start()].trim().to_string(),
                rarity: Some(code.to_string()),
                expansion_name,
            });
        }
    }

    Ok(ParsedName {
        name: text,
        rarity: None,
        expansion_name,
    })
}

pub fn import_rows(
    store: &mut CatalogStore,
    rules: &MatchRules,
    rows: &[SheetRow],
    mode: ImportMode,
) -> SpreadsheetSummary {
    let mut summary = SpreadsheetSummary::default();

    for row in rows {
        summary.rows += 1;

        if row.product_code.is_empty() || row.product_name.is_empty() {
            summary.skipped_empty += 1;
            continue;
        }
        if product_code::is_japanese(&row.product_code) {
            summary.skipped_japanese += 1;
            continue;
        }

        let existing = store.find_card(&row.product_code).cloned();
        if existing.is_some() && !mode.update {
            summary.skipped_existing += 1;
            continue;
        }

        let (card, defaulted) = match card_from_row(row, rules) {
            Ok(parsed) => parsed,
            Err(e) => {
                summary.errors += 1;
                log::warn!("Row {}: {}", row.row, e);
                continue;
            }
        };

        if store.expansion(Game::Pokemon, &card.expansion_code).is_none() {
            summary.missing_expansion += 1;
            log::warn!("Row {}: expansion {} is not in the store", row.row, card.expansion_code);
            continue;
        }
        if defaulted {
            summary.defaulted_rarity += 1;
            log::info!("Row {}: no rarity in {:?}, storing {}", row.row, row.product_name, DEFAULT_RARITY);
        }

        if mode.dry_run {
            match &existing {
                None => summary.created += 1,
                Some(current) if current.matches(&card) => summary.unchanged += 1,
                Some(_) => summary.updated += 1,
            }
            continue;
        }

        match store.upsert_card(card) {
            Ok(UpsertOutcome::Created) => summary.created += 1,
            Ok(UpsertOutcome::Updated) => summary.updated += 1,
            Ok(UpsertOutcome::Unchanged) => summary.unchanged += 1,
            Err(e) => {
                summary.errors += 1;
                log::warn!("Row {}: {}", row.row, e);
            }
        }
    }

    log::info!(
        "Sheet import{}: {} rows, {} created, {} updated, {} unchanged, {} errors",
        if mode.dry_run { " (dry run)" } else { "" },
        summary.rows,
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.errors
    );
    summary
}

/// The card of one row, and whether its rarity fell back to the default.
fn card_from_row(row: &SheetRow, rules: &MatchRules) -> Result<(NewCard, bool)> {
    let (expansion_code, card_number) = product_code::parse_pokemon(&row.product_code)?;
    let parsed = parse_product_name(&row.product_name, rules)?;
    if parsed.name.is_empty() {
        return Err(PriceHubError::InvalidInput(format!(
            "no card name in {:?}",
            row.product_name
        )));
    }

    let defaulted = parsed.rarity.is_none();
    let rarity = parsed.rarity.unwrap_or_else(|| DEFAULT_RARITY.to_string());
    if let Some(PokemonRarity::Unrecognized(code)) = PokemonRarity::parse(&rarity) {
        log::warn!("Row {}: keeping unrecognized rarity {:?}", row.row, code);
    }

    let card = NewCard {
        game: Game::Pokemon,
        expansion_code,
        card_number,
        name: parsed.name,
        rarity,
        product_code: row.product_code.to_uppercase(),
        image_url: row.image_url.clone(),
        mirror_type: None,
    };
    Ok((card, defaulted))
}
