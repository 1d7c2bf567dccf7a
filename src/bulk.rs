//! JSON dumps of the catalog and price history, for moving data between stores.

use crate::card::Game;
use crate::error::{PriceHubError, Result};
use crate::store::{now, Card, CatalogStore, Expansion, NewCard, PriceKind, PriceRecord, UpsertOutcome};
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

const MAX_LOGGED_ERRORS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRange {
    /// Since local midnight.
    Today,
    Days(u32),
    All,
}

impl ExportRange {
    pub fn label(&self) -> String {
        match self {
            ExportRange::Today => "오늘".to_string(),
            ExportRange::Days(n) => format!("최근 {}일", n),
            ExportRange::All => "전체".to_string(),
        }
    }

    /// Earliest timestamp inside the range.
    pub fn start(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        match self {
            ExportRange::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|midnight| now.offset().from_local_datetime(&midnight).single()),
            ExportRange::Days(n) => Some(now - Duration::days(i64::from(*n))),
            ExportRange::All => None,
        }
    }
}

impl FromStr for ExportRange {
    type Err = PriceHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(ExportRange::Today),
            "all" => Ok(ExportRange::All),
            other => other
                .parse::<u32>()
                .map(ExportRange::Days)
                .map_err(|_| PriceHubError::InvalidInput(format!("unknown export range {:?}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Skip,
    Overwrite,
}

/// A price row as written to a dump. Product code and timestamp are optional on
/// the way in so their absence is reported per row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPrice {
    #[serde(default, alias = "shop_product_code")]
    pub product_code: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub source: String,
    #[serde(default = "default_channel")]
    pub channel: PriceKind,
    #[serde(default)]
    pub collected_at: Option<String>,
}

fn default_channel() -> PriceKind {
    PriceKind::General
}

impl From<&PriceRecord> for ExportPrice {
    fn from(record: &PriceRecord) -> Self {
        ExportPrice {
            product_code: Some(record.product_code.clone()),
            price: record.price,
            source: record.source.clone(),
            channel: record.channel,
            collected_at: Some(record.collected_at.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub export_date: String,
    pub date_range: String,
    #[serde(default)]
    pub expansions: Vec<Expansion>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub prices: Vec<ExportPrice>,
}

/// A dump as read back for import. Rows stay raw JSON until each is converted,
/// so a malformed row is counted instead of failing the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub date_range: Option<String>,
    #[serde(default)]
    pub expansions: Vec<Value>,
    #[serde(default)]
    pub cards: Vec<Value>,
    #[serde(default)]
    pub prices: Vec<Value>,
}

impl TryFrom<ExportDocument> for ImportDocument {
    type Error = PriceHubError;

    fn try_from(document: ExportDocument) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(document)?)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub expansions_created: usize,
    pub expansions_updated: usize,
    pub cards_created: usize,
    pub cards_updated: usize,
    pub prices_created: usize,
    pub prices_skipped: usize,
    pub prices_overwritten: usize,
    pub not_found: usize,
    pub errors: usize,
}

impl ImportSummary {
    fn error(&mut self, message: String) {
        self.errors += 1;
        if self.errors <= MAX_LOGGED_ERRORS {
            log::warn!("{}", message);
        }
    }
}

pub fn export(store: &CatalogStore, range: ExportRange, game: Option<Game>) -> ExportDocument {
    let exported_at = now();
    let start = range.start(exported_at);
    let in_game = |g: Game| game.map_or(true, |wanted| wanted == g);

    let expansions: Vec<Expansion> = store
        .expansions()
        .iter()
        .filter(|e| in_game(e.game))
        .cloned()
        .collect();
    let cards: Vec<Card> = store.cards().iter().filter(|c| in_game(c.game)).cloned().collect();
    let prices: Vec<ExportPrice> = store
        .prices()
        .iter()
        .filter(|p| start.map_or(true, |s| p.collected_at >= s))
        .filter(|p| match game {
            Some(g) => store.find_card(&p.product_code).map(|c| c.game) == Some(g),
            None => true,
        })
        .map(ExportPrice::from)
        .collect();

    log::info!(
        "Exporting {} expansions, {} cards, {} prices ({})",
        expansions.len(),
        cards.len(),
        prices.len(),
        range.label()
    );

    ExportDocument {
        export_date: exported_at.to_rfc3339(),
        date_range: range.label(),
        expansions,
        cards,
        prices,
    }
}

pub fn write_document(path: &Path, document: &ExportDocument) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.flush()?;
    Ok(())
}

pub fn read_document(path: &Path) -> Result<ImportDocument> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// RFC 3339 first; a timestamp without an offset is read as local time.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.with_timezone(local.offset()))
}

pub fn import(store: &mut CatalogStore, document: ImportDocument, policy: DuplicatePolicy) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (idx, value) in document.expansions.into_iter().enumerate() {
        let expansion: Expansion = match serde_json::from_value(value) {
            Ok(expansion) => expansion,
            Err(e) => {
                summary.error(format!("expansion row {}: {}", idx + 1, e));
                continue;
            }
        };
        match store.upsert_expansion(expansion) {
            UpsertOutcome::Created => summary.expansions_created += 1,
            UpsertOutcome::Updated => summary.expansions_updated += 1,
            UpsertOutcome::Unchanged => {}
        }
    }

    for (idx, value) in document.cards.into_iter().enumerate() {
        let card: NewCard = match serde_json::from_value(value) {
            Ok(card) => card,
            Err(e) => {
                summary.error(format!("card row {}: {}", idx + 1, e));
                continue;
            }
        };
        let product_code = card.product_code.clone();
        match store.upsert_card(card) {
            Ok(UpsertOutcome::Created) => summary.cards_created += 1,
            Ok(UpsertOutcome::Updated) => summary.cards_updated += 1,
            Ok(UpsertOutcome::Unchanged) => {}
            Err(e) => summary.error(format!("card {}: {}", product_code, e)),
        }
    }

    for (idx, value) in document.prices.into_iter().enumerate() {
        let row: ExportPrice = match serde_json::from_value(value) {
            Ok(row) => row,
            Err(e) => {
                summary.error(format!("price row {}: {}", idx + 1, e));
                continue;
            }
        };
        let product_code = match row.product_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_uppercase(),
            _ => {
                summary.error(format!("price row {}: missing product code", idx + 1));
                continue;
            }
        };

        let card_code = match store.find_card(&product_code) {
            Some(card) => card.product_code.clone(),
            None => {
                summary.not_found += 1;
                continue;
            }
        };

        let collected_at = match row.collected_at.as_deref() {
            Some(text) => match parse_timestamp(text) {
                Some(parsed) => parsed,
                None => {
                    summary.error(format!("price row {}: unreadable timestamp {:?}", idx + 1, text));
                    continue;
                }
            },
            None => {
                summary.error(format!("price row {}: missing timestamp", idx + 1));
                continue;
            }
        };

        let record = PriceRecord {
            product_code: card_code,
            channel: row.channel,
            price: row.price,
            source: row.source,
            collected_at,
        };

        match (store.find_price_slot(&record), policy) {
            (Some(_), DuplicatePolicy::Skip) => summary.prices_skipped += 1,
            (Some(index), DuplicatePolicy::Overwrite) => match store.replace_price(index, record) {
                Ok(()) => summary.prices_overwritten += 1,
                Err(e) => summary.error(format!("price row {}: {}", idx + 1, e)),
            },
            (None, _) => {
                store.append_price(record);
                summary.prices_created += 1;
            }
        }
    }

    log::info!(
        "Imported prices: {} created, {} skipped, {} overwritten, {} without card, {} errors",
        summary.prices_created,
        summary.prices_skipped,
        summary.prices_overwritten,
        summary.not_found,
        summary.errors
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn ranges_parse() {
        assert_eq!("today".parse::<ExportRange>().unwrap(), ExportRange::Today);
        assert_eq!("7".parse::<ExportRange>().unwrap(), ExportRange::Days(7));
        assert_eq!("ALL".parse::<ExportRange>().unwrap(), ExportRange::All);
        assert!("week".parse::<ExportRange>().is_err());
    }

    #[test]
    fn today_starts_at_midnight() {
        let now = DateTime::parse_from_rfc3339("2025-11-03T15:20:00+09:00").unwrap();
        let start = ExportRange::Today.start(now).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-11-03T00:00:00+09:00");
        assert_eq!(ExportRange::All.start(now), None);
        assert_eq!(
            ExportRange::Days(7).start(now).unwrap().to_rfc3339(),
            "2025-10-27T15:20:00+09:00"
        );
    }

    #[test]
    fn timestamps_keep_offset_and_fraction() {
        let parsed = parse_timestamp("2025-11-03T15:20:01.123456+09:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(parsed.nanosecond(), 123_456_000);
    }

    #[test]
    fn naive_timestamp_falls_back_to_local() {
        let parsed = parse_timestamp("2025-11-03 15:20:01").unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2025-11-03 15:20:01");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn legacy_rows_deserialize() {
        let row: ExportPrice = serde_json::from_str(
            r#"{"shop_product_code": "PKM-M2-001-J", "price": 39800.0, "source": "유유테이",
                "collected_at": "2025-11-03T15:20:01+09:00"}"#,
        )
        .unwrap();
        assert_eq!(row.product_code.as_deref(), Some("PKM-M2-001-J"));
        assert_eq!(row.channel, PriceKind::General);
    }
}
