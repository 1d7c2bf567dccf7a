use crate::card::Game;
use crate::store::{CatalogStore, PriceKind, PriceRecord};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestPrice {
    pub price: Decimal,
    pub source: String,
    pub collected_at: DateTime<FixedOffset>,
}

impl From<&PriceRecord> for LatestPrice {
    fn from(record: &PriceRecord) -> Self {
        LatestPrice {
            price: record.price,
            source: record.source.clone(),
            collected_at: record.collected_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub product_code: String,
    pub expansion_code: String,
    pub card_number: String,
    pub name: String,
    pub rarity: String,
    pub general: Option<LatestPrice>,
    pub target: Option<LatestPrice>,
}

/// Latest general and target-store price of every card, in catalog order.
pub fn latest_prices(store: &CatalogStore, game: Game, expansion_code: Option<&str>) -> Vec<ReportRow> {
    store
        .cards_for(game, expansion_code)
        .into_iter()
        .map(|card| ReportRow {
            product_code: card.product_code.clone(),
            expansion_code: card.expansion_code.clone(),
            card_number: card.card_number.clone(),
            name: card.name.clone(),
            rarity: card.rarity.clone(),
            general: store
                .latest_price(&card.product_code, PriceKind::General)
                .map(LatestPrice::from),
            target: store
                .latest_price(&card.product_code, PriceKind::TargetStore)
                .map(LatestPrice::from),
        })
        .collect()
}

fn cell(price: &Option<LatestPrice>) -> String {
    match price {
        Some(p) => format!("{} ({}, {})", p.price, p.source, p.collected_at.format("%Y-%m-%d %H:%M")),
        None => "-".to_string(),
    }
}

pub fn render(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "[{}] {} {} {} | general: {} | target: {}\n",
            row.product_code,
            row.card_number,
            row.name,
            row.rarity,
            cell(&row.general),
            cell(&row.target)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Expansion, NewCard};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn rows_carry_latest_prices() {
        let dir = tempdir().unwrap();
        let mut store = CatalogStore::open(dir.path().join("store.json")).unwrap();
        store.upsert_expansion(Expansion {
            game: Game::OnePiece,
            code: "OP10".to_string(),
            name: "왕족의 혈통".to_string(),
            url_code: None,
            image_url: String::new(),
            release_date: None,
        });
        store
            .upsert_card(NewCard {
                game: Game::OnePiece,
                expansion_code: "OP10".to_string(),
                card_number: "OP10-046".to_string(),
                name: "샹크스".to_string(),
                rarity: "SR".to_string(),
                product_code: "OPC-OP10-046-K".to_string(),
                image_url: String::new(),
                mirror_type: None,
            })
            .unwrap();
        store.record_price("OPC-OP10-046-K", PriceKind::TargetStore, dec!(12000), "카드킹덤");

        let rows = latest_prices(&store, Game::OnePiece, Some("op10"));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].general.is_none());
        assert_eq!(rows[0].target.as_ref().unwrap().price, dec!(12000));

        let text = render(&rows);
        assert!(text.contains("general: -"));
        assert!(text.contains("12000 (카드킹덤"));
    }
}
