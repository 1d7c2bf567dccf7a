//! Shop product codes, the unique key of a card in the catalog.
//!
//! `PKM-M2-116-K`, `PKM-M2-116-K-V2`, `OPC-OP10-046-K-V1`, `PKM-M2A-045-J-M-BALL`.

use crate::error::{PriceHubError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PRINTING_SUFFIX: Regex = Regex::new(r"(?i)^(.+?)_P(\d+)$").unwrap();
}

/// Korean Pokémon card. Ball and mirror printings share the card number and are
/// told apart by a variant suffix.
pub fn pokemon(expansion_code: &str, card_number: &str, rarity: &str) -> String {
    let base = format!("PKM-{}-{}-K", expansion_code, card_number).to_uppercase();
    match rarity.trim() {
        "몬스터볼" => format!("{}-V1", base),
        "마스터볼" => format!("{}-V2", base),
        "미러" => format!("{}-V3", base),
        _ => base,
    }
}

/// Korean One Piece card: `OP10-046_p2` -> `OPC-OP10-046-K-V2`.
pub fn one_piece(card_number: &str) -> String {
    let card_number = card_number.trim();
    match PRINTING_SUFFIX.captures(card_number) {
        Some(caps) => format!("OPC-{}-K-V{}", &caps[1], &caps[2]).to_uppercase(),
        None => format!("OPC-{}-K", card_number).to_uppercase(),
    }
}

/// Japanese Pokémon card. Mirror printings get a `-M` suffix plus a tag for
/// the mirror pattern; unfamiliar patterns keep their own name as the tag.
pub fn japan(expansion_code: &str, card_number: &str, mirror_type: Option<&str>) -> String {
    let base = format!("PKM-{}-{}-J", expansion_code, card_number).to_uppercase();
    let mirror = match mirror_type.map(str::trim) {
        Some(mirror) if !mirror.is_empty() => mirror,
        _ => return base,
    };

    let tag = if mirror.contains("エネルギー") {
        "ENERGY".to_string()
    } else if mirror.contains("モンスターボール") {
        "MONSTERBALL".to_string()
    } else if mirror.contains("マスターボール") {
        "MASTERBALL".to_string()
    } else if mirror.contains("ボール柄") {
        "BALL".to_string()
    } else if mirror.contains("基本") {
        "BASIC".to_string()
    } else {
        mirror.to_string()
    };
    format!("{}-M-{}", base, tag)
}

/// Japanese product codes never belong in the Korean catalog.
pub fn is_japanese(code: &str) -> bool {
    let code = code.trim().to_uppercase();
    code.contains("-J-") || code.ends_with("-J")
}

/// Expansion code and card number of a `PKM-{EXP}-{NUM}-K[-..]` code.
pub fn parse_pokemon(code: &str) -> Result<(String, String)> {
    let normalized = code.trim().to_ascii_uppercase();
    let parts: Vec<&str> = normalized.split('-').collect();
    if parts.len() < 4 {
        return Err(PriceHubError::InvalidInput(format!(
            "product code {:?} has fewer than 4 parts",
            code
        )));
    }
    Ok((parts[1].to_string(), parts[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pokemon_variants() {
        assert_eq!(pokemon("m2", "116", "MUR"), "PKM-M2-116-K");
        assert_eq!(pokemon("M2", "116", "몬스터볼"), "PKM-M2-116-K-V1");
        assert_eq!(pokemon("M2", "116", "마스터볼"), "PKM-M2-116-K-V2");
        assert_eq!(pokemon("M2", "116", "미러"), "PKM-M2-116-K-V3");
    }

    #[test]
    fn one_piece_printings() {
        assert_eq!(one_piece("OP10-046"), "OPC-OP10-046-K");
        assert_eq!(one_piece("OP10-046_P1"), "OPC-OP10-046-K-V1");
        assert_eq!(one_piece("st03-014_p2"), "OPC-ST03-014-K-V2");
    }

    #[test]
    fn japan_mirror_tags() {
        assert_eq!(japan("M2a", "045", None), "PKM-M2A-045-J");
        assert_eq!(japan("M2a", "045", Some("ボール柄")), "PKM-M2A-045-J-M-BALL");
        assert_eq!(japan("M2a", "045", Some("モンスターボール柄")), "PKM-M2A-045-J-M-MONSTERBALL");
        assert_eq!(japan("M2a", "045", Some("基本ミラー")), "PKM-M2A-045-J-M-BASIC");
        assert_eq!(japan("M2a", "045", Some("エネルギーマーク柄")), "PKM-M2A-045-J-M-ENERGY");
        assert_eq!(japan("M2a", "045", Some("ロケット団柄")), "PKM-M2A-045-J-M-ロケット団柄");
    }

    #[test]
    fn japanese_codes() {
        assert!(is_japanese("PKM-M2-001-J"));
        assert!(is_japanese("PKM-M2-001-J-M-BALL"));
        assert!(!is_japanese("PKM-M2-001-K"));
    }

    #[test]
    fn parses_pokemon_codes() {
        assert_eq!(
            parse_pokemon("PKM-m2-116-K-V1").unwrap(),
            ("M2".to_string(), "116".to_string())
        );
        assert_eq!(
            parse_pokemon("pkm-sv8a-012a-k").unwrap(),
            ("SV8A".to_string(), "012A".to_string())
        );
        assert!(matches!(parse_pokemon("PKM-M2-116"), Err(PriceHubError::InvalidInput(_))));
    }
}
