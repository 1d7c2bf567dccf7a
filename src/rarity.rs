use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref PRINTING_SUFFIX: Regex = Regex::new(r"(?i)_P(\d+)").unwrap();
}

/// Codes of every recognized Korean Pokémon rarity, rarest first.
pub const POKEMON_RARITY_CODES: &[&str] = &[
    "UR", "SSR", "SR", "RR", "RRR", "CHR", "CSR", "BWR", "AR", "SAR", "HR", "R", "U", "C", "MA",
    "몬스터볼", "마스터볼", "이로치", "미러",
];

/// Korean Pokémon card rarities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PokemonRarity {
    Ur,
    Ssr,
    Sr,
    Rr,
    Rrr,
    Chr,
    Csr,
    Bwr,
    Ar,
    Sar,
    Hr,
    R,
    U,
    C,
    Ma,
    MonsterBall,
    MasterBall,
    Shiny,
    Mirror,
    /// A code outside the known set, kept verbatim.
    Unrecognized(String),
}

impl PokemonRarity {
    /// Blank codes mean "no rarity".
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        let rarity = match code {
            "" => return None,
            "UR" => PokemonRarity::Ur,
            "SSR" => PokemonRarity::Ssr,
            "SR" => PokemonRarity::Sr,
            "RR" => PokemonRarity::Rr,
            "RRR" => PokemonRarity::Rrr,
            "CHR" => PokemonRarity::Chr,
            "CSR" => PokemonRarity::Csr,
            "BWR" => PokemonRarity::Bwr,
            "AR" => PokemonRarity::Ar,
            "SAR" => PokemonRarity::Sar,
            "HR" => PokemonRarity::Hr,
            "R" => PokemonRarity::R,
            "U" => PokemonRarity::U,
            "C" => PokemonRarity::C,
            "MA" => PokemonRarity::Ma,
            "몬스터볼" => PokemonRarity::MonsterBall,
            "마스터볼" => PokemonRarity::MasterBall,
            "이로치" => PokemonRarity::Shiny,
            "미러" => PokemonRarity::Mirror,
            other => PokemonRarity::Unrecognized(other.to_string()),
        };
        Some(rarity)
    }

    pub fn code(&self) -> &str {
        match self {
            PokemonRarity::Ur => "UR",
            PokemonRarity::Ssr => "SSR",
            PokemonRarity::Sr => "SR",
            PokemonRarity::Rr => "RR",
            PokemonRarity::Rrr => "RRR",
            PokemonRarity::Chr => "CHR",
            PokemonRarity::Csr => "CSR",
            PokemonRarity::Bwr => "BWR",
            PokemonRarity::Ar => "AR",
            PokemonRarity::Sar => "SAR",
            PokemonRarity::Hr => "HR",
            PokemonRarity::R => "R",
            PokemonRarity::U => "U",
            PokemonRarity::C => "C",
            PokemonRarity::Ma => "MA",
            PokemonRarity::MonsterBall => "몬스터볼",
            PokemonRarity::MasterBall => "마스터볼",
            PokemonRarity::Shiny => "이로치",
            PokemonRarity::Mirror => "미러",
            PokemonRarity::Unrecognized(code) => code,
        }
    }

    /// Common rarities are neither put in search queries nor required in titles.
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            PokemonRarity::Rr
                | PokemonRarity::Rrr
                | PokemonRarity::R
                | PokemonRarity::U
                | PokemonRarity::C
        )
    }

}

impl fmt::Display for PokemonRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Matching regime of a card. Exactly one applies per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RarityCategory {
    Plain,
    /// Manga art printings (`SP-` prefix other than `SP-SP`).
    SuperParallel,
    /// `SP-SP`.
    Special,
    /// `P-` prefix.
    Parallel,
}

const ONE_PIECE_BASE_RARITIES: &[&str] = &["L", "C", "UC", "R", "SR", "SEC", "SP", "P", "TR"];

/// One Piece rarity codes such as `SR`, `P-SR`, `SP-SR` or `SP-SP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OnePieceRarity {
    Plain(String),
    Parallel(String),
    SuperParallel(String),
    Special,
    Unrecognized(String),
}

impl OnePieceRarity {
    pub fn parse(code: &str) -> Self {
        let code = code.trim();
        if code == "SP-SP" {
            return OnePieceRarity::Special;
        }
        let (base, wrap): (&str, fn(String) -> OnePieceRarity) =
            if let Some(base) = code.strip_prefix("SP-") {
                (base, OnePieceRarity::SuperParallel)
            } else if let Some(base) = code.strip_prefix("P-") {
                (base, OnePieceRarity::Parallel)
            } else {
                (code, OnePieceRarity::Plain)
            };

        if ONE_PIECE_BASE_RARITIES.contains(&base) {
            wrap(base.to_string())
        } else {
            OnePieceRarity::Unrecognized(code.to_string())
        }
    }

    /// Unrecognized codes still get the category their prefix implies.
    pub fn category(&self) -> RarityCategory {
        match self {
            OnePieceRarity::Plain(_) => RarityCategory::Plain,
            OnePieceRarity::Parallel(_) => RarityCategory::Parallel,
            OnePieceRarity::SuperParallel(_) => RarityCategory::SuperParallel,
            OnePieceRarity::Special => RarityCategory::Special,
            OnePieceRarity::Unrecognized(code) => category_of_code(code),
        }
    }

    pub fn code(&self) -> String {
        match self {
            OnePieceRarity::Plain(base) => base.clone(),
            OnePieceRarity::Parallel(base) => format!("P-{}", base),
            OnePieceRarity::SuperParallel(base) => format!("SP-{}", base),
            OnePieceRarity::Special => "SP-SP".to_string(),
            OnePieceRarity::Unrecognized(code) => code.clone(),
        }
    }

    /// Rarity of a printing given the catalog card number: `_P1` is a parallel,
    /// `_P2` and above are super parallels.
    pub fn from_printing(card_number: &str, base_rarity: &str) -> Self {
        let rarity = match PRINTING_SUFFIX
            .captures(card_number)
            .and_then(|caps| caps[1].parse::<u32>().ok())
        {
            Some(1) => format!("P-{}", base_rarity),
            Some(_) => format!("SP-{}", base_rarity),
            None => base_rarity.to_string(),
        };
        OnePieceRarity::parse(&rarity)
    }
}

/// Category implied by the prefix of a raw code.
fn category_of_code(code: &str) -> RarityCategory {
    if code == "SP-SP" {
        RarityCategory::Special
    } else if code.starts_with("SP-") {
        RarityCategory::SuperParallel
    } else if code.starts_with("P-") {
        RarityCategory::Parallel
    } else {
        RarityCategory::Plain
    }
}

/// Card number without its printing suffix (`OP10-046_P2` -> `OP10-046`).
pub fn base_card_number(card_number: &str) -> String {
    PRINTING_SUFFIX.replace_all(card_number, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pokemon_generic_set() {
        for code in ["RR", "RRR", "R", "U", "C"] {
            assert!(PokemonRarity::parse(code).unwrap().is_generic(), "{code}");
        }
        for code in ["AR", "SAR", "SR", "마스터볼", "미러"] {
            assert!(!PokemonRarity::parse(code).unwrap().is_generic(), "{code}");
        }
    }

    #[test]
    fn pokemon_unknown_code_is_kept() {
        let rarity = PokemonRarity::parse("ACE").unwrap();
        assert_eq!(rarity, PokemonRarity::Unrecognized("ACE".to_string()));
        assert_eq!(rarity.code(), "ACE");
        assert!(!rarity.is_generic());
    }

    #[test]
    fn pokemon_blank_is_none() {
        assert_eq!(PokemonRarity::parse("  "), None);
    }

    #[test]
    fn one_piece_categories_are_exclusive() {
        assert_eq!(OnePieceRarity::parse("SP-SP").category(), RarityCategory::Special);
        assert_eq!(OnePieceRarity::parse("SP-SR").category(), RarityCategory::SuperParallel);
        assert_eq!(OnePieceRarity::parse("P-SR").category(), RarityCategory::Parallel);
        assert_eq!(OnePieceRarity::parse("SR").category(), RarityCategory::Plain);
        assert_eq!(OnePieceRarity::parse("SEC").category(), RarityCategory::Plain);
    }

    #[test]
    fn one_piece_unrecognized_keeps_prefix_category() {
        let rarity = OnePieceRarity::parse("SP-XYZ");
        assert_eq!(rarity, OnePieceRarity::Unrecognized("SP-XYZ".to_string()));
        assert_eq!(rarity.category(), RarityCategory::SuperParallel);
        assert_eq!(OnePieceRarity::parse("??").category(), RarityCategory::Plain);
    }

    #[test]
    fn one_piece_rarity_from_printing_suffix() {
        assert_eq!(OnePieceRarity::from_printing("OP06-021", "SR").code(), "SR");
        assert_eq!(OnePieceRarity::from_printing("OP06-021_P1", "SR").code(), "P-SR");
        assert_eq!(OnePieceRarity::from_printing("OP06-021_p1", "SR").code(), "P-SR");
        assert_eq!(OnePieceRarity::from_printing("OP10-046_P2", "SR").code(), "SP-SR");
    }

    #[test]
    fn base_number_strips_printing_suffix() {
        assert_eq!(base_card_number("OP10-046_P2"), "OP10-046");
        assert_eq!(base_card_number("ST03-014_p1"), "ST03-014");
        assert_eq!(base_card_number("OP10-046"), "OP10-046");
    }
}
