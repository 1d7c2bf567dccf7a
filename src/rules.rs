//! Matching tables shared by the query builder, the listing filter and the
//! spreadsheet parser. Built once at start-up and passed around by reference.

use crate::card::Game;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

lazy_static! {
    /// Special rarities that must not show up in a target-store title when the
    /// card itself has no (or a common) rarity. Multi-word tokens come first.
    pub static ref UNWANTED_SPECIAL_RARITY: Regex = Regex::new(
        r"\b(로켓단 미러|타입 미러|볼 미러|마스터볼|몬스터볼|UR|SSR|SR|CHR|CSR|BWR|AR|SAR|HR|MA|이로치|미러)\b"
    )
    .unwrap();
    pub static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerMatch {
    /// Seller name equals the store name.
    Exact,
    /// Seller name or title contains one of the aliases.
    Loose,
}

/// A storefront tracked through its own channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStore {
    pub name: String,
    pub aliases: Vec<String>,
    pub seller_match: SellerMatch,
    /// The store sells Japanese editions, so foreign-edition titles are not rejected.
    pub foreign_edition_source: bool,
}

impl TargetStore {
    pub fn tcg999() -> Self {
        TargetStore {
            name: "TCG999".to_string(),
            aliases: vec!["TCG999".to_string()],
            seller_match: SellerMatch::Exact,
            foreign_edition_source: false,
        }
    }

    pub fn card_kingdom() -> Self {
        TargetStore {
            name: "카드킹덤".to_string(),
            aliases: strings(&["카드킹덤", "CARDKINGDOM", "cardkingdom", "카드 킹덤"]),
            seller_match: SellerMatch::Loose,
            foreign_edition_source: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchRules {
    pub excluded_sellers: Vec<String>,
    pub foreign_edition_tokens: Vec<String>,
    pub super_parallel_keywords: Vec<String>,
    pub manga_keywords: Vec<String>,
    pub special_keywords: Vec<String>,
    pub parallel_keywords: Vec<String>,
    /// Cheapest plausible price of a manga printing.
    pub super_parallel_min_price: Decimal,
    pub unknown_seller: String,
    pub pokemon_query_prefix: String,
    pub one_piece_query_prefix: String,
    pub super_parallel_marker: String,
    pub special_marker: String,
    pub parallel_marker: String,
    /// Korean Pokémon expansion codes and display names.
    pub pokemon_expansions: Vec<(String, String)>,
    /// Japanese expansion codes and their storefront URL codes.
    pub japan_url_codes: Vec<(String, String)>,
    pub japan_source: String,
    pub pokemon_target: TargetStore,
    pub one_piece_target: TargetStore,
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules {
            excluded_sellers: strings(&["화성스토어-TCG-", "카드 베이스", "네이버", "쿠팡"]),
            foreign_edition_tokens: strings(&["일본", "일본판", "JP", "JPN", "일판"]),
            super_parallel_keywords: strings(&["슈퍼 패러렐", "슈퍼패러렐", "슈퍼파라렐", "슈퍼 파라렐"]),
            manga_keywords: strings(&["망가", "MANGA", "manga"]),
            special_keywords: strings(&["스페셜", "SP"]),
            parallel_keywords: strings(&[
                "패러렐",
                "다른",
                "패레",
                "P시크릿레어",
                "페러럴",
                "패러럴",
                "페러렐",
                "페레",
            ]),
            super_parallel_min_price: dec!(200000),
            unknown_seller: "알 수 없음".to_string(),
            pokemon_query_prefix: "포켓몬카드".to_string(),
            one_piece_query_prefix: "원피스".to_string(),
            super_parallel_marker: "망가".to_string(),
            special_marker: "SP".to_string(),
            parallel_marker: "패러렐".to_string(),
            pokemon_expansions: pairs(&[
                ("S7D", "마천퍼펙트"),
                ("S8B", "Vmax클라이맥스"),
                ("SV1S", "스칼렛"),
                ("SV1V", "바이올렛"),
                ("SV1A", "트리플렛비트"),
                ("SV2P", "스노해저드"),
                ("SV2D", "클레이버스트"),
                ("SV2A", "포켓몬카드151"),
                ("SV3", "흑염의지배자"),
                ("SV3A", "레이징서프"),
                ("SV4K", "고대의포효"),
                ("SV4M", "미래의일섬"),
                ("SV4A", "샤이니트레저ex"),
                ("SV5K", "와일드포스"),
                ("SV5M", "사이버저지"),
                ("SV5A", "크림슨헤이즈"),
                ("SV6", "변환의가면"),
                ("SV6A", "나이트원더러"),
                ("SV7", "스텔라미라클"),
                ("SV7A", "낙원드래고나"),
                ("SV8", "초전브레이커"),
                ("SV8A", "테라스탈페스타ex"),
                ("SV9A", "배틀파트너즈"),
                ("SV9", "열풍의아레나"),
                ("SV10", "로켓단의영광"),
                ("SV11B", "블랙볼트"),
                ("SV11W", "화이트플레어"),
                ("M1L", "메가브레이브"),
                ("M1S", "메가심포니아"),
                ("M2", "인페르노X"),
                ("S10A", "다크판타즈마"),
                ("M2A", "MEGA드림ex"),
            ]),
            japan_url_codes: pairs(&[
                ("M3", "m03"),
                ("M2a", "m02a"),
                ("M2", "m02"),
                ("M1L", "m01l"),
                ("M1S", "m01s"),
                ("SV11B", "sv11b"),
                ("SV11W", "sv11w"),
                ("SV10", "sv10"),
                ("SV9a", "sv09a"),
                ("SV9", "sv09"),
                ("SV8", "sv08"),
                ("SV7a", "sv07a"),
                ("SV7", "sv07"),
                ("SV6a", "sv06a"),
                ("SV6", "sv06"),
                ("SV5a", "sv05a"),
                ("SV5K", "sv05k"),
                ("SV5M", "sv05m"),
                ("SV4K", "sv04k"),
                ("SV4M", "sv04m"),
                ("SV3a", "sv03a"),
                ("SV3", "sv03"),
                ("SV2a", "sv02a"),
                ("SV2P", "sv02p"),
                ("SV2D", "sv02d"),
                ("SV1a", "sv01a"),
                ("SV1S", "sv01s"),
                ("SV1V", "sv01v"),
            ]),
            japan_source: "유유테이".to_string(),
            pokemon_target: TargetStore::tcg999(),
            one_piece_target: TargetStore::card_kingdom(),
        }
    }
}

impl MatchRules {
    pub fn is_excluded_seller(&self, seller: &str) -> bool {
        self.excluded_sellers.iter().any(|s| s == seller)
    }

    pub fn has_foreign_edition_token(&self, title: &str) -> bool {
        contains_any(title, &self.foreign_edition_tokens)
    }

    pub fn pokemon_expansion_name(&self, code: &str) -> Option<&str> {
        self.pokemon_expansions
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, name)| name.as_str())
    }

    /// Storefront URL code of a Japanese expansion; codes are matched exactly.
    pub fn japan_url_code(&self, expansion_code: &str) -> Option<&str> {
        self.japan_url_codes
            .iter()
            .find(|(c, _)| c == expansion_code)
            .map(|(_, url)| url.as_str())
    }

    pub fn target_store(&self, game: Game) -> Option<&TargetStore> {
        match game {
            Game::Pokemon => Some(&self.pokemon_target),
            Game::OnePiece => Some(&self.one_piece_target),
            Game::Japan => None,
        }
    }
}

pub fn strip_markup(title: &str) -> String {
    HTML_TAG.replace_all(title, "").into_owned()
}

pub fn remove_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, "").into_owned()
}

pub fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}
