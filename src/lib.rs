//! Card price collection for a Korean trading-card shop.
//!
//! Korean Pokémon and One Piece cards are priced from Naver shopping search,
//! Japanese Pokémon cards from yuyu-tei storefront pages. Prices land in an
//! append-only history inside a JSON catalog store.

pub mod api;
pub mod auth;
pub mod bulk;
pub mod card;
pub mod config;
pub mod error;
pub mod expansions;
pub mod filter;
pub mod listing;
pub mod prices;
pub mod product_code;
pub mod query;
pub mod rarity;
pub mod report;
pub mod rules;
pub mod spreadsheet;
pub mod store;
pub mod yuyutei;

pub use card::{CardQuery, Game};
pub use config::Config;
pub use error::{PriceHubError, Result};
pub use filter::{Channel, ListingFilter};
pub use listing::{Listing, ListingBatch, PriceSelection};
pub use query::QueryBuilder;
pub use rules::MatchRules;
pub use store::CatalogStore;
