//! Listing filter and lowest-price selection.
//!
//! A listing survives a channel when it passes, in order: the seller deny-list,
//! the foreign-edition check, identity matching on the markup-free title, and
//! the channel's own seller requirement. The cheapest survivor wins; ties keep
//! the listing seen first.

use crate::card::{CardQuery, Game};
use crate::listing::{Listing, ListingBatch, PriceSelection};
use crate::rarity::RarityCategory;
use crate::rules::{
    contains_any, remove_whitespace, strip_markup, MatchRules, SellerMatch, TargetStore,
    UNWANTED_SPECIAL_RARITY,
};
use std::fmt;

/// One independent price target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Lowest price over every seller.
    General,
    /// Lowest price of a single storefront.
    Target(TargetStore),
}

impl Channel {
    pub fn label(&self) -> &str {
        match self {
            Channel::General => "general",
            Channel::Target(store) => &store.name,
        }
    }

    fn allows_foreign_edition(&self) -> bool {
        match self {
            Channel::General => false,
            Channel::Target(store) => store.foreign_edition_source,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Why a listing was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ExcludedSeller,
    ForeignEdition,
    NameMismatch,
    NumberMismatch,
    MissingRarity,
    UnwantedSpecialRarity,
    MissingVariantKeyword,
    BelowPriceFloor,
    WrongSeller,
}

#[derive(Debug, Clone)]
pub struct ChannelSelection {
    pub channel: Channel,
    pub selection: PriceSelection,
}

pub struct ListingFilter<'a> {
    rules: &'a MatchRules,
}

impl<'a> ListingFilter<'a> {
    pub fn new(rules: &'a MatchRules) -> Self {
        ListingFilter { rules }
    }

    /// Evaluates every channel against the same batch.
    pub fn select_channels(
        &self,
        batch: &ListingBatch,
        card: &CardQuery,
        channels: &[Channel],
    ) -> Vec<ChannelSelection> {
        channels
            .iter()
            .map(|channel| ChannelSelection {
                channel: channel.clone(),
                selection: self.select(batch, card, channel),
            })
            .collect()
    }

    pub fn select(&self, batch: &ListingBatch, card: &CardQuery, channel: &Channel) -> PriceSelection {
        let mut selection = PriceSelection::none(&batch.search_query);
        let mut winner: Option<&Listing> = None;

        for listing in &batch.listings {
            if let Err(reason) = self.check(listing, card, channel) {
                log::trace!("[{}] rejected {:?}: {}", channel, reason, listing.title);
                continue;
            }
            selection.valid_count += 1;

            match winner {
                Some(current) if listing.price >= current.price => {}
                _ => winner = Some(listing),
            }
        }

        if let Some(listing) = winner {
            selection.price = Some(listing.price);
            selection.seller = Some(self.winning_seller(listing, channel));
        }
        selection
    }

    pub fn check(&self, listing: &Listing, card: &CardQuery, channel: &Channel) -> Result<(), Rejection> {
        if self.rules.is_excluded_seller(&listing.seller) {
            return Err(Rejection::ExcludedSeller);
        }

        if !channel.allows_foreign_edition() && self.rules.has_foreign_edition_token(&listing.title) {
            return Err(Rejection::ForeignEdition);
        }

        let title = strip_markup(&listing.title);

        match card.game {
            Game::Pokemon => self.check_pokemon(&title, card, channel)?,
            Game::OnePiece | Game::Japan => self.check_numbered(&title, listing, card)?,
        }

        if let Channel::Target(store) = channel {
            if !seller_matches(store, listing) {
                return Err(Rejection::WrongSeller);
            }
        }

        Ok(())
    }

    fn check_pokemon(&self, title: &str, card: &CardQuery, channel: &Channel) -> Result<(), Rejection> {
        let wanted = remove_whitespace(&card.name).to_lowercase();
        let haystack = remove_whitespace(title).to_lowercase();
        if !haystack.contains(&wanted) {
            return Err(Rejection::NameMismatch);
        }

        match card.required_rarity() {
            Some(rarity) if !title.contains(rarity.code()) => return Err(Rejection::MissingRarity),
            Some(_) => {}
            // A common card's query can still surface a rare printing from the store.
            None if matches!(channel, Channel::Target(_)) && UNWANTED_SPECIAL_RARITY.is_match(title) => {
                return Err(Rejection::UnwantedSpecialRarity)
            }
            None => {}
        }

        Ok(())
    }

    fn check_numbered(&self, title: &str, listing: &Listing, card: &CardQuery) -> Result<(), Rejection> {
        if !title.contains(&card.base_card_number()) {
            return Err(Rejection::NumberMismatch);
        }

        match card.category() {
            RarityCategory::SuperParallel => {
                let tagged = contains_any(title, &self.rules.super_parallel_keywords)
                    || contains_any(title, &self.rules.manga_keywords);
                if !tagged {
                    return Err(Rejection::MissingVariantKeyword);
                }
                if listing.price < self.rules.super_parallel_min_price {
                    return Err(Rejection::BelowPriceFloor);
                }
            }
            RarityCategory::Special => {
                if !contains_any(title, &self.rules.special_keywords) {
                    return Err(Rejection::MissingVariantKeyword);
                }
            }
            RarityCategory::Parallel => {
                if !contains_any(title, &self.rules.parallel_keywords) {
                    return Err(Rejection::MissingVariantKeyword);
                }
            }
            RarityCategory::Plain => {}
        }

        Ok(())
    }

    fn winning_seller(&self, listing: &Listing, channel: &Channel) -> String {
        match channel {
            Channel::Target(store) if listing.seller.is_empty() => store.name.clone(),
            _ => listing.seller.clone(),
        }
    }
}

fn seller_matches(store: &TargetStore, listing: &Listing) -> bool {
    match store.seller_match {
        SellerMatch::Exact => listing.seller == store.name,
        SellerMatch::Loose => {
            contains_any(&listing.seller, &store.aliases) || contains_any(&listing.title, &store.aliases)
        }
    }
}
