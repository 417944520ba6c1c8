use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::endpoints::play_url;

pub const FALLBACK_NAME: &str = "Game";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub playing: Option<u64>,
    #[serde(default)]
    pub visits: Option<u64>,
    #[serde(rename = "rootPlaceId", default)]
    pub root_place_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub id: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardViewModel {
    pub id: String,
    pub name: String,
    // None only on static placeholders, where the count is unknown.
    pub playing: Option<u64>,
    pub visits: Option<u64>,
    pub play_url: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub playing: u64,
    pub visits: u64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedListings {
    pub cards: Vec<CardViewModel>,
    pub stats: AggregateStats,
}

impl LoadedListings {
    pub fn from_parts(listings: &[Listing], icons: &HashMap<String, String>) -> Self {
        let cards = build_cards(listings, icons);
        let stats = aggregate(&cards);
        Self { cards, stats }
    }
}

/// First entry per identifier wins; entries without an image are skipped.
pub fn icon_lookup(thumbnails: &[Thumbnail]) -> HashMap<String, String> {
    let mut icons = HashMap::new();
    for thumb in thumbnails {
        let Some(url) = thumb.image_url.as_ref().filter(|u| !u.is_empty()) else {
            continue;
        };
        if thumb.id.is_empty() {
            continue;
        }
        icons.entry(thumb.id.clone()).or_insert_with(|| url.clone());
    }
    icons
}

pub fn card_for(listing: &Listing, icons: &HashMap<String, String>) -> CardViewModel {
    let name = listing
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_NAME)
        .to_string();
    CardViewModel {
        id: listing.id.clone(),
        name,
        playing: Some(listing.playing.unwrap_or(0)),
        visits: Some(listing.visits.unwrap_or(0)),
        play_url: play_url(listing.root_place_id.as_deref()),
        image_url: icons.get(&listing.id).cloned(),
    }
}

pub fn build_cards(listings: &[Listing], icons: &HashMap<String, String>) -> Vec<CardViewModel> {
    listings.iter().map(|l| card_for(l, icons)).collect()
}

pub fn aggregate(cards: &[CardViewModel]) -> AggregateStats {
    cards.iter().fold(
        AggregateStats {
            count: cards.len(),
            ..AggregateStats::default()
        },
        |mut acc, card| {
            acc.playing = acc.playing.saturating_add(card.playing.unwrap_or(0));
            acc.visits = acc.visits.saturating_add(card.visits.unwrap_or(0));
            acc
        },
    )
}

/// Cards shown before any live data arrives in static-fallback mode.
pub fn placeholder_cards(ids: &[String]) -> Vec<CardViewModel> {
    ids.iter()
        .map(|id| CardViewModel {
            id: id.clone(),
            name: FALLBACK_NAME.to_string(),
            playing: None,
            visits: None,
            play_url: play_url(None),
            image_url: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, playing: Option<u64>, visits: Option<u64>) -> Listing {
        Listing {
            id: id.to_string(),
            name: Some(format!("Game {id}")),
            playing,
            visits,
            root_place_id: None,
        }
    }

    #[test]
    fn duplicate_thumbnails_keep_first_image() {
        let icons = icon_lookup(&[
            Thumbnail {
                id: "42".to_string(),
                image_url: None,
            },
            Thumbnail {
                id: "42".to_string(),
                image_url: Some("https://img/first.png".to_string()),
            },
            Thumbnail {
                id: "42".to_string(),
                image_url: Some("https://img/second.png".to_string()),
            },
        ]);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons["42"], "https://img/first.png");
    }

    #[test]
    fn missing_fields_default_to_zero_and_fallbacks() {
        let card = card_for(
            &Listing {
                id: "7".to_string(),
                name: Some("   ".to_string()),
                playing: None,
                visits: None,
                root_place_id: None,
            },
            &HashMap::new(),
        );
        assert_eq!(card.name, FALLBACK_NAME);
        assert_eq!(card.playing, Some(0));
        assert_eq!(card.visits, Some(0));
        assert_eq!(card.play_url, crate::endpoints::DISCOVER_URL);
        assert!(card.image_url.is_none());
    }

    #[test]
    fn aggregate_sums_defaulted_counts() {
        let loaded = LoadedListings::from_parts(
            &[
                listing("1", Some(10), Some(1_000)),
                listing("2", None, Some(5)),
                listing("3", Some(7), None),
            ],
            &HashMap::new(),
        );
        assert_eq!(
            loaded.stats,
            AggregateStats {
                playing: 17,
                visits: 1_005,
                count: 3
            }
        );
    }

    #[test]
    fn placeholders_have_unknown_counts() {
        let cards = placeholder_cards(&["1".to_string(), "2".to_string()]);
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| c.playing.is_none() && c.visits.is_none()));
    }
}
