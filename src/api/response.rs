use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Spotify's representation of an image
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Followers {
    pub href: Option<String>,
    pub total: u32,
}

/// Spotify's representation of a user profile
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub product: Option<String>,
    pub href: String,
    pub uri: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    pub followers: Option<Followers>,
}

impl UserProfile {
    pub fn spotify_url(&self) -> Option<&str> {
        self.external_urls.get("spotify").map(String::as_str)
    }
}

/// Just enough of an artist to name and link to it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistSummary {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistSummary>,
}

/// One entry of the recently played history
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecentPlay {
    pub track: Track,
    pub played_at: Option<String>,
}

/// Offset or cursor based page of items. Recently played pages carry no total or offset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub href: Option<String>,
    pub limit: Option<u32>,
    pub next: Option<String>,
    pub offset: Option<u32>,
    pub previous: Option<String>,
    pub total: Option<u32>,
}

/// Name and link handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistLink {
    pub name: String,
    pub url: String,
}

impl From<&ArtistSummary> for ArtistLink {
    fn from(artist: &ArtistSummary) -> Self {
        Self {
            name: artist.name.clone(),
            url: artist.external_urls.get("spotify").cloned().unwrap_or_default(),
        }
    }
}

/// Artists of the played tracks, each name once, in the order first played
pub fn recent_artists(plays: &[RecentPlay]) -> Vec<ArtistLink> {
    let mut seen = HashSet::new();
    plays
        .iter()
        .flat_map(|play| play.track.artists.iter())
        .filter(|artist| seen.insert(artist.name.clone()))
        .map(ArtistLink::from)
        .collect()
}
