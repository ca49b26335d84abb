pub mod response;

use std::fmt::{Display, Formatter};

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::auth::AccessToken;
use crate::storage::SessionTokenStore;
use crate::{Error, Result};

use response::{ArtistSummary, Paging, RecentPlay, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeRange {
    Short,
    #[default]
    Medium,
    Long,
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::Short => write!(f, "short_term"),
            TimeRange::Medium => write!(f, "medium_term"),
            TimeRange::Long => write!(f, "long_term"),
        }
    }
}

/// Bearer authenticated access to the web api.
///
/// A rejected token logs the session out before the error reaches the caller.
#[derive(Clone)]
pub struct Spotify {
    client: reqwest::Client,
    base: String,
    session: SessionTokenStore,
}

impl Spotify {
    pub fn new<S: Into<String>>(client: reqwest::Client, base: S, session: SessionTokenStore) -> Self {
        Self {
            client,
            base: base.into(),
            session,
        }
    }

    /// GET `url` with the token and parse the body as `T`
    pub async fn call<T: DeserializeOwned>(&self, token: &AccessToken, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, token.to_header())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Access token rejected, clearing the session");
            self.session.clear()?;
            return Err(Error::TokenExpired);
        }

        let body = response.text().await?;
        if !status.is_success() {
            log::warn!("[{status}] {}", body.replace('\n', ""));
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let jd = &mut serde_json::Deserializer::from_str(&body);
        serde_path_to_error::deserialize(jd).map_err(|err| {
            log::error!("Malformed response from {url}: {err}");
            Error::Api {
                status: status.as_u16(),
                body: format!("Malformed response: {err}"),
            }
        })
    }

    pub async fn profile(&self, token: &AccessToken) -> Result<UserProfile> {
        self.call(token, &format!("{}/me", self.base)).await
    }

    pub async fn top_artists(
        &self,
        token: &AccessToken,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Paging<ArtistSummary>> {
        let query = serde_urlencoded::to_string([
            ("limit", limit.to_string()),
            ("time_range", time_range.to_string()),
        ])?;
        self.call(token, &format!("{}/me/top/artists?{query}", self.base)).await
    }

    pub async fn recently_played(&self, token: &AccessToken, limit: u32) -> Result<Paging<RecentPlay>> {
        let query = serde_urlencoded::to_string([("limit", limit.to_string())])?;
        self.call(token, &format!("{}/me/player/recently-played?{query}", self.base))
            .await
    }
}
