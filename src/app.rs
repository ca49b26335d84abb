use serde::Deserialize;

use crate::api::response::{recent_artists, ArtistLink};
use crate::api::{Spotify, TimeRange};
use crate::auth::{AccessToken, OAuth};
use crate::browser::Navigator;
use crate::storage::{SessionTokenStore, Storage, VerifierStore};
use crate::ui::Presenter;
use crate::{Config, Error, Result, Shared};

pub const TOP_ARTISTS_LIMIT: u32 = 10;
pub const RECENTLY_PLAYED_LIMIT: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// An authorization code arrived and is being exchanged
    PendingCallback,
    Authenticated,
}

/// Capabilities the client borrows from its host.
#[derive(Clone)]
pub struct Environment {
    /// Survives leaving for the provider and coming back. Holds the verifier.
    pub local: Shared<dyn Storage>,
    /// Lives only as long as the session. Holds the access token.
    pub session: Shared<dyn Storage>,
    pub navigator: Shared<dyn Navigator>,
    pub http: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

pub struct App<P: Presenter> {
    state: AuthState,
    oauth: OAuth,
    spotify: Spotify,
    session: SessionTokenStore,
    navigator: Shared<dyn Navigator>,
    presenter: P,
}

impl<P: Presenter> App<P> {
    pub fn new(config: &Config, env: Environment, presenter: P) -> Result<Self> {
        let verifier = VerifierStore::new(env.local);
        let session = SessionTokenStore::new(env.session, verifier.clone());

        Ok(Self {
            state: AuthState::Unauthenticated,
            oauth: OAuth::new(config, env.http.clone(), verifier, env.navigator.clone())?,
            spotify: Spotify::new(env.http, config.api_url.clone(), session.clone()),
            session,
            navigator: env.navigator,
            presenter,
        })
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Run on every page load: resume a session, finish a pending login, or report logged out.
    pub async fn init(&mut self) {
        if let Err(err) = self.try_init().await {
            self.fail(err);
        }
    }

    /// Send the user to the provider. Returns whether control actually left the client.
    pub fn login(&mut self) -> bool {
        match self.oauth.begin() {
            Ok(()) => true,
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    pub fn logout(&mut self) {
        self.state = AuthState::Unauthenticated;
        match self.session.clear() {
            Ok(()) => self.presenter.show_status("Logged out."),
            Err(err) => self.fail(err),
        }
    }

    async fn try_init(&mut self) -> Result<()> {
        if let Some(token) = self.session.get() {
            log::debug!("Resuming existing session");
            self.state = AuthState::Authenticated;
            return self.load(&token).await;
        }

        let Some(code) = self.callback_code() else {
            self.state = AuthState::Unauthenticated;
            self.presenter.show_status("Not logged in.");
            return Ok(());
        };

        self.state = AuthState::PendingCallback;
        let exchanged = self.oauth.exchange(&code).await;

        // Both the verifier and the code are spent whatever the outcome
        if let Err(err) = self.session.verifier().clear() {
            log::warn!("Failed to clear the spent verifier: {err}");
        }
        if let Err(err) = self.navigator.replace("/") {
            log::warn!("Failed to strip the code from the location: {err}");
        }

        let token = exchanged?;
        self.session.set(&token)?;
        self.state = AuthState::Authenticated;
        self.load(&token).await
    }

    fn callback_code(&self) -> Option<String> {
        let query = self.navigator.query()?;
        let params = match serde_qs::from_str::<CallbackParams>(&query) {
            Ok(params) => params,
            Err(err) => {
                log::warn!("Ignoring unreadable callback query: {err}");
                return None;
            }
        };

        if let Some(error) = params.error {
            log::warn!("Authorization was not granted: {error}");
        }
        params.code.filter(|code| !code.is_empty())
    }

    async fn load(&mut self, token: &AccessToken) -> Result<()> {
        self.presenter.show_status("Loading…");

        let (profile, top, recent) = futures::join!(
            self.spotify.profile(token),
            self.spotify
                .top_artists(token, TOP_ARTISTS_LIMIT, TimeRange::Medium),
            self.spotify.recently_played(token, RECENTLY_PLAYED_LIMIT),
        );

        // Once any call has logged the session out, sibling results are discarded
        let expired = [profile.as_ref().err(), top.as_ref().err(), recent.as_ref().err()]
            .contains(&Some(&Error::TokenExpired));
        if expired {
            return Err(Error::TokenExpired);
        }

        let profile = profile?;
        self.presenter.show_profile(&profile);

        let top = top?
            .items
            .iter()
            .map(ArtistLink::from)
            .collect::<Vec<_>>();
        let recent = recent_artists(&recent?.items);
        self.presenter.show_artist_lists(&top, &recent);

        self.presenter.show_status(&format!(
            "Logged in as {}.",
            profile.display_name.as_deref().unwrap_or("user")
        ));
        Ok(())
    }

    fn fail(&mut self, err: Error) {
        log::error!("{err}");
        self.state = match self.session.get() {
            Some(_) => AuthState::Authenticated,
            None => AuthState::Unauthenticated,
        };

        let message = match err {
            Error::Configuration(message) => message,
            other => format!("Error: {other}"),
        };
        self.presenter.show_status(&message);
    }
}
