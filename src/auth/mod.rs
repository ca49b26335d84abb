use std::fmt::Debug;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::browser::Navigator;
use crate::pkce::{self, VERIFIER_LENGTH};
use crate::storage::VerifierStore;
use crate::{Config, Error, Result, Shared};

pub mod callback;

pub use callback::Listener;

/// Opaque bearer credential issued by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn to_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Both legs of the authorization code flow with pkce.
#[derive(Clone)]
pub struct OAuth {
    client_id: String,
    redirect: String,
    scopes: Vec<String>,
    authorize_url: String,
    token_url: String,
    client: reqwest::Client,
    verifier: VerifierStore,
    navigator: Shared<dyn Navigator>,
}

impl OAuth {
    pub fn new(
        config: &Config,
        client: reqwest::Client,
        verifier: VerifierStore,
        navigator: Shared<dyn Navigator>,
    ) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(Error::Configuration("The client id must not be empty".into()));
        }

        Ok(Self {
            client_id: config.client_id.clone(),
            redirect: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            client,
            verifier,
            navigator,
        })
    }

    /// Authorization request for the given code challenge
    pub fn authorization_url(&self, challenge: &str) -> Result<String> {
        Ok(format!(
            "{}?{}",
            self.authorize_url,
            serde_urlencoded::to_string([
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect.as_str()),
                ("scope", self.scopes.join(" ").as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", challenge),
            ])?
        ))
    }

    /// Start a login: store a fresh verifier and send the browser to the provider.
    ///
    /// Any verifier from an earlier attempt is replaced.
    pub fn begin(&self) -> Result<()> {
        let verifier = pkce::random_string(VERIFIER_LENGTH);
        self.verifier.save(&verifier)?;

        let url = self.authorization_url(&pkce::challenge(&verifier))?;
        log::debug!("Redirecting to {}", self.authorize_url);
        self.navigator.navigate(&url)
    }

    /// Trade a single use authorization code and the stored verifier for an access token.
    ///
    /// Neither stores the token nor clears the verifier. A failed exchange is never retried since
    /// the code is already spent.
    pub async fn exchange(&self, code: &str) -> Result<AccessToken> {
        let verifier = self.verifier.load().ok_or(Error::MissingVerifier)?;

        let body = serde_urlencoded::to_string([
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect.as_str()),
            ("code_verifier", verifier.as_str()),
        ])?;

        let response = self
            .client
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            log::warn!("Token exchange failed [{status}] {}", body.replace('\n', ""));
            return Err(Error::TokenExchangeFailed { status, body });
        }

        match serde_json::from_str::<TokenResponse>(&body) {
            Ok(TokenResponse { access_token }) => {
                log::info!("Access token acquired");
                Ok(AccessToken::new(access_token))
            }
            Err(err) => {
                log::warn!("Token response without an access token: {err}");
                Err(Error::TokenExchangeFailed { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use crate::Locked;

    #[derive(Default)]
    struct Recorder {
        visited: Locked<Vec<String>>,
    }

    impl Navigator for Recorder {
        fn query(&self) -> Option<String> {
            None
        }

        fn navigate(&self, url: &str) -> Result<()> {
            self.visited.lock().unwrap().push(url.to_string());
            Ok(())
        }

        fn replace(&self, _path: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        oauth: OAuth,
        local: Shared<MemoryStorage>,
        navigator: Shared<Recorder>,
    }

    fn fixture(token_url: &str) -> Fixture {
        let mut config = Config::new("abc123");
        config.token_url = token_url.to_string();

        let local = Shared::new(MemoryStorage::default());
        let navigator = Shared::new(Recorder::default());
        let oauth = OAuth::new(
            &config,
            reqwest::Client::builder().no_proxy().build().unwrap(),
            VerifierStore::new(local.clone()),
            navigator.clone(),
        )
        .unwrap();

        Fixture { oauth, local, navigator }
    }

    fn query(url: &str) -> HashMap<String, String> {
        let (_, query) = url.split_once('?').unwrap();
        serde_urlencoded::from_str(query).unwrap()
    }

    #[test]
    fn empty_client_id_is_rejected() {
        let result = OAuth::new(
            &Config::new(""),
            reqwest::Client::new(),
            VerifierStore::new(Shared::new(MemoryStorage::default())),
            Shared::new(Recorder::default()),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn authorization_url_has_required_parameters() {
        let Fixture { oauth, .. } = fixture("http://unused");
        let url = oauth.authorization_url("challenge").unwrap();
        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));

        let params = query(&url);
        assert_eq!(params.len(), 6);
        assert_eq!(params["client_id"], "abc123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:5173/callback");
        assert_eq!(
            params["scope"],
            "user-read-private user-read-email user-top-read user-read-recently-played"
        );
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["code_challenge"], "challenge");
    }

    #[test]
    fn begin_persists_verifier_and_navigates_with_its_challenge() {
        let Fixture { oauth, local, navigator } = fixture("http://unused");
        oauth.begin().unwrap();

        let verifier = local.get(VerifierStore::KEY).unwrap();
        assert_eq!(verifier.len(), VERIFIER_LENGTH);

        let visited = navigator.visited.lock().unwrap().clone();
        assert_eq!(visited.len(), 1);
        assert_eq!(query(&visited[0])["code_challenge"], pkce::challenge(&verifier));

        // A second attempt replaces the verifier
        oauth.begin().unwrap();
        assert_ne!(local.get(VerifierStore::KEY).unwrap(), verifier);
    }

    #[tokio::test]
    async fn exchange_without_verifier_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let Fixture { oauth, .. } = fixture(&format!("{}/api/token", server.uri()));
        assert_eq!(oauth.exchange("code").await, Err(Error::MissingVerifier));
    }

    #[tokio::test]
    async fn exchange_sends_the_stored_verifier() {
        let server = MockServer::start().await;
        let Fixture { oauth, local, .. } = fixture(&format!("{}/api/token", server.uri()));
        oauth.begin().unwrap();
        let verifier = local.get(VerifierStore::KEY).unwrap();

        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("client_id=abc123"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5173%2Fcallback"))
            .and(body_string_contains(format!("code_verifier={verifier}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "BQD-token",
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = oauth.exchange("the-code").await.unwrap();
        assert_eq!(token.secret(), "BQD-token");
        // The exchanger leaves the verifier to its caller
        assert_eq!(local.get(VerifierStore::KEY), Some(verifier));
    }

    #[tokio::test]
    async fn rejected_exchange_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let Fixture { oauth, .. } = fixture(&format!("{}/api/token", server.uri()));
        oauth.begin().unwrap();

        assert_eq!(
            oauth.exchange("spent").await,
            Err(Error::TokenExchangeFailed {
                status: 400,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn success_without_access_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let Fixture { oauth, .. } = fixture(&format!("{}/api/token", server.uri()));
        oauth.begin().unwrap();

        assert_eq!(
            oauth.exchange("code").await,
            Err(Error::TokenExchangeFailed { status: 200, body: "{}".to_string() })
        );
    }
}
