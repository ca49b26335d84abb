use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub static DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5173/callback";
pub static AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub static TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub static API_BASE_URL: &str = "https://api.spotify.com/v1";

static MISSING_CLIENT_ID: &str = "Missing STATIFY_CLIENT_ID in .env";

pub mod scopes {
    pub static USER_READ_PRIVATE: &str = "user-read-private";
    pub static USER_READ_EMAIL: &str = "user-read-email";
    pub static USER_TOP_READ: &str = "user-top-read";
    pub static USER_READ_RECENTLY_PLAYED: &str = "user-read-recently-played";

    pub fn defaults() -> Vec<String> {
        [USER_READ_PRIVATE, USER_READ_EMAIL, USER_TOP_READ, USER_READ_RECENTLY_PLAYED]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub client_id: String,
}

impl Credentials {
    /// Read `STATIFY_CLIENT_ID` from the environment, loading a `.env` file first if present
    pub fn from_env() -> Option<Self> {
        if let Err(err) = dotenvy::dotenv() {
            log::debug!("No .env file loaded: {err}");
        }
        envy::prefixed("STATIFY_").from_env::<Self>().ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub client_id: String,
    /// Must match the redirect uri registered with the provider exactly
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    /// Base URL while making spotify requests
    pub api_url: String,
}

/// Optional overrides read from a yaml config file. The client id is never read from here.
#[derive(Default, Debug, Deserialize, Serialize)]
pub struct ConfigBuilder {
    redirect_uri: Option<String>,
    scopes: Option<Vec<String>>,
    authorize_url: Option<String>,
    token_url: Option<String>,
    api_url: Option<String>,
    #[serde(skip)]
    client_id: Option<String>,
}

impl Config {
    /// Configuration with the spotify endpoints and default scopes
    pub fn new<S: Into<String>>(client_id: S) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: scopes::defaults(),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_url: API_BASE_URL.to_string(),
        }
    }

    /// Start from the first of `paths` that exists, or from defaults when none do
    pub fn load_with_fallback<P: AsRef<Path>, I: IntoIterator<Item = P>>(paths: I) -> Result<ConfigBuilder> {
        let file = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .find(|p| p.exists());

        match file {
            None => Ok(ConfigBuilder::default()),
            Some(path) => ConfigBuilder::from_file(&path),
        }
    }
}

impl ConfigBuilder {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("Failed to read {}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Invalid config {}: {e}", path.display())))
    }

    pub fn client_id<S: Into<String>>(mut self, client_id: Option<S>) -> Self {
        self.client_id = client_id.map(Into::into);
        self
    }

    pub fn compile(self) -> Result<Config> {
        let client_id = self
            .client_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Configuration(MISSING_CLIENT_ID.to_string()))?;

        let mut config = Config::new(client_id);
        if let Some(redirect_uri) = self.redirect_uri {
            config.redirect_uri = redirect_uri;
        }
        if let Some(scopes) = self.scopes {
            config.scopes = scopes;
        }
        if let Some(authorize_url) = self.authorize_url {
            config.authorize_url = authorize_url;
        }
        if let Some(token_url) = self.token_url {
            config.token_url = token_url;
        }
        if let Some(api_url) = self.api_url {
            config.api_url = api_url.trim_end_matches('/').to_string();
        }

        config
            .redirect_uri
            .parse::<hyper::Uri>()
            .map_err(|e| Error::Configuration(format!("Invalid redirect uri `{}`: {e}", config.redirect_uri)))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_client_id_blocks_startup() {
        let err = ConfigBuilder::default().client_id(None::<String>).compile().unwrap_err();
        assert_eq!(err, Error::Configuration(MISSING_CLIENT_ID.to_string()));

        let err = ConfigBuilder::default().client_id(Some("  ")).compile().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn defaults_when_no_file_exists() {
        let config = Config::load_with_fallback(["does-not-exist.yml"])
            .unwrap()
            .client_id(Some("abc123"))
            .compile()
            .unwrap();
        assert_eq!(config, Config::new("abc123"));
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.scopes.join(" "), "user-read-private user-read-email user-top-read user-read-recently-played");
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "redirect_uri: http://localhost:8888/callback\nscopes: [user-top-read]\napi_url: http://localhost:9000/v1/\n",
        )
        .unwrap();

        let config = Config::load_with_fallback([dir.path().join("missing.yml"), path])
            .unwrap()
            .client_id(Some("abc123"))
            .compile()
            .unwrap();
        assert_eq!(config.redirect_uri, "http://localhost:8888/callback");
        assert_eq!(config.scopes, vec!["user-top-read".to_string()]);
        assert_eq!(config.api_url, "http://localhost:9000/v1");
        assert_eq!(config.token_url, TOKEN_URL);
    }

    #[test]
    fn invalid_yaml_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "scopes: {").unwrap();
        assert!(matches!(
            Config::load_with_fallback([path]),
            Err(Error::Configuration(_))
        ));
    }
}
