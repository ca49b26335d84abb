use std::fmt::{Display, Formatter};

use color_eyre::{Report, Section};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Required configuration is missing or invalid. Blocks initialization.
    Configuration(String),
    /// No pkce verifier is stored for the pending login
    MissingVerifier,
    /// The token endpoint rejected the authorization code
    TokenExchangeFailed { status: u16, body: String },
    /// The api rejected the access token. The session is already cleared.
    TokenExpired,
    /// Any other failed or malformed api response
    Api { status: u16, body: String },
    Network(String),
    Storage(String),
    Navigation(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Configuration(message) => write!(f, "{message}"),
            Error::MissingVerifier => write!(f, "Missing verifier. Click login again."),
            Error::TokenExchangeFailed { status, body } => write!(f, "Token error: {status} {body}"),
            Error::TokenExpired => write!(f, "Token expired. Please log in again."),
            Error::Api { status, body } => write!(f, "{status}: {body}"),
            Error::Network(message) => write!(f, "Network error: {message}"),
            Error::Storage(message) => write!(f, "Storage error: {message}"),
            Error::Navigation(message) => write!(f, "Failed to open the browser: {message}"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Storage(value.to_string())
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(value: serde_urlencoded::ser::Error) -> Self {
        Error::Configuration(format!("Failed to encode request parameters: {value}"))
    }
}

impl From<Error> for Report {
    fn from(value: Error) -> Self {
        let message = value.to_string();
        match value {
            Error::Configuration(_) => Report::msg(message)
                .suggestion("Set STATIFY_CLIENT_ID in the environment or in a .env file"),
            Error::MissingVerifier | Error::TokenExchangeFailed { .. } => Report::msg(message)
                .suggestion("Restart the login from the beginning"),
            Error::TokenExpired => Report::msg(message)
                .suggestion("The session was cleared, log in again"),
            Error::Navigation(_) => Report::msg(message)
                .suggestion("Open the authorization url manually"),
            _ => Report::msg(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages() {
        assert_eq!(Error::MissingVerifier.to_string(), "Missing verifier. Click login again.");
        assert_eq!(Error::TokenExpired.to_string(), "Token expired. Please log in again.");
        assert_eq!(
            Error::TokenExchangeFailed { status: 400, body: "{}".into() }.to_string(),
            "Token error: 400 {}"
        );
        assert_eq!(Error::Api { status: 503, body: "busy".into() }.to_string(), "503: busy");
    }

    #[test]
    fn converts_into_report_with_message() {
        fn fails() -> color_eyre::Result<()> {
            Err(Error::MissingVerifier)?;
            Ok(())
        }
        let report = fails().unwrap_err();
        assert_eq!(report.to_string(), "Missing verifier. Click login again.");

        let report = Report::from(Error::Configuration("Missing STATIFY_CLIENT_ID in .env".into()));
        assert_eq!(report.to_string(), "Missing STATIFY_CLIENT_ID in .env");
    }
}
