use crate::{Error, Locked, Result};

/// The parts of the browser's location and history the client needs.
pub trait Navigator: Send + Sync {
    /// Query string of the current location without the leading `?`
    fn query(&self) -> Option<String>;

    /// Leave the client for `url`. Control only comes back through the redirect.
    fn navigate(&self, url: &str) -> Result<()>;

    /// Replace the current location without leaving a history entry
    fn replace(&self, path: &str) -> Result<()>;
}

/// Navigator backed by the system's default browser.
///
/// The location is whatever the host last saw arrive on the redirect uri.
#[derive(Debug)]
pub struct SystemBrowser {
    location: Locked<String>,
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self {
            location: Locked::new("/".to_string()),
        }
    }
}

impl SystemBrowser {
    /// Record a redirect back to the client, e.g. `/callback?code=...`
    pub fn arrive<S: Into<String>>(&self, path_and_query: S) {
        if let Ok(mut location) = self.location.lock() {
            *location = path_and_query.into();
        }
    }

    pub fn location(&self) -> String {
        self.location
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

impl Navigator for SystemBrowser {
    fn query(&self) -> Option<String> {
        self.location()
            .split_once('?')
            .map(|(_, query)| query.to_string())
            .filter(|query| !query.is_empty())
    }

    /// The url is always printed, so a browser that fails to open is logged rather than returned
    fn navigate(&self, url: &str) -> Result<()> {
        log::info!("Opening authorization page");
        println!("Continue the login in your browser. If it did not open, visit:\n{url}");
        if let Err(err) = open::that(url) {
            log::warn!("{}", Error::Navigation(err.to_string()));
        }
        Ok(())
    }

    fn replace(&self, path: &str) -> Result<()> {
        self.arrive(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_follows_location() {
        let browser = SystemBrowser::default();
        assert_eq!(browser.query(), None);

        browser.arrive("/callback?code=abc");
        assert_eq!(browser.query().as_deref(), Some("code=abc"));

        browser.replace("/").unwrap();
        assert_eq!(browser.location(), "/");
        assert_eq!(browser.query(), None);
    }
}
