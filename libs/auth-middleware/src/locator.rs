//! Bearer Token Discovery
//!
//! Finds the credential for a given realm among possibly repeated header
//! occurrences. The locator never verifies and never errors: absence of a
//! credential is a normal `None`, not a failure.

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName};

/// Extracts a candidate token string from request headers
///
/// ## Selection rules
///
/// - No realm configured: the first occurrence of the credential header is
///   the token, taken verbatim with no prefix stripping
/// - Realm configured (e.g. `"Bearer"`): all occurrences are scanned in
///   header order and the first whose prefix is exactly `"<realm> "`
///   (case-sensitive) wins; its suffix is the token. Occurrences carrying a
///   different realm are ignored even when present
/// - Header values that are not valid UTF-8 are skipped
#[derive(Debug, Clone)]
pub struct TokenLocator {
    header: HeaderName,
    realm: Option<String>,
}

impl TokenLocator {
    /// Locator for the `Authorization` header with no realm
    pub fn new() -> Self {
        Self {
            header: AUTHORIZATION,
            realm: None,
        }
    }

    /// Restrict the search to values prefixed with `"<realm> "`
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Search a different credential header
    pub fn header(mut self, name: HeaderName) -> Self {
        self.header = name;
        self
    }

    /// Find the credential for this locator's realm, if present
    pub fn locate(&self, headers: &HeaderMap) -> Option<String> {
        let mut values = headers
            .get_all(&self.header)
            .iter()
            .filter_map(|value| value.to_str().ok());

        match &self.realm {
            None => values.next().map(str::to_owned),
            Some(realm) => {
                let prefix = format!("{realm} ");
                values.find_map(|value| value.strip_prefix(prefix.as_str()).map(str::to_owned))
            }
        }
    }
}

impl Default for TokenLocator {
    fn default() -> Self {
        Self::new()
    }
}
