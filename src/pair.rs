use http::{header::COOKIE, HeaderMap};
use tower_cookies::cookie::Cookie;

use crate::{Checksum, SharedSecret, Token};

/// The token and checksum cookies as observed on an inbound request.
///
/// A name sent more than once (e.g. a host-only cookie next to one scoped to
/// a parent `Domain`) makes the pair ambiguous, and an ambiguous pair is
/// never valid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookiePair {
    pub token: Option<String>,
    pub checksum: Option<String>,
    ambiguous: bool,
}

/// What an inbound [`CookiePair`] turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairState {
    /// Neither cookie was sent.
    Absent,
    /// Exactly one of the two cookies was sent.
    Partial,
    /// Both cookies were sent but they don't belong together, or the token
    /// is malformed.
    Invalid,
    /// Both cookies were sent and the checksum matches the token.
    Valid(Token),
}

impl PairState {
    pub fn is_valid(&self) -> bool {
        matches!(self, PairState::Valid(_))
    }
}

impl CookiePair {
    pub fn new(token: Option<String>, checksum: Option<String>) -> Self {
        Self {
            token,
            checksum,
            ambiguous: false,
        }
    }

    /// Reads both cookies straight from the `Cookie` request headers.
    pub fn from_headers(headers: &HeaderMap, token_name: &str, checksum_name: &str) -> Self {
        let mut tokens = cookie_values(headers, token_name);
        let mut checksums = cookie_values(headers, checksum_name);

        Self {
            ambiguous: tokens.len() > 1 || checksums.len() > 1,
            token: tokens.pop(),
            checksum: checksums.pop(),
        }
    }

    /// Classifies the pair, checking the checksum in constant time.
    pub fn state(&self, secret: &SharedSecret) -> PairState {
        if self.ambiguous {
            return PairState::Invalid;
        }

        match (&self.token, &self.checksum) {
            (None, None) => PairState::Absent,
            (Some(_), None) | (None, Some(_)) => PairState::Partial,
            (Some(token), Some(checksum)) => match Token::parse(token) {
                Ok(token) if Checksum::verify(token.as_str(), checksum, secret) => {
                    PairState::Valid(token)
                }
                _ => PairState::Invalid,
            },
        }
    }
}

/// Every cookie named `name` across every `Cookie` header, in order.
pub(crate) fn cookie_values(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .filter(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
        .collect()
}
