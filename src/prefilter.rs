use http::{HeaderName, HeaderValue, Request};
use tower_cookies::cookie::CookieJar;

use crate::guard::is_safe_method;

/// The client half of the protocol, for Rust callers of a protected service.
///
/// Before every state-changing request the token cookie is read from the
/// live jar and copied verbatim into the token header. Nothing is cached
/// between calls, so a pair reissued by any backend is picked up by the very
/// next request.
#[derive(Clone, Debug)]
pub struct Prefilter {
    cookie_name: String,
    header_name: HeaderName,
}

impl Default for Prefilter {
    fn default() -> Self {
        Self::new("csrf_token", HeaderName::from_static("x-csrf-token"))
    }
}

impl Prefilter {
    pub fn new(cookie_name: impl Into<String>, header_name: HeaderName) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            header_name,
        }
    }

    /// Sets or clears the token header on `request` from `jar`.
    ///
    /// An absent or empty cookie removes the header instead of sending it
    /// empty.
    pub fn apply<B>(&self, jar: &CookieJar, request: &mut Request<B>) {
        if is_safe_method(request.method()) {
            return;
        }

        let value = jar
            .get(&self.cookie_name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .and_then(|value| HeaderValue::from_str(value).ok());

        match value {
            Some(value) => {
                request.headers_mut().insert(self.header_name.clone(), value);
            }
            None => {
                request.headers_mut().remove(&self.header_name);
            }
        }
    }
}
