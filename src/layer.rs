use std::sync::Arc;

use tower_cookies::{
    cookie::{Expiration, SameSite},
    Cookie, CookieManager,
};
use tower_layer::Layer;

use crate::{
    guard::{Guard, GuardService},
    issuance::{Issuance, IssuanceService},
    SharedSecret,
};

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) secret: SharedSecret,
    pub(crate) token_cookie_name: String,
    pub(crate) checksum_cookie_name: String,
    pub(crate) header_name: String,
    pub(crate) field_name: Option<String>,
    pub(crate) form_limit: usize,
    pub(crate) path: String,
    pub(crate) domain: Option<String>,
    pub(crate) expires: Expiration,
    pub(crate) same_site: SameSite,
    pub(crate) secure: bool,
}

impl Config {
    /// The script-readable half of a pair.
    pub(crate) fn token_cookie(&self, value: String) -> Cookie<'static> {
        self.cookie(self.token_cookie_name.clone(), value, false)
    }

    /// The `HttpOnly` half of a pair.
    pub(crate) fn checksum_cookie(&self, value: String) -> Cookie<'static> {
        self.cookie(self.checksum_cookie_name.clone(), value, true)
    }

    fn cookie(&self, name: String, value: String, http_only: bool) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .path(self.path.clone())
            .expires(self.expires)
            .http_only(http_only)
            .same_site(self.same_site)
            .secure(self.secure);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

/// Cookie-pair CSRF protection for a whole service.
///
/// Layering `Csrf` installs, from the outside in, a [`CookieManager`], the
/// [`Issuance`] interceptor and the [`Guard`] interceptor. Issuance wraps the
/// guard so every response, rejected or not, leaves with a valid pair.
#[derive(Clone, Debug)]
pub struct Csrf {
    pub(crate) config: Config,
}

impl Csrf {
    pub fn new(secret: SharedSecret) -> Self {
        Self {
            config: Config {
                secret,
                token_cookie_name: "csrf_token".into(),
                checksum_cookie_name: "csrf_checksum".into(),
                header_name: "X-CSRF-Token".into(),
                field_name: Some("authenticity_token".into()),
                form_limit: 64 * 1024,
                path: "/".into(),
                domain: None,
                expires: Expiration::Session,
                same_site: SameSite::Strict,
                secure: true,
            },
        }
    }

    pub fn token_cookie_name(mut self, token_cookie_name: impl Into<String>) -> Self {
        self.config.token_cookie_name = token_cookie_name.into();

        self
    }

    pub fn checksum_cookie_name(mut self, checksum_cookie_name: impl Into<String>) -> Self {
        self.config.checksum_cookie_name = checksum_cookie_name.into();

        self
    }

    pub fn header_name(mut self, header_name: impl Into<String>) -> Self {
        self.config.header_name = header_name.into();

        self
    }

    /// Form field consulted when the header is missing. `None` turns the
    /// fallback off for services that never accept form bodies.
    pub fn form_field(mut self, field_name: Option<impl Into<String>>) -> Self {
        self.config.field_name = field_name.map(Into::into);

        self
    }

    /// Largest form body, in bytes, buffered to look for the form field.
    pub fn form_limit(mut self, form_limit: usize) -> Self {
        self.config.form_limit = form_limit;

        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();

        self
    }

    /// Lets sibling subdomains share one pair.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.config.domain = Some(domain.into());

        self
    }

    pub fn expires(mut self, expires: Expiration) -> Self {
        self.config.expires = expires;

        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.config.same_site = same_site;

        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;

        self
    }

    /// Only the issuance half. Needs a [`CookieManager`] further out.
    pub fn issuance(&self) -> Issuance {
        Issuance::new(Arc::new(self.config.clone()))
    }

    /// Only the authenticity half.
    pub fn guard(&self) -> Guard {
        Guard::new(Arc::new(self.config.clone()))
    }
}

impl<S> Layer<S> for Csrf {
    type Service = CookieManager<IssuanceService<GuardService<S>>>;

    fn layer(&self, inner: S) -> Self::Service {
        let config = Arc::new(self.config.clone());

        CookieManager::new(IssuanceService::new(
            config.clone(),
            GuardService::new(config, inner),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csrf() -> Csrf {
        Csrf::new(SharedSecret::new("much secure").expect("secret"))
    }

    #[test]
    fn cookie_flags() {
        let config = csrf().config;

        let token = config.token_cookie("t".into());
        assert_eq!(token.name(), "csrf_token");
        assert_eq!(token.path(), Some("/"));
        assert_eq!(token.http_only(), Some(false));
        assert_eq!(token.secure(), Some(true));
        assert_eq!(token.same_site(), Some(SameSite::Strict));

        let checksum = config.checksum_cookie("c".into());
        assert_eq!(checksum.name(), "csrf_checksum");
        assert_eq!(checksum.path(), Some("/"));
        assert_eq!(checksum.http_only(), Some(true));
        assert_eq!(checksum.secure(), Some(true));
        assert_eq!(checksum.same_site(), Some(SameSite::Strict));
    }

    #[test]
    fn builder_overrides() {
        let config = csrf()
            .token_cookie_name("xt")
            .checksum_cookie_name("xc")
            .header_name("X-Token")
            .form_field(None::<String>)
            .domain("example.com")
            .secure(false)
            .same_site(SameSite::Lax)
            .config;

        assert_eq!(config.header_name, "X-Token");
        assert_eq!(config.field_name, None);

        let cookie = config.checksum_cookie("c".into());
        assert_eq!(cookie.name(), "xc");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(config.token_cookie("t".into()).name(), "xt");
    }
}
