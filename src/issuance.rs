use futures_util::future::BoxFuture;
use http::{HeaderMap, Request, Response};
use std::{
    fmt::Display,
    sync::Arc,
    task::{Context, Poll},
};
use tower_cookies::Cookies;
use tower_layer::Layer;
use tower_service::Service;

use crate::{layer::Config, pair::CookiePair, Checksum, Error, PairState, Token};

/// Keeps a valid pair on every response.
///
/// Never judges a request. When the inbound pair is absent, partial or
/// invalid a new token and checksum are set together; otherwise the cookies
/// are left alone. Either way the valid [`Token`] is put into the request
/// extensions for the handler.
///
/// An error from the inner service is logged through its `Display` text and
/// replaced with an empty `500 Internal Server Error` so the pair still goes
/// out. Services with their own error type lose their error mapping here;
/// map errors to responses inside this layer to keep it.
#[derive(Clone)]
pub struct Issuance {
    config: Arc<Config>,
}

impl Issuance {
    pub(crate) fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for Issuance {
    type Service = IssuanceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IssuanceService::new(self.config.clone(), inner)
    }
}

#[derive(Clone)]
pub struct IssuanceService<S> {
    config: Arc<Config>,
    inner: S,
}

impl<S> IssuanceService<S> {
    pub(crate) fn new(config: Arc<Config>, inner: S) -> Self {
        Self { config, inner }
    }

    /// Reads the inbound pair from the raw `Cookie` headers, the same source
    /// the guard uses, and writes any replacement through the jar.
    fn ensure_pair(&self, headers: &HeaderMap, cookies: &Cookies) -> Token {
        let config = &self.config;
        let pair = CookiePair::from_headers(
            headers,
            &config.token_cookie_name,
            &config.checksum_cookie_name,
        );

        match pair.state(&config.secret) {
            PairState::Valid(token) => token,
            state => {
                tracing::debug!(?state, "replacing CSRF cookie pair");

                let token = Token::generate();
                let checksum = Checksum::compute(token.as_str(), &config.secret);

                cookies.add(config.token_cookie(token.to_string()));
                cookies.add(config.checksum_cookie(checksum.to_string()));

                tracing::info!("Set CSRF token: {}", token);

                token
            }
        }
    }
}

impl<S, Q, R> Service<Request<Q>> for IssuanceService<S>
where
    S: Service<Request<Q>, Response = Response<R>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Display,
    Q: Send + 'static,
    R: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Q>) -> Self::Future {
        let cookies = match request
            .extensions()
            .get::<Cookies>()
            .cloned()
            .ok_or(Error::ExtensionNotFound("Cookies".into()))
        {
            Ok(cookies) => cookies,
            Err(err) => return Box::pin(async move { Error::make_layer_error(err) }),
        };

        let token = self.ensure_pair(request.headers(), &cookies);
        request.extensions_mut().insert(token);

        let future = self.inner.call(request);

        // Cookies are already in the jar, so an error response still
        // carries the pair once it's turned into a 500.
        Box::pin(async move {
            match future.await {
                Ok(response) => Ok(response),
                Err(err) => Error::make_layer_error(err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http::{header::SET_COOKIE, StatusCode};
    use tower::{service_fn, ServiceExt};
    use tower_cookies::CookieManager;

    use super::*;
    use crate::{Csrf, SharedSecret};

    fn csrf() -> Csrf {
        Csrf::new(SharedSecret::new("much secure").expect("secret"))
    }

    fn set_cookies(response: &Response<String>) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn exposes_issued_token_to_handler() {
        let service = CookieManager::new(csrf().issuance().layer(service_fn(
            |request: Request<()>| async move {
                let token = request.extensions().get::<Token>().cloned();
                Ok::<_, Infallible>(Response::new(token.map(|t| t.to_string()).unwrap_or_default()))
            },
        )));

        let response = service.oneshot(Request::new(())).await.expect("response");
        let cookies = set_cookies(&response);

        assert_eq!(cookies.len(), 2);
        assert!(cookies
            .iter()
            .any(|c| c.starts_with(&format!("csrf_token={};", response.body()))));
    }

    #[tokio::test]
    async fn inner_error_still_issues_pair() {
        let service = CookieManager::new(csrf().issuance().layer(service_fn(
            |_: Request<()>| async { Err::<Response<String>, _>("handler blew up") },
        )));

        let response = service.oneshot(Request::new(())).await.expect("response");
        let cookies = set_cookies(&response);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
        assert!(cookies.iter().any(|c| c.starts_with("csrf_token=")));
        assert!(cookies.iter().any(|c| c.starts_with("csrf_checksum=")));
    }

    #[tokio::test]
    async fn missing_cookie_manager_is_an_internal_error() {
        let service = csrf().issuance().layer(service_fn(|_: Request<()>| async {
            Ok::<_, Infallible>(Response::new(String::new()))
        }));

        let response = service.oneshot(Request::new(())).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
