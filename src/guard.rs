use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{header::CONTENT_TYPE, HeaderMap, Method, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Limited};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower_layer::Layer;
use tower_service::Service;

use crate::{layer::Config, pair::cookie_values, BoxError, Checksum, Error, SharedSecret, Token};

/// Methods that never need an authenticity proof.
pub fn is_safe_method(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE].contains(method)
}

/// Rejects state-changing requests that can't show the token belonging to
/// their checksum cookie.
///
/// The guard never writes cookies. A rejection is a bare `400 Bad Request`;
/// the [`Issuance`](crate::Issuance) layer wrapped around it attaches a fresh
/// pair to that response.
#[derive(Clone)]
pub struct Guard {
    config: Arc<Config>,
}

impl Guard {
    pub(crate) fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for Guard {
    type Service = GuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardService::new(self.config.clone(), inner)
    }
}

#[derive(Clone)]
pub struct GuardService<S> {
    config: Arc<Config>,
    inner: S,
}

impl<S> GuardService<S> {
    pub(crate) fn new(config: Arc<Config>, inner: S) -> Self {
        Self { config, inner }
    }
}

/// Succeeds when `presented` is a well-formed token whose checksum under
/// `secret` is among `checksums`.
///
/// Every checksum cookie sent is tried, so a stale duplicate left behind under
/// another `Domain` can't lock out a request carrying the current pair.
pub fn authenticate(
    secret: &SharedSecret,
    presented: Option<&str>,
    checksums: &[&str],
) -> Result<(), Error> {
    let Some(presented) = presented.filter(|value| !value.is_empty()) else {
        tracing::warn!(reason = "missing token", "CSRF authenticity check failed");
        return Err(Error::InvalidAuthenticity);
    };

    if checksums.iter().all(|value| value.is_empty()) {
        tracing::warn!(reason = "missing checksum cookie", "CSRF authenticity check failed");
        return Err(Error::InvalidAuthenticity);
    }

    // No short-circuit: every cookie is checked whichever one matches.
    let verified = checksums.iter().fold(false, |found, checksum| {
        Checksum::verify(presented, checksum, secret) | found
    });

    if Token::parse(presented).is_err() || !verified {
        tracing::warn!(reason = "checksum mismatch", "CSRF authenticity check failed");
        return Err(Error::InvalidAuthenticity);
    }

    Ok(())
}

impl<S, Q, R> Service<Request<Q>> for GuardService<S>
where
    S: Service<Request<Q>, Response = Response<R>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Q: Body + From<Bytes> + Send + 'static,
    Q::Data: Send,
    Q::Error: Into<BoxError>,
    R: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Q>) -> Self::Future {
        if is_safe_method(request.method()) {
            return Box::pin(self.inner.call(request));
        }

        let config = self.config.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (request, presented) = presented_token(&config, request).await;
            let checksums = cookie_values(request.headers(), &config.checksum_cookie_name);
            let checksums: Vec<&str> = checksums.iter().map(String::as_str).collect();

            match authenticate(&config.secret, presented.as_deref(), &checksums) {
                Ok(()) => inner.call(request).await,
                Err(_) => Error::make_layer_rejection(),
            }
        })
    }
}

/// Header first, then the form field. The body is handed back intact.
async fn presented_token<Q>(config: &Config, request: Request<Q>) -> (Request<Q>, Option<String>)
where
    Q: Body + From<Bytes>,
    Q::Error: Into<BoxError>,
{
    let header = request
        .headers()
        .get(&config.header_name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    if header.is_some() {
        return (request, header);
    }

    let Some(field_name) = &config.field_name else {
        return (request, None);
    };

    if !is_form(request.headers()) {
        return (request, None);
    }

    let (parts, body) = request.into_parts();
    let bytes = match Limited::new(body, config.form_limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(err = %err, "couldn't buffer form body");
            return (Request::from_parts(parts, Q::from(Bytes::new())), None);
        }
    };

    let field = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .ok()
        .and_then(|fields| {
            fields
                .into_iter()
                .find(|(name, _)| name == field_name)
                .map(|(_, value)| value)
        });

    (Request::from_parts(parts, Q::from(bytes)), field)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}
