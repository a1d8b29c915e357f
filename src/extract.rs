use async_trait::async_trait;
use axum_core::{
    extract::FromRequestParts,
    response::{IntoResponse, Response},
};
use http::{request::Parts, StatusCode};

use crate::{Error, Token};

/// The token of the pair travelling with this response, for embedding in
/// forms or handing to a script.
#[async_trait]
impl<S> FromRequestParts<S> for Token
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Token>()
            .cloned()
            .ok_or(Error::ExtensionNotFound("Token".into()))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            // No detail for the caller: the next attempt carries a fresh pair.
            Error::InvalidAuthenticity
            | Error::MalformedToken
            | Error::MalformedChecksum
            | Error::Decode(_) => {
                StatusCode::BAD_REQUEST.into_response()
            }
            err => {
                tracing::error!(err = %err);

                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}
