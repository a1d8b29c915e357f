use std::fmt::Display;

use http::StatusCode;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// No shared secret was configured.
    #[error("the shared CSRF secret is missing")]
    MissingSecret,
    /// The shared secret doesn't have the expected shape.
    #[error("the shared CSRF secret is malformed: {0}")]
    MalformedSecret(String),
    /// Maps the [`hmac::digest::InvalidLength`] error.
    #[error(transparent)]
    InvalidLength(#[from] hmac::digest::InvalidLength),
    /// A value wasn't valid unpadded base64url.
    #[error(transparent)]
    Decode(#[from] base64::DecodeError),
    /// A token decoded to fewer bytes than required.
    #[error("token is too short")]
    MalformedToken,
    /// A checksum didn't decode to an HMAC-SHA256 digest.
    #[error("checksum has the wrong length")]
    MalformedChecksum,
    /// The request didn't prove it can read the token cookie.
    #[error("invalid authenticity token")]
    InvalidAuthenticity,
    /// An expected extension was missing.
    #[error("couldn't extract `{0}`. is `Csrf` enabled?")]
    ExtensionNotFound(String),
}

impl Error {
    pub(crate) fn make_layer_error<T: Default, E>(err: impl Display) -> Result<http::Response<T>, E> {
        tracing::error!(err = %err);

        let mut response = http::Response::default();
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

        Ok(response)
    }

    pub(crate) fn make_layer_rejection<T: Default, E>() -> Result<http::Response<T>, E> {
        let mut response = http::Response::default();
        *response.status_mut() = StatusCode::BAD_REQUEST;

        Ok(response)
    }
}
