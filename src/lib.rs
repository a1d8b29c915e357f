//! ## Overview
//!
//! Cross-application CSRF protection for services that share one frontend.
//!
//! Instead of a token bound to a server-side session, the proof lives in two
//! browser cookies that any backend holding the same secret can mint and any
//! backend can verify. No session store is shared between services.
//!
//! ### How it works
//!
//! - **Shared secret**: every cooperating backend is given the same secret
//!   (32 random bytes, delivered as 64 hex characters). The hex text itself
//!   is the HMAC key.
//! - **Token**: 24 bytes from the operating system's CSPRNG, encoded as
//!   unpadded base64url (32 characters) and stored in the script-readable
//!   `csrf_token` cookie.
//! - **Checksum**: HMAC-SHA256 of the token's wire form under the secret,
//!   unpadded base64url, stored in the `HttpOnly` `csrf_checksum` cookie.
//! - **Issuance**: on every response, if the inbound pair is absent, partial
//!   or doesn't verify, a new pair is set. This also happens on rejections and
//!   on inner service errors, which is what makes the protocol self-healing.
//! - **Guard**: every request that isn't `GET`, `HEAD`, `OPTIONS` or `TRACE`
//!   must present the token in the `X-CSRF-Token` header (or the
//!   `authenticity_token` field of a urlencoded form). It is checked against
//!   the checksum cookie in constant time, and a mismatch is a
//!   `400 Bad Request`.
//! - **Frontend**: before each state-changing request the client re-reads the
//!   token cookie and copies it into the header, omitting the header when the
//!   cookie is missing. [`Prefilter`] does this for Rust clients.
//!
//! Every freshly issued token is logged at `INFO` as `Set CSRF token: <token>`
//! so issuance can be correlated across services.
//!
//! ### Cookies
//!
//! Both cookies are set together with `Path=/`, `SameSite=Strict` and
//! `Secure`. Only the checksum cookie is `HttpOnly`.
//!
//! ## Usage
//!
//! ### With [`axum`][crate-axum]
//!
//! ```rust, no_run
//! use std::net::SocketAddr;
//!
//! use axum::{routing::{get, post}, Router};
//! use tower_csrf_pair::{Csrf, SharedSecret, Token};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret = SharedSecret::from_env("CSRF_SECRET").expect("CSRF_SECRET must be set");
//!
//!     let app = Router::new()
//!         .route("/", get(form))
//!         .route("/submit", post(|| async { "Saved!" }))
//!         .layer(Csrf::new(secret).secure(false));
//!
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
//!     let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
//!
//!     axum::serve(listener, app.into_make_service())
//!         .await
//!         .unwrap();
//! }
//!
//! async fn form(token: Token) -> String {
//!     format!(r#"<form method="post" action="/submit">
//!         <input type="hidden" name="authenticity_token" value="{token}">
//!     </form>"#)
//! }
//! ```
//!
//! [crate-axum]: https://github.com/tokio-rs/axum

use hmac::Hmac;
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;
pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use checksum::{constant_time_eq, Checksum};
pub use error::Error;
pub use guard::{authenticate, is_safe_method, Guard, GuardService};
pub use issuance::{Issuance, IssuanceService};
pub use layer::Csrf;
pub use pair::{CookiePair, PairState};
pub use prefilter::Prefilter;
pub use secret::SharedSecret;
pub use token::{Token, MIN_TOKEN_BYTES, TOKEN_BYTES};

pub mod codec;

mod checksum;
mod error;
mod guard;
mod issuance;
mod layer;
mod pair;
mod prefilter;
mod secret;
mod token;

#[cfg(feature = "axum")]
mod extract;
