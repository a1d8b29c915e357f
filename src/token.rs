use std::{fmt, sync::Arc};

use rand::{rngs::OsRng, RngCore};

use crate::{codec, Error};

/// Number of random bytes in a freshly generated token.
pub const TOKEN_BYTES: usize = 24;

/// Tokens minted elsewhere are accepted down to this many bytes of entropy.
pub const MIN_TOKEN_BYTES: usize = 16;

/// The value stored in the script-readable token cookie.
///
/// A `Token` is placed in the request extensions by the issuance layer and
/// always refers to the token of a valid pair: either the one the browser
/// sent, or the one being issued on this response. Handlers use it to embed
/// the token in rendered forms.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(Arc<str>);

impl Token {
    /// Generates a new token from the operating system's entropy source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self(codec::encode(bytes).into())
    }

    /// Accepts a token in its wire form, provided it decodes to enough bytes.
    pub fn parse(value: &str) -> Result<Self, Error> {
        if codec::decode(value)?.len() < MIN_TOKEN_BYTES {
            return Err(Error::MalformedToken);
        }

        Ok(Self(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&&*self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_32_character_tokens() {
        let token = Token::generate();

        assert_eq!(token.as_str().len(), 32);
        assert_eq!(codec::decode(token.as_str()).map(|b| b.len()), Ok(TOKEN_BYTES));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(Token::generate(), Token::generate());
    }

    #[test]
    fn parses_wire_tokens() {
        let token = Token::generate();

        assert_eq!(Token::parse(token.as_str()), Ok(token));
        assert_eq!(
            Token::parse(&codec::encode([7u8; MIN_TOKEN_BYTES])).map(|t| t.to_string()),
            Ok(codec::encode([7u8; MIN_TOKEN_BYTES]))
        );
    }

    #[test]
    fn rejects_short_or_garbled_tokens() {
        assert_eq!(
            Token::parse(&codec::encode([7u8; MIN_TOKEN_BYTES - 1])),
            Err(Error::MalformedToken)
        );
        assert_eq!(Token::parse(""), Err(Error::MalformedToken));
        assert!(matches!(Token::parse("oh howdy doody"), Err(Error::Decode(_))));
    }
}
