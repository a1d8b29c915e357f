use std::fmt;

use hmac::Mac;
use subtle::ConstantTimeEq;

use crate::{codec, Error, SharedSecret};

/// Length of an HMAC-SHA256 digest.
pub const CHECKSUM_BYTES: usize = 32;

/// HMAC-SHA256 of a token's wire form, stored in the script-inaccessible
/// checksum cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct Checksum(String);

impl Checksum {
    /// Computes the checksum of `token` exactly as it travels over the wire.
    ///
    /// ```
    /// use tower_csrf_pair::{Checksum, SharedSecret};
    ///
    /// let secret = SharedSecret::new("much secure").unwrap();
    /// let checksum = Checksum::compute("such protect", &secret);
    ///
    /// assert_eq!(checksum.as_str(), "fEFyEXot47K5knjFe7MB-CKW4q99a7BmP9rKwrxf9Qk");
    /// ```
    pub fn compute(token: &str, secret: &SharedSecret) -> Self {
        Self(codec::encode(digest(token, secret)))
    }

    /// Accepts a checksum in its wire form if it decodes to a full digest.
    pub fn parse(value: &str) -> Result<Self, Error> {
        decode_digest(value)?;

        Ok(Self(value.to_owned()))
    }

    /// Checks `checksum` against `token` without leaking where they differ.
    ///
    /// A checksum that isn't 32 bytes of unpadded base64url never verifies.
    pub fn verify(token: &str, checksum: &str, secret: &SharedSecret) -> bool {
        let Ok(presented) = decode_digest(checksum) else {
            return false;
        };

        constant_time_eq(&digest(token, secret), &presented)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Checksum").field(&self.0).finish()
    }
}

/// Equality whose running time depends only on the operand lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn decode_digest(value: &str) -> Result<Vec<u8>, Error> {
    let bytes = codec::decode(value)?;
    if bytes.len() != CHECKSUM_BYTES {
        return Err(Error::MalformedChecksum);
    }

    Ok(bytes)
}

fn digest(token: &str, secret: &SharedSecret) -> Vec<u8> {
    let mut mac = secret.mac();
    mac.update(token.as_bytes());

    mac.finalize().into_bytes().to_vec()
}
