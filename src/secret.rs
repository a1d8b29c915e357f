use std::fmt;

use hmac::Mac;
use rand::{rngs::OsRng, RngCore};

use crate::{Error, HmacSha256};

/// Bytes of randomness behind a deployment secret.
pub const SECRET_BYTES: usize = 32;

/// The key shared by every backend that issues or verifies pairs.
///
/// The HMAC key is the delivered text itself, byte for byte. A hex secret is
/// *not* decoded before use, so every cooperating backend must key its HMAC
/// with the 64 ASCII characters it was given.
#[derive(Clone)]
pub struct SharedSecret {
    mac: HmacSha256,
}

impl SharedSecret {
    /// Uses `key` verbatim as HMAC key material.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, Error> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(Error::MissingSecret);
        }

        Ok(Self {
            mac: HmacSha256::new_from_slice(key)?,
        })
    }

    /// Accepts the deployment shape: 32 random bytes as 64 hex characters.
    pub fn from_hex(secret: &str) -> Result<Self, Error> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(Error::MissingSecret);
        }

        let decoded = hex::decode(secret).map_err(|err| Error::MalformedSecret(err.to_string()))?;
        if decoded.len() != SECRET_BYTES {
            return Err(Error::MalformedSecret(format!(
                "expected {} hex characters, got {}",
                SECRET_BYTES * 2,
                secret.len()
            )));
        }

        Self::new(secret)
    }

    /// Reads a hex secret from the environment variable `name`.
    pub fn from_env(name: &str) -> Result<Self, Error> {
        let secret = std::env::var(name).map_err(|_| Error::MissingSecret)?;

        Self::from_hex(&secret)
    }

    /// Generates a new secret in its delivered (hex) form.
    pub fn generate() -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);

        hex::encode(bytes)
    }

    pub(crate) fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}
