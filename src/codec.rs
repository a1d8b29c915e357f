//! Unpadded URL-safe base64 ([RFC 4648 §5]) used for every value that ends
//! up in a cookie or header.
//!
//! [RFC 4648 §5]: https://www.rfc-editor.org/rfc/rfc4648#section-5

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::Error;

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Padding and non-canonical trailing bits are rejected.
pub fn decode(value: &str) -> Result<Vec<u8>, Error> {
    Ok(URL_SAFE_NO_PAD.decode(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_padding() {
        assert_eq!(encode([0xff]), "_w");
        assert_eq!(encode([0xfb, 0xef]), "--8");
        assert_eq!(encode(b"much secure"), "bXVjaCBzZWN1cmU");
    }

    #[test]
    fn round_trips_token_and_digest_lengths() {
        for len in [0usize, 1, 2, 16, 24, 32] {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
            let encoded = encode(&bytes);

            assert!(!encoded.contains('='));
            assert!(encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert_eq!(decode(&encoded), Ok(bytes));
        }
    }

    #[test]
    fn rejects_padding_and_foreign_alphabet() {
        assert!(matches!(decode("_w=="), Err(Error::Decode(_))));
        assert!(matches!(decode("/w"), Err(Error::Decode(_))));
        assert!(matches!(decode("such protect"), Err(Error::Decode(_))));
    }

    #[test]
    fn rejects_impossible_length() {
        assert!(matches!(decode("a"), Err(Error::Decode(_))));
        assert!(matches!(decode("abcde"), Err(Error::Decode(_))));
    }
}
