use std::fmt;

use rand::RngCore;

use super::EncodeError;

const RANDOM_BYTES: usize = 30;
const MAX_LEN: usize = 70;

/// A multipart delimiter token (RFC 2046 `boundary` parameter).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generates a fresh token: 30 random bytes, hex encoded.
    pub fn random() -> Boundary {
        let mut raw = [0u8; RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        Boundary(hex::encode(raw))
    }

    /// Validates a caller-supplied token.
    ///
    /// Accepts 1 to 70 characters from the RFC 2046 `bchars` set; the last
    /// character must not be a space.
    pub fn parse<S: Into<String>>(token: S) -> Result<Boundary, EncodeError> {
        let token = token.into();
        let valid = !token.is_empty()
            && token.len() <= MAX_LEN
            && !token.ends_with(' ')
            && token.bytes().all(is_bchar);
        if !valid {
            return Err(EncodeError::InvalidBoundary(token));
        }
        Ok(Boundary(token))
    }

    /// Wraps `token` without validation.
    #[cfg(test)]
    pub(crate) fn unchecked(token: &str) -> Boundary {
        Boundary(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_bchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
        )
}
