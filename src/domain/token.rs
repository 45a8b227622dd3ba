use std::fmt::{self, Display};

use rand::Rng;
use thiserror::Error;

/// Capability guarding the current cover image.
///
/// A fresh token is minted every time the cached image is replaced; the
/// previous token stops matching the instant the new one is committed. Tokens
/// are addressed as 32 lower-case hex digits in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessToken(u128);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid access token")]
pub struct InvalidToken;

impl AccessToken {
    pub fn mint() -> Self {
        Self(rand::rng().random())
    }

    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, InvalidToken> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidToken);
        }
        u128::from_str_radix(s, 16).map(Self).map_err(|_| InvalidToken)
    }
}

impl Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
