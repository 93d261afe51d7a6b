//! Caller identity resolution and group assignment.
//!
//! A caller presents `Authorization: <scheme> USER<ddd>`. Only the token
//! after the first space is read; the scheme itself is ignored.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::error::AuthFailure;

lazy_static! {
    // ASCII digits only, `\d` would also accept other Unicode decimal digits
    static ref TOKEN_PATTERN: Regex = Regex::new(r"^USER([0-9]{3})$").unwrap();
}

/// Number of partitions callers are spread across.
pub const GROUP_COUNT: u16 = 100;

/// Validated caller identity: the three digits of a `USER<ddd>` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Match a bare token (`USER007`) and keep its digits.
    pub fn from_token(token: &str) -> Result<Self, AuthFailure> {
        TOKEN_PATTERN
            .captures(token)
            .and_then(|caps| caps.get(1))
            .map(|digits| Identity(digits.as_str().to_string()))
            .ok_or(AuthFailure::TokenMismatch)
    }

    // Token is the second element of the value split on single spaces. Works on
    // raw bytes so opaque bytes outside the token don't reject the header.
    pub fn from_authorization(value: impl AsRef<[u8]>) -> Result<Self, AuthFailure> {
        let token = value
            .as_ref()
            .split(|b| *b == b' ')
            .nth(1)
            .ok_or(AuthFailure::MissingToken)?;
        let token = std::str::from_utf8(token).map_err(|_| AuthFailure::TokenMismatch)?;
        Self::from_token(token)
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthFailure> {
        let raw = headers
            .get(AUTHORIZATION)
            .ok_or(AuthFailure::MissingHeader)?;
        Self::from_authorization(raw.as_bytes())
    }

    /// The three-digit id, leading zeros kept (`"007"`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id (`"007"` -> 7).
    pub fn numeric(&self) -> u16 {
        // the pattern guarantees three ASCII digits
        self.0
            .bytes()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
    }

    /// Partition in `1..=100`: `(numeric mod 100) + 1`.
    pub fn group(&self) -> u16 {
        self.numeric() % GROUP_COUNT + 1
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USER_{}", self.0)
    }
}
