//! Session-token boundary.
//!
//! The dashboard stores upstream session tokens sealed with a symmetric
//! string transform (`mpx1:` prefix + hex of an XOR-rolled byte string).
//! The pipeline unseals and validates the token before any network call,
//! so an unusable token never reaches the upstream API.

use thiserror::Error;

const TOKEN_PREFIX: &str = "mpx1:";
const ROLL_KEY: &[u8] = b"manaplex-dashboard-seal";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("missing token prefix")]
    MissingPrefix,
    #[error("token hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("token is not valid utf-8")]
    NotUtf8,
    #[error("empty session token")]
    Empty,
}

fn roll(bytes: &mut [u8]) {
    for (i, b) in bytes.iter_mut().enumerate() {
        *b ^= ROLL_KEY[i % ROLL_KEY.len()];
    }
}

/// Unseal a stored token into the plain upstream session string.
pub fn unseal_token(sealed: &str) -> Result<String, TokenError> {
    let payload = sealed
        .strip_prefix(TOKEN_PREFIX)
        .ok_or(TokenError::MissingPrefix)?;
    let mut bytes = hex::decode(payload)?;
    roll(&mut bytes);
    let session = String::from_utf8(bytes).map_err(|_| TokenError::NotUtf8)?;
    if session.is_empty() {
        return Err(TokenError::Empty);
    }
    Ok(session)
}

/// Seal a plain session string for storage. Inverse of `unseal_token`.
pub fn seal_token(session: &str) -> String {
    let mut bytes = session.as_bytes().to_vec();
    roll(&mut bytes);
    format!("{TOKEN_PREFIX}{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_unseal_roundtrip() {
        let sealed = seal_token("session-abc-123");
        assert!(sealed.starts_with(TOKEN_PREFIX));
        assert_eq!(unseal_token(&sealed).unwrap(), "session-abc-123");
    }

    #[test]
    fn missing_prefix_rejected() {
        assert!(matches!(
            unseal_token("deadbeef"),
            Err(TokenError::MissingPrefix)
        ));
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(unseal_token("mpx1:zzzz"), Err(TokenError::Hex(_))));
    }

    #[test]
    fn empty_session_rejected() {
        assert!(matches!(unseal_token("mpx1:"), Err(TokenError::Empty)));
    }
}
