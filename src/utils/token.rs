use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const RESET_TOKEN_LENGTH: usize = 48;

pub fn generate_reset_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex SHA-256 of a raw token. Only the digest is persisted.
pub fn digest_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn digests_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Cheap shape check so obviously bogus path segments never reach the database.
pub fn looks_like_reset_token(raw: &str) -> bool {
    raw.len() == RESET_TOKEN_LENGTH && raw.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_LENGTH);
        assert!(looks_like_reset_token(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_stable_hex() {
        let d = digest_token("abc");
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(digests_match(&d, &digest_token("abc")));
        assert!(!digests_match(&d, &digest_token("abd")));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!looks_like_reset_token("short"));
        assert!(!looks_like_reset_token(&"a/".repeat(24)));
    }
}
