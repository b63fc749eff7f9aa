use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::{AppError, AppResult};

/// Public URL of a file kept under the media root
pub fn media_url(relative: &str) -> String {
    format!("/media/{}", relative.trim_start_matches('/'))
}

/// Trims `value` and rejects it when nothing is left
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Argon2id hash of `password` as a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Storage(format!("password hashing failed: {e}")))
}

/// A stored hash that does not parse never matches
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|hash| Argon2::default().verify_password(password.as_bytes(), &hash).is_ok())
        .unwrap_or(false)
}

/// Letters, digits and `_ . @ + -` only
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_is_rooted() {
        assert_eq!(media_url("recipes/a.png"), "/media/recipes/a.png");
        assert_eq!(media_url("/users/b.png"), "/media/users/b.png");
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank("  soup "), Some("soup".to_string()));
        assert_eq!(non_blank(" \t\n"), None);
    }

    #[test]
    fn password_hashes_are_salted_phc_strings() {
        let a = hash_password("secret").expect("hash");
        let b = hash_password("secret").expect("hash");
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);

        assert!(verify_password("secret", &a));
        assert!(verify_password("secret", &b));
        assert!(!verify_password("Secret", &a));
        assert!(!verify_password("secret", "not-a-phc-string"));
    }

    #[test]
    fn username_charset() {
        assert!(is_valid_username("chef.anna+1@home"));
        assert!(!is_valid_username("chef anna"));
        assert!(!is_valid_username(""));
    }
}
