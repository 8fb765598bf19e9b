use bcrypt::{hash, verify, DEFAULT_COST};
use validator::ValidationError;

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hashes `password` with bcrypt at the default cost.
///
/// A bcrypt failure is logged and terminates the process.
pub fn hash_password(password: &str) -> String {
    match hash(password, DEFAULT_COST) {
        Ok(hashed) => hashed,
        Err(e) => {
            log::error!("Failed to hash password: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns true iff `password` matches `hashed_password`.
///
/// A mismatch is a normal `false`. A stored hash bcrypt cannot parse is
/// logged and also reported as `false`.
pub fn validate_password(hashed_password: &str, password: &str) -> bool {
    // bcrypt would compare only the first 72 bytes
    if password.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            log::warn!("Failed to verify password against stored hash: {}", e);
            false
        }
    }
}

/// `validator` rule keeping passwords within what bcrypt can hash whole.
pub fn validate_password_length(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("password_too_long");
        error.message = Some("Password must be at most 72 bytes".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_password_hashing_and_validation() {
        let password = "test_password123";
        let hashed = hash_password(password);

        assert_ne!(hashed, password);
        assert!(validate_password(&hashed, password));
        assert!(!validate_password(&hashed, "wrong_password"));
        assert!(!validate_password(&hashed, ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("pw");
        let second = hash_password("pw");
        assert_ne!(first, second);
        assert!(validate_password(&first, "pw"));
        assert!(validate_password(&second, "pw"));
    }

    #[test_log::test]
    fn test_validate_with_invalid_hash() {
        assert!(!validate_password("invalidhashformat", "test_password123"));
        assert!(!validate_password("", "test_password123"));
    }

    #[test]
    fn test_passwords_sharing_a_72_byte_prefix_do_not_match() {
        let stored = format!("{}secret-one", "a".repeat(72));
        let other = format!("{}totally-different", "a".repeat(72));
        let hashed = hash_password(&"a".repeat(72));

        assert!(validate_password(&hashed, &"a".repeat(72)));
        assert!(!validate_password(&hashed, &stored));
        assert!(!validate_password(&hashed, &other));
    }

    #[test]
    fn test_password_length_rule() {
        assert!(validate_password_length(&"a".repeat(72)).is_ok());
        assert!(validate_password_length(&"a".repeat(73)).is_err());
        // the limit counts bytes, not characters
        assert!(validate_password_length(&"é".repeat(36)).is_ok());
        assert!(validate_password_length(&"é".repeat(37)).is_err());
    }
}
