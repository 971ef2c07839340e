//! Custom validators shared by the request payloads.

use validator::ValidationError;

const JOIN_CODE_LEN: usize = 6;

/// Join codes are exactly six uppercase alphanumeric characters.
pub fn validate_join_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != JOIN_CODE_LEN {
        return Err(ValidationError::new("join_code_length")
            .with_message("join code must be exactly 6 characters".into()));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::new("join_code_charset")
            .with_message("join code must be uppercase letters and digits".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_code_accepts_uppercase_alnum() {
        assert!(validate_join_code("A1B2C3").is_ok());
        assert!(validate_join_code("ZZZZZZ").is_ok());
    }

    #[test]
    fn join_code_rejects_wrong_length() {
        assert!(validate_join_code("ABC12").is_err());
        assert!(validate_join_code("ABC1234").is_err());
        assert!(validate_join_code("").is_err());
    }

    #[test]
    fn join_code_rejects_lowercase_and_symbols() {
        assert!(validate_join_code("abc123").is_err());
        assert!(validate_join_code("AB-123").is_err());
    }
}
