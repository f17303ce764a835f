// handlers/mod.rs - two security tiers
//
// public:    no token required (login, service info, reads with optional auth)
// protected: a valid bearer token is required (mutations, whoami)
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Parses a `:id` path segment, rejecting anything but a positive integer
pub(crate) fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(|| ApiError::invalid_field("id", format!("Invalid character id '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids_only() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(parse_id("0").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("-3").is_err());
    }
}
