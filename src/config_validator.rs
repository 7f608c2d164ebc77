use crate::error::ClubsError;
use std::net::SocketAddr;

/// Validates configuration values before the service starts
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a bind address
    pub fn validate_bind_address(address: &SocketAddr) -> Result<(), ClubsError> {
        if address.port() == 0 {
            return Err(ClubsError::Configuration(
                "Bind address must name a fixed port".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates rate limit parameters
    pub fn validate_rate_limit(rate: u32, capacity_multiplier: u32) -> Result<(), ClubsError> {
        if rate == 0 {
            return Err(ClubsError::Configuration(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        if capacity_multiplier == 0 {
            return Err(ClubsError::Configuration(
                "Bucket capacity multiplier must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the accepted API key set
    pub fn validate_api_keys(keys: &[String]) -> Result<(), ClubsError> {
        if keys.is_empty() {
            return Err(ClubsError::Configuration(
                "At least one API key must be configured (API_KEYS)".to_string(),
            ));
        }

        if let Some(bad) = keys.iter().find(|k| k.chars().any(char::is_whitespace)) {
            return Err(ClubsError::Configuration(format!(
                "API key '{}' contains whitespace",
                bad
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bind_address() {
        assert!(ConfigValidator::validate_bind_address(&"127.0.0.1:8080".parse().unwrap()).is_ok());
        assert!(ConfigValidator::validate_bind_address(&"0.0.0.0:3000".parse().unwrap()).is_ok());
    }

    #[test]
    fn test_invalid_bind_address() {
        assert!(ConfigValidator::validate_bind_address(&"127.0.0.1:0".parse().unwrap()).is_err());
        assert!(ConfigValidator::validate_bind_address(&"[::1]:0".parse().unwrap()).is_err());
    }

    #[test]
    fn test_rate_limit() {
        assert!(ConfigValidator::validate_rate_limit(100, 2).is_ok());
        assert!(ConfigValidator::validate_rate_limit(0, 2).is_err());
        assert!(ConfigValidator::validate_rate_limit(100, 0).is_err());
    }

    #[test]
    fn test_api_keys() {
        assert!(ConfigValidator::validate_api_keys(&["abc".to_string()]).is_ok());
        assert!(ConfigValidator::validate_api_keys(&[]).is_err());
        assert!(ConfigValidator::validate_api_keys(&["a b".to_string()]).is_err());
    }
}
