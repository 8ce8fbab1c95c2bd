use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Bearer token obtained from a client-credentials exchange. The secret is
/// only reachable through [`AccessToken::secret`] and is redacted from the
/// `Debug` output. The type deliberately implements no serde traits.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Tokens within this margin of their declared expiry count as expired.
    const REFRESH_MARGIN_SECONDS: i64 = 60;

    pub fn from_grant(secret: String, expires_in_seconds: i64) -> Self {
        Self {
            secret,
            expires_at: Utc::now() + Duration::seconds(expires_in_seconds),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(Self::REFRESH_MARGIN_SECONDS) >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authenticated handle for processor calls. `MerchantKeys` marks the card
/// gateway's ambient merchant-key identity held by its client; `Bearer`
/// carries the wallet processor's short-lived token.
#[derive(Debug, Clone)]
pub enum ProcessorCredential {
    MerchantKeys,
    Bearer(AccessToken),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_with_long_expiry_is_usable() {
        let token = AccessToken::from_grant("secret-token".to_string(), 3600);
        assert!(!token.is_expired());
        assert_eq!(token.secret(), "secret-token");
    }

    #[test]
    fn token_within_refresh_margin_counts_as_expired() {
        let token = AccessToken::from_grant("secret-token".to_string(), 30);
        assert!(token.is_expired());
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let token = AccessToken::from_grant("super-secret-value".to_string(), 3600);
        let debugged = format!("{:?}", token);
        assert!(!debugged.contains("super-secret-value"));
        assert!(debugged.contains("<redacted>"));

        let credential = ProcessorCredential::Bearer(token);
        let debugged = format!("{:?}", credential);
        assert!(!debugged.contains("super-secret-value"));
    }
}
