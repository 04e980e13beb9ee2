/*
[INPUT]:  Domain, address, chain id and a fresh nonce
[OUTPUT]: EIP-4361 (Sign-In with Ethereum) challenge text
[POS]:    Auth layer - sign-in challenge construction
[UPDATE]: When the challenge format or its fields change
*/

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// EIP-4361 sign-in challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInChallenge {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
}

impl SignInChallenge {
    /// Build a challenge with a random nonce issued now
    pub fn new(domain: &str, uri: &str, address: &str, chain_id: u64) -> Self {
        Self {
            domain: domain.to_string(),
            address: address.to_string(),
            statement: None,
            uri: uri.to_string(),
            chain_id,
            nonce: Uuid::new_v4().simple().to_string(),
            issued_at: Utc::now(),
        }
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        let statement = statement.into();
        self.statement = (!statement.trim().is_empty()).then_some(statement);
        self
    }

    /// Render the human-readable message the wallet signs
    pub fn to_message(&self) -> String {
        let mut message = format!(
            "{} wants you to sign in with your Ethereum account:\n{}\n\n",
            self.domain, self.address
        );
        if let Some(statement) = &self.statement {
            message.push_str(statement);
            message.push_str("\n\n");
        }
        message.push_str(&format!(
            "URI: {}\nVersion: 1\nChain ID: {}\nNonce: {}\nIssued At: {}",
            self.uri,
            self.chain_id,
            self.nonce,
            self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_challenge_message_layout() {
        let mut challenge = SignInChallenge::new("app.example", "https://app.example", "0xabc", 56)
            .with_statement("Sign in to continue.");
        challenge.nonce = "abcdef12".to_string();
        challenge.issued_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let expected = "app.example wants you to sign in with your Ethereum account:\n\
0xabc\n\n\
Sign in to continue.\n\n\
URI: https://app.example\n\
Version: 1\n\
Chain ID: 56\n\
Nonce: abcdef12\n\
Issued At: 2024-05-01T12:00:00.000Z";
        assert_eq!(challenge.to_message(), expected);
    }

    #[test]
    fn test_blank_statement_is_omitted() {
        let challenge = SignInChallenge::new("d", "https://d", "0xabc", 1).with_statement("  ");
        assert!(challenge.statement.is_none());
        assert!(!challenge.to_message().contains("\n\n\n"));
    }

    #[test]
    fn test_nonces_are_unique() {
        let a = SignInChallenge::new("d", "https://d", "0xabc", 1);
        let b = SignInChallenge::new("d", "https://d", "0xabc", 1);
        assert_ne!(a.nonce, b.nonce);
        assert!(a.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
