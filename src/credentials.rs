//! Ordered API credentials with placeholder skipping

use secrecy::{ExposeSecret, SecretString};

/// Substring marking a slot that was never filled in
pub const PLACEHOLDER_MARKER: &str = "YOUR_API_KEY";

/// A single API credential
///
/// The token is kept behind `SecretString` so it never reaches logs.
#[derive(Debug)]
pub struct Credential {
    /// 1-based position in the configured list, used in logs
    slot: usize,
    token: SecretString,
}

impl Credential {
    /// Position of this credential in the configured list (1-based)
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Raw token for building requests
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// Whether this slot holds a placeholder instead of a real token
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        let token = self.expose();
        token.trim().is_empty() || token.contains(PLACEHOLDER_MARKER)
    }
}

/// Credentials tried in configured order until one succeeds
#[derive(Debug, Default)]
pub struct CredentialRing {
    credentials: Vec<Credential>,
}

impl CredentialRing {
    /// Build a ring from raw tokens, keeping their order
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = tokens
            .into_iter()
            .enumerate()
            .map(|(idx, token)| Credential {
                slot: idx + 1,
                token: SecretString::from(token.into()),
            })
            .collect();

        Self { credentials }
    }

    /// Credentials that are not placeholders, in order
    pub fn usable(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter().filter(|c| !c.is_placeholder())
    }

    /// Whether at least one real credential is configured
    #[must_use]
    pub fn has_usable(&self) -> bool {
        self.usable().next().is_some()
    }

    /// Number of configured slots, placeholders included
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no slots are configured at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
