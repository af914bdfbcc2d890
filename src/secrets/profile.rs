//! Provider configuration profiles and their registry.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::secrets::errors::{SecretsError, SecretsResult};
use crate::secrets::store::SecretStore;

/// Identifier for a provider configuration, doubling as the keychain account
/// name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Hard ceiling to prevent pathological payloads.
    pub const MAX_LEN: usize = 64;

    /// Build a validated `ProfileId`.
    ///
    /// Rules:
    /// - Non-empty after trimming.
    /// - Max length limited.
    /// - Conservative ASCII set: `[A-Za-z0-9._-]`.
    ///
    /// # Errors
    /// Returns an error if the input is empty, too long, or contains invalid
    /// characters.
    pub fn new(raw: impl AsRef<str>) -> SecretsResult<Self> {
        let s = raw.as_ref().trim();

        if s.is_empty() {
            return Err(SecretsError::Validation(
                "profile id must not be empty".to_string(),
            ));
        }
        if s.len() > Self::MAX_LEN {
            return Err(SecretsError::Validation(format!(
                "profile id too long: got {}, max {}",
                s.len(),
                Self::MAX_LEN
            )));
        }

        for (i, ch) in s.chars().enumerate() {
            let ok = ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-');
            if !ok {
                return Err(SecretsError::Validation(format!(
                    "profile id contains invalid character {ch:?} at index {i}"
                )));
            }
        }

        Ok(Self(s.to_owned()))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileId {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A provider configuration: where requests go and how the entry is shown.
/// The API key itself lives in the secret store, never here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Configuration identifier.
    pub id: ProfileId,
    /// Human-readable name shown in settings.
    pub display_name: String,
    /// Provider base URL.
    pub base_url: String,
}

impl ProviderProfile {
    /// Build a profile from raw parts, validating everything.
    ///
    /// # Errors
    /// Returns an error if the id, display name, or base URL is invalid.
    pub fn new(
        id: impl AsRef<str>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> SecretsResult<Self> {
        let profile = Self {
            id: ProfileId::new(id)?,
            display_name: display_name.into(),
            base_url: base_url.into(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Validate profile invariants.
    ///
    /// # Errors
    /// Returns an error if the display name is blank or the base URL does not
    /// parse.
    pub fn validate(&self) -> SecretsResult<()> {
        if self.display_name.trim().is_empty() {
            return Err(SecretsError::Validation(
                "display_name must not be empty".to_string(),
            ));
        }
        Url::parse(&self.base_url)?;
        Ok(())
    }
}

/// Registry of provider profiles, each paired with one secret in the secret
/// store. Removing a profile deletes its secret.
pub struct ProfileManager {
    profiles: HashMap<ProfileId, ProviderProfile>,
    secrets: Arc<dyn SecretStore>,
}

impl ProfileManager {
    /// Create an empty registry over a secret store.
    #[must_use]
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            profiles: HashMap::new(),
            secrets,
        }
    }

    /// Register (or replace) a profile together with its secret.
    ///
    /// # Errors
    /// Returns an error if the profile is invalid, the secret is blank, or
    /// the secret store rejects the write.
    pub fn upsert_profile(&mut self, profile: ProviderProfile, secret: &str) -> SecretsResult<()> {
        profile.validate()?;
        if secret.trim().is_empty() {
            return Err(SecretsError::Validation(
                "secret must not be empty".to_string(),
            ));
        }

        self.secrets.set_secret(&profile.id, secret)?;
        info!("Stored credentials for profile {}", profile.id);
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Remove a profile and delete its stored secret.
    ///
    /// # Errors
    /// Returns an error if the profile is unknown or the secret store rejects
    /// the delete. A secret already absent from the store is not an error.
    pub fn remove_profile(&mut self, id: &ProfileId) -> SecretsResult<()> {
        if self.profiles.remove(id).is_none() {
            return Err(SecretsError::Validation(format!("unknown profile: {id}")));
        }
        self.secrets.delete_secret(id)?;
        info!("Removed profile {id} and its credentials");
        Ok(())
    }

    /// Look up a profile.
    #[must_use]
    pub fn get(&self, id: &ProfileId) -> Option<&ProviderProfile> {
        self.profiles.get(id)
    }

    /// All profiles, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<&ProviderProfile> {
        let mut profiles: Vec<&ProviderProfile> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }

    /// Fetch the secret for a profile, `None` when absent.
    ///
    /// # Errors
    /// Returns an error if the secret store cannot be read.
    pub fn secret(&self, id: &ProfileId) -> SecretsResult<Option<String>> {
        self.secrets.get_secret(id)
    }
}
