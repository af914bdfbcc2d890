//! Secret store backends.

use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;

use crate::secrets::errors::SecretsResult;
use crate::secrets::profile::ProfileId;

/// Trait for key-value secret storage, one opaque secret per profile.
pub trait SecretStore: Send + Sync {
    /// Store (or replace) the secret for a profile.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the write.
    fn set_secret(&self, profile: &ProfileId, secret: &str) -> SecretsResult<()>;

    /// Fetch the secret for a profile, `None` when absent.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get_secret(&self, profile: &ProfileId) -> SecretsResult<Option<String>>;

    /// Delete the secret for a profile. Deleting an absent secret is not an
    /// error.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the delete.
    fn delete_secret(&self, profile: &ProfileId) -> SecretsResult<()>;
}

/// OS keychain implementation.
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// Keychain service name under which secrets are filed.
    pub const DEFAULT_SERVICE: &'static str = "chatvault";

    /// Create a store using the default service name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(Self::DEFAULT_SERVICE)
    }

    /// Create a store using a custom service name.
    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, profile: &ProfileId) -> SecretsResult<Entry> {
        Ok(Entry::new(&self.service, profile.as_str())?)
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeyringSecretStore {
    fn set_secret(&self, profile: &ProfileId, secret: &str) -> SecretsResult<()> {
        self.entry(profile)?.set_password(secret)?;
        Ok(())
    }

    fn get_secret(&self, profile: &ProfileId) -> SecretsResult<Option<String>> {
        match self.entry(profile)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_secret(&self, profile: &ProfileId) -> SecretsResult<()> {
        match self.entry(profile)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory implementation for tests and keychain-less environments.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.secrets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SecretStore for MemorySecretStore {
    fn set_secret(&self, profile: &ProfileId, secret: &str) -> SecretsResult<()> {
        self.lock()
            .insert(profile.as_str().to_string(), secret.to_string());
        Ok(())
    }

    fn get_secret(&self, profile: &ProfileId) -> SecretsResult<Option<String>> {
        Ok(self.lock().get(profile.as_str()).cloned())
    }

    fn delete_secret(&self, profile: &ProfileId) -> SecretsResult<()> {
        self.lock().remove(profile.as_str());
        Ok(())
    }
}
