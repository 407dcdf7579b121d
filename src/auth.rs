//! Credentials for the manifest's basic-auth challenge.
//!
//! The password lives in the OS keychain; `SITECACHE_MANIFEST_PASSWORD`
//! overrides it so CI runs and one-off shells never need keychain access.

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "sitecache";

/// Environment override for the manifest password.
pub const PASSWORD_ENV: &str = "SITECACHE_MANIFEST_PASSWORD";

#[derive(Debug, Clone)]
pub struct ManifestCredentials {
    pub username: String,
    pub password: String,
}

impl ManifestCredentials {
    /// Resolve the password for a username: environment first, then the
    /// OS keychain.
    pub fn resolve(username: &str) -> Result<Self> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(Self {
                username: username.to_string(),
                password,
            });
        }
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        let password = entry.get_password().with_context(|| {
            format!(
                "No manifest password for {}: set {} or run `sitecache set-password`",
                username, PASSWORD_ENV
            )
        })?;
        Ok(Self {
            username: username.to_string(),
            password,
        })
    }

    /// Store the password for a username in the OS keychain.
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Delete the stored password for a username.
    pub fn forget(username: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
