use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::ClientUser;
use crate::utils::HamoError;

/// Credentials that survive between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<ClientUser>,
}

/// Token cache backed by a TOML file (or memory only when no path is set)
#[derive(Debug, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
    credentials: CachedCredentials,
}

impl TokenStore {
    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache from `path`; a missing file is an empty cache
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HamoError> {
        let path = path.as_ref().to_path_buf();
        let credentials = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            CachedCredentials::default()
        };
        Ok(Self {
            path: Some(path),
            credentials,
        })
    }

    /// Write the cache to disk
    pub fn save(&self) -> Result<(), HamoError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&self.credentials)?)?;
        Ok(())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credentials.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.credentials.refresh_token.as_deref()
    }

    pub fn user(&self) -> Option<&ClientUser> {
        self.credentials.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.access_token.is_some()
    }

    /// Store a new access token; the old refresh token is kept unless a new
    /// one is supplied
    pub fn set_tokens(&mut self, access: String, refresh: Option<String>) -> Result<(), HamoError> {
        self.credentials.access_token = Some(access);
        if refresh.is_some() {
            self.credentials.refresh_token = refresh;
        }
        self.save()
    }

    pub fn set_user(&mut self, user: ClientUser) -> Result<(), HamoError> {
        self.credentials.user = Some(user);
        self.save()
    }

    /// Forget tokens and the stored user
    pub fn clear(&mut self) -> Result<(), HamoError> {
        self.credentials = CachedCredentials::default();
        match &self.path {
            Some(path) if path.exists() => fs::remove_file(path).map_err(HamoError::from),
            _ => Ok(()),
        }
    }
}
