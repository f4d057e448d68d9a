//! Reference data for bootstrapping an [`InMemoryStore`]
//!
//! ```toml
//! account_types = ["Administrator", "Student"]
//!
//! [[actors]]
//! id = "6f1c1c43-3b2e-4f55-9a53-2f3f0a0e6d11"
//! name = "admin"
//!
//! [[accounts]]
//! username = "joao.da"
//! account_type = "Student"
//! ```

use crate::memory::InMemoryStore;
use chrono::Utc;
use enrollment_core::{AccountStatus, Actor, LoginState, NewAccount, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors while loading seed data
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Seed account names an account type that is not listed
    #[error("seed account '{username}' uses unknown account type '{account_type}'")]
    UnknownAccountType {
        username: String,
        account_type: String,
    },

    /// Store rejected a seed row
    #[error("store rejected seed data: {0}")]
    Store(#[from] StoreError),
}

/// Pre-existing account, identified by username and type designation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAccount {
    pub username: String,
    pub account_type: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Actors, catalog and accounts present before any enrollment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub account_types: Vec<String>,
    pub actors: Vec<Actor>,
    pub accounts: Vec<SeedAccount>,
}

impl SeedData {
    /// Parse TOML text
    ///
    /// # Errors
    /// `SeedError::Parse` on malformed input.
    pub fn from_toml_str(text: &str) -> Result<Self, SeedError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `SeedError::Io` or `SeedError::Parse`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load into a fresh store; seeded accounts get `password_hash` and no
    /// pending reset
    ///
    /// # Errors
    /// - `SeedError::UnknownAccountType` if an account names an unlisted type
    /// - `SeedError::Store` on duplicate usernames
    pub fn into_store(self, password_hash: &str) -> Result<InMemoryStore, SeedError> {
        let store = InMemoryStore::new();
        for designation in &self.account_types {
            store.add_account_type(designation.clone());
        }
        for actor in self.actors {
            store.add_actor(actor);
        }
        for seed in self.accounts {
            let account_type = self
                .account_types
                .iter()
                .any(|d| *d == seed.account_type)
                .then(|| store.add_account_type(seed.account_type.clone()))
                .ok_or_else(|| SeedError::UnknownAccountType {
                    username: seed.username.clone(),
                    account_type: seed.account_type.clone(),
                })?;

            store.seed_account(NewAccount {
                display_name: seed.display_name.unwrap_or_else(|| seed.username.clone()),
                username: seed.username,
                password_hash: password_hash.to_string(),
                account_type_id: account_type.id,
                status: AccountStatus::Active,
                login_state: LoginState::LoggedOut,
                student_id: None,
                must_change_password: false,
                created_at: Utc::now(),
            })?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EnrollmentStore;

    const SEED: &str = r#"
        account_types = ["Administrator", "Student"]

        [[actors]]
        id = "6f1c1c43-3b2e-4f55-9a53-2f3f0a0e6d11"
        name = "admin"

        [[accounts]]
        username = "joao.da"
        account_type = "Student"
    "#;

    #[tokio::test]
    async fn loads_actors_catalog_and_accounts() {
        let seed = SeedData::from_toml_str(SEED).unwrap();
        let actor_id = seed.actors[0].id;
        let store = seed.into_store("hash").unwrap();

        assert!(store.find_actor(actor_id).await.unwrap().is_some());
        let account = store.account_by_username("joao.da").unwrap();
        assert_eq!(account.display_name, "joao.da");
        assert!(account.student_id.is_none());
        assert_eq!(store.counts().accounts, 1);
    }

    #[test]
    fn unknown_account_type_is_rejected() {
        let seed = SeedData {
            account_types: vec!["Staff".into()],
            actors: vec![],
            accounts: vec![SeedAccount {
                username: "x".into(),
                account_type: "Student".into(),
                display_name: None,
            }],
        };
        assert!(matches!(
            seed.into_store("hash"),
            Err(SeedError::UnknownAccountType { .. })
        ));
    }

    #[test]
    fn duplicate_seed_usernames_are_rejected() {
        let seed = SeedData {
            account_types: vec!["Student".into()],
            actors: vec![],
            accounts: vec![
                SeedAccount {
                    username: "ana".into(),
                    account_type: "Student".into(),
                    display_name: None,
                },
                SeedAccount {
                    username: "ana".into(),
                    account_type: "Student".into(),
                    display_name: None,
                },
            ],
        };
        assert!(matches!(seed.into_store("hash"), Err(SeedError::Store(_))));
    }
}
