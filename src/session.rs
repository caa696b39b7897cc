//! Authenticated identity and its persistence across reloads.
//!
//! `SessionStore` is the only writer of the persisted entry. Restoring never
//! fails loudly: a missing or corrupt entry yields no session and the corrupt
//! entry is erased.

use std::cell::RefCell;
use std::collections::HashMap;

use gloo_storage::errors::StorageError;
use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiClient, ProfileUpdate, Transport, UserSummary};
use crate::error::AuthFailure;

const GENERATED_AVATAR_BASE: &str = "https://ui-avatars.com/api/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Role {
    Admin,
    Teacher,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, rename = "avatar", skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Image for the identity: the stored avatar, else initials generated
    /// from the name.
    pub fn avatar_src(&self) -> String {
        match self.avatar_ref.as_deref().map(str::trim) {
            Some(src) if !src.is_empty() => src.to_string(),
            _ => {
                let name = if self.name.trim().is_empty() { "User" } else { self.name.trim() };
                format!(
                    "{}?name={}&background=3b82f6&color=fff",
                    GENERATED_AVATAR_BASE,
                    urlencoding::encode(name)
                )
            }
        }
    }

    /// Apply the name/email the service confirmed. Id and role stay fixed.
    fn with_profile(&self, summary: &UserSummary) -> Session {
        Session {
            name: summary.name.clone(),
            email: summary.email.clone(),
            ..self.clone()
        }
    }
}

/// Durable client-side storage of JSON values. `get` errs when an entry
/// exists but cannot be read back.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, String>;
    fn set(&self, key: &str, value: &Value) -> Result<(), String>;
    fn remove(&self, key: &str);
}

/// `window.localStorage` through gloo.
pub struct BrowserStorage;

impl BrowserStorage {
    /// None when storage is unavailable (e.g. blocked by privacy settings).
    pub fn open() -> Option<Self> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .map(|_| Self)
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        match LocalStorage::get::<Value>(key) {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        LocalStorage::set(key, value).map_err(|e| e.to_string())
    }

    fn remove(&self, key: &str) {
        LocalStorage::delete(key);
    }
}

/// In-memory fallback; lives only as long as the page.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, Value>>,
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

pub struct SessionStore<S> {
    storage: S,
    key: String,
}

impl SessionStore<Box<dyn KeyValueStore>> {
    /// localStorage when available, otherwise memory for this page only.
    pub fn for_browser(key: &str) -> Self {
        let storage: Box<dyn KeyValueStore> = match BrowserStorage::open() {
            Some(s) => Box::new(s),
            None => {
                warn!("localStorage unavailable, session will not survive reloads");
                Box::new(MemoryStorage::default())
            }
        };
        Self::new(storage, key)
    }
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    pub fn restore(&self) -> Option<Session> {
        let restored = self
            .storage
            .get(&self.key)
            .and_then(|raw| match raw {
                Some(value) => serde_json::from_value::<Session>(value)
                    .map(Some)
                    .map_err(|e| e.to_string()),
                None => Ok(None),
            });
        match restored {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding unreadable stored session: {}", e);
                self.storage.remove(&self.key);
                None
            }
        }
    }

    pub async fn authenticate<T: Transport>(
        &self,
        client: &ApiClient<T>,
        email: &str,
        secret: &str,
    ) -> Result<Session, AuthFailure> {
        let session = client.login(email, secret).await.map_err(|e| {
            let failure = AuthFailure::from(e);
            warn!("Sign-in failed for {}: {}", email, failure);
            failure
        })?;
        self.persist(&session);
        info!("Signed in {} as {}", session.id, session.role.label());
        Ok(session)
    }

    /// Update the profile on the service and re-persist the confirmed fields.
    pub async fn update_profile<T: Transport>(
        &self,
        client: &ApiClient<T>,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<Session, String> {
        let summary = client.update_user(&session.id, update).await?;
        let updated = session.with_profile(&summary);
        self.persist(&updated);
        Ok(updated)
    }

    pub fn clear(&self) {
        self.storage.remove(&self.key);
    }

    fn persist(&self, session: &Session) {
        let stored = serde_json::to_value(session)
            .map_err(|e| e.to_string())
            .and_then(|value| self.storage.set(&self.key, &value));
        if let Err(e) = stored {
            warn!("Could not persist session: {}", e);
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
