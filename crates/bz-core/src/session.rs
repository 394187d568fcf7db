//! # SessionStore
//!
//! Single source of truth for the credential and cached identity. Everything
//! is read back from the [`KeyValueStore`] on each query so a new store over
//! the same storage sees the same session (a page reload). Changes are
//! broadcast on a `watch` channel for views that render identity.
//!
//! The cached role is a UI hint only; authorization is decided by the backend.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Role, User};
use crate::traits::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_ID_KEY: &str = "userId";
pub const USERNAME_KEY: &str = "username";
pub const ROLE_KEY: &str = "role";

/// The cached projection of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    changes: watch::Sender<Option<Identity>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let current = read_identity(storage.as_ref());
        let (changes, _) = watch::channel(current);
        Self { storage, changes }
    }

    /// Persists a fresh login. The refresh token of an earlier session is
    /// dropped (store the new one with [`Self::set_refresh_token`]), as are
    /// identity keys when the backend sent no user projection.
    pub fn set_session(&self, token: SecretString, user: Option<Identity>) -> Result<(), StoreError> {
        self.storage.set(ACCESS_TOKEN_KEY, token.expose_secret())?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        match &user {
            Some(identity) => {
                self.storage.set(USER_ID_KEY, &identity.user_id.to_string())?;
                self.storage.set(USERNAME_KEY, &identity.username)?;
                self.storage.set(ROLE_KEY, identity.role.as_str())?;
            }
            None => {
                for key in [USER_ID_KEY, USERNAME_KEY, ROLE_KEY] {
                    self.storage.remove(key)?;
                }
            }
        }
        tracing::debug!(user = ?user.as_ref().map(|u| &u.username), "session stored");
        self.publish();
        Ok(())
    }

    pub fn set_refresh_token(&self, token: SecretString) -> Result<(), StoreError> {
        self.storage.set(REFRESH_TOKEN_KEY, token.expose_secret())
    }

    /// Swaps the access token in place after a refresh; identity is unchanged.
    pub fn replace_access_token(&self, token: SecretString) -> Result<(), StoreError> {
        self.storage.set(ACCESS_TOKEN_KEY, token.expose_secret())
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        for key in [
            ACCESS_TOKEN_KEY,
            REFRESH_TOKEN_KEY,
            USER_ID_KEY,
            USERNAME_KEY,
            ROLE_KEY,
        ] {
            self.storage.remove(key)?;
        }
        tracing::debug!("session cleared");
        self.publish();
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.storage
            .get(ACCESS_TOKEN_KEY)
            .is_some_and(|token| !token.is_empty())
    }

    pub fn has_role(&self, allowed: &[Role]) -> bool {
        self.role().is_some_and(|role| allowed.contains(&role))
    }

    pub fn role(&self) -> Option<Role> {
        self.storage.get(ROLE_KEY)?.parse().ok()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.storage.get(USER_ID_KEY)?.parse().ok()
    }

    pub fn identity(&self) -> Option<Identity> {
        read_identity(self.storage.as_ref())
    }

    pub fn access_token(&self) -> Option<SecretString> {
        self.storage
            .get(ACCESS_TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.storage
            .get(REFRESH_TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    /// Updates the cached username after a profile edit.
    pub fn rename(&self, username: &str) -> Result<(), StoreError> {
        self.storage.set(USERNAME_KEY, username)?;
        self.publish();
        Ok(())
    }

    /// Receiver that yields the identity after every session change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }

    fn publish(&self) {
        self.changes.send_replace(self.identity());
    }
}

fn read_identity(storage: &dyn KeyValueStore) -> Option<Identity> {
    storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())?;
    Some(Identity {
        user_id: storage.get(USER_ID_KEY)?.parse().ok()?,
        username: storage.get(USERNAME_KEY)?,
        role: storage.get(ROLE_KEY)?.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::MockKeyValueStore;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "kate".into(),
            role,
        }
    }

    #[test]
    fn set_and_clear_session() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        assert!(!store.is_authenticated());

        store
            .set_session(SecretString::from("tok".to_string()), Some(identity(Role::Moderator)))
            .unwrap();
        assert!(store.is_authenticated());
        assert!(store.has_role(&[Role::Admin, Role::Moderator]));
        assert!(!store.has_role(&[Role::Admin]));
        assert_eq!(store.access_token().unwrap().expose_secret(), "tok");

        store.clear_session().unwrap();
        assert!(!store.is_authenticated());
        assert!(store.identity().is_none());
        assert!(!store.has_role(&Role::ALL));
    }

    #[test]
    fn new_login_drops_the_previous_refresh_token() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        store
            .set_session(SecretString::from("tok-a".to_string()), Some(identity(Role::User)))
            .unwrap();
        store
            .set_refresh_token(SecretString::from("refresh-a".to_string()))
            .unwrap();
        assert!(store.refresh_token().is_some());

        store
            .set_session(SecretString::from("tok-b".to_string()), Some(identity(Role::Admin)))
            .unwrap();
        assert!(store.refresh_token().is_none());
        assert_eq!(store.access_token().unwrap().expose_secret(), "tok-b");
    }

    #[test]
    fn session_survives_reload() {
        let storage = MemoryStore::new();
        let first = SessionStore::new(Arc::new(storage.clone()));
        let who = identity(Role::User);
        first
            .set_session(SecretString::from("tok".to_string()), Some(who.clone()))
            .unwrap();

        let reloaded = SessionStore::new(Arc::new(storage));
        assert_eq!(reloaded.identity(), Some(who));
    }

    #[test]
    fn unknown_role_is_not_trusted() {
        let storage = MemoryStore::new();
        storage.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        storage.set(ROLE_KEY, "superuser").unwrap();
        let store = SessionStore::new(Arc::new(storage));
        assert!(store.is_authenticated());
        assert!(!store.has_role(&Role::ALL));
        assert!(store.identity().is_none());
    }

    #[test]
    fn subscribers_see_login_rename_and_logout() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_none());

        store
            .set_session(SecretString::from("tok".to_string()), Some(identity(Role::Admin)))
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().role, Role::Admin);

        store.rename("katya").unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().username, "katya");

        store.clear_session().unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn storage_failure_is_propagated() {
        let mut storage = MockKeyValueStore::new();
        storage.expect_get().returning(|_| None);
        storage.expect_set().returning(|_, _| {
            Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        });
        let store = SessionStore::new(Arc::new(storage));
        let result = store.set_session(SecretString::from("tok".to_string()), None);
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
