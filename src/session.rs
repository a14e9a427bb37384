use crate::error::SessionError;
use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Storage keys shared by the SPA's local storage and the gateway's cookies.
pub mod keys {
    /// Opaque bearer token issued by the booking API on login.
    pub const TOKEN: &str = "token";
    /// Admin marker; see [`super::ADMIN_MARKER`].
    pub const IS_ADMIN: &str = "isAdmin";
}

/// Canonical admin marker. Always what gets written.
pub const ADMIN_MARKER: &str = "true";
/// Older frontends wrote this instead; still honoured on read.
const LEGACY_ADMIN_MARKER: &str = "on";

/// SessionStore
///
/// The key-value store holding the current user's session flags. Injected
/// wherever the session is read, so no code reaches for global state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    async fn set(&self, key: &str, value: String) -> Result<(), SessionError>;
    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// Type alias for the dynamically dispatched store, shared across tasks.
pub type SessionStoreState = Arc<dyn SessionStore>;

/// MemorySessionStore
///
/// In-process store. Also used as the per-request snapshot of session cookies.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the session cookies carried by one request.
    pub fn from_cookies(jar: &CookieJar) -> Self {
        let entries = [keys::TOKEN, keys::IS_ADMIN]
            .into_iter()
            .filter_map(|key| {
                jar.get(key)
                    .map(|cookie| (key.to_string(), cookie.value().to_string()))
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// SessionState
///
/// The stored string flags, resolved once at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Admin,
}

impl SessionState {
    /// Resolves raw stored values. A blank or missing token is anonymous no
    /// matter what the admin flag says.
    pub fn from_values(token: Option<&str>, admin_flag: Option<&str>) -> Self {
        let has_token = token.is_some_and(|t| !t.trim().is_empty());
        if !has_token {
            return SessionState::Anonymous;
        }
        match admin_flag {
            Some(ADMIN_MARKER) | Some(LEGACY_ADMIN_MARKER) => SessionState::Admin,
            _ => SessionState::Authenticated,
        }
    }

    /// read
    ///
    /// Reads both keys from the store. Fails closed: any store error yields
    /// `Anonymous`.
    pub async fn read(store: &dyn SessionStore) -> Self {
        let values = async {
            let token = store.get(keys::TOKEN).await?;
            let admin = store.get(keys::IS_ADMIN).await?;
            Ok::<_, SessionError>((token, admin))
        }
        .await;

        match values {
            Ok((token, admin)) => Self::from_values(token.as_deref(), admin.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "session read failed, treating as anonymous");
                SessionState::Anonymous
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated | SessionState::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionState::Admin)
    }
}

/// establish
///
/// Login: stores the token and, for admins, the canonical admin marker. A
/// stale admin flag from a previous user is removed.
pub async fn establish(
    store: &dyn SessionStore,
    token: &str,
    is_admin: bool,
) -> Result<(), SessionError> {
    store.set(keys::TOKEN, token.to_string()).await?;
    if is_admin {
        store.set(keys::IS_ADMIN, ADMIN_MARKER.to_string()).await
    } else {
        store.remove(keys::IS_ADMIN).await
    }
}

/// clear
///
/// Logout: removes every session key.
pub async fn clear(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.remove(keys::TOKEN).await?;
    store.remove(keys::IS_ADMIN).await
}
