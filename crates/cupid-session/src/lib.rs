pub mod storage;

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use cupid_types::models::{Session, User};

use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Read/write access to the client session.
///
/// Login success is the only writer and logout the only clearer. Everything
/// else reads.
pub trait SessionRepository: Send + Sync {
    /// Never fails. Missing, half-written or unreadable state reads as
    /// `Session::Anonymous`.
    fn read(&self) -> Session;

    fn write(&self, token: &str, user: &User) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Session kept in a string key/value storage under `token` and `user`
/// (the user serialized as JSON).
pub struct SessionStore<S = FileStorage> {
    storage: S,
}

impl SessionStore<FileStorage> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(FileStorage::open(path)?))
    }
}

impl SessionStore<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: KeyValueStorage> SessionRepository for SessionStore<S> {
    fn read(&self) -> Session {
        let mut values = match self.storage.get_all(&[TOKEN_KEY, USER_KEY]) {
            Ok(values) => values.into_iter(),
            Err(e) => {
                warn!("Session storage unreadable, treating as signed out: {:#}", e);
                return Session::Anonymous;
            }
        };
        let token = values.next().flatten();
        let user = values.next().flatten().and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .map_err(|e| warn!("Stored user record is corrupt: {}", e))
                .ok()
        });

        let half_present = token.is_some() != user.is_some();
        let session = Session::from_parts(token, user);
        if half_present {
            warn!("Session storage holds only one of token/user, treating as signed out");
        }
        session
    }

    fn write(&self, token: &str, user: &User) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set_all(&[(TOKEN_KEY, token), (USER_KEY, user_json.as_str())])?;
        info!("Session stored for {} ({})", user.username, user.role);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.storage.remove_all(&[TOKEN_KEY, USER_KEY])?;
        info!("Session cleared");
        Ok(())
    }
}
