//! In-memory implementation of the storage traits, for tests and the
//! server's `--mock` mode. Starts empty; tests create their own fixtures.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::DateTime;

use cupid_app::data_access::DataAccess;
use cupid_app::{Like, Message, User, UserId};
use cupid_auth::{AuthStorage, AuthenticationInfo};

#[derive(Debug)]
pub enum Error {
    ThreadPoisonError,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThreadPoisonError => write!(f, "Thread poisoning error"),
        }
    }
}

impl std::error::Error for Error {}

impl<T> From<PoisonError<T>> for Error {
    fn from(_value: PoisonError<T>) -> Self {
        Self::ThreadPoisonError
    }
}

struct AuthRecord {
    user_id: UserId,
    phc_string: password_hash::PasswordHashString,
}

#[derive(Clone)]
pub struct Db {
    users: Arc<Mutex<Vec<User>>>,
    likes: Arc<Mutex<Vec<Like>>>,
    messages: Arc<Mutex<Vec<Message>>>,
    auth: Arc<Mutex<Vec<AuthRecord>>>,
    next_user_id: Arc<AtomicI64>,
    next_like_id: Arc<AtomicI64>,
    next_message_id: Arc<AtomicI64>,
}

impl Db {
    pub fn new() -> Self {
        Db {
            users: Arc::new(Mutex::new(Vec::new())),
            likes: Arc::new(Mutex::new(Vec::new())),
            messages: Arc::new(Mutex::new(Vec::new())),
            auth: Arc::new(Mutex::new(Vec::new())),
            next_user_id: Arc::new(AtomicI64::new(1)),
            next_like_id: Arc::new(AtomicI64::new(1)),
            next_message_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl DataAccess for Db {
    type Error = Error;

    async fn create_user(
        &self,
        username: &str,
        bio: Option<&str>,
    ) -> Result<Option<UserId>, Self::Error> {
        let mut table_locked = self.users.lock()?;

        if table_locked
            .iter()
            .any(|record| record.username.to_lowercase() == username.to_lowercase())
        {
            return Ok(None);
        };

        let user_id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        table_locked.push(User {
            id: user_id,
            username: username.to_owned(),
            bio: bio.map(str::to_owned),
        });
        Ok(Some(user_id))
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, Error> {
        let res = self
            .users
            .lock()?
            .iter()
            .find(|record| record.id == user_id)
            .cloned();
        Ok(res)
    }

    async fn find_user_by_username(&self, requested_username: &str) -> Result<Option<UserId>, Error> {
        let res = self
            .users
            .lock()?
            .iter()
            .find(|record| record.username.to_lowercase() == requested_username.to_lowercase())
            .map(|record| record.id);
        Ok(res)
    }

    async fn fetch_users_except(&self, user_id: UserId) -> Result<Vec<User>, Error> {
        let res = self
            .users
            .lock()?
            .iter()
            .filter(|record| record.id != user_id)
            .cloned()
            .collect();
        Ok(res)
    }

    async fn create_like(
        &self,
        user_id: UserId,
        liked_user_id: UserId,
    ) -> Result<Option<Like>, Self::Error> {
        let mut table_locked = self.likes.lock()?;

        if table_locked
            .iter()
            .any(|record| record.user_id == user_id && record.liked_user_id == liked_user_id)
        {
            return Ok(None);
        };

        let like = Like {
            id: self.next_like_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            liked_user_id,
        };
        table_locked.push(like);
        Ok(Some(like))
    }

    async fn create_message(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
        timestamp: DateTime<chrono::Utc>,
    ) -> Result<Message, Error> {
        let message = Message {
            id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
            from,
            to,
            content: content.to_owned(),
            timestamp,
        };
        self.messages.lock()?.push(message.clone());
        Ok(message)
    }

    async fn fetch_received_messages(&self, user_id: UserId) -> Result<Vec<Message>, Error> {
        // messages are appended in send order, so newest first is a reverse scan
        let res = self
            .messages
            .lock()?
            .iter()
            .rev()
            .filter(|record| record.to == user_id)
            .cloned()
            .collect();
        Ok(res)
    }
}

impl AuthStorage for Db {
    type Error = Error;

    async fn fetch_authentication(
        &self,
        user_id: UserId,
    ) -> Result<Option<AuthenticationInfo>, Error> {
        let res = self
            .auth
            .lock()?
            .iter()
            .find(|record| record.user_id == user_id)
            .map(|record| AuthenticationInfo::from(record.phc_string.clone()));
        Ok(res)
    }

    async fn update_authentication(
        &self,
        user_id: UserId,
        auth_info: AuthenticationInfo,
    ) -> Result<Option<AuthenticationInfo>, Self::Error> {
        let mut table_locked = self.auth.lock()?;
        for record in table_locked.iter_mut() {
            if record.user_id == user_id {
                let old_auth = record.phc_string.clone();
                record.phc_string = auth_info.phc_string().clone();
                return Ok(Some(old_auth.into()));
            };
        }
        table_locked.push(AuthRecord {
            user_id,
            phc_string: auth_info.phc_string().clone(),
        });
        Ok(None)
    }
}
