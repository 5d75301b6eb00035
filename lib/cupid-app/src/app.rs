use anyhow::{Context, Result};
use thiserror::Error;

use crate::authorization::AuthService;
use crate::data_access::DataAccess;
use crate::{Message, MessageId, User, UserId, MAX_MESSAGE_CONTENT_CHARS};

/// The application service: every request handler goes through here. Holds
/// no per-request state, only the storage and auth seams.
#[derive(Clone)]
pub struct App<D, A> {
    data_access: D,
    authorization_service: A,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LikeOutcome {
    Created,
    /// The pair was already stored; repeated likes are a detected no-op.
    AlreadyLiked,
}

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("no user with id {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error("message content exceeds {MAX_MESSAGE_CONTENT_CHARS} characters")]
    ContentTooLong,
    #[error("no user with id {0}")]
    UnknownReceiver(UserId),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl<D: DataAccess, A> App<D, A> {
    pub fn new(data_access: D, authorization_service: A) -> Self {
        App {
            data_access,
            authorization_service,
        }
    }

    pub async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>> {
        let user = self
            .data_access
            .fetch_user(user_id)
            .await
            .with_context(|| format!("Couldn't fetch user with id {user_id}"))?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserId>> {
        self.data_access
            .find_user_by_username(username)
            .await
            .with_context(|| format!("Couldn't fetch user_id for username {username}"))
    }

    /// All users except the caller, for the browse page.
    pub async fn browse_users(&self, user_id: UserId) -> Result<Vec<User>> {
        let users = self
            .data_access
            .fetch_users_except(user_id)
            .await
            .with_context(|| format!("Couldn't fetch user list for user {user_id}"))?;
        Ok(users)
    }

    /// Records a like after checking that the target exists. Duplicate pairs
    /// are reported as `AlreadyLiked` rather than stored twice.
    pub async fn like_user(&self, liker: UserId, liked: UserId) -> Result<LikeOutcome, LikeError> {
        if self.fetch_user(liked).await?.is_none() {
            return Err(LikeError::UnknownUser(liked));
        }

        let created = self
            .data_access
            .create_like(liker, liked)
            .await
            .with_context(|| format!("Couldn't create like from {liker} to {liked}"))?;

        match created {
            Some(_) => Ok(LikeOutcome::Created),
            None => Ok(LikeOutcome::AlreadyLiked),
        }
    }

    pub async fn send_message(
        &self,
        content: String,
        from: UserId,
        to: UserId,
    ) -> Result<MessageId, SendMessageError> {
        if content.chars().count() > MAX_MESSAGE_CONTENT_CHARS {
            return Err(SendMessageError::ContentTooLong);
        }

        if self.fetch_user(to).await?.is_none() {
            return Err(SendMessageError::UnknownReceiver(to));
        }

        let message = self
            .data_access
            .create_message(from, to, &content, chrono::Utc::now())
            .await
            .with_context(|| format!("Couldn't create message from {from} to {to}"))?;

        Ok(message.id)
    }

    /// Messages where the given user is the receiver.
    pub async fn inbox(&self, user_id: UserId) -> Result<Vec<Message>> {
        self.data_access
            .fetch_received_messages(user_id)
            .await
            .with_context(|| format!("Couldn't fetch inbox for user {user_id}"))
    }
}

impl<D: DataAccess, A: AuthService> App<D, A> {
    pub async fn verify_user(&self, username: &str, password: String) -> Result<Option<UserId>> {
        let user_id = match self.find_user_by_username(username).await? {
            Some(user_id) => user_id,
            None => return Ok(None),
        };

        let res = self
            .authorization_service
            .verify_user(user_id, password)
            .await
            .with_context(|| format!("Authorization error: couldn't verify user {user_id}"))?;

        if res {
            Ok(Some(user_id))
        } else {
            Ok(None)
        }
    }

    /// Returns `None` when the username is taken; callers surface that as a
    /// recoverable outcome.
    pub async fn create_account(
        &self,
        username: &str,
        password: String,
        bio: Option<&str>,
    ) -> Result<Option<UserId>> {
        let user_id = match self
            .data_access
            .create_user(username, bio)
            .await
            .with_context(|| format!("Couldn't create user {username}"))?
        {
            Some(user_id) => user_id,
            None => return Ok(None),
        };

        self.authorization_service
            .create_user(user_id, password)
            .await
            .with_context(|| format!("Authorization error: couldn't create user {username}"))?;

        Ok(Some(user_id))
    }
}
