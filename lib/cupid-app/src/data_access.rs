use std::future::Future;

use chrono::DateTime;

use crate::{Like, Message, User, UserId};

// written as a macro to use Self::Error
macro_rules! async_result {
    ($t:ty) => {
        impl Future<Output = Result<$t, Self::Error>> + Send
    };
}

/// Durable storage for the three entities. Ids are assigned by the store;
/// every write is committed before the call returns.
pub trait DataAccess: 'static + Send + Sync + Clone {
    type Error: 'static + std::error::Error + Send + Sync;

    /// Returns `None` when the username is already taken (case-insensitive).
    fn create_user(&self, username: &str, bio: Option<&str>) -> async_result!(Option<UserId>);

    fn fetch_user(&self, user_id: UserId) -> async_result!(Option<User>);

    fn find_user_by_username(&self, username: &str) -> async_result!(Option<UserId>);

    /// Everyone except the given user, for the browse page.
    fn fetch_users_except(&self, user_id: UserId) -> async_result!(Vec<User>);

    /// Returns `None` when this (liker, liked) pair is already stored.
    fn create_like(&self, user_id: UserId, liked_user_id: UserId) -> async_result!(Option<Like>);

    fn create_message(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
        timestamp: DateTime<chrono::Utc>,
    ) -> async_result!(Message);

    /// The receiver's inbox, newest first. No sender-name join is performed;
    /// callers resolve usernames through `fetch_user`.
    fn fetch_received_messages(&self, user_id: UserId) -> async_result!(Vec<Message>);
}
