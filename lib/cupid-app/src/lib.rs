use chrono::DateTime;

pub mod app;
pub mod authorization;
pub mod data_access;

pub type UserId = i64;
pub type LikeId = i64;
pub type MessageId = i64;

/// Longest message content the application accepts, in characters.
pub const MAX_MESSAGE_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub bio: Option<String>,
}

/// A directed record of one user expressing interest in another. At most one
/// per (liker, liked) pair is ever stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub liked_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub from: UserId,
    pub to: UserId,
    pub content: String,
    pub timestamp: DateTime<chrono::Utc>,
}
