use std::future::Future;

use crate::UserId;

macro_rules! async_result {
    ($t:ty) => {
        impl Future<Output = Result<$t, Self::Error>> + Send
    };
}

/// Seam between the application and password handling. Implementations store
/// only one-way hashes; `verify_user` re-derives and compares, never decrypts.
pub trait AuthService: 'static + Send + Sync + Clone {
    type Error: 'static + std::error::Error + Send + Sync;

    fn verify_user(&self, user_id: UserId, password: String) -> async_result!(bool);
    fn create_user(&self, user_id: UserId, password: String) -> async_result!(());
}
