use std::future::Future;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use thiserror::Error;

use sqlx::postgres::PgConnectOptions;
use sqlx::{query, Executor, PgPool, Row};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use cupid_app::data_access::DataAccess;
use cupid_app::{Like, Message, User, UserId};
use cupid_auth::{AuthStorage, AuthenticationInfo};

pub const MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
const DB_VERSION: i64 = 2;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let options: PgConnectOptions = connection_string.parse()?;
        let pool = PgPool::connect_with(options).await?;

        Ok(Db { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Db { pool }
    }

    pub fn graceful_shutdown(
        &self,
        cancellation_token: CancellationToken,
    ) -> impl Future<Output = Result<(), JoinError>> {
        let pool_cloned = self.pool.clone();
        tokio::spawn(async move {
            cancellation_token.cancelled().await;
            tracing::info!("Shutting down database connection...");
            pool_cloned.close().await;
            tracing::info!("Shutting down database connection...Success");
        })
    }

    pub async fn check_migrations(&self) -> Result<()> {
        let migrations_table_exists: bool = self.pool
            .acquire().await?
            .fetch_one(query("select exists (select from pg_tables where (schemaname = 'public') and (tablename = '_sqlx_migrations'))"))
            .await?
            .get(0);

        if !migrations_table_exists {
            bail!("Database uninitialized. Please migrate database using the 'migrate' tool");
        }

        let latest_version: i64 = self
            .pool
            .acquire()
            .await?
            .fetch_optional(query(
                "select version from _sqlx_migrations order by version desc limit 1",
            ))
            .await?
            .map(|row| row.get(0))
            .unwrap_or(-1);

        if latest_version < DB_VERSION {
            bail!("Database schema not up to date. Please migrate database using the 'migrate' tool")
        } else if latest_version > DB_VERSION {
            bail!("Application not up to date with the database. Please use a newer version of the app or undo database migrations until version {}", DB_VERSION)
        };

        Ok(())
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.context("Couldn't migrate")
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Postgres error: {0}")]
    PgError(#[from] sqlx::Error),
    #[error("Auth info parsing error: {0}")]
    AuthInfoParsingError(#[from] cupid_auth::AuthenticationInfoParsingError),
}

impl DataAccess for Db {
    type Error = Error;

    async fn create_user(
        &self,
        username: &str,
        bio: Option<&str>,
    ) -> Result<Option<UserId>, Self::Error> {
        let mut transaction = self.pool.begin().await?;

        transaction
            .execute("lock table users in exclusive mode;")
            .await?;

        let username_exists: bool = transaction
            .fetch_one(
                query("select exists(select 1 from users where lower(username) = $1)")
                    .bind(username.to_lowercase()),
            )
            .await?
            .get(0);

        if username_exists {
            return Ok(None);
        };

        let user_id: UserId = transaction
            .fetch_one(
                query("insert into users(username, bio) values ($1, $2) returning user_id")
                    .bind(username)
                    .bind(bio),
            )
            .await?
            .get(0);

        transaction.commit().await?;

        Ok(Some(user_id))
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn
            .fetch_optional(
                query("select username, bio from users where users.user_id = $1").bind(user_id),
            )
            .await?
            .map(|row| User {
                id: user_id,
                username: row.get(0),
                bio: row.get(1),
            });
        Ok(res)
    }

    async fn find_user_by_username(&self, requested_username: &str) -> Result<Option<UserId>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn
            .fetch_optional(
                query("select user_id from users where lower(username) = $1")
                    .bind(requested_username.to_lowercase()),
            )
            .await?;
        Ok(res.map(|row| row.get(0)))
    }

    async fn fetch_users_except(&self, user_id: UserId) -> Result<Vec<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn
            .fetch_all(
                query(
                    "select user_id, username, bio from users where user_id <> $1 order by username",
                )
                .bind(user_id),
            )
            .await?
            .into_iter()
            .map(|row| User {
                id: row.get(0),
                username: row.get(1),
                bio: row.get(2),
            })
            .collect();
        Ok(res)
    }

    async fn create_like(
        &self,
        user_id: UserId,
        liked_user_id: UserId,
    ) -> Result<Option<Like>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        // the unique constraint makes a repeated pair a no-op
        let res = conn
            .fetch_optional(
                query(
                    "insert into likes(user_id, liked_user_id) values ($1, $2) \
                     on conflict (user_id, liked_user_id) do nothing \
                     returning like_id",
                )
                .bind(user_id)
                .bind(liked_user_id),
            )
            .await?
            .map(|row| Like {
                id: row.get(0),
                user_id,
                liked_user_id,
            });
        Ok(res)
    }

    async fn create_message(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
        timestamp: DateTime<chrono::Utc>,
    ) -> Result<Message, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let id = conn
            .fetch_one(
                query(
                    "insert into messages(sender, receiver, content, timestamp) \
                     values ($1, $2, $3, $4) returning message_id",
                )
                .bind(from)
                .bind(to)
                .bind(content)
                .bind(timestamp),
            )
            .await?
            .get(0);
        Ok(Message {
            id,
            from,
            to,
            content: content.to_owned(),
            timestamp,
        })
    }

    async fn fetch_received_messages(&self, user_id: UserId) -> Result<Vec<Message>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn
            .fetch_all(
                query(
                    "select message_id, sender, receiver, content, timestamp \
                     from messages where receiver = $1 \
                     order by timestamp desc, message_id desc",
                )
                .bind(user_id),
            )
            .await?
            .into_iter()
            .map(|row| Message {
                id: row.get(0),
                from: row.get(1),
                to: row.get(2),
                content: row.get(3),
                timestamp: row.get(4),
            })
            .collect();
        Ok(res)
    }
}

impl AuthStorage for Db {
    type Error = Error;

    async fn fetch_authentication(
        &self,
        user_id: UserId,
    ) -> Result<Option<AuthenticationInfo>, Self::Error> {
        let res = self
            .pool
            .acquire()
            .await?
            .fetch_optional(query("select phc_string from auth where user_id = $1").bind(user_id))
            .await?;

        match res {
            Some(row) => {
                let phc_string: &str = row.get(0);
                let auth_info = phc_string.parse()?;
                Ok(Some(auth_info))
            }
            None => Ok(None),
        }
    }

    async fn update_authentication(
        &self,
        user_id: UserId,
        auth_info: AuthenticationInfo,
    ) -> Result<Option<AuthenticationInfo>, Self::Error> {
        let mut transaction = self.pool.begin().await?;
        transaction.execute(query("lock table auth in exclusive mode")).await?;
        let old_auth = transaction
            .fetch_optional(query("select phc_string from auth where user_id = $1").bind(user_id))
            .await?;

        match old_auth {
            Some(row) => {
                let old_phc_string: &str = row.get(0);
                let old_auth: AuthenticationInfo = old_phc_string.parse()?;
                transaction
                    .execute(
                        query("update auth set phc_string = $1 where user_id = $2")
                            .bind(auth_info.phc_string().to_string())
                            .bind(user_id),
                    )
                    .await?;
                transaction.commit().await?;
                Ok(Some(old_auth))
            }
            None => {
                transaction
                    .execute(
                        query("insert into auth (user_id, phc_string) values ($1, $2)")
                            .bind(user_id)
                            .bind(auth_info.phc_string().to_string()),
                    )
                    .await?;
                transaction.commit().await?;
                Ok(None)
            }
        }
    }
}
