use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::debug;

use crate::auth::repo_types::{NewUser, StoreError, User};
use crate::db::ConnectionProvider;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact match on an already-normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert and return the identifier the store assigned, if it confirmed one.
    async fn insert(&self, user: NewUser) -> Result<Option<String>, StoreError>;
}

/// Postgres-backed store that connects through the shared provider.
pub struct PgUserStore {
    provider: Arc<ConnectionProvider>,
}

impl PgUserStore {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let limit = self.provider.timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(res) => res.map_err(|e| classify(e, limit)),
            Err(_) => Err(StoreError::Timeout(limit)),
        }
    }
}

fn classify(e: sqlx::Error, limit: Duration) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Duplicate;
        }
    }
    if matches!(e, sqlx::Error::PoolTimedOut) {
        return StoreError::Timeout(limit);
    }
    StoreError::Query(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let db = self.provider.acquire().await?;
        self.bounded(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id::text AS id, email, password_hash, created_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&db.pool),
        )
        .await
    }

    async fn insert(&self, user: NewUser) -> Result<Option<String>, StoreError> {
        let db = self.provider.acquire().await?;
        debug!(database = %db.name, "inserting user");
        self.bounded(
            sqlx::query_scalar::<_, String>(
                r#"
                INSERT INTO users (email, password_hash, created_at)
                VALUES ($1, $2, $3)
                RETURNING id::text
                "#,
            )
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .fetch_optional(&db.pool),
        )
        .await
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;

    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::*;

    /// In-process store keyed by email; the map key plays the unique index.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<HashMap<String, User>>,
    }

    impl MemoryUserStore {
        pub async fn put_raw(&self, user: User) {
            self.users.lock().await.insert(user.email.clone(), user);
        }

        pub async fn len(&self) -> usize {
            self.users.lock().await.len()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            Ok(self.users.lock().await.get(email).cloned())
        }

        async fn insert(&self, user: NewUser) -> Result<Option<String>, StoreError> {
            let mut users = self.users.lock().await;
            if users.contains_key(&user.email) {
                return Err(StoreError::Duplicate);
            }
            let id = Uuid::new_v4().to_string();
            users.insert(
                user.email.clone(),
                User {
                    id: id.clone(),
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at: user.created_at,
                },
            );
            Ok(Some(id))
        }
    }

    /// Store that fails every call with the error produced by `make`.
    pub struct FailingUserStore {
        pub make: fn() -> StoreError,
    }

    #[async_trait]
    impl UserStore for FailingUserStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Err((self.make)())
        }

        async fn insert(&self, _user: NewUser) -> Result<Option<String>, StoreError> {
            Err((self.make)())
        }
    }

    /// Store that accepts inserts but never confirms an identifier.
    #[derive(Default)]
    pub struct SilentInsertStore;

    #[async_trait]
    impl UserStore for SilentInsertStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn insert(&self, _user: NewUser) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::memory::MemoryUserStore;
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn memory_store_assigns_id_and_finds_by_email() {
        let store = MemoryUserStore::default();
        let id = store.insert(new_user("a@b.com")).await.unwrap().expect("id");
        let found = store.find_by_email("a@b.com").await.unwrap().expect("user");
        assert_eq!(found.id, id);
        assert!(store.find_by_email("A@B.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.insert(new_user("a@b.com")).await.unwrap();
        let err = store.insert(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn pool_timeout_classifies_as_timeout() {
        assert!(matches!(
            classify(sqlx::Error::PoolTimedOut, Duration::from_secs(5)),
            StoreError::Timeout(_)
        ));
        assert!(matches!(
            classify(sqlx::Error::RowNotFound, Duration::from_secs(5)),
            StoreError::Query(_)
        ));
    }
}
