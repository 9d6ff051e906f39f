use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::user::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Contract the auth service needs from the persistent store. The handle is
/// built by the process entry point and injected through `AppState`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Matches only when `token` equals the stored pending token AND the
    /// stored expiry is strictly in the future. A single predicate: callers
    /// never compose the two checks themselves.
    async fn find_by_reset_token(&self, email: &str, token: &str)
        -> Result<Option<User>, StoreError>;

    async fn create(&self, new: NewUser) -> Result<User, StoreError>;

    /// Persists mutations: hash rotation, reset-token set/clear.
    async fn save(&self, user: &User) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;
}

pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, reset_token, reset_token_expires_at, created_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, reset_token, reset_token_expires_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_reset_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, reset_token, reset_token_expires_at, created_at
            FROM users
            WHERE lower(email) = lower($1)
              AND reset_token = $2
              AND reset_token_expires_at > now()
            "#,
        )
        .bind(email)
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, lower($3), $4, $5)
            RETURNING id, name, email, password_hash, role, reset_token, reset_token_expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            // unique_violation on the lower(email) index
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::DuplicateEmail
            }
            _ => StoreError::Database(e),
        })?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET name = $2,
                email = lower($3),
                password_hash = $4,
                role = $5,
                reset_token = $6,
                reset_token_expires_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.reset_token.as_deref())
        .bind(user.reset_token_expires_at)
        .execute(&self.db)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let rows = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, reset_token, reset_token_expires_at, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;

    /// In-memory `CredentialStore` backing the unit tests. Mirrors the
    /// Postgres predicates, including the atomic token+expiry lookup.
    #[derive(Default)]
    pub struct MemoryCredentialStore {
        users: Mutex<Vec<User>>,
    }

    impl MemoryCredentialStore {
        pub fn snapshot_by_email(&self, email: &str) -> Option<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned()
        }

        /// Direct mutation hook so tests can age a reset token.
        pub fn mutate_by_email<F: FnOnce(&mut User)>(&self, email: &str, f: F) {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .expect("user present");
            f(user);
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentialStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            Ok(self.snapshot_by_email(email))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }

        async fn find_by_reset_token(
            &self,
            email: &str,
            token: &str,
        ) -> Result<Option<User>, StoreError> {
            let now = OffsetDateTime::now_utc();
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| {
                    u.email.eq_ignore_ascii_case(email)
                        && u.reset_token.as_deref() == Some(token)
                        && u.reset_token_expires_at.is_some_and(|exp| exp > now)
                })
                .cloned())
        }

        async fn create(&self, new: NewUser) -> Result<User, StoreError> {
            let mut users = self.users.lock().unwrap();
            if users
                .iter()
                .any(|u| u.email.eq_ignore_ascii_case(&new.email))
            {
                return Err(StoreError::DuplicateEmail);
            }
            let user = User {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email.to_lowercase(),
                password_hash: new.password_hash,
                role: new.role,
                reset_token: None,
                reset_token_expires_at: None,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn save(&self, user: &User) -> Result<(), StoreError> {
            let mut users = self.users.lock().unwrap();
            let slot = users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(StoreError::NotFound)?;
            *slot = user.clone();
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }

        async fn list(&self) -> Result<Vec<User>, StoreError> {
            Ok(self.users.lock().unwrap().iter().rev().cloned().collect())
        }
    }
}
