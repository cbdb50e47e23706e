use async_trait::async_trait;

use crate::{
    db::PgStore,
    error::{is_foreign_key_violation, AppError},
    security::HashedPassword,
    users::repo_types::{NewUser, User, UserChanges},
};

/// Persistence for users. Implementations enforce `email` and `username`
/// uniqueness and assign ids on insert.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;
    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, AppError>;
    /// Fails with [`AppError::HasPosts`] while the user still authors posts.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, avatar, bio, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, avatar, bio, password
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.password.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, username, avatar, bio, password FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, avatar, bio, password
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email    = COALESCE($2, email),
                   username = COALESCE($3, username),
                   avatar   = CASE WHEN $4 THEN $5 ELSE avatar END,
                   bio      = CASE WHEN $6 THEN $7 ELSE bio END,
                   password = COALESCE($8, password)
             WHERE id = $1
            RETURNING id, email, username, avatar, bio, password
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.username)
        .bind(changes.avatar.is_some())
        .bind(changes.avatar.flatten())
        .bind(changes.bio.is_some())
        .bind(changes.bio.flatten())
        .bind(changes.password.as_ref().map(HashedPassword::as_str))
        .fetch_optional(&self.db)
        .await?;
        user.ok_or(AppError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::HasPosts
                } else {
                    AppError::from(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
