use async_trait::async_trait;

use crate::{
    db::PgStore,
    error::AppError,
    posts::repo_types::{NewPost, Post},
};

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fails with [`AppError::NotFound`] when the author or parent is missing.
    async fn create(&self, post: NewPost) -> Result<Post, AppError>;
    /// Posts authored by `user_id`, oldest first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Post>, AppError>;
}

#[async_trait]
impl PostStore for PgStore {
    async fn create(&self, post: NewPost) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, user_id, parent_id)
            VALUES ($1, $2, $3)
            RETURNING id, text, created_at, user_id, parent_id
            "#,
        )
        .bind(&post.text)
        .bind(post.user_id)
        .bind(post.parent_id)
        .fetch_one(&self.db)
        .await?;
        Ok(post)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, text, created_at, user_id, parent_id
              FROM posts
             WHERE user_id = $1
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
