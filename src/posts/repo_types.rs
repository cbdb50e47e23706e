use sqlx::FromRow;
use time::OffsetDateTime;

/// Post record in the database. `user_id` is the only link between a post
/// and its author; a user's posts are found by querying on it.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub user_id: i64,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub user_id: i64,
    pub parent_id: Option<i64>,
}
