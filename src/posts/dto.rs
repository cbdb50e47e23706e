use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::posts::repo_types::Post;

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub text: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub parent_id: Option<i64>,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            text: p.text,
            created_at: p.created_at,
            parent_id: p.parent_id,
        }
    }
}
