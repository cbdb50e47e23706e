use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, UniqueField},
    posts::{
        repo::PostStore,
        repo_types::{NewPost, Post},
    },
    users::{
        repo::UserStore,
        repo_types::{NewUser, User, UserChanges},
    },
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    next_user_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn check_unique(&self, id: Option<i64>, email: &str, username: &str) -> Result<(), AppError> {
        for u in self.users.values().filter(|u| Some(u.id) != id) {
            if u.email == email {
                return Err(AppError::Duplicate { field: UniqueField::Email });
            }
            if u.username == username {
                return Err(AppError::Duplicate { field: UniqueField::Username });
            }
        }
        Ok(())
    }
}

fn apply(changes: UserChanges, user: &mut User) {
    if let Some(email) = changes.email {
        user.email = email;
    }
    if let Some(username) = changes.username {
        user.username = username;
    }
    if let Some(avatar) = changes.avatar {
        user.avatar = avatar;
    }
    if let Some(bio) = changes.bio {
        user.bio = bio;
    }
    if let Some(password) = changes.password {
        user.password = password;
    }
}

/// In-process store with the same constraints as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut t = self.tables.lock().await;
        t.check_unique(None, &user.email, &user.username)?;
        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            email: user.email,
            username: user.username,
            avatar: user.avatar,
            bio: user.bio,
            password: user.password,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.users
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, AppError> {
        let mut t = self.tables.lock().await;
        let mut user = t.users.get(&id).cloned().ok_or(AppError::NotFound)?;
        apply(changes, &mut user);
        t.check_unique(Some(id), &user.email, &user.username)?;
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&id) {
            return Err(AppError::NotFound);
        }
        if t.posts.values().any(|p| p.user_id == id) {
            return Err(AppError::HasPosts);
        }
        t.users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, AppError> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&post.user_id) {
            return Err(AppError::NotFound);
        }
        if let Some(parent) = post.parent_id {
            if !t.posts.contains_key(&parent) {
                return Err(AppError::NotFound);
            }
        }
        t.next_post_id += 1;
        let post = Post {
            id: t.next_post_id,
            text: post.text,
            created_at: OffsetDateTime::now_utc(),
            user_id: post.user_id,
            parent_id: post.parent_id,
        };
        t.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Post>, AppError> {
        let t = self.tables.lock().await;
        // BTreeMap order is insertion order for monotonically assigned ids
        Ok(t.posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::HashedPassword;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: username.into(),
            avatar: None,
            bio: None,
            password: HashedPassword::hash("secret").unwrap(),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = UserStore::create(&store, new_user("a@x.com", "a")).await.unwrap();
        let b = UserStore::create(&store, new_user("b@x.com", "b")).await.unwrap();
        assert!(a.id > 0);
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn duplicate_email_and_username_are_rejected() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("a@x.com", "a")).await.unwrap();

        let err = UserStore::create(&store, new_user("a@x.com", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { field: UniqueField::Email }));

        let err = UserStore::create(&store, new_user("other@x.com", "a")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { field: UniqueField::Username }));

        assert_eq!(store.list(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_uniqueness_and_id() {
        let store = MemoryStore::new();
        let a = UserStore::create(&store, new_user("a@x.com", "a")).await.unwrap();
        let b = UserStore::create(&store, new_user("b@x.com", "b")).await.unwrap();

        let err = store
            .update(b.id, UserChanges { username: Some("a".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { field: UniqueField::Username }));

        let err = store
            .update(b.id, UserChanges { email: Some("a@x.com".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { field: UniqueField::Email }));

        let renamed = store
            .update(a.id, UserChanges { bio: Some(Some("hi".into())), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(renamed.id, a.id);
        assert_eq!(renamed.bio.as_deref(), Some("hi"));
        assert_eq!(renamed.username, "a");

        let cleared = store
            .update(a.id, UserChanges { bio: Some(None), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(cleared.bio, None);
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update(42, UserChanges::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_restricted_while_posts_exist() {
        let store = MemoryStore::new();
        let a = UserStore::create(&store, new_user("a@x.com", "a")).await.unwrap();
        PostStore::create(&store, NewPost { text: "first".into(), user_id: a.id, parent_id: None })
            .await
            .unwrap();

        let err = store.delete(a.id).await.unwrap_err();
        assert!(matches!(err, AppError::HasPosts));
        assert_eq!(store.list_by_user(a.id).await.unwrap().len(), 1);
        assert!(store.find_by_username("a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_without_posts_removes_user() {
        let store = MemoryStore::new();
        let a = UserStore::create(&store, new_user("a@x.com", "a")).await.unwrap();
        store.delete(a.id).await.unwrap();
        assert!(store.find_by_username("a").await.unwrap().is_none());
        assert!(matches!(store.delete(a.id).await.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn posts_are_found_by_author_only() {
        let store = MemoryStore::new();
        let a = UserStore::create(&store, new_user("a@x.com", "a")).await.unwrap();
        let b = UserStore::create(&store, new_user("b@x.com", "b")).await.unwrap();
        let first = PostStore::create(&store, NewPost { text: "1".into(), user_id: a.id, parent_id: None })
            .await
            .unwrap();
        PostStore::create(&store, NewPost { text: "reply".into(), user_id: b.id, parent_id: Some(first.id) })
            .await
            .unwrap();
        PostStore::create(&store, NewPost { text: "2".into(), user_id: a.id, parent_id: None })
            .await
            .unwrap();

        let texts: Vec<_> = store
            .list_by_user(a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert_eq!(texts, ["1", "2"]);
    }

    #[tokio::test]
    async fn post_requires_existing_author() {
        let store = MemoryStore::new();
        let err = PostStore::create(&store, NewPost { text: "x".into(), user_id: 9, parent_id: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
