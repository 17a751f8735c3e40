use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;

use crate::auth::repo::{StoreError, UserStore};
use crate::auth::repo_types::{NewUser, User};

/// In-process store backing the test suites.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    by_id: HashMap<i64, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user, leaving any tokens issued for it still valid.
    pub fn remove(&self, id: i64) -> Option<User> {
        self.lock().by_id.remove(&id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-insert.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.by_id.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: inner.next_id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.by_id.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .by_id
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().by_id.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            name: "A".into(),
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids_and_finds_them() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.expect("create");
        let b = store.create(new_user("b@x.com")).await.expect("create");
        assert!(b.id > a.id);

        let found = store.find_by_email("b@x.com").await.expect("find");
        assert_eq!(found.map(|u| u.id), Some(b.id));
        let found = store.find_by_id(a.id).await.expect("find");
        assert_eq!(found.map(|u| u.email), Some("a@x.com".to_string()));
        assert!(store.find_by_id(999).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_email_at_insert() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com")).await.expect("create");
        let err = store.create(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }
}
