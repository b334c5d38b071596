//! In-memory user store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Money, UserId};
use crate::domain::user::User;
use crate::ports::UserRepository;

pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, user: User) {
        self.users
            .write()
            .expect("InMemoryUserRepository: lock poisoned")
            .insert(user.id, user);
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users
            .read()
            .expect("InMemoryUserRepository: lock poisoned")
            .get(id)
            .cloned()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_primary_admin(&self) -> Result<Option<User>, DomainError> {
        let users = self.users.read().expect("InMemoryUserRepository: lock poisoned");
        Ok(users
            .values()
            .filter(|u| u.is_admin())
            .min_by_key(|u| u.created_at)
            .cloned())
    }

    async fn credit_revenue(&self, id: &UserId, amount: Money) -> Result<bool, DomainError> {
        let mut users = self.users.write().expect("InMemoryUserRepository: lock poisoned");
        let Some(user) = users.get_mut(id) else {
            return Ok(false);
        };
        user.revenue = user.revenue.credited(amount).ok_or_else(|| {
            DomainError::new(ErrorCode::DatabaseError, "revenue ledger overflow")
        })?;
        Ok(true)
    }
}
