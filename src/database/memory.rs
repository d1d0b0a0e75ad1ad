//! In-process store used for local runs (`STORE_BACKEND=memory`) and tests.
//!
//! Opportunities are kept in insertion order so listings have a stable
//! natural order, like a table scan without `ORDER BY`.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Opportunity, OpportunityId, User, UserId};
use crate::database::repository::{OpportunityStore, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    opportunities: RwLock<Vec<Opportunity>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.opportunities.read().await.len()
    }
}

#[async_trait]
impl OpportunityStore for MemoryStore {
    async fn find_one(&self, id: OpportunityId) -> Result<Option<Opportunity>, DatabaseError> {
        let opportunities = self.opportunities.read().await;
        Ok(opportunities.iter().find(|o| o.id == id).cloned())
    }

    async fn find_many(&self, owner: &str) -> Result<Vec<Opportunity>, DatabaseError> {
        let opportunities = self.opportunities.read().await;
        Ok(opportunities
            .iter()
            .filter(|o| o.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, opportunity: &Opportunity) -> Result<OpportunityId, DatabaseError> {
        let mut opportunities = self.opportunities.write().await;
        if opportunities.iter().any(|o| o.id == opportunity.id) {
            return Err(DatabaseError::Conflict("opportunity id".to_string()));
        }
        opportunities.push(opportunity.clone());
        Ok(opportunity.id)
    }

    async fn update_one(&self, opportunity: &Opportunity) -> Result<u64, DatabaseError> {
        let mut opportunities = self.opportunities.write().await;
        match opportunities
            .iter_mut()
            .find(|o| o.id == opportunity.id && o.user_id == opportunity.user_id)
        {
            Some(existing) => {
                existing.name = opportunity.name.clone();
                existing.value = opportunity.value;
                existing.status = opportunity.status.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: OpportunityId, owner: &str) -> Result<u64, DatabaseError> {
        let mut opportunities = self.opportunities.write().await;
        match opportunities.iter().position(|o| o.id == id && o.is_owned_by(owner)) {
            Some(index) => {
                opportunities.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, owner: &str) -> Result<u64, DatabaseError> {
        let mut opportunities = self.opportunities.write().await;
        let before = opportunities.len();
        opportunities.retain(|o| !o.is_owned_by(owner));
        Ok((before - opportunities.len()) as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(user.email.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewUser, OpportunityInput};

    fn opportunity(owner: &str, name: &str) -> Opportunity {
        Opportunity::from_input(
            OpportunityId::new(),
            owner,
            OpportunityInput {
                name: name.to_string(),
                value: 100.0,
                status: "open".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn lists_only_owner_records_in_insertion_order() {
        let store = MemoryStore::new();
        let first = opportunity("alice", "first");
        let second = opportunity("alice", "second");
        store.insert_one(&first).await.unwrap();
        store.insert_one(&opportunity("bob", "other")).await.unwrap();
        store.insert_one(&second).await.unwrap();

        let listed = store.find_many("alice").await.unwrap();
        assert_eq!(listed, vec![first, second]);
        assert!(store.find_many("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_requires_matching_owner() {
        let store = MemoryStore::new();
        let original = opportunity("alice", "deal");
        store.insert_one(&original).await.unwrap();

        let mut hijack = original.clone();
        hijack.user_id = "mallory".to_string();
        hijack.name = "stolen".to_string();
        assert_eq!(store.update_one(&hijack).await.unwrap(), 0);

        let mut edit = original.clone();
        edit.status = "won".to_string();
        assert_eq!(store.update_one(&edit).await.unwrap(), 1);

        let stored = store.find_one(original.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "won");
        assert_eq!(stored.name, "deal");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn deletes_count_matches() {
        let store = MemoryStore::new();
        let kept = opportunity("bob", "kept");
        let target = opportunity("alice", "a");
        store.insert_one(&target).await.unwrap();
        store.insert_one(&opportunity("alice", "b")).await.unwrap();
        store.insert_one(&kept).await.unwrap();

        assert_eq!(store.delete_one(target.id, "bob").await.unwrap(), 0);
        assert_eq!(store.delete_one(target.id, "alice").await.unwrap(), 1);
        assert_eq!(store.delete_many("alice").await.unwrap(), 1);
        assert_eq!(store.delete_many("alice").await.unwrap(), 0);
        assert_eq!(store.find_many("bob").await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let new_user = NewUser {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "x".to_string(),
        };
        let user = User::from_new(new_user.clone());
        store.insert_user(&user).await.unwrap();

        let err = store.insert_user(&User::from_new(new_user)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert_eq!(store.find_by_email("ada@example.com").await.unwrap().unwrap().id, user.id);
    }
}
