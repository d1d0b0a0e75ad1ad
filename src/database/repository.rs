use async_trait::async_trait;
use futures::TryStreamExt;

use crate::database::manager::{Collection, DatabaseError};
use crate::database::models::{Opportunity, OpportunityId, User};

/// Persistence operations over the opportunities collection.
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn find_one(&self, id: OpportunityId) -> Result<Option<Opportunity>, DatabaseError>;

    /// All records for `owner` in the store's natural order.
    async fn find_many(&self, owner: &str) -> Result<Vec<Opportunity>, DatabaseError>;

    async fn insert_one(&self, opportunity: &Opportunity) -> Result<OpportunityId, DatabaseError>;

    /// Replaces name, value and status where both id and owner match.
    /// Returns the number of matched records; never inserts.
    async fn update_one(&self, opportunity: &Opportunity) -> Result<u64, DatabaseError>;

    async fn delete_one(&self, id: OpportunityId, owner: &str) -> Result<u64, DatabaseError>;

    async fn delete_many(&self, owner: &str) -> Result<u64, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DatabaseError::Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
}

pub struct PgOpportunityRepository {
    collection: Collection,
}

impl PgOpportunityRepository {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl OpportunityStore for PgOpportunityRepository {
    async fn find_one(&self, id: OpportunityId) -> Result<Option<Opportunity>, DatabaseError> {
        let sql = format!(
            "SELECT id, name, value, status, user_id FROM {} WHERE id = $1",
            self.collection.quoted_name()
        );
        let row = sqlx::query_as::<_, Opportunity>(&sql)
            .bind(id)
            .fetch_optional(self.collection.pool())
            .await?;
        Ok(row)
    }

    async fn find_many(&self, owner: &str) -> Result<Vec<Opportunity>, DatabaseError> {
        let sql = format!(
            "SELECT id, name, value, status, user_id FROM {} WHERE user_id = $1",
            self.collection.quoted_name()
        );
        let mut rows = sqlx::query_as::<_, Opportunity>(&sql)
            .bind(owner)
            .fetch(self.collection.pool());

        // A row that fails to decode aborts the whole listing.
        let mut opportunities = Vec::new();
        while let Some(opportunity) = rows.try_next().await? {
            opportunities.push(opportunity);
        }
        Ok(opportunities)
    }

    async fn insert_one(&self, opportunity: &Opportunity) -> Result<OpportunityId, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (id, name, value, status, user_id) VALUES ($1, $2, $3, $4, $5)",
            self.collection.quoted_name()
        );
        sqlx::query(&sql)
            .bind(opportunity.id)
            .bind(&opportunity.name)
            .bind(opportunity.value)
            .bind(&opportunity.status)
            .bind(&opportunity.user_id)
            .execute(self.collection.pool())
            .await
            .map_err(|e| map_unique_violation(e, "opportunity id"))?;
        Ok(opportunity.id)
    }

    async fn update_one(&self, opportunity: &Opportunity) -> Result<u64, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET name = $3, value = $4, status = $5 WHERE id = $1 AND user_id = $2",
            self.collection.quoted_name()
        );
        let result = sqlx::query(&sql)
            .bind(opportunity.id)
            .bind(&opportunity.user_id)
            .bind(&opportunity.name)
            .bind(opportunity.value)
            .bind(&opportunity.status)
            .execute(self.collection.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: OpportunityId, owner: &str) -> Result<u64, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2",
            self.collection.quoted_name()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .execute(self.collection.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, owner: &str) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE user_id = $1", self.collection.quoted_name());
        let result = sqlx::query(&sql)
            .bind(owner)
            .execute(self.collection.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(self.collection.pool()).await?;
        Ok(())
    }
}

pub struct PgUserRepository {
    collection: Collection,
}

impl PgUserRepository {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (id, username, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
            self.collection.quoted_name()
        );
        sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(self.collection.pool())
            .await
            .map_err(|e| map_unique_violation(e, &user.email))?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "SELECT id, username, email, password_hash, created_at FROM {} WHERE email = $1",
            self.collection.quoted_name()
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.collection.pool())
            .await?;
        Ok(user)
    }
}

// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

fn map_unique_violation(err: sqlx::Error, key: &str) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return DatabaseError::Conflict(key.to_string());
        }
    }
    DatabaseError::Sqlx(err)
}
