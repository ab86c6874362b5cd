use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Contact, ContactFields, NewUser, User};
use crate::database::repository::{ContactRepository, UserRepository};

const CONTACT_COLUMNS: &str = "id, user_id, name, email, birthday, company, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, api_token_hash, created_at, updated_at";

const USER_EMAIL_KEY: &str = "users_email_key";
const USER_TOKEN_KEY: &str = "users_api_token_hash_key";

#[derive(Clone)]
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, DatabaseError> {
        let sql = format!("SELECT {} FROM contacts WHERE id = $1", CONTACT_COLUMNS);
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Contact>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY name, created_at",
            CONTACT_COLUMNS
        );
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn create(&self, owner_id: Uuid, fields: ContactFields) -> Result<Contact, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO contacts (id, user_id, name, email, birthday, company, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now(), now())
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(&fields.name)
            .bind(&fields.email)
            .bind(fields.birthday)
            .bind(&fields.company)
            .fetch_one(&self.pool)
            .await?;

        debug!("Inserted contact {} for user {}", contact.id, owner_id);
        Ok(contact)
    }

    async fn update(&self, id: Uuid, fields: ContactFields) -> Result<Option<Contact>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE contacts
            SET name = $2, email = $3, birthday = $4, company = $5, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.email)
            .bind(fields.birthday)
            .bind(&fields.company)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE api_token_hash = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, api_token_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.api_token_hash)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DatabaseError::Conflict(user_conflict_message(db_err.constraint(), &user.email)))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn set_token_hash(&self, email: &str, token_hash: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "UPDATE users SET api_token_hash = $2, updated_at = now() WHERE email = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

/// Name the column behind a unique violation on `users`
fn user_conflict_message(constraint: Option<&str>, email: &str) -> String {
    match constraint {
        Some(USER_EMAIL_KEY) => format!("user with email '{}' already exists", email),
        Some(USER_TOKEN_KEY) => "api token already in use".to_string(),
        other => format!("user conflicts with an existing row ({})", other.unwrap_or("unknown constraint")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_follows_the_violated_constraint() {
        assert_eq!(
            user_conflict_message(Some("users_email_key"), "john@example.com"),
            "user with email 'john@example.com' already exists"
        );
        assert_eq!(
            user_conflict_message(Some("users_api_token_hash_key"), "john@example.com"),
            "api token already in use"
        );
        assert!(!user_conflict_message(None, "john@example.com").contains("john@example.com"));
    }

    #[test]
    fn constraint_names_match_the_schema() {
        let schema = include_str!("../../sql/schema.sql");
        assert!(schema.contains(&format!("CONSTRAINT {} UNIQUE (email)", USER_EMAIL_KEY)));
        assert!(schema.contains(&format!("CONSTRAINT {} UNIQUE (api_token_hash)", USER_TOKEN_KEY)));
    }
}
