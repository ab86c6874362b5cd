use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contact, ContactFields, NewUser, User};

/// Row storage for contacts. Ownership is not checked here; callers run the
/// policy before any owner-scoped call.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, DatabaseError>;

    /// Contacts owned by `owner_id`, ordered by name then creation time
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Contact>, DatabaseError>;

    async fn create(&self, owner_id: Uuid, fields: ContactFields) -> Result<Contact, DatabaseError>;

    /// Overwrite the editable fields and refresh `updated_at`.
    /// Returns `None` when the row no longer exists.
    async fn update(&self, id: Uuid, fields: ContactFields) -> Result<Option<Contact>, DatabaseError>;

    /// Permanently remove the row. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Credential lookup and provisioning for API users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the email is taken
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Replace the stored token hash. Returns `None` for an unknown email.
    async fn set_token_hash(&self, email: &str, token_hash: &str) -> Result<Option<User>, DatabaseError>;
}
