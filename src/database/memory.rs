use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contact, ContactFields, NewUser, User};
use crate::database::repository::{ContactRepository, UserRepository};

/// Process-local contact store. Each call holds the lock for the whole operation.
#[derive(Default)]
pub struct InMemoryContactRepository {
    rows: RwLock<HashMap<Uuid, Contact>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored contacts across all owners
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, DatabaseError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Contact>, DatabaseError> {
        let rows = self.rows.read().await;
        let mut contacts: Vec<Contact> = rows
            .values()
            .filter(|c| c.user_id == owner_id)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(contacts)
    }

    async fn create(&self, owner_id: Uuid, fields: ContactFields) -> Result<Contact, DatabaseError> {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id: owner_id,
            name: fields.name,
            email: fields.email,
            birthday: fields.birthday,
            company: fields.company,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn update(&self, id: Uuid, fields: ContactFields) -> Result<Option<Contact>, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(contact) = rows.get_mut(&id) else {
            return Ok(None);
        };
        contact.name = fields.name;
        contact.email = fields.email;
        contact.birthday = fields.birthday;
        contact.company = fields.company;
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

/// Process-local user directory keyed by id
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.api_token_hash == token_hash).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(format!(
                "user with email '{}' already exists",
                user.email
            )));
        }
        if users.values().any(|u| u.api_token_hash == user.api_token_hash) {
            return Err(DatabaseError::Conflict("api token already in use".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            api_token_hash: user.api_token_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_token_hash(&self, email: &str, token_hash: &str) -> Result<Option<User>, DatabaseError> {
        let mut users = self.users.write().await;
        let Some(user) = users.values_mut().find(|u| u.email == email) else {
            return Ok(None);
        };
        user.api_token_hash = token_hash.to_string();
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fields(name: &str) -> ContactFields {
        ContactFields {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            birthday: NaiveDate::from_ymd_opt(1997, 7, 23).unwrap(),
            company: "Foo Company".to_string(),
        }
    }

    #[tokio::test]
    async fn lists_only_the_owners_contacts_sorted_by_name() {
        let repo = InMemoryContactRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.create(alice, fields("Zed")).await.unwrap();
        repo.create(alice, fields("Amy")).await.unwrap();
        repo.create(bob, fields("Bert")).await.unwrap();

        let listed = repo.list_by_owner(alice).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
        assert_eq!(repo.len().await, 3);
    }

    #[tokio::test]
    async fn update_keeps_owner_and_bumps_timestamp() {
        let repo = InMemoryContactRepository::new();
        let owner = Uuid::new_v4();
        let created = repo.create(owner, fields("John")).await.unwrap();

        let updated = repo.update(created.id, fields("Jane")).await.unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.user_id, owner);
        assert_eq!(updated.name, "Jane");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let repo = InMemoryContactRepository::new();
        assert!(repo.update(Uuid::new_v4(), fields("John")).await.unwrap().is_none());
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let repo = InMemoryContactRepository::new();
        let created = repo.create(Uuid::new_v4(), fields("John")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn user_emails_are_unique() {
        let repo = InMemoryUserRepository::new();
        let new_user = |hash: &str| NewUser {
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            api_token_hash: hash.to_string(),
        };

        repo.create(new_user("a")).await.unwrap();
        let err = repo.create(new_user("b")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn rotating_a_token_replaces_the_old_one() {
        let repo = InMemoryUserRepository::new();
        repo.create(NewUser {
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            api_token_hash: "old".to_string(),
        })
        .await
        .unwrap();

        repo.set_token_hash("john@example.com", "new").await.unwrap().unwrap();
        assert!(repo.find_by_token_hash("old").await.unwrap().is_none());
        assert!(repo.find_by_token_hash("new").await.unwrap().is_some());
        assert!(repo.set_token_hash("nobody@example.com", "x").await.unwrap().is_none());
    }
}
