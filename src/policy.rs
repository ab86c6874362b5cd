use crate::database::models::Contact;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Owner-scoped actions on a single contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    View,
    Update,
    Delete,
}

impl Ability {
    fn verb(self) -> &'static str {
        match self {
            Ability::View => "view",
            Ability::Update => "update",
            Ability::Delete => "delete",
        }
    }
}

/// Only the owner may see or touch a contact
pub fn can_access(user: &AuthUser, contact: &Contact) -> bool {
    contact.user_id == user.id
}

/// Same check for every ability. The error names neither the contact nor its owner.
pub fn authorize(ability: Ability, user: &AuthUser, contact: &Contact) -> Result<(), ApiError> {
    if can_access(user, contact) {
        return Ok(());
    }

    tracing::warn!(
        "User {} denied {} on contact {}",
        user.id,
        ability.verb(),
        contact.id
    );
    Err(ApiError::forbidden("This action is unauthorized."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            name: "John".to_string(),
            email: "john@example.com".to_string(),
        }
    }

    fn contact_owned_by(owner: Uuid) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            user_id: owner,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            company: "Acme".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_can_access() {
        let owner = user();
        let contact = contact_owned_by(owner.id);
        assert!(can_access(&owner, &contact));
        for ability in [Ability::View, Ability::Update, Ability::Delete] {
            assert!(authorize(ability, &owner, &contact).is_ok());
        }
    }

    #[test]
    fn stranger_is_forbidden_for_every_ability() {
        let contact = contact_owned_by(Uuid::new_v4());
        let stranger = user();
        assert!(!can_access(&stranger, &contact));
        for ability in [Ability::View, Ability::Update, Ability::Delete] {
            let err = authorize(ability, &stranger, &contact).unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));
            assert!(!err.message().contains("Jane"));
        }
    }
}
