use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_api_token, hash_api_token};
use crate::cli::{utils, OutputFormat};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, PgUserRepository, UserRepository};
use crate::validation::is_valid_email;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an API user and print its token")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Unique email address")]
        email: String,
    },

    #[command(about = "Issue a new token for an existing user, revoking the old one")]
    RotateToken {
        #[arg(long, help = "Email of the user")]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = utils::connect().await?;
    let users = PgUserRepository::new(pool.clone());

    let result = match cmd {
        UserCommands::Create { name, email } => {
            let (user, token) = create_user(&users, &name, &email).await?;
            utils::output_success(
                &output_format,
                &format!("Created user {}", user.email),
                Some(token_details(&user, &token)),
            )
        }
        UserCommands::RotateToken { email } => {
            let (user, token) = rotate_token(&users, &email).await?;
            utils::output_success(
                &output_format,
                &format!("Rotated token for {}", user.email),
                Some(token_details(&user, &token)),
            )
        }
    };

    pool.close().await;
    result
}

/// Create a user with a fresh token. The plain token is returned once and never stored.
pub async fn create_user(users: &dyn UserRepository, name: &str, email: &str) -> anyhow::Result<(User, String)> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        anyhow::bail!("name must not be empty");
    }
    if !is_valid_email(email) {
        anyhow::bail!("'{}' is not a valid email address", email);
    }

    if users.find_by_email(email).await?.is_some() {
        anyhow::bail!("user with email '{}' already exists", email);
    }

    let token = generate_api_token();
    let user = users
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            api_token_hash: hash_api_token(&token),
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict(msg) => anyhow::anyhow!(msg),
            other => anyhow::Error::from(other).context("failed to create user"),
        })?;

    tracing::info!("Created API user {} ({})", user.email, user.id);
    Ok((user, token))
}

/// Replace a user's token; the previous one stops working immediately
pub async fn rotate_token(users: &dyn UserRepository, email: &str) -> anyhow::Result<(User, String)> {
    let token = generate_api_token();
    let user = users
        .set_token_hash(email.trim(), &hash_api_token(&token))
        .await
        .context("failed to rotate token")?
        .ok_or_else(|| anyhow::anyhow!("no user with email '{}'", email.trim()))?;

    tracing::info!("Rotated API token for {} ({})", user.email, user.id);
    Ok((user, token))
}

fn token_details(user: &User, token: &str) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "api_token": token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryUserRepository;

    #[tokio::test]
    async fn created_token_resolves_to_the_user() {
        let users = InMemoryUserRepository::new();
        let (user, token) = create_user(&users, " John ", "john@example.com").await.unwrap();

        assert_eq!(user.name, "John");
        let found = users.find_by_token_hash(&hash_api_token(&token)).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_ne!(found.api_token_hash, token);
    }

    #[tokio::test]
    async fn rejects_bad_input_and_duplicates() {
        let users = InMemoryUserRepository::new();
        assert!(create_user(&users, "", "john@example.com").await.is_err());
        assert!(create_user(&users, "John", "not-an-email").await.is_err());

        create_user(&users, "John", "john@example.com").await.unwrap();
        let err = create_user(&users, "Johnny", "john@example.com").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn rotation_revokes_the_old_token() {
        let users = InMemoryUserRepository::new();
        let (_, old) = create_user(&users, "John", "john@example.com").await.unwrap();
        let (_, new) = rotate_token(&users, "john@example.com").await.unwrap();

        assert!(users.find_by_token_hash(&hash_api_token(&old)).await.unwrap().is_none());
        assert!(users.find_by_token_hash(&hash_api_token(&new)).await.unwrap().is_some());
        assert!(rotate_token(&users, "nobody@example.com").await.is_err());
    }
}
