#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use contacts_api::cli::commands::user::create_user;
use contacts_api::config::AppConfig;
use contacts_api::database::models::{Contact, ContactFields, User};
use contacts_api::database::{ContactRepository, InMemoryContactRepository, InMemoryUserRepository};
use contacts_api::{app, AppState};
use serde_json::{json, Value};
use uuid::Uuid;

/// An in-process server on its own port with its own empty store
pub struct TestServer {
    pub base_url: String,
    pub contacts: Arc<InMemoryContactRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub client: reqwest::Client,
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(test_config()).await
}

pub async fn spawn_server_with(config: AppConfig) -> Result<TestServer> {
    let contacts = Arc::new(InMemoryContactRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let state = AppState::new(contacts.clone(), users.clone(), config);

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let router = app(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server stopped: {e}");
        }
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        contacts,
        users,
        client,
    })
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_user(&self, name: &str) -> Result<TestUser> {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());
        let (user, token) = create_user(self.users.as_ref(), name, &email).await?;
        Ok(TestUser { user, token })
    }

    /// Insert a contact directly, bypassing the HTTP surface
    pub async fn seed_contact(&self, owner: &TestUser, name: &str) -> Result<Contact> {
        let fields = ContactFields {
            name: name.to_string(),
            email: format!("{}@contacts.test", name.to_lowercase().replace(' ', ".")),
            birthday: NaiveDate::from_ymd_opt(1985, 3, 14).context("bad date")?,
            company: "Seeded Ltd".to_string(),
        };
        Ok(self.contacts.create(owner.user.id, fields).await?)
    }

    pub async fn stored(&self, id: Uuid) -> Result<Option<Contact>> {
        Ok(self.contacts.find_by_id(id).await?)
    }

    pub async fn contact_count(&self) -> usize {
        self.contacts.len().await
    }
}

/// The canonical valid payload
pub fn data() -> Value {
    json!({
        "name": "John Doe",
        "email": "johndoe@email.com",
        "birthday": "23-07-1997",
        "company": "Foo Company",
    })
}

/// `data()` with one field replaced
pub fn data_with(field: &str, value: Value) -> Value {
    let mut payload = data();
    payload[field] = value;
    payload
}
