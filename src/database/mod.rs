pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{InMemoryContactRepository, InMemoryUserRepository};
pub use postgres::{PgContactRepository, PgUserRepository};
pub use repository::{ContactRepository, UserRepository};
