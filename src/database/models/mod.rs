pub mod contact;
pub mod user;

pub use contact::{Contact, ContactFields};
pub use user::{NewUser, User};
