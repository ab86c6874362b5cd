pub mod resource;

pub use resource::{diff_for_humans, ContactResource};
