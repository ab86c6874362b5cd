// handlers/mod.rs
//
// Public: `system` (/, /health)
// Token required: `contacts` (/api/contacts*), wrapped by `middleware::require_user`

pub mod contacts;
pub mod system;
