pub mod auth;
pub mod response;

pub use auth::{require_user, AuthUser, BODY_TOKEN_FIELD};
pub use response::{ApiResponse, ApiResult};
