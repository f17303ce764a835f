pub mod auth;
pub mod json;
pub mod query;
pub mod response;

pub use auth::{AuthUser, MaybeAuthUser};
pub use json::JsonBody;
pub use query::QueryString;
pub use response::{ApiResponse, ApiResult};
