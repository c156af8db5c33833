pub mod auth;
pub mod base_url;

pub use auth::AuthUser;
pub use base_url::RequestBase;
