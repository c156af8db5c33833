pub mod jwt;
pub mod password;

pub use jwt::{issue_token_pair, TokenKind, TokenPair};
pub use password::{hash_password, verify_password};
