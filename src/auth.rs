//! Identity and session concerns: password hashing, avatar derivation,
//! session tokens and the authorization gate for protected routes.

pub mod avatar;
pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::AuthUser;
pub use token::TokenIssuer;
