mod password;
pub use password::{hash_password, verify_password};
mod jwt;
pub use jwt::{SESSION_TTL_HOURS, UserClaims, generate_token, process_token};
mod token;
pub use token::{MAGIC_LINK_TTL_MINUTES, generate_random_token};
pub mod oauth;
mod error;
pub use error::{CryptError, CryptResult};
