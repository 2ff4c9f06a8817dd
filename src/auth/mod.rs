//! Session tokens and credential hashing.

pub mod credentials;
pub mod token;

pub use credentials::{Argon2CredentialHasher, CredentialHasher};
pub use token::{Claims, TokenService};
