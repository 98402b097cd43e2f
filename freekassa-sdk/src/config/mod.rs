//! Configuration types for the FreeKassa client.
//!
//! These types represent validated settings shared by every consumer of the
//! SDK. Loading them from files or the environment is left to the binary
//! crate.

mod credentials;

pub use credentials::{Credentials, CredentialsError};

/// Production API root. Routes are joined onto it, so it ends with `/`.
pub const DEFAULT_API_URL: &str = "https://api.freekassa.ru/v1/";
