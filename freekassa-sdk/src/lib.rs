//! Client SDK for the FreeKassa payment gateway.
//!
//! Requests are signed with HMAC-SHA256 as described in [`signature`]. The
//! HTTP client lives behind the `client` cargo feature (enabled by default)
//! so crates that only need payload construction or signature checks do not
//! pull in `reqwest`.

#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod objects;
pub mod signature;
