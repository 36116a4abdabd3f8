//! Data Transfer Objects
//!
//! Request and response bodies of the public API. Field names are part of
//! the wire contract and are spelled out with serde renames.

pub mod account;
pub mod auth;
pub mod common;
pub mod wallet;

pub use account::*;
pub use auth::*;
pub use common::*;
pub use wallet::*;
