//! API Handlers

pub mod auth;
pub mod health;
pub mod info;
pub mod merch;
pub mod wallet;
