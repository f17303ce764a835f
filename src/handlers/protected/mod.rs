// handlers/protected/mod.rs - endpoints that require a valid bearer token
pub mod auth;
pub mod characters;

pub use characters::{character_create, character_delete, character_update};
